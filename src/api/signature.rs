//! Slack request signing verification.
//!
//! Slack signs `v0:<timestamp>:<body>` with HMAC-SHA256 keyed by the app's
//! signing secret and sends `v0=<hex digest>` in `X-Slack-Signature`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{error, warn};

use crate::errors::VerifyError;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_VERSION: &str = "v0";

/// Maximum distance between the request timestamp and the local clock.
pub const TIMESTAMP_TOLERANCE: Duration = Duration::from_secs(300);

#[derive(Clone)]
pub struct SignatureVerifier {
    signing_secret: String,
    tolerance: Duration,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("signing_secret", &"<redacted>")
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

impl SignatureVerifier {
    #[must_use]
    pub fn new(signing_secret: impl Into<String>) -> Self {
        Self {
            signing_secret: signing_secret.into(),
            tolerance: TIMESTAMP_TOLERANCE,
        }
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Verify a request against the local clock.
    ///
    /// # Errors
    ///
    /// `TimestampExpired` when the timestamp is missing, unparsable or out of
    /// the tolerance window; `InvalidSignature` when the signature is missing
    /// or does not match.
    pub fn verify(
        &self,
        body: &[u8],
        timestamp: Option<&str>,
        signature: Option<&str>,
    ) -> Result<(), VerifyError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self.verify_at(body, timestamp, signature, now)
    }

    /// Verify a request as of `now_secs` (Unix seconds).
    ///
    /// The timestamp window is checked before any signature work, so an
    /// expired request is rejected the same way whatever its signature.
    ///
    /// # Errors
    ///
    /// See [`SignatureVerifier::verify`].
    pub fn verify_at(
        &self,
        body: &[u8],
        timestamp: Option<&str>,
        signature: Option<&str>,
        now_secs: u64,
    ) -> Result<(), VerifyError> {
        let Some(timestamp) = timestamp else {
            warn!("Missing X-Slack-Request-Timestamp header");
            return Err(VerifyError::TimestampExpired);
        };

        let within_window = timestamp
            .trim()
            .parse::<u64>()
            .is_ok_and(|ts| ts.abs_diff(now_secs) <= self.tolerance.as_secs());
        if !within_window {
            error!("Timestamp out of range, potential replay attack");
            return Err(VerifyError::TimestampExpired);
        }

        let Some(expected) = signature
            .and_then(|s| s.strip_prefix("v0="))
            .and_then(|hex_sig| hex::decode(hex_sig).ok())
        else {
            error!("Missing or malformed X-Slack-Signature header");
            return Err(VerifyError::InvalidSignature);
        };

        // verify_slice compares in constant time
        self.mac(timestamp, body)?.verify_slice(&expected).map_err(|_| {
            error!("Signature verification failed");
            VerifyError::InvalidSignature
        })
    }

    fn mac(&self, timestamp: &str, body: &[u8]) -> Result<HmacSha256, VerifyError> {
        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes()).map_err(|e| {
            error!("Failed to create HMAC: {}", e);
            VerifyError::InvalidSignature
        })?;
        mac.update(SIGNATURE_VERSION.as_bytes());
        mac.update(b":");
        mac.update(timestamp.as_bytes());
        mac.update(b":");
        mac.update(body);
        Ok(mac)
    }
}

/// The `X-Slack-Signature` value Slack would send for this request.
#[must_use]
pub fn compute_signature(timestamp: &str, request_body: &[u8], signing_secret: &str) -> String {
    let verifier = SignatureVerifier::new(signing_secret);
    match verifier.mac(timestamp, request_body) {
        Ok(mac) => format!(
            "{SIGNATURE_VERSION}={}",
            hex::encode(mac.finalize().into_bytes())
        ),
        Err(_) => String::new(),
    }
}
