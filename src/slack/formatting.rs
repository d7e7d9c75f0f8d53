//! Slack message text formatting helpers.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static SPECIAL_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([?@#!]?)(.*?)>").expect("static regex compile"));

/// Undo Slack's text escaping.
///
/// Smart quotes become ASCII quotes, special tokens collapse to their
/// readable form (`<@U123>` becomes `@U123`, `<#C1|general>` becomes
/// `#general`, `<https://x|label>` becomes `label`), and HTML entities are
/// decoded after that. `&lt;@U1&gt;` typed by a user stays `<@U1>`.
#[must_use]
pub fn unescape(text: &str) -> String {
    let text = text
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // Entities are decoded last so escaped brackets stay literal text.
    let collapsed = SPECIAL_TOKEN_RE
        .replace_all(&text, |caps: &Captures<'_>| {
            let sign = &caps[1];
            let inner = &caps[2];
            let rhs = inner.split_once('|').map_or(inner, |(_, label)| label);
            match sign {
                "@" | "!" => format!("@{rhs}"),
                "#" => format!("#{rhs}"),
                _ => rhs.to_string(),
            }
        });
    decode_entities(&collapsed)
}

fn decode_entities(text: &str) -> String {
    // `&amp;` last so `&amp;lt;` decodes to `&lt;` rather than `<`.
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Matches one mention of `user_id` in unescaped text, together with the
/// comma and whitespace separators around it. The mention has to start the
/// text or follow a separator, so literal `<@U1>` is not a mention.
#[must_use]
pub fn mention_pattern(user_id: &str) -> Regex {
    let pattern = format!(r"(?:^|,\s+|\s+)@{}\b,?\s*", regex::escape(user_id));
    Regex::new(&pattern).expect("escaped mention pattern compiles")
}

/// Removes the first mention of `user_id` from already-unescaped text.
#[must_use]
pub fn strip_mention(text: &str, user_id: &str) -> String {
    mention_pattern(user_id).replacen(text, 1, "").into_owned()
}
