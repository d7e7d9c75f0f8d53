use httpmock::Method::POST;
use httpmock::MockServer;
use serde_json::json;
use slack_ingress::SlackError;
use slack_ingress::slack::{PostMessage, SlackApi, SlackClient};

fn client(server: &MockServer) -> SlackClient {
    SlackClient::with_base_url("xoxb-test".to_string(), &server.base_url())
}

#[tokio::test]
async fn users_info_sends_token_and_returns_bundle() {
    let server = MockServer::start_async().await;
    let info = server.mock(|when, then| {
        when.method(POST)
            .path("/users.info")
            .header("authorization", "Bearer xoxb-test")
            .body_includes("user=U2");
        then.status(200).json_body(json!({
            "ok": true,
            "user": {"id": "U2", "name": "ada", "is_bot": false}
        }));
    });

    let response = client(&server).users_info("U2").await.unwrap();

    info.assert();
    assert_eq!(response["user"]["name"], "ada");
}

#[tokio::test]
async fn auth_test_uses_overridden_base_url() {
    let server = MockServer::start_async().await;
    let auth = server.mock(|when, then| {
        when.method(POST).path("/auth.test");
        then.status(200)
            .json_body(json!({"ok": true, "user_id": "UBOT"}));
    });

    let response = client(&server).auth_test().await.unwrap();

    auth.assert();
    assert_eq!(response["user_id"], "UBOT");
}

#[tokio::test]
async fn conversations_members_follows_cursors() {
    let server = MockServer::start_async().await;
    let first = server.mock(|when, then| {
        when.method(POST)
            .path("/conversations.members")
            .body_includes("cursor=&channel=C1");
        then.status(200).json_body(json!({
            "ok": true,
            "members": ["U3", "U1"],
            "response_metadata": {"next_cursor": "page2"}
        }));
    });
    let second = server.mock(|when, then| {
        when.method(POST)
            .path("/conversations.members")
            .body_includes("cursor=page2&channel=C1");
        then.status(200).json_body(json!({
            "ok": true,
            "members": ["U2", "U1"],
            "response_metadata": {"next_cursor": ""}
        }));
    });

    let members = client(&server).conversations_members("C1").await.unwrap();

    first.assert_calls(1);
    second.assert_calls(1);
    assert_eq!(members, ["U3", "U1", "U2", "U1"]);
}

#[tokio::test]
async fn chat_post_message_sends_json() {
    let server = MockServer::start_async().await;
    let post = server.mock(|when, then| {
        when.method(POST)
            .path("/chat.postMessage")
            .body_includes("\"channel\":\"C1\"")
            .body_includes("\"thread_ts\":\"1234567.89\"");
        then.status(200)
            .json_body(json!({"ok": true, "channel": "C1", "ts": "2.0"}));
    });

    let message = PostMessage::new("C1")
        .with_text("on it")
        .in_thread(Some("1234567.89"));
    let response = client(&server).chat_post_message(&message).await.unwrap();

    post.assert();
    assert_eq!(response["ts"], "2.0");
}

#[tokio::test]
async fn empty_message_never_reaches_slack() {
    let server = MockServer::start_async().await;
    let post = server.mock(|when, then| {
        when.method(POST).path("/chat.postMessage");
        then.status(200).json_body(json!({"ok": true}));
    });

    let err = client(&server)
        .chat_post_message(&PostMessage::new("C1"))
        .await
        .unwrap_err();

    assert!(matches!(err, SlackError::InvalidRequest(_)));
    post.assert_calls(0);
}

#[tokio::test]
async fn reactions_add_strips_colons() {
    let server = MockServer::start_async().await;
    let react = server.mock(|when, then| {
        when.method(POST)
            .path("/reactions.add")
            .body_includes("\"name\":\"thumbsup\"")
            .body_includes("\"timestamp\":\"1.5\"");
        then.status(200).json_body(json!({"ok": true}));
    });

    client(&server)
        .reactions_add("C1", ":thumbsup:", "1.5")
        .await
        .unwrap();

    react.assert();
}

#[tokio::test]
async fn slack_errors_are_not_retried() {
    let server = MockServer::start_async().await;
    let info = server.mock(|when, then| {
        when.method(POST).path("/conversations.info");
        then.status(200)
            .json_body(json!({"ok": false, "error": "channel_not_found"}));
    });

    let err = client(&server).conversations_info("C404").await.unwrap_err();

    info.assert_calls(1);
    match err {
        SlackError::ApiError(msg) => assert!(msg.contains("channel_not_found"), "{msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn server_errors_are_retried_then_reported() {
    let server = MockServer::start_async().await;
    let info = server.mock(|when, then| {
        when.method(POST).path("/users.info");
        then.status(503).body("unavailable");
    });

    let err = client(&server).users_info("U2").await.unwrap_err();

    info.assert_calls(4);
    assert!(matches!(err, SlackError::HttpError(_)));
}

#[tokio::test]
async fn posts_are_never_replayed_after_server_errors() {
    let server = MockServer::start_async().await;
    let post = server.mock(|when, then| {
        when.method(POST).path("/chat.postMessage");
        then.status(503).body("unavailable");
    });

    let message = PostMessage::new("C1").with_text("deploy finished");
    let err = client(&server).chat_post_message(&message).await.unwrap_err();

    post.assert_calls(1);
    assert!(matches!(err, SlackError::HttpError(_)));
}

#[tokio::test]
async fn reactions_are_not_replayed_when_rate_limited() {
    let server = MockServer::start_async().await;
    let react = server.mock(|when, then| {
        when.method(POST).path("/reactions.add");
        then.status(429).header("retry-after", "1");
    });

    let err = client(&server)
        .reactions_add("C1", "eyes", "1234567.89")
        .await
        .unwrap_err();

    react.assert_calls(1);
    assert!(matches!(err, SlackError::HttpError(_)));
}
