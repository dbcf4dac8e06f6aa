//! ChatWork room posts against a local mock of the ChatWork API.

use chrono::{TimeZone, Utc};
use chrono_tz::Asia::Tokyo;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use yoyaku_chatwork::ChatworkAlerter;
use yoyaku_common::models::OperationalAlert;
use yoyaku_common::services::AlertSink;
use yoyaku_common::AlertError;
use yoyaku_config::ChatworkConfig;

fn alerter(server: &MockServer) -> ChatworkAlerter {
    ChatworkAlerter::new(
        ChatworkConfig {
            api_token: "cw-token".to_string(),
            room_id: "123456".to_string(),
            api_base_url: Some(server.uri()),
        },
        Tokyo,
    )
}

fn system_error() -> OperationalAlert {
    OperationalAlert::SystemError {
        message: "calendar unavailable".to_string(),
        occurred_at: Utc.with_ymd_and_hms(2025, 6, 2, 5, 0, 0).unwrap(),
    }
}

#[tokio::test]
async fn test_alert_is_posted_as_form_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rooms/123456/messages"))
        .and(header("x-chatworktoken", "cw-token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("body=%5Btoall%5D"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"message_id":"1"}"#))
        .expect(1)
        .mount(&server)
        .await;

    alerter(&server)
        .send_operational_alert(system_error())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_posted_text_decodes_to_rendered_alert() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    alerter(&server)
        .send_operational_alert(system_error())
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let form: Vec<(String, String)> = serde_urlencoded::from_bytes(&requests[0].body).unwrap();
    assert_eq!(form.len(), 1);
    assert_eq!(form[0].0, "body");
    assert!(form[0].1.contains("エラー内容: calendar unavailable\n"));
    assert!(form[0].1.contains("発生時刻: 2025-06-02 14:00:00\n"));
}

#[tokio::test]
async fn test_rejected_post_surfaces_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"errors":["Invalid API token"]}"#))
        .mount(&server)
        .await;

    let err = alerter(&server)
        .send_operational_alert(system_error())
        .await
        .unwrap_err();
    assert!(matches!(err, AlertError::Rejected { status: 401, ref body } if body.contains("Invalid API token")));
}
