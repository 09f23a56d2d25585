// Integration tests for the REST client against a mock backend.
use examplan::client::ApiClient;
use examplan::client::ExportFormat;
use examplan::model::rules::RuleDraft;
use examplan::model::{NewSubject, RuleType, SemesterGroup, Severity};
use mockito::Server;
use serde_json::json;

#[tokio::test]
async fn login_captures_session_and_replays_csrf_on_mutations() {
    let mut server = Server::new_async().await;

    let login_mock = server
        .mock("POST", "/auth/login/")
        .match_body(mockito::Matcher::Json(
            json!({"username": "coordinator", "password": "secret"}),
        ))
        .with_status(200)
        .with_header("set-cookie", "sessionid=abc; Path=/; HttpOnly")
        .with_header("set-cookie", "csrftoken=tok; Path=/")
        .with_body(r#"{"id": 1, "username": "coordinator", "is_staff": true}"#)
        .create_async()
        .await;

    // Cookie pairs are sent sorted by name.
    let create_mock = server
        .mock("POST", "/subjects/")
        .match_header("cookie", "csrftoken=tok; sessionid=abc")
        .match_header("x-csrftoken", "tok")
        .with_status(201)
        .with_body(
            r#"{"id": 5, "name": "Algebra", "semester_group": "SEM2", "is_heavy": false}"#,
        )
        .create_async()
        .await;

    let client = ApiClient::new(&server.url(), false).unwrap();
    let user = client.login("coordinator", "secret").await.unwrap();
    assert_eq!(user.username, "coordinator");
    assert!(user.is_staff);

    let subject = client
        .create_subject(&NewSubject {
            name: "Algebra".to_string(),
            semester_group: SemesterGroup::Sem2,
            is_heavy: false,
            code: None,
        })
        .await
        .unwrap();
    assert_eq!(subject.id, 5);

    login_mock.assert_async().await;
    create_mock.assert_async().await;
}

#[tokio::test]
async fn me_returns_none_without_a_session() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/auth/me/")
        .with_status(403)
        .with_body(r#"{"detail": "Authentication credentials were not provided."}"#)
        .create_async()
        .await;

    let client = ApiClient::new(&server.url(), false).unwrap();
    assert!(client.me().await.unwrap().is_none());
}

#[tokio::test]
async fn me_rejects_a_malformed_session_payload() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/auth/me/")
        .with_status(200)
        .with_body("<html>gateway error</html>")
        .create_async()
        .await;

    let client = ApiClient::new(&server.url(), false).unwrap();
    // A broken 200 body is an error, not a missing session.
    let err = client.me().await.unwrap_err();
    assert!(err.starts_with("Invalid response payload"));
}

#[tokio::test]
async fn logout_posts_to_the_auth_endpoint() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/auth/logout/")
        .with_status(204)
        .create_async()
        .await;

    let client = ApiClient::new(&server.url(), false).unwrap();
    client.logout().await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn server_detail_message_is_surfaced() {
    let mut server = Server::new_async().await;
    server
        .mock("DELETE", "/subjects/9/")
        .with_status(403)
        .with_body(r#"{"detail": "You do not have permission to perform this action."}"#)
        .create_async()
        .await;

    let client = ApiClient::new(&server.url(), false).unwrap();
    let err = client.delete_subject(9).await.unwrap_err();
    assert_eq!(err, "You do not have permission to perform this action.");
}

#[tokio::test]
async fn toggle_blocked_day_reports_the_new_state() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/calendars/3/toggle_blocked_day/")
        .match_body(mockito::Matcher::Json(json!({"date": "2026-02-14"})))
        .with_status(200)
        .with_body(r#"{"blocked": true}"#)
        .create_async()
        .await;

    let client = ApiClient::new(&server.url(), false).unwrap();
    let date = chrono::NaiveDate::from_ymd_opt(2026, 2, 14).unwrap();
    assert!(client.toggle_blocked_day(3, date).await.unwrap());
}

#[tokio::test]
async fn weekday_rule_payload_carries_one_weekday_and_no_partner() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/rules/")
        .match_body(mockito::Matcher::Json(json!({
            "rule_type": "SUBJECT_ONLY_WEEKDAYS",
            "severity": "SOFT",
            "calendar": 3,
            "subject_a": 5,
            "params": {"allowed_weekdays": ["Tuesday"]},
            "enabled": true,
            "global_rule": false
        })))
        .with_status(201)
        .with_body(
            r#"{"id": 11, "calendar": 3, "rule_type": "SUBJECT_ONLY_WEEKDAYS",
                "severity": "SOFT", "subject_a": 5,
                "params": {"allowed_weekdays": ["Tuesday"]}, "enabled": true}"#,
        )
        .create_async()
        .await;

    let draft = RuleDraft {
        rule_type: RuleType::SubjectOnlyWeekdays,
        severity: Severity::Soft,
        subject_a: Some(5),
        subject_b: Some(6),
        weekday: chrono::Weekday::Tue,
    };
    let payload = draft.build(3).unwrap();

    let client = ApiClient::new(&server.url(), false).unwrap();
    let rule = client.create_rule(&payload).await.unwrap();
    assert_eq!(rule.id, 11);

    mock.assert_async().await;
}

#[tokio::test]
async fn pair_rule_payload_keeps_both_subjects() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/rules/")
        .match_body(mockito::Matcher::Json(json!({
            "rule_type": "SAME_DAY",
            "severity": "HARD",
            "calendar": 2,
            "subject_a": 1,
            "subject_b": 4,
            "params": {},
            "enabled": true,
            "global_rule": false
        })))
        .with_status(201)
        .with_body(
            r#"{"id": 12, "calendar": 2, "rule_type": "SAME_DAY", "severity": "HARD",
                "subject_a": 1, "subject_b": 4, "enabled": true}"#,
        )
        .create_async()
        .await;

    let draft = RuleDraft {
        rule_type: RuleType::SameDay,
        severity: Severity::Hard,
        subject_a: Some(1),
        subject_b: Some(4),
        ..Default::default()
    };
    let payload = draft.build(2).unwrap();

    let client = ApiClient::new(&server.url(), false).unwrap();
    client.create_rule(&payload).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn load_board_fetches_all_four_collections() {
    let mut server = Server::new_async().await;

    let cal_mock = server
        .mock("GET", "/calendars/1/")
        .with_body(
            r#"{"id": 1, "name": "Finals", "period_type": "F1",
                "start_date": "2026-02-02", "end_date": "2026-02-27",
                "blocked_days": [], "events": []}"#,
        )
        .create_async()
        .await;
    let subjects_mock = server
        .mock("GET", "/subjects/")
        .with_body(r#"[{"id": 5, "name": "Algebra", "semester_group": "SEM2"}]"#)
        .create_async()
        .await;
    let rules_mock = server
        .mock("GET", "/rules/")
        .with_body("[]")
        .create_async()
        .await;
    let versions_mock = server
        .mock("GET", "/versions/")
        .with_body(r#"[{"id": 2, "calendar": 1, "version_number": 1, "label": "Draft 1"}]"#)
        .create_async()
        .await;

    let client = ApiClient::new(&server.url(), false).unwrap();
    let (calendar, subjects, rules, versions) = client.load_board(1).await.unwrap();

    assert_eq!(calendar.name, "Finals");
    assert_eq!(subjects.len(), 1);
    assert!(rules.is_empty());
    assert_eq!(versions[0].label, "Draft 1");

    cal_mock.assert_async().await;
    subjects_mock.assert_async().await;
    rules_mock.assert_async().await;
    versions_mock.assert_async().await;
}

#[tokio::test]
async fn export_returns_document_bytes() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/calendars/1/export/pdf/")
        .with_header("content-type", "application/pdf")
        .with_body("%PDF-1.7 fake")
        .create_async()
        .await;

    let client = ApiClient::new(&server.url(), false).unwrap();
    let bytes = client.export(1, ExportFormat::Pdf, None).await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn export_of_a_version_adds_the_query_parameter() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/calendars/1/export/excel/")
        .match_query(mockito::Matcher::UrlEncoded(
            "version_id".into(),
            "7".into(),
        ))
        .with_body("xlsx-bytes")
        .create_async()
        .await;

    let client = ApiClient::new(&server.url(), false).unwrap();
    let bytes = client.export(1, ExportFormat::Excel, Some(7)).await.unwrap();
    assert_eq!(bytes, b"xlsx-bytes");
    mock.assert_async().await;
}
