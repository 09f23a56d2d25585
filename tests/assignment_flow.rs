// End-to-end tests for the assignment coordinator: local validation,
// request dedup and how server verdicts are reported.
use examplan::client::{ApiClient, GENERIC_ASSIGN_ERROR};
use examplan::coordinator::{AssignError, AssignGesture, AssignOutcome, AssignmentCoordinator};
use examplan::model::validate::{DropPolicy, DropRejection};
use mockito::Server;

use chrono::NaiveDate;
use std::collections::HashSet;

fn february_policy() -> DropPolicy {
    // 2026-02-14 is blocked; the range is Feb 2 to Feb 27.
    let blocked: HashSet<NaiveDate> = [NaiveDate::from_ymd_opt(2026, 2, 14).unwrap()]
        .into_iter()
        .collect();
    DropPolicy::new(
        NaiveDate::from_ymd_opt(2026, 2, 2).unwrap(),
        NaiveDate::from_ymd_opt(2026, 2, 27).unwrap(),
        blocked,
    )
}

fn saved_event_body() -> &'static str {
    r#"{"id": 42, "calendar": 7, "subject": 5, "subject_name": "Algebra",
        "semester_group": "SEM2", "date": "2026-02-16"}"#
}

#[tokio::test]
async fn valid_drop_is_saved() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/calendars/7/assign_event/")
        .match_body(mockito::Matcher::Json(serde_json::json!({
            "subject": 5,
            "date": "2026-02-16"
        })))
        .with_status(201)
        .with_body(saved_event_body())
        .create_async()
        .await;

    let client = ApiClient::new(&server.url(), false).unwrap();
    let coordinator = AssignmentCoordinator::new();
    let gesture = AssignGesture {
        subject: 5,
        date: NaiveDate::from_ymd_opt(2026, 2, 16).unwrap(),
        event_id: None,
    };

    let outcome = coordinator
        .assign(&client, &february_policy(), 7, &gesture)
        .await
        .unwrap();
    assert_eq!(outcome, AssignOutcome::Saved);
    mock.assert_async().await;
}

#[tokio::test]
async fn concurrent_identical_gestures_send_one_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/calendars/7/assign_event/")
        .with_status(201)
        .with_body(saved_event_body())
        .expect(1)
        .create_async()
        .await;

    let client = ApiClient::new(&server.url(), false).unwrap();
    let coordinator = AssignmentCoordinator::new();
    let policy = february_policy();
    let gesture = AssignGesture {
        subject: 5,
        date: NaiveDate::from_ymd_opt(2026, 2, 16).unwrap(),
        event_id: None,
    };

    // The dedup key is claimed synchronously before the request awaits, so
    // the second future sees it no matter how the two interleave.
    let (first, second) = futures::join!(
        coordinator.assign(&client, &policy, 7, &gesture),
        coordinator.assign(&client, &policy, 7, &gesture),
    );

    let outcomes = [first.unwrap(), second.unwrap()];
    assert!(outcomes.contains(&AssignOutcome::Saved));
    assert!(outcomes.contains(&AssignOutcome::Duplicate));
    mock.assert_async().await;
}

#[tokio::test]
async fn gesture_key_is_released_after_settling() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/calendars/7/assign_event/")
        .with_status(201)
        .with_body(saved_event_body())
        .expect(2)
        .create_async()
        .await;

    let client = ApiClient::new(&server.url(), false).unwrap();
    let coordinator = AssignmentCoordinator::new();
    let policy = february_policy();
    let gesture = AssignGesture {
        subject: 5,
        date: NaiveDate::from_ymd_opt(2026, 2, 16).unwrap(),
        event_id: None,
    };

    // Sequential identical gestures both go through.
    let first = coordinator.assign(&client, &policy, 7, &gesture).await;
    let second = coordinator.assign(&client, &policy, 7, &gesture).await;
    assert_eq!(first.unwrap(), AssignOutcome::Saved);
    assert_eq!(second.unwrap(), AssignOutcome::Saved);
    mock.assert_async().await;
}

#[tokio::test]
async fn soft_rule_warning_is_surfaced() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/calendars/7/assign_event/")
        .with_status(201)
        .with_body(
            r#"{"id": 42, "calendar": 7, "subject": 5, "subject_name": "Algebra",
                "semester_group": "SEM2", "date": "2026-02-16",
                "warning": {"severity": "soft", "message": "Heavy subjects sit on adjacent days."}}"#,
        )
        .create_async()
        .await;

    let client = ApiClient::new(&server.url(), false).unwrap();
    let coordinator = AssignmentCoordinator::new();
    let gesture = AssignGesture {
        subject: 5,
        date: NaiveDate::from_ymd_opt(2026, 2, 16).unwrap(),
        event_id: None,
    };

    let outcome = coordinator
        .assign(&client, &february_policy(), 7, &gesture)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        AssignOutcome::SavedWithWarning("Heavy subjects sit on adjacent days.".to_string())
    );
}

#[tokio::test]
async fn server_rejection_message_is_reported_verbatim() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/calendars/7/assign_event/")
        .with_status(400)
        .with_body(r#"{"message": "Physics II may only be scheduled on Tuesday."}"#)
        .create_async()
        .await;

    let client = ApiClient::new(&server.url(), false).unwrap();
    let coordinator = AssignmentCoordinator::new();
    let gesture = AssignGesture {
        subject: 5,
        date: NaiveDate::from_ymd_opt(2026, 2, 16).unwrap(),
        event_id: None,
    };

    let err = coordinator
        .assign(&client, &february_policy(), 7, &gesture)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        AssignError::Rejected("Physics II may only be scheduled on Tuesday.".to_string())
    );
}

#[tokio::test]
async fn unstructured_failure_collapses_to_the_generic_message() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/calendars/7/assign_event/")
        .with_status(500)
        .with_body("<html>Internal Server Error</html>")
        .create_async()
        .await;

    let client = ApiClient::new(&server.url(), false).unwrap();
    let coordinator = AssignmentCoordinator::new();
    let gesture = AssignGesture {
        subject: 5,
        date: NaiveDate::from_ymd_opt(2026, 2, 16).unwrap(),
        event_id: None,
    };

    let err = coordinator
        .assign(&client, &february_policy(), 7, &gesture)
        .await
        .unwrap_err();
    assert_eq!(err, AssignError::Rejected(GENERIC_ASSIGN_ERROR.to_string()));
}

#[tokio::test]
async fn invalid_drops_never_reach_the_network() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/calendars/7/assign_event/")
        .expect(0)
        .create_async()
        .await;

    let client = ApiClient::new(&server.url(), false).unwrap();
    let coordinator = AssignmentCoordinator::new();
    let policy = february_policy();

    let cases = [
        // In-range Sunday.
        (
            NaiveDate::from_ymd_opt(2026, 2, 15).unwrap(),
            DropRejection::RestDay,
        ),
        // Blocked holiday.
        (
            NaiveDate::from_ymd_opt(2026, 2, 14).unwrap(),
            DropRejection::BlockedDay,
        ),
        // A Monday past the end of the range.
        (
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            DropRejection::OutsideRange,
        ),
    ];

    for (date, expected) in cases {
        let gesture = AssignGesture {
            subject: 5,
            date,
            event_id: None,
        };
        let err = coordinator
            .assign(&client, &policy, 7, &gesture)
            .await
            .unwrap_err();
        assert_eq!(err, AssignError::Invalid(expected));
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn move_gesture_includes_the_event_id() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/calendars/7/assign_event/")
        .match_body(mockito::Matcher::Json(serde_json::json!({
            "subject": 5,
            "date": "2026-02-17",
            "event_id": 42
        })))
        .with_status(200)
        .with_body(
            r#"{"id": 42, "calendar": 7, "subject": 5, "subject_name": "Algebra",
                "semester_group": "SEM2", "date": "2026-02-17"}"#,
        )
        .create_async()
        .await;

    let client = ApiClient::new(&server.url(), false).unwrap();
    let coordinator = AssignmentCoordinator::new();
    let gesture = AssignGesture {
        subject: 5,
        date: NaiveDate::from_ymd_opt(2026, 2, 17).unwrap(),
        event_id: Some(42),
    };

    let outcome = coordinator
        .assign(&client, &february_policy(), 7, &gesture)
        .await
        .unwrap();
    assert_eq!(outcome, AssignOutcome::Saved);
    mock.assert_async().await;
}
