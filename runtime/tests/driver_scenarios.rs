//! Integration tests for the request driver
//!
//! Drives requests through recording dispatchers and scripted executors and
//! checks the emitted lifecycle and the state it folds into.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use proptest::prelude::*;
use request_state_core::action::{RequestAction, reset_request_state};
use request_state_core::action_set::make_action_set;
use request_state_core::executor::{Method, RequestDescriptor};
use request_state_core::meta::RequestOptions;
use request_state_core::outcome::{Outcome, RequestError, Response};
use request_state_core::query::{
    get_error_data, get_response_state, has_failed, has_succeeded, is_pending,
};
use request_state_core::request_state::RequestState;
use request_state_core::responses::reduce;
use request_state_core::state::ResponseState;
use request_state_runtime::RequestDriver;
use request_state_runtime::driver::{request, request_from_fn, request_with_config};
use request_state_testing::{GatedExecutor, MockExecutor, RecordingDispatcher, init_test_tracing};
use serde_json::json;

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_tagged_request_succeeds() {
    init_test_tracing();
    let dispatcher = RecordingDispatcher::new();
    let fetch_user = make_action_set("FETCH_USER");

    let result = request_from_fn(
        &dispatcher,
        &fetch_user,
        || async { Ok(Response::ok(json!({"id": 42}))) },
        RequestOptions::new().with_tag("42"),
    )
    .await;

    assert!(matches!(result, Ok(Some(_))));

    let state = dispatcher.state();
    assert_eq!(
        state.get("FETCH_USER_REQUEST", "42"),
        Some(&ResponseState::new(
            RequestState::Success,
            Some(Outcome::Success(Response::ok(json!({"id": 42}))))
        ))
    );
    assert!(has_succeeded(&state, &fetch_user, Some("42")));
    assert!(!has_succeeded(&state, &fetch_user, Some("7")));
}

#[tokio::test]
async fn test_untagged_failure_is_recorded_and_swallowed() {
    let dispatcher = RecordingDispatcher::new();
    let fetch_user = make_action_set("FETCH_USER");

    let result = request_from_fn(
        &dispatcher,
        &fetch_user,
        || async { Err(RequestError::network("timeout")) },
        RequestOptions::new(),
    )
    .await;

    assert_eq!(result, Ok(None));

    let state = dispatcher.state();
    assert_eq!(
        state.get("FETCH_USER_REQUEST", ""),
        Some(&ResponseState::new(
            RequestState::Failure,
            Some(Outcome::Failure(RequestError::network("timeout")))
        ))
    );
    assert_eq!(
        get_error_data(&state, &fetch_user, None).map(|e| e.message.as_str()),
        Some("timeout")
    );
}

#[tokio::test]
async fn test_reset_after_success_clears_slot() {
    let dispatcher = RecordingDispatcher::new();
    let fetch_user = make_action_set("FETCH_USER");

    let _ = request_from_fn(
        &dispatcher,
        &fetch_user,
        || async { Ok(Response::ok(json!({"id": 42}))) },
        RequestOptions::new().with_tag("42"),
    )
    .await;

    let state = reduce(&dispatcher.state(), &reset_request_state(&fetch_user, Some("42")));

    assert_eq!(
        get_response_state(&state, &fetch_user, Some("42")),
        &ResponseState::cleared()
    );
    assert!(!is_pending(&state, &fetch_user, Some("42")));
    assert!(!has_failed(&state, &fetch_user, Some("42")));
    assert!(!has_succeeded(&state, &fetch_user, Some("42")));
}

// ============================================================================
// Emitted events
// ============================================================================

#[tokio::test]
async fn test_raw_events_carry_meta_and_tag_wins() {
    let dispatcher = RecordingDispatcher::new();
    let save = make_action_set("SAVE_USER");

    let _ = request_from_fn(
        &dispatcher,
        &save,
        || async { Err(RequestError::network("offline")) },
        RequestOptions::new()
            .with_meta("tag", "ignored")
            .with_meta("form", "profile")
            .with_tag("9"),
    )
    .await;

    let actions = dispatcher.actions();
    assert_eq!(
        dispatcher.action_types(),
        ["SAVE_USER_REQUEST", "REQUEST_STATE", "SAVE_USER_FAILURE", "REQUEST_STATE"]
    );

    let RequestAction::Started { meta, .. } = &actions[0] else {
        panic!("expected the raw request event first, got {:?}", actions[0]);
    };
    assert_eq!(meta.tag(), "9");
    assert_eq!(meta.get("form"), Some(&json!("profile")));

    let failure = actions[2].to_json().expect("raw failure encodes");
    assert_eq!(failure["type"], "SAVE_USER_FAILURE");
    assert_eq!(failure["error"], true);
    assert_eq!(failure["meta"]["tag"], "9");
    assert_eq!(failure["meta"]["form"], "profile");
    assert_eq!(failure["payload"]["message"], "offline");

    assert_eq!(actions[1].tag(), "9");
    assert_eq!(actions[3].tag(), "9");
}

#[tokio::test]
async fn test_pending_is_visible_while_executor_runs() {
    let dispatcher = RecordingDispatcher::new();
    let executor = GatedExecutor::new();
    let fetch = make_action_set("FETCH");

    let driver = {
        let dispatcher = dispatcher.clone();
        let executor = executor.clone();
        let fetch = fetch.clone();
        tokio::spawn(async move {
            request_with_config(
                &dispatcher,
                &fetch,
                &executor,
                RequestDescriptor::get("/api/fetch/"),
                RequestOptions::new(),
            )
            .await
        })
    };

    let gate = executor.next_call().await.expect("the executor was called");
    assert_eq!(dispatcher.len(), 2);
    assert!(is_pending(&dispatcher.state(), &fetch, None));

    assert!(gate.resolve(Ok(Response::ok(json!([])))));
    let result = driver.await.expect("driver task completes");

    assert!(matches!(result, Ok(Some(_))));
    assert!(has_succeeded(&dispatcher.state(), &fetch, None));
}

#[tokio::test]
async fn test_concurrent_tags_settle_independently() {
    let dispatcher = RecordingDispatcher::new();
    let executor = GatedExecutor::new();
    let fetch = make_action_set("FETCH_USER");

    let drivers: Vec<_> = ["1", "2"]
        .into_iter()
        .map(|tag| {
            let dispatcher = dispatcher.clone();
            let executor = executor.clone();
            let fetch = fetch.clone();
            tokio::spawn(async move {
                request(
                    &dispatcher,
                    &fetch,
                    &executor,
                    format!("/api/users/{tag}/"),
                    Method::Get,
                    None,
                    RequestOptions::new().with_tag(tag),
                )
                .await
            })
        })
        .collect();

    let first = executor.next_call().await.expect("first call");
    let second = executor.next_call().await.expect("second call");

    // Settle in reverse order of arrival
    let (fail, succeed) = (second, first);
    let failed_tag = if fail.request.url.contains("/1/") { "1" } else { "2" };
    let succeeded_tag = if failed_tag == "1" { "2" } else { "1" };

    assert!(fail.resolve(Err(RequestError::network("reset"))));
    assert!(succeed.resolve(Ok(Response::ok(json!({})))));
    for driver in drivers {
        assert!(driver.await.expect("driver task completes").is_ok());
    }

    let state = dispatcher.state();
    assert!(has_failed(&state, &fetch, Some(failed_tag)));
    assert!(has_succeeded(&state, &fetch, Some(succeeded_tag)));
    assert!(!is_pending(&state, &fetch, None));
}

// ============================================================================
// Rethrow
// ============================================================================

#[tokio::test]
async fn test_rethrow_returns_exact_executor_error() {
    let dispatcher = RecordingDispatcher::new();
    let error = RequestError::status(Response::new(403, json!({"detail": "forbidden"})));
    let executor = MockExecutor::new().respond_err(error.clone());
    let driver = RequestDriver::new(dispatcher.clone(), executor.clone());

    let result = driver
        .request(
            &make_action_set("DELETE_POST"),
            "/api/posts/1/",
            Method::Delete,
            None,
            RequestOptions::new().always_rethrow(),
        )
        .await;

    assert_eq!(result, Err(error));
    assert_eq!(executor.requests()[0].method, Method::Delete);
    assert_eq!(dispatcher.len(), 4);
}

proptest! {
    #[test]
    fn prop_rethrow_gating(rethrow in any::<bool>(), status in 400u16..600) {
        let dispatcher = RecordingDispatcher::new();
        let error = RequestError::status(Response::new(status, json!(null)));
        let options = RequestOptions::new().with_should_rethrow(move |_| rethrow);
        let returned = error.clone();

        let result = tokio_test::block_on(request_from_fn(
            &dispatcher,
            &make_action_set("P"),
            move || async move { Err(returned) },
            options,
        ));

        if rethrow {
            prop_assert_eq!(result, Err(error));
        } else {
            prop_assert_eq!(result, Ok(None));
        }
        prop_assert_eq!(dispatcher.len(), 4);
    }

    #[test]
    fn prop_pending_precedes_outcome(succeed in any::<bool>(), tag in "[a-z]{0,3}") {
        let dispatcher = RecordingDispatcher::new();
        let set = make_action_set("ORDERED");

        let _ = tokio_test::block_on(request_from_fn(
            &dispatcher,
            &set,
            move || async move {
                if succeed {
                    Ok(Response::ok(json!(1)))
                } else {
                    Err(RequestError::network("down"))
                }
            },
            RequestOptions::new().with_tag(tag.clone()),
        ));

        let snapshots = dispatcher.snapshots();
        prop_assert_eq!(snapshots.len(), 4);
        prop_assert!(is_pending(&snapshots[1], &set, Some(&tag)));
        prop_assert!(!is_pending(&snapshots[3], &set, Some(&tag)));
        prop_assert_eq!(has_succeeded(&snapshots[3], &set, Some(&tag)), succeed);
    }
}
