//! The request driver.
//!
//! One call drives one request attempt through its lifecycle:
//!
//! 1. `<NAME>_REQUEST` with the request metadata
//! 2. `REQUEST_STATE` / `REQUEST` for the slot
//! 3. the executor call, started only now
//! 4. `<NAME>_SUCCESS` then `REQUEST_STATE` / `SUCCESS`, or
//!    `<NAME>_FAILURE` then `REQUEST_STATE` / `FAILURE`
//!
//! Every dispatch is awaited before the next one starts. Failures are always
//! recorded in the slot; they reach the caller as `Err` only when the
//! options' rethrow predicate asks for it.

use futures::Future;
use request_state_core::action::{RequestAction, set_request_state};
use request_state_core::action_set::ActionSet;
use request_state_core::dispatch::Dispatcher;
use request_state_core::executor::{Method, RequestDescriptor, RequestExecutor};
use request_state_core::meta::RequestOptions;
use request_state_core::outcome::{Outcome, RequestError, Response};
use request_state_core::request_state::RequestState;
use serde_json::Value;
use std::fmt;

/// Drive one request whose transport is an arbitrary async call
///
/// Resolves with:
/// - `Ok(Some(response))` when the call succeeded
/// - `Ok(None)` when it failed and the failure was only recorded
/// - `Err(error)` when it failed and `options` asked for a rethrow
///
/// # Errors
///
/// Returns the executor's error when [`RequestOptions::should_rethrow`]
/// accepts it.
///
/// # Example
///
/// ```
/// use request_state_core::action::RequestAction;
/// use request_state_core::action_set::make_action_set;
/// use request_state_core::meta::RequestOptions;
/// use request_state_core::outcome::RequestError;
/// use request_state_runtime::driver::request_from_fn;
/// use std::sync::Mutex;
///
/// # tokio_test::block_on(async {
/// let seen = Mutex::new(Vec::new());
/// let dispatcher = |action: RequestAction| {
///     if let Ok(mut seen) = seen.lock() {
///         seen.push(action.action_type().to_owned());
///     }
/// };
///
/// let result = request_from_fn(
///     &dispatcher,
///     &make_action_set("SAVE"),
///     || async { Err(RequestError::network("offline")) },
///     RequestOptions::new(),
/// )
/// .await;
///
/// assert!(matches!(result, Ok(None)));
/// assert_eq!(
///     seen.into_inner().unwrap_or_default(),
///     ["SAVE_REQUEST", "REQUEST_STATE", "SAVE_FAILURE", "REQUEST_STATE"]
/// );
/// # });
/// ```
#[tracing::instrument(
    skip_all,
    name = "request",
    fields(action = %action_set.request(), tag = %options.tag())
)]
pub async fn request_from_fn<D, F, Fut>(
    dispatcher: &D,
    action_set: &ActionSet,
    executor_call: F,
    options: RequestOptions,
) -> Result<Option<Response>, RequestError>
where
    D: Dispatcher + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Response, RequestError>>,
{
    let meta = options.meta();
    let tag = meta.tag().to_owned();

    metrics::counter!("requests.started").increment(1);
    dispatcher
        .dispatch(RequestAction::Started {
            action_set: action_set.clone(),
            meta: meta.clone(),
        })
        .await;
    dispatcher
        .dispatch(set_request_state(action_set, RequestState::Request, None, Some(&tag)))
        .await;
    tracing::debug!("Request pending");

    match executor_call().await {
        Ok(response) => {
            metrics::counter!("requests.succeeded").increment(1);
            tracing::debug!(status = response.status, "Request succeeded");

            dispatcher
                .dispatch(RequestAction::Succeeded {
                    action_set: action_set.clone(),
                    response: response.clone(),
                    meta,
                })
                .await;
            dispatcher
                .dispatch(set_request_state(
                    action_set,
                    RequestState::Success,
                    Some(Outcome::Success(response.clone())),
                    Some(&tag),
                ))
                .await;

            Ok(Some(response))
        },
        Err(error) => {
            metrics::counter!("requests.failed").increment(1);
            tracing::debug!(error = %error, "Request failed");

            dispatcher
                .dispatch(RequestAction::Failed {
                    action_set: action_set.clone(),
                    error: error.clone(),
                    meta,
                })
                .await;
            dispatcher
                .dispatch(set_request_state(
                    action_set,
                    RequestState::Failure,
                    Some(Outcome::Failure(error.clone())),
                    Some(&tag),
                ))
                .await;

            if options.should_rethrow(&error) {
                metrics::counter!("requests.rethrown").increment(1);
                tracing::debug!("Rethrowing failure to caller");
                Err(error)
            } else {
                Ok(None)
            }
        },
    }
}

/// Drive one request described by a [`RequestDescriptor`]
///
/// # Errors
///
/// See [`request_from_fn`].
pub async fn request_with_config<D, X>(
    dispatcher: &D,
    action_set: &ActionSet,
    executor: &X,
    descriptor: RequestDescriptor,
    options: RequestOptions,
) -> Result<Option<Response>, RequestError>
where
    D: Dispatcher + ?Sized,
    X: RequestExecutor + ?Sized,
{
    request_from_fn(dispatcher, action_set, || executor.execute(descriptor), options).await
}

/// Drive one request to `url`
///
/// The caller's headers from `options` are sent with it.
///
/// # Errors
///
/// See [`request_from_fn`].
pub async fn request<D, X>(
    dispatcher: &D,
    action_set: &ActionSet,
    executor: &X,
    url: impl Into<String>,
    method: Method,
    data: Option<Value>,
    options: RequestOptions,
) -> Result<Option<Response>, RequestError>
where
    D: Dispatcher + ?Sized,
    X: RequestExecutor + ?Sized,
{
    let mut descriptor = RequestDescriptor::new(url, method).with_headers(options.headers().clone());
    descriptor.data = data;
    request_with_config(dispatcher, action_set, executor, descriptor, options).await
}

/// A dispatcher and an executor, bundled
///
/// Clone it freely when both halves are cheap to clone, as a
/// [`Store`](crate::Store) and an HTTP client are.
#[derive(Clone)]
pub struct RequestDriver<D, X> {
    dispatcher: D,
    executor: X,
}

impl<D, X> RequestDriver<D, X>
where
    D: Dispatcher,
    X: RequestExecutor,
{
    /// Bundle a dispatcher with an executor
    #[must_use]
    pub const fn new(dispatcher: D, executor: X) -> Self {
        Self {
            dispatcher,
            executor,
        }
    }

    /// The dispatcher lifecycle actions go to
    #[must_use]
    pub const fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// The executor requests go to
    #[must_use]
    pub const fn executor(&self) -> &X {
        &self.executor
    }

    /// See [`request_from_fn`]
    ///
    /// # Errors
    ///
    /// Returns the call's error when the options ask for a rethrow.
    pub async fn request_from_fn<F, Fut>(
        &self,
        action_set: &ActionSet,
        executor_call: F,
        options: RequestOptions,
    ) -> Result<Option<Response>, RequestError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Response, RequestError>>,
    {
        request_from_fn(&self.dispatcher, action_set, executor_call, options).await
    }

    /// See [`request_with_config`]
    ///
    /// # Errors
    ///
    /// Returns the executor's error when the options ask for a rethrow.
    pub async fn request_with_config(
        &self,
        action_set: &ActionSet,
        descriptor: RequestDescriptor,
        options: RequestOptions,
    ) -> Result<Option<Response>, RequestError> {
        request_with_config(&self.dispatcher, action_set, &self.executor, descriptor, options).await
    }

    /// See [`request`]
    ///
    /// # Errors
    ///
    /// Returns the executor's error when the options ask for a rethrow.
    pub async fn request(
        &self,
        action_set: &ActionSet,
        url: impl Into<String>,
        method: Method,
        data: Option<Value>,
        options: RequestOptions,
    ) -> Result<Option<Response>, RequestError> {
        request(&self.dispatcher, action_set, &self.executor, url, method, data, options).await
    }
}

impl<D, X> fmt::Debug for RequestDriver<D, X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDriver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use request_state_core::action_set::make_action_set;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<RequestAction>>);

    impl Collect {
        fn types(&self) -> Vec<String> {
            self.0
                .lock()
                .map(|actions| actions.iter().map(|a| a.action_type().to_owned()).collect())
                .unwrap_or_default()
        }
    }

    impl Dispatcher for Collect {
        fn dispatch(&self, action: RequestAction) -> futures::future::BoxFuture<'_, ()> {
            if let Ok(mut actions) = self.0.lock() {
                actions.push(action);
            }
            Box::pin(futures::future::ready(()))
        }
    }

    #[tokio::test]
    async fn test_success_order_and_result() {
        let collect = Collect::default();
        let set = make_action_set("FETCH_USER");

        let result = request_from_fn(
            &collect,
            &set,
            || async { Ok(Response::ok(json!({"id": 42}))) },
            RequestOptions::new().with_tag("42"),
        )
        .await;

        assert_eq!(result, Ok(Some(Response::ok(json!({"id": 42})))));
        assert_eq!(
            collect.types(),
            ["FETCH_USER_REQUEST", "REQUEST_STATE", "FETCH_USER_SUCCESS", "REQUEST_STATE"]
        );
    }

    #[tokio::test]
    async fn test_executor_starts_after_pending_is_announced() {
        let collect = Collect::default();
        let seen_before_call = Mutex::new(0);

        let _ = request_from_fn(
            &collect,
            &make_action_set("A"),
            || {
                if let Ok(mut seen) = seen_before_call.lock() {
                    *seen = collect.types().len();
                }
                async { Ok(Response::ok(Value::Null)) }
            },
            RequestOptions::new(),
        )
        .await;

        assert_eq!(seen_before_call.into_inner().ok(), Some(2));
    }

    #[tokio::test]
    async fn test_rethrow_is_gated_by_predicate() {
        let collect = Collect::default();
        let set = make_action_set("SAVE");
        let unauthorized = || async {
            Err(RequestError::status(Response::new(401, json!({"detail": "login"}))))
        };

        let swallowed = request_from_fn(
            &collect,
            &set,
            unauthorized,
            RequestOptions::new().with_should_rethrow(|e| e.status_code() == Some(500)),
        )
        .await;
        assert_eq!(swallowed, Ok(None));

        let rethrown = request_from_fn(
            &collect,
            &set,
            unauthorized,
            RequestOptions::new().with_should_rethrow(|e| e.status_code() == Some(401)),
        )
        .await;
        assert_eq!(rethrown.map_err(|e| e.status_code()), Err(Some(401)));

        // Both failures were recorded regardless
        assert_eq!(collect.types().iter().filter(|t| *t == "SAVE_FAILURE").count(), 2);
    }

    #[tokio::test]
    async fn test_request_merges_option_headers() {
        struct Echo;

        impl RequestExecutor for Echo {
            fn execute(
                &self,
                request: RequestDescriptor,
            ) -> futures::future::BoxFuture<'_, Result<Response, RequestError>> {
                Box::pin(async move {
                    Ok(Response::ok(json!({
                        "url": request.url,
                        "method": request.method,
                        "data": request.data,
                        "auth": request.headers.get("Authorization"),
                    })))
                })
            }
        }

        let collect = Collect::default();
        let response = request(
            &collect,
            &make_action_set("CREATE"),
            &Echo,
            "/api/things/",
            Method::Post,
            Some(json!({"name": "x"})),
            RequestOptions::new().with_header("Authorization", "Token t"),
        )
        .await;

        let body = response.ok().flatten().map(|r| r.body);
        assert_eq!(
            body,
            Some(json!({
                "url": "/api/things/",
                "method": "POST",
                "data": {"name": "x"},
                "auth": "Token t",
            }))
        );
    }
}
