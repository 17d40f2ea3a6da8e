//! Fetch User - drive one HTTP request into a store
//!
//! Sends `GET <url>` through the HTTP executor, logs every lifecycle action
//! the store reduces, then prints the slot the request settled into.
//!
//! # Running the Demo
//!
//! ```bash
//! REQUEST_STATE_BASE_URL=https://jsonplaceholder.typicode.com \
//!     cargo run -p fetch-user -- /users/1 1
//! ```
//!
//! Arguments are the URL (relative to the base URL, or absolute), an
//! optional tag and an optional page number appended as `?page=N`. Network failures are returned as errors; error statuses are
//! only recorded in the store.

#![allow(missing_docs)]

use request_state_core::action::{RequestAction, reset_request_state};
use request_state_core::action_set::make_action_set;
use request_state_core::executor::Method;
use request_state_core::meta::RequestOptions;
use request_state_core::outcome::{ErrorKind, Outcome};
use request_state_core::query::get_response_state;
use request_state_core::responses::ResponsesReducer;
use request_state_core::state::ResponsesState;
use request_state_http::HttpExecutor;
use request_state_http::url::format_query_params;
use request_state_runtime::{RequestDriver, Store};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,request_state_runtime=debug,fetch_user=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let url = args.next().unwrap_or_else(|| "/users/1".to_string());
    let tag = args.next();
    let page = args.next().and_then(|page| page.parse::<u32>().ok());
    let url = format!("{url}{}", format_query_params(&[("page", page)]));

    let executor = HttpExecutor::from_env()?;
    tracing::info!(base_url = ?executor.base_url(), %url, ?tag, "Starting Fetch User demo");

    let store: Store<ResponsesState, RequestAction, (), ResponsesReducer> =
        Store::new(ResponsesState::new(), ResponsesReducer::new(), ());

    let mut actions = store.subscribe_actions();
    let logger = tokio::spawn(async move {
        while let Ok(action) = actions.recv().await {
            tracing::info!(action = action.action_type(), tag = action.tag(), "Reduced");
        }
    });

    let fetch_user = make_action_set("FETCH_USER");
    let driver = RequestDriver::new(store.clone(), executor);

    let mut options = RequestOptions::new()
        .with_meta("source", "fetch-user")
        .with_should_rethrow(|error| error.kind == ErrorKind::Network);
    if let Some(tag) = &tag {
        options = options.with_tag(tag.as_str());
    }

    let result = driver
        .request(&fetch_user, url.as_str(), Method::Get, None, options)
        .await;

    store
        .state(|state| {
            let slot = get_response_state(state, &fetch_user, tag.as_deref());
            let label = slot
                .request_state
                .map_or("unset", |request_state| request_state.as_str());
            println!("{} [{:?}]: {label}", fetch_user.request(), tag.as_deref().unwrap_or(""));
            match &slot.data {
                Some(Outcome::Success(response)) => {
                    println!("  {} {}", response.status, response.body);
                },
                Some(Outcome::Failure(error)) => {
                    println!("  {error}");
                    if let Some(body) = error.body() {
                        println!("  {body}");
                    }
                },
                None => {},
            }
        })
        .await;

    store
        .send(reset_request_state(&fetch_user, tag.as_deref()))
        .await?;
    let cleared = store
        .state(|state| get_response_state(state, &fetch_user, tag.as_deref()).request_state.is_none())
        .await;
    tracing::info!(cleared, "Reset request state");

    store.shutdown_gracefully().await?;
    drop(store);
    drop(driver);
    logger.abort();

    result?;
    Ok(())
}
