//! # Request State HTTP
//!
//! A [`RequestExecutor`](request_state_core::executor::RequestExecutor)
//! that sends requests with `reqwest`.
//!
//! Every request carries JSON `Accept`/`Content-Type` headers,
//! `Cache-Control: no-cache` and, when configured, an `X-CSRFToken` header.
//! Relative URLs are normalized and joined onto the configured base URL.
//!
//! ## Example
//!
//! ```no_run
//! use request_state_core::action_set::make_action_set;
//! use request_state_core::executor::Method;
//! use request_state_core::meta::RequestOptions;
//! use request_state_core::responses::ResponsesReducer;
//! use request_state_core::state::ResponsesState;
//! use request_state_http::{HttpConfig, HttpExecutor};
//! use request_state_runtime::{RequestDriver, Store};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Store::new(ResponsesState::new(), ResponsesReducer::new(), ());
//! let executor = HttpExecutor::new(HttpConfig::new().with_base_url("http://localhost:8000"))?;
//! let driver = RequestDriver::new(store.clone(), executor);
//!
//! let fetch_users = make_action_set("FETCH_USERS");
//! driver
//!     .request(&fetch_users, "/api/users/", Method::Get, None, RequestOptions::new())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
mod executor;
pub mod url;

pub use config::HttpConfig;
pub use error::HttpConfigError;
pub use executor::HttpExecutor;
