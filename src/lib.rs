//! # Restline - a declarative REST call layer
//!
//! Restline builds HTTP requests declaratively, negotiates content
//! representation (JSON/XML) and transfer compression (gzip), executes them
//! against a pluggable [`Transport`], and wraps every outcome in a uniform
//! [`CallResponse`]. On top of single-call execution it layers
//! [`ResilientCall`], a retry loop driven entirely by a caller-supplied
//! classifier and [`Backoff`] schedule, and [`in_parallel_calls`], a
//! fail-visible concurrent fan-out.
//!
//! ## Quick start
//!
//! ```no_run
//! use restline::{get, post, ReqwestTransport};
//! use serde::{Deserialize, Serialize};
//! use std::sync::Arc;
//!
//! #[derive(Serialize)]
//! struct CreateUser {
//!     name: String,
//! }
//!
//! #[derive(Deserialize, Default, Debug)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), restline::Error> {
//!     let transport = Arc::new(ReqwestTransport::new()?);
//!
//!     // GET with query parameters and gzip negotiation.
//!     let mut user = User::default();
//!     let response = get(transport.clone(), "https://api.example.com/users/1")
//!         .with_query_param("expand", "profile")
//!         .accept_gzip_encoding()
//!         .execute(&mut user)
//!         .await;
//!     println!("status {}: {:?}", response.status_code, user);
//!
//!     // POST a JSON body.
//!     let mut created = User::default();
//!     let response = post(transport, "https://api.example.com/users")
//!         .with_json_content_type()
//!         .with_body(CreateUser { name: "Alice".to_string() })
//!         .execute(&mut created)
//!         .await;
//!     if let Some(error) = response.error {
//!         eprintln!("call failed: {error}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Retries and fan-out
//!
//! The builder never retries on its own and treats non-2xx statuses as
//! ordinary results. Retry policy lives in a response handler: it classifies
//! each [`CallResponse`] as success, retryable, or fatal, and
//! [`ResilientCall`] mechanically applies that classification against a
//! retry budget and a [`Backoff`] schedule. Independent calls can then be
//! fanned out with [`in_parallel_calls`], which waits for every call to
//! finish and reports the first failure.
//!
//! ```no_run
//! use restline::{get, in_parallel_calls, Backoff, CallError, ReqwestTransport, ResilientCall};
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), CallError> {
//! # let transport = Arc::new(ReqwestTransport::new().unwrap());
//! let handler = |response: &restline::CallResponse| match response.status_code {
//!     200..=299 => Ok(()),
//!     503 => Err(CallError::retryable("service unavailable")),
//!     status => Err(CallError::fatal(format!("unexpected status {status}"))),
//! };
//!
//! let users = ResilientCall::new(
//!     get(transport.clone(), "https://api.example.com/users"),
//!     HashMap::<String, String>::new(),
//!     handler,
//! )
//! .retries(3)
//! .backoff(Backoff::Exponential {
//!     initial_delay: Duration::from_millis(100),
//!     max_delay: Duration::from_secs(5),
//!     jitter: true,
//! });
//!
//! let teams = ResilientCall::new(
//!     get(transport, "https://api.example.com/teams"),
//!     HashMap::<String, String>::new(),
//!     handler,
//! );
//!
//! in_parallel_calls(vec![Box::new(users), Box::new(teams)]).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Declarative requests** - fluent verb builders with headers, query
//!   parameters, bodies, and basic-auth encoding
//! - **Content negotiation** - JSON by default, XML on request, with
//!   per-builder unmarshal overrides that never leak across builders
//! - **Transparent gzip** - `Accept-Encoding` advertising and
//!   `Content-Encoding`-driven inflation
//! - **Uniform outcomes** - one [`CallResponse`] shape for transport
//!   failures, decode failures, and plain statuses
//! - **Policy-free retries** - the classifier decides what retries; the
//!   mechanism only counts attempts and sleeps
//! - **Fail-visible fan-out** - concurrent calls that always run to
//!   completion
//! - **Pluggable transport** - [`ReqwestTransport`] by default, anything
//!   implementing [`Transport`] for tests and embedders

mod builder;
mod caller;
mod codec;
mod compression;
mod error;
mod request;
mod response;
pub mod retry;
pub mod transport;

pub use builder::{delete, get, post, put, RequestBuilder};
pub use caller::{in_parallel_calls, Caller, Executable, ResilientCall, ResponseHandler};
pub use codec::{UnmarshalFn, APPLICATION_JSON, APPLICATION_XML};
pub use error::{BoxError, CallError, Error, Result};
pub use response::CallResponse;
pub use retry::Backoff;
pub use transport::{
    ReqwestTransport, Transport, TransportError, TransportRequest, TransportResponse,
};
