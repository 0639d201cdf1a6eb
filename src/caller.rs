//! The resilient call state machine and the parallel aggregator.
//!
//! A [`ResilientCall`] wraps one re-executable request, the entity it decodes
//! into, and a response handler that classifies every outcome. The handler is
//! the only place retry policy lives: the loop itself never looks at status
//! codes. [`in_parallel_calls`] runs independent callers concurrently and
//! reports the first failure without cancelling siblings.

use async_trait::async_trait;

use crate::retry::Backoff;
use crate::{CallError, CallResponse};

/// A re-executable request capability: execute once, decode into `entity`.
///
/// [`RequestBuilder`](crate::RequestBuilder) implements this; test doubles
/// can too. Each `execute` must be independent, because the retry loop
/// invokes it repeatedly.
#[async_trait]
pub trait Executable<T: Send>: Send + Sync {
    /// Executes the request, writing a decoded success body into `entity`.
    async fn execute(&self, entity: &mut T) -> CallResponse;
}

#[async_trait]
impl<T> Executable<T> for crate::RequestBuilder<T>
where
    T: Send,
{
    async fn execute(&self, entity: &mut T) -> CallResponse {
        crate::RequestBuilder::execute(self, entity).await
    }
}

/// Something the parallel aggregator can run: one complete call, retries
/// included, yielding success or a classified error.
#[async_trait]
pub trait Caller: Send {
    /// Runs the call to completion.
    async fn execute_call(&mut self) -> Result<(), CallError>;
}

/// The classifier for one finished execution.
pub type ResponseHandler = Box<dyn Fn(&CallResponse) -> Result<(), CallError> + Send + Sync>;

/// A retrying wrapper around one executable request.
///
/// Executes the request, hands the [`CallResponse`] to the handler, and acts
/// on the classification: success ends the call, a fatal error aborts
/// immediately regardless of remaining budget, and a retryable error sleeps
/// out the backoff schedule and re-executes until the budget is spent. With
/// `retries = R`, at most `R + 1` executions happen.
///
/// # Examples
///
/// ```no_run
/// use restline::{get, Backoff, CallError, ReqwestTransport, ResilientCall};
/// use std::collections::HashMap;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), restline::Error> {
/// let transport = Arc::new(ReqwestTransport::new()?);
/// let request = get(transport, "https://api.example.com/users/1");
///
/// let mut call = ResilientCall::new(request, HashMap::<String, String>::new(), |response| {
///     match response.status_code {
///         200..=299 => Ok(()),
///         503 => Err(CallError::retryable("service unavailable")),
///         status => Err(CallError::fatal(format!("unexpected status {status}"))),
///     }
/// })
/// .retries(3)
/// .backoff(Backoff::Exponential {
///     initial_delay: Duration::from_millis(100),
///     max_delay: Duration::from_secs(5),
///     jitter: true,
/// });
///
/// call.execute_call().await.map_err(|e| restline::Error::Configuration(e.to_string()))?;
/// println!("user: {:?}", call.entity());
/// # Ok(())
/// # }
/// ```
pub struct ResilientCall<T, E> {
    request: E,
    entity: T,
    handler: ResponseHandler,
    retries: u32,
    backoff: Backoff,
}

impl<T, E> ResilientCall<T, E>
where
    T: Send,
    E: Executable<T>,
{
    /// Wraps `request` with a handler and a zero-retry, zero-backoff budget.
    pub fn new(
        request: E,
        entity: T,
        handler: impl Fn(&CallResponse) -> Result<(), CallError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            request,
            entity,
            handler: Box::new(handler),
            retries: 0,
            backoff: Backoff::None,
        }
    }

    /// Sets the retry budget: up to `retries` re-executions after the first.
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Sets the backoff schedule consulted between attempts.
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Borrows the entity the call decodes into.
    pub fn entity(&self) -> &T {
        &self.entity
    }

    /// Takes the entity back out of the call.
    pub fn into_entity(self) -> T {
        self.entity
    }

    /// Runs the retry loop to completion.
    pub async fn execute_call(&mut self) -> Result<(), CallError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let response = self.request.execute(&mut self.entity).await;
            match (self.handler)(&response) {
                Ok(()) => return Ok(()),
                Err(err) if !err.is_retryable() => {
                    tracing::warn!(attempt, error = %err, "call failed, not retrying");
                    return Err(err);
                }
                Err(err) => {
                    if attempt > self.retries {
                        tracing::warn!(attempt, error = %err, "call failed, retry budget spent");
                        return Err(err);
                    }
                    let delay = self.backoff.delay(attempt);
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "call failed, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }
}

#[async_trait]
impl<T, E> Caller for ResilientCall<T, E>
where
    T: Send,
    E: Executable<T>,
{
    async fn execute_call(&mut self) -> Result<(), CallError> {
        ResilientCall::execute_call(self).await
    }
}

/// Runs every caller on its own task, waits for all of them, and returns the
/// first error observed.
///
/// This is fail-visible, not fail-fast-abort: a failure does not cancel
/// in-flight siblings, and "first" means first seen by the aggregation, not
/// first in submission order. Callers must not share mutable state.
///
/// # Examples
///
/// ```no_run
/// use restline::{get, in_parallel_calls, Caller, CallError, ReqwestTransport, ResilientCall};
/// use std::collections::HashMap;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), CallError> {
/// # let transport = Arc::new(ReqwestTransport::new().unwrap());
/// let handler = |response: &restline::CallResponse| match response.status_code {
///     200..=299 => Ok(()),
///     status => Err(CallError::retryable(format!("status {status}"))),
/// };
///
/// let users = ResilientCall::new(
///     get(transport.clone(), "https://api.example.com/users"),
///     HashMap::<String, String>::new(),
///     handler,
/// );
/// let teams = ResilientCall::new(
///     get(transport, "https://api.example.com/teams"),
///     HashMap::<String, String>::new(),
///     handler,
/// );
///
/// in_parallel_calls(vec![Box::new(users), Box::new(teams)]).await?;
/// # Ok(())
/// # }
/// ```
pub async fn in_parallel_calls(callers: Vec<Box<dyn Caller>>) -> Result<(), CallError> {
    let mut handles = Vec::with_capacity(callers.len());
    for mut caller in callers {
        handles.push(tokio::spawn(async move { caller.execute_call().await }));
    }

    let mut first_error = None;
    for handle in handles {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(join_error) => Err(CallError::fatal(format!("call task failed: {join_error}"))),
        };
        if let Err(err) = outcome {
            if first_error.is_none() {
                first_error = Some(err);
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
