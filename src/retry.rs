//! Backoff schedules for the retry loop.
//!
//! A schedule is a pure mapping from the 1-based attempt number to a wait
//! duration; it carries no state and makes no retry decisions. How many
//! attempts happen is the [`ResilientCall`](crate::ResilientCall) budget's
//! business, and *whether* to retry at all belongs to the response handler.

use rand::Rng;
use std::time::Duration;

/// Maps an attempt number to the delay applied before the next attempt.
///
/// # Examples
///
/// ```
/// use restline::Backoff;
/// use std::time::Duration;
///
/// // No delay between attempts (useful in tests).
/// let none = Backoff::None;
///
/// // 250ms between every attempt.
/// let fixed = Backoff::Fixed {
///     delay: Duration::from_millis(250),
/// };
///
/// // 100ms, 200ms, 400ms, ... capped at 10s, with jitter.
/// let exponential = Backoff::Exponential {
///     initial_delay: Duration::from_millis(100),
///     max_delay: Duration::from_secs(10),
///     jitter: true,
/// };
/// ```
#[derive(Debug, Clone, Default)]
pub enum Backoff {
    /// Zero delay: retries happen immediately.
    #[default]
    None,

    /// A fixed delay between attempts.
    Fixed {
        /// The delay before every retry.
        delay: Duration,
    },

    /// Exponentially increasing delays: `initial_delay * 2^(attempt - 1)`,
    /// capped at `max_delay`. Optional jitter scales each delay by a random
    /// factor in `[0.5, 1.0]` to avoid thundering herds.
    Exponential {
        /// The delay before the first retry.
        initial_delay: Duration,
        /// The cap applied after doubling.
        max_delay: Duration,
        /// Whether to randomize each delay (recommended outside tests).
        jitter: bool,
    },

    /// Custom schedule: any pure function of the attempt number.
    Custom {
        /// Takes the 1-based attempt number, returns the delay before the
        /// next attempt.
        delay_fn: fn(attempt: u32) -> Duration,
    },
}

impl Backoff {
    /// Returns the delay to wait after the given attempt failed.
    ///
    /// `attempt` is 1-based: the schedule is consulted after the first
    /// execution, never before it. A zero result means no sleep at all.
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed { delay } => *delay,
            Backoff::Exponential {
                initial_delay,
                max_delay,
                jitter,
            } => {
                let multiplier = 2u32.saturating_pow(attempt.saturating_sub(1));
                let delay = initial_delay.saturating_mul(multiplier).min(*max_delay);
                if *jitter {
                    let factor = rand::thread_rng().gen_range(0.5..=1.0);
                    delay.mul_f64(factor)
                } else {
                    delay
                }
            }
            Backoff::Custom { delay_fn } => delay_fn(attempt),
        }
    }
}
