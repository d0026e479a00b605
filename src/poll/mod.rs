//! Polling of some external state until a predicate holds on it or a deadline
//! passes.
//!
//! A poll sequence starts with [`WaitOptions::begin`], which validates the
//! options and produces a [`PollRequest`]. [`Poller`] then samples a
//! [`Sampler`] until the sampled value satisfies an [`Expectation`], or the
//! deadline of the [`PollRequest`] passes, and hands the single resulting
//! [`PollOutcome`] to its [`Reporter`].

mod reporter;
mod sampler;

use std::{cmp, convert::TryFrom as _, future::Future, time::Duration};

use derive_more::{Display, Error};
use futures::future::{self, AbortHandle, Aborted};
use serde_json::Value as Json;
use smart_default::SmartDefault;
use tokio::time::{self, Instant};

use crate::log::prelude::*;

pub use self::{
    reporter::{LogReporter, Reporter},
    sampler::{from_fn, FnSampler, ProbeUnavailable, Sampler},
};

/// Distance to the deadline of a [`PollRequest`] whose timeout overflows an
/// [`Instant`].
pub const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Errors of invalid poll configuration, detected before any sampling.
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum InvalidConfiguration {
    /// Poll timeout is zero.
    #[display(fmt = "Poll timeout must be positive")]
    ZeroTimeout,

    /// Interval between samples is zero.
    #[display(fmt = "Poll interval must be positive")]
    ZeroInterval,
}

/// Options of a single wait operation.
#[derive(Clone, Debug, Eq, PartialEq, SmartDefault)]
pub struct WaitOptions {
    /// Maximum time to wait for the predicate. Defaults to `5s`.
    #[default(Duration::from_secs(5))]
    pub timeout: Duration,

    /// Delay between two consecutive samples. Defaults to `100ms`.
    #[default(Duration::from_millis(100))]
    pub interval: Duration,

    /// Message replacing the default one of the [`PollOutcome`].
    ///
    /// `%s` is substituted with the target and `%d` with the elapsed
    /// milliseconds.
    pub message: Option<String>,
}

impl WaitOptions {
    /// Sets [`WaitOptions::timeout`].
    #[inline]
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets [`WaitOptions::interval`].
    #[inline]
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets [`WaitOptions::message`].
    #[inline]
    #[must_use]
    pub fn message<S: Into<String>>(mut self, message: S) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Starts a new poll sequence, stamping it with the current time.
    ///
    /// # Errors
    ///
    /// With [`InvalidConfiguration`] if the timeout or the interval is zero.
    pub fn begin<D, T>(
        self,
        description: D,
        target: T,
    ) -> Result<PollRequest, InvalidConfiguration>
    where
        D: Into<String>,
        T: Into<String>,
    {
        if self.timeout == Duration::from_secs(0) {
            return Err(InvalidConfiguration::ZeroTimeout);
        }
        if self.interval == Duration::from_secs(0) {
            return Err(InvalidConfiguration::ZeroInterval);
        }
        Ok(PollRequest {
            description: description.into(),
            target: target.into(),
            timeout: self.timeout,
            interval: self.interval,
            message: self.message,
            started_at: Instant::now(),
        })
    }
}

/// Validated and started poll sequence.
///
/// Immutable for the whole sequence.
#[derive(Clone, Debug)]
pub struct PollRequest {
    description: String,
    target: String,
    timeout: Duration,
    interval: Duration,
    message: Option<String>,
    started_at: Instant,
}

impl PollRequest {
    /// Returns description of the awaited predicate.
    #[inline]
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns opaque reference to the polled target.
    #[inline]
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns maximum time to wait for the predicate.
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns delay between two consecutive samples.
    #[inline]
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns message override, if any.
    #[inline]
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns [`Instant`] this sequence was started at.
    #[inline]
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns [`Instant`] after which no more samples are taken.
    ///
    /// Saturates to [`FAR_FUTURE`] after the start if the timeout doesn't fit
    /// into an [`Instant`].
    #[must_use]
    pub fn deadline(&self) -> Instant {
        self.started_at
            .checked_add(self.timeout)
            .or_else(|| self.started_at.checked_add(FAR_FUTURE))
            .unwrap_or(self.started_at)
    }
}

/// Result of a finished poll sequence.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PollOutcome {
    /// Indicator whether the predicate was satisfied before the deadline.
    pub succeeded: bool,

    /// Time passed from the start of the sequence till its termination.
    pub elapsed: Duration,

    /// Human-readable description of what happened.
    pub message: String,
}

impl PollOutcome {
    /// Concludes the provided [`PollRequest`] at the current moment.
    fn conclude(request: &PollRequest, succeeded: bool) -> Self {
        let elapsed = Instant::now().duration_since(request.started_at);
        Self {
            succeeded,
            elapsed,
            message: reporter::format_message(request, succeeded, elapsed),
        }
    }

    /// Returns [`PollOutcome::elapsed`] in whole milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }

    /// Converts this [`PollOutcome`] into an assertion result.
    ///
    /// # Errors
    ///
    /// With [`AssertionFailed`] carrying the outcome message if the predicate
    /// wasn't satisfied.
    pub fn into_result(self) -> Result<Self, AssertionFailed> {
        if self.succeeded {
            Ok(self)
        } else {
            Err(AssertionFailed {
                message: self.message,
                elapsed: self.elapsed,
            })
        }
    }
}

/// Failed assertion of a timed out poll sequence.
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
#[display(fmt = "{}", message)]
pub struct AssertionFailed {
    /// Message of the timed out [`PollOutcome`].
    pub message: String,

    /// Time spent waiting.
    pub elapsed: Duration,
}

/// Expected result of a sample.
#[derive(Clone, Debug, PartialEq)]
pub enum Expectation {
    /// Sampled value is truthy by JS rules.
    Truthy,

    /// Sampled value equals the provided one. Numbers are compared by value,
    /// so `4` equals `4.0`.
    Equals(Json),
}

impl Expectation {
    /// Checks whether the provided sampled `value` satisfies this
    /// [`Expectation`].
    #[allow(clippy::float_cmp)]
    #[must_use]
    pub fn is_satisfied_by(&self, value: &Json) -> bool {
        match self {
            Self::Truthy => is_truthy(value),
            Self::Equals(expected) => match (expected, value) {
                (Json::Number(a), Json::Number(b)) => a.as_f64() == b.as_f64(),
                _ => expected == value,
            },
        }
    }
}

/// Checks the provided [`Json`] value for JS truthiness.
fn is_truthy(value: &Json) -> bool {
    match value {
        Json::Null => false,
        Json::Bool(b) => *b,
        Json::Number(n) => {
            n.as_f64().map_or(false, |n| n != 0.0 && !n.is_nan())
        }
        Json::String(s) => !s.is_empty(),
        Json::Array(_) | Json::Object(_) => true,
    }
}

/// State of a [`Poller`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum State {
    /// Predicate is not satisfied yet and the deadline hasn't passed.
    Polling,

    /// Predicate was satisfied.
    Succeeded,

    /// Deadline has passed without the predicate being satisfied.
    TimedOut,
}

/// Controller of a single poll sequence.
///
/// The first sample is taken immediately, the following ones after
/// [`PollRequest::interval`]. A sleep never ends past
/// [`PollRequest::deadline`], so a timed out sequence overshoots its timeout
/// by less than one interval (plus the duration of the last sample).
#[derive(Debug)]
pub struct Poller<S, R = LogReporter> {
    request: PollRequest,
    expectation: Expectation,
    sampler: S,
    reporter: R,
}

impl<S: Sampler> Poller<S> {
    /// Creates a new [`Poller`] reporting with [`LogReporter`].
    #[inline]
    #[must_use]
    pub fn new(
        request: PollRequest,
        expectation: Expectation,
        sampler: S,
    ) -> Self {
        Self {
            request,
            expectation,
            sampler,
            reporter: LogReporter,
        }
    }
}

impl<S: Sampler, R: Reporter> Poller<S, R> {
    /// Replaces [`Reporter`] of this [`Poller`].
    #[inline]
    #[must_use]
    pub fn with_reporter<R2: Reporter>(self, reporter: R2) -> Poller<S, R2> {
        Poller {
            request: self.request,
            expectation: self.expectation,
            sampler: self.sampler,
            reporter,
        }
    }

    /// Returns [`PollRequest`] driven by this [`Poller`].
    #[inline]
    #[must_use]
    pub fn request(&self) -> &PollRequest {
        &self.request
    }

    /// Runs this poll sequence to its end, reports and returns its
    /// [`PollOutcome`].
    pub async fn run(mut self) -> PollOutcome {
        let deadline = self.request.deadline();
        debug!(
            "Polling started";
            "target" => self.request.target(),
            "description" => self.request.description()
        );

        let mut state = self.sample(deadline).await;
        while state == State::Polling {
            let wake_at = Instant::now()
                .checked_add(self.request.interval)
                .map_or(deadline, |at| cmp::min(at, deadline));
            time::sleep_until(wake_at).await;
            state = self.sample(deadline).await;
        }

        let outcome =
            PollOutcome::conclude(&self.request, state == State::Succeeded);
        self.reporter.report(&outcome);
        outcome
    }

    /// Runs this poll sequence in an abortable way.
    ///
    /// Once aborted via the returned [`AbortHandle`], the [`Sampler`] is not
    /// invoked anymore, nothing is reported and the returned [`Future`]
    /// resolves to [`Aborted`].
    pub fn run_abortable(
        self,
    ) -> (impl Future<Output = Result<PollOutcome, Aborted>>, AbortHandle) {
        future::abortable(self.run())
    }

    /// Takes a single sample and decides the next [`State`].
    async fn sample(&mut self, deadline: Instant) -> State {
        let satisfied = match self.sampler.sample().await {
            Ok(value) => {
                trace!(
                    "Sampled {}", value;
                    "target" => self.request.target()
                );
                self.expectation.is_satisfied_by(&value)
            }
            Err(e) => {
                debug!(
                    "Sample not available";
                    "target" => self.request.target(),
                    "error" => %e
                );
                false
            }
        };

        if satisfied {
            State::Succeeded
        } else if Instant::now() >= deadline {
            State::TimedOut
        } else {
            State::Polling
        }
    }
}
