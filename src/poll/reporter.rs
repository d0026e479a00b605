//! Reporting of [`PollOutcome`]s.

use std::{rc::Rc, sync::Arc, time::Duration};

use crate::log::prelude::*;

use super::{PollOutcome, PollRequest};

/// Receiver of a terminal [`PollOutcome`].
///
/// [`Poller`] calls [`Reporter::report`] exactly once per poll sequence, and
/// never calls it for an aborted one.
///
/// [`Poller`]: super::Poller
pub trait Reporter {
    /// Reports the provided [`PollOutcome`].
    fn report(&self, outcome: &PollOutcome);
}

impl<R: Reporter + ?Sized> Reporter for &R {
    #[inline]
    fn report(&self, outcome: &PollOutcome) {
        (**self).report(outcome);
    }
}

impl<R: Reporter + ?Sized> Reporter for Rc<R> {
    #[inline]
    fn report(&self, outcome: &PollOutcome) {
        (**self).report(outcome);
    }
}

impl<R: Reporter + ?Sized> Reporter for Arc<R> {
    #[inline]
    fn report(&self, outcome: &PollOutcome) {
        (**self).report(outcome);
    }
}

/// [`Reporter`] writing [`PollOutcome`]s into the global [`slog`] logger.
///
/// Successes are logged with `INFO` level and timeouts with `WARN` level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, outcome: &PollOutcome) {
        if outcome.succeeded {
            info!(
                "{}", outcome.message;
                "elapsed_ms" => outcome.elapsed_ms()
            );
        } else {
            warn!(
                "{}", outcome.message;
                "elapsed_ms" => outcome.elapsed_ms()
            );
        }
    }
}

/// Formats a human-readable message of a finished poll sequence.
///
/// The message override of the [`PollRequest`] takes precedence, with `%s`
/// substituted by the target and `%d` by the elapsed milliseconds.
pub(super) fn format_message(
    request: &PollRequest,
    succeeded: bool,
    elapsed: Duration,
) -> String {
    let elapsed_ms = elapsed.as_millis();
    if let Some(message) = request.message() {
        return message
            .replace("%s", request.target())
            .replace("%d", &elapsed_ms.to_string());
    }
    if succeeded {
        format!(
            "Condition `{}` on <{}> was satisfied after {}ms",
            request.description(),
            request.target(),
            elapsed_ms,
        )
    } else {
        format!(
            "Timed out after {}ms waiting for condition `{}` on <{}>",
            elapsed_ms,
            request.description(),
            request.target(),
        )
    }
}
