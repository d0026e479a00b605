//! Single probes of external state.

use std::future::Future;

use async_trait::async_trait;
use derive_more::{Display, Error};
use serde_json::Value as Json;

/// Probe of a target which couldn't be executed, so no value was read.
///
/// [`Poller`] treats it as a not satisfied sample and keeps polling.
///
/// [`Poller`]: super::Poller
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
#[display(fmt = "Probe of `{}` is unavailable: {}", target, reason)]
pub struct ProbeUnavailable {
    /// Reference to the probed target.
    target: String,

    /// Human-readable reason of the failure.
    reason: String,
}

impl ProbeUnavailable {
    /// Creates a new [`ProbeUnavailable`] for the provided `target`.
    #[inline]
    #[must_use]
    pub fn new<T: Into<String>, R: Into<String>>(target: T, reason: R) -> Self {
        Self {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Returns reference to the probed target.
    #[inline]
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }
}

/// Source of samples for a [`Poller`].
///
/// Each [`Sampler::sample`] call performs exactly one read of some external
/// state and has no other side effects.
///
/// [`Poller`]: super::Poller
#[async_trait]
pub trait Sampler: Send {
    /// Reads the current value of the probed state.
    ///
    /// # Errors
    ///
    /// With [`ProbeUnavailable`] if the target cannot be located or read.
    async fn sample(&mut self) -> Result<Json, ProbeUnavailable>;
}

#[async_trait]
impl<S: Sampler + ?Sized> Sampler for Box<S> {
    async fn sample(&mut self) -> Result<Json, ProbeUnavailable> {
        (**self).sample().await
    }
}

/// [`Sampler`] backed by a closure returning a [`Future`].
///
/// Created by [`from_fn`].
#[derive(Clone, Debug)]
pub struct FnSampler<F>(F);

/// Wraps the provided closure into a [`Sampler`].
#[inline]
#[must_use]
pub fn from_fn<F, Fut>(f: F) -> FnSampler<F>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<Json, ProbeUnavailable>> + Send + 'static,
{
    FnSampler(f)
}

#[async_trait]
impl<F, Fut> Sampler for FnSampler<F>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<Json, ProbeUnavailable>> + Send + 'static,
{
    async fn sample(&mut self) -> Result<Json, ProbeUnavailable> {
        (self.0)().await
    }
}

#[cfg(test)]
mod spec {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn closure_is_invoked_on_each_sample() {
        let mut calls = 0;
        let mut sampler = from_fn(move || {
            calls += 1;
            let current = calls;
            async move { Ok(json!(current)) }
        });

        assert_eq!(sampler.sample().await, Ok(json!(1)));
        assert_eq!(sampler.sample().await, Ok(json!(2)));
    }

    #[tokio::test]
    async fn boxed_sampler_delegates() {
        let mut sampler: Box<dyn Sampler> = Box::new(from_fn(|| async {
            Err(ProbeUnavailable::new("#missing", "element not found"))
        }));

        let err = sampler.sample().await.unwrap_err();
        assert_eq!(err.target(), "#missing");
        assert_eq!(
            err.to_string(),
            "Probe of `#missing` is unavailable: element not found",
        );
    }
}
