//! Custom wait commands of the harness.
//!
//! Every command polls the current page of a [`WebClient`] until the awaited
//! condition holds, and fails with [`Error::Assertion`] once the timeout of
//! its [`WaitOptions`] passes.

use derive_more::{Display, Error, From};
use serde_json::{json, Value as Json};

use crate::{
    browser::{self, BrowserSampler, Probe, ReadyState, WebClient},
    poll::{
        AssertionFailed, Expectation, InvalidConfiguration, PollOutcome,
        Poller, Sampler, WaitOptions,
    },
};

/// Errors of the wait commands.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// Provided [`WaitOptions`] are invalid.
    #[display(fmt = "Invalid wait configuration: {}", _0)]
    Config(InvalidConfiguration),

    /// Awaited condition wasn't satisfied in time.
    #[display(fmt = "{}", _0)]
    Assertion(AssertionFailed),

    /// Browser interaction failed.
    #[display(fmt = "{}", _0)]
    Browser(browser::Error),
}

/// Condition awaited on a browser page.
#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
    /// [`Probe`] reading the page state.
    pub probe: Probe,

    /// [`Expectation`] the read state must satisfy.
    pub expectation: Expectation,

    /// Human-readable description of the predicate.
    pub description: String,
}

impl Condition {
    /// `readyState` of the media element found by the `selector` equals the
    /// provided [`ReadyState`].
    #[must_use]
    pub fn ready_state(selector: &str, state: ReadyState) -> Self {
        Self {
            probe: Probe::property(selector, "readyState"),
            expectation: Expectation::Equals(state.into()),
            description: format!("readyState == {}", state),
        }
    }

    /// `<video>` element found by the `selector` has the provided
    /// dimensions.
    #[must_use]
    pub fn video_dimensions(selector: &str, width: u32, height: u32) -> Self {
        Self {
            probe: Probe::VideoDimensions {
                selector: selector.to_owned(),
            },
            expectation: Expectation::Equals(
                json!({ "width": width, "height": height }),
            ),
            description: format!(
                "videoWidth x videoHeight == {}x{}",
                width, height,
            ),
        }
    }

    /// `property` of the element found by the `selector` equals the
    /// `expected` value.
    #[must_use]
    pub fn property(selector: &str, property: &str, expected: Json) -> Self {
        Self {
            probe: Probe::property(selector, property),
            description: format!("{} == {}", property, expected),
            expectation: Expectation::Equals(expected),
        }
    }

    /// Any element matches the `selector`.
    #[must_use]
    pub fn present(selector: &str) -> Self {
        Self {
            probe: Probe::Present {
                selector: selector.to_owned(),
            },
            expectation: Expectation::Truthy,
            description: "is present".to_owned(),
        }
    }

    /// JS `expression` evaluates to a truthy value.
    #[must_use]
    pub fn script(expression: &str) -> Self {
        Self {
            probe: Probe::Script {
                expression: expression.to_owned(),
            },
            expectation: Expectation::Truthy,
            description: "is truthy".to_owned(),
        }
    }
}

/// Polls the provided [`Sampler`] of the `target` until its value satisfies
/// the `expectation`.
///
/// # Errors
///
/// - [`Error::Config`] if the provided [`WaitOptions`] are invalid.
/// - [`Error::Assertion`] if the condition wasn't satisfied in time.
pub async fn wait_until<S: Sampler>(
    sampler: S,
    target: &str,
    expectation: Expectation,
    description: String,
    opts: WaitOptions,
) -> Result<PollOutcome, Error> {
    let request = opts.begin(description, target)?;
    Ok(Poller::new(request, expectation, sampler)
        .run()
        .await
        .into_result()?)
}

/// Waits until the provided [`Condition`] holds on the current page of the
/// [`WebClient`].
///
/// # Errors
///
/// See [`wait_until`].
pub async fn wait_for(
    client: &WebClient,
    condition: Condition,
    opts: WaitOptions,
) -> Result<PollOutcome, Error> {
    let Condition {
        probe,
        expectation,
        description,
    } = condition;
    let target = probe.target().to_owned();
    let sampler = BrowserSampler::new(client.clone(), probe);

    wait_until(sampler, &target, expectation, description, opts).await
}

/// Waits until the `readyState` of the media element found by the
/// `selector` equals the provided [`ReadyState`].
///
/// # Errors
///
/// See [`wait_until`].
pub async fn wait_for_ready_state(
    client: &WebClient,
    selector: &str,
    state: ReadyState,
    opts: WaitOptions,
) -> Result<PollOutcome, Error> {
    wait_for(client, Condition::ready_state(selector, state), opts).await
}

/// Waits until the media element found by the `selector` has enough data to
/// play its media through.
///
/// # Errors
///
/// See [`wait_until`].
pub async fn wait_for_media_playback_ready(
    client: &WebClient,
    selector: &str,
    opts: WaitOptions,
) -> Result<PollOutcome, Error> {
    wait_for_ready_state(client, selector, ReadyState::HaveEnoughData, opts)
        .await
}

/// Waits until the `<video>` element found by the `selector` has the
/// provided dimensions.
///
/// # Errors
///
/// See [`wait_until`].
pub async fn wait_for_video_dimensions(
    client: &WebClient,
    selector: &str,
    width: u32,
    height: u32,
    opts: WaitOptions,
) -> Result<PollOutcome, Error> {
    wait_for(
        client,
        Condition::video_dimensions(selector, width, height),
        opts,
    )
    .await
}

/// Waits until the `property` of the element found by the `selector` equals
/// the `expected` value.
///
/// # Errors
///
/// See [`wait_until`].
pub async fn wait_for_property(
    client: &WebClient,
    selector: &str,
    property: &str,
    expected: Json,
    opts: WaitOptions,
) -> Result<PollOutcome, Error> {
    wait_for(client, Condition::property(selector, property, expected), opts)
        .await
}

/// Waits until any element matches the `selector`.
///
/// # Errors
///
/// See [`wait_until`].
pub async fn wait_for_present(
    client: &WebClient,
    selector: &str,
    opts: WaitOptions,
) -> Result<PollOutcome, Error> {
    wait_for(client, Condition::present(selector), opts).await
}

/// Waits until the provided JS `expression` evaluates to a truthy value.
///
/// # Errors
///
/// See [`wait_until`].
pub async fn wait_for_script(
    client: &WebClient,
    expression: &str,
    opts: WaitOptions,
) -> Result<PollOutcome, Error> {
    wait_for(client, Condition::script(expression), opts).await
}
