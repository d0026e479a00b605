//! Probes of a browser page state.

use std::convert::TryFrom;

use async_trait::async_trait;
use derive_more::{Display, Error};
use serde_json::{json, Value as Json};

use crate::poll::{ProbeUnavailable, Sampler};

use super::{Statement, WebClient};

/// Value of an [`HTMLMediaElement.readyState`][1].
///
/// [1]: https://mdn.io/HTMLMediaElement/readyState
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(u8)]
pub enum ReadyState {
    /// No information is available about the media resource.
    #[display(fmt = "HAVE_NOTHING")]
    HaveNothing = 0,

    /// Media metadata has been loaded.
    #[display(fmt = "HAVE_METADATA")]
    HaveMetadata = 1,

    /// Data for the current playback position is available.
    #[display(fmt = "HAVE_CURRENT_DATA")]
    HaveCurrentData = 2,

    /// Data for the current playback position and a bit ahead is available.
    #[display(fmt = "HAVE_FUTURE_DATA")]
    HaveFutureData = 3,

    /// Enough data is available to play the media through.
    #[display(fmt = "HAVE_ENOUGH_DATA")]
    HaveEnoughData = 4,
}

/// Numeric value not matching any [`ReadyState`].
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
#[display(fmt = "Unknown media ready state: {}", _0)]
pub struct UnknownReadyState(#[error(not(source))] pub u64);

impl TryFrom<u64> for ReadyState {
    type Error = UnknownReadyState;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::HaveNothing,
            1 => Self::HaveMetadata,
            2 => Self::HaveCurrentData,
            3 => Self::HaveFutureData,
            4 => Self::HaveEnoughData,
            _ => return Err(UnknownReadyState(value)),
        })
    }
}

impl From<ReadyState> for Json {
    #[inline]
    fn from(state: ReadyState) -> Self {
        Self::from(state as u8)
    }
}

/// Way to read some state of a browser page.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Probe {
    /// Reads the `property` of the element found by the `selector`.
    Property {
        /// CSS selector of the element.
        selector: String,

        /// Name of the read property.
        property: String,
    },

    /// Reads whether any element matches the `selector`.
    Present {
        /// CSS selector of the element.
        selector: String,
    },

    /// Reads `videoWidth` and `videoHeight` of the `<video>` element found by
    /// the `selector` as a `{ width, height }` object.
    VideoDimensions {
        /// CSS selector of the `<video>` element.
        selector: String,
    },

    /// Evaluates the provided JS expression.
    Script {
        /// JS expression to evaluate.
        expression: String,
    },
}

impl Probe {
    /// Returns [`Probe::Property`] for the provided `selector` and
    /// `property`.
    #[inline]
    #[must_use]
    pub fn property<S: Into<String>, P: Into<String>>(
        selector: S,
        property: P,
    ) -> Self {
        Self::Property {
            selector: selector.into(),
            property: property.into(),
        }
    }

    /// Returns opaque reference to the probed target.
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::Property { selector, .. }
            | Self::Present { selector }
            | Self::VideoDimensions { selector } => selector,
            Self::Script { expression } => expression,
        }
    }

    /// Returns [`Statement`] reading the probed state.
    #[must_use]
    pub fn statement(&self) -> Statement {
        match self {
            Self::Property { selector, property } => Statement::new(
                // language=JavaScript
                r#"
                    async () => {
                        const [selector, property] = args;
                        const element = document.querySelector(selector);
                        if (element === null) {
                            throw new Error(`No element matches ${selector}`);
                        }
                        return element[property];
                    }
                "#,
                vec![json!(selector), json!(property)],
            ),
            Self::Present { selector } => Statement::new(
                // language=JavaScript
                r#"
                    async () => {
                        const [selector] = args;
                        return document.querySelector(selector) !== null;
                    }
                "#,
                vec![json!(selector)],
            ),
            Self::VideoDimensions { selector } => Statement::new(
                // language=JavaScript
                r#"
                    async () => {
                        const [selector] = args;
                        const video = document.querySelector(selector);
                        if (video === null) {
                            throw new Error(`No element matches ${selector}`);
                        }
                        return {
                            width: video.videoWidth,
                            height: video.videoHeight,
                        };
                    }
                "#,
                vec![json!(selector)],
            ),
            Self::Script { expression } => Statement::new(
                &format!("async () => ({})", expression),
                vec![],
            ),
        }
    }
}

/// [`Sampler`] reading browser page state with a [`Probe`].
#[derive(Clone, Debug)]
pub struct BrowserSampler {
    /// [`WebClient`] of the probed page.
    client: WebClient,

    /// [`Probe`] used for sampling.
    probe: Probe,
}

impl BrowserSampler {
    /// Creates a new [`BrowserSampler`].
    #[inline]
    #[must_use]
    pub fn new(client: WebClient, probe: Probe) -> Self {
        Self { client, probe }
    }

    /// Returns [`Probe`] of this [`BrowserSampler`].
    #[inline]
    #[must_use]
    pub fn probe(&self) -> &Probe {
        &self.probe
    }
}

#[async_trait]
impl Sampler for BrowserSampler {
    async fn sample(&mut self) -> Result<Json, ProbeUnavailable> {
        self.client
            .execute(self.probe.statement())
            .await
            .map_err(|e| {
                ProbeUnavailable::new(self.probe.target(), e.to_string())
            })
    }
}

#[cfg(test)]
mod spec {
    use std::convert::TryFrom as _;

    use serde_json::json;

    use super::*;

    #[test]
    fn ready_state_from_number() {
        assert_eq!(ReadyState::try_from(4_u64), Ok(ReadyState::HaveEnoughData));
        assert_eq!(ReadyState::try_from(0_u64), Ok(ReadyState::HaveNothing));
        assert_eq!(ReadyState::try_from(5_u64), Err(UnknownReadyState(5)));
    }

    #[test]
    fn ready_state_to_json() {
        assert_eq!(Json::from(ReadyState::HaveEnoughData), json!(4));
        assert_eq!(Json::from(ReadyState::HaveMetadata), json!(1));
        assert_eq!(ReadyState::HaveEnoughData.to_string(), "HAVE_ENOUGH_DATA");
    }

    #[test]
    fn target_is_selector_or_expression() {
        assert_eq!(
            Probe::property("video#remote", "readyState").target(),
            "video#remote",
        );
        assert_eq!(
            Probe::Present {
                selector: "#hangup".to_owned()
            }
            .target(),
            "#hangup",
        );
        assert_eq!(
            Probe::Script {
                expression: "window.pc1 !== undefined".to_owned()
            }
            .target(),
            "window.pc1 !== undefined",
        );
    }

    #[test]
    fn script_probe_wraps_expression() {
        let (js, args) = Probe::Script {
            expression: "window.stream.active".to_owned(),
        }
        .statement()
        .prepare();

        assert!(
            js.contains("(async () => (window.stream.active))()"),
            "{}",
            js,
        );
        assert_eq!(args, vec![json!([])]);
    }

    #[test]
    fn property_probe_passes_selector_and_property() {
        let (_, args) = Probe::property("video", "readyState")
            .statement()
            .prepare();

        assert_eq!(args, vec![json!(["video", "readyState"])]);
    }
}
