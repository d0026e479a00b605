//! Browser session settings.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

/// Browser session settings.
#[derive(Clone, Debug, Deserialize, Serialize, SmartDefault)]
#[serde(default)]
pub struct Browser {
    /// Address of a running WebDriver.
    /// Defaults to `http://127.0.0.1:4444`.
    #[default("http://127.0.0.1:4444")]
    pub webdriver_addr: Cow<'static, str>,

    /// Whether the browser should be run without UI.
    /// Defaults to `false`.
    #[default(false)]
    pub headless: bool,

    /// Whether the browser should use fake media devices and skip media
    /// permission prompts. Defaults to `true`.
    #[default(true)]
    pub fake_media: bool,
}
