//! Defaults of wait operations.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

/// Defaults of wait operations.
#[derive(Clone, Debug, Deserialize, Serialize, SmartDefault)]
#[serde(default)]
pub struct Poll {
    /// Maximum time to wait for a condition. Defaults to `5s`.
    #[default(Duration::from_secs(5))]
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Delay between two consecutive samples of a condition.
    /// Defaults to `100ms`.
    #[default(Duration::from_millis(100))]
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}
