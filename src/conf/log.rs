//! Logging settings.

use std::{borrow::Cow, str::FromStr as _};

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use slog::Level;
use smart_default::SmartDefault;

/// Level name which disables logging.
const OFF: &str = "OFF";

/// Logging settings.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, SmartDefault)]
#[serde(default)]
pub struct Log {
    /// Maximum level of the harness log records: `TRACE`, `DEBUG`, `INFO`,
    /// `WARN`, `ERROR`, `CRITICAL`, or `OFF` to disable logging.
    /// Defaults to `INFO`.
    #[default("INFO")]
    pub level: Cow<'static, str>,
}

/// [`Log::level`] naming no known level.
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
#[display(fmt = "Unknown log level: `{}`", _0)]
pub struct UnknownLogLevel(#[error(not(source))] pub String);

impl Log {
    /// Returns configured logging [`Level`], or `None` if logging is
    /// disabled.
    ///
    /// # Errors
    ///
    /// With [`UnknownLogLevel`] if [`Log::level`] is neither a [`Level`] name
    /// nor `OFF`.
    pub fn level(&self) -> Result<Option<Level>, UnknownLogLevel> {
        let name = self.level.trim();
        if name.eq_ignore_ascii_case(OFF) {
            return Ok(None);
        }
        Level::from_str(name)
            .map(Some)
            .map_err(|()| UnknownLogLevel(name.to_owned()))
    }
}
