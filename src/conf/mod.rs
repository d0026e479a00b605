//! Provides harness configuration options.
//!
//! Configuration options can be parsed from config files in TOML format.

pub mod browser;
pub mod log;
pub mod poll;

use std::env;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::poll::WaitOptions;

#[doc(inline)]
pub use self::{
    browser::Browser,
    log::{Log, UnknownLogLevel},
    poll::Poll,
};

/// CLI argument that is responsible for holding application configuration
/// file path.
pub const APP_CONF_PATH_CMD_ARG_NAME: &str = "--conf";

/// Environment variable that is responsible for holding application
/// configuration file path.
pub const APP_CONF_PATH_ENV_VAR_NAME: &str = "SAMPLES_E2E_CONF";

/// Prefix of environment variables overriding configuration options.
const APP_CONF_ENV_PREFIX: &str = "SAMPLES_E2E";

/// Holds harness config.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Conf {
    /// Defaults of wait operations.
    pub poll: Poll,

    /// Browser session settings.
    pub browser: Browser,

    /// Logging settings.
    pub log: Log,
}

impl Conf {
    /// Creates new [`Conf`] and applies values from such sources
    /// and in that order:
    /// - default values;
    /// - configuration file, the name of which is given as a command line
    ///   parameter or environment variable;
    /// - environment variables.
    ///
    /// # Errors
    ///
    /// Errors if parsing fails.
    pub fn parse() -> Result<Self, ConfigError> {
        let mut cfg = Config::new();

        if let Some(path) =
            get_conf_file_name(env::var(APP_CONF_PATH_ENV_VAR_NAME), env::args())
        {
            let _ = cfg.merge(File::with_name(&path))?;
        }

        let _ = cfg.merge(
            Environment::with_prefix(APP_CONF_ENV_PREFIX).separator("__"),
        )?;

        cfg.try_into()
    }

    /// Returns [`WaitOptions`] built from the [`Poll`] section.
    #[must_use]
    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions::default()
            .timeout(self.poll.timeout)
            .interval(self.poll.interval)
    }
}

/// Returns the path to a configuration file, if it's set via CLI `args`
/// or environment variable.
///
/// Environment variable takes precedence over CLI argument.
fn get_conf_file_name<T>(
    env_var: Result<String, env::VarError>,
    cmd_args: T,
) -> Option<String>
where
    T: Iterator<Item = String>,
{
    if let Ok(path) = env_var {
        if !path.is_empty() {
            return Some(path);
        }
    }
    let mut args = cmd_args.skip_while(|x| x != APP_CONF_PATH_CMD_ARG_NAME);
    if args.next().is_some() {
        args.next().filter(|path| !path.is_empty())
    } else {
        None
    }
}

/// Sets the provided environment variables, parses [`Conf`] and removes the
/// variables afterwards.
#[cfg(test)]
#[macro_export]
macro_rules! overrided_by_env_conf {
    ($($env:expr => $value:expr),+ $(,)?) => {{
        $(::std::env::set_var($env, $value);)+
        let conf = $crate::conf::Conf::parse().unwrap();
        $(::std::env::remove_var($env);)+
        conf
    }};
}
