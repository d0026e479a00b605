//! CLI waiting for a condition on a [WebRTC] sample page.
//!
//! [WebRTC]: https://w3.org/TR/webrtc

use std::{convert::TryFrom as _, process, time::Duration};

use clap::{
    app_from_crate, crate_authors, crate_description, crate_name,
    crate_version, App, Arg, ArgGroup, ArgMatches,
};
use humantime_serde::re::humantime;
use samples_e2e::{
    browser::{ReadyState, WebClient},
    commands,
    conf::Conf,
    log::{self, prelude::*},
    PollOutcome, WaitOptions,
};
use serde_json::Value as Json;

/// Condition awaited on a page.
#[derive(Clone, Debug, PartialEq)]
enum Check {
    /// `readyState` of a media element equals the provided one.
    ReadyState { selector: String, state: ReadyState },

    /// Property of an element equals the `expected` value.
    Property {
        selector: String,
        property: String,
        expected: Json,
    },

    /// Element is present on a page.
    Present { selector: String },

    /// `<video>` element has the provided dimensions.
    VideoDimensions {
        selector: String,
        width: u32,
        height: u32,
    },

    /// JS expression is truthy.
    Script { expression: String },
}

impl Check {
    /// Parses [`Check`] from the provided CLI options.
    fn from_opts(opts: &ArgMatches<'_>) -> Result<Self, String> {
        if let Some(expression) = opts.value_of("script") {
            return Ok(Self::Script {
                expression: expression.to_owned(),
            });
        }
        let selector = opts
            .value_of("selector")
            .ok_or("<selector> is required")?
            .to_owned();

        if let Some(state) = opts.value_of("ready-state") {
            let state = state
                .parse::<u64>()
                .map_err(|e| format!("Invalid --ready-state: {}", e))?;
            let state = ReadyState::try_from(state).map_err(|e| e.to_string())?;
            return Ok(Self::ReadyState { selector, state });
        }
        if let Some(property) = opts.value_of("property") {
            let expected = opts.value_of("equals").unwrap_or("true");
            return Ok(Self::Property {
                selector,
                property: property.to_owned(),
                expected: serde_json::from_str(expected)
                    .unwrap_or_else(|_| Json::String(expected.to_owned())),
            });
        }
        if let (Some(width), Some(height)) =
            (opts.value_of("video-width"), opts.value_of("video-height"))
        {
            return Ok(Self::VideoDimensions {
                selector,
                width: width
                    .parse()
                    .map_err(|e| format!("Invalid --video-width: {}", e))?,
                height: height
                    .parse()
                    .map_err(|e| format!("Invalid --video-height: {}", e))?,
            });
        }
        Ok(Self::Present { selector })
    }

    /// Waits for this [`Check`] on the current page of the provided
    /// [`WebClient`].
    async fn wait(
        self,
        client: &WebClient,
        opts: WaitOptions,
    ) -> Result<PollOutcome, commands::Error> {
        match self {
            Self::ReadyState { selector, state } => {
                commands::wait_for_ready_state(client, &selector, state, opts)
                    .await
            }
            Self::Property {
                selector,
                property,
                expected,
            } => {
                commands::wait_for_property(
                    client, &selector, &property, expected, opts,
                )
                .await
            }
            Self::Present { selector } => {
                commands::wait_for_present(client, &selector, opts).await
            }
            Self::VideoDimensions {
                selector,
                width,
                height,
            } => {
                commands::wait_for_video_dimensions(
                    client, &selector, width, height, opts,
                )
                .await
            }
            Self::Script { expression } => {
                commands::wait_for_script(client, &expression, opts).await
            }
        }
    }
}

/// Returns [`WaitOptions`] of the [`Conf`] overridden by CLI options.
fn wait_options(
    opts: &ArgMatches<'_>,
    conf: &Conf,
) -> Result<WaitOptions, String> {
    let parse = |name: &str| -> Result<Option<Duration>, String> {
        opts.value_of(name)
            .map(|v| {
                humantime::parse_duration(v)
                    .map_err(|e| format!("Invalid --{}: {}", name, e))
            })
            .transpose()
    };

    let mut wait = conf.wait_options();
    if let Some(timeout) = parse("timeout")? {
        wait = wait.timeout(timeout);
    }
    if let Some(interval) = parse("interval")? {
        wait = wait.interval(interval);
    }
    if let Some(message) = opts.value_of("message") {
        wait = wait.message(message);
    }
    Ok(wait)
}

/// Returns CLI definition.
fn cli() -> App<'static, 'static> {
    app_from_crate!()
        .arg(
            Arg::with_name("url")
                .help("URL of the sample page.")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("selector")
                .help("CSS selector of the awaited element.")
                .required_unless("script")
                .index(2),
        )
        .arg(
            Arg::with_name("ready-state")
                .help("Wait for the media element readyState (0-4).")
                .long("ready-state")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("property")
                .help("Wait for the element property to equal --equals.")
                .long("property")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("equals")
                .help("Expected JSON value of --property.")
                .long("equals")
                .takes_value(true)
                .requires("property"),
        )
        .arg(
            Arg::with_name("present")
                .help("Wait for the element to be present.")
                .long("present"),
        )
        .arg(
            Arg::with_name("video-width")
                .help("Wait for the <video> element to have this videoWidth.")
                .long("video-width")
                .takes_value(true)
                .requires("video-height"),
        )
        .arg(
            Arg::with_name("video-height")
                .help("Wait for the <video> element to have this videoHeight.")
                .long("video-height")
                .takes_value(true)
                .requires("video-width"),
        )
        .arg(
            Arg::with_name("script")
                .help("Wait for the JS expression to be truthy.")
                .long("script")
                .takes_value(true),
        )
        .group(
            ArgGroup::with_name("check")
                .args(&[
                    "ready-state",
                    "property",
                    "present",
                    "video-width",
                    "script",
                ])
                .required(true),
        )
        .arg(
            Arg::with_name("timeout")
                .help("Maximum time to wait, e.g. `10s`.")
                .long("timeout")
                .short("t")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("interval")
                .help("Delay between samples, e.g. `250ms`.")
                .long("interval")
                .short("i")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("message")
                .help(
                    "Message to report instead of the default one. `%s` is \
                     replaced with the target and `%d` with elapsed \
                     milliseconds.",
                )
                .long("message")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("headless")
                .help("Run browser without UI.")
                .long("headless"),
        )
        .arg(
            Arg::with_name("conf")
                .help("Path to the configuration file.")
                .long("conf")
                .takes_value(true),
        )
}

/// Runs the CLI and returns the process exit code.
async fn run() -> i32 {
    let opts = cli().get_matches();
    let mut conf = match Conf::parse() {
        Ok(conf) => conf,
        Err(e) => {
            eprintln!("Failed to parse configuration: {}", e);
            return 1;
        }
    };
    if opts.is_present("headless") {
        conf.browser.headless = true;
    }
    let _log_guard = match conf.log.level() {
        Ok(level) => log::init(level),
        Err(e) => {
            eprintln!("Failed to parse configuration: {}", e);
            return 1;
        }
    };

    let (check, wait) = match Check::from_opts(&opts)
        .and_then(|check| Ok((check, wait_options(&opts, &conf)?)))
    {
        Ok(parsed) => parsed,
        Err(e) => {
            error!("{}", e);
            return 1;
        }
    };

    let client = match WebClient::new(&conf.browser).await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to start browser session: {}", e);
            return 1;
        }
    };
    let url = opts.value_of("url").unwrap_or_default();
    let res = match client.goto(url).await {
        Ok(()) => check.wait(&client, wait).await,
        Err(e) => Err(e.into()),
    };
    if let Err(e) = client.close().await {
        warn!("Failed to close browser session: {}", e);
    }

    match res {
        Ok(_) => 0,
        Err(e) => {
            error!("{}", e; "url" => url);
            1
        }
    }
}

#[tokio::main]
async fn main() {
    let code = run().await;
    process::exit(code);
}
