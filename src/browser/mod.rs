//! Interaction with a browser through a [WebDriver] protocol.
//!
//! [WebDriver]: https://w3.org/TR/webdriver

mod probe;
mod statement;

use derive_more::{Display, Error, From};
use fantoccini::{Client, ClientBuilder};
use serde::Deserialize;
use serde_json::{json, Value as Json};
use webdriver::capabilities::Capabilities;

use crate::conf;

#[doc(inline)]
pub use self::{
    probe::{BrowserSampler, Probe, ReadyState, UnknownReadyState},
    statement::Statement,
};

/// Arguments for Chrome browser faking media devices.
const CHROME_FAKE_MEDIA_ARGS: &[&str] = &[
    "--use-fake-device-for-media-stream",
    "--use-fake-ui-for-media-stream",
    "--autoplay-policy=no-user-gesture-required",
];

/// Arguments for Chrome browser.
const CHROME_ARGS: &[&str] = &["--disable-dev-shm-usage", "--no-sandbox"];

/// All errors which can happen while interacting with a browser.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// JS exception thrown by an executed [`Statement`].
    #[display(fmt = "JS exception: {}", _0)]
    #[from(ignore)]
    Js(#[error(not(source))] Json),

    /// WebDriver command failed.
    #[display(fmt = "WebDriver command failed: {}", _0)]
    WebDriverCmd(fantoccini::error::CmdError),

    /// WebDriver session failed to start.
    #[display(fmt = "WebDriver session failed: {}", _0)]
    WebDriverSession(fantoccini::error::NewSessionError),

    /// Result of a [`Statement`] has unexpected shape.
    #[display(fmt = "Unexpected JS result: {}", _0)]
    ResultDeserialize(serde_json::Error),
}

/// Shortcut for a [`Result`] with an [`Error`].
///
/// [`Result`]: std::result::Result
pub type Result<T> = std::result::Result<T, Error>;

/// Result returned from all the JS code executed in a browser.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum JsResult {
    /// [`Json`] value of a successful result.
    Ok(Json),

    /// [`Json`] value of an error result.
    Err(Json),
}

impl From<JsResult> for Result<Json> {
    #[inline]
    fn from(from: JsResult) -> Self {
        match from {
            JsResult::Ok(ok) => Self::Ok(ok),
            JsResult::Err(err) => Self::Err(Error::Js(err)),
        }
    }
}

/// Client for interacting with a browser through a [WebDriver] protocol.
///
/// [WebDriver]: https://w3.org/TR/webdriver
#[derive(Clone, Debug)]
pub struct WebClient(Client);

impl WebClient {
    /// Creates a new [`WebClient`] connected to a [WebDriver] with the
    /// provided [`conf::Browser`] settings.
    ///
    /// # Errors
    ///
    /// If a WebDriver session cannot be started.
    ///
    /// [WebDriver]: https://w3.org/TR/webdriver
    pub async fn new(conf: &conf::Browser) -> Result<Self> {
        Ok(Self(
            ClientBuilder::native()
                .capabilities(webdriver_capabilities(conf))
                .connect(&conf.webdriver_addr)
                .await?,
        ))
    }

    /// Navigates the current window to the provided `url`.
    ///
    /// # Errors
    ///
    /// If WebDriver command fails.
    pub async fn goto(&self, url: &str) -> Result<()> {
        let mut client = self.0.clone();
        client.goto(url).await?;
        Ok(())
    }

    /// Executes the provided [`Statement`] in the current window and returns
    /// its result.
    ///
    /// # Errors
    ///
    /// - [`Error::Js`] if the [`Statement`] throws.
    /// - [`Error::WebDriverCmd`] if WebDriver command fails.
    /// - [`Error::ResultDeserialize`] if the result has unexpected shape.
    pub async fn execute(&self, statement: Statement) -> Result<Json> {
        let (js, args) = statement.prepare();
        let mut client = self.0.clone();
        let res = client.execute_async(&js, args).await?;

        serde_json::from_value::<JsResult>(res)?.into()
    }

    /// Closes the WebDriver session.
    ///
    /// # Errors
    ///
    /// If WebDriver command fails.
    pub async fn close(self) -> Result<()> {
        let mut client = self.0;
        client.close().await?;
        Ok(())
    }
}

/// Returns `goog:chromeOptions` for a Chrome browser.
fn chrome_caps(conf: &conf::Browser) -> Json {
    let mut args = CHROME_ARGS.to_vec();
    if conf.fake_media {
        args.extend_from_slice(CHROME_FAKE_MEDIA_ARGS);
    }
    if conf.headless {
        args.push("--headless");
    }
    json!({ "args": args })
}

/// Returns `moz:firefoxOptions` for a Firefox browser.
fn firefox_caps(conf: &conf::Browser) -> Json {
    let args: &[&str] = if conf.headless { &["--headless"] } else { &[] };
    let prefs = if conf.fake_media {
        json!({
            "media.navigator.streams.fake": true,
            "media.navigator.permission.disabled": true,
            "media.autoplay.enabled": true,
            "media.autoplay.ask-permission": false,
            "media.autoplay.default": 0,
        })
    } else {
        json!({})
    };
    json!({ "prefs": prefs, "args": args })
}

/// Returns [WebDriver capabilities][1] for Chrome and Firefox browsers.
///
/// [1]: https://mdn.io/Web/WebDriver/Capabilities
fn webdriver_capabilities(conf: &conf::Browser) -> Capabilities {
    let mut caps = Capabilities::new();
    let _ = caps.insert("moz:firefoxOptions".to_owned(), firefox_caps(conf));
    let _ = caps.insert("goog:chromeOptions".to_owned(), chrome_caps(conf));
    caps
}

#[cfg(test)]
mod spec {
    use serde_json::json;

    use super::*;

    #[test]
    fn ok_js_result_is_unwrapped() {
        let res: Result<Json> =
            serde_json::from_value::<JsResult>(json!({ "ok": 4 }))
                .unwrap()
                .into();

        assert_eq!(res.unwrap(), json!(4));
    }

    #[test]
    fn err_js_result_becomes_js_error() {
        let res: Result<Json> = serde_json::from_value::<JsResult>(
            json!({ "err": "Error: no element" }),
        )
        .unwrap()
        .into();

        match res.unwrap_err() {
            Error::Js(e) => assert_eq!(e, json!("Error: no element")),
            e => panic!("unexpected error: {}", e),
        }
    }

    #[test]
    fn malformed_js_result_is_rejected() {
        assert!(serde_json::from_value::<JsResult>(json!({})).is_err());
        assert!(serde_json::from_value::<JsResult>(json!(null)).is_err());
    }

    #[test]
    fn headless_and_fake_media_args() {
        let conf = conf::Browser {
            headless: true,
            ..conf::Browser::default()
        };

        let caps = webdriver_capabilities(&conf);
        let chrome_args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(chrome_args.contains(&json!("--headless")));
        assert!(chrome_args.contains(&json!("--use-fake-device-for-media-stream")));
        assert_eq!(caps["moz:firefoxOptions"]["args"], json!(["--headless"]));
        assert_eq!(
            caps["moz:firefoxOptions"]["prefs"]["media.navigator.streams.fake"],
            json!(true),
        );
    }

    #[test]
    fn real_media_omits_fake_args() {
        let conf = conf::Browser {
            fake_media: false,
            ..conf::Browser::default()
        };

        let caps = webdriver_capabilities(&conf);
        let chrome_args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(!chrome_args.contains(&json!("--headless")));
        assert!(!chrome_args.contains(&json!("--use-fake-ui-for-media-stream")));
        assert_eq!(caps["moz:firefoxOptions"]["prefs"], json!({}));
    }
}
