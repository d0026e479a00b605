//! E2E tests harness for [WebRTC] samples.
//!
//! Drives a browser through a [WebDriver] protocol and waits for conditions
//! on sample pages by polling them.
//!
//! [WebDriver]: https://w3.org/TR/webdriver
//! [WebRTC]: https://w3.org/TR/webrtc

#![forbid(non_ascii_idents, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

pub mod browser;
pub mod commands;
pub mod conf;
pub mod log;
pub mod poll;

#[doc(inline)]
pub use self::{
    browser::WebClient,
    conf::Conf,
    poll::{Expectation, PollOutcome, Poller, WaitOptions},
};
