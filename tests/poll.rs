//! Poll sequences driven through the public API.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use samples_e2e::{
    poll::{
        from_fn, AssertionFailed, InvalidConfiguration, ProbeUnavailable,
        Reporter,
    },
    Expectation, PollOutcome, Poller, WaitOptions,
};
use serde_json::json;
use tokio::time::{self, Instant};

/// [`Reporter`] collecting all the reported [`PollOutcome`]s.
#[derive(Clone, Default)]
struct Collector(Arc<Mutex<Vec<PollOutcome>>>);

impl Collector {
    fn reported(&self) -> Vec<PollOutcome> {
        self.0.lock().unwrap().clone()
    }
}

impl Reporter for Collector {
    fn report(&self, outcome: &PollOutcome) {
        self.0.lock().unwrap().push(outcome.clone());
    }
}

#[tokio::test(start_paused = true)]
async fn media_becomes_ready_midway() {
    let collector = Collector::default();
    let req = WaitOptions::default()
        .timeout(Duration::from_millis(5000))
        .interval(Duration::from_millis(100))
        .begin("readyState == 4", "video")
        .unwrap();
    let start = Instant::now();

    let outcome = Poller::new(
        req,
        Expectation::Equals(json!(4)),
        from_fn(move || {
            let state = if start.elapsed() >= Duration::from_millis(350) {
                4
            } else {
                1
            };
            async move { Ok(json!(state)) }
        }),
    )
    .with_reporter(collector.clone())
    .run()
    .await;

    assert!(outcome.succeeded);
    assert!(outcome.elapsed >= Duration::from_millis(300));
    assert!(outcome.elapsed <= Duration::from_millis(450));
    assert_eq!(
        outcome.message,
        "Condition `readyState == 4` on <video> was satisfied after 400ms",
    );
    assert_eq!(collector.reported(), vec![outcome]);
}

#[tokio::test(start_paused = true)]
async fn never_satisfied_predicate_times_out_with_bounded_overshoot() {
    let collector = Collector::default();
    let req = WaitOptions::default()
        .timeout(Duration::from_millis(1000))
        .interval(Duration::from_millis(100))
        .begin("readyState == 4", "video")
        .unwrap();

    let outcome = Poller::new(
        req,
        Expectation::Equals(json!(4)),
        from_fn(|| async { Ok(json!(0)) }),
    )
    .with_reporter(collector.clone())
    .run()
    .await;

    assert!(!outcome.succeeded);
    assert!(outcome.elapsed >= Duration::from_millis(1000));
    assert!(outcome.elapsed < Duration::from_millis(1100));
    assert_eq!(collector.reported().len(), 1);

    let err = outcome.clone().into_result().unwrap_err();
    assert_eq!(
        err,
        AssertionFailed {
            message: "Timed out after 1000ms waiting for condition \
                      `readyState == 4` on <video>"
                .to_owned(),
            elapsed: Duration::from_millis(1000),
        },
    );
    assert_eq!(err.to_string(), outcome.message);
}

#[tokio::test(start_paused = true)]
async fn slow_probe_never_overshoots_more_than_its_own_duration() {
    let req = WaitOptions::default()
        .timeout(Duration::from_millis(1000))
        .interval(Duration::from_millis(400))
        .begin("is truthy", "window.connected")
        .unwrap();

    let outcome = Poller::new(
        req,
        Expectation::Truthy,
        from_fn(|| async {
            time::sleep(Duration::from_millis(30)).await;
            Ok(json!(false))
        }),
    )
    .with_reporter(Collector::default())
    .run()
    .await;

    assert!(!outcome.succeeded);
    assert!(outcome.elapsed >= Duration::from_millis(1000));
    assert!(outcome.elapsed < Duration::from_millis(1100));
}

#[tokio::test(start_paused = true)]
async fn missing_target_ends_in_timeout() {
    let probes = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&probes);
    let req = WaitOptions::default()
        .timeout(Duration::from_millis(1000))
        .begin("is present", "#remote-video")
        .unwrap();

    let outcome = Poller::new(
        req,
        Expectation::Truthy,
        from_fn(move || {
            let _ = counter.fetch_add(1, Ordering::SeqCst);
            async {
                Err(ProbeUnavailable::new(
                    "#remote-video",
                    "No element matches #remote-video",
                ))
            }
        }),
    )
    .with_reporter(Collector::default())
    .run()
    .await;

    assert!(!outcome.succeeded);
    assert_eq!(outcome.elapsed, Duration::from_millis(1000));
    assert_eq!(probes.load(Ordering::SeqCst), 11);
}

#[tokio::test(start_paused = true)]
async fn independent_sequences_run_concurrently() {
    let collector = Collector::default();
    let opts = WaitOptions::default().timeout(Duration::from_millis(500));
    let start = Instant::now();

    let ready = Poller::new(
        opts.clone().begin("is truthy", "first").unwrap(),
        Expectation::Truthy,
        from_fn(move || {
            let ready = start.elapsed() >= Duration::from_millis(200);
            async move { Ok(json!(ready)) }
        }),
    )
    .with_reporter(collector.clone())
    .run();
    let never = Poller::new(
        opts.begin("is truthy", "second").unwrap(),
        Expectation::Truthy,
        from_fn(|| async { Ok(json!(null)) }),
    )
    .with_reporter(collector.clone())
    .run();

    let (ready, never) = futures::join!(ready, never);

    assert!(ready.succeeded);
    assert_eq!(ready.elapsed, Duration::from_millis(200));
    assert!(!never.succeeded);
    assert_eq!(never.elapsed, Duration::from_millis(500));
    assert_eq!(collector.reported(), vec![ready, never]);
}

#[test]
fn zero_durations_are_rejected_before_sampling() {
    let res = WaitOptions::default()
        .timeout(Duration::from_millis(0))
        .begin("readyState == 4", "video");
    assert_eq!(res.unwrap_err(), InvalidConfiguration::ZeroTimeout);

    let res = WaitOptions::default()
        .interval(Duration::from_millis(0))
        .begin("readyState == 4", "video");
    assert_eq!(res.unwrap_err(), InvalidConfiguration::ZeroInterval);
}

#[tokio::test(start_paused = true)]
async fn message_override_is_reported() {
    let collector = Collector::default();
    let req = WaitOptions::default()
        .message("Media <%s> is playing after %dms")
        .begin("readyState == 4", "video#local")
        .unwrap();

    let outcome = Poller::new(
        req,
        Expectation::Equals(json!(4)),
        from_fn(|| async { Ok(json!(4)) }),
    )
    .with_reporter(collector.clone())
    .run()
    .await;

    assert_eq!(outcome.message, "Media <video#local> is playing after 0ms");
    assert_eq!(collector.reported()[0].message, outcome.message);
}

#[tokio::test(start_paused = true)]
async fn huge_interval_is_clamped_to_deadline() {
    let collector = Collector::default();
    let req = WaitOptions::default()
        .timeout(Duration::from_millis(300))
        .interval(Duration::MAX)
        .begin("is truthy", "window.connected")
        .unwrap();

    let outcome = Poller::new(
        req,
        Expectation::Truthy,
        from_fn(|| async { Ok(json!(false)) }),
    )
    .with_reporter(collector.clone())
    .run()
    .await;

    assert!(!outcome.succeeded);
    assert_eq!(outcome.elapsed, Duration::from_millis(300));
    assert_eq!(collector.reported(), vec![outcome]);
}

#[tokio::test(start_paused = true)]
async fn huge_timeout_still_produces_outcome() {
    let collector = Collector::default();
    let req = WaitOptions::default()
        .timeout(Duration::MAX)
        .begin("readyState == 4", "video")
        .unwrap();

    let outcome = Poller::new(
        req,
        Expectation::Equals(json!(4)),
        from_fn(|| async { Ok(json!(4)) }),
    )
    .with_reporter(collector.clone())
    .run()
    .await;

    assert!(outcome.succeeded);
    assert_eq!(outcome.elapsed, Duration::from_millis(0));
    assert_eq!(collector.reported(), vec![outcome]);
}
