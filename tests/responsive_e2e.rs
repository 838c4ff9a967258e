use std::sync::Arc;

use parking_lot::Mutex;

use responsive::{
    BreakpointMap, EventLoop, Listener, ManualClock, MediaEnvironment, ResizeNotifier, Responsive,
    ResponsiveConfig, AGGREGATE_ENTER, AGGREGATE_LEAVE,
};

const QUERY_SMALL: &str = "screen and (max-width: 599px)";
const QUERY_LARGE: &str = "screen and (min-width: 600px)";

struct Host {
    env: Arc<MediaEnvironment>,
    notifier: Arc<ResizeNotifier>,
    clock: Arc<ManualClock>,
    event_loop: Arc<EventLoop>,
}

impl Host {
    fn new() -> Self {
        let clock = Arc::new(ManualClock::new());
        Self {
            env: Arc::new(MediaEnvironment::new()),
            notifier: Arc::new(ResizeNotifier::new()),
            event_loop: Arc::new(EventLoop::with_clock(clock.clone())),
            clock,
        }
    }

    fn tracker(&self) -> Responsive {
        Responsive::builder()
            .breakpoints(BreakpointMap::from_pairs([("small", QUERY_SMALL), ("large", QUERY_LARGE)]).unwrap())
            .evaluator(self.env.clone())
            .notifier(self.notifier.clone())
            .event_loop(Arc::clone(&self.event_loop))
            .build()
            .unwrap()
    }

    fn resize_to_small(&self) {
        self.env.set_many([(QUERY_SMALL, true), (QUERY_LARGE, false)]);
    }

    fn resize_to_large(&self) {
        self.env.set_many([(QUERY_SMALL, false), (QUERY_LARGE, true)]);
    }
}

/// Records `(event name, carried breakpoints)` for every event of interest.
fn record_all(tracker: &Responsive, names: &[&str]) -> Arc<Mutex<Vec<(String, Vec<String>)>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let l = Arc::clone(&log);
    let listener = Listener::new(move |_, event| {
        l.lock().push((event.event_name(), event.breakpoints().to_vec()));
    });
    for name in names {
        tracker.on(name, &listener);
    }
    log
}

const ALL_EVENTS: [&str; 6] = [
    AGGREGATE_LEAVE,
    AGGREGATE_ENTER,
    "smallleave",
    "smallenter",
    "largeleave",
    "largeenter",
];

#[test]
fn small_to_large_scenario() {
    let host = Host::new();
    host.resize_to_small();
    let tracker = host.tracker();

    assert!(tracker.is("small"));
    assert!(!tracker.is("large"));
    assert!(tracker.not("large"));
    host.event_loop.run_until_idle();

    let log = record_all(&tracker, &ALL_EVENTS);
    host.resize_to_large();
    tracker.update().unwrap();

    assert_eq!(tracker.current_breakpoints(), vec!["large".to_string()]);
    let names: Vec<String> = log.lock().iter().map(|(name, _)| name.clone()).collect();
    assert!(names.contains(&"smallleave".to_string()));
    assert!(names.contains(&"largeenter".to_string()));
}

#[test]
fn events_fire_in_fixed_order() {
    let host = Host::new();
    host.resize_to_small();
    let tracker = host.tracker();
    host.event_loop.run_until_idle();

    let log = record_all(&tracker, &ALL_EVENTS);
    host.resize_to_large();
    tracker.update().unwrap();

    let expected = vec![
        (AGGREGATE_LEAVE.to_string(), vec!["small".to_string()]),
        (AGGREGATE_ENTER.to_string(), vec!["large".to_string()]),
        ("smallleave".to_string(), vec!["small".to_string()]),
        ("largeenter".to_string(), vec!["large".to_string()]),
    ];
    assert_eq!(*log.lock(), expected);
}

#[test]
fn aggregate_events_fire_even_when_one_side_is_empty() {
    let host = Host::new();
    let tracker = host.tracker();
    host.event_loop.run_until_idle();

    let log = record_all(&tracker, &ALL_EVENTS);
    host.resize_to_small();
    tracker.update().unwrap();

    let expected = vec![
        (AGGREGATE_LEAVE.to_string(), vec![]),
        (AGGREGATE_ENTER.to_string(), vec!["small".to_string()]),
        ("smallenter".to_string(), vec!["small".to_string()]),
    ];
    assert_eq!(*log.lock(), expected);
}

#[test]
fn initial_events_reach_listeners_attached_after_construction() {
    let host = Host::new();
    host.resize_to_large();
    let tracker = host.tracker();

    let log = record_all(&tracker, &ALL_EVENTS);
    assert!(log.lock().is_empty(), "nothing may fire before the next turn");

    host.event_loop.turn();
    let expected = vec![
        (AGGREGATE_LEAVE.to_string(), vec![]),
        (AGGREGATE_ENTER.to_string(), vec!["large".to_string()]),
        ("largeenter".to_string(), vec!["large".to_string()]),
    ];
    assert_eq!(*log.lock(), expected);
}

#[test]
fn resize_before_first_turn_keeps_event_order() {
    let host = Host::new();
    host.resize_to_small();
    let tracker = host.tracker();
    let log = record_all(&tracker, &ALL_EVENTS);

    host.resize_to_large();
    host.notifier.notify();
    host.event_loop.run_until_idle();

    let names: Vec<String> = log.lock().iter().map(|(name, _)| name.clone()).collect();
    assert_eq!(
        names,
        [
            AGGREGATE_LEAVE,
            AGGREGATE_ENTER,
            "smallenter",
            AGGREGATE_LEAVE,
            AGGREGATE_ENTER,
            "smallleave",
            "largeenter",
        ]
    );
    assert_eq!(tracker.current_breakpoints(), vec!["large".to_string()]);

    host.clock.advance_ms(1000);
    host.event_loop.run_until_idle();
    assert_eq!(log.lock().len(), 7, "no stale events after the window closes");
}

#[test]
fn no_events_when_nothing_matches_initially() {
    let host = Host::new();
    let tracker = host.tracker();
    assert_eq!(host.event_loop.pending_tasks(), 0);
    assert!(tracker.current_breakpoints().is_empty());
}

#[test]
fn resize_burst_recomputes_at_most_twice() {
    let host = Host::new();
    host.resize_to_small();
    let tracker = host.tracker();
    host.event_loop.run_until_idle();

    let recomputes = Arc::new(Mutex::new(0usize));
    let r = Arc::clone(&recomputes);
    tracker.on(AGGREGATE_ENTER, &Listener::new(move |_, _| *r.lock() += 1));

    // Flip the viewport on every notification so each recompute is a real change.
    for i in 0..20 {
        if i % 2 == 0 {
            host.resize_to_large();
        } else {
            host.resize_to_small();
        }
        host.notifier.notify();
        host.clock.advance_ms(25);
        host.event_loop.run_until_idle();
    }
    assert_eq!(*recomputes.lock(), 1, "only the leading call runs inside the window");

    host.clock.advance_ms(1000);
    host.event_loop.run_until_idle();
    assert_eq!(*recomputes.lock(), 2, "one trailing call after the window");
    assert!(tracker.is("small"), "trailing call sees the final state");
}

#[test]
fn listen_many_times_subscribes_once() {
    let host = Host::new();
    let tracker = host.tracker();
    for _ in 0..10 {
        tracker.listen();
    }
    assert_eq!(host.notifier.subscriber_count(), 1);
}

#[test]
fn independent_trackers_each_subscribe() {
    let host = Host::new();
    let a = host.tracker();
    let b = host.tracker();
    assert_eq!(host.notifier.subscriber_count(), 2);

    host.resize_to_large();
    host.notifier.notify();
    assert!(a.is("large"));
    assert!(b.is("large"));
}

#[test]
fn unknown_breakpoint_is_never_active() {
    let host = Host::new();
    host.resize_to_small();
    let tracker = host.tracker();
    assert!(!tracker.is("nonexistent"));
    assert!(tracker.not("nonexistent"));
}

#[test]
fn config_drives_breakpoints_and_throttle() {
    let host = Host::new();
    let cfg = ResponsiveConfig::from_json_str(
        r#"{"throttle_ms": 200, "breakpoints": {"small": "screen and (max-width: 599px)"}}"#,
    )
    .unwrap();
    host.resize_to_small();
    let tracker = Responsive::builder()
        .config(cfg)
        .evaluator(host.env.clone())
        .notifier(host.notifier.clone())
        .event_loop(Arc::clone(&host.event_loop))
        .build()
        .unwrap();
    assert_eq!(tracker.breakpoints().len(), 1);
    assert!(tracker.is("small"));

    host.notifier.notify();
    host.resize_to_large();
    host.notifier.notify();
    host.clock.advance_ms(200);
    host.event_loop.run_until_idle();
    assert!(tracker.not("small"));
}

#[test]
fn default_breakpoints_are_tracked() {
    let host = Host::new();
    host.env.set_many([
        ("screen and (min-width: 720px)", true),
        ("screen and (min-width: 1024px)", true),
    ]);
    let tracker = Responsive::builder()
        .evaluator(host.env.clone())
        .notifier(host.notifier.clone())
        .event_loop(Arc::clone(&host.event_loop))
        .build()
        .unwrap();

    assert_eq!(
        tracker.current_breakpoints(),
        vec!["lap-and-up".to_string(), "desk".to_string()]
    );
    assert_eq!(tracker.get_breakpoint("palm"), Some("screen and (max-width: 719px)"));
}
