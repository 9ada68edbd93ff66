use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use permitgate::{
    Config, ConfigError, Coordinator, Event, EventKind, RunState, SignalMode, Subscribe,
};

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    fn of_kind(&self, kind: EventKind) -> Vec<Event> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }

    fn observed_values(&self) -> Vec<u64> {
        self.of_kind(EventKind::CounterObserved)
            .into_iter()
            .filter_map(|e| e.value)
            .collect()
    }
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, ev: &Event) {
        self.events.lock().unwrap().push(ev.clone());
    }

    fn name(&self) -> &'static str {
        "recorder"
    }

    fn queue_capacity(&self) -> usize {
        1 << 16
    }
}

fn fast_config() -> Config {
    Config {
        consumers: 4,
        producers: 3,
        capacity: 1,
        target: 10,
        cycle_delay: Duration::from_millis(1),
        producer_interval: Duration::from_millis(1),
        acquire_timeout: Duration::from_millis(100),
        release_timeout: Duration::from_millis(100),
        enqueue_timeout: Duration::from_millis(20),
        grace: Duration::from_secs(2),
        bus_capacity: 1 << 16,
        ..Config::default()
    }
}

async fn run_with(cfg: Config) -> (permitgate::RunReport, Arc<Recorder>) {
    let rec = Arc::new(Recorder::default());
    let coordinator = Coordinator::builder(cfg)
        .with_subscriber(rec.clone())
        .with_os_signals(false)
        .build()
        .expect("valid config");
    let report = tokio::time::timeout(Duration::from_secs(30), coordinator.run())
        .await
        .expect("run terminates");
    (report, rec)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn serial_gate_counts_exactly_to_target() {
    let (report, rec) = run_with(fast_config()).await;

    assert_eq!(report.final_value, 10);
    assert_eq!(report.reported_value, Some(10));
    assert!(report.target_reached());
    assert!(!report.interrupted);
    assert!(report.stopped_within_grace);
    assert_eq!(report.aborted, 0);

    let mut values = rec.observed_values();
    values.sort_unstable();
    assert_eq!(values, (1..=10).collect::<Vec<_>>());
    assert_eq!(rec.of_kind(EventKind::TargetReached).len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reference_scenario_never_exceeds_target() {
    let cfg = Config {
        consumers: 20,
        producers: 15,
        capacity: 7,
        target: 1000,
        ..fast_config()
    };
    let (report, rec) = run_with(cfg).await;

    assert_eq!(report.reported_value, Some(1000));
    assert_eq!(report.final_value, 1000);
    assert!(rec.observed_values().iter().all(|v| *v <= 1000));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_observation_adds_exactly_one_token() {
    let cfg = Config {
        consumers: 8,
        producers: 6,
        capacity: 3,
        target: 60,
        ..fast_config()
    };
    let (report, rec) = run_with(cfg).await;

    let mut values = rec.observed_values();
    values.sort_unstable();
    assert_eq!(values, (1..=60).collect::<Vec<_>>());
    assert_eq!(report.final_value, 60);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn no_observation_follows_target_reached() {
    let cfg = Config {
        consumers: 8,
        producers: 6,
        target: 40,
        ..fast_config()
    };
    let (report, rec) = run_with(cfg).await;
    assert_eq!(report.final_value, 40);

    let reached = rec.of_kind(EventKind::TargetReached);
    assert_eq!(reached.len(), 1);
    let reached_seq = reached[0].seq;
    let observed = rec.of_kind(EventKind::CounterObserved);
    assert_eq!(observed.len(), 40);
    assert!(observed.iter().all(|e| e.seq < reached_seq));

    let stopped = rec.of_kind(EventKind::ConsumerStopped);
    assert_eq!(stopped.len(), 8);
    for ev in &stopped {
        let reason = ev.reason.as_deref().unwrap_or_default();
        assert!(
            reason == "terminated" || reason == "target reached",
            "unexpected stop reason {reason:?}"
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn lagging_bus_reports_lost_events() {
    let cfg = Config {
        consumers: 8,
        producers: 8,
        capacity: 4,
        target: 300,
        bus_capacity: 4,
        ..fast_config()
    };
    let (report, rec) = run_with(cfg).await;
    assert_eq!(report.final_value, 300);

    let delivered = rec.observed_values().len() as u64;
    let lost: u64 = rec
        .of_kind(EventKind::BusLagged)
        .iter()
        .filter_map(|e| e.value)
        .sum();
    assert!(
        delivered + lost >= 300,
        "delivered={delivered} lost={lost}: observations vanished without a trace"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn token_value_is_respected() {
    let cfg = Config {
        token_value: 5,
        target: 50,
        ..fast_config()
    };
    let (report, rec) = run_with(cfg).await;

    assert_eq!(report.final_value, 50);
    let mut values = rec.observed_values();
    values.sort_unstable();
    assert_eq!(values, (1..=10).map(|i| i * 5).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn lost_wakeups_do_not_deadlock() {
    // One consumer is busy most of the time, so most signals find nobody waiting.
    let cfg = Config {
        consumers: 1,
        producers: 5,
        target: 25,
        cycle_delay: Duration::from_millis(5),
        signal_mode: SignalMode::Lossy,
        ..fast_config()
    };
    let (report, rec) = run_with(cfg).await;

    assert_eq!(report.final_value, 25);
    assert!(!rec.of_kind(EventKind::TokenEnqueued).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn buffered_signals_reach_target() {
    let cfg = Config {
        signal_mode: SignalMode::Buffered,
        ..fast_config()
    };
    let (report, _) = run_with(cfg).await;
    assert_eq!(report.final_value, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn states_move_forward_in_order() {
    let rec = Arc::new(Recorder::default());
    let coordinator = Coordinator::builder(fast_config())
        .with_subscriber(rec.clone())
        .with_os_signals(false)
        .build()
        .unwrap();
    let state = coordinator.state();
    assert_eq!(*state.borrow(), RunState::Running);

    let _ = coordinator.run().await;

    assert_eq!(*state.borrow(), RunState::Terminated);
    let states: Vec<RunState> = rec
        .of_kind(EventKind::StateChanged)
        .into_iter()
        .filter_map(|e| e.state)
        .collect();
    assert_eq!(
        states,
        vec![RunState::Running, RunState::Draining, RunState::Terminated]
    );
    assert_eq!(rec.of_kind(EventKind::AllStoppedWithin).len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stop_token_interrupts_run() {
    let stop = CancellationToken::new();
    let cfg = Config {
        target: u64::MAX,
        ..fast_config()
    };
    let rec = Arc::new(Recorder::default());
    let coordinator = Coordinator::builder(cfg)
        .with_subscriber(rec.clone())
        .with_stop_token(stop.clone())
        .with_os_signals(false)
        .build()
        .unwrap();

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        stop.cancel();
    });
    let report = coordinator.run().await;
    canceller.await.unwrap();

    assert!(report.interrupted);
    assert!(!report.target_reached());
    assert!(report.stopped_within_grace);
    assert_eq!(rec.of_kind(EventKind::ShutdownRequested).len(), 1);

    let stopped = rec.of_kind(EventKind::ConsumerStopped).len();
    assert_eq!(stopped, 4, "every consumer leaves its loop");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stuck_consumers_are_aborted_after_grace() {
    let stop = CancellationToken::new();
    let cfg = Config {
        target: u64::MAX,
        acquire_timeout: Duration::from_secs(10),
        grace: Duration::from_millis(50),
        ..fast_config()
    };
    let coordinator = Coordinator::builder(cfg)
        .with_stop_token(stop.clone())
        .with_os_signals(false)
        .build()
        .unwrap();

    // Hold the only permit so consumers park inside acquire, which is not interruptible.
    let sem = coordinator.semaphore();
    let held = sem.acquire().await.unwrap();

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        stop.cancel();
    });
    let report = coordinator.run().await;
    canceller.await.unwrap();

    assert!(report.interrupted);
    assert!(!report.stopped_within_grace);
    assert!(report.aborted > 0);
    assert_eq!(report.final_value, 0);

    sem.release(held).await.unwrap();
}

#[test]
fn invalid_config_is_rejected_before_running() {
    let cfg = Config {
        capacity: 0,
        ..Config::default()
    };
    let err = Coordinator::builder(cfg).build().err();
    assert_eq!(err, Some(ConfigError::ZeroCapacity));
}
