use std::sync::Arc;
use std::time::Duration;

use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

use permitgate::{Config, Coordinator, Display, LogWriter, SignalMode, Subscribe};

#[derive(StructOpt, Debug)]
#[structopt(
    name = "permitgate",
    about = "Count to a target through a timeout-bounded semaphore fed by producers"
)]
struct Args {
    /// Number of consumer tasks (also the work queue capacity).
    #[structopt(short = "c", long, default_value = "20")]
    consumers: usize,

    /// Number of producer tasks.
    #[structopt(short = "p", long, default_value = "15")]
    producers: usize,

    /// Semaphore capacity.
    #[structopt(short = "s", long, default_value = "7")]
    capacity: usize,

    /// Counter value that ends the run.
    #[structopt(short = "t", long, default_value = "1000")]
    target: u64,

    /// Amount each token adds to the counter.
    #[structopt(long, default_value = "1")]
    token_value: u64,

    /// Pause after each consumer cycle, in milliseconds.
    #[structopt(long, default_value = "300")]
    cycle_delay_ms: u64,

    /// Pause between producer iterations, in milliseconds.
    #[structopt(long, default_value = "300")]
    producer_interval_ms: u64,

    /// Acquire and release timeout, in milliseconds.
    #[structopt(long, default_value = "300")]
    gate_timeout_ms: u64,

    /// Acquire timeout, in milliseconds (overrides --gate-timeout-ms).
    #[structopt(long)]
    acquire_timeout_ms: Option<u64>,

    /// Release timeout, in milliseconds (overrides --gate-timeout-ms).
    #[structopt(long)]
    release_timeout_ms: Option<u64>,

    /// How long a producer waits for queue room, in milliseconds.
    #[structopt(long, default_value = "300")]
    enqueue_timeout_ms: u64,

    /// Keep one wake for the next waiter instead of dropping signals nobody waits for.
    #[structopt(long)]
    buffered_signals: bool,

    /// Grace period after termination, in milliseconds.
    #[structopt(long, default_value = "2000")]
    grace_ms: u64,

    /// Event bus buffer, in events.
    #[structopt(long, default_value = "1024")]
    bus_capacity: usize,

    /// Log events instead of drawing per-consumer rows.
    #[structopt(long)]
    no_display: bool,
}

impl Args {
    fn into_config(self) -> Config {
        let acquire_ms = self.acquire_timeout_ms.unwrap_or(self.gate_timeout_ms);
        let release_ms = self.release_timeout_ms.unwrap_or(self.gate_timeout_ms);
        Config {
            consumers: self.consumers,
            producers: self.producers,
            capacity: self.capacity,
            target: self.target,
            token_value: self.token_value,
            cycle_delay: Duration::from_millis(self.cycle_delay_ms),
            producer_interval: Duration::from_millis(self.producer_interval_ms),
            acquire_timeout: Duration::from_millis(acquire_ms),
            release_timeout: Duration::from_millis(release_ms),
            enqueue_timeout: Duration::from_millis(self.enqueue_timeout_ms),
            signal_mode: if self.buffered_signals {
                SignalMode::Buffered
            } else {
                SignalMode::Lossy
            },
            grace: Duration::from_millis(self.grace_ms),
            bus_capacity: self.bus_capacity,
        }
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::from_args();
    let show_display = !args.no_display;

    // Rows and log lines share the terminal; keep logs quiet while drawing.
    let default_filter = if show_display { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cfg = args.into_config();
    let display = Arc::new(Display::stdout());
    let mut subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    if show_display {
        display.clear()?;
        subs.push(display.clone());
    }

    let report = Coordinator::builder(cfg).with_subscribers(subs).build()?.run().await;

    if show_display {
        display.summary(report.final_value)?;
    } else {
        println!("Total: {}", report.final_value);
    }
    tracing::info!(
        target_reached = report.target_reached(),
        interrupted = report.interrupted,
        aborted = report.aborted,
        tokens_enqueued = report.tokens_enqueued,
        "run finished"
    );
    Ok(())
}
