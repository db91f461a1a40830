//! Producer/consumer pipeline over a shared ring buffer
//!
//! Run with: cargo run --example pipeline -- --producers 3 --log-level debug
//!
//! Producers push samples into a bounded buffer that keeps only the most
//! recent entries. A consumer drains it, and every item whose delivery fails
//! is put back at the head with `readd` so it is retried first.

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use svckit::cli::LogStdArgs;
use svckit::grpc;
use svckit::logging::{self, StartupInfo};
use svckit::task::TaskGroup;
use svckit::RingBuffer;

const APP_NAME: &str = "pipeline";

#[derive(Parser)]
#[command(name = APP_NAME)]
#[command(about = "Bounded producer/consumer pipeline demo")]
struct Cli {
    #[command(flatten)]
    log: LogStdArgs,

    /// Ring buffer capacity
    #[arg(long, default_value_t = 64)]
    capacity: usize,

    /// Number of producer tasks
    #[arg(long, default_value_t = 2)]
    producers: usize,

    /// Samples each producer emits
    #[arg(long, default_value_t = 100)]
    samples: u64,

    /// Every Nth delivery attempt fails and is retried (0 disables, minimum 2)
    #[arg(long, default_value_t = 10)]
    fail_every: u64,

    /// Optional gRPC collector, e.g. unix:///run/collector.sock
    #[arg(long, value_name = "TARGET")]
    collector: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct PipelineConfig {
    capacity: usize,
    producers: usize,
    samples: u64,
    fail_every: u64,
    poll_interval: Duration,
}

#[derive(Debug)]
struct Sample {
    producer: usize,
    seq: u64,
}

/// A period of 1 would fail every retry too, so the consumer never drains.
fn failure_period(requested: u64) -> u64 {
    match requested {
        0 => 0,
        n => n.max(2),
    }
}

fn delivery_fails(attempt: u64, period: u64) -> bool {
    period != 0 && attempt % period == 0
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_cfg = cli.log.clone().into_config();
    logging::setup_std_logger(&log_cfg)?;

    let cfg = PipelineConfig {
        capacity: cli.capacity,
        producers: cli.producers,
        samples: cli.samples,
        fail_every: failure_period(cli.fail_every),
        poll_interval: Duration::from_millis(5),
    };
    StartupInfo::new(APP_NAME).config(&log_cfg).config(&cfg).log();

    if let Some(target) = &cli.collector {
        let _channel = grpc::insecure_channel_or_exit(target, &mut None);
        tracing::info!(target_addr = %target, "Collector channel ready");
    }

    let buf = Arc::new(RingBuffer::try_new(cfg.capacity)?);
    let producers = TaskGroup::new();

    for producer in 0..cfg.producers {
        let buf = Arc::clone(&buf);
        let samples = cfg.samples;
        producers.spawn(async move {
            for seq in 0..samples {
                buf.add(Sample { producer, seq });
                tokio::task::yield_now().await;
            }
            tracing::debug!(producer, "Producer finished");
        });
    }

    let attempts = Arc::new(AtomicU64::new(0));
    let delivered = Arc::new(AtomicU64::new(0));
    let poll_interval = cfg.poll_interval;
    let fail_every = cfg.fail_every;
    let consumer = {
        let buf = Arc::clone(&buf);
        let producers = producers.clone();
        let attempts = Arc::clone(&attempts);
        let delivered = Arc::clone(&delivered);
        let group = TaskGroup::new();
        let handle = group.spawn(async move {
            loop {
                let Some(sample) = buf.pop() else {
                    if producers.active() == 0 && buf.is_empty() {
                        break;
                    }
                    tokio::time::sleep(poll_interval).await;
                    continue;
                };

                let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
                if delivery_fails(attempt, fail_every) {
                    tracing::debug!(
                        producer = sample.producer,
                        seq = sample.seq,
                        "Delivery failed, retrying"
                    );
                    if let Err(sample) = buf.readd(sample) {
                        tracing::warn!(
                            producer = sample.producer,
                            seq = sample.seq,
                            "Buffer refilled before retry, dropping sample"
                        );
                    }
                    continue;
                }
                delivered.fetch_add(1, Ordering::Relaxed);
            }
        });
        (group, handle)
    };

    producers.wait().await;
    let (consumer_group, handle) = consumer;
    handle.await?;
    consumer_group.wait().await;

    let produced = cfg.samples * cfg.producers as u64;
    let delivered = delivered.load(Ordering::Relaxed);
    tracing::info!(
        produced,
        delivered,
        overwritten = produced.saturating_sub(delivered),
        attempts = attempts.load(Ordering::Relaxed),
        "Pipeline drained"
    );
    Ok(())
}
