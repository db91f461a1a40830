//! Unit tests for a producer/consumer stage built from svckit parts
//!
//! Tests cover:
//! - Producers spawned through a TaskGroup feeding a shared RingBuffer
//! - A consumer retrying failed items with readd
//! - Latest-N-wins behaviour under overflow

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use svckit::task::TaskGroup;
use svckit::RingBuffer;

#[derive(Debug, Clone, PartialEq)]
struct Sample {
    source: usize,
    seq: usize,
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_producers_then_drain() {
    let buf = Arc::new(RingBuffer::new(400));
    let group = TaskGroup::new();

    for source in 0..4 {
        let buf = Arc::clone(&buf);
        group.spawn(async move {
            for seq in 0..100 {
                buf.add(Sample { source, seq });
                tokio::task::yield_now().await;
            }
        });
    }
    group.wait().await;

    let drained = buf.drain();
    assert_eq!(drained.len(), 400);
    for source in 0..4 {
        let seqs: Vec<_> = drained
            .iter()
            .filter(|s| s.source == source)
            .map(|s| s.seq)
            .collect();
        // each producer's own items stay in order
        assert_eq!(seqs, (0..100usize).collect::<Vec<_>>());
    }
}

#[tokio::test]
async fn test_overflow_keeps_most_recent() {
    let buf = Arc::new(RingBuffer::new(10));
    let group = TaskGroup::new();

    let producer = Arc::clone(&buf);
    group.spawn(async move {
        for seq in 0..25 {
            producer.add(Sample { source: 0, seq });
        }
    });
    group.wait().await;

    let seqs: Vec<_> = buf.drain().into_iter().map(|s| s.seq).collect();
    assert_eq!(seqs, (15..25usize).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_consumer_retries_failed_sends() {
    let buf = Arc::new(RingBuffer::new(8));
    for seq in 0..5 {
        buf.add(Sample { source: 1, seq });
    }

    let attempts = Arc::new(AtomicUsize::new(0));
    let group = TaskGroup::new();
    let consumer_buf = Arc::clone(&buf);
    let consumer_attempts = Arc::clone(&attempts);
    let handle = group.spawn(async move {
        let mut delivered = Vec::new();
        while let Some(sample) = consumer_buf.pop() {
            let attempt = consumer_attempts.fetch_add(1, Ordering::SeqCst);
            // the downstream is flaky for the first two sends
            if attempt < 2 {
                if let Err(sample) = consumer_buf.readd(sample) {
                    panic!("buffer unexpectedly full, lost {:?}", sample);
                }
                continue;
            }
            delivered.push(sample.seq);
        }
        delivered
    });

    let delivered = handle.await.unwrap();
    group.wait().await;
    assert_eq!(delivered, vec![0, 1, 2, 3, 4]);
    assert_eq!(attempts.load(Ordering::SeqCst), 7);
    assert!(buf.is_empty());
}
