//! Concurrency tests: backpressure, shared pools, cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use seqflow_lib::errors::SeqflowError;
use seqflow_lib::fastq::{FastqLexer, fastq_transform};
use seqflow_lib::pipeline::{
    BoundedQueue, ErrorPolicy, PipelineConfig, PipelineState, RawRecord, RecordPipeline, WorkerPool,
};

use crate::helpers::{CountingLexer, fastq_text, reader};

/// Waits until `counter` has not changed for `quiet`, returning its value.
fn settle(counter: &AtomicU64, quiet: Duration) -> u64 {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut last = counter.load(Ordering::SeqCst);
    loop {
        thread::sleep(quiet);
        let now = counter.load(Ordering::SeqCst);
        if now == last || Instant::now() > deadline {
            return now;
        }
        last = now;
    }
}

fn identity(record: RawRecord<u64>) -> anyhow::Result<u64> {
    Ok(record.payload)
}

#[test]
fn test_full_queue_blocks_the_writer() {
    let queue = BoundedQueue::new("ingest", 3);
    for i in 0..3 {
        assert!(queue.push_timeout(i, Duration::from_millis(10)).unwrap().is_none());
    }
    let returned = queue.push_timeout(3, Duration::from_millis(100)).unwrap();
    assert_eq!(returned, Some(3));
    assert_eq!(queue.stats().peak_len, 3);
}

#[test]
fn test_lexer_is_held_back_by_an_idle_consumer() {
    const INGEST: usize = 3;
    const RESULTS: usize = 2;
    const TOTAL: u64 = 10_000;

    let (lexer, produced) = CountingLexer::new(TOTAL);
    let pool = WorkerPool::new(4).unwrap();
    let config = PipelineConfig::new("backpressure").with_ingest_capacity(INGEST).with_result_capacity(RESULTS);
    let pipeline = RecordPipeline::flat(lexer, identity, &pool, config).unwrap();

    // Full Result Queue, one handle held by the dispatcher, full Ingestion Queue,
    // and one record held by the lexer.
    let bound = (INGEST + RESULTS + 2) as u64;
    let stalled = settle(&produced, Duration::from_millis(100));
    assert!(stalled <= bound, "lexer produced {stalled} records with nothing consumed (bound {bound})");
    thread::sleep(Duration::from_millis(200));
    assert_eq!(produced.load(Ordering::SeqCst), stalled);

    let stats = pipeline.queue_stats();
    assert!(stats[0].peak_len <= INGEST);
    assert!(stats[1].peak_len <= RESULTS);

    let values = pipeline.read_all_ordered().unwrap();
    assert_eq!(values, (0..TOTAL).collect::<Vec<_>>());
    assert_eq!(produced.load(Ordering::SeqCst), TOTAL);
}

#[test]
fn test_pipelines_share_one_pool() {
    let pool = WorkerPool::new(3).unwrap();
    let text = fastq_text(300);

    thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|n| {
                let pool = pool.clone();
                let text = text.clone();
                scope.spawn(move || {
                    let lexer = FastqLexer::new(reader(&text), format!("reads{n}.fq"));
                    let config = PipelineConfig::new(format!("shared{n}"));
                    RecordPipeline::flat(lexer, fastq_transform, &pool, config)
                        .unwrap()
                        .read_all_ordered()
                        .unwrap()
                        .into_iter()
                        .map(|record| record.id)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let expected: Vec<String> = (0..300).map(|i| format!("read{i}")).collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_slow_transforms_complete_in_order() {
    let (lexer, _) = CountingLexer::new(200);
    let pool = WorkerPool::new(8).unwrap();
    let pipeline = RecordPipeline::flat(
        lexer,
        |record: RawRecord<u64>| {
            // Earlier records take longer, so completion order is reversed within a window.
            thread::sleep(Duration::from_micros(50 * (200 - record.payload)));
            Ok(record.payload)
        },
        &pool,
        PipelineConfig::new("slow").with_result_capacity(16),
    )
    .unwrap();
    let values: Vec<u64> = pipeline.map(Result::unwrap).collect();
    assert_eq!(values, (0..200).collect::<Vec<_>>());
}

#[test]
fn test_fail_fast_cancels_outstanding_work() {
    const TOTAL: u64 = 10_000;
    let (lexer, produced) = CountingLexer::new(TOTAL);
    let executed = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&executed);
    let pool = WorkerPool::new(2).unwrap();
    let config = PipelineConfig::new("fail-fast").with_error_policy(ErrorPolicy::FailFast);

    let mut pipeline = RecordPipeline::flat(
        lexer,
        move |record: RawRecord<u64>| {
            counter.fetch_add(1, Ordering::SeqCst);
            if record.payload == 3 {
                anyhow::bail!("bad record");
            }
            thread::sleep(Duration::from_millis(1));
            Ok(record.payload)
        },
        &pool,
        config,
    )
    .unwrap();

    let mut values = Vec::new();
    let error = loop {
        match pipeline.read() {
            Ok(Some(value)) => values.push(value),
            Ok(None) => panic!("stream ended without the transform error"),
            Err(e) => break e,
        }
    };
    assert!(matches!(error, SeqflowError::Transform { ref key, .. } if key == "k3"), "{error}");
    assert!(values.len() <= 3);
    assert!(pipeline.read().unwrap().is_none());
    assert_eq!(pipeline.state(), PipelineState::Failed);

    let lexed = settle(&produced, Duration::from_millis(50));
    assert!(lexed < TOTAL, "lexer kept running after cancellation");
    assert!(executed.load(Ordering::SeqCst) < TOTAL);
}

#[test]
fn test_dropping_an_undrained_pipeline_stops_the_lexer() {
    const TOTAL: u64 = 100_000;
    let (lexer, produced) = CountingLexer::new(TOTAL);
    let pool = WorkerPool::new(2).unwrap();
    let mut pipeline = RecordPipeline::flat(lexer, identity, &pool, PipelineConfig::new("dropped")).unwrap();

    assert_eq!(pipeline.read().unwrap(), Some(0));
    drop(pipeline);

    let lexed = settle(&produced, Duration::from_millis(50));
    assert!(lexed < TOTAL);
}
