//! Error reporting: how callers tell clean exhaustion from partial and empty failures.

use rstest::rstest;

use seqflow_lib::errors::SeqflowError;
use seqflow_lib::fastq::{FastqLexer, fastq_transform};
use seqflow_lib::pipeline::{ErrorPolicy, PipelineConfig, PipelineState, RecordPipeline, WorkerPool};

use crate::helpers::{THREE_READS, reader};

fn run(text: &str, policy: ErrorPolicy) -> RecordPipeline<seqflow_lib::SeqRecord> {
    let pool = WorkerPool::new(2).unwrap();
    let lexer = FastqLexer::new(reader(text), "reads.fq");
    RecordPipeline::flat(lexer, fastq_transform, &pool, PipelineConfig::new("errors").with_error_policy(policy))
        .unwrap()
}

#[rstest]
#[case(ErrorPolicy::Isolate)]
#[case(ErrorPolicy::FailFast)]
fn test_clean_exhaustion(#[case] policy: ErrorPolicy) {
    let mut pipeline = run(THREE_READS, policy);
    let mut count = 0;
    while let Some(record) = pipeline.read().unwrap() {
        assert!(!record.is_empty());
        count += 1;
    }
    assert_eq!(count, 3);
    // Reading past the end keeps returning the end marker.
    assert!(pipeline.read().unwrap().is_none());
    assert!(pipeline.read().unwrap().is_none());
    assert_eq!(pipeline.state(), PipelineState::Closed);
}

#[test]
fn test_no_records_then_error() {
    let partial = run("ACGT\n+\nFFFF\n", ErrorPolicy::Isolate).read_all().unwrap_err();
    assert!(partial.records.is_empty());
    assert_eq!(partial.error.line(), Some(1));
    assert!(partial.to_string().contains("1 error(s)"));
}

#[test]
fn test_empty_input_is_clean() {
    let records = run("", ErrorPolicy::Isolate).read_all().unwrap();
    assert!(records.is_empty());
    let records = run("\n\n", ErrorPolicy::Isolate).read_all_ordered().unwrap();
    assert!(records.is_empty());
}

#[test]
fn test_truncated_final_record() {
    let partial = run("@r1\nACGT\n+\nFFFF\n@r2\nGG\n", ErrorPolicy::Isolate).read_all_ordered().unwrap_err();
    assert_eq!(partial.records.len(), 1);
    assert_eq!(partial.error.line(), Some(7));
    assert!(partial.error.to_string().contains("missing separator line"));
}

#[test]
fn test_isolate_counts_every_transform_error() {
    let text = "@r1\nAC\n+\nF\n@r2\nGG\n+\nFF\n@r3\nAZ\n+\nFF\n@r4\nT\n+\nF\n";
    let partial = run(text, ErrorPolicy::Isolate).read_all_ordered().unwrap_err();
    let ids: Vec<&str> = partial.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["r2", "r4"]);
    assert_eq!(partial.error_count, 2);
    assert!(matches!(partial.error, SeqflowError::Transform { ref key, .. } if key == "r1"));
}

#[test]
fn test_fail_fast_stops_after_first_error() {
    let text = "@r1\nAC\n+\nF\n@r2\nGG\n+\nFF\n@r3\nAZ\n+\nFF\n@r4\nT\n+\nF\n";
    let mut pipeline = run(text, ErrorPolicy::FailFast);
    let err = pipeline.read().unwrap_err();
    assert!(matches!(err, SeqflowError::Transform { ref key, .. } if key == "r1"), "{err}");
    assert!(pipeline.read().unwrap().is_none());
    assert_eq!(pipeline.state(), PipelineState::Failed);
}

#[test]
fn test_fail_fast_malformed_input() {
    let corrupted = THREE_READS.replacen("GG\n+\n", "GG\nx\n", 1);
    let mut pipeline = run(&corrupted, ErrorPolicy::FailFast);
    let mut errors = Vec::new();
    while let Some(result) = pipeline.next() {
        if let Err(e) = result {
            errors.push(e);
        }
    }
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].line(), Some(7));
    assert_eq!(pipeline.state(), PipelineState::Failed);
}

#[test]
fn test_zero_capacity_is_rejected() {
    let pool = WorkerPool::new(1).unwrap();
    let lexer = FastqLexer::new(reader(THREE_READS), "reads.fq");
    let result = RecordPipeline::flat(
        lexer,
        fastq_transform,
        &pool,
        PipelineConfig::new("bad").with_result_capacity(0),
    );
    assert!(matches!(result, Err(SeqflowError::InvalidParameter { .. })));
}

#[test]
fn test_panicking_transform_is_reported() {
    let pool = WorkerPool::new(2).unwrap();
    let lexer = FastqLexer::new(reader(THREE_READS), "reads.fq");
    let results: Vec<_> = RecordPipeline::flat(
        lexer,
        |record: seqflow_lib::pipeline::RawRecord<seqflow_lib::fastq::FastqLines>| {
            assert_ne!(record.key, "r2", "boom");
            fastq_transform(record)
        },
        &pool,
        PipelineConfig::new("panics"),
    )
    .unwrap()
    .collect();

    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(SeqflowError::WorkerPanicked { .. })));
    assert!(results[2].is_ok());
}
