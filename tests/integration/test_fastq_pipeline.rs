//! End-to-end tests of the flat pipeline over FASTQ and FASTA input.

use rstest::rstest;
use std::collections::BTreeMap;
use seqflow_lib::SeqRecord;
use seqflow_lib::dna::SeqType;
use seqflow_lib::errors::SeqflowError;
use seqflow_lib::fasta::{FastaLexer, fasta_transform};
use seqflow_lib::fastq::{FastqLexer, fastq_transform};
use seqflow_lib::input::open_input;
use seqflow_lib::pipeline::{PipelineConfig, PipelineState, RecordPipeline, WorkerPool};
use tempfile::TempDir;

use crate::helpers::{THREE_READS, fastq_text, reader, write_file};

fn fastq_pipeline(text: &str, pool: &WorkerPool) -> RecordPipeline<SeqRecord> {
    let lexer = FastqLexer::new(reader(text), "reads.fq");
    RecordPipeline::flat(lexer, fastq_transform, pool, PipelineConfig::new("reads"))
        .expect("pipeline should start")
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(8)]
fn test_order_is_file_order_for_any_pool_size(#[case] threads: usize) {
    let text = fastq_text(2_000);
    let expected: Vec<String> = (0..2_000).map(|i| format!("read{i}")).collect();

    let pool = WorkerPool::new(threads).unwrap();
    let mut pipeline = fastq_pipeline(&text, &pool);
    let mut ids = Vec::new();
    while pipeline.has_next() {
        let record = pipeline.next().unwrap().unwrap();
        assert_eq!(record.quality.as_ref().map(Vec::len), Some(record.len()));
        ids.push(record.id);
    }
    assert_eq!(ids, expected);
    assert!(pipeline.next().is_none());
    assert_eq!(pipeline.state(), PipelineState::Closed);
    assert_eq!(pipeline.delivered(), 2_000);
}

#[test]
fn test_identical_output_across_pool_sizes() {
    let text = fastq_text(500);
    let run = |threads: usize| -> Vec<SeqRecord> {
        let pool = WorkerPool::new(threads).unwrap();
        fastq_pipeline(&text, &pool).read_all_ordered().unwrap()
    };
    let single = run(1);
    assert_eq!(single.len(), 500);
    assert_eq!(run(2), single);
    assert_eq!(run(8), single);
}

#[test]
fn test_end_to_end_three_reads() {
    let pool = WorkerPool::new(4).unwrap();
    let records = fastq_pipeline(THREE_READS, &pool).read_all().unwrap();

    assert_eq!(records.len(), 3);
    for (id, sequence) in [("r1", "ACGT"), ("r2", "GG"), ("r3", "A")] {
        let record = records.get(id).unwrap();
        assert_eq!(record.sequence_str(), sequence);
        assert_eq!(record.quality.as_ref().map(Vec::len), Some(sequence.len()));
    }
}

#[test]
fn test_end_to_end_corrupted_separator() {
    // The '+' of r2 is replaced by 'x'; that separator is the 7th line of the input.
    let corrupted = THREE_READS.replacen("GG\n+\n", "GG\nx\n", 1);
    let pool = WorkerPool::new(4).unwrap();
    let partial = fastq_pipeline(&corrupted, &pool).read_all().unwrap_err();

    assert!(matches!(partial.error, SeqflowError::MalformedInput { .. }), "{}", partial.error);
    assert_eq!(partial.error.line(), Some(7));
    assert_eq!(partial.error_count, 1);
    assert_eq!(partial.records.len(), 1);
    assert_eq!(partial.records.get("r1").map(SeqRecord::sequence_str), Some("ACGT"));
}

#[test]
fn test_missing_quality_line_stops_at_line_37() {
    // A leading blank line puts the records at lines 2, 6, 10, ...; read8 starts at
    // line 34 and its quality line (37) is read9's header instead.
    let mut text = String::from("\n");
    for i in 0..8 {
        text.push_str(&format!("@read{i}\nACGTACGT\n+\nIIIIIIII\n"));
    }
    text.push_str("@read8\nACGTACGT\n+\n@read9\nACGTACGT\n+\nIIIIIIII\n");

    let pool = WorkerPool::new(4).unwrap();
    let mut pipeline = fastq_pipeline(&text, &pool);

    for i in 0..8 {
        let record = pipeline.read().unwrap().unwrap();
        assert_eq!(record.id, format!("read{i}"));
    }
    let err = pipeline.read().unwrap_err();
    assert_eq!(err.line(), Some(37));
    assert!(err.to_string().contains("missing quality line"), "{err}");
    assert!(pipeline.read().unwrap().is_none());
    assert!(!pipeline.has_next());
    assert_eq!(pipeline.state(), PipelineState::Failed);
}

#[test]
fn test_two_instances_over_one_file_agree() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "reads.fq", &fastq_text(1_000));
    let pool = WorkerPool::new(4).unwrap();

    let read = || {
        let lexer = FastqLexer::new(open_input(&path).unwrap(), path.display().to_string());
        RecordPipeline::flat(lexer, fastq_transform, &pool, PipelineConfig::new("reads"))
            .unwrap()
            .read_all()
            .unwrap()
    };
    let first: BTreeMap<String, SeqRecord> = read().into_iter().collect();
    let second: BTreeMap<String, SeqRecord> = read().into_iter().collect();
    assert_eq!(first.len(), 1_000);
    assert_eq!(first, second);
}

#[test]
fn test_gzip_input() {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reads.fq.gz");
    let mut encoder = GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::default());
    encoder.write_all(THREE_READS.as_bytes()).unwrap();
    encoder.finish().unwrap();

    let pool = WorkerPool::new(2).unwrap();
    let lexer = FastqLexer::new(open_input(&path).unwrap(), "reads.fq.gz");
    let records = RecordPipeline::flat(lexer, fastq_transform, &pool, PipelineConfig::new("gz"))
        .unwrap()
        .read_all_ordered()
        .unwrap();
    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["r1", "r2", "r3"]);
}

#[test]
fn test_invalid_read_is_isolated() {
    let text = "@r1\nACGT\n+\nFFFF\n@r2\nGG\n+\nF\n@r3\nA\n+\nF\n";
    let pool = WorkerPool::new(2).unwrap();
    let results: Vec<_> = fastq_pipeline(text, &pool).collect();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().id, "r1");
    match &results[1] {
        Err(SeqflowError::Transform { key, ordinal, .. }) => {
            assert_eq!(key, "r2");
            assert_eq!(*ordinal, 1);
        }
        other => panic!("expected a transform error, got {other:?}"),
    }
    assert_eq!(results[2].as_ref().unwrap().id, "r3");
}

#[test]
fn test_protein_fasta() {
    let text = ">sp|P1 first\nMKV\nLA*\n;comment\n>sp|P2\nmeepqsd\n";
    let pool = WorkerPool::new(2).unwrap();
    let lexer = FastaLexer::new(reader(text), "proteins.fa");
    let records = RecordPipeline::flat(
        lexer,
        fasta_transform(SeqType::Protein),
        &pool,
        PipelineConfig::new("proteins"),
    )
    .unwrap()
    .read_all_ordered()
    .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "sp|P1");
    assert_eq!(records[0].description.as_deref(), Some("first"));
    assert_eq!(records[0].sequence_str(), "MKVLA*");
    assert_eq!(records[1].sequence_str(), "MEEPQSD");
    assert_eq!(records[1].seq_type, SeqType::Protein);
}
