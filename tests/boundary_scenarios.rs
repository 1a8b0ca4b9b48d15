//! Integration tests for boundary scenarios, driving the public `ingest::run`
//! entry point end to end against real temp files and a [`RecordingSink`].

use fastq_ingest_core::args::IngestArgs;
use fastq_ingest_core::ingest;
use fastq_ingest_core::sink::RecordingSink;
use std::fs;
use std::path::PathBuf;

struct TempDir(PathBuf);

impl TempDir {
    fn new(label: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("fastq-ingest-core-test-{label}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.0.join(name);
        fs::write(&path, content).unwrap();
        path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

fn base_args(inputs: Vec<PathBuf>) -> IngestArgs {
    IngestArgs {
        inputs,
        offset: None,
        read_lens: Vec::new(),
        read_types: Vec::new(),
        read_labels: Vec::new(),
        spot_group: None,
        orphan_reads: false,
        log_odds: false,
        ignore_names: false,
        discard_names: false,
        read1_pair_files: Vec::new(),
        read2_pair_files: Vec::new(),
        platform: None,
        mixed_deflines: false,
        schema: None,
        max_error_count: 500_000,
        xml_log: None,
        log_id: "test".to_owned(),
    }
}

#[test]
fn s1_single_fragment_record() {
    let dir = TempDir::new("s1");
    let path = dir.write("a.fastq", "@r1\nACGT\n+\n!!!!\n");
    let args = base_args(vec![path]);

    let mut sink = RecordingSink::new();
    let report = ingest::run(&args, &mut sink).unwrap();

    assert_eq!(report.spots_written, 1);
    assert_eq!(sink.rows.len(), 1);
    assert_eq!(sink.rows[0].sequence, "ACGT");
    assert_eq!(sink.rows[0].name, "r1");
    assert_eq!(sink.rows[0].read_lens, vec![4]);
}

#[test]
fn s2_illumina_mates_pair_across_files() {
    let dir = TempDir::new("s2");
    let a = dir.write("a.fastq", "@EAS139:136:FC706VJ:2:2104:15343:197393 1:N:18:ATCACG\nACGT\n+\nIIII\n");
    let b = dir.write("b.fastq", "@EAS139:136:FC706VJ:2:2104:15343:197393 2:N:18:ATCACG\nTTTT\n+\n!!!!\n");

    let mut args = base_args(Vec::new());
    args.read1_pair_files = vec![a];
    args.read2_pair_files = vec![b];

    let mut sink = RecordingSink::new();
    let report = ingest::run(&args, &mut sink).unwrap();

    assert_eq!(report.spots_written, 1);
    assert_eq!(sink.rows[0].sequence, "ACGTTTTT");
    assert_eq!(sink.rows[0].read_lens, vec![4, 4]);
}

#[test]
fn s3_eight_line_interleave_pairs_and_drains_an_orphan() {
    let dir = TempDir::new("s3");
    let path = dir.write("a.fastq", "@r1\nACGT\n+\nIIII\n@r1\nTTTT\n+\nJJJJ\n@r2\nGGGG\n+\nKKKK\n");
    let args = base_args(vec![path]);

    let mut sink = RecordingSink::new();
    let report = ingest::run(&args, &mut sink).unwrap();

    assert_eq!(report.spots_written, 2);
    assert_eq!(sink.rows[0].sequence, "ACGTTTTT");
    assert_eq!(sink.rows[0].read_lens, vec![4, 4]);
    assert_eq!(sink.rows[1].sequence, "GGGG");
    assert_eq!(sink.rows[1].read_lens, vec![4]);
}

#[test]
fn s5_nanopore_2d_only_emits_a_consensus_read_with_no_sequence_pair() {
    let dir = TempDir::new("s5");
    let path = dir.write("a.fastq", "@channel_1_read_7_twodirections\nACGTACGT\n+\nIIIIIIII\n");
    let args = base_args(vec![path]);

    let mut sink = RecordingSink::new();
    let report = ingest::run(&args, &mut sink).unwrap();

    assert_eq!(report.spots_written, 1);
    assert_eq!(sink.rows[0].sequence, "ACGTACGT");
    assert_eq!(sink.rows[0].read_lens, vec![8]);
    assert_eq!(sink.rows[0].read_types, vec![0]);
}

#[test]
fn lowercase_soft_clip_margins_are_uppercased_and_recorded() {
    let dir = TempDir::new("soft-clip");
    let path = dir.write("a.fastq", "@r1\nacgtACGTacgt\n+\nIIIIIIIIIIII\n");
    let args = base_args(vec![path]);

    let mut sink = RecordingSink::new();
    ingest::run(&args, &mut sink).unwrap();

    assert_eq!(sink.rows[0].sequence, "ACGTACGTACGT");
    assert_eq!(sink.rows[0].clip_left, vec![4]);
    assert_eq!(sink.rows[0].clip_right, vec![4]);
}

#[test]
fn s4_split_seq_and_qual_files() {
    let dir = TempDir::new("s4");
    let seq = dir.write("a.fasta", ">r1\nACGT\n");
    dir.write("a.qual", ">r1\n30 30 30 30\n");
    let args = base_args(vec![seq]);

    let mut sink = RecordingSink::new();
    let report = ingest::run(&args, &mut sink).unwrap();

    assert_eq!(report.spots_written, 1);
    assert_eq!(sink.rows[0].sequence, "ACGT");
    assert_eq!(sink.rows[0].quality, vec![30, 30, 30, 30]);
}

#[test]
fn s6_corrupt_line_resyncs_and_continues() {
    let dir = TempDir::new("s6");
    let path = dir.write("a.fastq", "@r1\nACGT\n+\nIIII\ngarbage not a record\n@r2\nTTTT\n+\n!!!!\n");
    let args = base_args(vec![path]);

    let mut sink = RecordingSink::new();
    let report = ingest::run(&args, &mut sink).unwrap();

    assert_eq!(report.spots_written, 2);
    assert_eq!(sink.rows[0].name, "r1");
    assert_eq!(sink.rows[1].name, "r2");
}

#[test]
fn rejects_empty_input_set_before_touching_disk() {
    let args = base_args(Vec::new());
    let mut sink = RecordingSink::new();
    assert!(ingest::run(&args, &mut sink).is_err());
}

#[test]
fn discard_names_suppresses_spot_names() {
    let dir = TempDir::new("discard-names");
    let path = dir.write("a.fastq", "@r1\nACGT\n+\n!!!!\n");
    let mut args = base_args(vec![path]);
    args.discard_names = true;

    let mut sink = RecordingSink::new();
    ingest::run(&args, &mut sink).unwrap();

    assert_eq!(sink.rows[0].name, "");
}
