use clap::Parser;
use clap::error::ErrorKind;
use fastq_ingest_core::args::abort_clap;
use fastq_ingest_core::error::IngestError;
use fastq_ingest_core::sink::RecordingSink;
use fastq_ingest_core::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest(ingest_args) => {
            let mut sink = RecordingSink::new();
            match fastq_ingest_core::ingest::run(&ingest_args, &mut sink) {
                Ok(report) => {
                    eprintln!("[fastq_ingest_core] {} spots written, {} records skipped", report.spots_written, report.records_skipped);
                }
                Err(IngestError::Configuration(e)) => abort_clap(ErrorKind::ValueValidation, e, Some("ingest")),
                Err(e) => {
                    eprintln!("[fastq_ingest_core] fatal: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}
