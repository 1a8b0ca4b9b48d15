//! A FASTQ/FASTA ingestion and normalization engine: classifies sequencer
//! header lines, detects file shape, pairs mates across files, infers
//! quality encoding, and assembles column-oriented spots for an archive
//! sink.

pub mod args;
pub mod defline;
pub mod encoding;
pub mod error;
pub mod file_pairing;
pub mod ingest;
pub mod qual;
pub mod reader;
pub mod seq;
pub mod shape;
pub mod sink;
pub mod spot;
pub mod xmllog;

pub(crate) mod io;
pub(crate) mod utils;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classifies, pairs, and assembles one run of FASTQ/FASTA inputs into
    /// spots written through a column sink.
    Ingest(args::IngestArgs),
}
