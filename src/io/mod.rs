//! Byte-stream acquisition for ingest inputs.
//!
//! The engine itself (see [`crate::ingest`]) only ever consumes `impl Read`;
//! this module is the one place that knows about files and gzip, treating
//! decompression as an external collaborator the rest of the crate doesn't
//! need to know about.

use crate::utils::whichever::define_whichever;
use flate2::read::MultiGzDecoder;
use std::{
    fs::File,
    io::{BufReader, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

define_whichever! {
    #[doc = "A reader over either a plain file or a gzip-compressed one, chosen by file extension."]
    pub enum InputStream {
        #[doc = "An uncompressed, buffered file."]
        Plain(BufReader<File>),
        #[doc = "A gzip-compressed file, decoded lazily."]
        Gzipped(MultiGzDecoder<BufReader<File>>),
    }

    impl Read for InputStream {}
}

/// A byte source plus the path it was opened from, so [`restart`](Self::restart)
/// can reopen a gzip stream from scratch rather than seek through it.
pub struct InputSource {
    path:   PathBuf,
    stream: InputStream,
}

impl InputSource {
    /// Opens `path`, choosing the gzip-decoding variant when the extension is
    /// `gz`.
    ///
    /// ## Errors
    ///
    /// Propagates any IO error from opening the file.
    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let stream = InputStream::open(&path)?;
        Ok(Self { path: path.as_ref().to_path_buf(), stream })
    }
}

impl Read for InputSource {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Seek for InputSource {
    /// Only rewinding to the very start of the stream is supported: a
    /// gzip-compressed source can't be seeked mid-stream, so `restart`
    /// reopens the underlying file instead of asking the decoder to skip
    /// backward.
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        match pos {
            SeekFrom::Start(0) => {
                self.stream = InputStream::open(&self.path)?;
                Ok(0)
            }
            _ => Err(std::io::Error::other("InputSource only supports seeking to the start of the stream")),
        }
    }
}

impl InputStream {
    /// Opens `path`, choosing the gzip-decoding variant when the extension is
    /// `gz`.
    ///
    /// ## Errors
    ///
    /// Propagates any IO error from opening the file.
    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = File::open(&path)?;
        let buffered = BufReader::new(file);

        if path.as_ref().extension().is_some_and(|ext| ext == "gz") {
            Ok(InputStream::Gzipped(MultiGzDecoder::new(buffered)))
        } else {
            Ok(InputStream::Plain(buffered))
        }
    }
}
