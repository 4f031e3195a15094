use crate::error::{Error, Result};
use flate2::{Compress, FlushCompress, Status};
use log::trace;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Default size of the input and output buffers used by the compression filter: 1 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 1usize << 20;
/// Default zlib compression level.
pub const DEFAULT_LEVEL: u32 = 8;

/// Compression settings for the zlib-compressed (v7) format.
///
/// `chunk_size` bounds the memory the filter uses: it holds one input buffer and one output
/// buffer of this size, no matter how large the compressed value is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Compression {
    /// zlib compression level, 0-9.
    pub level: u32,
    /// Size of the filter's input and output buffers, in bytes.
    pub chunk_size: usize,
}

impl Compression {
    /// Create new compression settings with the given level and the default chunk size.
    pub fn new(level: u32) -> Self {
        Self {
            level,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Override the buffer size.
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }
}

impl std::default::Default for Compression {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL)
    }
}

/// Streaming zlib filter. Bytes accumulate in a fixed buffer; each time it fills, one or more
/// deflate steps run and their output goes straight to the sink.
///
/// The stream is only valid once [`finish`](Self::finish) has run.
pub(crate) struct DeflateFilter {
    stream: Compress,
    input: Vec<u8>,
    output: Vec<u8>,
    chunk_size: usize,
    finished: bool,
}

impl DeflateFilter {
    pub fn new(settings: &Compression) -> Result<Self> {
        if settings.level > 9 {
            return Err(Error::CodecInit(format!(
                "compression level must be 0-9, got {}",
                settings.level
            )));
        }
        if settings.chunk_size == 0 {
            return Err(Error::CodecInit("chunk size must be nonzero".into()));
        }
        Ok(Self {
            stream: Compress::new(flate2::Compression::new(settings.level), true),
            input: Vec::with_capacity(settings.chunk_size),
            output: vec![0u8; settings.chunk_size],
            chunk_size: settings.chunk_size,
            finished: false,
        })
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Total bytes accepted by the filter so far.
    pub fn total_in(&self) -> u64 {
        self.stream.total_in() + self.input.len() as u64
    }

    /// Total compressed bytes written to the sink so far.
    pub fn total_out(&self) -> u64 {
        self.stream.total_out()
    }

    pub fn write<W: Write + ?Sized>(&mut self, mut data: &[u8], sink: &mut W) -> Result<()> {
        if self.finished {
            return Err(Error::CodecInit(
                "cannot write to a finished compression stream".into(),
            ));
        }
        while !data.is_empty() {
            let room = self.chunk_size - self.input.len();
            let (now, rest) = data.split_at(room.min(data.len()));
            self.input.extend_from_slice(now);
            data = rest;
            if self.input.len() == self.chunk_size {
                self.deflate(sink, FlushCompress::None)?;
            }
        }
        Ok(())
    }

    /// Compress whatever is buffered and terminate the zlib stream. Calling this again is a
    /// no-op.
    pub fn finish<W: Write + ?Sized>(&mut self, sink: &mut W) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.deflate(sink, FlushCompress::Finish)?;
        self.finished = true;
        Ok(())
    }

    fn deflate<W: Write + ?Sized>(&mut self, sink: &mut W, flush: FlushCompress) -> Result<()> {
        let Self {
            stream,
            input,
            output,
            ..
        } = self;
        let mut pending: &[u8] = input;
        loop {
            let before_in = stream.total_in();
            let before_out = stream.total_out();
            let status = stream
                .compress(pending, output, flush)
                .map_err(|e| Error::CodecInit(e.to_string()))?;
            let consumed = (stream.total_in() - before_in) as usize;
            let produced = (stream.total_out() - before_out) as usize;
            pending = &pending[consumed..];
            sink.write_all(&output[..produced])?;
            trace!(
                "deflate step: {} bytes in, {} bytes out, status {:?}",
                consumed,
                produced,
                status
            );

            match flush {
                FlushCompress::Finish => {
                    if status == Status::StreamEnd {
                        break;
                    }
                    if consumed == 0 && produced == 0 {
                        return Err(Error::CodecInit(
                            "deflate made no progress while finishing".into(),
                        ));
                    }
                }
                _ => {
                    if pending.is_empty() && produced < output.len() {
                        break;
                    }
                    if consumed == 0 && produced == 0 {
                        if pending.is_empty() {
                            break;
                        }
                        return Err(Error::CodecInit("deflate made no progress".into()));
                    }
                }
            }
        }
        input.clear();
        Ok(())
    }
}
