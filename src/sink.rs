//! Byte destinations for the encoder.
//!
//! Encoders write through the [`Sink`] trait, which is implemented both for plain byte vectors
//! (useful for sizing and testing) and for [`ByteSink`], the seekable file-backed destination
//! that can route its writes through a compression filter.

use crate::compress::{Compression, DeflateFilter};
use crate::error::{Error, Result};
use byteorder::{ByteOrder, LittleEndian};
use log::{trace, warn};
use std::io::{Seek, SeekFrom, Write};

/// Anything the encoder can append bytes to. All multi-byte values are little-endian.
pub trait Sink {
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    fn write_u16(&mut self, v: u16) -> Result<()> {
        let mut buf = [0u8; 2];
        LittleEndian::write_u16(&mut buf, v);
        self.write(&buf)
    }

    fn write_u32(&mut self, v: u32) -> Result<()> {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, v);
        self.write(&buf)
    }

    fn write_i32(&mut self, v: i32) -> Result<()> {
        let mut buf = [0u8; 4];
        LittleEndian::write_i32(&mut buf, v);
        self.write(&buf)
    }

    fn write_u64(&mut self, v: u64) -> Result<()> {
        let mut buf = [0u8; 8];
        LittleEndian::write_u64(&mut buf, v);
        self.write(&buf)
    }

    /// Write `n` zero bytes. Only ever used for padding, so `n` is small.
    fn write_zeros(&mut self, n: usize) -> Result<()> {
        const ZEROS: [u8; 8] = [0u8; 8];
        let mut n = n;
        while n > 0 {
            let step = n.min(ZEROS.len());
            self.write(&ZEROS[..step])?;
            n -= step;
        }
        Ok(())
    }
}

impl Sink for Vec<u8> {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// The transform currently applied to bytes on their way to the underlying writer.
enum Filter {
    Identity,
    Deflate(Box<DeflateFilter>),
}

/// A seekable byte destination. Writes pass through the active [`Filter`]: either straight to
/// the writer, or into a zlib stream.
///
/// Position queries and seeks are only allowed on the identity path, so compressed byte counts
/// are always final by the time anyone looks at them.
pub struct ByteSink<W: Write + Seek> {
    inner: Option<W>,
    filter: Filter,
}

impl<W: Write + Seek> ByteSink<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: Some(inner),
            filter: Filter::Identity,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    /// True if a compression filter is installed.
    pub fn is_filtered(&self) -> bool {
        matches!(self.filter, Filter::Deflate(_))
    }

    fn inner(&mut self, what: &'static str) -> Result<&mut W> {
        self.inner.as_mut().ok_or(Error::ResourceClosed(what))
    }

    /// Current position of the underlying writer.
    pub fn tell(&mut self) -> Result<u64> {
        if self.is_filtered() {
            return Err(Error::FilterActive("tell"));
        }
        Ok(self.inner("tell")?.stream_position()?)
    }

    /// Move the underlying writer to an absolute position.
    pub fn seek(&mut self, pos: u64) -> Result<()> {
        if self.is_filtered() {
            return Err(Error::FilterActive("seek"));
        }
        self.inner("seek")?.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    /// Start compressing all subsequent writes.
    pub fn install_deflate(&mut self, settings: &Compression) -> Result<()> {
        self.inner("compress")?;
        if self.is_filtered() {
            return Err(Error::FilterActive("install a second filter"));
        }
        self.filter = Filter::Deflate(Box::new(DeflateFilter::new(settings)?));
        Ok(())
    }

    /// Finish the active compression stream, if any, and go back to writing bytes directly.
    /// Returns the number of bytes that went into the stream.
    pub fn remove_filter(&mut self) -> Result<u64> {
        let filter = std::mem::replace(&mut self.filter, Filter::Identity);
        match filter {
            Filter::Identity => Ok(0),
            Filter::Deflate(mut deflate) => {
                let inner = self.inner("compress")?;
                deflate.finish(inner)?;
                trace!(
                    "Compression stream finished: {} bytes in, {} bytes out",
                    deflate.total_in(),
                    deflate.total_out()
                );
                Ok(deflate.total_in())
            }
        }
    }

    /// Flush buffered data to the writer. An active compression stream is finished, so no
    /// further writes are accepted until the filter is removed.
    pub fn flush(&mut self) -> Result<()> {
        let Self { inner, filter } = self;
        let inner = inner.as_mut().ok_or(Error::ResourceClosed("flush"))?;
        if let Filter::Deflate(deflate) = filter {
            deflate.finish(inner)?;
        }
        inner.flush()?;
        Ok(())
    }

    /// Finish any filter, flush, and hand back the writer. Both the filter and the writer are
    /// released even if finishing fails.
    pub fn close(&mut self) -> Result<W> {
        let finished = self.remove_filter();
        let mut inner = self.inner.take().ok_or(Error::ResourceClosed("close"))?;
        finished?;
        inner.flush()?;
        Ok(inner)
    }
}

impl<W: Write + Seek> Sink for ByteSink<W> {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let Self { inner, filter } = self;
        let inner = inner.as_mut().ok_or(Error::ResourceClosed("write to"))?;
        match filter {
            Filter::Identity => inner.write_all(bytes)?,
            Filter::Deflate(deflate) => deflate.write(bytes, inner)?,
        }
        Ok(())
    }
}

impl<W: Write + Seek> Drop for ByteSink<W> {
    fn drop(&mut self) {
        let unfinished = matches!(&self.filter, Filter::Deflate(d) if !d.is_finished());
        if unfinished && !self.is_closed() {
            if let Err(e) = self.remove_filter() {
                warn!("Failed to finish compression stream on drop: {}", e);
            }
        }
    }
}
