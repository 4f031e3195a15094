//! The root container: a whole MAT-file.
//!
//! A [`MatFile`] collects values in memory and writes everything in one pass when it's closed.
//! The file header comes first, then each top-level value. In the v7 format each value is
//! wrapped in its own `miCOMPRESSED` element: a tag with a zero length is written, the value is
//! deflated straight into the file behind it, and then the tag's length is patched with the
//! compressed size. That back-patch is why compressed output needs a seekable writer.

use crate::compress::Compression;
use crate::container::Container;
use crate::datenum::Civil;
use crate::error::{Error, Result};
use crate::sink::{ByteSink, Sink};
use crate::tag::len_u32;
use crate::types::DataType;
use crate::value::Value;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

/// Length of the free-text part of the file header.
pub const HEADER_TEXT_LEN: usize = 116;
/// Length of the complete file header.
pub const FILE_HEADER_LEN: u64 = 128;

const HEADER_VERSION: u16 = 0x0100;
// Reads as "IM" in a little-endian file
const ENDIAN_MARKER: u16 = 0x4d49;

/// Which MAT-file format to write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Version {
    /// Level 5, uncompressed.
    V6,
    /// Level 5, every top-level variable zlib-compressed.
    #[default]
    V7,
    /// HDF5-based. Not supported.
    V73,
}

/// Everything that controls how a [`MatFile`] gets written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WriteOptions {
    pub version: Version,
    /// Comment placed after the creation date in the header text.
    pub header: String,
    /// Only used by [`Version::V7`].
    pub compression: Compression,
}

impl std::default::Default for WriteOptions {
    fn default() -> Self {
        Self {
            version: Version::default(),
            header: "Created using mat-pack".into(),
            compression: Compression::default(),
        }
    }
}

/// Build the 116-byte header text: a fixed preamble, the creation date, then the comment.
/// The result is padded with spaces or cut short to fit.
pub fn header_text(comment: &str, created: &Civil) -> [u8; HEADER_TEXT_LEN] {
    let text = format!("MATLAB 5.0 MAT-file, Created on: {} {}", created, comment);
    let mut out = [b' '; HEADER_TEXT_LEN];
    let len = text.len().min(HEADER_TEXT_LEN);
    out[..len].copy_from_slice(&text.as_bytes()[..len]);
    out
}

fn write_header<S: Sink + ?Sized>(sink: &mut S, text: &[u8; HEADER_TEXT_LEN]) -> Result<()> {
    sink.write(text)?;
    sink.write_u64(0)?; // subsystem data offset
    sink.write_u16(HEADER_VERSION)?;
    sink.write_u16(ENDIAN_MARKER)
}

/// A MAT-file being built.
///
/// Values are added through the [`Container`] methods and nothing is written until
/// [`close`](Self::close) or [`finish`](Self::finish). After that the file is inert: closing again
/// does nothing, and adding values fails with [`Error::ResourceClosed`]. Dropping a file that was
/// never closed closes it, logging any failure.
///
/// ```no_run
/// use mat_pack::{Container, MatFile, WriteOptions};
///
/// # fn main() -> mat_pack::Result<()> {
/// let mut file = MatFile::create("out.mat", WriteOptions::default())?;
/// file.add_slice("x", &[1.0f64, 2.0, 3.0, 4.0], &[2, 2])?
///     .add_text("label", "calibration run")?;
/// file.close()?;
/// # Ok(())
/// # }
/// ```
pub struct MatFile<W: Write + Seek = BufWriter<File>> {
    children: Vec<Value>,
    options: WriteOptions,
    sink: Option<ByteSink<W>>,
}

impl MatFile<BufWriter<File>> {
    /// Create (or truncate) a file at `path`.
    pub fn create<P: AsRef<Path>>(path: P, options: WriteOptions) -> Result<Self> {
        check_version(options.version)?;
        let file = File::create(path)?;
        Self::new(BufWriter::new(file), options)
    }
}

fn check_version(version: Version) -> Result<()> {
    match version {
        Version::V73 => Err(Error::Unsupported("v7.3 (HDF5) MAT-files")),
        Version::V6 | Version::V7 => Ok(()),
    }
}

impl<W: Write + Seek> MatFile<W> {
    /// Write to an arbitrary writer. Output starts at the writer's current position.
    pub fn new(writer: W, options: WriteOptions) -> Result<Self> {
        check_version(options.version)?;
        Ok(Self {
            children: Vec::new(),
            options,
            sink: Some(ByteSink::new(writer)),
        })
    }

    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// The header comment.
    pub fn header(&self) -> &str {
        &self.options.header
    }

    pub fn set_header(&mut self, header: &str) {
        self.options.header = header.to_string();
    }

    /// Top-level values, in the order they'll be written.
    pub fn children(&self) -> &[Value] {
        &self.children
    }

    pub fn is_closed(&self) -> bool {
        self.sink.is_none()
    }

    /// Write everything out and close the writer. Closing an already-closed file does nothing.
    ///
    /// The writer is released whether or not writing succeeds. On failure the output is
    /// incomplete and should be thrown away.
    pub fn close(&mut self) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }
        self.write_out().map(|_| ())
    }

    /// Like [`close`](Self::close), but hands back the writer.
    pub fn finish(mut self) -> Result<W> {
        self.write_out()
    }

    fn write_out(&mut self) -> Result<W> {
        let mut sink = self.sink.take().ok_or(Error::ResourceClosed("finish"))?;
        let text = header_text(&self.options.header, &Civil::now());
        let written = match self.options.version {
            Version::V6 => write_raw(&mut sink, &text, &self.children),
            Version::V7 => {
                write_compressed(&mut sink, &text, &self.children, &self.options.compression)
            }
            Version::V73 => Err(Error::Unsupported("v7.3 (HDF5) MAT-files")),
        };
        let closed = sink.close();
        written?;
        closed
    }
}

fn write_raw<W: Write + Seek>(
    sink: &mut ByteSink<W>,
    text: &[u8; HEADER_TEXT_LEN],
    children: &[Value],
) -> Result<()> {
    write_header(sink, text)?;
    for child in children.iter() {
        child.write(sink, true)?;
        debug!(
            "Wrote variable {:?}: {} bytes",
            child.name(),
            child.size(true) + 8
        );
    }
    Ok(())
}

fn write_compressed<W: Write + Seek>(
    sink: &mut ByteSink<W>,
    text: &[u8; HEADER_TEXT_LEN],
    children: &[Value],
    compression: &Compression,
) -> Result<()> {
    // Fail before writing anything if the lengths can't be patched later
    sink.tell().map_err(|e| match e {
        Error::Io(_) => Error::Unseekable,
        e => e,
    })?;
    write_header(sink, text)?;

    for child in children.iter() {
        sink.write_u32(u32::from(DataType::Compressed))?;
        sink.write_u32(0)?;
        let start = sink.tell()?;

        sink.install_deflate(compression)?;
        child.write(sink, true)?;
        let raw = sink.remove_filter()?;
        let end = sink.tell()?;

        sink.seek(start - 4)?;
        sink.write_u32(len_u32(end - start)?)?;
        sink.seek(end)?;
        debug!(
            "Wrote variable {:?}: {} bytes, {} compressed",
            child.name(),
            raw,
            end - start
        );
    }
    Ok(())
}

impl<W: Write + Seek> Container for MatFile<W> {
    fn push(&mut self, value: Value) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ResourceClosed("add values to"));
        }
        self.children.push(value);
        Ok(())
    }
}

impl<W: Write + Seek> Drop for MatFile<W> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close MAT-file on drop: {}", e);
        }
    }
}
