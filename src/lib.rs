//! mat-pack writes MATLAB level-5 MAT-files, either uncompressed (v6) or with every top-level
//! variable zlib-compressed (v7).
//!
//! A file is built up in memory from two kinds of values:
//!
//! - [`Matrix`]: a named, shaped array of numbers or characters. Its shape is checked against its
//! 	data when it's built, so a bad matrix never reaches the file.
//! - [`Struct`]: a named, ordered collection of other values, nested as deeply as needed.
//!
//! Both [`MatFile`] and [`Struct`] implement [`Container`], which has the methods for adding
//! values. Nothing is written until the file is closed, at which point every value's encoded
//! size is computed up front and written into its element tag. In the compressed format, each
//! variable is deflated through fixed-size buffers straight into the file, and the compressed
//! length is patched in afterwards.
//!
//! ```
//! use mat_pack::{Container, MatFile, Struct, Version, WriteOptions};
//! use std::io::Cursor;
//!
//! # fn main() -> mat_pack::Result<()> {
//! let options = WriteOptions {
//!     version: Version::V6,
//!     ..WriteOptions::default()
//! };
//! let mut file = MatFile::new(Cursor::new(Vec::new()), options)?;
//! file.add_slice("x", &[1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0], &[2, 4])?;
//!
//! let mut run = Struct::new("run");
//! run.add_text("operator", "jdoe")?.add_scalar("trials", 12u32)?;
//! file.add(run)?;
//!
//! let bytes = file.finish()?.into_inner();
//! assert_eq!(&bytes[126..128], b"IM");
//! # Ok(())
//! # }
//! ```

mod compress;
mod container;
mod error;
mod file;
mod matrix;
mod mstruct;
mod sink;
mod tag;
mod types;
mod value;

pub mod datenum;

pub use self::compress::{Compression, DEFAULT_CHUNK_SIZE, DEFAULT_LEVEL};
pub use self::container::Container;
pub use self::error::{Error, Result};
pub use self::file::{header_text, MatFile, Version, WriteOptions, FILE_HEADER_LEN, HEADER_TEXT_LEN};
pub use self::matrix::Matrix;
pub use self::mstruct::{Struct, MAX_FIELD_WIDTH};
pub use self::sink::{ByteSink, Sink};
pub use self::tag::{name_len, pad8, payload_len, tag_len, write_name, write_tag, MAX_NAME_LEN};
pub use self::types::{ArrayClass, ArrayFlags, DataType, MatElement};
pub use self::value::Value;
