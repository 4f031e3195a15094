//! Tag encoding for data elements.
//!
//! Every variable-length field in a MAT-file is preceded by a tag holding its type code and byte
//! length. Payloads of 4 bytes or fewer use the short form, packing a 2-byte type, a 2-byte length,
//! and the payload itself into 8 bytes. Longer payloads use the long form: a 4-byte type, a 4-byte
//! length, then the payload padded with zeros to a multiple of 8.

use crate::error::{Error, Result};
use crate::sink::Sink;
use crate::types::DataType;

/// Longest name, in bytes, that the format stores.
pub const MAX_NAME_LEN: usize = 63;

/// Round `n` up to the next multiple of 8.
pub const fn pad8(n: u64) -> u64 {
    (n + 7) & !7
}

/// Bytes taken by a tag and its padded payload of `n` bytes.
pub const fn tag_len(n: u64) -> u64 {
    if n <= 4 {
        8
    } else {
        8 + pad8(n)
    }
}

/// Bytes beyond the 8-byte tag itself that a payload of `n` bytes takes up.
pub const fn payload_len(n: u64) -> u64 {
    tag_len(n) - 8
}

/// Convert a byte count into a 32-bit length field.
pub(crate) fn len_u32(n: u64) -> Result<u32> {
    u32::try_from(n).map_err(|_| Error::LengthTooLong {
        max: u32::MAX as u64,
        actual: n,
    })
}

/// Write a tag and payload, choosing the short or long form.
pub fn write_tag<S: Sink + ?Sized>(sink: &mut S, data_type: DataType, payload: &[u8]) -> Result<()> {
    let n = payload.len();
    if n <= 4 {
        sink.write_u16(u32::from(data_type) as u16)?;
        sink.write_u16(n as u16)?;
        sink.write(payload)?;
        sink.write_zeros(4 - n)
    } else {
        sink.write_u32(u32::from(data_type))?;
        sink.write_u32(len_u32(n as u64)?)?;
        sink.write(payload)?;
        sink.write_zeros((pad8(n as u64) - n as u64) as usize)
    }
}

/// The part of a name that actually gets stored.
pub(crate) fn stored_name(name: &str) -> &[u8] {
    let bytes = name.as_bytes();
    &bytes[..bytes.len().min(MAX_NAME_LEN)]
}

/// Bytes the array-name sub-element takes. Omitted names are an empty long-form tag.
pub fn name_len(name: &str, include_name: bool) -> u64 {
    if include_name {
        tag_len(stored_name(name).len() as u64)
    } else {
        8
    }
}

/// Write the array-name sub-element.
pub fn write_name<S: Sink + ?Sized>(sink: &mut S, name: &str, include_name: bool) -> Result<()> {
    if include_name {
        write_tag(sink, DataType::Int8, stored_name(name))
    } else {
        sink.write_u32(u32::from(DataType::Int8))?;
        sink.write_u32(0)
    }
}
