//! Numeric and character matrices: the leaf values of a MAT-file.

use crate::error::{Error, Result};
use crate::sink::Sink;
use crate::tag::{len_u32, name_len, pad8, payload_len, write_name, write_tag};
use crate::types::{ArrayClass, ArrayFlags, DataType, MatElement};

/// A named, typed, shaped array of raw little-endian bytes.
///
/// The payload is checked against the dimensions when the matrix is built, so a `Matrix` that
/// exists can always be written.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    name: String,
    data_type: DataType,
    class: ArrayClass,
    flags: ArrayFlags,
    dims: Vec<u32>,
    data: Box<[u8]>,
}

impl Matrix {
    /// Build a numeric matrix from a slice of values. An empty `dims` makes a `1×N` row vector.
    /// Data is in column-major order, as MATLAB expects.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::ShapeMismatch`] if the product of `dims` isn't `data.len()`.
    pub fn new<T: MatElement>(name: &str, data: &[T], dims: &[usize]) -> Result<Self> {
        let mut buf = Vec::new();
        T::extend_le(data, &mut buf);
        Self::from_bytes(name, T::DATA_TYPE, T::CLASS, buf, dims)
    }

    /// Build a matrix from an already-encoded little-endian payload.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::ShapeMismatch`] if the payload can't be split into whole elements of
    /// `data_type` or if their count doesn't match `dims`, and with [`Error::LengthTooLong`] if
    /// the payload or a dimension doesn't fit the format's 32-bit fields.
    pub fn from_bytes(
        name: &str,
        data_type: DataType,
        class: ArrayClass,
        data: impl Into<Box<[u8]>>,
        dims: &[usize],
    ) -> Result<Self> {
        let data = data.into();
        let elements = data_type.element_count(&data).ok_or_else(|| Error::ShapeMismatch {
            dims: dims.to_vec(),
            elements: data.len(),
        })?;
        let dims = if dims.is_empty() {
            vec![1, elements]
        } else {
            dims.to_vec()
        };
        let product = dims
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d));
        if product != Some(elements) {
            return Err(Error::ShapeMismatch { dims, elements });
        }
        len_u32(data.len() as u64)?;
        let dims = dims
            .iter()
            .map(|&d| len_u32(d as u64))
            .collect::<Result<Vec<u32>>>()?;
        Ok(Self {
            name: name.to_string(),
            data_type,
            class,
            flags: ArrayFlags::default(),
            dims,
            data,
        })
    }

    /// Build a character row vector. Strings are always stored as UTF-8; the column count is the
    /// number of characters.
    pub fn from_text(name: &str, text: &str) -> Result<Self> {
        Self::from_bytes(
            name,
            DataType::Utf8,
            ArrayClass::Char,
            text.as_bytes().to_vec(),
            &[],
        )
    }

    /// Build a character row vector from UTF-16 code units.
    pub fn from_utf16(name: &str, text: &[u16]) -> Result<Self> {
        let mut buf = Vec::with_capacity(text.len() * 2);
        u16::extend_le(text, &mut buf);
        Self::from_bytes(name, DataType::Utf16, ArrayClass::Char, buf, &[])
    }

    /// Build a character row vector from UTF-32 code points.
    pub fn from_utf32(name: &str, text: &[char]) -> Result<Self> {
        let points: Vec<u32> = text.iter().map(|&c| c as u32).collect();
        let mut buf = Vec::with_capacity(points.len() * 4);
        u32::extend_le(&points, &mut buf);
        Self::from_bytes(name, DataType::Utf32, ArrayClass::Char, buf, &[])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn class(&self) -> ArrayClass {
        self.class
    }

    pub fn dims(&self) -> &[u32] {
        &self.dims
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Bytes [`write`](Self::write) emits after the outer 8-byte element tag.
    pub fn size(&self, include_name: bool) -> u64 {
        let dims_len = self.dims.len() as u64 * 4;
        16 // array flags
            + 8 + pad8(dims_len)
            + name_len(&self.name, include_name)
            + 8 + payload_len(self.data.len() as u64)
    }

    /// Write the complete matrix element, including its outer tag.
    pub fn write<S: Sink + ?Sized>(&self, sink: &mut S, include_name: bool) -> Result<()> {
        sink.write_u32(u32::from(DataType::Matrix))?;
        sink.write_u32(len_u32(self.size(include_name))?)?;

        // Array flags
        sink.write_u32(u32::from(DataType::UInt32))?;
        sink.write_u32(8)?;
        sink.write_u32(self.flags.word(self.class))?;
        sink.write_u32(0)?;

        // Dimensions. Always written long-form, even for a single dimension.
        let dims_len = self.dims.len() * 4;
        sink.write_u32(u32::from(DataType::Int32))?;
        sink.write_u32(dims_len as u32)?;
        for &d in self.dims.iter() {
            sink.write_u32(d)?;
        }
        sink.write_zeros((pad8(dims_len as u64) as usize) - dims_len)?;

        write_name(sink, &self.name, include_name)?;
        write_tag(sink, self.data_type, &self.data)
    }
}
