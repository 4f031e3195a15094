//! MATLAB structs: named, ordered collections of values.
//!
//! A struct is written as a `1×1` array of class `mxSTRUCT_CLASS`, followed by a table of field
//! names and then each field's value with its name omitted. Every field name occupies the same
//! fixed width in the table: one more than the longest name, capped at 63 bytes. Longer names are
//! cut to fit, so two long names sharing a prefix can collide. Nothing checks for this.

use crate::container::Container;
use crate::error::Result;
use crate::sink::Sink;
use crate::tag::{len_u32, name_len, pad8, write_name};
use crate::types::{ArrayClass, ArrayFlags, DataType};
use crate::value::Value;

/// Largest allowed field-name table width, including the terminating zero.
pub const MAX_FIELD_WIDTH: usize = 63;

/// Flags, dims, field-name length, and the field-name table tag. Everything but the name and
/// variable-length parts.
const STRUCT_HEADER_LEN: u64 = 48;

#[derive(Clone, Debug, PartialEq)]
pub struct Struct {
    name: String,
    children: Vec<Value>,
}

impl Struct {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The fields, in the order they were added.
    pub fn children(&self) -> &[Value] {
        &self.children
    }

    /// Width of each entry in the field-name table.
    pub fn field_width(&self) -> usize {
        let longest = self
            .children
            .iter()
            .map(|c| c.name().len())
            .max()
            .unwrap_or(0);
        (longest + 1).min(MAX_FIELD_WIDTH)
    }

    fn table_len(&self) -> u64 {
        (self.field_width() * self.children.len()) as u64
    }

    /// Bytes [`write`](Self::write) emits after the outer 8-byte element tag.
    pub fn size(&self, include_name: bool) -> u64 {
        STRUCT_HEADER_LEN
            + name_len(&self.name, include_name)
            + pad8(self.table_len())
            + self
                .children
                .iter()
                .map(|c| c.size(false) + 8)
                .sum::<u64>()
    }

    /// Write the complete struct element, including its outer tag.
    pub fn write<S: Sink + ?Sized>(&self, sink: &mut S, include_name: bool) -> Result<()> {
        sink.write_u32(u32::from(DataType::Matrix))?;
        sink.write_u32(len_u32(self.size(include_name))?)?;

        sink.write_u32(u32::from(DataType::UInt32))?;
        sink.write_u32(8)?;
        sink.write_u32(ArrayFlags::default().word(ArrayClass::Struct))?;
        sink.write_u32(0)?;

        sink.write_u32(u32::from(DataType::Int32))?;
        sink.write_u32(8)?;
        sink.write_u32(1)?;
        sink.write_u32(1)?;

        write_name(sink, &self.name, include_name)?;
        self.write_field_names(sink)?;

        for child in self.children.iter() {
            child.write(sink, false)?;
        }
        Ok(())
    }

    fn write_field_names<S: Sink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        let width = self.field_width();

        // Field name length, always a short-form element
        sink.write_u16(u32::from(DataType::Int32) as u16)?;
        sink.write_u16(4)?;
        sink.write_i32(width as i32)?;

        let table_len = self.table_len();
        sink.write_u32(u32::from(DataType::Int8))?;
        sink.write_u32(len_u32(table_len)?)?;
        for child in self.children.iter() {
            let name = child.name().as_bytes();
            let name = &name[..name.len().min(width - 1)];
            sink.write(name)?;
            sink.write_zeros(width - name.len())?;
        }
        sink.write_zeros((pad8(table_len) - table_len) as usize)
    }
}

impl Container for Struct {
    fn push(&mut self, value: Value) -> Result<()> {
        self.children.push(value);
        Ok(())
    }
}

impl std::convert::From<Struct> for Value {
    fn from(s: Struct) -> Self {
        Value::Struct(s)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::matrix::Matrix;

    fn serialize(s: &Struct, include_name: bool) -> Vec<u8> {
        let mut enc = Vec::new();
        s.write(&mut enc, include_name).unwrap();
        enc
    }

    fn sample() -> Struct {
        let mut s = Struct::new("settings");
        s.add_slice("rate", &[44100.0f64], &[]).unwrap();
        s.add_text("label", "left channel").unwrap();
        s.add_slice("taps", &[1i16, -2, 3, -4, 5], &[5, 1]).unwrap();
        s
    }

    #[test]
    fn width() {
        let s = sample();
        assert_eq!(s.field_width(), "label".len() + 1);
        assert_eq!(Struct::new("empty").field_width(), 1);

        let mut s = Struct::new("long");
        s.add_slice(&"f".repeat(70), &[1u8], &[]).unwrap();
        s.add_slice("g", &[2u8], &[]).unwrap();
        assert_eq!(s.field_width(), MAX_FIELD_WIDTH);
    }

    #[test]
    fn size_matches_output() {
        let s = sample();
        for include_name in [true, false] {
            let enc = serialize(&s, include_name);
            assert_eq!(s.size(include_name) + 8, enc.len() as u64);
            assert_eq!(enc.len() % 8, 0);
        }

        let empty = Struct::new("nothing");
        let enc = serialize(&empty, true);
        assert_eq!(empty.size(true) + 8, enc.len() as u64);
        assert_eq!(empty.size(false), 56);
    }

    #[test]
    fn nested() {
        let mut inner = sample();
        inner.add(Struct::new("leaf")).unwrap();
        let mut outer = Struct::new("outer");
        outer.add_text("a", "x").unwrap();
        outer.add(inner).unwrap();
        outer.add(Matrix::new("c", &[0u32; 3], &[]).unwrap()).unwrap();

        let enc = serialize(&outer, true);
        assert_eq!(outer.size(true) + 8, enc.len() as u64);
    }

    #[test]
    fn field_table() {
        let s = sample();
        let enc = serialize(&s, true);
        // outer tag, flags, dims, then the 16-byte name: 8 + 16 + 16 + 16
        let table = &enc[56..];
        assert_eq!(&table[..8], &[5, 0, 4, 0, 6, 0, 0, 0]);
        assert_eq!(&table[8..16], &[1, 0, 0, 0, 18, 0, 0, 0]);
        assert_eq!(&table[16..22], b"rate\0\0");
        assert_eq!(&table[22..28], b"label\0");
        assert_eq!(&table[28..34], b"taps\0\0");
        assert_eq!(&table[34..40], &[0u8; 6]);
        // First child starts right after the padded table, with its name omitted
        assert_eq!(&table[40..44], &[14, 0, 0, 0]);
    }

    #[test]
    fn long_field_names_are_truncated() {
        let long = "abcdefghij".repeat(7);
        let mut s = Struct::new("t");
        s.add_slice(&long, &[1.0f64], &[]).unwrap();
        let width = s.field_width();
        assert_eq!(width, 63);

        let enc = serialize(&s, true);
        assert_eq!(s.size(true) + 8, enc.len() as u64);
        // Short-form name this time: 8 + 16 + 16 + 8
        let table = &enc[48..];
        assert_eq!(&table[4..8], &(width as i32).to_le_bytes());
        let names = &table[16..16 + width];
        assert_eq!(&names[..width - 1], &long.as_bytes()[..width - 1]);
        assert_eq!(names[width - 1], 0);
    }

    #[test]
    fn duplicate_names_are_kept() {
        let mut s = Struct::new("dup");
        s.add_slice("a", &[1u8], &[]).unwrap();
        s.add_slice("a", &[2u8], &[]).unwrap();
        assert_eq!(s.children().len(), 2);
        let enc = serialize(&s, true);
        assert_eq!(s.size(true) + 8, enc.len() as u64);
    }
}
