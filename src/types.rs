//! Type codes and array classes used in level-5 MAT-files.

use std::convert::TryFrom;

/// Data element type codes (the `mi*` values). The code leads every tag written to a file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    Unknown,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Single,
    Double,
    Int64,
    UInt64,
    Matrix,
    Compressed,
    Utf8,
    Utf16,
    Utf32,
}

impl DataType {
    /// Width of one element of this type in bytes. Zero for the types that don't describe
    /// fixed-width elements.
    pub const fn width(self) -> usize {
        use self::DataType::*;
        match self {
            Int8 | UInt8 | Utf8 => 1,
            Int16 | UInt16 | Utf16 => 2,
            Int32 | UInt32 | Utf32 | Single => 4,
            Int64 | UInt64 | Double => 8,
            Unknown | Matrix | Compressed => 0,
        }
    }

    /// Count the logical elements in a raw payload of this type. UTF-8 counts code points, so a
    /// string's dimensions follow its characters rather than its bytes. Returns `None` if the
    /// payload can't be split into whole elements.
    pub fn element_count(self, payload: &[u8]) -> Option<usize> {
        match self {
            DataType::Utf8 => Some(payload.iter().filter(|&&b| (b & 0xC0) != 0x80).count()),
            _ => {
                let width = self.width();
                if width == 0 || payload.len() % width != 0 {
                    None
                } else {
                    Some(payload.len() / width)
                }
            }
        }
    }
}

impl From<DataType> for u32 {
    fn from(val: DataType) -> u32 {
        use self::DataType::*;
        match val {
            Unknown => 0,
            Int8 => 1,
            UInt8 => 2,
            Int16 => 3,
            UInt16 => 4,
            Int32 => 5,
            UInt32 => 6,
            Single => 7,
            Double => 9,
            Int64 => 12,
            UInt64 => 13,
            Matrix => 14,
            Compressed => 15,
            Utf8 => 16,
            Utf16 => 17,
            Utf32 => 18,
        }
    }
}

impl TryFrom<u32> for DataType {
    type Error = u32;
    fn try_from(val: u32) -> Result<DataType, u32> {
        use self::DataType::*;
        match val {
            0 => Ok(Unknown),
            1 => Ok(Int8),
            2 => Ok(UInt8),
            3 => Ok(Int16),
            4 => Ok(UInt16),
            5 => Ok(Int32),
            6 => Ok(UInt32),
            7 => Ok(Single),
            9 => Ok(Double),
            12 => Ok(Int64),
            13 => Ok(UInt64),
            14 => Ok(Matrix),
            15 => Ok(Compressed),
            16 => Ok(Utf8),
            17 => Ok(Utf16),
            18 => Ok(Utf32),
            _ => Err(val),
        }
    }
}

/// Array classes (the `mx*` values), stored in the low byte of an array's flags word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArrayClass {
    Unknown,
    Cell,
    Struct,
    Object,
    Char,
    Sparse,
    Double,
    Single,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
}

impl From<ArrayClass> for u8 {
    fn from(val: ArrayClass) -> u8 {
        use self::ArrayClass::*;
        match val {
            Unknown => 0,
            Cell => 1,
            Struct => 2,
            Object => 3,
            Char => 4,
            Sparse => 5,
            Double => 6,
            Single => 7,
            Int8 => 8,
            UInt8 => 9,
            Int16 => 10,
            UInt16 => 11,
            Int32 => 12,
            UInt32 => 13,
            Int64 => 14,
            UInt64 => 15,
        }
    }
}

impl TryFrom<u8> for ArrayClass {
    type Error = u8;
    fn try_from(val: u8) -> Result<ArrayClass, u8> {
        use self::ArrayClass::*;
        match val {
            0 => Ok(Unknown),
            1 => Ok(Cell),
            2 => Ok(Struct),
            3 => Ok(Object),
            4 => Ok(Char),
            5 => Ok(Sparse),
            6 => Ok(Double),
            7 => Ok(Single),
            8 => Ok(Int8),
            9 => Ok(UInt8),
            10 => Ok(Int16),
            11 => Ok(UInt16),
            12 => Ok(Int32),
            13 => Ok(UInt32),
            14 => Ok(Int64),
            15 => Ok(UInt64),
            _ => Err(val),
        }
    }
}

/// The flag bits of an array's flags word. Neither is ever set by this crate's constructors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArrayFlags {
    pub logical: bool,
    pub complex: bool,
}

impl ArrayFlags {
    /// Pack the flags and class into the first word of the array flags sub-element.
    pub fn word(self, class: ArrayClass) -> u32 {
        let bits = (self.logical as u32) * 0x02 + (self.complex as u32) * 0x08;
        (bits << 8) | u8::from(class) as u32
    }
}

/// A primitive type that can be stored in a numeric matrix.
///
/// The mapping from Rust type to data type and array class is fixed at compile time.
pub trait MatElement: Copy {
    const DATA_TYPE: DataType;
    const CLASS: ArrayClass;

    /// Append the little-endian encoding of `values` to `buf`.
    fn extend_le(values: &[Self], buf: &mut Vec<u8>);
}

macro_rules! mat_element {
    ($t:ty, $dt:ident, $class:ident) => {
        impl MatElement for $t {
            const DATA_TYPE: DataType = DataType::$dt;
            const CLASS: ArrayClass = ArrayClass::$class;

            fn extend_le(values: &[Self], buf: &mut Vec<u8>) {
                buf.reserve(values.len() * std::mem::size_of::<$t>());
                for v in values {
                    buf.extend_from_slice(&v.to_le_bytes());
                }
            }
        }
    };
}

mat_element!(i8, Int8, Int8);
mat_element!(u8, UInt8, UInt8);
mat_element!(i16, Int16, Int16);
mat_element!(u16, UInt16, UInt16);
mat_element!(i32, Int32, Int32);
mat_element!(u32, UInt32, UInt32);
mat_element!(i64, Int64, Int64);
mat_element!(u64, UInt64, UInt64);
mat_element!(f32, Single, Single);
mat_element!(f64, Double, Double);
