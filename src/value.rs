use crate::error::Result;
use crate::matrix::Matrix;
use crate::mstruct::Struct;
use crate::sink::Sink;

/// Any value that can be stored in a MAT-file or inside a struct.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Matrix(Matrix),
    Struct(Struct),
}

impl Value {
    pub fn name(&self) -> &str {
        match self {
            Value::Matrix(m) => m.name(),
            Value::Struct(s) => s.name(),
        }
    }

    /// Bytes [`write`](Self::write) emits after the outer 8-byte element tag.
    pub fn size(&self, include_name: bool) -> u64 {
        match self {
            Value::Matrix(m) => m.size(include_name),
            Value::Struct(s) => s.size(include_name),
        }
    }

    pub fn write<S: Sink + ?Sized>(&self, sink: &mut S, include_name: bool) -> Result<()> {
        match self {
            Value::Matrix(m) => m.write(sink, include_name),
            Value::Struct(s) => s.write(sink, include_name),
        }
    }

    pub fn as_matrix(&self) -> Option<&Matrix> {
        match self {
            Value::Matrix(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&Struct> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }
}

impl std::convert::From<Matrix> for Value {
    fn from(m: Matrix) -> Self {
        Value::Matrix(m)
    }
}
