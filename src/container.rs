use crate::error::Result;
use crate::matrix::Matrix;
use crate::types::MatElement;
use crate::value::Value;

/// Something that holds an ordered list of named values: a struct, or a whole file.
///
/// Children are owned outright and written in the order they were added. Only [`push`] needs
/// implementing; the rest are shorthand for building a value and pushing it.
///
/// [`push`]: Container::push
pub trait Container {
    /// Append a value. Fails if the container no longer accepts values.
    fn push(&mut self, value: Value) -> Result<()>;

    /// Append a matrix or struct.
    fn add<V: Into<Value>>(&mut self, value: V) -> Result<&mut Self> {
        self.push(value.into())?;
        Ok(self)
    }

    /// Append a numeric matrix built from `data`. See [`Matrix::new`].
    fn add_slice<T: MatElement>(&mut self, name: &str, data: &[T], dims: &[usize]) -> Result<&mut Self> {
        let matrix = Matrix::new(name, data, dims)?;
        self.add(matrix)
    }

    /// Append a single number as a `1×1` matrix.
    fn add_scalar<T: MatElement>(&mut self, name: &str, value: T) -> Result<&mut Self> {
        self.add_slice(name, &[value], &[1, 1])
    }

    /// Append a UTF-8 character row vector.
    fn add_text(&mut self, name: &str, text: &str) -> Result<&mut Self> {
        let matrix = Matrix::from_text(name, text)?;
        self.add(matrix)
    }
}
