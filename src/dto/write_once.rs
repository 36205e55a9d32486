//! Once-only write cells.

use super::errors::{DtoError, DtoResult};

/// A slot that may be written exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WriteOnceCell<T> {
    #[default]
    Unset,
    Set(T),
}

impl<T> WriteOnceCell<T> {
    pub fn new() -> Self {
        WriteOnceCell::Unset
    }

    pub fn is_set(&self) -> bool {
        matches!(self, WriteOnceCell::Set(_))
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            WriteOnceCell::Set(value) => Some(value),
            WriteOnceCell::Unset => None,
        }
    }

    /// Fills the cell. A filled cell rejects every further write.
    pub fn write(&mut self, value: T) -> DtoResult<()> {
        match self {
            WriteOnceCell::Set(_) => Err(DtoError::ImmutableWrite),
            WriteOnceCell::Unset => {
                *self = WriteOnceCell::Set(value);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_write() {
        let mut cell = WriteOnceCell::new();
        assert!(!cell.is_set());
        cell.write(5).unwrap();
        assert_eq!(cell.get(), Some(&5));
    }

    #[test]
    fn test_second_write_fails_even_with_same_value() {
        let mut cell = WriteOnceCell::new();
        cell.write("a").unwrap();
        assert!(matches!(cell.write("a"), Err(DtoError::ImmutableWrite)));
        assert!(matches!(cell.write("b"), Err(DtoError::ImmutableWrite)));
        assert_eq!(cell.get(), Some(&"a"));
    }
}
