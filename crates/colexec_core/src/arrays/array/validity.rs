use std::sync::Arc;

use colexec_error::{DbError, ErrorKind, Result};

use crate::arrays::bitmap::Bitmap;

/// Validity mask for an array.
///
/// The mask is reference counted so that arrays derived from one another
/// (flattened siblings, promoted operands) can share it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validity {
    inner: ValidityInner,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ValidityInner {
    /// No mask has been set, assume all entries valid.
    AllValid { len: usize },
    /// Mask has been set. Bitmap indicates which entries are valid or invalid.
    Mask { bitmap: Arc<Bitmap> },
}

impl Validity {
    pub fn new_all_valid(len: usize) -> Self {
        Validity {
            inner: ValidityInner::AllValid { len },
        }
    }

    pub fn new_all_invalid(len: usize) -> Self {
        Self::from_bitmap(Bitmap::new_with_all_false(len))
    }

    pub fn from_bitmap(bitmap: Bitmap) -> Self {
        Validity {
            inner: ValidityInner::Mask {
                bitmap: Arc::new(bitmap),
            },
        }
    }

    pub fn len(&self) -> usize {
        match &self.inner {
            ValidityInner::AllValid { len } => *len,
            ValidityInner::Mask { bitmap } => bitmap.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn all_valid(&self) -> bool {
        match &self.inner {
            ValidityInner::AllValid { .. } => true,
            ValidityInner::Mask { bitmap } => bitmap.is_all_true(),
        }
    }

    pub fn is_valid(&self, idx: usize) -> bool {
        match &self.inner {
            ValidityInner::AllValid { .. } => true,
            ValidityInner::Mask { bitmap } => bitmap.value(idx),
        }
    }

    pub fn set_invalid(&mut self, idx: usize) {
        match &mut self.inner {
            ValidityInner::AllValid { len } => {
                let mut bitmap = Bitmap::new_with_all_true(*len);
                bitmap.set_unchecked(idx, false);
                self.inner = ValidityInner::Mask {
                    bitmap: Arc::new(bitmap),
                }
            }
            ValidityInner::Mask { bitmap } => Arc::make_mut(bitmap).set_unchecked(idx, false),
        }
    }

    /// Produce a validity where a row is valid only if it's valid in both
    /// `self` and `other`.
    pub fn intersect(&self, other: &Validity) -> Result<Validity> {
        if self.len() != other.len() {
            return Err(
                DbError::with_kind(ErrorKind::SizeMismatch, "Validity lengths differ")
                    .with_field("left", self.len())
                    .with_field("right", other.len()),
            );
        }

        match (&self.inner, &other.inner) {
            (ValidityInner::AllValid { .. }, _) => Ok(other.clone()),
            (_, ValidityInner::AllValid { .. }) => Ok(self.clone()),
            (ValidityInner::Mask { bitmap: a }, ValidityInner::Mask { bitmap: b }) => {
                let mut out = a.as_ref().clone();
                out.bit_and_mut(b)?;
                Ok(Validity::from_bitmap(out))
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len()).map(|idx| self.is_valid(idx))
    }
}

impl FromIterator<bool> for Validity {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        Validity::from_bitmap(Bitmap::from_iter(iter))
    }
}
