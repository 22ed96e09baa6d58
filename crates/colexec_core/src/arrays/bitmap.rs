use std::fmt;

use colexec_error::{DbError, Result};

/// An LSB ordered bitmap.
#[derive(Clone, Default)]
pub struct Bitmap {
    len: usize,
    data: Vec<u8>,
}

impl Bitmap {
    pub fn new_with_all_true(len: usize) -> Self {
        Bitmap {
            len,
            data: vec![u8::MAX; len.div_ceil(8)],
        }
    }

    pub fn new_with_all_false(len: usize) -> Self {
        Bitmap {
            len,
            data: vec![0; len.div_ceil(8)],
        }
    }

    /// Get the number of bits being tracked by this bitmap.
    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn count_trues(&self) -> usize {
        (0..self.len).filter(|&idx| self.value(idx)).count()
    }

    pub fn is_all_true(&self) -> bool {
        self.count_trues() == self.len
    }

    /// Push a value onto the end of the bitmap.
    pub fn push(&mut self, val: bool) {
        if self.len == self.data.len() * 8 {
            self.data.push(0);
        }
        let idx = self.len;
        self.len += 1;
        self.set_unchecked(idx, val);
    }

    /// Get the value at index.
    ///
    /// Panics if index is out of bounds.
    #[inline]
    pub fn value(&self, idx: usize) -> bool {
        let byte = self.data[idx >> 3];
        (byte >> (idx & 7)) & 1 != 0
    }

    /// Set a bit at index.
    ///
    /// Panics if index is out of bounds.
    #[inline]
    pub fn set_unchecked(&mut self, idx: usize, val: bool) {
        let byte = idx / 8;
        let bit = idx & 7;
        if val {
            self.data[byte] |= 1 << bit;
        } else {
            self.data[byte] &= !(1 << bit);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(|idx| self.value(idx))
    }

    /// Bit AND this bitmap with some other bitmap.
    pub fn bit_and_mut(&mut self, other: &Bitmap) -> Result<()> {
        if self.len() != other.len() {
            return Err(DbError::new("Bitmap lengths do not match (and)")
                .with_field("left", self.len())
                .with_field("right", other.len()));
        }

        for (byte, other) in self.data.iter_mut().zip(other.data.iter()) {
            *byte &= *other;
        }

        Ok(())
    }
}

impl FromIterator<bool> for Bitmap {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        let mut bitmap = Bitmap::default();
        for val in iter {
            bitmap.push(val);
        }
        bitmap
    }
}

/// Only bits within `len` take part in comparison.
impl PartialEq for Bitmap {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl Eq for Bitmap {}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|b| if b { 1 } else { 0 }))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_read() {
        let bitmap = Bitmap::from_iter([true, false, true, true, false, false, false, true, true]);
        assert_eq!(9, bitmap.len());
        assert_eq!(5, bitmap.count_trues());
        assert!(bitmap.value(8));
        assert!(!bitmap.value(1));
    }

    #[test]
    fn and_bitmaps() {
        let mut a = Bitmap::from_iter([true, true, false]);
        let b = Bitmap::from_iter([true, false, true]);
        a.bit_and_mut(&b).unwrap();

        assert_eq!(Bitmap::from_iter([true, false, false]), a);
    }

    #[test]
    fn and_len_mismatch() {
        let mut a = Bitmap::new_with_all_true(3);
        a.bit_and_mut(&Bitmap::new_with_all_true(4)).unwrap_err();
    }
}
