use std::sync::Arc;

use colexec_error::{DbError, ErrorKind, Result};
use half::f16;

use super::Array;
use super::physical_type::PhysicalType;

/// Physical data backing an array.
///
/// The set of variants is closed. Function implementations match on the
/// variant to decide if they can handle a column, and report an illegal
/// column otherwise.
///
/// All buffers are reference counted, cloning array data is cheap. Mutable
/// access always goes through `Arc::make_mut` so a buffer shared with another
/// array is copied before being written to.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Int8(Arc<Vec<i8>>),
    Int16(Arc<Vec<i16>>),
    Int32(Arc<Vec<i32>>),
    Int64(Arc<Vec<i64>>),
    Int128(Arc<Vec<i128>>),
    UInt8(Arc<Vec<u8>>),
    UInt16(Arc<Vec<u16>>),
    UInt32(Arc<Vec<u32>>),
    UInt64(Arc<Vec<u64>>),
    Float16(Arc<Vec<f16>>),
    Float32(Arc<Vec<f32>>),
    Float64(Arc<Vec<f64>>),
    /// Variable length strings or binary.
    Varlen(Arc<VarlenStorage>),
    /// Offsets into a child array.
    List(ListStorage),
    /// Named children of equal length.
    Struct(StructStorage),
    /// A single row broadcast to some logical length.
    Constant(ConstantStorage),
}

impl ArrayData {
    /// Number of rows this data represents.
    pub fn len(&self) -> usize {
        match self {
            Self::Int8(v) => v.len(),
            Self::Int16(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::Int128(v) => v.len(),
            Self::UInt8(v) => v.len(),
            Self::UInt16(v) => v.len(),
            Self::UInt32(v) => v.len(),
            Self::UInt64(v) => v.len(),
            Self::Float16(v) => v.len(),
            Self::Float32(v) => v.len(),
            Self::Float64(v) => v.len(),
            Self::Varlen(v) => v.len(),
            Self::List(v) => v.len(),
            Self::Struct(v) => v.len(),
            Self::Constant(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Physical type of the data.
    ///
    /// Constants report the physical type of the value being broadcast.
    pub fn physical_type(&self) -> PhysicalType {
        match self {
            Self::Int8(_) => PhysicalType::Int8,
            Self::Int16(_) => PhysicalType::Int16,
            Self::Int32(_) => PhysicalType::Int32,
            Self::Int64(_) => PhysicalType::Int64,
            Self::Int128(_) => PhysicalType::Int128,
            Self::UInt8(_) => PhysicalType::UInt8,
            Self::UInt16(_) => PhysicalType::UInt16,
            Self::UInt32(_) => PhysicalType::UInt32,
            Self::UInt64(_) => PhysicalType::UInt64,
            Self::Float16(_) => PhysicalType::Float16,
            Self::Float32(_) => PhysicalType::Float32,
            Self::Float64(_) => PhysicalType::Float64,
            Self::Varlen(_) => PhysicalType::Binary,
            Self::List(_) => PhysicalType::List,
            Self::Struct(_) => PhysicalType::Struct,
            Self::Constant(c) => c.value.data.physical_type(),
        }
    }

    /// Short name of the column kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Varlen(_) => "ColumnVarlen",
            Self::List(_) => "ColumnList",
            Self::Struct(_) => "ColumnStruct",
            Self::Constant(_) => "ColumnConst",
            _ => "ColumnVector",
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Self::Constant(_))
    }
}

/// Contiguous bytes with `len + 1` offsets delimiting each row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarlenStorage {
    offsets: Vec<i32>,
    data: Vec<u8>,
}

impl VarlenStorage {
    pub fn try_new(offsets: Vec<i32>, data: Vec<u8>) -> Result<Self> {
        validate_offsets(&offsets, data.len())?;
        Ok(VarlenStorage { offsets, data })
    }

    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn offsets(&self) -> &[i32] {
        &self.offsets
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the bytes for a row.
    pub fn get(&self, idx: usize) -> Option<&[u8]> {
        let start = *self.offsets.get(idx)? as usize;
        let end = *self.offsets.get(idx + 1)? as usize;
        self.data.get(start..end)
    }

    /// Push a value, returning an error if the buffer grows past what the
    /// offsets can address.
    pub fn push(&mut self, value: &[u8]) -> Result<()> {
        self.data.extend_from_slice(value);
        let end = i32::try_from(self.data.len())
            .map_err(|_| DbError::new("Varlen buffer exceeds maximum offset"))?;
        self.offsets.push(end);
        Ok(())
    }
}

impl Default for VarlenStorage {
    fn default() -> Self {
        VarlenStorage {
            offsets: vec![0],
            data: Vec::new(),
        }
    }
}

/// Offsets into a child array.
///
/// Offsets are `len + 1` monotonically non-decreasing values. Row `i`
/// covers child elements `offsets[i]..offsets[i + 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListStorage {
    pub(crate) offsets: Arc<Vec<i32>>,
    pub(crate) child: Arc<Array>,
}

impl ListStorage {
    pub fn try_new(
        offsets: impl Into<Arc<Vec<i32>>>,
        child: impl Into<Arc<Array>>,
    ) -> Result<Self> {
        let offsets = offsets.into();
        let child = child.into();
        validate_offsets(&offsets, child.len())?;
        Ok(ListStorage { offsets, child })
    }

    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn offsets(&self) -> &[i32] {
        &self.offsets
    }

    /// Shared handle to the offsets, used to build sibling lists over the same
    /// row boundaries.
    pub fn shared_offsets(&self) -> &Arc<Vec<i32>> {
        &self.offsets
    }

    /// Mutable offsets, copying them first if they're shared.
    pub fn offsets_mut(&mut self) -> &mut Vec<i32> {
        Arc::make_mut(&mut self.offsets)
    }

    pub fn child(&self) -> &Array {
        &self.child
    }

    /// Number of elements in a row.
    pub fn row_len(&self, idx: usize) -> usize {
        (self.offsets[idx + 1] - self.offsets[idx]) as usize
    }
}

/// Child arrays of a struct.
#[derive(Debug, Clone, PartialEq)]
pub struct StructStorage {
    pub(crate) children: Arc<Vec<Array>>,
    pub(crate) len: usize,
}

impl StructStorage {
    pub fn try_new(children: Vec<Array>, len: usize) -> Result<Self> {
        for (idx, child) in children.iter().enumerate() {
            if child.len() != len {
                return Err(
                    DbError::with_kind(ErrorKind::SizeMismatch, "Struct child has wrong length")
                        .with_field("child_idx", idx)
                        .with_field("expected", len)
                        .with_field("got", child.len()),
                );
            }
        }

        Ok(StructStorage {
            children: Arc::new(children),
            len,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn children(&self) -> &[Array] {
        &self.children
    }
}

/// A one-row array logically repeated `len` times.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantStorage {
    pub(crate) value: Arc<Array>,
    pub(crate) len: usize,
}

impl ConstantStorage {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The single-row array being broadcast.
    pub fn value(&self) -> &Array {
        &self.value
    }
}

fn validate_offsets(offsets: &[i32], child_len: usize) -> Result<()> {
    let first = offsets
        .first()
        .ok_or_else(|| DbError::new("Offsets must contain at least one value"))?;
    if *first < 0 {
        return Err(DbError::new("Offsets must not be negative").with_field("first", first));
    }

    for (idx, pair) in offsets.windows(2).enumerate() {
        if pair[1] < pair[0] {
            return Err(DbError::new("Offsets must be non-decreasing")
                .with_field("row", idx)
                .with_field("start", pair[0])
                .with_field("end", pair[1]));
        }
    }

    let last = *offsets.last().unwrap_or(first) as usize;
    if last > child_len {
        return Err(DbError::new("Offsets point past the end of the child data")
            .with_field("last_offset", last)
            .with_field("child_len", child_len));
    }

    Ok(())
}
