pub mod array_data;
pub mod physical_type;
pub mod validity;

use std::sync::Arc;

use array_data::{ArrayData, ConstantStorage, ListStorage, StructStorage, VarlenStorage};
use colexec_error::{DbError, ErrorKind, OptionExt, Result, ResultExt};
use half::f16;
use physical_type::{
    PhysicalF16,
    PhysicalF32,
    PhysicalF64,
    PhysicalI8,
    PhysicalI16,
    PhysicalI32,
    PhysicalI64,
    PhysicalI128,
    PhysicalType,
    PhysicalU8,
    PhysicalU16,
    PhysicalU32,
    PhysicalU64,
    ScalarStorage,
};
use validity::Validity;

use super::datatype::{DataType, StructTypeMeta};
use super::scalar::ScalarValue;
use super::scalar::decimal::{Decimal64Scalar, Decimal128Scalar};

/// A column of values of a single logical type.
///
/// The array is made up of a logical data type, a validity mask marking which
/// rows are null, and the physical data.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    pub(crate) datatype: DataType,
    pub(crate) validity: Validity,
    pub(crate) data: ArrayData,
}

impl Array {
    /// Create a new array with all rows valid.
    pub fn new(datatype: DataType, data: ArrayData) -> Result<Self> {
        let validity = Validity::new_all_valid(data.len());
        Self::try_new(datatype, validity, data)
    }

    /// Create a new array, checking that the physical data can represent the
    /// data type and that the validity covers every row.
    pub fn try_new(datatype: DataType, validity: Validity, data: ArrayData) -> Result<Self> {
        check_data_matches(&datatype, &data)?;
        if validity.len() != data.len() {
            return Err(
                DbError::with_kind(ErrorKind::SizeMismatch, "Validity length differs from data")
                    .with_field("validity", validity.len())
                    .with_field("data", data.len()),
            );
        }

        Ok(Array {
            datatype,
            validity,
            data,
        })
    }

    /// Create an array of `len` null rows with default underlying data.
    pub fn new_typed_null(datatype: &DataType, len: usize) -> Result<Self> {
        let data = default_array_data(datatype, len)?;
        Ok(Array {
            datatype: datatype.clone(),
            validity: Validity::new_all_invalid(len),
            data,
        })
    }

    /// Create an array broadcasting the single row in `value` to `len` rows.
    pub fn new_constant(value: Array, len: usize) -> Result<Self> {
        if value.len() != 1 {
            return Err(DbError::new("Constant value must contain exactly one row")
                .with_field("len", value.len()));
        }

        let value = match value.data {
            ArrayData::Constant(c) => c.value,
            _ => Arc::new(value),
        };

        let validity = if value.is_valid(0) {
            Validity::new_all_valid(len)
        } else {
            Validity::new_all_invalid(len)
        };

        Ok(Array {
            datatype: value.datatype.clone(),
            validity,
            data: ArrayData::Constant(ConstantStorage { value, len }),
        })
    }

    /// Create a list array from a child array and `len + 1` offsets.
    pub fn try_new_list(
        child: impl Into<Arc<Array>>,
        offsets: impl Into<Arc<Vec<i32>>>,
    ) -> Result<Self> {
        let storage = ListStorage::try_new(offsets, child)?;
        Ok(Array {
            datatype: DataType::list(storage.child.datatype.clone()),
            validity: Validity::new_all_valid(storage.len()),
            data: ArrayData::List(storage),
        })
    }

    /// Create a struct array from named children.
    ///
    /// `len` must be provided since a struct may have no children.
    pub fn try_new_struct<S: Into<String>>(
        fields: impl IntoIterator<Item = (S, Array)>,
        len: usize,
    ) -> Result<Self> {
        let mut meta_fields = Vec::new();
        let mut children = Vec::new();
        for (name, child) in fields {
            meta_fields.push((name.into(), child.datatype.clone()));
            children.push(child);
        }

        Ok(Array {
            datatype: DataType::Struct(StructTypeMeta::new(meta_fields)),
            validity: Validity::new_all_valid(len),
            data: ArrayData::Struct(StructStorage::try_new(children, len)?),
        })
    }

    /// Replace the validity for this array.
    pub fn with_validity(mut self, validity: Validity) -> Result<Self> {
        if validity.len() != self.len() {
            return Err(
                DbError::with_kind(ErrorKind::SizeMismatch, "Validity length differs from data")
                    .with_field("validity", validity.len())
                    .with_field("data", self.len()),
            );
        }
        self.validity = validity;
        Ok(self)
    }

    pub fn datatype(&self) -> &DataType {
        &self.datatype
    }

    pub fn validity(&self) -> &Validity {
        &self.validity
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    /// Get mutable access to the physical data.
    ///
    /// Buffers shared with other arrays are only copied once actually written
    /// to through the copy-on-write accessors.
    pub fn data_mut(&mut self) -> &mut ArrayData {
        &mut self.data
    }

    /// Number of logical rows in the array.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_valid(&self, idx: usize) -> bool {
        self.validity.is_valid(idx)
    }

    pub fn is_constant(&self) -> bool {
        self.data.is_constant()
    }

    /// Get the single row being broadcast if this is a constant array.
    pub fn constant_value(&self) -> Option<&Array> {
        match &self.data {
            ArrayData::Constant(c) => Some(&c.value),
            _ => None,
        }
    }

    pub fn try_as_varlen(&self) -> Result<&VarlenStorage> {
        match &self.data {
            ArrayData::Varlen(v) => Ok(v),
            other => Err(self.illegal_column_error(other)),
        }
    }

    pub fn try_as_list(&self) -> Result<&ListStorage> {
        match &self.data {
            ArrayData::List(v) => Ok(v),
            other => Err(self.illegal_column_error(other)),
        }
    }

    pub fn try_as_struct(&self) -> Result<&StructStorage> {
        match &self.data {
            ArrayData::Struct(v) => Ok(v),
            other => Err(self.illegal_column_error(other)),
        }
    }

    fn illegal_column_error(&self, data: &ArrayData) -> DbError {
        DbError::with_kind(ErrorKind::IllegalColumn, "Unexpected column kind")
            .with_field("column", data.kind_name())
            .with_field("datatype", &self.datatype)
    }

    /// Get the logical value at some row.
    pub fn logical_value(&self, idx: usize) -> Result<ScalarValue> {
        if idx >= self.len() {
            return Err(DbError::new("Row index out of bounds")
                .with_field("idx", idx)
                .with_field("len", self.len()));
        }

        if let ArrayData::Constant(c) = &self.data {
            return c.value.logical_value(0);
        }

        if !self.validity.is_valid(idx) {
            return Ok(ScalarValue::Null);
        }

        let value = match (&self.datatype, &self.data) {
            (DataType::Decimal64(m), ArrayData::Int64(v)) => {
                ScalarValue::Decimal64(Decimal64Scalar {
                    precision: m.precision,
                    scale: m.scale,
                    value: v[idx],
                })
            }
            (DataType::Decimal128(m), ArrayData::Int128(v)) => {
                ScalarValue::Decimal128(Decimal128Scalar {
                    precision: m.precision,
                    scale: m.scale,
                    value: v[idx],
                })
            }
            (_, ArrayData::Int8(v)) => ScalarValue::Int8(v[idx]),
            (_, ArrayData::Int16(v)) => ScalarValue::Int16(v[idx]),
            (_, ArrayData::Int32(v)) => ScalarValue::Int32(v[idx]),
            (_, ArrayData::Int64(v)) => ScalarValue::Int64(v[idx]),
            (_, ArrayData::Int128(v)) => ScalarValue::Int128(v[idx]),
            (_, ArrayData::UInt8(v)) => ScalarValue::UInt8(v[idx]),
            (_, ArrayData::UInt16(v)) => ScalarValue::UInt16(v[idx]),
            (_, ArrayData::UInt32(v)) => ScalarValue::UInt32(v[idx]),
            (_, ArrayData::UInt64(v)) => ScalarValue::UInt64(v[idx]),
            (_, ArrayData::Float16(v)) => ScalarValue::Float16(v[idx]),
            (_, ArrayData::Float32(v)) => ScalarValue::Float32(v[idx]),
            (_, ArrayData::Float64(v)) => ScalarValue::Float64(v[idx]),
            (DataType::Utf8, ArrayData::Varlen(v)) => {
                let bytes = v.get(idx).required("varlen row")?;
                let s = std::str::from_utf8(bytes).context("Invalid utf8 in string array")?;
                ScalarValue::Utf8(s.to_string())
            }
            (_, ArrayData::Varlen(v)) => {
                ScalarValue::Binary(v.get(idx).required("varlen row")?.to_vec())
            }
            (_, ArrayData::List(list)) => {
                let start = list.offsets[idx] as usize;
                let end = list.offsets[idx + 1] as usize;
                let values = (start..end)
                    .map(|child_idx| list.child.logical_value(child_idx))
                    .collect::<Result<Vec<_>>>()?;
                ScalarValue::List(values)
            }
            (_, ArrayData::Struct(s)) => {
                let values = s
                    .children
                    .iter()
                    .map(|child| child.logical_value(idx))
                    .collect::<Result<Vec<_>>>()?;
                ScalarValue::Struct(values)
            }
            (_, ArrayData::Constant(c)) => c.value.logical_value(0)?,
        };

        Ok(value)
    }

    /// Produce a new array containing the rows at the given indices.
    ///
    /// The output is never a constant array.
    pub fn select(&self, selection: &[usize]) -> Result<Array> {
        if let ArrayData::Constant(c) = &self.data {
            return c.value.select(&vec![0; selection.len()]);
        }

        if let Some(&idx) = selection.iter().find(|&&idx| idx >= self.len()) {
            return Err(DbError::new("Selection index out of bounds")
                .with_field("idx", idx)
                .with_field("len", self.len()));
        }

        macro_rules! select_values {
            ($variant:ident, $values:expr) => {
                ArrayData::$variant(Arc::new(selection.iter().map(|&idx| $values[idx]).collect()))
            };
        }

        let data = match &self.data {
            ArrayData::Int8(v) => select_values!(Int8, v),
            ArrayData::Int16(v) => select_values!(Int16, v),
            ArrayData::Int32(v) => select_values!(Int32, v),
            ArrayData::Int64(v) => select_values!(Int64, v),
            ArrayData::Int128(v) => select_values!(Int128, v),
            ArrayData::UInt8(v) => select_values!(UInt8, v),
            ArrayData::UInt16(v) => select_values!(UInt16, v),
            ArrayData::UInt32(v) => select_values!(UInt32, v),
            ArrayData::UInt64(v) => select_values!(UInt64, v),
            ArrayData::Float16(v) => select_values!(Float16, v),
            ArrayData::Float32(v) => select_values!(Float32, v),
            ArrayData::Float64(v) => select_values!(Float64, v),
            ArrayData::Varlen(v) => {
                let mut out = VarlenStorage::default();
                for &idx in selection {
                    out.push(v.get(idx).required("varlen row")?)?;
                }
                ArrayData::Varlen(Arc::new(out))
            }
            ArrayData::List(list) => {
                let mut offsets = Vec::with_capacity(selection.len() + 1);
                offsets.push(0);
                let mut child_selection = Vec::new();
                for &idx in selection {
                    let start = list.offsets[idx] as usize;
                    let end = list.offsets[idx + 1] as usize;
                    child_selection.extend(start..end);
                    let offset = i32::try_from(child_selection.len())
                        .context("List child exceeds maximum offset")?;
                    offsets.push(offset);
                }
                ArrayData::List(ListStorage {
                    offsets: Arc::new(offsets),
                    child: Arc::new(list.child.select(&child_selection)?),
                })
            }
            ArrayData::Struct(s) => {
                let children = s
                    .children
                    .iter()
                    .map(|child| child.select(selection))
                    .collect::<Result<Vec<_>>>()?;
                ArrayData::Struct(StructStorage::try_new(children, selection.len())?)
            }
            ArrayData::Constant(c) => return c.value.select(&vec![0; selection.len()]),
        };

        let validity = if self.validity.all_valid() {
            Validity::new_all_valid(selection.len())
        } else {
            selection
                .iter()
                .map(|&idx| self.validity.is_valid(idx))
                .collect()
        };

        Ok(Array {
            datatype: self.datatype.clone(),
            validity,
            data,
        })
    }

    /// Expand a constant array into a full-length array.
    ///
    /// Non-constant arrays are returned as a cheap clone.
    pub fn materialize(&self) -> Result<Array> {
        match &self.data {
            ArrayData::Constant(c) => c.value.select(&vec![0; c.len]),
            _ => Ok(self.clone()),
        }
    }
}

fn check_data_matches(datatype: &DataType, data: &ArrayData) -> Result<()> {
    let matches = match (datatype, data) {
        (_, ArrayData::Constant(c)) => c.value.datatype == *datatype,
        (DataType::Utf8 | DataType::Binary, ArrayData::Varlen(_)) => true,
        (DataType::List(meta), ArrayData::List(list)) => list.child.datatype == *meta.datatype,
        (DataType::Struct(meta), ArrayData::Struct(s)) => {
            meta.fields.len() == s.children.len()
                && meta
                    .fields
                    .iter()
                    .zip(s.children.iter())
                    .all(|(field, child)| field.datatype == child.datatype)
        }
        (datatype, data) => {
            let phys = datatype.physical_type();
            phys.is_primitive() && phys == data.physical_type()
        }
    };

    if !matches {
        return Err(DbError::with_kind(
            ErrorKind::IllegalColumn,
            "Physical data does not match data type",
        )
        .with_field("datatype", datatype)
        .with_field("column", data.kind_name()));
    }

    Ok(())
}

fn default_array_data(datatype: &DataType, len: usize) -> Result<ArrayData> {
    fn defaults<S: ScalarStorage>(len: usize) -> ArrayData {
        S::new_array_data(vec![S::StorageType::default(); len])
    }

    Ok(match datatype.physical_type() {
        PhysicalType::Int8 => defaults::<PhysicalI8>(len),
        PhysicalType::Int16 => defaults::<PhysicalI16>(len),
        PhysicalType::Int32 => defaults::<PhysicalI32>(len),
        PhysicalType::Int64 => defaults::<PhysicalI64>(len),
        PhysicalType::Int128 => defaults::<PhysicalI128>(len),
        PhysicalType::UInt8 => defaults::<PhysicalU8>(len),
        PhysicalType::UInt16 => defaults::<PhysicalU16>(len),
        PhysicalType::UInt32 => defaults::<PhysicalU32>(len),
        PhysicalType::UInt64 => defaults::<PhysicalU64>(len),
        PhysicalType::Float16 => defaults::<PhysicalF16>(len),
        PhysicalType::Float32 => defaults::<PhysicalF32>(len),
        PhysicalType::Float64 => defaults::<PhysicalF64>(len),
        PhysicalType::Utf8 | PhysicalType::Binary => {
            ArrayData::Varlen(Arc::new(VarlenStorage::try_new(vec![0; len + 1], Vec::new())?))
        }
        PhysicalType::List => {
            let element = datatype
                .list_element_type()
                .required("list element type")?;
            ArrayData::List(ListStorage {
                offsets: Arc::new(vec![0; len + 1]),
                child: Arc::new(Array::new_typed_null(element, 0)?),
            })
        }
        PhysicalType::Struct => {
            let fields = datatype.struct_fields().required("struct fields")?;
            let children = fields
                .iter()
                .map(|field| Array::new_typed_null(&field.datatype, len))
                .collect::<Result<Vec<_>>>()?;
            ArrayData::Struct(StructStorage::try_new(children, len)?)
        }
    })
}

macro_rules! impl_primitive_from_iter {
    ($prim:ty, $storage:ty, $datatype:ident) => {
        impl FromIterator<$prim> for Array {
            fn from_iter<T: IntoIterator<Item = $prim>>(iter: T) -> Self {
                let values: Vec<$prim> = iter.into_iter().collect();
                Array {
                    datatype: DataType::$datatype,
                    validity: Validity::new_all_valid(values.len()),
                    data: <$storage>::new_array_data(values),
                }
            }
        }

        impl FromIterator<Option<$prim>> for Array {
            fn from_iter<T: IntoIterator<Item = Option<$prim>>>(iter: T) -> Self {
                let mut values = Vec::new();
                let mut validity = Vec::new();
                for v in iter {
                    validity.push(v.is_some());
                    values.push(v.unwrap_or_default());
                }
                Array {
                    datatype: DataType::$datatype,
                    validity: Validity::from_iter(validity),
                    data: <$storage>::new_array_data(values),
                }
            }
        }
    };
}

impl_primitive_from_iter!(i8, PhysicalI8, Int8);
impl_primitive_from_iter!(i16, PhysicalI16, Int16);
impl_primitive_from_iter!(i32, PhysicalI32, Int32);
impl_primitive_from_iter!(i64, PhysicalI64, Int64);
impl_primitive_from_iter!(i128, PhysicalI128, Int128);
impl_primitive_from_iter!(u8, PhysicalU8, UInt8);
impl_primitive_from_iter!(u16, PhysicalU16, UInt16);
impl_primitive_from_iter!(u32, PhysicalU32, UInt32);
impl_primitive_from_iter!(u64, PhysicalU64, UInt64);
impl_primitive_from_iter!(f16, PhysicalF16, Float16);
impl_primitive_from_iter!(f32, PhysicalF32, Float32);
impl_primitive_from_iter!(f64, PhysicalF64, Float64);

impl<'a> FromIterator<Option<&'a str>> for Array {
    fn from_iter<T: IntoIterator<Item = Option<&'a str>>>(iter: T) -> Self {
        let mut storage = VarlenStorage::default();
        let mut validity = Vec::new();
        for v in iter {
            validity.push(v.is_some());
            // Only fails past i32::MAX bytes.
            let _ = storage.push(v.unwrap_or_default().as_bytes());
        }
        Array {
            datatype: DataType::Utf8,
            validity: Validity::from_iter(validity),
            data: ArrayData::Varlen(Arc::new(storage)),
        }
    }
}

impl<'a> FromIterator<&'a str> for Array {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        let mut array: Array = iter.into_iter().map(Some).collect();
        array.validity = Validity::new_all_valid(array.len());
        array
    }
}

impl FromIterator<String> for Array {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        let strings: Vec<String> = iter.into_iter().collect();
        strings.iter().map(|s| s.as_str()).collect()
    }
}
