use std::fmt;

use colexec_error::{DbError, ErrorKind, Result};
use serde::{Deserialize, Serialize};

use super::array::physical_type::PhysicalType;
use super::scalar::decimal::{Decimal64Type, Decimal128Type, DecimalType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataTypeId {
    Int8,
    Int16,
    Int32,
    Int64,
    Int128,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float16,
    Float32,
    Float64,
    Decimal64,
    Decimal128,
    Utf8,
    Binary,
    Struct,
    List,
}

impl fmt::Display for DataTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int8 => write!(f, "Int8"),
            Self::Int16 => write!(f, "Int16"),
            Self::Int32 => write!(f, "Int32"),
            Self::Int64 => write!(f, "Int64"),
            Self::Int128 => write!(f, "Int128"),
            Self::UInt8 => write!(f, "UInt8"),
            Self::UInt16 => write!(f, "UInt16"),
            Self::UInt32 => write!(f, "UInt32"),
            Self::UInt64 => write!(f, "UInt64"),
            Self::Float16 => write!(f, "Float16"),
            Self::Float32 => write!(f, "Float32"),
            Self::Float64 => write!(f, "Float64"),
            Self::Decimal64 => write!(f, "Decimal64"),
            Self::Decimal128 => write!(f, "Decimal128"),
            Self::Utf8 => write!(f, "Utf8"),
            Self::Binary => write!(f, "Binary"),
            Self::Struct => write!(f, "Struct"),
            Self::List => write!(f, "List"),
        }
    }
}

/// Metadata associated with decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecimalTypeMeta {
    pub precision: u8,
    pub scale: i8,
}

impl DecimalTypeMeta {
    pub const fn new(precision: u8, scale: i8) -> Self {
        DecimalTypeMeta { precision, scale }
    }
}

/// A single named field inside a struct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructField {
    pub name: String,
    pub datatype: DataType,
}

/// Metadata associated with structs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructTypeMeta {
    pub fields: Vec<StructField>,
}

impl StructTypeMeta {
    pub fn new<S: Into<String>>(fields: impl IntoIterator<Item = (S, DataType)>) -> Self {
        StructTypeMeta {
            fields: fields
                .into_iter()
                .map(|(name, datatype)| StructField {
                    name: name.into(),
                    datatype,
                })
                .collect(),
        }
    }
}

/// Metadata associated with lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListTypeMeta {
    pub datatype: Box<DataType>,
}

impl ListTypeMeta {
    pub fn new(element_type: DataType) -> Self {
        ListTypeMeta {
            datatype: Box::new(element_type),
        }
    }
}

/// Logical data types.
///
/// Some types include additional metadata which refines the type further
/// (for example decimal precision and scale).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Int8,
    Int16,
    Int32,
    Int64,
    Int128,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float16,
    Float32,
    Float64,
    /// 64-bit decimal.
    Decimal64(DecimalTypeMeta),
    /// 128-bit decimal.
    Decimal128(DecimalTypeMeta),
    Utf8,
    Binary,
    /// A struct of named fields, possibly of different types.
    Struct(StructTypeMeta),
    /// A list of values all of the same type.
    List(ListTypeMeta),
}

impl DataType {
    pub fn list(element_type: DataType) -> Self {
        DataType::List(ListTypeMeta::new(element_type))
    }

    /// Create a decimal type picking the narrowest storage able to hold
    /// `precision` digits.
    pub fn decimal(precision: u8, scale: i8) -> Result<Self> {
        if precision == 0 || precision > Decimal128Type::MAX_PRECISION {
            return Err(DbError::with_kind(
                ErrorKind::IllegalArgumentType,
                "Decimal precision out of range",
            )
            .with_field("precision", precision)
            .with_field("max", Decimal128Type::MAX_PRECISION));
        }
        if scale < 0 || scale as u8 > precision {
            return Err(DbError::with_kind(
                ErrorKind::IllegalArgumentType,
                "Decimal scale out of range",
            )
            .with_field("precision", precision)
            .with_field("scale", scale));
        }

        let meta = DecimalTypeMeta::new(precision, scale);
        if precision <= Decimal64Type::MAX_PRECISION {
            Ok(DataType::Decimal64(meta))
        } else {
            Ok(DataType::Decimal128(meta))
        }
    }

    /// Get the data type id from the data type.
    pub const fn datatype_id(&self) -> DataTypeId {
        match self {
            DataType::Int8 => DataTypeId::Int8,
            DataType::Int16 => DataTypeId::Int16,
            DataType::Int32 => DataTypeId::Int32,
            DataType::Int64 => DataTypeId::Int64,
            DataType::Int128 => DataTypeId::Int128,
            DataType::UInt8 => DataTypeId::UInt8,
            DataType::UInt16 => DataTypeId::UInt16,
            DataType::UInt32 => DataTypeId::UInt32,
            DataType::UInt64 => DataTypeId::UInt64,
            DataType::Float16 => DataTypeId::Float16,
            DataType::Float32 => DataTypeId::Float32,
            DataType::Float64 => DataTypeId::Float64,
            DataType::Decimal64(_) => DataTypeId::Decimal64,
            DataType::Decimal128(_) => DataTypeId::Decimal128,
            DataType::Utf8 => DataTypeId::Utf8,
            DataType::Binary => DataTypeId::Binary,
            DataType::Struct(_) => DataTypeId::Struct,
            DataType::List(_) => DataTypeId::List,
        }
    }

    /// Get the physical type used to store values of this type.
    pub const fn physical_type(&self) -> PhysicalType {
        match self {
            DataType::Int8 => PhysicalType::Int8,
            DataType::Int16 => PhysicalType::Int16,
            DataType::Int32 => PhysicalType::Int32,
            DataType::Int64 => PhysicalType::Int64,
            DataType::Int128 => PhysicalType::Int128,
            DataType::UInt8 => PhysicalType::UInt8,
            DataType::UInt16 => PhysicalType::UInt16,
            DataType::UInt32 => PhysicalType::UInt32,
            DataType::UInt64 => PhysicalType::UInt64,
            DataType::Float16 => PhysicalType::Float16,
            DataType::Float32 => PhysicalType::Float32,
            DataType::Float64 => PhysicalType::Float64,
            DataType::Decimal64(_) => PhysicalType::Int64,
            DataType::Decimal128(_) => PhysicalType::Int128,
            DataType::Utf8 => PhysicalType::Utf8,
            DataType::Binary => PhysicalType::Binary,
            DataType::Struct(_) => PhysicalType::Struct,
            DataType::List(_) => PhysicalType::List,
        }
    }

    pub const fn is_list(&self) -> bool {
        matches!(self, DataType::List(_))
    }

    pub const fn is_string(&self) -> bool {
        matches!(self, DataType::Utf8 | DataType::Binary)
    }

    pub const fn is_decimal(&self) -> bool {
        matches!(self, DataType::Decimal64(_) | DataType::Decimal128(_))
    }

    pub const fn is_float(&self) -> bool {
        matches!(
            self,
            DataType::Float16 | DataType::Float32 | DataType::Float64
        )
    }

    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::Int128
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
        )
    }

    pub const fn is_signed_integer(&self) -> bool {
        matches!(
            self,
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 | DataType::Int128
        )
    }

    pub const fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float() || self.is_decimal()
    }

    /// Width in bytes of a fixed-size numeric value.
    ///
    /// Returns None for non-numeric types.
    pub const fn byte_width(&self) -> Option<usize> {
        Some(match self {
            DataType::Int8 | DataType::UInt8 => 1,
            DataType::Int16 | DataType::UInt16 | DataType::Float16 => 2,
            DataType::Int32 | DataType::UInt32 | DataType::Float32 => 4,
            DataType::Int64 | DataType::UInt64 | DataType::Float64 | DataType::Decimal64(_) => 8,
            DataType::Int128 | DataType::Decimal128(_) => 16,
            _ => return None,
        })
    }

    /// Get the decimal metadata if this is a decimal type.
    pub const fn decimal_meta(&self) -> Option<DecimalTypeMeta> {
        match self {
            DataType::Decimal64(m) | DataType::Decimal128(m) => Some(*m),
            _ => None,
        }
    }

    /// Get the element type if this is a list.
    pub fn list_element_type(&self) -> Option<&DataType> {
        match self {
            DataType::List(m) => Some(m.datatype.as_ref()),
            _ => None,
        }
    }

    /// Get the struct fields if this is a struct.
    pub fn struct_fields(&self) -> Option<&[StructField]> {
        match self {
            DataType::Struct(m) => Some(&m.fields),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decimal64(meta) => write!(f, "Decimal64({},{})", meta.precision, meta.scale),
            Self::Decimal128(meta) => write!(f, "Decimal128({},{})", meta.precision, meta.scale),
            Self::Struct(meta) => {
                write!(
                    f,
                    "Struct {{{}}}",
                    meta.fields
                        .iter()
                        .map(|field| format!("{}: {}", field.name, field.datatype))
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
            Self::List(meta) => write!(f, "List[{}]", meta.datatype),
            other => write!(f, "{}", other.datatype_id()),
        }
    }
}
