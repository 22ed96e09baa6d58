use std::fmt::Debug;
use std::marker::PhantomData;

use colexec_error::{Result, not_implemented};

use crate::arrays::array::Array;
use crate::arrays::array::array_data::ArrayData;
use crate::arrays::array::physical_type::{PhysicalI64, PhysicalU8, ScalarStorage};
use crate::arrays::datatype::DataType;
use crate::functions::{ScalarFunction, illegal_column_error, invalid_input_types_error};

type OutputValue<O> = <<O as StringOrArrayOperation>::Output as ScalarStorage>::StorageType;

/// Computes one scalar per row from a string or array column.
///
/// Implementations only see the raw offsets (and bytes for strings), rows are
/// delimited by `offsets[i]..offsets[i + 1]`.
pub trait StringOrArrayOperation: Debug + Default + Clone + Copy + Sync + Send + 'static {
    const NAME: &'static str;
    const ALIASES: &'static [&'static str];
    const RETURN_TYPE: DataType;
    /// If list columns are accepted in addition to strings.
    const SUPPORTS_ARRAYS: bool;

    type Output: ScalarStorage;

    fn vector(data: &[u8], offsets: &[i32], out: &mut [OutputValue<Self>]);

    fn array(_offsets: &[i32], _out: &mut [OutputValue<Self>]) -> Result<()> {
        not_implemented!("{} for arrays", Self::NAME)
    }
}

fn row_lengths(offsets: &[i32]) -> impl Iterator<Item = i32> + '_ {
    offsets.windows(2).map(|w| w[1] - w[0])
}

/// Number of bytes in a string, or number of elements in an array.
#[derive(Debug, Default, Clone, Copy)]
pub struct LengthOp;

impl StringOrArrayOperation for LengthOp {
    const NAME: &'static str = "length";
    const ALIASES: &'static [&'static str] = &["octet_length"];
    const RETURN_TYPE: DataType = DataType::Int64;
    const SUPPORTS_ARRAYS: bool = true;

    type Output = PhysicalI64;

    fn vector(_data: &[u8], offsets: &[i32], out: &mut [i64]) {
        for (out, len) in out.iter_mut().zip(row_lengths(offsets)) {
            *out = len as i64;
        }
    }

    fn array(offsets: &[i32], out: &mut [i64]) -> Result<()> {
        for (out, len) in out.iter_mut().zip(row_lengths(offsets)) {
            *out = len as i64;
        }
        Ok(())
    }
}

/// Number of unicode code points in a string.
///
/// Counts bytes that aren't utf8 continuation bytes, invalid utf8 is not
/// checked.
#[derive(Debug, Default, Clone, Copy)]
pub struct CharLengthOp;

impl StringOrArrayOperation for CharLengthOp {
    const NAME: &'static str = "char_length";
    const ALIASES: &'static [&'static str] = &["character_length", "lengthUTF8"];
    const RETURN_TYPE: DataType = DataType::Int64;
    const SUPPORTS_ARRAYS: bool = false;

    type Output = PhysicalI64;

    fn vector(data: &[u8], offsets: &[i32], out: &mut [i64]) {
        for (out, w) in out.iter_mut().zip(offsets.windows(2)) {
            let row = &data[w[0] as usize..w[1] as usize];
            *out = row.iter().filter(|&&b| (b & 0xC0) != 0x80).count() as i64;
        }
    }
}

/// 1 if the string or array has no bytes/elements, 0 otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyOp;

impl StringOrArrayOperation for EmptyOp {
    const NAME: &'static str = "empty";
    const ALIASES: &'static [&'static str] = &[];
    const RETURN_TYPE: DataType = DataType::UInt8;
    const SUPPORTS_ARRAYS: bool = true;

    type Output = PhysicalU8;

    fn vector(_data: &[u8], offsets: &[i32], out: &mut [u8]) {
        for (out, len) in out.iter_mut().zip(row_lengths(offsets)) {
            *out = (len == 0) as u8;
        }
    }

    fn array(offsets: &[i32], out: &mut [u8]) -> Result<()> {
        for (out, len) in out.iter_mut().zip(row_lengths(offsets)) {
            *out = (len == 0) as u8;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NotEmptyOp;

impl StringOrArrayOperation for NotEmptyOp {
    const NAME: &'static str = "notEmpty";
    const ALIASES: &'static [&'static str] = &[];
    const RETURN_TYPE: DataType = DataType::UInt8;
    const SUPPORTS_ARRAYS: bool = true;

    type Output = PhysicalU8;

    fn vector(_data: &[u8], offsets: &[i32], out: &mut [u8]) {
        for (out, len) in out.iter_mut().zip(row_lengths(offsets)) {
            *out = (len != 0) as u8;
        }
    }

    fn array(offsets: &[i32], out: &mut [u8]) -> Result<()> {
        for (out, len) in out.iter_mut().zip(row_lengths(offsets)) {
            *out = (len != 0) as u8;
        }
        Ok(())
    }
}

/// Single argument function over a string (or array) column producing a
/// primitive column.
///
/// Validity is carried over from the input.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringOrArrayToScalar<O: StringOrArrayOperation> {
    _op: PhantomData<O>,
}

impl<O: StringOrArrayOperation> StringOrArrayToScalar<O> {
    pub const fn new() -> Self {
        StringOrArrayToScalar { _op: PhantomData }
    }
}

impl<O: StringOrArrayOperation> ScalarFunction for StringOrArrayToScalar<O> {
    fn name(&self) -> &'static str {
        O::NAME
    }

    fn aliases(&self) -> &'static [&'static str] {
        O::ALIASES
    }

    fn arity(&self) -> usize {
        1
    }

    fn return_type_impl(&self, inputs: &[DataType]) -> Result<DataType> {
        match &inputs[0] {
            DataType::Utf8 | DataType::Binary => Ok(O::RETURN_TYPE),
            DataType::List(_) if O::SUPPORTS_ARRAYS => Ok(O::RETURN_TYPE),
            _ => Err(invalid_input_types_error(self, inputs)),
        }
    }

    fn execute_impl(&self, inputs: &[Array], _num_rows: usize) -> Result<Array> {
        let input = &inputs[0];
        let mut values = vec![<OutputValue<O> as Default>::default(); input.len()];

        match input.data() {
            ArrayData::Varlen(strings) => O::vector(strings.data(), strings.offsets(), &mut values),
            ArrayData::List(list) if O::SUPPORTS_ARRAYS => O::array(list.offsets(), &mut values)?,
            _ => return Err(illegal_column_error(self, input)),
        }

        Array::try_new(
            O::RETURN_TYPE,
            input.validity().clone(),
            O::Output::new_array_data(values),
        )
    }
}

#[cfg(test)]
mod tests {
    use colexec_error::ErrorKind;

    use super::*;
    use crate::arrays::testutil::assert_arrays_eq;

    fn list_of_i32(rows: &[&[i32]]) -> Array {
        let mut offsets = vec![0];
        let mut values = Vec::new();
        for row in rows {
            values.extend_from_slice(row);
            offsets.push(values.len() as i32);
        }
        Array::try_new_list(Array::from_iter(values), offsets).unwrap()
    }

    #[test]
    fn length_of_strings() {
        let input = Array::from_iter(["", "ab", "doris"]);
        let out = StringOrArrayToScalar::<LengthOp>::new()
            .execute(&[input], 3)
            .unwrap();

        assert_arrays_eq(&Array::from_iter([0_i64, 2, 5]), &out);
    }

    #[test]
    fn length_counts_bytes_char_length_counts_chars() {
        let input = Array::from_iter(["héllo", "日本"]);

        let bytes = StringOrArrayToScalar::<LengthOp>::new()
            .execute(&[input.clone()], 2)
            .unwrap();
        assert_arrays_eq(&Array::from_iter([6_i64, 6]), &bytes);

        let chars = StringOrArrayToScalar::<CharLengthOp>::new()
            .execute(&[input], 2)
            .unwrap();
        assert_arrays_eq(&Array::from_iter([5_i64, 2]), &chars);
    }

    #[test]
    fn length_of_arrays() {
        let input = list_of_i32(&[&[1, 2, 3], &[], &[4]]);
        let out = StringOrArrayToScalar::<LengthOp>::new()
            .execute(&[input], 3)
            .unwrap();

        assert_arrays_eq(&Array::from_iter([3_i64, 0, 1]), &out);
    }

    #[test]
    fn empty_and_not_empty() {
        let strings = Array::from_iter(["", "a"]);
        let lists = list_of_i32(&[&[1], &[]]);

        let out = StringOrArrayToScalar::<EmptyOp>::new()
            .execute(&[strings.clone()], 2)
            .unwrap();
        assert_arrays_eq(&Array::from_iter([1_u8, 0]), &out);

        let out = StringOrArrayToScalar::<NotEmptyOp>::new()
            .execute(&[strings], 2)
            .unwrap();
        assert_arrays_eq(&Array::from_iter([0_u8, 1]), &out);

        let out = StringOrArrayToScalar::<EmptyOp>::new()
            .execute(&[lists], 2)
            .unwrap();
        assert_arrays_eq(&Array::from_iter([0_u8, 1]), &out);
    }

    #[test]
    fn nulls_carried_over() {
        let input = Array::from_iter([Some("abc"), None, Some("")]);
        let out = StringOrArrayToScalar::<LengthOp>::new()
            .execute(&[input], 3)
            .unwrap();

        assert_arrays_eq(&Array::from_iter([Some(3_i64), None, Some(0)]), &out);
    }

    #[test]
    fn char_length_rejects_arrays() {
        let func = StringOrArrayToScalar::<CharLengthOp>::new();

        let err = func
            .return_type(&[DataType::list(DataType::Int32)])
            .unwrap_err();
        assert_eq!(ErrorKind::IllegalArgumentType, err.kind());

        let err = func
            .execute(&[list_of_i32(&[&[1]])], 1)
            .unwrap_err();
        assert_eq!(ErrorKind::IllegalColumn, err.kind());
    }

    #[test]
    fn numeric_column_rejected() {
        let func = StringOrArrayToScalar::<LengthOp>::new();

        let err = func.return_type(&[DataType::Int32]).unwrap_err();
        assert_eq!(ErrorKind::IllegalArgumentType, err.kind());

        let err = func.execute(&[Array::from_iter([1_i32])], 1).unwrap_err();
        assert_eq!(ErrorKind::IllegalColumn, err.kind());
        assert_eq!(
            "Illegal column ColumnVector of argument of function length",
            err.get_msg()
        );
    }

    #[test]
    fn wrong_argument_count() {
        let func = StringOrArrayToScalar::<LengthOp>::new();
        let a = Array::from_iter(["a"]);

        let err = func.execute(&[a.clone(), a], 1).unwrap_err();
        assert_eq!(ErrorKind::ArgumentCountMismatch, err.kind());
        assert_eq!(
            "Number of arguments for function length doesn't match: passed 2, should be 1",
            err.get_msg()
        );
    }

    #[test]
    fn constant_argument() {
        let input = Array::new_constant(Array::from_iter(["doris"]), 4).unwrap();
        let out = StringOrArrayToScalar::<LengthOp>::new()
            .execute(&[input], 4)
            .unwrap();

        assert!(out.is_constant());
        assert_arrays_eq(&Array::from_iter([5_i64, 5, 5, 5]), &out);
    }

    /// Length with default constant handling turned off.
    #[derive(Debug)]
    struct RawLength;

    impl ScalarFunction for RawLength {
        fn name(&self) -> &'static str {
            "raw_length"
        }

        fn arity(&self) -> usize {
            1
        }

        fn return_type_impl(&self, inputs: &[DataType]) -> Result<DataType> {
            StringOrArrayToScalar::<LengthOp>::new().return_type_impl(inputs)
        }

        fn execute_impl(&self, inputs: &[Array], num_rows: usize) -> Result<Array> {
            StringOrArrayToScalar::<LengthOp>::new().execute_impl(inputs, num_rows)
        }

        fn use_default_implementation_for_constants(&self) -> bool {
            false
        }
    }

    #[test]
    fn constant_without_default_handling() {
        let input = Array::new_constant(Array::from_iter(["doris"]), 2).unwrap();
        let err = RawLength.execute(&[input], 2).unwrap_err();

        assert_eq!(ErrorKind::IllegalColumn, err.kind());
        assert_eq!(Some("ColumnConst"), err.get_field("column"));
    }
}
