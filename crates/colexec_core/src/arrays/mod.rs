pub mod array;
pub mod bitmap;
pub mod block;
pub mod compute;
pub mod datatype;
pub mod executor;
pub mod scalar;
pub mod schema;
pub mod testutil;
