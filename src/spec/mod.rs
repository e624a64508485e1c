//! API document loading, `$ref` resolution and endpoint grouping.
mod build;
mod load;
mod resolve;
mod types;

pub use build::*;
pub use load::*;
pub use resolve::*;
pub use types::*;
