//! In-memory PDF page concatenation.
//!
//! Takes named PDF byte streams in caller order and produces one document
//! whose pages are the inputs' pages in that order, each input's internal
//! page order preserved. No filesystem access; the merge service feeds this
//! from object storage.

mod concat;
mod error;

pub use concat::{concat, ConcatStats};
pub use error::{MergeError, Result};
