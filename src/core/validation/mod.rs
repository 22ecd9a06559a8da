//! Input validation
//!
//! Request payloads are explicit typed structs validated with `validator`
//! derives plus a few custom field validators. Validation happens before
//! anything reaches the aggregator or the print layout.

pub mod extractor;
pub mod filters;
pub mod input;
pub mod validators;

pub use extractor::{CheckedInput, ValidJson};
pub use input::{MaterialInput, OrderInput, OrderLineInput};
