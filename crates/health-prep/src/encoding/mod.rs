//! Encoding of survey tables into model-ready columns.
//!
//! [`EncodingPipeline`] runs the stages in a fixed order over the
//! feature-type groups of a table:
//!
//! 1. Drop NOT_A_FEATURE columns
//! 2. Write the placeholder into missing cells
//! 3. Ordinal encoding (ORDINAL, BINARY)
//! 4. One-hot encoding (CATEGORICAL)
//! 5. Set missing cells to null
//! 6. Date encodings (DATE_EXPLODED, DATE_TIMESTAMP)
//! 7. Merge the groups and cast continuous columns to `Float64`
//!
//! Stages 3, 4 and 6 can be switched off with an
//! [`EncodeFilter`](crate::config::EncodeFilter).

mod dates;
mod fill;
mod one_hot;
mod ordinal;
mod pipeline;

pub use dates::{DateEncoder, parse_day_first};
pub use fill::{post_fill, pre_fill};
pub use one_hot::OneHotEncoder;
pub use ordinal::{EncodedColumn, OrdinalEncoder};
pub use pipeline::{EncodeOptions, EncodingPipeline};
