//! Rewrite the header row of a CSV file from camelCase to snake_case while
//! copying every data row through unchanged.

pub mod config;
pub mod convert;
pub mod domain;
pub mod error;
mod raw_lines;

pub use config::{ConvertConfig, LineEnding};
pub use convert::{convert_file, convert_stream, ConvertOptions, ConvertSummary};
pub use domain::header::HeaderRenamer;
pub use domain::to_snake;
pub use error::{ConvertError, ConvertResult};
