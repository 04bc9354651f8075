//! Data transfer objects for the application layer.

mod processed_result;

pub use processed_result::ProcessedResult;
