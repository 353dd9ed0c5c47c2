//! # kampus-shared
//!
//! Domain vocabulary shared by the store and the server: typed enums for every
//! enumerated column, input limits, and the pure functions behind derived
//! attributes (rating summaries, trust score, pagination).

pub mod constants;
pub mod error;
pub mod pagination;
pub mod rating;
pub mod trust;
pub mod types;

pub use error::ValidationError;
