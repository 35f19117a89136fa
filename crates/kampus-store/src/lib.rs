//! Academic record access for the chat engine.
//!
//! [`DomainQuery`] is the read-only seam the handlers call. [`MemoryStore`]
//! answers it from a JSON [`Dataset`]; with the `duckdb` feature,
//! [`DuckStore`] answers it in SQL.

pub mod dataset;
mod error;
mod memory;
mod query;

pub use dataset::Dataset;
pub use error::StoreError;
pub use memory::MemoryStore;
pub use query::DomainQuery;

#[cfg(feature = "duckdb")]
mod duck;
#[cfg(feature = "duckdb")]
pub use duck::DuckStore;
