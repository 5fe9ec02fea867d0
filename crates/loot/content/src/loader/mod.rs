//! File loaders: batch table directories and tag catalogues.

mod tables;
mod tags;

pub use tables::{TableRegistry, load_tables};
pub use tags::load_tags;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;
