pub mod engine;
pub mod util;
pub mod error;

pub use crate::engine::sst::{TableBuilder, TableReader, TableSummary};
pub use crate::error::DBError;
pub use crate::util::TableOptions;
