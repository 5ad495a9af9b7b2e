mod common;
pub use self::common::Query;
mod summary;
pub use self::summary::{SummaryModule, SummaryQuery};
