//! In-memory tab cache, ranked search over it, and the safety-gated close
//! coordinator.

pub mod cache;
pub mod close;
pub mod search;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheStatus, TabCache};
pub use close::{
    close_bulk, close_single, ensure_close_supported, BulkCloseOutcome, BulkCloseRequest,
    BulkCloseResult, CloseStatus, CloseTabRequest, Targets,
};
pub use search::{search, SearchOutcome, SearchQuery, SearchResult};
