pub mod cache;
pub mod compare;
pub mod dispatch;
pub mod host;
pub mod index;
pub mod plan;
pub mod sync;
pub mod transform;

#[cfg(test)]
mod testing;

pub use cache::{fetch_cached, CacheStore, FileCacheStore};
pub use compare::is_newer;
pub use dispatch::{DispatchSummary, RefreshDispatcher};
pub use host::{Host, LogHost};
pub use index::{FileIndexStore, IndexStore};
pub use plan::{plan_actions, ActionPlan, SyncAction};
pub use sync::{ActivitySync, SyncOutcome, SyncReport};
