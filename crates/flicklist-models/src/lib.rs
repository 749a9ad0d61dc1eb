pub mod activity;
pub mod index;
pub mod media;
pub mod partition;

pub use activity::{ActivitySnapshot, ListActivity, MediaActivity, FALLBACK_TIMESTAMP};
pub use index::{ProgressRow, WatchedRow};
pub use media::{ListKind, MediaKind};
pub use partition::PartitionKey;
