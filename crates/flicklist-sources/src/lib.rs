pub mod api;
pub mod client;
pub mod error;
pub mod paginated;

pub use api::{FlickListApi, UserProfile};
pub use client::FlickListClient;
pub use error::TransportError;
pub use paginated::PaginatedResult;
