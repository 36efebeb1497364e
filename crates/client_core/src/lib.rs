//! Client side of the paginated catalog: the HTTP page source and the list
//! controller that accumulates pages for a presentation layer.

pub mod config;
pub mod controller;
pub mod error;
pub mod projection;
pub mod remote;

pub use config::{load_settings, ClientSettings};
pub use controller::{ListEvent, ListSnapshot, LoadOutcome, LoadState, PaginatedListController};
pub use error::FetchError;
pub use projection::ListProjection;
pub use remote::{CatalogSource, PageResult, RemoteCatalogClient};
