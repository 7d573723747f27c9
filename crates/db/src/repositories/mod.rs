//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async read methods that
//! accept `&SqlitePool` as the first argument. Table names come from a
//! [`TableSet`](crate::schema::TableSet) and are never user input.

pub mod concatenation_repo;
pub mod metadata_repo;
pub mod navigation_repo;
pub mod tracking_repo;

pub use concatenation_repo::ConcatenationRepo;
pub use metadata_repo::MetadataRepo;
pub use navigation_repo::NavigationRepo;
pub use tracking_repo::TrackingRepo;
