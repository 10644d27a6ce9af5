//! Music collection: track model, populators and persistence.
//!
//! A `Collection` owns its tracks and is built in one shot by one of the
//! populators: a recursive directory scan, a remote library fetch, or a
//! saved snapshot. Playlists borrow tracks from here via `Arc`.

mod collection;
mod model;
mod remote;
mod scan;
mod snapshot;
mod tags;

pub use collection::Collection;
pub use model::{Track, file_uri};
pub use remote::{RemoteClient, RemoteError, RemoteTrack};
pub use snapshot::SnapshotError;
pub use tags::{FileTags, TagError, read_tags};

#[cfg(test)]
mod tests;
