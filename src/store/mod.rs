//! Local persistence: small JSON records in a key-value store, photos in a
//! separate blob store.

pub mod blob;
pub mod kv;

pub use blob::{BlobStore, FileBlobStore};
pub use kv::{get_json, set_json, try_get_json, JsonFileStore, KeyValueStore};
