//! Collaborator interfaces: loading cubes and persisting results
//!
//! The stitching core never touches storage directly. It loads through a
//! [`CubeLoader`] and hands finished outputs to a [`Persistence`]. The
//! implementations here are small reference backends.

mod loader;
mod store;

pub use loader::{CubeLoader, JsonCubeLoader, LoadError, MemoryLoader};
pub use store::{JsonDirectoryStore, MemoryStore, PersistError, Persistence};
