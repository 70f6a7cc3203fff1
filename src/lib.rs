//! gameshelf: a personal video game library backed by Wikidata and Wikipedia.
//!
//! Search lives in the `gameshelf-search` crate; this crate adds the local
//! side:
//! - **Config**: [`ShelfConfig`] loaded from `config.toml`
//! - **Store**: [`GameStore`] persisting games and collections to `library.json`
//! - **Directories**: [`shelf_dirs`] resolving platform data/config paths
//!
//! The `gameshelf` binary wires these to a command line.

pub mod config;
pub mod error;
pub mod shelf_dirs;
pub mod store;

pub use config::{SearchSection, ShelfConfig, StoreSection};
pub use error::{Result, ShelfError};
pub use gameshelf_search as search;
pub use store::{Collection, GameEntry, GameStore, Library, PlayStatus, UserData};
