//! Metadata source implementations.
//!
//! Each source queries one knowledge base and normalizes its answer into
//! [`crate::Candidate`] values.

pub mod images;
pub mod infobox;
pub mod stores;
pub mod wikidata;
pub mod wikipedia;

pub use wikidata::WikidataSource;
pub use wikipedia::WikipediaSource;
