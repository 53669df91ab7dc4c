//! Typed clients wrapping the generic `ResourceClient`s of this crate's actors.

mod catalog_client;

pub use catalog_client::CatalogClient;
