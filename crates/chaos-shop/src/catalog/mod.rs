//! # Catalog Store
//!
//! The product catalog is one [`ResourceActor<Product>`](actor_framework::ResourceActor) that
//! owns every product record. Reads return snapshots; stock only changes through the
//! [`CatalogAction`]s, each handled as a single message.
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](actor_framework::ActorEntity) implementation for [`Product`]
//! - [`error`] - [`CatalogError`]
//! - [`actions`] - [`CatalogAction`] and [`CatalogActionResult`]
//! - [`new()`] - Factory function that creates the actor and client
//!
//! ## Usage
//!
//! ```rust
//! use chaos_shop::catalog;
//! use chaos_shop::clients::CatalogClient;
//! use chaos_shop::model::{Money, ProductCreate};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (actor, generic_client) = catalog::new(32);
//!     let client = CatalogClient::new(generic_client);
//!     tokio::spawn(actor.run(()));
//!
//!     let id = client
//!         .create_product(ProductCreate::new("Widget", Money::from_decimal(29.99)?, 100))
//!         .await?;
//!
//!     assert_eq!(client.reserve(id, 5).await?, 95);
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::model::{Money, Product, ProductCreate};
use actor_framework::{ResourceActor, ResourceClient};

/// Creates a new catalog actor and its client.
pub fn new(buffer_size: usize) -> (ResourceActor<Product>, ResourceClient<Product>) {
    ResourceActor::new(buffer_size)
}

/// The demo shop's starting inventory; seeded in this order it gets IDs 1 to 4.
pub fn default_products() -> Vec<ProductCreate> {
    vec![
        ProductCreate::new("Laptop", Money::from_cents(99_999), 10),
        ProductCreate::new("Mouse", Money::from_cents(2_999), 50),
        ProductCreate::new("Keyboard", Money::from_cents(7_999), 25),
        ProductCreate::new("Monitor", Money::from_cents(29_999), 15),
    ]
}
