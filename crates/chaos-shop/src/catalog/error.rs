//! Error types for the catalog actor.

use crate::model::ProductId;
use thiserror::Error;

/// Errors that can occur during catalog operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CatalogError {
    /// The requested product was not found.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// The requested quantity exceeds the available stock.
    #[error("Insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: ProductId,
        requested: u32,
        available: u32,
    },

    /// Zero is never a valid quantity to reserve.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// Rejected at creation (e.g. an empty name).
    #[error("Invalid product: {0}")]
    InvalidProduct(String),

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {0}")]
    ActorCommunication(String),
}
