//! Custom actions for the catalog actor.
//!
//! These are the only ways a [`Product`](crate::model::Product) changes after seeding. Each one
//! is a single actor message, so the stock check and the decrement in `Reserve` can never be
//! split by another request.

/// Stock operations on one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogAction {
    /// Reads the current stock level without modifying it.
    CheckStock,
    /// Takes `u32` units if at least that many are in stock.
    ///
    /// # Errors
    /// `InsufficientStock` if the request exceeds stock, `InvalidQuantity` for zero.
    Reserve(u32),
    /// Returns `u32` previously reserved units to stock.
    Release(u32),
}

/// Results from CatalogActions - variants match 1:1 with CatalogAction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogActionResult {
    /// Current stock level
    CheckStock(u32),
    /// Stock left after the reservation
    Reserve(u32),
    /// Stock after the release
    Release(u32),
}
