//! Error types for order processing.

use crate::catalog::CatalogError;
use crate::model::ProductId;
use thiserror::Error;

/// Why an order was not confirmed. Every variant leaves catalog stock as it was before the
/// attempt.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("Order has no items")]
    EmptyOrder,

    #[error("Invalid quantity for product {}: must be at least 1", .0.0)]
    InvalidQuantity(ProductId),

    #[error("Product {} not found", .0.0)]
    UnknownProduct(ProductId),

    #[error("Insufficient stock for product {}", .0.0)]
    InsufficientStock(ProductId),

    #[error("{0}")]
    PaymentFailed(String),

    #[error("Order total overflows")]
    TotalOverflow,

    #[error("Catalog error: {0}")]
    Catalog(CatalogError),
}

impl OrderError {
    /// Short label for the `status` metric dimension.
    pub fn status(&self) -> &'static str {
        match self {
            OrderError::EmptyOrder => "empty_order",
            OrderError::InvalidQuantity(_) => "invalid_quantity",
            OrderError::UnknownProduct(_) => "unknown_product",
            OrderError::InsufficientStock(_) => "insufficient_stock",
            OrderError::PaymentFailed(_) => "payment_failed",
            OrderError::TotalOverflow => "total_overflow",
            OrderError::Catalog(_) => "catalog_error",
        }
    }
}

impl From<CatalogError> for OrderError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NotFound(id) => OrderError::UnknownProduct(id),
            CatalogError::InsufficientStock { product, .. } => OrderError::InsufficientStock(product),
            other => OrderError::Catalog(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_shop_wording() {
        assert_eq!(
            OrderError::UnknownProduct(ProductId(999)).to_string(),
            "Product 999 not found"
        );
        assert_eq!(
            OrderError::InsufficientStock(ProductId(2)).to_string(),
            "Insufficient stock for product 2"
        );
    }

    #[test]
    fn catalog_errors_convert() {
        let err: OrderError = CatalogError::InsufficientStock {
            product: ProductId(1),
            requested: 5,
            available: 1,
        }
        .into();
        assert_eq!(err, OrderError::InsufficientStock(ProductId(1)));
        assert_eq!(
            OrderError::from(CatalogError::NotFound(ProductId(4))),
            OrderError::UnknownProduct(ProductId(4))
        );
        assert_eq!(err.status(), "insufficient_stock");
    }
}
