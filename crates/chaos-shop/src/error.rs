//! Errors returned by the [`Shop`](crate::lifecycle::Shop) boundary operations.

use crate::catalog::CatalogError;
use crate::model::ProductId;
use crate::orders::OrderError;
use crate::simulator::InjectedFault;
use thiserror::Error;

/// How a transport in front of the shop should classify a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    NotFound,
    Client,
    Server,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ShopError {
    #[error("Product {} not found", .0.0)]
    NotFound(ProductId),

    #[error("Product {} not found", .0.0)]
    UnknownProduct(ProductId),

    #[error("Insufficient stock for product {}", .0.0)]
    InsufficientStock(ProductId),

    #[error("{0}")]
    PaymentFailed(String),

    #[error("{0}")]
    InternalFault(InjectedFault),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl ShopError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ShopError::NotFound(_) => ErrorClass::NotFound,
            ShopError::UnknownProduct(_)
            | ShopError::InsufficientStock(_)
            | ShopError::InvalidOrder(_) => ErrorClass::Client,
            ShopError::PaymentFailed(_)
            | ShopError::InternalFault(_)
            | ShopError::Unavailable(_) => ErrorClass::Server,
        }
    }

    /// Short label for the `status` metric dimension.
    pub fn status(&self) -> &'static str {
        match self {
            ShopError::NotFound(_) => "not_found",
            ShopError::UnknownProduct(_) => "unknown_product",
            ShopError::InsufficientStock(_) => "insufficient_stock",
            ShopError::PaymentFailed(_) => "payment_failed",
            ShopError::InternalFault(_) => "internal_fault",
            ShopError::InvalidOrder(_) => "invalid_order",
            ShopError::Unavailable(_) => "unavailable",
        }
    }
}

impl From<CatalogError> for ShopError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NotFound(id) => ShopError::NotFound(id),
            CatalogError::InsufficientStock { product, .. } => ShopError::InsufficientStock(product),
            CatalogError::InvalidQuantity(_) | CatalogError::InvalidProduct(_) => {
                ShopError::InvalidOrder(e.to_string())
            }
            CatalogError::ActorCommunication(msg) => ShopError::Unavailable(msg),
        }
    }
}

impl From<OrderError> for ShopError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::UnknownProduct(id) => ShopError::UnknownProduct(id),
            OrderError::InsufficientStock(id) => ShopError::InsufficientStock(id),
            OrderError::PaymentFailed(msg) => ShopError::PaymentFailed(msg),
            OrderError::EmptyOrder
            | OrderError::InvalidQuantity(_)
            | OrderError::TotalOverflow => ShopError::InvalidOrder(e.to_string()),
            OrderError::Catalog(inner) => match ShopError::from(inner) {
                // the product resolved during validation, so a miss here is the catalog's fault
                ShopError::NotFound(id) => ShopError::UnknownProduct(id),
                other => other,
            },
        }
    }
}

impl From<InjectedFault> for ShopError {
    fn from(fault: InjectedFault) -> Self {
        ShopError::InternalFault(fault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::{FaultCategory, OperationKind, Severity};

    #[test]
    fn classes() {
        assert_eq!(ShopError::NotFound(ProductId(1)).class(), ErrorClass::NotFound);
        assert_eq!(
            ShopError::from(OrderError::EmptyOrder).class(),
            ErrorClass::Client
        );
        assert_eq!(
            ShopError::from(OrderError::PaymentFailed("declined".into())).class(),
            ErrorClass::Server
        );
    }

    #[test]
    fn order_errors_keep_their_product() {
        assert_eq!(
            ShopError::from(OrderError::UnknownProduct(ProductId(999))),
            ShopError::UnknownProduct(ProductId(999))
        );
        assert_eq!(
            ShopError::from(OrderError::Catalog(CatalogError::ActorCommunication(
                "closed".into()
            ))),
            ShopError::Unavailable("closed".into())
        );
    }

    #[test]
    fn injected_fault_displays_its_message_first() {
        let err = ShopError::from(InjectedFault {
            operation: OperationKind::ChaosProbe,
            scenario: "error".into(),
            category: FaultCategory::Internal,
            severity: Severity::Error,
            message: "Simulated server error".into(),
        });
        assert!(err.to_string().starts_with("Simulated server error"));
        assert_eq!(err.status(), "internal_fault");
    }
}
