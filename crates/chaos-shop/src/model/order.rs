//! Orders are transient: built by the caller, validated and priced by the
//! [`OrderProcessor`](crate::orders::OrderProcessor), and discarded once the call returns.

use crate::model::{Money, ProductId};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// One line of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl OrderItem {
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseOrderItemError {
    #[error("expected <product_id>:<quantity>, got {0:?}")]
    Format(String),
    #[error("invalid number in {0:?}")]
    Number(String),
}

/// Parses `"2:10"` as ten units of product 2.
impl FromStr for OrderItem {
    type Err = ParseOrderItemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, quantity) = s
            .split_once(':')
            .ok_or_else(|| ParseOrderItemError::Format(s.to_string()))?;
        let id: u32 = id
            .trim()
            .parse()
            .map_err(|_| ParseOrderItemError::Number(s.to_string()))?;
        let quantity: u32 = quantity
            .trim()
            .parse()
            .map_err(|_| ParseOrderItemError::Number(s.to_string()))?;
        Ok(Self::new(id, quantity))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Order {
    pub items: Vec<OrderItem>,
}

impl Order {
    pub fn new(items: Vec<OrderItem>) -> Self {
        Self { items }
    }

    /// An order for a single product.
    pub fn single(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self::new(vec![OrderItem::new(product_id, quantity)])
    }
}

/// Only confirmed orders produce an [`OrderResult`]; failures are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Confirmed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderResult {
    pub order_id: u32,
    pub total_amount: Money,
    pub status: OrderStatus,
}

/// Where an order attempt currently is. Logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStage {
    Validating,
    Pricing,
    AwaitingPayment,
    Confirmed,
    Failed,
}

impl Display for OrderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OrderStage::Validating => "validating",
            OrderStage::Pricing => "pricing",
            OrderStage::AwaitingPayment => "awaiting_payment",
            OrderStage::Confirmed => "confirmed",
            OrderStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_order_item() {
        let item: OrderItem = "2:10".parse().unwrap();
        assert_eq!(item, OrderItem::new(2, 10));
        assert_eq!(
            "2".parse::<OrderItem>(),
            Err(ParseOrderItemError::Format("2".into()))
        );
        assert_eq!(
            "x:1".parse::<OrderItem>(),
            Err(ParseOrderItemError::Number("x:1".into()))
        );
    }

    #[test]
    fn order_result_json_shape() {
        let result = OrderResult {
            order_id: 4242,
            total_amount: Money::from_cents(29_990),
            status: OrderStatus::Confirmed,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["order_id"], 4242);
        assert_eq!(json["status"], "confirmed");
        assert_eq!(json["total_amount"], 299.9);
    }
}
