//! # Order Processor
//!
//! Turns an [`Order`] into an [`OrderResult`] or an [`OrderError`]:
//!
//! ```text
//! Validating ──► Pricing ──► AwaitingPayment ──► Confirmed
//!     │             │               │
//!     └─────────────┴───────────────┴──────────► Failed
//! ```
//!
//! 1. **Validating**: the order is non-empty, every quantity is positive, every product exists.
//!    Nothing is reserved until all of them check out.
//! 2. **Pricing**: the total is summed in cents, then each item is reserved in order. The first
//!    reservation that fails rolls back the ones already made.
//! 3. **AwaitingPayment**: the `order-payment` scenario set is run through the
//!    [`WorkloadSimulator`]; an injected fault rolls back every reservation.
//! 4. **Confirmed**: an order id is drawn and the reservations are committed.
//!
//! Dropping the future at any await point leaves stock as it was; see [`ReservationLedger`].
//!
//! The processor is a plain cloneable service, not an actor: orders wait for payment
//! concurrently, and only the individual reservations are serialized by the catalog actor.

mod error;
mod ledger;

pub use error::OrderError;
pub use ledger::ReservationLedger;

use crate::catalog::CatalogError;
use crate::clients::CatalogClient;
use crate::fault::OperationKind;
use crate::model::{Money, Order, OrderResult, OrderStage, OrderStatus, Product};
use crate::simulator::WorkloadSimulator;
use crate::telemetry::{ScopedSpan, SharedReporter};
use std::time::Instant;
use tracing::{debug, info, instrument, warn, Instrument};

/// Order ids are drawn uniformly from this inclusive range.
pub const ORDER_ID_RANGE: (u32, u32) = (1000, 9999);

#[derive(Debug, Clone)]
pub struct OrderProcessor {
    catalog: CatalogClient,
    simulator: WorkloadSimulator,
    reporter: SharedReporter,
}

impl OrderProcessor {
    /// Reports through the simulator's telemetry reporter.
    pub fn new(catalog: CatalogClient, simulator: WorkloadSimulator) -> Self {
        let reporter = simulator.reporter().clone();
        Self {
            catalog,
            simulator,
            reporter,
        }
    }

    #[instrument(skip_all, fields(items = order.items.len()))]
    pub async fn create_order(&self, order: Order) -> Result<OrderResult, OrderError> {
        debug!(?order, "create_order called");
        let started = Instant::now();

        let mut span = self.reporter.start_span("create_order");
        span.set_attribute("order.items_count", order.items.len());
        let scope = span.tracing_span().clone();

        let result = self.process(&order, &mut span).instrument(scope).await;

        let status = match &result {
            Ok(confirmed) => {
                stage(OrderStage::Confirmed);
                info!(
                    order_id = confirmed.order_id,
                    total = %confirmed.total_amount,
                    "Order confirmed"
                );
                "confirmed"
            }
            Err(e) => {
                span.mark_error();
                stage(OrderStage::Failed);
                warn!(error = %e, "Order failed");
                e.status()
            }
        };

        let labels = [("status", status.to_string())];
        self.reporter.increment_counter("orders_total", &labels);
        self.reporter.record_histogram(
            "order_duration_seconds",
            started.elapsed().as_secs_f64(),
            &labels,
        );
        result
    }

    async fn process(
        &self,
        order: &Order,
        span: &mut ScopedSpan,
    ) -> Result<OrderResult, OrderError> {
        stage(OrderStage::Validating);
        let lines = self.validate(order).await?;

        stage(OrderStage::Pricing);
        let total = lines
            .iter()
            .try_fold(Money::ZERO, |acc, (product, quantity)| {
                product
                    .price
                    .checked_mul(*quantity)
                    .and_then(|line| acc.checked_add(line))
            })
            .ok_or(OrderError::TotalOverflow)?;
        span.set_attribute("order.total_amount", total.as_decimal());

        let mut ledger = ReservationLedger::new(self.catalog.clone());
        for item in &order.items {
            if let Err(e) = ledger.reserve(item.product_id, item.quantity).await {
                debug!(product = %item.product_id, error = %e, "Reservation failed");
                ledger.rollback().await;
                return Err(e.into());
            }
        }

        stage(OrderStage::AwaitingPayment);
        if let Err(fault) = self.simulator.run(OperationKind::OrderPayment).await {
            ledger.rollback().await;
            return Err(OrderError::PaymentFailed(fault.message));
        }

        // drawn before committing: nothing may suspend between the commit and the reply
        let order_id = self.draw_order_id().await;
        ledger.commit();
        span.set_attribute("order.id", order_id);

        Ok(OrderResult {
            order_id,
            total_amount: total,
            status: OrderStatus::Confirmed,
        })
    }

    /// Resolves every item before anything is reserved.
    async fn validate(&self, order: &Order) -> Result<Vec<(Product, u32)>, OrderError> {
        if order.items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        if let Some(item) = order.items.iter().find(|item| item.quantity == 0) {
            return Err(OrderError::InvalidQuantity(item.product_id));
        }

        let mut lines = Vec::with_capacity(order.items.len());
        for item in &order.items {
            let product = self
                .catalog
                .get_product(item.product_id)
                .await
                .map_err(|e| match e {
                    CatalogError::NotFound(id) => OrderError::UnknownProduct(id),
                    other => OrderError::Catalog(other),
                })?;
            lines.push((product, item.quantity));
        }
        Ok(lines)
    }

    async fn draw_order_id(&self) -> u32 {
        let (low, high) = ORDER_ID_RANGE;
        let span = f64::from(high - low + 1);
        let unit = self.simulator.entropy().next_unit().await;
        low + ((unit * span) as u32).min(high - low)
    }
}

fn stage(stage: OrderStage) {
    debug!(%stage, "Order stage");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::fault::{FaultProfile, ScriptedEntropy, SharedEntropy};
    use crate::model::{OrderItem, ProductId};
    use crate::simulator::RecordingSleeper;
    use crate::telemetry::{AttributeValue, RecordingReporter};
    use std::sync::Arc;

    struct Fixture {
        processor: OrderProcessor,
        catalog: CatalogClient,
        reporter: RecordingReporter,
        sleeper: RecordingSleeper,
    }

    async fn fixture(profile: FaultProfile, entropy: ScriptedEntropy) -> Fixture {
        let (actor, client) = catalog::new(16);
        tokio::spawn(actor.run(()));
        let catalog = CatalogClient::new(client);
        catalog.seed(catalog::default_products()).await.unwrap();

        let reporter = RecordingReporter::new();
        let sleeper = RecordingSleeper::new();
        let simulator = WorkloadSimulator::new(
            profile,
            SharedEntropy::new(entropy),
            Arc::new(sleeper.clone()),
            Arc::new(reporter.clone()),
        );
        Fixture {
            processor: OrderProcessor::new(catalog.clone(), simulator),
            catalog,
            reporter,
            sleeper,
        }
    }

    fn payment(scenario: &str) -> f64 {
        FaultProfile::default()
            .scenarios(OperationKind::OrderPayment)
            .selector_for(scenario)
            .unwrap()
    }

    #[tokio::test]
    async fn confirmed_order_prices_in_cents_and_takes_stock() {
        // payment scenario, payment delay, order id
        let entropy = ScriptedEntropy::new([payment("success"), 0.5, 0.0]);
        let fx = fixture(FaultProfile::default(), entropy).await;

        let result = fx
            .processor
            .create_order(Order::single(2, 10))
            .await
            .unwrap();

        assert_eq!(result.order_id, 1000);
        assert_eq!(result.total_amount, Money::from_cents(29_990));
        assert_eq!(result.total_amount.to_string(), "299.90");
        assert_eq!(result.status, OrderStatus::Confirmed);
        assert_eq!(fx.catalog.check_stock(ProductId(2)).await.unwrap(), 40);
        assert_eq!(fx.sleeper.durations().len(), 1);

        assert_eq!(fx.reporter.counter("orders_total", &[("status", "confirmed")]), 1);
        let spans = fx.reporter.spans_named("create_order");
        assert_eq!(spans.len(), 1);
        assert!(!spans[0].error);
        assert_eq!(
            spans[0].attribute("order.id"),
            Some(&AttributeValue::Int(1000))
        );
    }

    #[tokio::test]
    async fn order_id_stays_in_range() {
        let fx = fixture(FaultProfile::quiet(), ScriptedEntropy::new([0.0, 0.999_999_9])).await;

        let result = fx.processor.create_order(Order::single(1, 1)).await.unwrap();

        assert_eq!(result.order_id, 9999);
    }

    #[tokio::test]
    async fn payment_failure_restores_stock() {
        let entropy = ScriptedEntropy::new([payment("failure"), 0.0]);
        let fx = fixture(FaultProfile::default(), entropy).await;

        let order = Order::new(vec![OrderItem::new(1, 2), OrderItem::new(3, 5)]);
        let err = fx.processor.create_order(order).await.unwrap_err();

        assert_eq!(err, OrderError::PaymentFailed("Payment processing failed".into()));
        assert_eq!(fx.catalog.check_stock(ProductId(1)).await.unwrap(), 10);
        assert_eq!(fx.catalog.check_stock(ProductId(3)).await.unwrap(), 25);
        assert_eq!(
            fx.reporter.counter("orders_total", &[("status", "payment_failed")]),
            1
        );
        assert!(fx.reporter.spans_named("create_order")[0].error);
    }

    #[tokio::test]
    async fn unknown_product_reserves_nothing() {
        let fx = fixture(FaultProfile::quiet(), ScriptedEntropy::default()).await;

        let order = Order::new(vec![OrderItem::new(1, 1), OrderItem::new(999, 1)]);
        let err = fx.processor.create_order(order).await.unwrap_err();

        assert_eq!(err, OrderError::UnknownProduct(ProductId(999)));
        assert_eq!(fx.catalog.check_stock(ProductId(1)).await.unwrap(), 10);
        assert!(fx.sleeper.durations().is_empty());
    }

    #[tokio::test]
    async fn insufficient_stock_on_later_item_rolls_back_earlier_ones() {
        let fx = fixture(FaultProfile::quiet(), ScriptedEntropy::default()).await;

        let order = Order::new(vec![
            OrderItem::new(2, 5),
            OrderItem::new(3, 5),
            OrderItem::new(1, 11),
        ]);
        let err = fx.processor.create_order(order).await.unwrap_err();

        assert_eq!(err, OrderError::InsufficientStock(ProductId(1)));
        assert_eq!(fx.catalog.check_stock(ProductId(2)).await.unwrap(), 50);
        assert_eq!(fx.catalog.check_stock(ProductId(3)).await.unwrap(), 25);
        assert_eq!(fx.catalog.check_stock(ProductId(1)).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn invalid_orders_fail_validation() {
        let fx = fixture(FaultProfile::quiet(), ScriptedEntropy::default()).await;

        assert_eq!(
            fx.processor.create_order(Order::new(vec![])).await,
            Err(OrderError::EmptyOrder)
        );
        assert_eq!(
            fx.processor.create_order(Order::single(4, 0)).await,
            Err(OrderError::InvalidQuantity(ProductId(4)))
        );
        assert_eq!(fx.catalog.check_stock(ProductId(4)).await.unwrap(), 15);
    }

    #[tokio::test]
    async fn catalog_mock_unreachable_maps_to_catalog_error() {
        use actor_framework::mock::{create_mock_client, expect_get};
        use actor_framework::FrameworkError;

        let (client, mut receiver) = create_mock_client::<Product>(4);
        let catalog = CatalogClient::new(client);
        let simulator = WorkloadSimulator::new(
            FaultProfile::quiet(),
            SharedEntropy::new(ScriptedEntropy::default()),
            Arc::new(RecordingSleeper::new()),
            Arc::new(RecordingReporter::new()),
        );
        let processor = OrderProcessor::new(catalog, simulator);

        let responder = tokio::spawn(async move {
            let (id, respond_to) = expect_get(&mut receiver).await.unwrap();
            assert_eq!(id, ProductId(7));
            respond_to.send(Err(FrameworkError::ActorClosed)).unwrap();
        });

        let err = processor.create_order(Order::single(7, 1)).await.unwrap_err();
        responder.await.unwrap();

        assert!(matches!(err, OrderError::Catalog(CatalogError::ActorCommunication(_))));
    }
}
