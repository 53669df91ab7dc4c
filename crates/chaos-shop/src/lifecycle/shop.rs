use crate::clients::CatalogClient;
use crate::error::ShopError;
use crate::fault::OperationKind;
use crate::model::{Order, OrderResult, Product, ProductId};
use crate::orders::OrderProcessor;
use crate::simulator::WorkloadSimulator;
use crate::telemetry::SharedReporter;
use serde::Serialize;
use std::future::Future;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// What a successful chaos probe did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChaosReport {
    pub scenario: String,
    pub message: String,
    pub delay_ms: u64,
    pub spike_bytes: usize,
}

/// The shop's boundary operations. Cheap to clone; clones share the catalog actor.
///
/// Every call records `shop_requests_total{operation}` when it starts and
/// `shop_request_duration_seconds{operation,status}` when it finishes.
#[derive(Debug, Clone)]
pub struct Shop {
    catalog: CatalogClient,
    orders: OrderProcessor,
    simulator: WorkloadSimulator,
    reporter: SharedReporter,
}

impl Shop {
    pub(crate) fn new(catalog: CatalogClient, simulator: WorkloadSimulator) -> Self {
        let orders = OrderProcessor::new(catalog.clone(), simulator.clone());
        let reporter = simulator.reporter().clone();
        Self {
            catalog,
            orders,
            simulator,
            reporter,
        }
    }

    pub fn simulator(&self) -> &WorkloadSimulator {
        &self.simulator
    }

    /// Every product, ascending by id, as of the end of the simulated read latency.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, ShopError> {
        self.observe("list_products", async {
            self.simulator.run(OperationKind::CatalogList).await?;
            let products = self.catalog.list_products().await?;
            debug!(count = products.len(), "Products listed");
            Ok::<_, ShopError>(products)
        })
        .await
    }

    #[instrument(skip(self), fields(product = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, ShopError> {
        self.observe("get_product", async {
            self.simulator.run(OperationKind::CatalogRead).await?;
            Ok::<_, ShopError>(self.catalog.get_product(id).await?)
        })
        .await
    }

    #[instrument(skip_all)]
    pub async fn create_order(&self, order: Order) -> Result<OrderResult, ShopError> {
        self.observe("create_order", async {
            Ok::<_, ShopError>(self.orders.create_order(order).await?)
        })
        .await
    }

    /// Draws and acts out one `chaos-probe` scenario.
    #[instrument(skip(self))]
    pub async fn chaos_probe(&self) -> Result<ChaosReport, ShopError> {
        self.observe("chaos_probe", async {
            let report = self.simulator.run(OperationKind::ChaosProbe).await?;
            info!(scenario = %report.scenario, "Chaos probe survived");
            Ok::<_, ShopError>(ChaosReport {
                scenario: report.scenario,
                message: report.message.unwrap_or_default(),
                delay_ms: u64::try_from(report.delay.as_millis()).unwrap_or(u64::MAX),
                spike_bytes: report.spike_bytes,
            })
        })
        .await
    }

    async fn observe<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, ShopError>>,
    ) -> Result<T, ShopError> {
        let started = Instant::now();
        self.reporter.increment_counter(
            "shop_requests_total",
            &[("operation", operation.to_string())],
        );

        let result = call.await;

        let status = match &result {
            Ok(_) => "ok",
            Err(e) => {
                warn!(operation, error = %e, "Request failed");
                e.status()
            }
        };
        self.reporter.record_histogram(
            "shop_request_duration_seconds",
            started.elapsed().as_secs_f64(),
            &[
                ("operation", operation.to_string()),
                ("status", status.to_string()),
            ],
        );
        result
    }
}
