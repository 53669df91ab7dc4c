//! # chaos-shop
//!
//! Runs a freshly seeded shop in process and drives it:
//!
//! ```bash
//! chaos-shop load --users 20 --iterations 50     # replay the checkout journey
//! chaos-shop --seed 42 order 2:10 4:1            # one order
//! chaos-shop --metrics-address 127.0.0.1:9000 chaos
//! ```
//!
//! The exit code is non-zero when a load run misses a threshold or a single operation fails.

use anyhow::{Context, Result};
use chaos_shop::config::ShopConfig;
use chaos_shop::lifecycle::{ShopSystem, ShopSystemBuilder};
use chaos_shop::load::LoadDriver;
use chaos_shop::model::{Order, OrderItem, ProductId};
use chaos_shop::simulator::TokioSleeper;
use chaos_shop::telemetry::{init_metrics_exporter, setup_tracing, LogFormat};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, Instrument};

#[derive(Parser)]
#[command(
    name = "chaos-shop",
    about = "Demo shop with synthetic latency, failures and memory spikes",
    version
)]
struct Cli {
    /// TOML config file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed every random choice
    #[arg(long)]
    seed: Option<u64>,

    /// Serve Prometheus metrics on this address
    #[arg(long)]
    metrics_address: Option<SocketAddr>,

    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay the checkout-latency journey with concurrent virtual users
    Load {
        #[arg(long)]
        users: Option<usize>,
        #[arg(long)]
        iterations: Option<usize>,
        /// Also print the summary as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// List the catalog
    Products,
    /// Show one product
    Product { id: u32 },
    /// Place an order, e.g. `order 2:10 4:1`
    Order {
        #[arg(required = true, value_name = "ID:QTY")]
        items: Vec<OrderItem>,
    },
    /// Hit the chaos probe once
    Chaos,
}

impl Cli {
    fn config(&self) -> Result<ShopConfig> {
        let mut config = match &self.config {
            Some(path) => ShopConfig::load(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => ShopConfig::default(),
        };

        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.metrics_address.is_some() {
            config.telemetry.metrics_address = self.metrics_address;
        }
        if let Some(format) = self.log_format {
            config.telemetry.log_format = format;
        }
        if let Command::Load {
            users, iterations, ..
        } = &self.command
        {
            if let Some(users) = users {
                config.load.virtual_users = *users;
            }
            if let Some(iterations) = iterations {
                config.load.iterations = *iterations;
            }
        }

        config.validate().context("applying command line overrides")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli.config()?;

    setup_tracing(config.telemetry.log_format)?;
    if let Some(addr) = config.telemetry.metrics_address {
        init_metrics_exporter(addr)?;
    }

    let system = ShopSystemBuilder::from_config(&config)?
        .start()
        .await
        .context("starting shop")?;

    let span = tracing::info_span!("command");
    let succeeded = run(&cli.command, &config, &system).instrument(span).await?;

    system.shutdown().await.context("shutting down shop")?;

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn run(command: &Command, config: &ShopConfig, system: &ShopSystem) -> Result<bool> {
    let shop = system.shop();
    match command {
        Command::Load { json, .. } => {
            let product_count = u32::try_from(system.product_ids().len())
                .context("too many products for the load driver")?;
            let driver = LoadDriver::new(
                shop,
                config.load.clone(),
                product_count,
                Arc::new(TokioSleeper),
            )
            .with_seed(config.seed);

            let summary = driver.run().await;
            for (operation, stats) in &summary.operations {
                info!(
                    operation,
                    attempts = stats.attempts,
                    failures = stats.failures,
                    p95_ms = stats.p95_ms,
                    "Operation summary"
                );
            }
            if *json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
            if !summary.error_rate_ok {
                error!(
                    error_rate = summary.error_rate,
                    max = config.load.max_error_rate,
                    "Error rate threshold missed"
                );
            }
            if !summary.latency_ok {
                error!(
                    p95_ms = summary.p95_ms,
                    max = config.load.max_p95_ms,
                    "Latency threshold missed"
                );
            }
            Ok(summary.passed())
        }
        Command::Products => report(shop.list_products().await, |products| {
            for product in products {
                info!(
                    id = %product.id,
                    name = %product.name,
                    price = %product.price,
                    stock = product.stock,
                    "Product"
                );
            }
        }),
        Command::Product { id } => report(shop.get_product(ProductId(*id)).await, |product| {
            info!(
                id = %product.id,
                name = %product.name,
                price = %product.price,
                stock = product.stock,
                "Product"
            );
        }),
        Command::Order { items } => {
            let order = Order::new(items.clone());
            report(shop.create_order(order).await, |result| {
                info!(
                    order_id = result.order_id,
                    total = %result.total_amount,
                    "Order confirmed"
                );
            })
        }
        Command::Chaos => report(shop.chaos_probe().await, |chaos| {
            info!(
                scenario = %chaos.scenario,
                message = %chaos.message,
                delay_ms = chaos.delay_ms,
                "Chaos probe"
            );
        }),
    }
}

/// Logs the outcome of a single operation; domain failures are reported, not propagated.
fn report<T>(
    result: Result<T, chaos_shop::ShopError>,
    on_ok: impl FnOnce(&T),
) -> Result<bool> {
    match result {
        Ok(value) => {
            on_ok(&value);
            Ok(true)
        }
        Err(e) => {
            error!(error = %e, class = ?e.class(), "Operation failed");
            Ok(false)
        }
    }
}
