//! # System Lifecycle & Orchestration
//!
//! [`ShopSystem`] starts the catalog actor, seeds it, wires the simulator and the order
//! processor to it, and hands out a cloneable [`Shop`] facade with the four boundary
//! operations.
//!
//! ```rust
//! use chaos_shop::fault::FaultProfile;
//! use chaos_shop::lifecycle::ShopSystem;
//! use chaos_shop::model::{Order, ProductId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let system = ShopSystem::builder()
//!         .profile(FaultProfile::quiet())
//!         .seed(7)
//!         .start()
//!         .await?;
//!
//!     let shop = system.shop();
//!     let confirmed = shop.create_order(Order::single(2, 10)).await?;
//!     assert_eq!(confirmed.total_amount.to_string(), "299.90");
//!     assert_eq!(shop.get_product(ProductId(2)).await?.stock, 40);
//!
//!     drop(shop);
//!     system.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Wiring
//!
//! ```text
//!             ┌──────────── Shop (Clone) ────────────┐
//!             │                                       │
//!   list/get  │   create_order          chaos_probe   │
//!      │      │        │                     │        │
//!      ▼      │        ▼                     ▼        │
//!  Simulator ─┼─► OrderProcessor ──► WorkloadSimulator│
//!      │      │        │                              │
//!      ▼      │        ▼                              │
//!   CatalogClient ──► catalog actor (ResourceActor<Product>)
//! ```
//!
//! Only the catalog is an actor. Simulated delays run in the caller's task, so a slow payment
//! never holds up another order's reservation.
//!
//! ## Graceful Shutdown
//!
//! 1. Drop every client: [`ShopSystem::shutdown`] consumes the system's own [`Shop`]; clones
//!    handed out earlier must be dropped by their owners.
//! 2. The catalog actor sees its channel close, logs its final store size and exits.
//! 3. The actor task is awaited, bounded by a timeout so a leaked clone cannot hang the process.

mod shop;
mod shop_system;

pub use shop::{ChaosReport, Shop};
pub use shop_system::{LifecycleError, ShopSystem, ShopSystemBuilder, DEFAULT_SHUTDOWN_TIMEOUT};
