//! # Configuration
//!
//! ```text
//! chaos-shop.toml
//!     → loader.rs      (read + deserialize)
//!     → validation.rs  (semantic checks, every problem collected)
//!     → ShopConfig     (validated)
//!     → CLI overrides  (--seed, --metrics-address, --users, ...)
//! ```
//!
//! Every section is optional; an empty file gives the original demo shop: the four default
//! products, the original latencies and fault rates, compact logs, no metrics listener.
//!
//! ```toml
//! seed = 42
//!
//! [catalog]
//! actor_buffer = 64
//! products = [
//!     { name = "Laptop", price = 999.99, stock = 10 },
//!     { name = "Mouse", price = 29.99, stock = 50 },
//! ]
//!
//! [scenarios]
//! order_payment = [
//!     { name = "success", weight = 0.8, delay = { min_ms = 100, max_ms = 300 } },
//!     { name = "declined", weight = 0.2, effect = { type = "fail", category = "payment" },
//!       message = "Card declined" },
//! ]
//!
//! [telemetry]
//! log_format = "json"
//! metrics_address = "127.0.0.1:9000"
//!
//! [load]
//! virtual_users = 20
//! iterations = 50
//! ```

mod loader;
mod schema;
mod validation;

pub use loader::ConfigError;
pub use schema::*;
pub use validation::{validate_config, ValidationError};
