//! # Actor Framework
//!
//! Building blocks for type-safe resource actors on Tokio. Each resource type (a catalog of
//! products, say) is owned by exactly one [`ResourceActor`] task; everything else talks to it
//! through a cloneable [`ResourceClient`] by message passing.
//!
//! ## Why actors for a resource store?
//!
//! - **Isolated state**: the store lives inside one task, so there are no locks to get wrong
//! - **Sequential processing**: an action runs to completion before the next request is looked
//!   at, which makes "check, then modify" operations indivisible
//! - **Uniform surface**: every resource gets the same Create / Get / List / Action vocabulary
//!
//! **Further Reading**:
//! - [Actor Model (Wikipedia)](https://en.wikipedia.org/wiki/Actor_model)
//! - [Actors in Rust](https://ryhl.io/blog/actors-with-tokio/) - Practical guide to implementing actors with Tokio
//!
//! ## Architecture Overview
//!
//! 1. **Entity Layer** ([`ActorEntity`]) - your domain model and its actions
//! 2. **Runtime Layer** ([`ResourceActor`]) - message processing and ID allocation
//! 3. **Interface Layer** ([`ResourceClient`], [`ActorClient`]) - typed request/response calls
//!
//! ```rust
//! use actor_framework::{ActorEntity, FrameworkError, ResourceActor};
//! use async_trait::async_trait;
//!
//! #[derive(Clone, Debug)]
//! struct Counter {
//!     id: u32,
//!     value: u64,
//! }
//!
//! #[derive(Debug)] struct CounterCreate { start: u64 }
//! #[derive(Debug)] enum CounterAction { Add(u64) }
//! #[derive(Debug, thiserror::Error)] #[error("counter overflow")] struct Overflow;
//!
//! #[async_trait]
//! impl ActorEntity for Counter {
//!     type Id = u32;
//!     type Create = CounterCreate;
//!     type Action = CounterAction;
//!     type ActionResult = u64;
//!     type Context = ();
//!     type Error = Overflow;
//!
//!     fn from_create_params(id: u32, params: CounterCreate) -> Result<Self, Self::Error> {
//!         Ok(Self { id, value: params.start })
//!     }
//!
//!     async fn handle_action(&mut self, action: CounterAction, _: &()) -> Result<u64, Overflow> {
//!         match action {
//!             CounterAction::Add(n) => {
//!                 self.value = self.value.checked_add(n).ok_or(Overflow)?;
//!                 Ok(self.value)
//!             }
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (actor, client) = ResourceActor::<Counter>::new(10);
//!     tokio::spawn(actor.run(()));
//!
//!     let id = client.create(CounterCreate { start: u64::MAX - 1 }).await.unwrap();
//!     assert_eq!(client.perform_action(id, CounterAction::Add(1)).await.unwrap(), u64::MAX);
//!
//!     // Entity errors come back boxed; recover the typed error on the client side.
//!     let err = client.perform_action(id, CounterAction::Add(1)).await.unwrap_err();
//!     assert!(err.downcast_entity::<Overflow>().is_ok());
//!
//!     assert!(matches!(
//!         client.perform_action(99, CounterAction::Add(1)).await,
//!         Err(FrameworkError::NotFound(_))
//!     ));
//! }
//! ```
//!
//! ## Context Injection
//!
//! Dependencies reach entity hooks through the `context` argument of [`ResourceActor::run`],
//! not through the constructor, so actors can be created first and wired afterwards.
//!
//! ## Testing
//!
//! The [`mock`] module hands out real `ResourceClient`s whose requests are answered from a
//! scripted queue, for testing orchestration code without a running actor.

pub mod actor;
pub mod client;
pub mod client_trait;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;

// Re-export core types for convenience
pub use actor::ResourceActor;
pub use client::ResourceClient;
pub use client_trait::ActorClient;
pub use entity::ActorEntity;
pub use error::FrameworkError;
pub use message::{ResourceRequest, Response};
