//! # ActorEntity Trait
//!
//! The `ActorEntity` trait is the contract a resource (a catalog product, a ticket, …) implements
//! to be owned by a generic [`ResourceActor`](crate::ResourceActor). It names the associated types
//! for IDs, creation payloads, custom actions, context and errors, and provides the hooks the actor
//! calls (`on_create`, `handle_action`).
//!
//! # Why a single trait?
//! The actor loop is written *once* against this trait. Every resource gets the same
//! Create / Get / List / Action surface, and the associated types stop a product payload from
//! ever reaching a different resource's actor.
//!
//! Resources in this workspace are seeded and then only mutated through actions, so there are
//! no update or delete hooks.

use async_trait::async_trait;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any resource entity must implement to be managed by ResourceActor.
///
/// # Async & Context
/// This trait is `#[async_trait]` so hooks may await (e.g., call another actor).
/// The `Context` type is injected into every hook at `run()` time, which lets dependencies be
/// bound late, after every actor has been constructed.
#[async_trait]
pub trait ActorEntity: Clone + Send + Sync + 'static {
    /// The unique identifier for this entity.
    /// Must be convertible from u32 for automatic ID generation, and ordered so that
    /// listings come back in a stable, ascending order.
    type Id: Eq + Ord + Hash + Clone + Send + Sync + Display + Debug + From<u32>;

    /// The data required to create a new instance.
    type Create: Send + Sync + Debug;

    /// Enum representing resource-specific operations (e.g., `Reserve`).
    type Action: Send + Sync + Debug;

    /// The result type returned by custom actions.
    type ActionResult: Send + Sync + Debug;

    /// The runtime context (dependencies) injected into the actor.
    /// Use `()` if no dependencies are needed.
    type Context: Send + Sync;

    /// The error type for this entity.
    ///
    /// One error enum per actor rather than one per action: clients match on a single type,
    /// at the cost of every action nominally being able to return every variant.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct the full Entity from the ID and Payload.
    /// This is called synchronously before `on_create`.
    fn from_create_params(id: Self::Id, params: Self::Create) -> Result<Self, Self::Error>;

    /// Called after the entity is constructed, before it is stored.
    /// Returning an error aborts the creation.
    async fn on_create(&mut self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Handle a custom resource-specific action.
    ///
    /// The actor calls this with exclusive access to the entity, so a check-then-modify inside
    /// one action is indivisible with respect to every other request.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        ctx: &Self::Context,
    ) -> Result<Self::ActionResult, Self::Error>;
}
