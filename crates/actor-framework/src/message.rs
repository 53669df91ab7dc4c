//! # Generic Messages
//!
//! The request type carried from a `ResourceClient` to its `ResourceActor`.

use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by actors.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Internal message type sent to the actor to request operations.
///
/// Every resource shares the same small vocabulary:
///
/// - **Create**: Uses [`ActorEntity::Create`] to initialize a new resource; replies with its ID.
/// - **Get**: Fetches a snapshot of one resource by ID.
/// - **List**: Fetches snapshots of every resource, ascending by ID.
/// - **Action**: Executes a custom [`ActorEntity::Action`] with exclusive access to the resource.
///
/// The enum is generic over `T: ActorEntity`, so a payload can only ever be sent to the actor
/// that owns its resource type.
#[derive(Debug)]
pub enum ResourceRequest<T: ActorEntity> {
    Create {
        params: T::Create,
        respond_to: Response<T::Id>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    List {
        respond_to: Response<Vec<T>>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult>,
    },
}
