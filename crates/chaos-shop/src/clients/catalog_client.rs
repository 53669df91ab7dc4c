//! # Catalog Client
//!
//! Provides a high‑level API for interacting with the catalog actor.
//! It wraps a `ResourceClient<Product>` and exposes domain‑specific methods with typed
//! [`CatalogError`]s.
use crate::catalog::{CatalogAction, CatalogActionResult, CatalogError};
use crate::model::{Product, ProductCreate, ProductId};
use actor_framework::{ActorClient, FrameworkError, ResourceClient};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Client for interacting with the catalog actor.
#[derive(Clone, Debug)]
pub struct CatalogClient {
    inner: ResourceClient<Product>,
}

#[async_trait]
impl ActorClient<Product> for CatalogClient {
    type Error = CatalogError;

    fn inner(&self) -> &ResourceClient<Product> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        match e.downcast_entity::<CatalogError>() {
            Ok(typed) => typed,
            Err(other) => CatalogError::ActorCommunication(other.to_string()),
        }
    }
}

impl CatalogClient {
    pub fn new(inner: ResourceClient<Product>) -> Self {
        Self { inner }
    }

    /// Like [`ActorClient::map_error`], but turns the actor's "no such entity" into
    /// [`CatalogError::NotFound`] for the id the caller asked about.
    fn map_for(id: ProductId) -> impl FnOnce(FrameworkError) -> CatalogError {
        move |e| match e {
            FrameworkError::NotFound(_) => CatalogError::NotFound(id),
            other => Self::map_error(other),
        }
    }

    fn unexpected(action: &str, result: CatalogActionResult) -> CatalogError {
        CatalogError::ActorCommunication(format!("unexpected reply to {action}: {result:?}"))
    }

    #[instrument(skip(self))]
    pub async fn create_product(&self, params: ProductCreate) -> Result<ProductId, CatalogError> {
        debug!("Sending request");
        self.inner.create(params).await.map_err(Self::map_error)
    }

    /// Creates every product in order and returns their ids.
    pub async fn seed(
        &self,
        products: impl IntoIterator<Item = ProductCreate>,
    ) -> Result<Vec<ProductId>, CatalogError> {
        let mut ids = Vec::new();
        for params in products {
            ids.push(self.create_product(params).await?);
        }
        debug!(count = ids.len(), "Catalog seeded");
        Ok(ids)
    }

    /// Snapshot of one product.
    pub async fn get_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.get(id).await?.ok_or(CatalogError::NotFound(id))
    }

    /// Snapshot of the whole catalog, ascending by id.
    pub async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        self.list().await
    }

    /// Check the current stock level for a product.
    #[instrument(skip(self))]
    pub async fn check_stock(&self, id: ProductId) -> Result<u32, CatalogError> {
        match self
            .inner
            .perform_action(id, CatalogAction::CheckStock)
            .await
            .map_err(Self::map_for(id))?
        {
            CatalogActionResult::CheckStock(level) => Ok(level),
            other => Err(Self::unexpected("CheckStock", other)),
        }
    }

    /// Reserve `quantity` units, returning the stock left.
    ///
    /// Either the whole quantity is taken or nothing is.
    #[instrument(skip(self))]
    pub async fn reserve(&self, id: ProductId, quantity: u32) -> Result<u32, CatalogError> {
        debug!("Reserving {} units of {}", quantity, id);
        match self
            .inner
            .perform_action(id, CatalogAction::Reserve(quantity))
            .await
            .map_err(Self::map_for(id))?
        {
            CatalogActionResult::Reserve(remaining) => Ok(remaining),
            other => Err(Self::unexpected("Reserve", other)),
        }
    }

    /// Give back `quantity` previously reserved units, returning the new stock level.
    #[instrument(skip(self))]
    pub async fn release(&self, id: ProductId, quantity: u32) -> Result<u32, CatalogError> {
        debug!("Releasing {} units of {}", quantity, id);
        match self
            .inner
            .perform_action(id, CatalogAction::Release(quantity))
            .await
            .map_err(Self::map_for(id))?
        {
            CatalogActionResult::Release(level) => Ok(level),
            other => Err(Self::unexpected("Release", other)),
        }
    }
}
