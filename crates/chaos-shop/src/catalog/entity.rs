//! [`ActorEntity`] implementation for [`Product`].
//!
//! The catalog needs no dependencies (`Context = ()`); all of its logic is the stock
//! bookkeeping in `handle_action`.

use super::actions::{CatalogAction, CatalogActionResult};
use super::error::CatalogError;
use crate::model::{Product, ProductCreate, ProductId};
use actor_framework::ActorEntity;
use async_trait::async_trait;

#[async_trait]
impl ActorEntity for Product {
    type Id = ProductId;
    type Create = ProductCreate;
    type Action = CatalogAction;
    type ActionResult = CatalogActionResult;
    type Context = ();
    type Error = CatalogError;

    /// Creates a new Product from creation parameters. Names must be non-empty.
    fn from_create_params(id: ProductId, params: ProductCreate) -> Result<Self, Self::Error> {
        if params.name.trim().is_empty() {
            return Err(CatalogError::InvalidProduct(format!(
                "{id} has an empty name"
            )));
        }
        Ok(Self::new(id, params.name, params.price, params.stock))
    }

    /// Handles stock actions.
    ///
    /// # Actions
    /// - `CheckStock`: returns the stock level
    /// - `Reserve`: decrements stock if enough is available, returns what is left
    /// - `Release`: credits stock back, returns the new level
    async fn handle_action(
        &mut self,
        action: CatalogAction,
        _ctx: &Self::Context,
    ) -> Result<CatalogActionResult, Self::Error> {
        match action {
            CatalogAction::CheckStock => Ok(CatalogActionResult::CheckStock(self.stock)),
            CatalogAction::Reserve(0) => Err(CatalogError::InvalidQuantity(0)),
            CatalogAction::Reserve(quantity) => {
                if self.stock < quantity {
                    return Err(CatalogError::InsufficientStock {
                        product: self.id,
                        requested: quantity,
                        available: self.stock,
                    });
                }
                self.stock -= quantity;
                Ok(CatalogActionResult::Reserve(self.stock))
            }
            CatalogAction::Release(quantity) => {
                self.stock = self.stock.saturating_add(quantity);
                Ok(CatalogActionResult::Release(self.stock))
            }
        }
    }
}
