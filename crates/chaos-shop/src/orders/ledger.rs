//! Reservations made by one order attempt.
//!
//! Every catalog round trip that changes stock runs in its own spawned task, so dropping the
//! order future can never strand units: a reserve whose caller is gone releases what it took,
//! and a rollback keeps releasing after its caller stops waiting.

use crate::catalog::CatalogError;
use crate::clients::CatalogClient;
use crate::model::ProductId;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, error, warn, Instrument};

/// Tracks stock taken by one order attempt until it is committed or rolled back.
///
/// If the ledger is dropped while still holding reservations (the order future was abandoned
/// mid-flight), it spawns the compensating releases on the current Tokio runtime.
#[derive(Debug)]
pub struct ReservationLedger {
    catalog: CatalogClient,
    reserved: Vec<(ProductId, u32)>,
}

impl ReservationLedger {
    pub fn new(catalog: CatalogClient) -> Self {
        Self {
            catalog,
            reserved: Vec::new(),
        }
    }

    /// Reserves through the catalog and records the reservation on success.
    ///
    /// Once sent, the request completes even if this future is dropped; units reserved for a
    /// caller that is no longer listening are released again.
    pub async fn reserve(&mut self, id: ProductId, quantity: u32) -> Result<u32, CatalogError> {
        let catalog = self.catalog.clone();
        let (reply, outcome) = oneshot::channel();
        tokio::spawn(
            async move {
                let result = catalog.reserve(id, quantity).await;
                if let Err(Ok(_)) = reply.send(result) {
                    warn!(%id, quantity, "Order abandoned during reservation, releasing");
                    release_all(catalog, vec![(id, quantity)]).await;
                }
            }
            .in_current_span(),
        );

        let remaining = outcome.await.map_err(|_| {
            CatalogError::ActorCommunication("reservation task ended without a reply".into())
        })??;
        self.reserved.push((id, quantity));
        Ok(remaining)
    }

    /// Releases every reservation, newest first. Release failures are logged, not returned:
    /// the order has already failed and the caller reports that error.
    ///
    /// The releases run in a spawned task and finish even if this future is dropped.
    pub async fn rollback(mut self) {
        let reserved = std::mem::take(&mut self.reserved);
        if reserved.is_empty() {
            return;
        }
        let task = tokio::spawn(release_all(self.catalog.clone(), reserved).in_current_span());
        if let Err(e) = task.await {
            error!(error = %e, "Rollback task failed");
        }
    }

    /// Keeps the reservations; the stock is now sold.
    pub fn commit(mut self) -> Vec<(ProductId, u32)> {
        std::mem::take(&mut self.reserved)
    }
}

async fn release_all(catalog: CatalogClient, reserved: Vec<(ProductId, u32)>) {
    for (id, quantity) in reserved.into_iter().rev() {
        match catalog.release(id, quantity).await {
            Ok(stock) => debug!(%id, quantity, stock, "Reservation released"),
            Err(e) => warn!(%id, quantity, error = %e, "Failed to release reservation"),
        }
    }
}

impl Drop for ReservationLedger {
    fn drop(&mut self) {
        if self.reserved.is_empty() {
            return;
        }
        let reserved = std::mem::take(&mut self.reserved);
        match Handle::try_current() {
            Ok(handle) => {
                warn!(count = reserved.len(), "Order abandoned, releasing reservations");
                handle.spawn(release_all(self.catalog.clone(), reserved));
            }
            Err(_) => {
                error!(?reserved, "Order abandoned outside a runtime, reservations leaked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogAction, CatalogActionResult};
    use crate::model::Product;
    use actor_framework::mock::{create_mock_client, expect_action};
    use actor_framework::FrameworkError;

    #[tokio::test]
    async fn reserve_dropped_before_the_reply_releases_the_units() {
        let (client, mut receiver) = create_mock_client::<Product>(8);
        let mut ledger = ReservationLedger::new(CatalogClient::new(client));

        let (id, action, respond_to) = {
            let reserve = ledger.reserve(ProductId(4), 5);
            tokio::pin!(reserve);
            tokio::select! {
                _ = &mut reserve => panic!("reserve finished before the catalog replied"),
                request = expect_action(&mut receiver) => request.expect("reserve request"),
            }
        };
        assert_eq!((id, action), (ProductId(4), CatalogAction::Reserve(5)));

        // the catalog took the units after the caller went away
        respond_to.send(Ok(CatalogActionResult::Reserve(10))).unwrap();

        let (id, action, respond_to) = expect_action(&mut receiver)
            .await
            .expect("compensating release");
        assert_eq!((id, action), (ProductId(4), CatalogAction::Release(5)));
        respond_to.send(Ok(CatalogActionResult::Release(15))).unwrap();
    }

    #[tokio::test]
    async fn failed_reserve_is_not_recorded() {
        let (client, mut receiver) = create_mock_client::<Product>(8);
        let mut ledger = ReservationLedger::new(CatalogClient::new(client));

        let (result, ()) = tokio::join!(ledger.reserve(ProductId(1), 11), async {
            let (_, _, respond_to) = expect_action(&mut receiver).await.unwrap();
            let refused = CatalogError::InsufficientStock {
                product: ProductId(1),
                requested: 11,
                available: 10,
            };
            respond_to
                .send(Err(FrameworkError::EntityError(Box::new(refused))))
                .unwrap();
        });

        assert!(matches!(result, Err(CatalogError::InsufficientStock { .. })));
        assert!(ledger.commit().is_empty());
    }

    #[tokio::test]
    async fn rollback_dropped_midway_still_releases_everything() {
        let (client, mut receiver) = create_mock_client::<Product>(8);
        let mut ledger = ReservationLedger::new(CatalogClient::new(client));

        for (id, quantity, left) in [(ProductId(1), 2, 8), (ProductId(3), 5, 20)] {
            let (reserved, ()) = tokio::join!(ledger.reserve(id, quantity), async {
                let (_, _, respond_to) = expect_action(&mut receiver).await.unwrap();
                respond_to.send(Ok(CatalogActionResult::Reserve(left))).unwrap();
            });
            assert_eq!(reserved, Ok(left));
        }

        let respond_to = {
            let rollback = ledger.rollback();
            tokio::pin!(rollback);
            let (id, action, respond_to) = tokio::select! {
                _ = &mut rollback => panic!("rollback finished before the catalog replied"),
                request = expect_action(&mut receiver) => request.expect("first release"),
            };
            assert_eq!((id, action), (ProductId(3), CatalogAction::Release(5)));
            respond_to
        };
        respond_to.send(Ok(CatalogActionResult::Release(25))).unwrap();

        let (id, action, respond_to) = expect_action(&mut receiver)
            .await
            .expect("second release");
        assert_eq!((id, action), (ProductId(1), CatalogAction::Release(2)));
        respond_to.send(Ok(CatalogActionResult::Release(10))).unwrap();
    }

    #[tokio::test]
    async fn dropped_ledger_releases_what_it_holds() {
        let (client, mut receiver) = create_mock_client::<Product>(8);
        let mut ledger = ReservationLedger::new(CatalogClient::new(client));

        let (reserved, ()) = tokio::join!(ledger.reserve(ProductId(2), 3), async {
            let (_, _, respond_to) = expect_action(&mut receiver).await.unwrap();
            respond_to.send(Ok(CatalogActionResult::Reserve(47))).unwrap();
        });
        assert_eq!(reserved, Ok(47));

        drop(ledger);

        let (id, action, respond_to) = expect_action(&mut receiver).await.unwrap();
        assert_eq!((id, action), (ProductId(2), CatalogAction::Release(3)));
        respond_to.send(Ok(CatalogActionResult::Release(50))).unwrap();
    }
}
