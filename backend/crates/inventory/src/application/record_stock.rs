//! Record Stock Use Case
//!
//! Incoming and outgoing stock movements. The repository performs the
//! check-and-write atomically; this layer validates input and authorizes.

use std::sync::Arc;

use kernel::access::{Actor, Permission};
use kernel::id::ProductId;

use crate::domain::entities::{LedgerEntry, StockMovement};
use crate::domain::repository::LedgerRepository;
use crate::domain::value_objects::{Quantity, StockDirection};
use crate::error::InventoryResult;

pub struct RecordStockUseCase<L>
where
    L: LedgerRepository,
{
    ledger_repo: Arc<L>,
}

impl<L> RecordStockUseCase<L>
where
    L: LedgerRepository,
{
    pub fn new(ledger_repo: Arc<L>) -> Self {
        Self { ledger_repo }
    }

    pub async fn incoming(
        &self,
        actor: &Actor,
        product_id: &ProductId,
        quantity: i64,
    ) -> InventoryResult<LedgerEntry> {
        self.execute(actor, product_id, StockDirection::Incoming, quantity)
            .await
    }

    pub async fn outgoing(
        &self,
        actor: &Actor,
        product_id: &ProductId,
        quantity: i64,
    ) -> InventoryResult<LedgerEntry> {
        self.execute(actor, product_id, StockDirection::Outgoing, quantity)
            .await
    }

    pub async fn execute(
        &self,
        actor: &Actor,
        product_id: &ProductId,
        direction: StockDirection,
        quantity: i64,
    ) -> InventoryResult<LedgerEntry> {
        actor.authorize(Permission::RecordStock)?;

        let movement = StockMovement {
            product_id: *product_id,
            direction,
            quantity: Quantity::new(quantity)?,
            actor: actor.clone(),
        };

        let entry = self.ledger_repo.record_movement(&movement).await?;

        tracing::info!(
            actor = %actor.user_id,
            product_id = %product_id,
            direction = %direction,
            quantity,
            stock = entry.product.stock,
            "Stock movement recorded"
        );

        Ok(entry)
    }
}
