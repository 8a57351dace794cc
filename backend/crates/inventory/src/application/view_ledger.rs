//! View Ledger Use Case

use std::sync::Arc;

use kernel::access::{Actor, Permission};
use kernel::id::ProductId;

use crate::domain::entities::{InventorySummary, Reconciliation, TransactionRecord};
use crate::domain::repository::LedgerRepository;
use crate::domain::value_objects::StockDirection;
use crate::error::{InventoryError, InventoryResult};

pub struct ViewLedgerUseCase<L>
where
    L: LedgerRepository,
{
    ledger_repo: Arc<L>,
}

impl<L> ViewLedgerUseCase<L>
where
    L: LedgerRepository,
{
    pub fn new(ledger_repo: Arc<L>) -> Self {
        Self { ledger_repo }
    }

    pub async fn list_transactions(
        &self,
        actor: &Actor,
        direction: Option<StockDirection>,
    ) -> InventoryResult<Vec<TransactionRecord>> {
        actor.authorize(Permission::ViewTransactions)?;
        self.ledger_repo.list_transactions(direction).await
    }

    /// Compare a product's stock with what its ledger implies.
    pub async fn reconcile(
        &self,
        actor: &Actor,
        product_id: &ProductId,
    ) -> InventoryResult<Reconciliation> {
        actor.authorize(Permission::ViewTransactions)?;

        let reconciliation = self
            .ledger_repo
            .reconcile(product_id)
            .await?
            .ok_or(InventoryError::ProductNotFound)?;

        if !reconciliation.is_consistent() {
            tracing::error!(
                product_id = %product_id,
                expected = reconciliation.expected_stock(),
                actual = reconciliation.current_stock,
                "Stock does not match ledger"
            );
        }

        Ok(reconciliation)
    }

    pub async fn summary(&self, actor: &Actor) -> InventoryResult<InventorySummary> {
        actor.authorize(Permission::ViewDashboard)?;
        self.ledger_repo.summary().await
    }
}
