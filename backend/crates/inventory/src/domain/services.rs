//! Domain Services
//!
//! Pure ledger logic shared by every repository implementation. The store
//! reads the locked product, asks [`plan_movement`] what to write, then
//! persists the plan in the same atomic unit.

use chrono::{DateTime, Utc};
use kernel::access::Actor;
use kernel::id::StockTransactionId;

use crate::domain::entities::{ActivityLogEntry, Product, StockMovement, StockTransaction};
use crate::domain::value_objects::{Quantity, StockDirection};
use crate::error::{InventoryError, InventoryResult};

/// Rows a single ledger operation writes.
#[derive(Debug, Clone)]
pub struct MovementPlan {
    pub new_stock: i64,
    pub transaction: StockTransaction,
    pub activity: ActivityLogEntry,
}

/// Stock after moving `quantity` in `direction`.
///
/// Outgoing movements never take stock below zero.
pub fn apply_movement(
    stock: i64,
    direction: StockDirection,
    quantity: Quantity,
) -> InventoryResult<i64> {
    match direction {
        StockDirection::Incoming => stock
            .checked_add(quantity.units())
            .ok_or(InventoryError::InvalidQuantity),
        StockDirection::Outgoing if stock < quantity.units() => {
            Err(InventoryError::InsufficientStock { available: stock })
        }
        StockDirection::Outgoing => Ok(stock - quantity.units()),
    }
}

pub fn plan_movement(
    product: &Product,
    movement: &StockMovement,
    now: DateTime<Utc>,
) -> InventoryResult<MovementPlan> {
    let new_stock = apply_movement(product.stock, movement.direction, movement.quantity)?;

    let transaction = StockTransaction {
        transaction_id: StockTransactionId::new(),
        product_id: product.product_id,
        user_id: movement.actor.user_id,
        direction: movement.direction,
        quantity: movement.quantity.units(),
        created_at: now,
    };

    let description = describe_movement(
        &movement.actor,
        movement.direction,
        movement.quantity,
        product.name.as_str(),
    );

    Ok(MovementPlan {
        new_stock,
        transaction,
        activity: ActivityLogEntry::new(&movement.actor, description, now),
    })
}

pub fn describe_movement(
    actor: &Actor,
    direction: StockDirection,
    quantity: Quantity,
    product_name: &str,
) -> String {
    let verb = match direction {
        StockDirection::Incoming => "Recorded incoming stock",
        StockDirection::Outgoing => "Recorded outgoing stock",
    };
    with_staff_prefix(actor, format!("{verb}: {quantity} unit(s) of {product_name}"))
}

/// Product catalogue changes that are written to the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductChange {
    Created,
    Updated,
    Deleted,
}

pub fn describe_product_change(actor: &Actor, change: ProductChange, product_name: &str) -> String {
    let verb = match change {
        ProductChange::Created => "Added product",
        ProductChange::Updated => "Updated product",
        ProductChange::Deleted => "Deleted product",
    };
    with_staff_prefix(actor, format!("{verb}: {product_name}"))
}

// Entries written from below admin level are marked as staff actions.
fn with_staff_prefix(actor: &Actor, description: String) -> String {
    if actor.role.is_admin_or_higher() {
        description
    } else {
        format!("[Staf] {description}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ProductDetails;
    use kernel::access::Role;
    use kernel::id::UserId;

    fn actor(role: Role) -> Actor {
        Actor::new(UserId::new(), "kasir", role)
    }

    fn product(stock: i64) -> Product {
        Product::new(
            ProductDetails::new("Tempered Glass", 25_000, None, None).unwrap(),
            stock,
        )
    }

    #[test]
    fn test_apply_movement() {
        let five = Quantity::new(5).unwrap();
        assert_eq!(apply_movement(10, StockDirection::Incoming, five).unwrap(), 15);
        assert_eq!(apply_movement(10, StockDirection::Outgoing, five).unwrap(), 5);
        assert_eq!(apply_movement(5, StockDirection::Outgoing, five).unwrap(), 0);

        let fifteen = Quantity::new(15).unwrap();
        assert!(matches!(
            apply_movement(10, StockDirection::Outgoing, fifteen),
            Err(InventoryError::InsufficientStock { available: 10 })
        ));
        assert!(apply_movement(i64::MAX, StockDirection::Incoming, five).is_err());
    }

    #[test]
    fn test_plan_movement() {
        let product = product(10);
        let movement = StockMovement {
            product_id: product.product_id,
            direction: StockDirection::Outgoing,
            quantity: Quantity::new(4).unwrap(),
            actor: actor(Role::Admin),
        };

        let plan = plan_movement(&product, &movement, Utc::now()).unwrap();
        assert_eq!(plan.new_stock, 6);
        assert_eq!(plan.transaction.quantity, 4);
        assert_eq!(plan.transaction.user_id, movement.actor.user_id);
        assert_eq!(plan.activity.created_at, plan.transaction.created_at);
        assert_eq!(
            plan.activity.description,
            "Recorded outgoing stock: 4 unit(s) of Tempered Glass"
        );
    }

    #[test]
    fn test_staff_prefix() {
        let quantity = Quantity::new(2).unwrap();
        for role in [Role::Staf, Role::Pending] {
            assert_eq!(
                describe_movement(&actor(role), StockDirection::Incoming, quantity, "Casan"),
                "[Staf] Recorded incoming stock: 2 unit(s) of Casan"
            );
        }
        assert_eq!(
            describe_product_change(&actor(Role::SuperAdmin), ProductChange::Deleted, "Casan"),
            "Deleted product: Casan"
        );
    }
}
