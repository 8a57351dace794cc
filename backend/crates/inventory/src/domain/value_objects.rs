//! Domain Value Objects
//!
//! Immutable value types for the inventory domain.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{InventoryError, InventoryResult};

pub const MAX_PRODUCT_NAME_LENGTH: usize = 128;
pub const MAX_CATEGORY_LENGTH: usize = 64;
pub const MAX_IMAGE_LENGTH: usize = 255;

/// Units moved by one ledger operation. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quantity(i32);

impl Quantity {
    pub fn new(units: i64) -> InventoryResult<Self> {
        match i32::try_from(units) {
            Ok(units) if units > 0 => Ok(Self(units)),
            _ => Err(InventoryError::InvalidQuantity),
        }
    }

    pub fn units(&self) -> i64 {
        i64::from(self.0)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unit price in whole rupiah
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Price(i64);

impl Price {
    pub fn new(amount: i64) -> InventoryResult<Self> {
        if amount < 0 {
            return Err(InventoryError::InvalidProduct(
                "Price cannot be negative".to_string(),
            ));
        }
        Ok(Self(amount))
    }

    pub fn from_db(amount: i64) -> Self {
        Self(amount)
    }

    pub fn amount(&self) -> i64 {
        self.0
    }
}

/// Display name of a product, trimmed, 1 to 128 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductName(String);

impl ProductName {
    pub fn new(raw: &str) -> InventoryResult<Self> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(InventoryError::InvalidProduct(
                "Product name cannot be empty".to_string(),
            ));
        }
        if name.chars().count() > MAX_PRODUCT_NAME_LENGTH {
            return Err(InventoryError::InvalidProduct(format!(
                "Product name must be at most {MAX_PRODUCT_NAME_LENGTH} characters"
            )));
        }
        Ok(Self(name.to_string()))
    }

    pub fn from_db(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trim an optional free-text field; blank means absent.
pub fn optional_text(
    value: Option<String>,
    max_len: usize,
    field: &str,
) -> InventoryResult<Option<String>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    if value.chars().count() > max_len {
        return Err(InventoryError::InvalidProduct(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(Some(value.to_string()))
}

/// Which way stock moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum StockDirection {
    Incoming = 0,
    Outgoing = 1,
}

impl StockDirection {
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    pub const fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(StockDirection::Incoming),
            1 => Some(StockDirection::Outgoing),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            StockDirection::Incoming => "incoming",
            StockDirection::Outgoing => "outgoing",
        }
    }
}

impl fmt::Display for StockDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
