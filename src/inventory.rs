use serde::Serialize;
use tracing::debug;

use crate::error::{HahnemannError, Result};
use crate::input::{parse_price, parse_quantity, Field, ValidationError};

/// A medicine in stock. Immutable once added.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryItem {
    pub name: String,
    pub quantity: u32,
    pub price: f64,
}

/// Raw contents of the "add to inventory" form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemDraft {
    pub name: String,
    pub quantity: String,
    pub price: String,
}

impl ItemDraft {
    pub fn new(name: &str, quantity: &str, price: &str) -> Self {
        Self {
            name: name.to_string(),
            quantity: quantity.to_string(),
            price: price.to_string(),
        }
    }

    fn missing_field(&self) -> Option<Field> {
        [
            (Field::Name, &self.name),
            (Field::Quantity, &self.quantity),
            (Field::Price, &self.price),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
    }
}

/// Append-only, insertion-ordered stock list.
#[derive(Debug, Default)]
pub struct Inventory {
    items: Vec<InventoryItem>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `draft` and append it. On any error the list is left as it was.
    pub fn add(&mut self, draft: &ItemDraft) -> Result<&InventoryItem> {
        if let Some(field) = draft.missing_field() {
            return Err(HahnemannError::Validation(ValidationError::Missing(field)));
        }

        let item = InventoryItem {
            name: draft.name.trim().to_string(),
            quantity: parse_quantity(&draft.quantity)?,
            price: parse_price(&draft.price)?,
        };
        debug!(name = %item.name, quantity = item.quantity, "inventory item added");

        self.items.push(item);
        let idx = self.items.len() - 1;
        Ok(&self.items[idx])
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_leaves_inventory_unchanged() {
        let mut inventory = Inventory::new();
        inventory.add(&ItemDraft::new("Arnica", "5", "120")).unwrap();

        for draft in [
            ItemDraft::new("", "5", "120"),
            ItemDraft::new("Belladonna", "", "120"),
            ItemDraft::new("Belladonna", "5", "  "),
        ] {
            let err = inventory.add(&draft).unwrap_err();
            assert!(matches!(
                err,
                HahnemannError::Validation(ValidationError::Missing(_))
            ));
            assert_eq!(inventory.len(), 1);
        }
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let mut inventory = Inventory::new();
        assert!(inventory.add(&ItemDraft::new("Nux", "ten", "20")).is_err());
        assert!(inventory.add(&ItemDraft::new("Nux", "10", "-20")).is_err());
        assert!(inventory.is_empty());
    }

    #[test]
    fn additions_preserve_insertion_order() {
        let mut inventory = Inventory::new();
        inventory.add(&ItemDraft::new("Arnica", "5", "120")).unwrap();
        inventory.add(&ItemDraft::new(" Calendula ", "2", "80.5")).unwrap();
        inventory.add(&ItemDraft::new("Arnica", "1", "120")).unwrap();

        let names: Vec<_> = inventory.items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["Arnica", "Calendula", "Arnica"]);
        assert_eq!(
            inventory.items()[0],
            InventoryItem {
                name: "Arnica".into(),
                quantity: 5,
                price: 120.0
            }
        );
        assert_eq!(inventory.items()[1].price, 80.5);
    }
}
