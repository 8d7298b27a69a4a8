//! Cart engine - line-item mutation and total recomputation
//!
//! All order mutation goes through these functions, on both sides of the
//! wire: the server applies them as the authority, the client applies them
//! optimistically before persistence confirms. All arithmetic is done in
//! `Decimal`; binary floats never touch a monetary value.
//!
//! Two add paths exist on purpose:
//! - [`add_item`] (quick add) coalesces with an existing line item for the
//!   same product, summing quantities.
//! - [`append_item`] (explicit "add new entry" while editing) always appends,
//!   even for a product already present.

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;
use uuid::Uuid;

use super::snapshot::OrderSnapshot;
use super::types::{CartItemInput, ItemChanges, LineItem};

/// Monetary rounding: 2 decimal places, half-up
const DECIMAL_PLACES: u32 = 2;

/// Maximum quantity per line item
const MAX_QUANTITY: i32 = 9999;

/// Cart engine errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Quantity must be between 1 and {MAX_QUANTITY}, got {0}")]
    InvalidQuantity(i32),

    #[error("Unit price must be non-negative, got {0}")]
    InvalidPrice(Decimal),
}

fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

fn validate_input(input: &CartItemInput) -> Result<(), CartError> {
    if input.quantity < 1 || input.quantity > MAX_QUANTITY {
        return Err(CartError::InvalidQuantity(input.quantity));
    }
    if input.unit_price.is_sign_negative() {
        return Err(CartError::InvalidPrice(input.unit_price));
    }
    Ok(())
}

fn new_line_item(input: &CartItemInput) -> LineItem {
    let mut item = LineItem {
        id: Uuid::new_v4().to_string(),
        product_id: input.product_id,
        name: input.name.clone(),
        unit_price: input.unit_price,
        quantity: input.quantity,
        subtotal: Decimal::ZERO,
        notes: input.notes.clone().filter(|n| !n.is_empty()),
    };
    item.subtotal = round_money(item.unit_price * Decimal::from(item.quantity));
    item
}

/// Add an item via the quick-add path, coalescing by product id.
///
/// If a line item for the same product already exists its quantity is
/// increased; otherwise a new line item with a freshly assigned id is
/// appended. Returns the id of the affected line item.
pub fn add_item(order: &mut OrderSnapshot, input: &CartItemInput) -> Result<String, CartError> {
    validate_input(input)?;

    let id = if let Some(existing) = order
        .items
        .iter_mut()
        .find(|i| i.product_id == input.product_id)
    {
        existing.quantity += input.quantity;
        existing.id.clone()
    } else {
        let item = new_line_item(input);
        let id = item.id.clone();
        order.items.push(item);
        id
    };

    recompute_totals(order);
    Ok(id)
}

/// Append an item via the explicit editing path, never coalescing.
///
/// The user explicitly intends a separate entry, so a duplicate product is
/// allowed to coexist with quick-added line items.
pub fn append_item(order: &mut OrderSnapshot, input: &CartItemInput) -> Result<String, CartError> {
    validate_input(input)?;

    let item = new_line_item(input);
    let id = item.id.clone();
    order.items.push(item);

    recompute_totals(order);
    Ok(id)
}

/// Increase an item's quantity by one
pub fn increment_item(order: &mut OrderSnapshot, item_id: &str) -> Result<(), CartError> {
    let item = order
        .items
        .iter_mut()
        .find(|i| i.id == item_id)
        .ok_or_else(|| CartError::ItemNotFound(item_id.to_string()))?;
    if item.quantity >= MAX_QUANTITY {
        return Err(CartError::InvalidQuantity(item.quantity + 1));
    }
    item.quantity += 1;
    recompute_totals(order);
    Ok(())
}

/// Decrease an item's quantity by one; a quantity of 1 removes the item
pub fn decrement_item(order: &mut OrderSnapshot, item_id: &str) -> Result<(), CartError> {
    let idx = order
        .items
        .iter()
        .position(|i| i.id == item_id)
        .ok_or_else(|| CartError::ItemNotFound(item_id.to_string()))?;

    if order.items[idx].quantity <= 1 {
        order.items.remove(idx);
    } else {
        order.items[idx].quantity -= 1;
    }
    recompute_totals(order);
    Ok(())
}

/// Remove a line item outright, regardless of quantity
pub fn remove_item(order: &mut OrderSnapshot, item_id: &str) -> Result<LineItem, CartError> {
    let idx = order
        .items
        .iter()
        .position(|i| i.id == item_id)
        .ok_or_else(|| CartError::ItemNotFound(item_id.to_string()))?;
    let removed = order.items.remove(idx);
    recompute_totals(order);
    Ok(removed)
}

/// Replace the specified fields on one line item.
///
/// Unlike [`add_item`] this never coalesces with another line item, even if
/// the edit leaves two entries for the same product.
pub fn edit_item(
    order: &mut OrderSnapshot,
    item_id: &str,
    changes: &ItemChanges,
) -> Result<(), CartError> {
    if let Some(qty) = changes.quantity
        && (qty < 1 || qty > MAX_QUANTITY)
    {
        return Err(CartError::InvalidQuantity(qty));
    }

    let item = order
        .items
        .iter_mut()
        .find(|i| i.id == item_id)
        .ok_or_else(|| CartError::ItemNotFound(item_id.to_string()))?;

    if let Some(qty) = changes.quantity {
        item.quantity = qty;
    }
    if let Some(notes) = &changes.notes {
        item.notes = if notes.is_empty() {
            None
        } else {
            Some(notes.clone())
        };
    }

    recompute_totals(order);
    Ok(())
}

/// Sum of line-item subtotals
pub fn total(order: &OrderSnapshot) -> Decimal {
    order.items.iter().map(|i| i.subtotal).sum()
}

/// Recompute every subtotal and the order total.
///
/// This is the only writer of `OrderSnapshot::total`; every mutation above
/// ends by calling it.
pub fn recompute_totals(order: &mut OrderSnapshot) {
    for item in &mut order.items {
        item.subtotal = round_money(item.unit_price * Decimal::from(item.quantity));
    }
    order.total = total(order);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::types::OrderType;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn empty_order() -> OrderSnapshot {
        OrderSnapshot::new(
            "order-1".to_string(),
            "ORD-20260808-0001".to_string(),
            OrderType::DineIn,
        )
    }

    fn input(product_id: i64, name: &str, price: &str, quantity: i32) -> CartItemInput {
        CartItemInput {
            product_id,
            name: name.to_string(),
            unit_price: dec(price),
            quantity,
            notes: None,
        }
    }

    #[test]
    fn add_item_appends_and_computes_subtotal() {
        let mut order = empty_order();
        add_item(&mut order, &input(1, "Paella", "9.99", 1)).unwrap();

        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].subtotal, dec("9.99"));
        assert_eq!(order.total, dec("9.99"));
    }

    #[test]
    fn add_same_product_twice_coalesces() {
        let mut order = empty_order();
        let first = add_item(&mut order, &input(1, "Paella", "9.99", 1)).unwrap();
        let second = add_item(&mut order, &input(1, "Paella", "9.99", 1)).unwrap();

        // One line item, quantity 2, not two items of quantity 1
        assert_eq!(first, second);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 2);
        assert_eq!(order.items[0].subtotal, dec("19.98"));
        assert_eq!(order.total, dec("19.98"));
    }

    #[test]
    fn append_item_never_coalesces() {
        let mut order = empty_order();
        let first = add_item(&mut order, &input(1, "Paella", "9.99", 1)).unwrap();
        let second = append_item(&mut order, &input(1, "Paella", "9.99", 1)).unwrap();

        // Explicit add-new-entry keeps two separate lines for the same product
        assert_ne!(first, second);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.total, dec("19.98"));
    }

    #[test]
    fn add_then_remove_leaves_other_items_untouched() {
        let mut order = empty_order();
        let a = add_item(&mut order, &input(1, "Product A", "5.00", 1)).unwrap();
        add_item(&mut order, &input(2, "Product B", "3.50", 1)).unwrap();

        remove_item(&mut order, &a).unwrap();

        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].product_id, 2);
        assert_eq!(order.total, dec("3.50"));
    }

    #[test]
    fn decrement_quantity_one_removes_item() {
        let mut order = empty_order();
        let a = add_item(&mut order, &input(1, "Product A", "5.00", 1)).unwrap();
        add_item(&mut order, &input(2, "Product B", "3.50", 2)).unwrap();
        let before = order.total;

        decrement_item(&mut order, &a).unwrap();

        assert!(order.find_item(&a).is_none());
        assert_eq!(before - order.total, dec("5.00"));
    }

    #[test]
    fn decrement_above_one_keeps_item() {
        let mut order = empty_order();
        let a = add_item(&mut order, &input(1, "Product A", "5.00", 3)).unwrap();

        decrement_item(&mut order, &a).unwrap();

        assert_eq!(order.find_item(&a).unwrap().quantity, 2);
        assert_eq!(order.total, dec("10.00"));
    }

    #[test]
    fn increment_adds_one() {
        let mut order = empty_order();
        let a = add_item(&mut order, &input(1, "Product A", "2.50", 1)).unwrap();

        increment_item(&mut order, &a).unwrap();

        assert_eq!(order.find_item(&a).unwrap().quantity, 2);
        assert_eq!(order.total, dec("5.00"));
    }

    #[test]
    fn edit_item_replaces_fields_without_coalescing() {
        let mut order = empty_order();
        let a = add_item(&mut order, &input(1, "Product A", "4.00", 1)).unwrap();
        let b = append_item(&mut order, &input(1, "Product A", "4.00", 1)).unwrap();

        edit_item(
            &mut order,
            &b,
            &ItemChanges {
                quantity: Some(3),
                notes: Some("no onions".to_string()),
            },
        )
        .unwrap();

        assert_eq!(order.items.len(), 2);
        assert_eq!(order.find_item(&a).unwrap().quantity, 1);
        let edited = order.find_item(&b).unwrap();
        assert_eq!(edited.quantity, 3);
        assert_eq!(edited.notes.as_deref(), Some("no onions"));
        assert_eq!(order.total, dec("16.00"));
    }

    #[test]
    fn edit_to_zero_quantity_rejected() {
        let mut order = empty_order();
        let a = add_item(&mut order, &input(1, "Product A", "4.00", 2)).unwrap();

        let result = edit_item(
            &mut order,
            &a,
            &ItemChanges {
                quantity: Some(0),
                notes: None,
            },
        );

        assert_eq!(result, Err(CartError::InvalidQuantity(0)));
        assert_eq!(order.find_item(&a).unwrap().quantity, 2);
    }

    #[test]
    fn zero_quantity_add_rejected() {
        let mut order = empty_order();
        let result = add_item(&mut order, &input(1, "Product A", "4.00", 0));
        assert_eq!(result, Err(CartError::InvalidQuantity(0)));
        assert!(order.items.is_empty());
    }

    #[test]
    fn negative_price_rejected() {
        let mut order = empty_order();
        let result = add_item(&mut order, &input(1, "Product A", "-1.00", 1));
        assert!(matches!(result, Err(CartError::InvalidPrice(_))));
    }

    #[test]
    fn unknown_item_operations_fail() {
        let mut order = empty_order();
        assert!(matches!(
            increment_item(&mut order, "missing"),
            Err(CartError::ItemNotFound(_))
        ));
        assert!(matches!(
            decrement_item(&mut order, "missing"),
            Err(CartError::ItemNotFound(_))
        ));
        assert!(matches!(
            remove_item(&mut order, "missing"),
            Err(CartError::ItemNotFound(_))
        ));
    }

    #[test]
    fn totals_stay_consistent_across_operations() {
        let mut order = empty_order();
        add_item(&mut order, &input(1, "Espresso", "1.20", 3)).unwrap();
        let b = add_item(&mut order, &input(2, "Tortilla", "7.80", 1)).unwrap();
        append_item(&mut order, &input(1, "Espresso", "1.20", 1)).unwrap();
        increment_item(&mut order, &b).unwrap();

        // total == sum of subtotals, and each subtotal == qty * unit price
        for item in &order.items {
            assert_eq!(
                item.subtotal,
                (item.unit_price * Decimal::from(item.quantity)).round_dp(2)
            );
        }
        assert_eq!(order.total, total(&order));
        assert_eq!(order.total, dec("20.40"));
    }

    #[test]
    fn no_float_drift_on_repeated_adds() {
        let mut order = empty_order();
        // 0.10 added 100 times must be exactly 10.00
        for _ in 0..100 {
            add_item(&mut order, &input(1, "Candy", "0.10", 1)).unwrap();
        }
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.total, dec("10.00"));
    }
}
