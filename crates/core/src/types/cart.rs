//! The normalized cart model shared by the local and server carts.
//!
//! Historically the cart travelled in two shapes: the device-local copy
//! keyed lines by product id (`{"items": {"p1": {...}}}`), while the
//! backend's `GET /cart` returned a list (`{"items": [{...}]}`) with extra
//! display fields. [`Cart`] accepts both on the way in and always writes the
//! keyed form, so the rest of the code only ever sees one type.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::{Deserialize, Serialize};

use super::ProductId;

/// One product line of a cart.
///
/// `quantity` is always at least 1 inside a [`Cart`]; zero means "remove".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A cart: at most one [`CartLine`] per product, order irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CartRepr")]
pub struct Cart {
    items: BTreeMap<ProductId, CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct product lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.values().map(|line| u64::from(line.quantity)).sum()
    }

    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.items.get(product_id)
    }

    /// Quantity of a product, 0 when absent.
    #[must_use]
    pub fn quantity(&self, product_id: &ProductId) -> u32 {
        self.get(product_id).map_or(0, |line| line.quantity)
    }

    /// Iterate lines in product id order.
    pub fn lines(&self) -> impl Iterator<Item = &CartLine> {
        self.items.values()
    }

    /// Add `quantity` units of a product, creating the line if needed.
    ///
    /// Adding zero is a no-op. Quantities saturate at `u32::MAX`.
    pub fn add(&mut self, product_id: &ProductId, quantity: u32) {
        if quantity == 0 {
            return;
        }
        match self.items.entry(product_id.clone()) {
            Entry::Occupied(mut entry) => {
                let line = entry.get_mut();
                line.quantity = line.quantity.saturating_add(quantity);
            }
            Entry::Vacant(entry) => {
                entry.insert(CartLine {
                    product_id: product_id.clone(),
                    quantity,
                });
            }
        }
    }

    /// Add one unit of a product.
    pub fn increment(&mut self, product_id: &ProductId) {
        self.add(product_id, 1);
    }

    /// Remove one unit of a product if more than one is present.
    ///
    /// A line at quantity 1 is left untouched; only [`Cart::remove`] deletes
    /// lines. Returns whether the cart changed.
    pub fn decrement(&mut self, product_id: &ProductId) -> bool {
        match self.items.get_mut(product_id) {
            Some(line) if line.quantity > 1 => {
                line.quantity -= 1;
                true
            }
            _ => false,
        }
    }

    /// Delete a line entirely.
    pub fn remove(&mut self, product_id: &ProductId) -> Option<CartLine> {
        self.items.remove(product_id)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl FromIterator<(ProductId, u32)> for Cart {
    fn from_iter<I: IntoIterator<Item = (ProductId, u32)>>(iter: I) -> Self {
        let mut cart = Self::new();
        for (product_id, quantity) in iter {
            cart.add(&product_id, quantity);
        }
        cart
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartLine;
    type IntoIter = std::collections::btree_map::Values<'a, ProductId, CartLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.values()
    }
}

// =============================================================================
// Wire representation
// =============================================================================

#[derive(Deserialize)]
struct CartRepr {
    #[serde(default)]
    items: Option<ItemsRepr>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ItemsRepr {
    Keyed(BTreeMap<String, LineRepr>),
    Listed(Vec<LineRepr>),
}

/// A line as found on the wire. Extra fields (name, prices) are ignored.
#[derive(Deserialize)]
struct LineRepr {
    #[serde(default)]
    product_id: Option<ProductId>,
    #[serde(default)]
    quantity: i64,
}

impl LineRepr {
    fn quantity(&self) -> u32 {
        u32::try_from(self.quantity.max(0)).unwrap_or(u32::MAX)
    }
}

impl From<CartRepr> for Cart {
    fn from(repr: CartRepr) -> Self {
        let mut cart = Self::new();
        match repr.items {
            None => {}
            // The map key is the product id; an embedded id that disagrees
            // with it is ignored.
            Some(ItemsRepr::Keyed(lines)) => {
                for (key, line) in lines {
                    cart.add(&ProductId::new(key), line.quantity());
                }
            }
            Some(ItemsRepr::Listed(lines)) => {
                for line in lines {
                    let quantity = line.quantity();
                    if let Some(product_id) = line.product_id {
                        cart.add(&product_id, quantity);
                    }
                }
            }
        }
        cart
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pid(id: &str) -> ProductId {
        ProductId::new(id)
    }

    #[test]
    fn test_increment_creates_then_grows_line() {
        let mut cart = Cart::new();
        cart.increment(&pid("A"));
        cart.increment(&pid("A"));
        assert_eq!(cart.quantity(&pid("A")), 2);
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_decrement_never_removes_line() {
        let mut cart = Cart::new();
        cart.add(&pid("A"), 2);
        assert!(cart.decrement(&pid("A")));
        assert!(!cart.decrement(&pid("A")));
        assert_eq!(cart.quantity(&pid("A")), 1);
    }

    #[test]
    fn test_decrement_absent_line_is_noop() {
        let mut cart = Cart::new();
        assert!(!cart.decrement(&pid("X")));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_zero_is_noop() {
        let mut cart = Cart::new();
        cart.add(&pid("A"), 0);
        assert!(cart.get(&pid("A")).is_none());
    }

    #[test]
    fn test_remove_deletes_line() {
        let mut cart: Cart = [(pid("A"), 3), (pid("B"), 1)].into_iter().collect();
        assert_eq!(cart.remove(&pid("A")).map(|l| l.quantity), Some(3));
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total_quantity(), 1);
    }

    #[test]
    fn test_serializes_keyed_form() {
        let cart: Cart = [(pid("A"), 2)].into_iter().collect();
        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"items": {"A": {"product_id": "A", "quantity": 2}}})
        );
    }

    #[test]
    fn test_deserializes_backend_list_form() {
        let json = serde_json::json!({
            "items": [
                {"id": "i1", "product_id": "A", "name": "Mug", "unit_price_cents": 900, "quantity": 2, "total_cents": 1800},
                {"id": "i2", "product_id": "B", "quantity": 0},
                {"id": "i3", "product_id": "A", "quantity": 1},
                {"id": "i4", "quantity": 5}
            ],
            "total_cents": 2700
        });
        let cart: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(cart.quantity(&pid("A")), 3);
        assert!(cart.get(&pid("B")).is_none());
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_deserializes_keyed_form_with_key_as_authority() {
        let json = serde_json::json!({
            "items": {
                "A": {"product_id": "Z", "quantity": 2},
                "B": {"quantity": -3},
                "C": {"quantity": 1}
            }
        });
        let cart: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(cart.get(&pid("A")).unwrap().product_id, pid("A"));
        assert_eq!(cart.quantity(&pid("C")), 1);
        assert!(cart.get(&pid("B")).is_none());
        assert!(cart.get(&pid("Z")).is_none());
    }

    #[test]
    fn test_deserializes_missing_or_null_items_as_empty() {
        let cart: Cart = serde_json::from_str("{}").unwrap();
        assert!(cart.is_empty());
        let cart: Cart = serde_json::from_str(r#"{"items": null}"#).unwrap();
        assert!(cart.is_empty());
    }
}
