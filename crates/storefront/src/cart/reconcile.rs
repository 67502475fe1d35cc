//! Merge the anonymous cart into the server cart after login.

use boutique_core::{Cart, ProductId};
use tracing::{info, instrument, warn};

use super::{LocalCart, ServerCart};
use crate::error::Result;
use crate::storage::StorageError;

/// Destination of reconciled cart lines.
///
/// Implemented by [`ServerCart`]; tests substitute a recording fake.
pub trait CartSink {
    /// Add `quantity` units of a product to the destination cart.
    fn push_line(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> impl Future<Output = Result<()>> + Send;
}

impl CartSink for ServerCart {
    fn push_line(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> impl Future<Output = Result<()>> + Send {
        self.add(product_id, quantity)
    }
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileResult {
    /// Lines the server accepted.
    pub synced: usize,
    /// Products whose line the server refused, in attempt order.
    pub failed: Vec<ProductId>,
}

impl ReconcileResult {
    /// Whether some lines were dropped. The user stays logged in either way.
    #[must_use]
    pub fn is_partial_failure(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Lines attempted in total.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.synced + self.failed.len()
    }
}

/// Push every local cart line to `sink`, then erase the local cart.
///
/// Lines are sent one at a time. A failed line is logged and recorded, and
/// the pass moves on; nothing is retried. The local cart is cleared whatever
/// happened, so lines the server refused are lost. An unreadable local cart
/// counts as empty and is cleared as well.
///
/// Merging is additive: a product already in the server cart ends up with
/// the sum of both quantities.
///
/// # Errors
///
/// Returns a `StorageError` only if the local cart cannot be erased.
#[instrument(skip_all)]
pub async fn reconcile<S: CartSink + ?Sized>(
    local: &LocalCart,
    sink: &S,
) -> std::result::Result<ReconcileResult, StorageError> {
    let cart = local.get().unwrap_or_else(|e| {
        warn!(error = %e, "Local cart unreadable, nothing to sync");
        Cart::new()
    });

    let mut result = ReconcileResult::default();
    for line in &cart {
        match sink.push_line(&line.product_id, line.quantity).await {
            Ok(()) => result.synced += 1,
            Err(e) => {
                warn!(
                    product_id = %line.product_id,
                    quantity = line.quantity,
                    error = %e,
                    "Failed to sync cart line"
                );
                result.failed.push(line.product_id.clone());
            }
        }
    }

    local.clear()?;

    if !cart.is_empty() {
        info!(
            synced = result.synced,
            failed = result.failed.len(),
            "Merged local cart into server cart"
        );
    }
    Ok(result)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;
    use crate::error::Error;
    use crate::storage::{KeyValueStore, MemoryStore};

    /// Records every pushed line and refuses the products in `reject`.
    #[derive(Default)]
    struct RecordingSink {
        reject: HashSet<ProductId>,
        pushed: Mutex<Vec<(ProductId, u32)>>,
    }

    impl RecordingSink {
        fn rejecting(ids: &[&str]) -> Self {
            Self {
                reject: ids.iter().map(|id| ProductId::new(*id)).collect(),
                ..Self::default()
            }
        }

        fn pushed(&self) -> Vec<(ProductId, u32)> {
            self.pushed.lock().unwrap().clone()
        }
    }

    impl CartSink for RecordingSink {
        fn push_line(
            &self,
            product_id: &ProductId,
            quantity: u32,
        ) -> impl Future<Output = Result<()>> + Send {
            self.pushed
                .lock()
                .unwrap()
                .push((product_id.clone(), quantity));
            let outcome = if self.reject.contains(product_id) {
                Err(Error::InvalidInput(format!("Produit {product_id} indisponible")))
            } else {
                Ok(())
            };
            std::future::ready(outcome)
        }
    }

    fn local_with(lines: &[(&str, u32)]) -> LocalCart {
        let local = LocalCart::new(MemoryStore::shared());
        for (id, qty) in lines {
            local.add(&ProductId::new(*id), *qty).unwrap();
        }
        local
    }

    #[tokio::test]
    async fn test_all_lines_synced_with_their_quantities() {
        let local = local_with(&[("A", 2), ("B", 1)]);
        let sink = RecordingSink::default();

        let result = reconcile(&local, &sink).await.unwrap();

        assert_eq!(result.synced, 2);
        assert!(!result.is_partial_failure());
        assert_eq!(
            sink.pushed(),
            vec![(ProductId::new("A"), 2), (ProductId::new("B"), 1)]
        );
        assert!(local.get().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_partial_failure_still_clears_local_cart() {
        let local = local_with(&[("A", 2), ("B", 1)]);
        let sink = RecordingSink::rejecting(&["B"]);

        let result = reconcile(&local, &sink).await.unwrap();

        assert_eq!(result.synced, 1);
        assert_eq!(result.failed, vec![ProductId::new("B")]);
        assert!(result.is_partial_failure());
        assert_eq!(result.attempted(), 2);
        assert_eq!(sink.pushed().len(), 2);
        assert!(local.get().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_local_cart_makes_no_calls() {
        let local = local_with(&[]);
        let sink = RecordingSink::default();

        let result = reconcile(&local, &sink).await.unwrap();

        assert_eq!(result, ReconcileResult::default());
        assert!(sink.pushed().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_local_cart_counts_as_empty() {
        let store = MemoryStore::shared();
        store.set("local_cart", "][").unwrap();
        let local = LocalCart::new(store.clone());
        let sink = RecordingSink::default();

        let result = reconcile(&local, &sink).await.unwrap();

        assert_eq!(result.attempted(), 0);
        assert!(store.get("local_cart").unwrap().is_none());
    }
}
