use rand::Rng;
use shared::models::{AppOrder, DatasetOrder, Published, WorkerpoolOrder};

/// A required order kind had no candidate at or below the price ceiling.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderSelectionError {
    #[error("no dataset order found for the desired price")]
    NoDatasetOrder,
    #[error("no app order found for the desired price")]
    NoAppOrder,
    #[error("no workerpool order found for the desired price")]
    NoWorkerpoolOrder,
}

/// First dataset order at or below `max_price`, in the order book's own
/// ordering. Returns `None` so the caller can fall back to an alternate
/// authorized app before giving up.
pub fn first_dataset_order_under(
    orders: Vec<Published<DatasetOrder>>,
    max_price: u64,
) -> Option<Published<DatasetOrder>> {
    orders
        .into_iter()
        .find(|o| o.order.dataset_price <= max_price)
}

/// First app order at or below `max_price`. App orders have no fallback
/// source, so an empty filter result fails immediately.
pub fn first_app_order_under(
    orders: Vec<Published<AppOrder>>,
    max_price: u64,
) -> Result<Published<AppOrder>, OrderSelectionError> {
    orders
        .into_iter()
        .find(|o| o.order.app_price <= max_price)
        .ok_or(OrderSelectionError::NoAppOrder)
}

/// Uniformly random workerpool order among those at or below `max_price`,
/// spreading work across eligible pools. The random source is injected so
/// selection stays deterministic under test.
pub fn random_workerpool_order_under<R: Rng>(
    orders: Vec<Published<WorkerpoolOrder>>,
    max_price: u64,
    rng: &mut R,
) -> Result<Published<WorkerpoolOrder>, OrderSelectionError> {
    let mut eligible: Vec<_> = orders
        .into_iter()
        .filter(|o| o.order.workerpool_price <= max_price)
        .collect();
    if eligible.is_empty() {
        return Err(OrderSelectionError::NoWorkerpoolOrder);
    }
    let index = rng.gen_range(0..eligible.len());
    Ok(eligible.swap_remove(index))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::testing::{published_app_order, published_dataset_order, published_workerpool_order};

    #[test]
    fn test_dataset_selection_empty_when_all_orders_exceed_bound() {
        let orders = vec![
            published_dataset_order(10, "0xaa"),
            published_dataset_order(7, "0xab"),
        ];
        assert!(first_dataset_order_under(orders, 5).is_none());
    }

    #[test]
    fn test_dataset_selection_takes_first_eligible_not_cheapest() {
        let orders = vec![
            published_dataset_order(9, "0xaa"),
            published_dataset_order(3, "0xab"),
            published_dataset_order(1, "0xac"),
        ];
        let picked = first_dataset_order_under(orders, 5).unwrap();
        assert_eq!(picked.order.dataset_price, 3);
    }

    #[test]
    fn test_zero_price_dataset_order_is_not_a_missing_order() {
        let orders = vec![published_dataset_order(0, "0xaa")];
        let picked = first_dataset_order_under(orders, 0).unwrap();
        assert_eq!(picked.order.dataset_price, 0);

        assert!(first_dataset_order_under(Vec::new(), 0).is_none());
    }

    #[test]
    fn test_app_selection_fails_without_eligible_order() {
        let orders = vec![published_app_order(10, "0xba")];
        assert_eq!(
            first_app_order_under(orders, 5).unwrap_err(),
            OrderSelectionError::NoAppOrder
        );
    }

    #[test]
    fn test_app_selection_takes_single_eligible_order() {
        let orders = vec![
            published_app_order(10, "0xba"),
            published_app_order(4, "0xbb"),
            published_app_order(12, "0xbc"),
        ];
        let picked = first_app_order_under(orders, 5).unwrap();
        assert_eq!(picked.order.app_price, 4);
    }

    #[test]
    fn test_workerpool_selection_fails_without_eligible_order() {
        let mut rng = StdRng::seed_from_u64(7);
        let orders = vec![published_workerpool_order(10, "0xca")];
        assert_eq!(
            random_workerpool_order_under(orders, 5, &mut rng).unwrap_err(),
            OrderSelectionError::NoWorkerpoolOrder
        );
    }

    #[test]
    fn test_workerpool_selection_only_picks_eligible_orders() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let orders = vec![
                published_workerpool_order(2, "0xca"),
                published_workerpool_order(9, "0xcb"),
                published_workerpool_order(5, "0xcc"),
            ];
            let picked = random_workerpool_order_under(orders, 5, &mut rng).unwrap();
            assert!(picked.order.workerpool_price <= 5);
        }
    }

    #[test]
    fn test_workerpool_selection_reaches_every_eligible_order() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let orders = vec![
                published_workerpool_order(1, "0xca"),
                published_workerpool_order(2, "0xcb"),
                published_workerpool_order(3, "0xcc"),
            ];
            let picked = random_workerpool_order_under(orders, 5, &mut rng).unwrap();
            seen.insert(picked.order_hash.clone());
        }
        assert_eq!(seen.len(), 3);
    }
}
