use std::future::Future;

use anyhow::Result;
use shared::models::{OrderPage, PageCursor, Published};

/// Drains an order book starting from an already-fetched first page,
/// following continuation cursors until the book is exhausted.
///
/// The total reported by the first page bounds the loop: even if the server
/// keeps handing out cursors, no fetch happens once the accumulated orders
/// cover that total. Any page fetch error is returned unchanged and
/// discards the pages already gathered.
pub async fn fetch_all_pages<T, F, Fut>(
    first_page: OrderPage<T>,
    mut fetch_next: F,
) -> Result<Vec<Published<T>>>
where
    F: FnMut(PageCursor) -> Fut,
    Fut: Future<Output = Result<OrderPage<T>>>,
{
    let total = first_page.count;
    let mut orders = first_page.orders;
    let mut cursor = first_page.next_cursor;

    while let Some(next_cursor) = cursor.take() {
        if orders.len() >= total {
            break;
        }
        let page = fetch_next(next_cursor).await?;
        orders.extend(page.orders);
        cursor = page.next_cursor;
    }

    Ok(orders)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use alloy::primitives::Address;
    use anyhow::anyhow;
    use chrono::DateTime;

    use super::*;

    fn published(value: u32) -> Published<u32> {
        Published {
            order: value,
            order_hash: format!("0x{value:064x}"),
            signer: Address::ZERO,
            publication_timestamp: DateTime::from_timestamp(1_686_200_000, 0).unwrap(),
            remaining: 1,
        }
    }

    fn page(values: &[u32], count: usize, next: Option<&str>) -> OrderPage<u32> {
        OrderPage {
            orders: values.iter().copied().map(published).collect(),
            count,
            next_cursor: next.map(|c| PageCursor(c.to_string())),
        }
    }

    #[tokio::test]
    async fn test_concatenates_pages_in_fetch_order() {
        let remaining = RefCell::new(VecDeque::from([
            page(&[3, 4], 5, Some("c2")),
            page(&[5], 5, None),
        ]));
        let orders = fetch_all_pages(page(&[1, 2], 5, Some("c1")), |_cursor| {
            let next = remaining.borrow_mut().pop_front().unwrap();
            async move { Ok(next) }
        })
        .await
        .unwrap();

        let values: Vec<u32> = orders.iter().map(|o| o.order).collect();
        assert_eq!(values, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_single_page_covering_total_fetches_nothing_more() {
        let orders = fetch_all_pages(page(&[1, 2], 2, Some("dangling")), |_cursor| async {
            Err(anyhow!("no second fetch expected"))
        })
        .await
        .unwrap();
        assert_eq!(orders.len(), 2);
    }

    #[tokio::test]
    async fn test_stops_at_reported_total_despite_endless_cursors() {
        let calls = RefCell::new(0u32);
        let orders = fetch_all_pages(page(&[1, 2], 4, Some("c1")), |_cursor| {
            *calls.borrow_mut() += 1;
            // A misbehaving server that always advertises another page.
            async { Ok(page(&[9, 9], 4, Some("again"))) }
        })
        .await
        .unwrap();

        assert_eq!(orders.len(), 4);
        assert_eq!(*calls.borrow(), 1);
    }

    #[tokio::test]
    async fn test_page_error_discards_prior_pages() {
        let result = fetch_all_pages(page(&[1, 2], 5, Some("c1")), |_cursor| async {
            Err(anyhow!("order book unavailable"))
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "order book unavailable");
    }
}
