//! Property-based tests for fetch-all pagination
//!
//! Pages are served from memory by closure fetchers, so no network is involved.

use contentkit::{ApiResponse, ErrorKind, FetchLimits, ListQuery, Result, fetch_all};
use proptest::prelude::*;
use serde_json::{Value, json};

fn serve(query: &ListQuery, total: u64, drift_after: Option<u64>) -> Result<ApiResponse<Value>> {
    let offset = query.offset.unwrap_or(0);
    let limit = u64::from(query.limit.unwrap_or(100));
    let end = (offset + limit).min(total);
    let contents: Vec<Value> = (offset..end).map(|i| json!({"id": i})).collect();
    let reported = match drift_after {
        Some(after) if offset >= after => total + 1,
        _ => total,
    };
    Ok(ApiResponse {
        data: json!({"contents": contents, "totalCount": reported}),
        request_id: None,
        status: 200,
    })
}

proptest! {
    #[test]
    fn prop_fetch_all_returns_every_item_once(total in 0u64..300, page_size in 1u32..50) {
        let fetcher = move |query: ListQuery| async move { serve(&query, total, None) };
        let limits = FetchLimits::default().with_page_size(page_size);

        let page = tokio_test::block_on(fetch_all(&ListQuery::new("items"), &fetcher, limits)).unwrap();

        let ids: Vec<u64> = page.contents.iter().map(|v| v["id"].as_u64().unwrap()).collect();
        let expected: Vec<u64> = (0..total).collect();
        prop_assert_eq!(ids, expected);
        prop_assert_eq!(page.total_count, total);
        prop_assert_eq!(page.limit, total);
    }

    #[test]
    fn prop_drift_is_always_rejected(total in 2u64..200, page_size in 1u32..20) {
        prop_assume!(u64::from(page_size) < total);
        let fetcher = move |query: ListQuery| async move {
            serve(&query, total, Some(u64::from(page_size)))
        };
        let limits = FetchLimits::default().with_page_size(page_size);

        let err = tokio_test::block_on(fetch_all(&ListQuery::new("items"), &fetcher, limits))
            .unwrap_err();

        prop_assert_eq!(err.kind(), ErrorKind::ApiError);
        prop_assert_eq!(err.message(), "fetch-all: inconsistent totalCount between pages");
    }

    #[test]
    fn prop_ceiling_is_enforced(total in 1u64..500, max_items in 0usize..500) {
        let fetcher = move |query: ListQuery| async move { serve(&query, total, None) };
        let limits = FetchLimits::default().with_page_size(25).with_max_items(max_items);

        let result = tokio_test::block_on(fetch_all(&ListQuery::new("items"), &fetcher, limits));

        if total as usize > max_items {
            let err = result.unwrap_err();
            prop_assert_eq!(
                err.message(),
                format!("fetch-all: exceeded safety limit of {} items", max_items)
            );
        } else {
            prop_assert_eq!(result.unwrap().contents.len() as u64, total);
        }
    }
}
