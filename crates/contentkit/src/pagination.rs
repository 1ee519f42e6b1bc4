//! Fetch-all pagination over offset/limit list endpoints.
//!
//! [`fetch_all`] walks a list endpoint page by page through a [`PageFetcher`],
//! merging `contents` while checking that the server's `totalCount` stays put
//! and that the merge stays under a safety ceiling. It never retries; a failed
//! page fails the whole call with `{page, offset}` attached to the error.

use crate::config::{DEFAULT_MAX_ALL_ITEMS, DEFAULT_PAGE_SIZE};
use crate::observability::FetchProgress;
use async_trait::async_trait;
use contentkit_core::error::{ClassifiedError, Result};
use contentkit_transport::ApiResponse;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;

/// Hard cap on the number of pages one fetch-all may request.
pub const MAX_PAGES: u32 = 10_000;

/// A list request: endpoint, paging window and extra query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Endpoint name, e.g. `blogs`
    pub endpoint: String,
    /// Page size
    pub limit: Option<u32>,
    /// Items to skip
    pub offset: Option<u64>,
    /// Extra query parameters (`filters`, `orders`, `fields`, `q`, ...)
    pub params: BTreeMap<String, String>,
}

impl ListQuery {
    /// Query for an endpoint with server defaults.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Set the page size.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the offset.
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Add a query parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Query pairs in wire order: `limit`, `offset`, then extras by name.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.params.len() + 2);
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset".to_string(), offset.to_string()));
        }
        pairs.extend(self.params.iter().map(|(k, v)| (k.clone(), v.clone())));
        pairs
    }
}

/// Merged result of a list or fetch-all call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPage {
    /// Items in server order
    pub contents: Vec<Value>,
    /// Server-reported total
    pub total_count: u64,
    /// Offset of the first item
    #[serde(default)]
    pub offset: u64,
    /// Number of items requested, or merged for fetch-all
    #[serde(default)]
    pub limit: u64,
}

/// The shape every page must decode into.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageShape {
    contents: Vec<Value>,
    total_count: u64,
}

/// Bounds for one fetch-all call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    /// Page size when the query sets none
    pub page_size: u32,
    /// Safety ceiling on merged items
    pub max_items: usize,
    /// Safety cap on requested pages
    pub max_pages: u32,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_items: DEFAULT_MAX_ALL_ITEMS,
            max_pages: MAX_PAGES,
        }
    }
}

impl FetchLimits {
    /// Override the default page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Override the safety ceiling.
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }
}

/// Fetches one page of a list endpoint.
///
/// Closures returning a future implement this, so tests can script pages
/// without a network:
///
/// ```rust
/// use contentkit::pagination::{ListQuery, PageFetcher};
/// use contentkit_core::error::ClassifiedError;
/// use contentkit_transport::ApiResponse;
/// use serde_json::json;
///
/// let fetcher = |query: ListQuery| async move {
///     Ok::<_, ClassifiedError>(ApiResponse {
///         data: json!({"contents": [], "totalCount": 0, "offset": query.offset}),
///         request_id: None,
///         status: 200,
///     })
/// };
/// # fn assert_fetcher<F: PageFetcher>(_: &F) {}
/// # assert_fetcher(&fetcher);
/// ```
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the page described by `query`.
    async fn fetch_page(&self, query: &ListQuery) -> Result<ApiResponse<Value>>;
}

#[async_trait]
impl<F, Fut> PageFetcher for F
where
    F: Fn(ListQuery) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ApiResponse<Value>>> + Send + 'static,
{
    async fn fetch_page(&self, query: &ListQuery) -> Result<ApiResponse<Value>> {
        (self)(query.clone()).await
    }
}

/// Fetch every item of a list endpoint.
///
/// Starts at the query's offset (default 0) with the query's limit (default
/// `limits.page_size`) and advances the offset by the number of items each
/// page actually returned. Stops when the merged count reaches `totalCount`
/// or a page comes back empty.
///
/// # Errors
///
/// All of these are `ApiError`s, except fetcher errors which pass through:
/// - a page that is not `{contents: [...], totalCount: n}`
/// - `fetch-all: inconsistent totalCount between pages`
/// - `fetch-all: exceeded safety limit` when more than `limits.max_items`
///   would be merged
/// - `fetch-all: reached safety cap` after `limits.max_pages` pages
pub async fn fetch_all<F>(query: &ListQuery, fetcher: &F, limits: FetchLimits) -> Result<ContentPage>
where
    F: PageFetcher + ?Sized,
{
    let page_size = query.limit.unwrap_or(limits.page_size).max(1);
    let start_offset = query.offset.unwrap_or(0);
    let progress = FetchProgress::new(&query.endpoint);

    let mut offset = start_offset;
    let mut total_count: Option<u64> = None;
    let mut merged: Vec<Value> = Vec::new();
    let mut page: u32 = 0;

    loop {
        page += 1;
        if page > limits.max_pages {
            return Err(ClassifiedError::api(format!(
                "fetch-all: reached safety cap of {} pages",
                limits.max_pages
            ))
            .with_detail("page", page)
            .with_detail("offset", offset)
            .with_detail("maxPages", limits.max_pages));
        }

        let page_query = query.clone().with_limit(page_size).with_offset(offset);
        let response = fetcher
            .fetch_page(&page_query)
            .await
            .map_err(|e| e.with_detail("page", page).with_detail("offset", offset))?;

        let request_id = response.request_id;
        let shape: PageShape = serde_json::from_value(response.data).map_err(|e| {
            ClassifiedError::api(format!(
                "fetch-all requires a list response containing contents/totalCount ({})",
                e
            ))
            .with_request_id(request_id.clone())
            .with_detail("page", page)
            .with_detail("offset", offset)
        })?;

        let expected = match total_count {
            None => {
                let remaining = shape.total_count.saturating_sub(start_offset);
                if remaining > limits.max_items as u64 {
                    return Err(exceeded_limit(limits.max_items, page, offset)
                        .with_detail("totalCount", shape.total_count));
                }
                total_count = Some(shape.total_count);
                shape.total_count
            }
            Some(expected) if expected != shape.total_count => {
                return Err(ClassifiedError::api(
                    "fetch-all: inconsistent totalCount between pages",
                )
                .with_request_id(request_id)
                .with_detail("page", page)
                .with_detail("offset", offset)
                .with_detail("expected", expected)
                .with_detail("actual", shape.total_count));
            }
            Some(expected) => expected,
        };

        let returned = shape.contents.len();
        progress.log_page(page, offset, returned, expected);

        if returned == 0 {
            break;
        }

        merged.extend(shape.contents);
        if merged.len() > limits.max_items {
            return Err(exceeded_limit(limits.max_items, page, offset));
        }

        offset += returned as u64;
        if offset >= expected {
            break;
        }
    }

    progress.log_complete(page, merged.len());

    Ok(ContentPage {
        total_count: total_count.unwrap_or(0),
        offset: start_offset,
        limit: merged.len() as u64,
        contents: merged,
    })
}

fn exceeded_limit(max_items: usize, page: u32, offset: u64) -> ClassifiedError {
    ClassifiedError::api(format!(
        "fetch-all: exceeded safety limit of {} items",
        max_items
    ))
    .with_detail("page", page)
    .with_detail("offset", offset)
    .with_detail("limit", max_items as u64)
}
