//! Cursor-based tweet search over the search timeline operation.

use log::info;
use reqwest::Method;
use serde_json::json;

use super::{features, query_url, Operation};
use crate::error::ClientError;
use crate::http::Executor;
use crate::normalize;
use crate::types::{SearchOptions, SearchPage};

const SEARCH_TIMELINE: Operation = ("gkjsKepM6gl_HmFWoWKfgg", "SearchTimeline");

/// Server-side page size cap.
const MAX_PAGE_SIZE: u32 = 50;
const DEFAULT_PAGE_SIZE: u32 = 20;

/// Runs one page of a search query.
///
/// Each response yields tweets plus an optional opaque cursor extracted
/// from a sentinel entry in the result stream; when the sentinel is absent
/// there are no further pages and `next_cursor` is `None`.
pub(crate) async fn search_tweets(
    exec: &Executor,
    query: &str,
    options: &SearchOptions,
) -> Result<SearchPage, ClientError> {
    let count = options
        .max_results
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .min(MAX_PAGE_SIZE);
    info!(
        "Searching '{}' ({} results, {:?} mode)",
        query, count, options.mode
    );

    let mut variables = json!({
        "rawQuery": query,
        "count": count,
        "querySource": "typed_query",
        "product": options.mode.product(),
    });
    if let Some(cursor) = &options.cursor {
        variables["cursor"] = json!(cursor);
    }

    let url = query_url(
        &exec.endpoints,
        SEARCH_TIMELINE,
        &variables,
        Some(&features::search_timeline()),
    );
    let response = exec.execute(Method::GET, &url, None, &[]).await?;
    let page = normalize::search_page_from_graphql(&response)?;
    info!(
        "Search returned {} tweets (next page: {})",
        page.tweets.len(),
        page.next_cursor.is_some()
    );
    Ok(page)
}
