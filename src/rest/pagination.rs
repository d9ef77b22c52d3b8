//! Pagination over list endpoints.
//!
//! Pages are followed in this order of preference:
//!
//! 1. a `Link: <...>; rel="next"` header
//! 2. an absolute `next` URL in a JSON object body
//! 3. incrementing the `page` query parameter, stopping at an empty page or
//!    at a page shorter than `per_page`
//!
//! When a response carries a `Link` header or a `next` field but no next
//! URL, the list is complete and no page increment is attempted.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::stream::{self, Stream};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::clients::{HttpError, HttpMethod, HttpResponse, PageTemplate, RequestExecutor};

/// Keys searched, in order, for the item array of an object body.
pub const DEFAULT_ITEM_KEYS: [&str; 4] = ["items", "data", "results", "values"];

/// Page number assumed by servers when no page parameter is sent.
const DEFAULT_START_PAGE: u32 = 1;

/// Settings for [`paginate`](crate::PathBuilder::paginate) and
/// [`stream`](crate::PathBuilder::stream).
///
/// # Example
///
/// ```rust
/// use fluent_rest::PageOptions;
///
/// let pages = PageOptions::new()
///     .items_key("repositories")
///     .per_page(100)
///     .max_pages(10);
/// assert_eq!(pages.page_param, "page");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageOptions {
    /// Field of an object body holding the items. When `None` the body
    /// itself (if an array) or the first of [`DEFAULT_ITEM_KEYS`] is used.
    pub items_key: Option<String>,
    /// Query parameter carrying the page number.
    pub page_param: String,
    /// Query parameter carrying the page size.
    pub per_page_param: String,
    /// Page size to request. Also used to detect the last page.
    pub per_page: Option<u32>,
    /// Number of the first page.
    pub start_page: u32,
    /// Stop after this many pages.
    pub max_pages: Option<u32>,
}

impl PageOptions {
    /// Creates options with the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads items from `key` of an object body.
    #[must_use]
    pub fn items_key(mut self, key: impl Into<String>) -> Self {
        self.items_key = Some(key.into());
        self
    }

    /// Uses a different page number parameter.
    #[must_use]
    pub fn page_param(mut self, param: impl Into<String>) -> Self {
        self.page_param = param.into();
        self
    }

    /// Uses a different page size parameter.
    #[must_use]
    pub fn per_page_param(mut self, param: impl Into<String>) -> Self {
        self.per_page_param = param.into();
        self
    }

    /// Requests pages of `per_page` items.
    #[must_use]
    pub const fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    /// Starts counting pages at `page`.
    #[must_use]
    pub const fn start_page(mut self, page: u32) -> Self {
        self.start_page = page;
        self
    }

    /// Stops after `max_pages` pages.
    #[must_use]
    pub const fn max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            items_key: None,
            page_param: "page".to_string(),
            per_page_param: "per_page".to_string(),
            per_page: None,
            start_page: DEFAULT_START_PAGE,
            max_pages: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Cursor {
    First,
    Url(String),
    Page(u32),
}

/// Walks the pages of one list endpoint.
#[derive(Debug)]
pub(crate) struct Pager {
    executor: Arc<RequestExecutor>,
    path: String,
    template: PageTemplate,
    page: PageOptions,
    cursor: Option<Cursor>,
    fetched: u32,
}

impl Pager {
    pub(crate) fn new(
        executor: Arc<RequestExecutor>,
        path: String,
        template: PageTemplate,
        page: PageOptions,
    ) -> Self {
        Self {
            executor,
            path,
            template,
            page,
            cursor: Some(Cursor::First),
            fetched: 0,
        }
    }

    /// Fetches the next page. Returns `None` once the list is exhausted.
    pub(crate) async fn next_page<T: DeserializeOwned>(
        &mut self,
    ) -> Result<Option<Vec<T>>, HttpError> {
        if self.page.max_pages.is_some_and(|max| self.fetched >= max) {
            self.cursor = None;
        }
        let Some(cursor) = self.cursor.take() else {
            return Ok(None);
        };

        let mut options = self.template.to_options();
        let current_page = match &cursor {
            Cursor::Page(n) => *n,
            _ => self.page.start_page,
        };
        let sends_page = match cursor {
            Cursor::Page(_) => true,
            Cursor::First => current_page != DEFAULT_START_PAGE,
            Cursor::Url(_) => false,
        };
        let path = match cursor {
            Cursor::Url(url) => {
                // The next link already carries every query parameter.
                options.params.clear();
                url
            }
            Cursor::First | Cursor::Page(_) => {
                if let Some(per_page) = self.page.per_page {
                    options
                        .params
                        .insert(self.page.per_page_param.clone(), per_page.to_string());
                }
                if sends_page {
                    options
                        .params
                        .insert(self.page.page_param.clone(), current_page.to_string());
                }
                self.path.clone()
            }
        };

        let response = self
            .executor
            .request(HttpMethod::Get, path, options)
            .await?;
        self.fetched += 1;

        let (items, is_list) = extract_items(&response.body, self.page.items_key.as_deref());
        self.cursor = self.next_cursor(&response, items.len(), is_list, current_page);
        tracing::debug!(
            "Fetched page {} of {} with {} items",
            self.fetched,
            self.path,
            items.len()
        );

        let items = items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()?;
        Ok(Some(items))
    }

    fn next_cursor(
        &self,
        response: &HttpResponse,
        count: usize,
        is_list: bool,
        current_page: u32,
    ) -> Option<Cursor> {
        if let Some(next) = response.next_page_url() {
            return Some(Cursor::Url(next.to_string()));
        }

        let server_paginates = response.headers.contains_key("link")
            || response.body.get("next").is_some();
        if server_paginates || !is_list || count == 0 {
            return None;
        }

        if let Some(per_page) = self.page.per_page {
            if count < per_page as usize {
                return None;
            }
        }

        current_page.checked_add(1).map(Cursor::Page)
    }
}

/// Returns the items of a page body and whether the body was a list.
///
/// A body that holds no list is returned as a single item.
fn extract_items(body: &Value, items_key: Option<&str>) -> (Vec<Value>, bool) {
    if let Value::Array(items) = body {
        return (items.clone(), true);
    }

    let found = match items_key {
        Some(key) => body.get(key).and_then(Value::as_array),
        None => DEFAULT_ITEM_KEYS
            .iter()
            .find_map(|key| body.get(*key).and_then(Value::as_array)),
    };

    match found {
        Some(items) => (items.clone(), true),
        None if items_key.is_some() => (Vec::new(), true),
        None => (vec![body.clone()], false),
    }
}

/// Fetches every page and concatenates the items in order.
pub(crate) async fn collect<T: DeserializeOwned>(mut pager: Pager) -> Result<Vec<T>, HttpError> {
    let mut all = Vec::new();
    while let Some(items) = pager.next_page::<T>().await? {
        all.extend(items);
    }
    Ok(all)
}

/// Yields items lazily, fetching a page only when the previous one is used
/// up. A page error is yielded once and ends the stream.
pub(crate) fn into_stream<T: DeserializeOwned>(
    pager: Pager,
) -> impl Stream<Item = Result<T, HttpError>> {
    stream::unfold(
        (pager, VecDeque::new(), false),
        |(mut pager, mut buffer, finished)| async move {
            loop {
                if let Some(item) = buffer.pop_front() {
                    return Some((Ok(item), (pager, buffer, finished)));
                }
                if finished {
                    return None;
                }
                match pager.next_page::<T>().await {
                    Ok(Some(items)) => buffer.extend(items),
                    Ok(None) => return None,
                    Err(error) => return Some((Err(error), (pager, buffer, true))),
                }
            }
        },
    )
}
