//! Paginated listing
//!
//! Vendors link pages in different ways: a flat `next` field or a HAL-style
//! `_links.next.href`. Both normalize into a [`Page`] with an optional next
//! URL, and [`paginate`] turns the chain of pages into a lazy stream of
//! items.
//!
//! The stream fetches a page only when its buffered items run out, so a
//! consumer that stops early causes no further requests. A failed page fetch
//! is yielded as the last element; the stream ends after it.

use std::collections::VecDeque;

use futures::stream::{self, BoxStream, StreamExt};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::error::{ClientError, ClientResult};
use crate::http::RequestExecutor;

/// Stream of listed items
pub type ItemStream<T> = BoxStream<'static, ClientResult<T>>;

/// One page of items plus the link to the following page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<Url>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }
}

/// A decoded list response that can be normalized into a [`Page`]
pub trait Paginated {
    type Item;

    /// Normalize, resolving a relative next link against `page_url`
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] if the next link is not a valid URL.
    fn into_page(self, page_url: &Url) -> ClientResult<Page<Self::Item>>;
}

fn resolve_next(page_url: &Url, next: Option<String>) -> ClientResult<Option<Url>> {
    next.filter(|href| !href.trim().is_empty())
        .map(|href| {
            page_url
                .join(&href)
                .map_err(|e| ClientError::Config(format!("Invalid next link '{href}': {e}")))
        })
        .transpose()
}

/// List body with a top-level `next` link
#[derive(Debug, Clone, Deserialize)]
pub struct FlatNext<T> {
    #[serde(alias = "results", alias = "data")]
    pub items: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
}

impl<T> Paginated for FlatNext<T> {
    type Item = T;

    fn into_page(self, page_url: &Url) -> ClientResult<Page<T>> {
        Ok(Page { items: self.items, next: resolve_next(page_url, self.next)? })
    }
}

/// List body with a HAL `_links.next.href` link
#[derive(Debug, Clone, Deserialize)]
pub struct HalLinks<T> {
    #[serde(alias = "results", alias = "data")]
    pub items: Vec<T>,
    #[serde(default, rename = "_links")]
    pub links: Option<Links>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Links {
    #[serde(default)]
    pub next: Option<Link>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Link {
    pub href: String,
}

impl<T> Paginated for HalLinks<T> {
    type Item = T;

    fn into_page(self, page_url: &Url) -> ClientResult<Page<T>> {
        let next = self.links.and_then(|links| links.next).map(|link| link.href);
        Ok(Page { items: self.items, next: resolve_next(page_url, next)? })
    }
}

/// Append query pairs to the first page URL
///
/// Later pages use the server's next link verbatim.
pub fn with_query<K, V>(mut url: Url, pairs: impl IntoIterator<Item = (K, V)>) -> Url
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs = pairs.into_iter().peekable();
    if pairs.peek().is_some() {
        url.query_pairs_mut().extend_pairs(pairs);
    }
    url
}

struct Cursor<T> {
    executor: RequestExecutor,
    cancel: CancellationToken,
    next: Option<Url>,
    buffered: VecDeque<T>,
    pages: u32,
}

/// Lazily walk every page starting at `first`
///
/// `P` is the wire shape of one page. The returned stream is single-use.
pub fn paginate<P>(
    executor: RequestExecutor,
    cancel: CancellationToken,
    first: Url,
) -> ItemStream<P::Item>
where
    P: Paginated + DeserializeOwned + Send + 'static,
    P::Item: Send + 'static,
{
    let cursor = Cursor {
        executor,
        cancel,
        next: Some(first),
        buffered: VecDeque::new(),
        pages: 0,
    };

    stream::unfold(cursor, |mut cursor| async move {
        loop {
            if let Some(item) = cursor.buffered.pop_front() {
                return Some((Ok(item), cursor));
            }

            let url = cursor.next.take()?;
            let page = match cursor.executor.get::<P>(&cursor.cancel, url.clone()).await {
                Ok(body) => body.into_page(&url),
                Err(err) => Err(err),
            };

            match page {
                Ok(page) => {
                    cursor.pages += 1;
                    debug!(
                        page = cursor.pages,
                        items = page.items.len(),
                        has_next = page.next.is_some(),
                        "fetched page"
                    );
                    cursor.buffered.extend(page.items);
                    cursor.next = page.next;
                }
                Err(err) => return Some((Err(err), cursor)),
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn page_url() -> Url {
        Url::parse("https://api.vendor.test/v1/orders?limit=2").unwrap()
    }

    #[test]
    fn test_flat_next_relative_link() {
        let body: FlatNext<u32> =
            serde_json::from_value(json!({"items": [1, 2], "next": "/v1/orders?cursor=abc"})).unwrap();

        let page = body.into_page(&page_url()).unwrap();
        assert_eq!(page.items, vec![1, 2]);
        assert_eq!(
            page.next.unwrap().as_str(),
            "https://api.vendor.test/v1/orders?cursor=abc"
        );
    }

    #[test]
    fn test_flat_next_absent_or_empty() {
        let body: FlatNext<u32> = serde_json::from_value(json!({"results": [3]})).unwrap();
        assert_eq!(body.into_page(&page_url()).unwrap(), Page::last(vec![3]));

        let body: FlatNext<u32> =
            serde_json::from_value(json!({"items": [], "next": ""})).unwrap();
        assert_eq!(body.into_page(&page_url()).unwrap().next, None);
    }

    #[test]
    fn test_hal_links_absolute_link() {
        let body: HalLinks<String> = serde_json::from_value(json!({
            "items": ["a"],
            "_links": {"next": {"href": "https://other.vendor.test/page/2"}}
        }))
        .unwrap();

        let page = body.into_page(&page_url()).unwrap();
        assert_eq!(page.next.unwrap().as_str(), "https://other.vendor.test/page/2");
    }

    #[test]
    fn test_hal_links_without_next() {
        let body: HalLinks<String> =
            serde_json::from_value(json!({"items": ["a"], "_links": {"self": {"href": "/x"}}}))
                .unwrap();
        assert_eq!(body.into_page(&page_url()).unwrap().next, None);
    }

    #[test]
    fn test_with_query() {
        let base = Url::parse("https://api.vendor.test/v1/orders").unwrap();
        let url = with_query(base.clone(), [("status", "active"), ("limit", "10")]);
        assert_eq!(url.as_str(), "https://api.vendor.test/v1/orders?status=active&limit=10");

        let untouched = with_query(base, Vec::<(String, String)>::new());
        assert_eq!(untouched.as_str(), "https://api.vendor.test/v1/orders");
    }
}
