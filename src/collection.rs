//! Paged views of append-only collections
//!
//! Remote servers walk a collection with a cursor: `min_id` is an exclusive lower bound on
//! item ids, and each page's `next` link carries the id of that page's last item.  Items come
//! out in ascending id order, so new items are picked up by following `next` again later.
//!
//! **NOTE**: an empty page does not link forward.  Its `next` drops `min_id`, pointing back
//! to the start of the collection, so a client that follows `next` blindly after the end
//! starts over instead of looping on the same empty page.
mod envelope;

pub use envelope::{Collection, CollectionPage, Envelope, Items};

use crate::ap::{Status, ACTIVITY_STREAMS};
use crate::store::{self, Store};

use async_trait::async_trait;

/// Query parameters that narrow a collection, echoed into every link
pub trait Filters {
    fn query_pairs(&self) -> Vec<(&'static str, String)>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageItem {
    /// The cursor value for this item
    pub id: String,
    pub uri: String,
}

/// An ordered item source a collection pages over
#[async_trait]
pub trait PageSource: Send + Sync {
    type Filters: Filters + Send + Sync;

    /// Up to `limit` items in ascending id order, strictly after `min_id`
    async fn fetch(
        &self,
        min_id: Option<&str>,
        filters: &Self::Filters,
        limit: usize,
    ) -> store::Result<Vec<PageItem>>;
}

#[derive(Debug, Clone, Copy)]
pub struct Pager {
    page_size: usize,
}

impl Pager {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    pub async fn page<S: PageSource>(
        &self,
        root: &str,
        paged: bool,
        min_id: Option<&str>,
        filters: &S::Filters,
        source: &S,
    ) -> store::Result<Envelope> {
        let filter_query = query(filters.query_pairs());

        if !paged {
            let mut first = CollectionPage::new(link(root, &["page=true"]), root.to_string());
            first.next = Some(link(root, &[filter_query.as_str(), "page=true"]));
            return Ok(Envelope::Collection(Collection::new(root.to_string(), first)));
        }

        let items = source.fetch(min_id, filters, self.page_size).await?;
        let cursor = min_id.map(|id| format!("min_id={}", urlencoding::encode(id)));
        let next_cursor = items
            .last()
            .map(|last| format!("min_id={}", urlencoding::encode(&last.id)));

        let mut page = CollectionPage::new(
            link(
                root,
                &["page=true", filter_query.as_str(), cursor.as_deref().unwrap_or_default()],
            ),
            root.to_string(),
        );
        page.context = Some(ACTIVITY_STREAMS);
        page.next = Some(link(
            root,
            &[filter_query.as_str(), "page=true", next_cursor.as_deref().unwrap_or_default()],
        ));
        page.items = Some(items.into_iter().map(|item| item.uri).collect::<Vec<_>>().into());
        Ok(Envelope::Page(page))
    }
}

fn query(pairs: Vec<(&'static str, String)>) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// `root?` followed by the non-empty query parts
fn link(root: &str, parts: &[&str]) -> String {
    let query = parts
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", root, query)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RepliesFilters {
    pub only_other_accounts: bool,
}

impl Filters for RepliesFilters {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![("only_other_accounts", self.only_other_accounts.to_string())]
    }
}

/// The replies to one status
pub struct Replies<'a> {
    store: &'a dyn Store,
    status: &'a Status,
}

impl<'a> Replies<'a> {
    pub fn new(store: &'a dyn Store, status: &'a Status) -> Self {
        Self { store, status }
    }

    /// The collection's own URI
    pub fn root(&self) -> String {
        format!("{}/replies", self.status.uri)
    }
}

#[async_trait]
impl PageSource for Replies<'_> {
    type Filters = RepliesFilters;

    async fn fetch(
        &self,
        min_id: Option<&str>,
        filters: &RepliesFilters,
        limit: usize,
    ) -> store::Result<Vec<PageItem>> {
        let replies = self
            .store
            .status_replies(self.status, min_id, filters.only_other_accounts, limit)
            .await?;
        Ok(replies
            .into_iter()
            .map(|reply| PageItem {
                id: reply.id,
                uri: reply.uri,
            })
            .collect())
    }
}
