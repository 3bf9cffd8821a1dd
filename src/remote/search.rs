//! Discovery queries and paging

use crate::core::error::Result;
use crate::remote::RepositoryClient;
use std::collections::BTreeMap;
use std::collections::VecDeque;

/// Number of hits requested per page
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Index field holding an entity's reference
pub const REFERENCE_FIELD: &str = "xip.reference";
/// Index field holding the entity type
pub const DOCUMENT_TYPE_FIELD: &str = "xip.document_type";
/// Index field holding the ancestors of an entity
pub const PARENT_HIERARCHY_FIELD: &str = "xip.parent_hierarchy";
/// Document type of assets (information objects)
pub const ASSET_DOCUMENT_TYPE: &str = "IO";

/// Query text plus exact-match field filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    pub filters: BTreeMap<String, String>,
}

impl SearchQuery {
    /// All assets, optionally limited to those below a collection
    pub fn assets(collection: Option<&str>) -> Self {
        let mut filters = BTreeMap::new();
        filters.insert(DOCUMENT_TYPE_FIELD.to_string(), ASSET_DOCUMENT_TYPE.to_string());
        if let Some(collection) = collection {
            filters.insert(PARENT_HIERARCHY_FIELD.to_string(), collection.to_string());
        }
        Self {
            query: "%".to_string(),
            filters,
        }
    }
}

/// One page of search hits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    /// References of the hits on this page, in result order
    pub references: Vec<String>,
    /// Total hits for the query, across all pages
    pub total_hits: usize,
}

/// Iterator over every reference matching a query, fetched page by page.
/// A failing page ends iteration after yielding its error.
pub struct SearchResults<'a> {
    client: &'a dyn RepositoryClient,
    query: SearchQuery,
    page_size: usize,
    next_start: usize,
    total_hits: Option<usize>,
    buffered: VecDeque<String>,
    failed: bool,
}

impl<'a> SearchResults<'a> {
    pub fn new(client: &'a dyn RepositoryClient, query: SearchQuery) -> Self {
        Self::with_page_size(client, query, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(
        client: &'a dyn RepositoryClient,
        query: SearchQuery,
        page_size: usize,
    ) -> Self {
        Self {
            client,
            query,
            page_size: page_size.max(1),
            next_start: 0,
            total_hits: None,
            buffered: VecDeque::new(),
            failed: false,
        }
    }

    /// Total hits reported by the first page, once fetched
    pub fn total_hits(&self) -> Option<usize> {
        self.total_hits
    }

    fn exhausted(&self) -> bool {
        matches!(self.total_hits, Some(total) if self.next_start >= total)
    }
}

impl Iterator for SearchResults<'_> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(reference) = self.buffered.pop_front() {
                return Some(Ok(reference));
            }
            if self.failed || self.exhausted() {
                return None;
            }

            match self.client.search_page(&self.query, self.next_start, self.page_size) {
                Ok(page) => {
                    self.total_hits = Some(page.total_hits);
                    if page.references.is_empty() {
                        // server reported more hits than it returned
                        self.next_start = page.total_hits;
                        return None;
                    }
                    self.next_start += page.references.len();
                    self.buffered.extend(page.references);
                }
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
