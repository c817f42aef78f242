//! Sequential catalog pagination
//!
//! Pages are fetched one at a time, in order, with no prefetching. Every
//! fetch goes through the resilient client.

use crate::catalog::{CatalogSource, ExternalRecord, LocationRecord, Selection};
use crate::remote::{InvokeError, ResilientClient};
use std::collections::HashSet;

/// Reads records out of a catalog source
pub struct CatalogReader<'a> {
    source: &'a dyn CatalogSource,
    remote: &'a ResilientClient,
}

impl<'a> CatalogReader<'a> {
    pub fn new(source: &'a dyn CatalogSource, remote: &'a ResilientClient) -> Self {
        Self { source, remote }
    }

    /// Starts a fresh pass over the catalog from its first page
    ///
    /// Each call returns an independent stream, so a failed pass can simply
    /// be restarted.
    pub fn pages(&self) -> PageStream<'a> {
        PageStream {
            source: self.source,
            remote: self.remote,
            cursor: None,
            seen_cursors: HashSet::new(),
            finished: false,
            pages_read: 0,
        }
    }

    /// Reads every page and returns all records in catalog order
    pub async fn read_all(&self) -> Result<Vec<ExternalRecord>, InvokeError> {
        let mut pages = self.pages();
        let mut records = Vec::new();

        while let Some(page) = pages.next_page().await {
            records.extend(page?);
        }

        tracing::info!(
            "Read {} catalog records across {} pages",
            records.len(),
            pages.pages_read()
        );
        Ok(records)
    }

    /// Reads the whole catalog, then applies the selection predicate
    ///
    /// The predicate depends on global position (the record id), so it is
    /// only applied once all pages are in.
    pub async fn read_selected(
        &self,
        selection: &Selection,
    ) -> Result<Vec<ExternalRecord>, InvokeError> {
        let records = self.read_all().await?;
        let total = records.len();
        let selected = selection.apply(records);
        tracing::info!("Selected {} of {} catalog records", selected.len(), total);
        Ok(selected)
    }

    /// Fetches a single record by id
    pub async fn get_by_id(&self, id: u64) -> Result<ExternalRecord, InvokeError> {
        let source = self.source;
        let operation = format!("catalog get character {}", id);
        self.remote
            .invoke(&operation, move || source.get_by_id(id))
            .await
    }

    /// Follows a relation link to the related record
    pub async fn get_by_relation_link(&self, url: &str) -> Result<LocationRecord, InvokeError> {
        let source = self.source;
        let operation = format!("catalog get {}", url);
        self.remote
            .invoke(&operation, move || source.get_by_relation_link(url))
            .await
    }
}

/// A lazy, finite pass over the catalog's pages
pub struct PageStream<'a> {
    source: &'a dyn CatalogSource,
    remote: &'a ResilientClient,
    cursor: Option<String>,
    seen_cursors: HashSet<String>,
    finished: bool,
    pages_read: usize,
}

impl<'a> PageStream<'a> {
    /// Fetches the next page
    ///
    /// Returns `None` once the continuation cursor is absent. A failed fetch
    /// is returned once and ends the stream.
    pub async fn next_page(&mut self) -> Option<Result<Vec<ExternalRecord>, InvokeError>> {
        if self.finished {
            return None;
        }

        let source = self.source;
        let cursor = self.cursor.as_deref();
        let operation = format!("catalog page {}", self.pages_read + 1);
        let result = self
            .remote
            .invoke(&operation, move || source.list_page(cursor))
            .await;

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                self.finished = true;
                return Some(Err(e));
            }
        };

        self.pages_read += 1;

        match page.next_cursor {
            // A cursor we've already followed would loop forever
            Some(next) if self.seen_cursors.insert(next.clone()) => self.cursor = Some(next),
            Some(next) => {
                tracing::warn!("Catalog cursor {} repeated, stopping pagination", next);
                self.finished = true;
            }
            None => self.finished = true,
        }

        Some(Ok(page.records))
    }

    /// Number of pages successfully fetched so far
    pub fn pages_read(&self) -> usize {
        self.pages_read
    }
}
