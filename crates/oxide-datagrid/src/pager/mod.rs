//! Page arithmetic and result slicing over a [`ProxyQuery`].
//!
//! A pager owns its query once attached. [`Pager::init`] counts the
//! matching rows, clamps the page and narrows the query to the page window;
//! rows are fetched lazily on the first call to [`Pager::results`] or
//! [`Pager::iter`].
//!
//! # Example
//!
//! ```
//! use oxide_datagrid::pager::Pager;
//! use oxide_datagrid::query::MemoryQuery;
//! use serde_json::json;
//!
//! let rows: Vec<_> = (1..=25).map(|id| json!({"id": id})).collect();
//! let mut pager = Pager::new(10);
//! pager.set_page(3);
//! pager.set_query(MemoryQuery::new(rows));
//! pager.init().unwrap();
//!
//! assert_eq!(pager.last_page(), 3);
//! assert_eq!(pager.first_indice(), 21);
//! assert_eq!(pager.last_indice(), 25);
//! assert_eq!(pager.results().unwrap().len(), 5);
//! ```

mod iter;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DatagridError, Result};
use crate::query::ProxyQuery;
use crate::value::Value;

pub use iter::PagerIter;

/// How a pager learns the size of the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PagerKind {
    /// Runs a count query.
    #[default]
    Default,
    /// Skips the count; looks ahead a few pages instead.
    Simple,
}

fn pages(nb_results: usize, max_per_page: usize) -> usize {
    nb_results / max_per_page + usize::from(nb_results % max_per_page != 0)
}

fn to_usize(n: i64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

/// A pager over a query.
pub struct Pager<Q: ProxyQuery> {
    kind: PagerKind,
    threshold: usize,
    page: usize,
    max_per_page: usize,
    nb_results: usize,
    last_page: usize,
    cursor: usize,
    max_record_limit: Option<usize>,
    max_page_links: usize,
    current_max_link: usize,
    parameters: HashMap<String, Value>,
    query: Option<Q>,
    results: Option<Vec<Q::Row>>,
}

impl<Q: ProxyQuery> fmt::Debug for Pager<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pager")
            .field("kind", &self.kind)
            .field("page", &self.page)
            .field("max_per_page", &self.max_per_page)
            .field("nb_results", &self.nb_results)
            .field("last_page", &self.last_page)
            .field("cursor", &self.cursor)
            .field("has_query", &self.query.is_some())
            .field("fetched", &self.results.as_ref().map(Vec::len))
            .finish_non_exhaustive()
    }
}

impl<Q: ProxyQuery> Default for Pager<Q> {
    fn default() -> Self {
        Self::new(10)
    }
}

impl<Q: ProxyQuery> Pager<Q> {
    /// Creates a counting pager with the given page size.
    ///
    /// A page size of 0 disables pagination.
    pub fn new(max_per_page: usize) -> Self {
        Self {
            kind: PagerKind::Default,
            threshold: 1,
            page: usize::from(max_per_page > 0),
            max_per_page,
            nb_results: 0,
            last_page: 1,
            cursor: 1,
            max_record_limit: None,
            max_page_links: 0,
            current_max_link: 1,
            parameters: HashMap::new(),
            query: None,
            results: None,
        }
    }

    /// Sets how the result set is sized.
    #[must_use]
    pub fn with_kind(mut self, kind: PagerKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets how many pages a simple pager looks ahead (at least 1).
    #[must_use]
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold.max(1);
        self
    }

    /// Returns the pager kind.
    pub fn kind(&self) -> PagerKind {
        self.kind
    }

    // -- page window ---------------------------------------------------------

    /// Sets the page size.
    ///
    /// 0 disables pagination and forces page 0; negative sizes count as 1.
    pub fn set_max_per_page(&mut self, max: i64) {
        if max == 0 {
            self.max_per_page = 0;
            self.page = 0;
            return;
        }
        self.max_per_page = if max > 0 { to_usize(max) } else { 1 };
        if self.page == 0 {
            self.page = 1;
        }
    }

    /// Returns the page size, 0 when pagination is disabled.
    pub fn max_per_page(&self) -> usize {
        self.max_per_page
    }

    /// Sets the requested page.
    ///
    /// Non-positive pages become 1; with pagination disabled the page is
    /// always 0. Pages past the end are clamped by [`init`](Self::init).
    pub fn set_page(&mut self, page: i64) {
        self.page = if self.max_per_page == 0 {
            0
        } else if page <= 0 {
            1
        } else {
            to_usize(page)
        };
    }

    /// Returns the current page, 0 when pagination is disabled.
    pub fn page(&self) -> usize {
        self.page
    }

    /// Caps the number of results the pager will report.
    pub fn set_max_record_limit(&mut self, limit: Option<usize>) {
        self.max_record_limit = limit;
    }

    /// Returns the record cap.
    pub fn max_record_limit(&self) -> Option<usize> {
        self.max_record_limit
    }

    /// Sets the default number of page links.
    pub fn set_max_page_links(&mut self, links: usize) {
        self.max_page_links = links;
    }

    /// Returns the default number of page links.
    pub fn max_page_links(&self) -> usize {
        self.max_page_links
    }

    // -- query ---------------------------------------------------------------

    /// Attaches the query to paginate, dropping any fetched rows.
    pub fn set_query(&mut self, query: Q) {
        self.query = Some(query);
        self.results = None;
    }

    /// Returns the attached query.
    pub fn query(&self) -> Option<&Q> {
        self.query.as_ref()
    }

    /// Returns the attached query mutably, dropping any fetched rows.
    pub fn query_mut(&mut self) -> Option<&mut Q> {
        self.results = None;
        self.query.as_mut()
    }

    /// Sizes the result set and narrows the query to the current page.
    ///
    /// Resets the cursor to 1 and drops rows fetched earlier.
    pub fn init(&mut self) -> Result<()> {
        if self.query.is_none() {
            return Err(DatagridError::MissingQuery);
        }
        self.results = None;
        self.cursor = 1;

        match self.kind {
            PagerKind::Default => self.init_counted()?,
            PagerKind::Simple => self.init_simple()?,
        }

        debug!(
            page = self.page,
            max_per_page = self.max_per_page,
            nb_results = self.nb_results,
            last_page = self.last_page,
            "pager initialised"
        );
        Ok(())
    }

    fn init_counted(&mut self) -> Result<()> {
        let Some(query) = self.query.as_mut() else {
            return Err(DatagridError::MissingQuery);
        };
        query.set_first_result(None);
        query.set_max_results(None);

        let mut nb_results = query.count()?;
        if let Some(limit) = self.max_record_limit {
            nb_results = nb_results.min(limit);
        }
        self.nb_results = nb_results;

        if self.page == 0 || self.max_per_page == 0 || nb_results == 0 {
            self.last_page = 0;
            if self.page > 0 {
                self.page = 1;
            }
            if let Some(limit) = self.max_record_limit.filter(|_| nb_results > 0) {
                query.set_max_results(Some(limit));
            }
            return Ok(());
        }

        self.last_page = pages(nb_results, self.max_per_page);
        if self.page > self.last_page {
            self.page = self.last_page;
        }

        let offset = (self.page - 1) * self.max_per_page;
        let window = self.max_per_page.min(nb_results - offset);
        query.set_first_result(Some(offset));
        query.set_max_results(Some(window));
        Ok(())
    }

    fn init_simple(&mut self) -> Result<()> {
        let Some(query) = self.query.as_mut() else {
            return Err(DatagridError::MissingQuery);
        };

        if self.page == 0 || self.max_per_page == 0 {
            query.set_first_result(None);
            query.set_max_results(None);
            let rows = query.execute()?;
            self.nb_results = rows.len();
            self.last_page = 0;
            self.results = Some(rows);
            return Ok(());
        }

        // an offset past usize::MAX cannot hold any row
        let Some(offset) = (self.page - 1).checked_mul(self.max_per_page) else {
            query.set_first_result(None);
            query.set_max_results(Some(0));
            self.nb_results = 0;
            self.last_page = (self.page - 1).max(1);
            self.results = Some(Vec::new());
            return Ok(());
        };
        query.set_first_result(Some(offset));
        query.set_max_results(Some(
            self.max_per_page
                .saturating_mul(self.threshold)
                .saturating_add(1),
        ));
        let mut rows = query.execute()?;

        self.nb_results = offset.saturating_add(rows.len());
        self.last_page = pages(rows.len(), self.max_per_page)
            .saturating_add(self.page - 1)
            .max(1);

        rows.truncate(self.max_per_page);
        query.set_max_results(Some(self.max_per_page));
        self.results = Some(rows);
        Ok(())
    }

    /// Returns the rows of the current page, fetching them once.
    pub fn results(&mut self) -> Result<&[Q::Row]> {
        if self.results.is_none() {
            let query = self.query.as_ref().ok_or(DatagridError::MissingQuery)?;
            self.results = Some(query.execute()?);
        }
        Ok(self.results.as_deref().unwrap_or_default())
    }

    /// Takes the rows of the current page out of the pager.
    ///
    /// A later call to [`results`](Self::results) fetches them again.
    pub fn take_results(&mut self) -> Result<Vec<Q::Row>> {
        self.results()?;
        Ok(self.results.take().unwrap_or_default())
    }

    /// Returns an iterator over the rows of the current page.
    pub fn iter(&mut self) -> Result<PagerIter<'_, Q::Row>> {
        Ok(PagerIter::new(self.results()?))
    }

    /// Returns the number of matching rows found by the last `init`.
    pub fn nb_results(&self) -> usize {
        self.nb_results
    }

    // -- cursor --------------------------------------------------------------

    /// Moves the cursor, clamped to `[1, nb_results]`.
    pub fn set_cursor(&mut self, position: usize) {
        self.cursor = position.max(1).min(self.nb_results);
    }

    /// Returns the cursor position (1-based over the whole result set).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Fetches the row at a 1-based position in the whole result set.
    ///
    /// Positions outside `[1, nb_results]` yield `None`.
    pub fn object_by_cursor(&self, position: usize) -> Result<Option<Q::Row>> {
        if position < 1 || position > self.nb_results {
            return Ok(None);
        }
        self.retrieve_object(position - 1)
    }

    /// Fetches the row under the cursor.
    pub fn current_object(&self) -> Result<Option<Q::Row>> {
        self.object_by_cursor(self.cursor)
    }

    /// Fetches the row after the cursor.
    pub fn next_object(&self) -> Result<Option<Q::Row>> {
        self.object_by_cursor(self.cursor + 1)
    }

    /// Fetches the row before the cursor.
    pub fn previous_object(&self) -> Result<Option<Q::Row>> {
        match self.cursor.checked_sub(1) {
            Some(position) => self.object_by_cursor(position),
            None => Ok(None),
        }
    }

    fn retrieve_object(&self, offset: usize) -> Result<Option<Q::Row>> {
        let mut query = self.query.clone().ok_or(DatagridError::MissingQuery)?;
        query.set_first_result(Some(offset));
        query.set_max_results(Some(1));
        Ok(query.execute()?.into_iter().next())
    }

    // -- navigation ----------------------------------------------------------

    /// Returns the first page number.
    pub fn first_page(&self) -> usize {
        1
    }

    /// Returns the last page number.
    pub fn last_page(&self) -> usize {
        self.last_page
    }

    /// Overrides the last page number.
    pub fn set_last_page(&mut self, page: usize) {
        self.last_page = page;
        if self.page > page && page > 0 {
            self.page = page;
        }
    }

    /// Returns the page after the current one, capped at the last page.
    pub fn next_page(&self) -> usize {
        (self.page + 1).min(self.last_page)
    }

    /// Returns the page before the current one, never below 1.
    pub fn previous_page(&self) -> usize {
        self.page.saturating_sub(1).max(1)
    }

    /// Returns true on the first page.
    pub fn is_first_page(&self) -> bool {
        self.page == 1
    }

    /// Returns true on (or past) the last page.
    pub fn is_last_page(&self) -> bool {
        self.page >= self.last_page
    }

    /// Returns true when the result set spans more than one page.
    pub fn have_to_paginate(&self) -> bool {
        self.max_per_page > 0 && self.nb_results > self.max_per_page
    }

    /// Returns the 1-based index of the first row on this page.
    pub fn first_indice(&self) -> usize {
        if self.page == 0 {
            1
        } else {
            (self.page - 1)
                .saturating_mul(self.max_per_page)
                .saturating_add(1)
        }
    }

    /// Returns the 1-based index of the last row on this page.
    pub fn last_indice(&self) -> usize {
        if self.page == 0 {
            self.nb_results
        } else {
            self.page
                .saturating_mul(self.max_per_page)
                .min(self.nb_results)
        }
    }

    /// Returns page numbers to link to, centred on the current page.
    ///
    /// `nb_links` defaults to the configured maximum.
    pub fn links(&mut self, nb_links: Option<usize>) -> Vec<usize> {
        let nb_links = nb_links.unwrap_or(self.max_page_links);
        let limit = (self.last_page + 1).saturating_sub(nb_links).max(1);
        let begin = self.page.saturating_sub(nb_links / 2).max(1).min(limit);

        let links: Vec<usize> = (begin..begin + nb_links)
            .take_while(|page| *page <= self.last_page)
            .collect();
        self.current_max_link = links.last().copied().unwrap_or(1);
        links
    }

    /// Returns the highest page returned by the last call to `links`.
    pub fn current_max_link(&self) -> usize {
        self.current_max_link
    }

    // -- parameters ----------------------------------------------------------

    /// Sets an arbitrary parameter carried alongside the pager.
    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.parameters.insert(name.into(), value.into());
    }

    /// Returns a parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    /// Returns all parameters.
    pub fn parameters(&self) -> &HashMap<String, Value> {
        &self.parameters
    }
}
