//! Pagination terminals
//!
//! Three shapes over the same constrained query:
//!
//! - [`QueryBuilder::paginate`]: numbered pages with a native total count.
//!   The store only supports cursor positioning, so page N is reached by
//!   reading and discarding the prior `(N-1) * per_page` rows to discover a
//!   cursor. Read cost grows with the page number; that trade-off is the
//!   contract, not an accident.
//! - [`QueryBuilder::simple_paginate`]: forward-only cursor paging, one
//!   over-fetched row to detect more pages, O(per_page) per call at any
//!   depth. No total.
//! - [`QueryBuilder::cursor_paginate`]: bidirectional cursor paging.
//!   Cursors are document ids, resolved back to sort-key positions with one
//!   extra read. `has_prev_page` on forward travel is approximated as "a
//!   cursor parameter was supplied", not a true backward existence check.

use crate::builder::QueryBuilder;
use loam_core::{CursorBound, DocId, Document, Error, QuerySpec, Result};
use loam_storage::eval::order_key_values;
use loam_storage::Datastore;
use serde_json::Value as Json;

/// Default rows per page across all three pagination shapes
pub const DEFAULT_PER_PAGE: usize = 10;

/// Arguments for [`QueryBuilder::paginate`]
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    /// Rows per page
    pub per_page: usize,
    /// 1-based page number
    pub page: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            per_page: DEFAULT_PER_PAGE,
            page: 1,
        }
    }
}

/// Arguments for [`QueryBuilder::simple_paginate`]
#[derive(Debug, Clone, Default)]
pub struct SimplePageRequest {
    /// Rows per page (defaults to [`DEFAULT_PER_PAGE`] when zero)
    pub per_page: usize,
    /// Resume after this document id
    pub cursor: Option<DocId>,
}

/// Arguments for [`QueryBuilder::cursor_paginate`]
#[derive(Debug, Clone, Default)]
pub struct CursorPageRequest {
    /// Rows per page (defaults to [`DEFAULT_PER_PAGE`] when zero)
    pub per_page: usize,
    /// Window strictly after this document id
    pub after: Option<DocId>,
    /// Window strictly before this document id
    pub before: Option<DocId>,
}

/// Page metadata for [`Page`]
#[derive(Debug, Clone, PartialEq)]
pub struct PageMeta {
    /// Total matching rows (native server-side count)
    pub total: u64,
    /// Rows per page
    pub per_page: usize,
    /// 1-based page number served
    pub current_page: usize,
    /// `ceil(total / per_page)`
    pub last_page: u64,
    /// 1-based index of the first row served, when any
    pub from: Option<u64>,
    /// 1-based index of the last row served, when any
    pub to: Option<u64>,
    /// Pages exist past this one
    pub has_more_pages: bool,
}

/// Result of [`QueryBuilder::paginate`]
#[derive(Debug, Clone)]
pub struct Page {
    /// The page's rows as plain payloads
    pub data: Vec<Json>,
    /// Totals and position
    pub meta: PageMeta,
    /// First document of the page, usable as a cursor
    pub first_doc: Option<Document>,
    /// Last document of the page, usable as a cursor
    pub last_doc: Option<Document>,
}

/// Result of [`QueryBuilder::simple_paginate`]
#[derive(Debug, Clone)]
pub struct SimplePage {
    /// The page's rows as plain payloads
    pub data: Vec<Json>,
    /// Rows per page requested
    pub per_page: usize,
    /// A further page exists
    pub has_more_pages: bool,
    /// Id of the last served row; feed back as the next call's cursor
    pub next_cursor: Option<String>,
}

/// Result of [`QueryBuilder::cursor_paginate`]
#[derive(Debug, Clone)]
pub struct CursorPage {
    /// The page's rows as plain payloads
    pub data: Vec<Json>,
    /// Rows per page requested
    pub per_page: usize,
    /// Rows exist after this window
    pub has_next_page: bool,
    /// Rows exist before this window (approximated on forward travel)
    pub has_prev_page: bool,
    /// Id of the window's first row
    pub start_cursor: Option<String>,
    /// Id of the window's last row
    pub end_cursor: Option<String>,
}

fn effective_per_page(per_page: usize) -> usize {
    if per_page == 0 {
        DEFAULT_PER_PAGE
    } else {
        per_page
    }
}

impl QueryBuilder {
    /// Resolve a document-id cursor back to its position in this query's
    /// sort order, with one extra read
    async fn resolve_cursor(&self, id: &DocId) -> Result<CursorBound> {
        let path = self.path().doc(id)?;
        let doc = self
            .client()
            .store()
            .get(&path)
            .await?
            .ok_or_else(|| {
                Error::invalid_argument(format!("cursor document {path} does not exist"))
            })?;
        Ok(CursorBound {
            order_values: order_key_values(&doc, self.orders()),
            doc_id: doc.id,
        })
    }

    fn bound_for(&self, doc: &Document) -> CursorBound {
        CursorBound {
            order_values: order_key_values(doc, self.orders()),
            doc_id: doc.id.clone(),
        }
    }

    /// Numbered pages with totals
    ///
    /// `last_page = ceil(total / per_page)` from a native count of the
    /// filtered set. Reaching page N>1 reads and discards the prior pages'
    /// rows to discover the cursor, then issues the real page read.
    pub async fn paginate(&self, request: PageRequest) -> Result<Page> {
        let per_page = effective_per_page(request.per_page);
        let page = request.page.max(1);

        let total = self.count().await?;
        let last_page = total.div_ceil(per_page as u64);

        let skip = (page - 1) * per_page;
        let mut start_after = None;
        if skip > 0 {
            let mut discard_spec: QuerySpec = self.spec();
            discard_spec.limit = Some(skip);
            let discarded = self.client().store().run_query(&discard_spec).await?;
            match discarded.last() {
                Some(last) if discarded.len() == skip => {
                    start_after = Some(self.bound_for(last));
                }
                // Fewer rows than the skip: the page is past the end
                _ => {
                    return Ok(Page {
                        data: Vec::new(),
                        meta: PageMeta {
                            total,
                            per_page,
                            current_page: page,
                            last_page,
                            from: None,
                            to: None,
                            has_more_pages: false,
                        },
                        first_doc: None,
                        last_doc: None,
                    });
                }
            }
        }

        let mut spec = self.spec();
        spec.start_after = start_after;
        spec.limit = Some(per_page);
        let docs = self.client().store().run_query(&spec).await?;

        let (from, to) = if docs.is_empty() {
            (None, None)
        } else {
            (
                Some(skip as u64 + 1),
                Some(skip as u64 + docs.len() as u64),
            )
        };
        Ok(Page {
            first_doc: docs.first().cloned(),
            last_doc: docs.last().cloned(),
            data: docs.into_iter().map(Document::into_json).collect(),
            meta: PageMeta {
                total,
                per_page,
                current_page: page,
                last_page,
                from,
                to,
                has_more_pages: (page as u64) < last_page,
            },
        })
    }

    /// Forward-only cursor paging, no total
    pub async fn simple_paginate(&self, request: SimplePageRequest) -> Result<SimplePage> {
        let per_page = effective_per_page(request.per_page);

        let mut spec = self.spec();
        if let Some(cursor) = &request.cursor {
            spec.start_after = Some(self.resolve_cursor(cursor).await?);
        }
        spec.limit = Some(per_page + 1);

        let mut docs = self.client().store().run_query(&spec).await?;
        let has_more_pages = docs.len() > per_page;
        docs.truncate(per_page);

        Ok(SimplePage {
            next_cursor: docs.last().map(|doc| doc.id.clone()),
            data: docs.into_iter().map(Document::into_json).collect(),
            per_page,
            has_more_pages,
        })
    }

    /// Bidirectional cursor paging
    ///
    /// With `after`, the window follows the cursor; the over-fetched row
    /// drives `has_next_page` and `has_prev_page` is the supplied-cursor
    /// approximation. With `before`, the window precedes the cursor from the
    /// end; the over-fetched row drives `has_prev_page` and `has_next_page`
    /// is the approximation.
    pub async fn cursor_paginate(&self, request: CursorPageRequest) -> Result<CursorPage> {
        let per_page = effective_per_page(request.per_page);
        let backward = request.before.is_some() && request.after.is_none();

        let mut spec = self.spec();
        if let Some(after) = &request.after {
            spec.start_after = Some(self.resolve_cursor(after).await?);
        }
        if let Some(before) = &request.before {
            spec.end_before = Some(self.resolve_cursor(before).await?);
        }
        spec.limit = Some(per_page + 1);
        spec.limit_to_last = backward;

        let mut docs = self.client().store().run_query(&spec).await?;
        let overfetched = docs.len() > per_page;
        let (has_next_page, has_prev_page) = if backward {
            if overfetched {
                docs.remove(0);
            }
            (true, overfetched)
        } else {
            docs.truncate(per_page);
            (overfetched, request.after.is_some() || request.before.is_some())
        };

        Ok(CursorPage {
            start_cursor: docs.first().map(|doc| doc.id.clone()),
            end_cursor: docs.last().map(|doc| doc.id.clone()),
            data: docs.into_iter().map(Document::into_json).collect(),
            per_page,
            has_next_page,
            has_prev_page,
        })
    }
}
