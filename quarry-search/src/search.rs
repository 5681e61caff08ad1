//! Search execution: paged lists and scroll cursors.

use crate::{
    document::Document,
    error::{Result, SearchError},
    query::Query,
    scroll::{Cursor, Scroll},
    translate::{SearchResult, translate},
    transport::{RawSearchResponse, SearchRequest},
};
use quarry_log::debug;

impl<T: Document> Query<T> {
    /// Request for this query with the given window. Scrolls pass no offset.
    pub fn to_request(&self, size: i64, from: Option<i64>) -> SearchRequest {
        SearchRequest {
            indices: self.index.names().to_vec(),
            doc_type: self.index.doc_type().to_string(),
            query: self.bool_query.to_json(),
            source: self.index.schema().projection().map(<[String]>::to_vec),
            sort: self.sort.clone(),
            size,
            from,
        }
    }

    /// Run one search with an explicit window and return the raw response.
    ///
    /// A response without a hit container is [`SearchError::EmptyResult`];
    /// zero matches still come back as an empty container.
    pub async fn search(&self, size: i64, from: i64) -> Result<RawSearchResponse> {
        let request = self.to_request(size, Some(from));
        debug!(
            "Searching indices {:?} (size {}, from {})",
            request.indices, size, from
        );

        let response = self.index.transport().search(&request).await?;
        if !response.has_hits_container() {
            return Err(SearchError::EmptyResult);
        }
        Ok(response)
    }

    /// Fetch the page selected by [`Query::page`].
    pub async fn list(&self) -> Result<SearchResult<T>> {
        let response = self.search(self.size, self.from).await?;
        translate(self.index.schema(), response, self.index.doc_type())
    }

    /// Open a scroll cursor over every match.
    ///
    /// The first batch is fetched here; later batches are prefetched by a
    /// background task as the returned [`Scroll`] is drained. Must be called
    /// within a Tokio runtime.
    pub async fn scroll(&self) -> Result<Scroll<T>> {
        let request = self.to_request(self.scroll_size, None);
        let transport = self.index.transport();

        debug!(
            "Opening scroll on indices {:?} (batch {}, keep alive {})",
            request.indices, self.scroll_size, self.scroll_keep_alive
        );

        let response = transport
            .open_scroll(&request, &self.scroll_keep_alive)
            .await?;
        let scroll_id = response.scroll_id.clone().ok_or(SearchError::EmptyResult)?;

        let cursor = Cursor::new(
            transport,
            self.index.shared_schema(),
            self.index.doc_type(),
            scroll_id,
            &self.scroll_keep_alive,
        );

        match translate(self.index.schema(), response, self.index.doc_type()) {
            Ok(first) => Ok(Scroll::start(cursor, first)),
            Err(e) => {
                cursor.release().await;
                Err(e)
            }
        }
    }
}
