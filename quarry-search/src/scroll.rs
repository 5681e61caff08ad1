//! Scroll cursors with background prefetch.
//!
//! A [`Scroll`] owns a server-side cursor. A Tokio task delivers the current
//! batch one document at a time through a single-slot channel and only
//! advances the cursor once the whole batch has been taken, so at most one
//! batch is held in memory. The task ends on an empty batch, on the
//! exhaustion sentinel, on any other error, or when the consumer goes away;
//! in every case it asks the engine to release the cursor.

use crate::{
    document::{Document, Schema},
    error::Result,
    translate::{SearchResult, translate},
    transport::Transport,
};
use futures::Stream;
use quarry_log::{Level, debug, event};
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU8, AtomicU64, Ordering},
    },
};
use tokio::{sync::mpsc, task::JoinHandle};

/// Lifecycle of a scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ScrollState {
    /// Prefetch task running and delivering batches.
    Open = 0,
    /// Delivering the batch that reaches the reported total, or, once no
    /// further batch will be fetched, releasing the cursor and handing over
    /// a trailing error.
    Draining = 1,
    /// Delivery channel closed and cursor release attempted.
    Closed = 2,
}

impl ScrollState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => ScrollState::Open,
            1 => ScrollState::Draining,
            _ => ScrollState::Closed,
        }
    }
}

#[derive(Debug)]
struct Progress {
    total: AtomicU64,
    state: AtomicU8,
}

impl Progress {
    fn set_state(&self, state: ScrollState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }
}

/// Server-side cursor plus what is needed to advance and translate it.
pub(crate) struct Cursor<T> {
    transport: Arc<dyn Transport>,
    schema: Arc<Schema<T>>,
    doc_type: String,
    scroll_id: String,
    keep_alive: String,
}

impl<T: Document> Cursor<T> {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        schema: Arc<Schema<T>>,
        doc_type: &str,
        scroll_id: String,
        keep_alive: &str,
    ) -> Self {
        Self {
            transport,
            schema,
            doc_type: doc_type.to_string(),
            scroll_id,
            keep_alive: keep_alive.to_string(),
        }
    }

    async fn advance(&mut self) -> Result<SearchResult<T>> {
        let response = self
            .transport
            .scroll(&self.scroll_id, &self.keep_alive)
            .await?;

        // The engine may hand out a new id on any advance.
        if let Some(id) = &response.scroll_id
            && *id != self.scroll_id
        {
            self.scroll_id = id.clone();
        }

        translate(&self.schema, response, &self.doc_type)
    }

    /// Release the cursor. Failures are ignored.
    pub(crate) async fn release(&self) {
        if let Err(e) = self.transport.clear_scroll(&self.scroll_id).await {
            debug!("Ignoring failure to clear scroll {}: {}", self.scroll_id, e);
        }
    }
}

/// Sequential reader over a scroll cursor.
///
/// ```rust,no_run
/// # use quarry_search::{Document, Index};
/// # #[derive(Default, serde::Serialize, serde::Deserialize)]
/// # struct Article { title: String }
/// # impl Document for Article {}
/// # async fn run(articles: Index<Article>) -> quarry_search::Result<()> {
/// let mut scroll = articles.query().term("status", "published").scroll().await?;
/// while let Some(article) = scroll.next().await? {
///     println!("{}", article.title);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Scroll<T> {
    receiver: mpsc::Receiver<Result<T>>,
    scroll_id: String,
    progress: Arc<Progress>,
    task: Option<JoinHandle<()>>,
}

impl<T: Document> Scroll<T> {
    pub(crate) fn start(cursor: Cursor<T>, first: SearchResult<T>) -> Self {
        let (sender, receiver) = mpsc::channel(1);
        let progress = Arc::new(Progress {
            total: AtomicU64::new(first.total),
            state: AtomicU8::new(ScrollState::Open as u8),
        });
        let scroll_id = cursor.scroll_id.clone();

        event!(
            Level::Debug,
            "Scroll opened";
            scroll_id = scroll_id,
            total = first.total,
            first_batch = first.documents.len()
        );

        let task = tokio::spawn(prefetch(cursor, first.documents, sender, progress.clone()));

        Self {
            receiver,
            scroll_id,
            progress,
            task: Some(task),
        }
    }

    /// Next document. `Ok(None)` marks the end of the stream; a failure that
    /// ended the stream is returned once, after every delivered document.
    pub async fn next(&mut self) -> Result<Option<T>> {
        match self.receiver.recv().await {
            Some(Ok(doc)) => Ok(Some(doc)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }

    /// Total matches, as last reported by the engine.
    pub fn total(&self) -> u64 {
        self.progress.total.load(Ordering::SeqCst)
    }

    /// Cursor identifier assigned when the scroll was opened.
    pub fn scroll_id(&self) -> &str {
        &self.scroll_id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ScrollState {
        ScrollState::from_u8(self.progress.state.load(Ordering::SeqCst))
    }

    /// Stop early. Undelivered documents are discarded and the call returns
    /// once the cursor release has been attempted.
    pub async fn close(mut self) {
        self.receiver.close();
        while self.receiver.recv().await.is_some() {}
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    /// Adapt into a [`Stream`]. A terminal error is yielded as the last item.
    pub fn into_stream(self) -> impl Stream<Item = Result<T>> {
        futures::stream::unfold(self, |mut scroll| async move {
            match scroll.next().await {
                Ok(Some(doc)) => Some((Ok(doc), scroll)),
                Ok(None) => None,
                Err(e) => Some((Err(e), scroll)),
            }
        })
    }
}

impl<T> fmt::Debug for Scroll<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scroll")
            .field("scroll_id", &self.scroll_id)
            .field("total", &self.progress.total.load(Ordering::SeqCst))
            .field(
                "state",
                &ScrollState::from_u8(self.progress.state.load(Ordering::SeqCst)),
            )
            .finish()
    }
}

async fn prefetch<T: Document>(
    mut cursor: Cursor<T>,
    first: Vec<T>,
    sender: mpsc::Sender<Result<T>>,
    progress: Arc<Progress>,
) {
    let mut batch = first;
    let mut delivered: u64 = 0;

    let failure = 'stream: loop {
        if batch.is_empty() {
            break None;
        }

        if delivered + batch.len() as u64 >= progress.total.load(Ordering::SeqCst) {
            progress.set_state(ScrollState::Draining);
        }

        for doc in batch.drain(..) {
            if sender.send(Ok(doc)).await.is_err() {
                debug!(
                    "Scroll {} abandoned after {} documents",
                    cursor.scroll_id, delivered
                );
                break 'stream None;
            }
            delivered += 1;
        }

        match cursor.advance().await {
            Ok(next) => {
                progress.total.store(next.total, Ordering::SeqCst);
                batch = next.documents;
            }
            Err(e) if e.is_exhausted() => break None,
            Err(e) => break Some(e),
        }
    };

    progress.set_state(ScrollState::Draining);
    cursor.release().await;

    event!(
        Level::Debug,
        "Scroll finished";
        scroll_id = cursor.scroll_id,
        delivered = delivered,
        failed = failure.is_some()
    );

    if let Some(e) = failure {
        let _ = sender.send(Err(e)).await;
    }

    progress.set_state(ScrollState::Closed);
}
