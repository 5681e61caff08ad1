//! Integration tests for common Quarry workflows.
//!
//! These tests drive the facade crate end to end against a small in-memory
//! transport.

use async_trait::async_trait;
use futures::TryStreamExt;
use quarry::prelude::*;
use quarry::{RawHit, RawSearchResponse, SearchRequest, Transport};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Event {
    kind: String,
    seq: i64,
    #[serde(default, skip_serializing)]
    id: String,
}

impl Document for Event {
    fn metadata() -> Vec<(MetaField, &'static str)> {
        vec![(MetaField::Id, "id")]
    }
}

/// Serves `count` events in batches of the requested size.
struct Events {
    count: usize,
    position: Mutex<usize>,
    batch: Mutex<usize>,
    released: Mutex<bool>,
}

impl Events {
    fn new(count: usize) -> Self {
        Self {
            count,
            position: Mutex::new(0),
            batch: Mutex::new(0),
            released: Mutex::new(false),
        }
    }

    fn window(&self, from: usize, size: usize) -> Vec<RawHit> {
        (from..self.count.min(from + size))
            .map(|n| RawHit::new(format!("e{}", n), "events", json!({ "kind": "click", "seq": n })))
            .collect()
    }
}

#[async_trait]
impl Transport for Events {
    async fn search(&self, request: &SearchRequest) -> quarry::Result<RawSearchResponse> {
        let from = request.from.unwrap_or(0) as usize;
        let hits = self.window(from, request.size as usize);
        Ok(RawSearchResponse::with_hits(self.count as u64, hits))
    }

    async fn open_scroll(
        &self,
        request: &SearchRequest,
        _keep_alive: &str,
    ) -> quarry::Result<RawSearchResponse> {
        let size = request.size as usize;
        *self.batch.lock().unwrap() = size;
        *self.position.lock().unwrap() = size;
        Ok(RawSearchResponse::with_hits(self.count as u64, self.window(0, size)).scroll_id("events-1"))
    }

    async fn scroll(&self, scroll_id: &str, _keep_alive: &str) -> quarry::Result<RawSearchResponse> {
        let size = *self.batch.lock().unwrap();
        let mut position = self.position.lock().unwrap();
        let hits = self.window(*position, size);
        if hits.is_empty() {
            return Err(SearchError::ScrollExhausted);
        }
        *position += hits.len();
        Ok(RawSearchResponse::with_hits(self.count as u64, hits).scroll_id(scroll_id))
    }

    async fn clear_scroll(&self, _scroll_id: &str) -> quarry::Result<()> {
        *self.released.lock().unwrap() = true;
        Ok(())
    }

    async fn get(&self, _index: &str, _doc_type: &str, id: &str) -> quarry::Result<Option<RawHit>> {
        let n: Option<usize> = id.strip_prefix('e').and_then(|n| n.parse().ok());
        Ok(n.filter(|n| *n < self.count)
            .map(|n| RawHit::new(id, "events", json!({ "kind": "click", "seq": n }))))
    }

    async fn index(&self, _: &str, _: &str, _: &str, _: Value) -> quarry::Result<()> {
        Ok(())
    }

    async fn update(&self, _: &str, _: &str, _: &str, _: Value) -> quarry::Result<()> {
        Ok(())
    }

    async fn delete(&self, _: &str, _: &str, _: &str) -> quarry::Result<bool> {
        Ok(false)
    }

    async fn create_index(&self, _: &str, _: Value) -> quarry::Result<()> {
        Ok(())
    }

    async fn delete_index(&self, _: &[String]) -> quarry::Result<()> {
        Ok(())
    }

    async fn index_exists(&self, name: &str) -> quarry::Result<bool> {
        Ok(name == "events")
    }

    async fn ping(&self) -> quarry::Result<bool> {
        Ok(true)
    }
}

fn client(events: Arc<Events>) -> SearchClient {
    SearchClient::with_transport(events, SearchConfig::new("http://localhost:9200"))
}

#[tokio::test]
async fn test_page_through_results() {
    let client = client(Arc::new(Events::new(45)));
    let events = client.index::<Event>("events");

    let mut seen = 0;
    for page in 1..=3 {
        let result = events.query().term("kind", "click").page(page, 20).list().await.unwrap();
        assert_eq!(result.total, 45);
        seen += result.len();
    }
    assert_eq!(seen, 45);
}

#[tokio::test]
async fn test_stream_everything() {
    let source = Arc::new(Events::new(120));
    let client = client(source.clone());

    let events: Vec<Event> = client
        .index::<Event>("events")
        .query()
        .scroll_size(50)
        .scroll()
        .await
        .unwrap()
        .into_stream()
        .try_collect()
        .await
        .unwrap();

    assert_eq!(events.len(), 120);
    assert_eq!(events[119].id, "e119");
    assert_eq!(events[119].seq, 119);
    assert!(*source.released.lock().unwrap());
}

#[tokio::test]
async fn test_lookup_and_admin() {
    let client = client(Arc::new(Events::new(3)));
    let events = client.index::<Event>("events");

    assert_eq!(events.find("e2").await.unwrap().unwrap().seq, 2);
    assert!(events.find("e9").await.unwrap().is_none());
    assert!(client.index_exists("events").await.unwrap());
    assert!(client.ping().await.unwrap());
}

#[test]
fn test_logging_is_reachable_through_the_facade() {
    quarry::log::set_level(quarry::log::Level::Warn);
    assert!(quarry::log::is_level_enabled(quarry::log::Level::Error));
    assert!(!quarry::log::is_level_enabled(quarry::log::Level::Info));
    info!("not printed");
    warn!("printed {}", 1);
}
