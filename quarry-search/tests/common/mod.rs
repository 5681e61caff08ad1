//! In-memory transport shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use quarry_search::{
    Document, MetaField, RawHit, RawSearchResponse, Result, SearchClient, SearchConfig,
    SearchError, SearchRequest, Transport,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex},
    time::Duration,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub views: i64,
    pub status: String,
    #[serde(default, skip_serializing)]
    pub id: String,
    #[serde(default, skip_serializing)]
    pub index: String,
    #[serde(default, skip_serializing)]
    pub version: i64,
    #[serde(default, skip_serializing)]
    pub score: f64,
}

impl Document for Article {
    fn metadata() -> Vec<(MetaField, &'static str)> {
        vec![
            (MetaField::Id, "id"),
            (MetaField::Index, "index"),
            (MetaField::Version, "version"),
            (MetaField::Score, "score"),
        ]
    }
}

pub fn article(n: usize) -> Value {
    json!({
        "title": format!("article {}", n),
        "views": n as i64,
        "status": if n % 2 == 0 { "published" } else { "draft" },
    })
}

pub fn doc_id(n: usize) -> String {
    format!("{:05}", n)
}

struct OpenCursor {
    hits: Vec<RawHit>,
    position: usize,
    size: usize,
    total: u64,
}

#[derive(Default)]
struct State {
    indices: BTreeMap<String, BTreeMap<String, (Value, i64)>>,
    cursors: HashMap<String, OpenCursor>,
    next_cursor: u64,
    searches: Vec<SearchRequest>,
    batches: Vec<usize>,
    advances: usize,
    cleared: Vec<String>,
    created: Vec<(String, Value)>,
    fail_advance_at: Option<usize>,
    fail_clear: bool,
    empty_final_batch: bool,
    omit_hits: bool,
    unhealthy: bool,
    ping_delay: Option<Duration>,
}

/// Transport that serves every stored document of the requested indices in
/// id order and records what it was asked to do.
#[derive(Default)]
pub struct MockTransport {
    state: Mutex<State>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `count` generated articles in `index`.
    pub fn with_articles(self, index: &str, count: usize) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let docs = state.indices.entry(index.to_string()).or_default();
            for n in 0..count {
                docs.insert(doc_id(n), (article(n), 1));
            }
        }
        self
    }

    /// Fail the `n`-th scroll advance (1-based) with a server error.
    pub fn fail_advance_at(self, n: usize) -> Self {
        self.state.lock().unwrap().fail_advance_at = Some(n);
        self
    }

    /// Fail every cursor release.
    pub fn fail_clear(self) -> Self {
        self.state.lock().unwrap().fail_clear = true;
        self
    }

    /// Signal the end of a cursor with an empty batch instead of the
    /// exhaustion error.
    pub fn empty_final_batch(self) -> Self {
        self.state.lock().unwrap().empty_final_batch = true;
        self
    }

    /// Answer searches without a hit container.
    pub fn omit_hits(self) -> Self {
        self.state.lock().unwrap().omit_hits = true;
        self
    }

    /// Answer pings with failure.
    pub fn unhealthy(self) -> Self {
        self.state.lock().unwrap().unhealthy = true;
        self
    }

    /// Answer pings only after `delay`.
    pub fn slow_ping(self, delay: Duration) -> Self {
        self.state.lock().unwrap().ping_delay = Some(delay);
        self
    }

    pub fn searches(&self) -> Vec<SearchRequest> {
        self.state.lock().unwrap().searches.clone()
    }

    pub fn batches(&self) -> Vec<usize> {
        self.state.lock().unwrap().batches.clone()
    }

    pub fn advances(&self) -> usize {
        self.state.lock().unwrap().advances
    }

    pub fn cleared(&self) -> Vec<String> {
        self.state.lock().unwrap().cleared.clone()
    }

    pub fn open_cursors(&self) -> usize {
        self.state.lock().unwrap().cursors.len()
    }

    pub fn created(&self) -> Vec<(String, Value)> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn stored(&self, index: &str, id: &str) -> Option<Value> {
        let state = self.state.lock().unwrap();
        state
            .indices
            .get(index)
            .and_then(|docs| docs.get(id))
            .map(|(body, _)| body.clone())
    }

    /// Wait until at least `count` cursors were released.
    pub async fn wait_for_clears(&self, count: usize) -> Vec<String> {
        for _ in 0..200 {
            let cleared = self.cleared();
            if cleared.len() >= count {
                return cleared;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.cleared()
    }

    fn matching(state: &State, request: &SearchRequest) -> Vec<RawHit> {
        let mut hits = Vec::new();
        for name in &request.indices {
            let Some(docs) = state.indices.get(name) else {
                continue;
            };
            for (id, (body, version)) in docs {
                let mut hit = RawHit::new(id.clone(), name.clone(), body.clone());
                hit.source = match &request.source {
                    Some(fields) if fields.is_empty() => None,
                    Some(fields) => Some(project(body, fields)),
                    None => Some(body.clone()),
                };
                hit.version = Some(*version);
                hit.score = Some(1.0);
                hits.push(hit);
            }
        }
        hits
    }
}

fn project(body: &Value, fields: &[String]) -> Value {
    let Value::Object(map) = body else {
        return body.clone();
    };
    let kept: Map<String, Value> = map
        .iter()
        .filter(|(key, _)| fields.contains(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Value::Object(kept)
}

#[async_trait]
impl Transport for MockTransport {
    async fn search(&self, request: &SearchRequest) -> Result<RawSearchResponse> {
        let mut state = self.state.lock().unwrap();
        state.searches.push(request.clone());
        if state.omit_hits {
            return Ok(RawSearchResponse::default());
        }

        let hits = Self::matching(&state, request);
        let total = hits.len() as u64;
        let from = request.from.unwrap_or(0).max(0) as usize;
        let page = hits
            .into_iter()
            .skip(from)
            .take(request.size.max(0) as usize)
            .collect();

        Ok(RawSearchResponse::with_hits(total, page))
    }

    async fn open_scroll(
        &self,
        request: &SearchRequest,
        _keep_alive: &str,
    ) -> Result<RawSearchResponse> {
        let mut state = self.state.lock().unwrap();
        state.searches.push(request.clone());
        if state.omit_hits {
            return Ok(RawSearchResponse::default());
        }

        let hits = Self::matching(&state, request);
        let total = hits.len() as u64;
        let size = request.size.max(1) as usize;
        let first: Vec<RawHit> = hits.iter().take(size).cloned().collect();

        state.next_cursor += 1;
        let scroll_id = format!("scroll-{}", state.next_cursor);
        state.batches.push(first.len());
        state.cursors.insert(
            scroll_id.clone(),
            OpenCursor {
                position: first.len(),
                hits,
                size,
                total,
            },
        );

        Ok(RawSearchResponse::with_hits(total, first).scroll_id(scroll_id))
    }

    async fn scroll(&self, scroll_id: &str, _keep_alive: &str) -> Result<RawSearchResponse> {
        let mut state = self.state.lock().unwrap();
        state.advances += 1;

        if state.fail_advance_at == Some(state.advances) {
            return Err(SearchError::transport(500, "shard failure"));
        }

        let empty_final_batch = state.empty_final_batch;
        let Some(cursor) = state.cursors.get_mut(scroll_id) else {
            return Err(SearchError::transport(404, "search_context_missing_exception"));
        };

        let batch: Vec<RawHit> = cursor
            .hits
            .iter()
            .skip(cursor.position)
            .take(cursor.size)
            .cloned()
            .collect();
        cursor.position += batch.len();
        let total = cursor.total;

        if batch.is_empty() {
            if empty_final_batch {
                return Ok(RawSearchResponse::with_hits(total, batch).scroll_id(scroll_id));
            }
            return Err(SearchError::ScrollExhausted);
        }

        state.batches.push(batch.len());
        Ok(RawSearchResponse::with_hits(total, batch).scroll_id(scroll_id))
    }

    async fn clear_scroll(&self, scroll_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.cleared.push(scroll_id.to_string());
        state.cursors.remove(scroll_id);
        if state.fail_clear {
            return Err(SearchError::transport(500, "clear failed"));
        }
        Ok(())
    }

    async fn get(&self, index: &str, _doc_type: &str, id: &str) -> Result<Option<RawHit>> {
        let state = self.state.lock().unwrap();
        let Some(docs) = state.indices.get(index) else {
            return Err(SearchError::IndexNotFound(index.to_string()));
        };

        Ok(docs.get(id).map(|(body, version)| {
            let mut hit = RawHit::new(id, index, body.clone());
            hit.version = Some(*version);
            hit
        }))
    }

    async fn index(&self, index: &str, _doc_type: &str, id: &str, body: Value) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let docs = state.indices.entry(index.to_string()).or_default();
        let version = docs.get(id).map_or(1, |(_, v)| v + 1);
        docs.insert(id.to_string(), (body, version));
        Ok(())
    }

    async fn update(&self, index: &str, _doc_type: &str, id: &str, partial: Value) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let not_found = || SearchError::DocumentNotFound {
            index: index.to_string(),
            id: id.to_string(),
        };

        let (body, version) = state
            .indices
            .get_mut(index)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(not_found)?;

        if let (Value::Object(stored), Value::Object(changes)) = (body, partial) {
            for (key, value) in changes {
                stored.insert(key, value);
            }
        }
        *version += 1;
        Ok(())
    }

    async fn delete(&self, index: &str, _doc_type: &str, id: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        Ok(state
            .indices
            .get_mut(index)
            .and_then(|docs| docs.remove(id))
            .is_some())
    }

    async fn create_index(&self, name: &str, body: Value) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.indices.contains_key(name) {
            return Err(SearchError::IndexExists(name.to_string()));
        }
        state.indices.insert(name.to_string(), BTreeMap::new());
        state.created.push((name.to_string(), body));
        Ok(())
    }

    async fn delete_index(&self, names: &[String]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(missing) = names.iter().find(|n| !state.indices.contains_key(*n)) {
            return Err(SearchError::IndexNotFound(missing.clone()));
        }
        for name in names {
            state.indices.remove(name);
        }
        Ok(())
    }

    async fn index_exists(&self, name: &str) -> Result<bool> {
        Ok(self.state.lock().unwrap().indices.contains_key(name))
    }

    async fn ping(&self) -> Result<bool> {
        let (delay, unhealthy) = {
            let state = self.state.lock().unwrap();
            (state.ping_delay, state.unhealthy)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(!unhealthy)
    }
}

/// Client over `mock`, keeping a handle for assertions.
pub fn client(mock: MockTransport) -> (SearchClient, Arc<MockTransport>) {
    let mock = Arc::new(mock);
    let client = SearchClient::with_transport(mock.clone(), SearchConfig::new("http://mock:9200"));
    (client, mock)
}
