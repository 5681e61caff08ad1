//! Tests against a running engine.
//!
//! Run with `QUARRY_SEARCH_URLS=http://localhost:9200 cargo test -- --ignored`.

mod common;

use common::Article;
use quarry_search::{IndexSettings, SearchClient, SearchConfig};
use serde_json::json;

const INDEX: &str = "quarry-live-test";

async fn connect() -> SearchClient {
    let config = SearchConfig::from_env()
        .unwrap_or_else(|_| SearchConfig::new("http://localhost:9200"))
        .with_health_check(true);
    SearchClient::connect(config).await.unwrap()
}

#[tokio::test]
#[ignore = "requires a running search engine"]
async fn test_live_crud_and_scroll() {
    let client = connect().await;

    if client.index_exists(INDEX).await.unwrap() {
        client.delete_index(INDEX).await.unwrap();
    }

    let settings = IndexSettings::new().shards(1).replicas(0).refresh_interval("1ms");
    client.create_index(INDEX, settings).await.unwrap();

    let articles = client.index::<Article>(INDEX);
    for n in 0..25 {
        let article: Article = serde_json::from_value(common::article(n)).unwrap();
        articles.save(&common::doc_id(n), &article).await.unwrap();
    }

    let found = articles.find("00003").await.unwrap().unwrap();
    assert_eq!(found.id, "00003");
    assert_eq!(found.views, 3);

    articles
        .update("00003", json!({ "status": "archived" }))
        .await
        .unwrap();
    assert!(articles.find("missing").await.unwrap().is_none());

    tokio::time::sleep(std::time::Duration::from_secs(1)).await;

    let mut scroll = articles.query().scroll_size(10).scroll().await.unwrap();
    let mut count = 0;
    while scroll.next().await.unwrap().is_some() {
        count += 1;
    }
    assert_eq!(count, 25);

    let page = articles
        .query()
        .term("status", "published")
        .page(1, 5)
        .list()
        .await
        .unwrap();
    assert_eq!(page.len(), 5);

    assert!(articles.delete("00003").await.unwrap());
    client.delete_index(INDEX).await.unwrap();
}
