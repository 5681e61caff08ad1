//! Hit-to-document translation.

use crate::{
    document::{Document, Metadata, Schema},
    error::{Result, SearchError},
    transport::{RawHit, RawSearchResponse},
};

/// Documents from one page or batch, in hit order.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult<T> {
    /// Translated documents.
    pub documents: Vec<T>,
    /// Total matches reported by the engine, across all pages.
    pub total: u64,
}

impl<T> SearchResult<T> {
    /// Number of documents in this page.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True when the page holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl<T> IntoIterator for SearchResult<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.into_iter()
    }
}

/// Metadata envelope of a hit. Typeless engines omit `_type`, in which case
/// `doc_type` is used.
pub(crate) fn envelope(hit: &RawHit, doc_type: &str) -> Metadata {
    Metadata {
        id: hit.id.clone(),
        index: hit.index.clone(),
        doc_type: hit.doc_type.clone().unwrap_or_else(|| doc_type.to_string()),
        version: hit.version,
        score: hit.score,
    }
}

/// Translate every hit of a response. Fails on the first undecodable body;
/// nothing is returned partially.
pub(crate) fn translate<T: Document>(
    schema: &Schema<T>,
    response: RawSearchResponse,
    doc_type: &str,
) -> Result<SearchResult<T>> {
    let hits = response.hits.ok_or(SearchError::EmptyResult)?;
    let raw = hits.hits.ok_or(SearchError::EmptyResult)?;

    let documents = raw
        .iter()
        .map(|hit| schema.to_document(hit.source.as_ref(), &envelope(hit, doc_type)))
        .collect::<Result<Vec<T>>>()?;

    Ok(SearchResult {
        documents,
        total: hits.total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{document::MetaField, transport::RawHits};
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Note {
        text: String,
        #[serde(default, skip_serializing)]
        id: String,
        #[serde(default, skip_serializing)]
        kind: String,
        #[serde(default, skip_serializing)]
        score: Option<f64>,
    }

    impl Document for Note {
        fn metadata() -> Vec<(MetaField, &'static str)> {
            vec![
                (MetaField::Id, "id"),
                (MetaField::Type, "kind"),
                (MetaField::Score, "score"),
            ]
        }
    }

    #[test]
    fn test_translate_keeps_hit_order_and_total() {
        let schema = Schema::<Note>::of();
        let mut first = RawHit::new("b", "notes", json!({ "text": "second" }));
        first.score = Some(2.0);
        let second = RawHit::new("a", "notes", json!({ "text": "first" }));
        let response = RawSearchResponse::with_hits(10, vec![first, second]);

        let result = translate(&schema, response, "_doc").unwrap();
        assert_eq!(result.total, 10);
        assert_eq!(result.len(), 2);
        assert_eq!(result.documents[0].id, "b");
        assert_eq!(result.documents[0].score, Some(2.0));
        assert_eq!(result.documents[1].text, "first");
        assert_eq!(result.documents[1].score, None);
    }

    #[test]
    fn test_missing_type_falls_back_to_handle_type() {
        let schema = Schema::<Note>::of();
        let mut typed = RawHit::new("1", "notes", json!({}));
        typed.doc_type = Some("note".into());
        let untyped = RawHit::new("2", "notes", json!({}));
        let response = RawSearchResponse::with_hits(2, vec![typed, untyped]);

        let result = translate(&schema, response, "_doc").unwrap();
        assert_eq!(result.documents[0].kind, "note");
        assert_eq!(result.documents[1].kind, "_doc");
    }

    #[test]
    fn test_zero_hits_is_not_an_error() {
        let schema = Schema::<Note>::of();
        let result = translate(&schema, RawSearchResponse::with_hits(0, vec![]), "_doc").unwrap();
        assert!(result.is_empty());
        assert_eq!(result.total, 0);
    }

    #[test]
    fn test_missing_container_is_empty_result() {
        let schema = Schema::<Note>::of();

        let err = translate(&schema, RawSearchResponse::default(), "_doc").unwrap_err();
        assert!(matches!(err, SearchError::EmptyResult));

        let response = RawSearchResponse {
            scroll_id: None,
            hits: Some(RawHits {
                total: 3,
                hits: None,
            }),
        };
        let err = translate(&schema, response, "_doc").unwrap_err();
        assert!(matches!(err, SearchError::EmptyResult));
    }

    #[test]
    fn test_bad_body_fails_whole_batch() {
        let schema = Schema::<Note>::of();
        let good = RawHit::new("1", "notes", json!({ "text": "ok" }));
        let bad = RawHit::new("2", "notes", json!({ "text": 5 }));
        let response = RawSearchResponse::with_hits(2, vec![good, bad]);

        let err = translate(&schema, response, "_doc").unwrap_err();
        assert!(matches!(err, SearchError::Decode(_)));
    }
}
