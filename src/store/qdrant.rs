// Qdrant-backed vector index for document chunks
use anyhow::{Context, Result};
use async_trait::async_trait;
use qdrant_client::{
    client::QdrantClient,
    qdrant::{
        condition::ConditionOneOf, r#match::MatchValue, vectors_config::Config,
        with_payload_selector::SelectorOptions, Condition, CreateCollection, Distance,
        FieldCondition, Filter, Match, PointStruct, ScrollPoints, SearchPoints, Value as QdrantValue,
        VectorParams, VectorsConfig, WithPayloadSelector,
    },
};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use uuid::Uuid;

use crate::store::backend::VectorBackend;
use crate::types::{DocumentChunk, IndexedRecord, MetadataFilter, RetrievalHit, SOURCE_KEY};

const TEXT_KEY: &str = "text";

/// Vector index backed by a Qdrant collection with cosine similarity.
pub struct QdrantBackend {
    client: QdrantClient,
    collection: String,
    vector_size: u64,
}

impl QdrantBackend {
    /// Connect to a Qdrant instance. The collection is created lazily by
    /// [`VectorBackend::ensure_collection`].
    pub fn new(url: &str, collection: &str, vector_size: usize) -> Result<Self> {
        let client = QdrantClient::from_url(url)
            .build()
            .context("Failed to create Qdrant client")?;

        Ok(Self {
            client,
            collection: collection.to_string(),
            vector_size: vector_size as u64,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn build_filter(filter: &MetadataFilter) -> Filter {
        let must = filter
            .iter()
            .map(|(key, value)| Condition {
                condition_one_of: Some(ConditionOneOf::Field(FieldCondition {
                    key: key.clone(),
                    r#match: Some(Match {
                        match_value: Some(json_to_match_value(value)),
                    }),
                    ..Default::default()
                })),
            })
            .collect();

        Filter {
            must,
            ..Default::default()
        }
    }

    fn chunk_from_payload(
        id: &Option<qdrant_client::qdrant::PointId>,
        payload: HashMap<String, QdrantValue>,
    ) -> DocumentChunk {
        let mut text = String::new();
        let mut source = String::new();
        let mut extra_metadata = HashMap::new();

        for (key, value) in payload {
            match key.as_str() {
                TEXT_KEY => {
                    if let Some(s) = qdrant_value_to_string(&value) {
                        text = s;
                    }
                }
                SOURCE_KEY => {
                    if let Some(s) = qdrant_value_to_string(&value) {
                        source = s;
                    }
                }
                _ => {
                    if let Some(json) = qdrant_to_json_value(&value) {
                        extra_metadata.insert(key, json);
                    }
                }
            }
        }

        DocumentChunk {
            id: point_id_to_uuid(id),
            text,
            source,
            extra_metadata,
        }
    }
}

#[async_trait]
impl VectorBackend for QdrantBackend {
    async fn ensure_collection(&self) -> Result<()> {
        let collections = self
            .client
            .list_collections()
            .await
            .context("Failed to list collections")?;
        let exists = collections
            .collections
            .iter()
            .any(|c| c.name == self.collection);

        if !exists {
            self.client
                .create_collection(&CreateCollection {
                    collection_name: self.collection.clone(),
                    vectors_config: Some(VectorsConfig {
                        config: Some(Config::Params(VectorParams {
                            size: self.vector_size,
                            distance: Distance::Cosine.into(),
                            ..Default::default()
                        })),
                    }),
                    ..Default::default()
                })
                .await
                .context(format!("Failed to create collection: {}", self.collection))?;
            tracing::info!(collection = %self.collection, "created collection");
        }

        Ok(())
    }

    async fn upsert(&self, records: Vec<IndexedRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let count = records.len();
        let points: Vec<PointStruct> = records
            .into_iter()
            .map(|record| {
                let mut payload: HashMap<String, QdrantValue> = HashMap::new();
                payload.insert(TEXT_KEY.to_string(), QdrantValue::from(record.chunk.text));
                payload.insert(
                    SOURCE_KEY.to_string(),
                    QdrantValue::from(record.chunk.source),
                );
                for (key, value) in record.chunk.extra_metadata {
                    payload.insert(key, json_to_qdrant_value(value));
                }
                PointStruct::new(record.chunk.id.to_string(), record.vector, payload)
            })
            .collect();

        self.client
            .upsert_points_blocking(&self.collection, None, points, None)
            .await
            .context("Failed to upsert points")?;

        tracing::debug!(count, collection = %self.collection, "stored chunks");
        Ok(())
    }

    async fn search(
        &self,
        vector: &[f32],
        limit: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievalHit>> {
        let search_result = self
            .client
            .search_points(&SearchPoints {
                collection_name: self.collection.clone(),
                vector: vector.to_vec(),
                limit: limit as u64,
                with_payload: Some(WithPayloadSelector {
                    selector_options: Some(SelectorOptions::Enable(true)),
                }),
                filter: filter.map(Self::build_filter),
                ..Default::default()
            })
            .await
            .context("Failed to search points")?;

        let hits = search_result
            .result
            .into_iter()
            .map(|point| RetrievalHit {
                chunk: Self::chunk_from_payload(&point.id, point.payload),
                score: point.score,
            })
            .collect();

        Ok(hits)
    }

    async fn any_match(&self, filter: &MetadataFilter) -> Result<bool> {
        let scrolled = self
            .client
            .scroll(&ScrollPoints {
                collection_name: self.collection.clone(),
                filter: Some(Self::build_filter(filter)),
                limit: Some(1),
                ..Default::default()
            })
            .await
            .context("Failed to scroll points")?;

        Ok(!scrolled.result.is_empty())
    }
}

// Helper functions for type conversions
fn json_to_match_value(json: &JsonValue) -> MatchValue {
    match json {
        JsonValue::String(s) => MatchValue::Keyword(s.clone()),
        JsonValue::Number(n) => MatchValue::Integer(n.as_i64().unwrap_or(0)),
        JsonValue::Bool(b) => MatchValue::Boolean(*b),
        other => MatchValue::Keyword(other.to_string()),
    }
}

fn json_to_qdrant_value(json: JsonValue) -> QdrantValue {
    match json {
        JsonValue::String(s) => QdrantValue::from(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                QdrantValue::from(i)
            } else if let Some(f) = n.as_f64() {
                QdrantValue::from(f)
            } else {
                QdrantValue::from(0)
            }
        }
        JsonValue::Bool(b) => QdrantValue::from(b),
        _ => QdrantValue::from(""),
    }
}

fn qdrant_to_json_value(value: &QdrantValue) -> Option<JsonValue> {
    value.kind.as_ref().and_then(|kind| {
        use qdrant_client::qdrant::value::Kind;
        match kind {
            Kind::StringValue(s) => Some(JsonValue::String(s.clone())),
            Kind::IntegerValue(i) => Some(JsonValue::Number((*i).into())),
            Kind::DoubleValue(f) => serde_json::Number::from_f64(*f).map(JsonValue::Number),
            Kind::BoolValue(b) => Some(JsonValue::Bool(*b)),
            _ => None,
        }
    })
}

fn qdrant_value_to_string(value: &QdrantValue) -> Option<String> {
    value.kind.as_ref().and_then(|kind| {
        use qdrant_client::qdrant::value::Kind;
        match kind {
            Kind::StringValue(s) => Some(s.clone()),
            _ => None,
        }
    })
}

fn point_id_to_uuid(point_id: &Option<qdrant_client::qdrant::PointId>) -> Uuid {
    point_id
        .as_ref()
        .and_then(|id| {
            use qdrant_client::qdrant::point_id::PointIdOptions;
            match &id.point_id_options {
                Some(PointIdOptions::Uuid(u)) => Uuid::parse_str(u).ok(),
                _ => None,
            }
        })
        .unwrap_or_else(Uuid::nil)
}
