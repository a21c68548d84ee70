//! Qdrant HTTP client: collection setup, point upserts, similarity search

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::types::{Chunk, SearchHit};

/// Client for one named vector collection.
pub struct QdrantStore {
    /// HTTP client
    client: Client,
    /// Store base URL, no trailing slash
    base_url: String,
    /// Collection name
    collection: String,
}

#[derive(Serialize)]
struct UpsertPoint<'a> {
    id: Uuid,
    vector: &'a [f32],
    payload: PointPayload<'a>,
}

#[derive(Serialize)]
struct PointPayload<'a> {
    doc_id: &'a str,
    filename: &'a str,
    page: u32,
    text: &'a str,
}

#[derive(Deserialize)]
struct SearchEnvelope {
    result: Vec<ScoredPoint>,
}

#[derive(Deserialize)]
struct ScoredPoint {
    score: f32,
    #[serde(default)]
    payload: Option<StoredPayload>,
}

#[derive(Deserialize)]
struct StoredPayload {
    doc_id: String,
    filename: String,
    page: u32,
    text: String,
}

impl QdrantStore {
    /// Create a client for the configured collection.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
        })
    }

    /// Create the collection when missing; an existing collection is left
    /// untouched. Creation failures surface instead of being treated as
    /// "already exists".
    pub async fn ensure_collection(&self, dim: usize) -> Result<()> {
        let url = format!("{}/collections/{}", self.base_url, self.collection);

        let probe = self.client.get(&url).send().await?;
        if probe.status().is_success() {
            tracing::debug!(collection = %self.collection, "collection already exists");
            return Ok(());
        }
        if probe.status() != StatusCode::NOT_FOUND {
            let status = probe.status();
            let body = probe.text().await.unwrap_or_default();
            return Err(Error::vector_store(format!(
                "collection probe failed: HTTP {status} - {body}"
            )));
        }

        let body = json!({
            "vectors": {
                "size": dim,
                "distance": "Cosine",
            }
        });
        let response = self.client.put(&url).json(&body).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::vector_store(format!(
                "collection creation failed: HTTP {status} - {body}"
            )));
        }

        tracing::info!(collection = %self.collection, dim, "collection created");
        Ok(())
    }

    /// Upsert chunk points with their vectors and provenance payloads.
    pub async fn upsert_chunks(&self, chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<()> {
        if chunks.len() != vectors.len() {
            return Err(Error::internal(format!(
                "{} chunks but {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }
        if chunks.is_empty() {
            return Ok(());
        }

        let points: Vec<UpsertPoint> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| UpsertPoint {
                id: chunk.id,
                vector,
                payload: PointPayload {
                    doc_id: &chunk.doc_id,
                    filename: &chunk.filename,
                    page: chunk.page,
                    text: &chunk.text,
                },
            })
            .collect();

        let url = format!(
            "{}/collections/{}/points?wait=true",
            self.base_url, self.collection
        );
        let response = self
            .client
            .put(&url)
            .json(&json!({ "points": points }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::vector_store(format!(
                "upsert failed: HTTP {status} - {body}"
            )));
        }

        Ok(())
    }

    /// Broad similarity search, no score threshold, payloads included.
    pub async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        let url = format!(
            "{}/collections/{}/points/search",
            self.base_url, self.collection
        );
        let body = json!({
            "vector": vector,
            "limit": limit,
            "with_payload": true,
        });

        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::vector_store(format!(
                "search failed: HTTP {status} - {body}"
            )));
        }

        let envelope: SearchEnvelope = response.json().await?;
        let hits = envelope
            .result
            .into_iter()
            .filter_map(|point| {
                let Some(payload) = point.payload else {
                    tracing::warn!("search hit without payload, skipping");
                    return None;
                };
                Some(SearchHit {
                    doc_id: payload.doc_id,
                    filename: payload.filename,
                    page: payload.page,
                    text: payload.text,
                    score: point.score,
                })
            })
            .collect();

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_payload_wire_format() {
        let chunk = Chunk::new("manual", "manual.pdf", 12, "Press the DEF button.");
        let vector = vec![0.0f32; 4];
        let point = UpsertPoint {
            id: chunk.id,
            vector: &vector,
            payload: PointPayload {
                doc_id: &chunk.doc_id,
                filename: &chunk.filename,
                page: chunk.page,
                text: &chunk.text,
            },
        };

        let value = serde_json::to_value(&point).unwrap();
        assert_eq!(value["payload"]["doc_id"], "manual");
        assert_eq!(value["payload"]["filename"], "manual.pdf");
        assert_eq!(value["payload"]["page"], 12);
        assert_eq!(value["payload"]["text"], "Press the DEF button.");
        assert_eq!(value["vector"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_search_envelope_parsing() {
        let raw = r#"{
            "result": [
                {"score": 0.91, "payload": {"doc_id": "m", "filename": "m.pdf", "page": 3, "text": "abc"}},
                {"score": 0.40, "payload": null}
            ]
        }"#;
        let envelope: SearchEnvelope = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.result.len(), 2);
        assert!(envelope.result[1].payload.is_none());
    }
}
