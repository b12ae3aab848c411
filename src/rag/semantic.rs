use log::{ error, info };
use std::sync::Arc;

use crate::llm::embedding::EmbeddingClient;
use crate::llm::LlmError;

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a
        .iter()
        .zip(b)
        .map(|(x, y)| x * y)
        .sum();
    let mag_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b = b.iter().map(|y| y * y).sum::<f32>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SemanticHit {
    pub similarity: f32,
    pub document: String,
}

/// Documents embedded once up front and searched by cosine similarity.
pub struct EmbeddingIndex {
    client: Arc<dyn EmbeddingClient>,
    documents: Vec<String>,
    embeddings: Vec<Vec<f32>>,
}

impl EmbeddingIndex {
    /// Documents that fail to embed are kept but never returned by `search`.
    pub async fn build<S: Into<String>>(client: Arc<dyn EmbeddingClient>, documents: Vec<S>) -> Self {
        let documents: Vec<String> = documents.into_iter().map(Into::into).collect();
        let mut embeddings = Vec::with_capacity(documents.len());
        for doc in &documents {
            match client.embed(doc).await {
                Ok(resp) => embeddings.push(resp.embedding),
                Err(e) => {
                    error!("Error embedding document: {}", e);
                    embeddings.push(Vec::new());
                }
            }
        }
        info!(
            "Embedded {}/{} document(s)",
            embeddings
                .iter()
                .filter(|e| !e.is_empty())
                .count(),
            documents.len()
        );
        Self { client, documents, embeddings }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SemanticHit>, LlmError> {
        let query_vec = self.client.embed(query).await?.embedding;
        let mut hits: Vec<SemanticHit> = self.documents
            .iter()
            .zip(&self.embeddings)
            .filter(|(_, emb)| !emb.is_empty())
            .map(|(doc, emb)| SemanticHit {
                similarity: cosine_similarity(&query_vec, emb),
                document: doc.clone(),
            })
            .collect();
        hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        hits.truncate(top_k);
        Ok(hits)
    }
}
