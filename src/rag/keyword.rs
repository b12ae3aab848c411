use serde::{ Deserialize, Serialize };
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub score: usize,
    pub index: usize,
    pub document: String,
}

fn tokens(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Ranks a fixed document set by how many query tokens each one contains.
///
/// Tokens are lowercase whitespace-separated words: no stemming, no
/// punctuation stripping, no weighting. Equal scores keep insertion order.
#[derive(Debug, Clone)]
pub struct KeywordRetriever {
    documents: Vec<String>,
    vocabularies: Vec<HashSet<String>>,
}

impl KeywordRetriever {
    pub fn new<S: Into<String>>(documents: Vec<S>) -> Self {
        let documents: Vec<String> = documents.into_iter().map(Into::into).collect();
        let vocabularies = documents
            .iter()
            .map(|doc| tokens(doc).into_iter().collect())
            .collect();
        Self { documents, vocabularies }
    }

    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    /// Every document with its overlap count, best first.
    pub fn score(&self, query: &str) -> Vec<ScoredDocument> {
        let query_tokens = tokens(query);
        let mut scored: Vec<ScoredDocument> = self.documents
            .iter()
            .zip(&self.vocabularies)
            .enumerate()
            .map(|(index, (document, vocabulary))| ScoredDocument {
                score: query_tokens
                    .iter()
                    .filter(|t| vocabulary.contains(t.as_str()))
                    .count(),
                index,
                document: document.clone(),
            })
            .collect();
        // sort_by is stable, so ties stay in insertion order
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored
    }

    pub fn retrieve(&self, query: &str, top_k: usize) -> Vec<String> {
        self.score(query)
            .into_iter()
            .take(top_k)
            .map(|hit| hit.document)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_document_ranks_first() {
        let retriever = KeywordRetriever::new(vec!["I like dogs", "Python is great"]);
        let scored = retriever.score("python");
        assert_eq!(scored[0].document, "Python is great");
        assert!(scored[0].score > scored[1].score);
    }

    #[test]
    fn scenario_from_python_query() {
        let retriever = KeywordRetriever::new(vec!["Python is great", "I like dogs"]);
        let scored = retriever.score("python");
        assert_eq!(scored[0].score, 1);
        assert_eq!(scored[1].score, 0);
        assert_eq!(scored[0].index, 0);
    }

    #[test]
    fn zero_overlap_keeps_insertion_order() {
        let docs = vec!["alpha", "beta", "gamma", "delta"];
        let retriever = KeywordRetriever::new(docs.clone());
        let scored = retriever.score("nothing matches here");
        assert!(scored.iter().all(|s| s.score == 0));
        let order: Vec<&str> = scored
            .iter()
            .map(|s| s.document.as_str())
            .collect();
        assert_eq!(order, docs);
    }

    #[test]
    fn ties_keep_insertion_order_and_top_k_limits() {
        let retriever = KeywordRetriever::new(
            vec![
                "JavaScript was created by Brendan Eich in 1995.",
                "Python was created by Guido van Rossum and released in 1991.",
                "Python is known for its simple syntax and readability."
            ]
        );
        let top = retriever.retrieve("who created python", 2);
        assert_eq!(
            top,
            vec![
                "Python was created by Guido van Rossum and released in 1991.".to_string(),
                "JavaScript was created by Brendan Eich in 1995.".to_string()
            ]
        );
        assert!(retriever.retrieve("python", 10).len() == 3);
    }
}
