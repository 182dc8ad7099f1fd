//! Retrieval enrichment for the drafting pipeline
//!
//! The retrieval store itself is an external collaborator; the pipeline only
//! sees the [`Retriever`] trait, an opaque ranked lookup used to enrich the
//! context text before the first stage. [`CorpusRetriever`] is a local
//! JSONL-backed implementation good enough for development and tests;
//! [`DoubleRetriever`] pairs a precedent-case corpus with an
//! evaluation-criteria corpus.

use std::path::Path;

use async_trait::async_trait;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One retrieved reference passage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    /// Where the passage came from (document name, section, ...)
    pub source: String,
    /// The passage text
    pub text: String,
    /// Relevance score in 0.0..=1.0, higher is better
    #[serde(default)]
    pub score: f64,
}

/// Opaque ranked lookup over reference documents
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return up to `top_k` passages ranked by relevance to `query`
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Passage>>;
}

/// JSONL-backed corpus with term-overlap ranking
///
/// Each line of the corpus file is a JSON object with `source` and `text`
/// fields. Scoring is the fraction of query terms present in the passage;
/// passages sharing no terms with the query are not returned.
pub struct CorpusRetriever {
    passages: Vec<Passage>,
}

impl CorpusRetriever {
    /// Load a corpus from a JSONL file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).context(format!("Failed to read corpus file: {}", path.display()))?;

        let mut passages = Vec::new();
        for (lineno, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let passage: Passage = serde_json::from_str(line)
                .context(format!("Invalid corpus record at {}:{}", path.display(), lineno + 1))?;
            passages.push(passage);
        }

        debug!(path = %path.display(), count = passages.len(), "corpus loaded");
        Ok(Self { passages })
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    fn score(terms: &[String], text: &str) -> f64 {
        if terms.is_empty() {
            return 0.0;
        }
        let haystack = text.to_lowercase();
        let hits = terms.iter().filter(|t| haystack.contains(t.as_str())).count();
        hits as f64 / terms.len() as f64
    }
}

#[async_trait]
impl Retriever for CorpusRetriever {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Passage>> {
        let terms: Vec<String> = query.split_whitespace().map(|t| t.to_lowercase()).collect();

        let mut scored: Vec<Passage> = self
            .passages
            .iter()
            .filter_map(|p| {
                let score = Self::score(&terms, &p.text);
                (score > 0.0).then(|| Passage {
                    source: p.source.clone(),
                    text: p.text.clone(),
                    score,
                })
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        debug!(%query, count = scored.len(), "retrieval complete");
        Ok(scored)
    }
}

/// Combines a precedent-case corpus with an evaluation-criteria corpus
///
/// Each side contributes up to `top_k` passages; cases come first.
pub struct DoubleRetriever {
    cases: CorpusRetriever,
    criteria: CorpusRetriever,
}

impl DoubleRetriever {
    pub fn new(cases: CorpusRetriever, criteria: CorpusRetriever) -> Self {
        Self { cases, criteria }
    }
}

#[async_trait]
impl Retriever for DoubleRetriever {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Passage>> {
        let mut passages = self.cases.retrieve(query, top_k).await?;
        passages.extend(self.criteria.retrieve(query, top_k).await?);
        Ok(passages)
    }
}

/// Merge conversation context and retrieved passages into the context text
/// handed to the first pipeline stage
pub fn build_context(conversation: &str, passages: &[Passage]) -> String {
    let mut out = String::new();

    if !conversation.trim().is_empty() {
        out.push_str(conversation.trim());
        out.push_str("\n\n");
    }

    if !passages.is_empty() {
        out.push_str("참고 문서:\n");
        for passage in passages {
            out.push_str(&format!("- [{}] {}\n", passage.source, passage.text));
        }
    }

    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_corpus(lines: &[serde_json::Value]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    fn sample_corpus() -> tempfile::NamedTempFile {
        write_corpus(&[
            serde_json::json!({
                "source": "hospital-emr-rfp",
                "text": "의료 정보 시스템 구축 사업의 보안 요구사항"
            }),
            serde_json::json!({
                "source": "lng-truck-rfp",
                "text": "LNG 트럭 운송 계약의 평가 기준"
            }),
        ])
    }

    #[tokio::test]
    async fn test_corpus_retrieve_ranks_by_overlap() {
        let file = sample_corpus();
        let retriever = CorpusRetriever::open(file.path()).unwrap();

        let hits = retriever.retrieve("의료 정보 시스템 보안", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source, "hospital-emr-rfp");
        assert!(hits[0].score > 0.5);
    }

    #[tokio::test]
    async fn test_corpus_retrieve_respects_top_k() {
        let file = write_corpus(&[
            serde_json::json!({ "source": "a", "text": "security review" }),
            serde_json::json!({ "source": "b", "text": "security audit" }),
            serde_json::json!({ "source": "c", "text": "security policy" }),
        ]);
        let retriever = CorpusRetriever::open(file.path()).unwrap();

        let hits = retriever.retrieve("security", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_corpus_no_match_returns_empty() {
        let file = sample_corpus();
        let retriever = CorpusRetriever::open(file.path()).unwrap();

        let hits = retriever.retrieve("완전히 무관한 질의어", 10).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_double_retriever_merges_both_sides() {
        let cases = CorpusRetriever::open(
            write_corpus(&[serde_json::json!({ "source": "case-1", "text": "보안 구축 사례" })]).path(),
        )
        .unwrap();
        let criteria = CorpusRetriever::open(
            write_corpus(&[serde_json::json!({ "source": "criteria-1", "text": "보안 평가 기준" })]).path(),
        )
        .unwrap();

        let double = DoubleRetriever::new(cases, criteria);
        let hits = double.retrieve("보안", 5).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].source, "case-1");
        assert_eq!(hits[1].source, "criteria-1");
    }

    #[test]
    fn test_build_context() {
        let passages = vec![Passage {
            source: "doc-1".to_string(),
            text: "접근 제어 요구사항".to_string(),
            score: 1.0,
        }];

        let ctx = build_context("이전 대화 내용", &passages);
        assert!(ctx.starts_with("이전 대화 내용"));
        assert!(ctx.contains("참고 문서:"));
        assert!(ctx.contains("[doc-1]"));

        // No passages, no header
        let ctx = build_context("대화만", &[]);
        assert_eq!(ctx, "대화만");

        // Nothing at all
        assert!(build_context("", &[]).is_empty());
    }

    #[test]
    fn test_invalid_corpus_line_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();
        assert!(CorpusRetriever::open(file.path()).is_err());
    }
}
