//! Relationship Extractor
//!
//! Abstractions → directed labeled graph plus a short project summary. The
//! graph is descriptive: cycles, self edges and repeated edges are kept.

use serde::Deserialize;
use std::fmt::Write;
use tracing::{info, instrument};

use super::helpers::{Generated, StageCall, run_stage};
use crate::ai::{IndexRef, SharedProvider, parse_structured, resolve_index};
use crate::constants::context::{RELATIONSHIP_FILE_CHARS, RELATIONSHIP_TRUNCATION_MARKER};
use crate::constants::prompts;
use crate::types::{
    Abstraction, Corpus, Relationship, RelationshipGraph, Result, TutorError, truncate_chars,
};

#[derive(Debug, Deserialize)]
struct RawGraph {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    details: Vec<RawEdge>,
}

#[derive(Debug, Deserialize)]
struct RawEdge {
    from: IndexRef,
    to: IndexRef,
    #[serde(default)]
    label: String,
}

pub struct RelationshipExtractor {
    provider: SharedProvider,
}

impl RelationshipExtractor {
    pub fn new(provider: SharedProvider) -> Self {
        Self { provider }
    }

    #[instrument(skip_all, fields(abstractions = abstractions.len()))]
    pub async fn extract(
        &self,
        abstractions: &[Abstraction],
        corpus: &Corpus,
        project_name: &str,
    ) -> Result<Generated<RelationshipGraph>> {
        if abstractions.is_empty() {
            return Err(TutorError::InputValidation(
                "no abstractions provided".to_string(),
            ));
        }

        let call = StageCall {
            label: "relationships",
            prompt: build_prompt(abstractions, corpus, project_name),
            system: prompts::ARCHITECT,
        };

        let generated = run_stage(&self.provider, call, |raw| {
            parse_response(raw, abstractions.len())
        })
        .await?;

        info!("Found {} relationships", generated.value.edges.len());
        Ok(generated)
    }
}

pub fn build_prompt(abstractions: &[Abstraction], corpus: &Corpus, project_name: &str) -> String {
    let mut listing = String::new();
    let mut code = String::new();

    for abstraction in abstractions {
        let _ = writeln!(
            listing,
            "- {} # {}: {}",
            abstraction.index, abstraction.name, abstraction.description
        );

        let _ = write!(
            code,
            "\n### Abstraction {}: {}\nRelated files:\n",
            abstraction.index, abstraction.name
        );
        for file in corpus.select(&abstraction.file_indices) {
            let sample = truncate_chars(
                &file.content,
                RELATIONSHIP_FILE_CHARS,
                RELATIONSHIP_TRUNCATION_MARKER,
            );
            let _ = write!(code, "  File {} ({}):\n{}\n\n", file.index, file.path, sample);
        }
    }

    format!(
        r#"You are analyzing how the parts of the "{project_name}" project fit together.

ABSTRACTIONS:
{listing}
CODE CONTEXT:
{code}
Tasks:
1. Write a high-level summary of the project in two or three sentences.
2. Describe how the abstractions relate to each other.

For each relationship give:
- from: INDEX of the source abstraction
- to: INDEX of the target abstraction
- label: a brief verb phrase such as "uses", "extends" or "configures"

Answer with YAML only:
```yaml
summary: "What this project does at a high level"
details:
  - from: 0
    to: 1
    label: "uses"
  - from: 2 # Scheduler
    to: 0 # Engine
    label: "drives"
```
"#
    )
}

/// Validate the graph's edge endpoints against the abstraction count
pub fn parse_response(raw: &str, abstraction_count: usize) -> Result<RelationshipGraph> {
    let graph: RawGraph = parse_structured(raw, "relationship graph")?;

    let edges = graph
        .details
        .iter()
        .enumerate()
        .map(|(i, edge)| {
            let from = resolve_index(&edge.from, abstraction_count, &format!("edge {i} 'from'"))?;
            let to = resolve_index(&edge.to, abstraction_count, &format!("edge {i} 'to'"))?;
            Ok(Relationship {
                from,
                to,
                label: edge.label.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(RelationshipGraph {
        summary: graph.summary.trim().to_string(),
        edges,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tutorial::testing::ScriptedProvider;
    use crate::types::FailureKind;

    fn abstractions() -> Vec<Abstraction> {
        vec![
            Abstraction {
                index: 0,
                name: "Lexer".into(),
                description: "Splits text into tokens".into(),
                file_indices: vec![0],
            },
            Abstraction {
                index: 1,
                name: "Parser".into(),
                description: "Builds a syntax tree".into(),
                file_indices: vec![1],
            },
        ]
    }

    #[test]
    fn test_prompt_samples_related_files() {
        let corpus = Corpus::from_entries([("lexer.rs", "l".repeat(800)), ("parser.rs", "p".into())]);
        let prompt = build_prompt(&abstractions(), &corpus, "demo");

        assert!(prompt.contains("- 0 # Lexer: Splits text into tokens"));
        assert!(prompt.contains("### Abstraction 1: Parser"));
        assert!(prompt.contains(&format!("  File 0 (lexer.rs):\n{}...", "l".repeat(500))));
        assert!(!prompt.contains(&"l".repeat(501)));
    }

    #[test]
    fn test_annotated_endpoints() {
        let raw = r#"```yaml
summary: A tiny compiler.
details:
  - from: "1 # Parser"
    to: 0
    label: consumes
```"#;
        let graph = parse_response(raw, 2).unwrap();
        assert_eq!(graph.summary, "A tiny compiler.");
        assert_eq!(
            graph.edges,
            vec![Relationship {
                from: 1,
                to: 0,
                label: "consumes".into()
            }]
        );
    }

    #[test]
    fn test_endpoint_equal_to_count_fails() {
        let raw = "summary: s\ndetails:\n  - from: 0\n    to: 1\n    label: a\n  - from: 0\n    to: 2\n    label: b\n";
        let err = parse_response(raw, 2).unwrap_err();

        assert_eq!(err.kind(), FailureKind::ReferenceOutOfBounds);
        match err {
            TutorError::ReferenceOutOfBounds {
                context,
                value,
                bound,
            } => {
                assert_eq!(context, "edge 1 'to'");
                assert_eq!(value, 2);
                assert_eq!(bound, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_cycles_self_and_duplicate_edges_kept() {
        let raw = "summary: s\ndetails:\n  - {from: 0, to: 1, label: a}\n  - {from: 1, to: 0, label: b}\n  - {from: 1, to: 1, label: c}\n  - {from: 0, to: 1, label: a}\n";
        let graph = parse_response(raw, 2).unwrap();
        assert_eq!(graph.edges.len(), 4);
    }

    #[test]
    fn test_missing_details_is_empty_graph() {
        let graph = parse_response("summary: Just a summary", 2).unwrap();
        assert!(graph.edges.is_empty());
    }

    #[tokio::test]
    async fn test_empty_abstractions_rejected() {
        let provider = ScriptedProvider::new(["summary: s"]);
        let extractor = RelationshipExtractor::new(provider.shared());

        let err = extractor
            .extract(&[], &Corpus::default(), "demo")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::InputValidation);
        assert_eq!(provider.remaining(), 1);
    }

    #[tokio::test]
    async fn test_extract_uses_architect_instruction() {
        let provider = ScriptedProvider::new(["summary: s\ndetails:\n  - {from: 0, to: 1, label: uses}\n"]);
        let extractor = RelationshipExtractor::new(provider.shared());
        let corpus = Corpus::from_entries([("a", ""), ("b", "")]);

        let generated = extractor.extract(&abstractions(), &corpus, "demo").await.unwrap();
        assert_eq!(generated.value.edges.len(), 1);
        assert_eq!(
            provider.calls()[0].system.as_deref(),
            Some(prompts::ARCHITECT)
        );
    }
}
