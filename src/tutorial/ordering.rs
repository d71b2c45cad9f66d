//! Sequencer
//!
//! Asks the generator for a teaching order and checks it is a permutation
//! of every abstraction index. A plausible-looking order can drop or double
//! an entry, so validation runs in three layers: bounds, duplicates, then
//! completeness.

use std::fmt::Write;
use tracing::{info, instrument};

use super::helpers::{Generated, StageCall, run_stage};
use crate::ai::{IndexRef, SharedProvider, parse_structured, resolve_index};
use crate::constants::prompts;
use crate::types::{Abstraction, ChapterPlan, RelationshipGraph, Result, TutorError};

pub struct Sequencer {
    provider: SharedProvider,
}

impl Sequencer {
    pub fn new(provider: SharedProvider) -> Self {
        Self { provider }
    }

    #[instrument(skip_all, fields(abstractions = abstractions.len()))]
    pub async fn order(
        &self,
        abstractions: &[Abstraction],
        graph: &RelationshipGraph,
        project_name: &str,
    ) -> Result<Generated<ChapterPlan>> {
        if abstractions.is_empty() {
            return Err(TutorError::InputValidation(
                "no abstractions provided".to_string(),
            ));
        }

        let call = StageCall {
            label: "sequence",
            prompt: build_prompt(abstractions, graph, project_name),
            system: prompts::EDUCATOR,
        };

        let generated = run_stage(&self.provider, call, |raw| {
            parse_response(raw, abstractions.len())
        })
        .await?;

        info!("Chapter order: {:?}", generated.value.order());
        Ok(generated)
    }
}

pub fn build_prompt(
    abstractions: &[Abstraction],
    graph: &RelationshipGraph,
    project_name: &str,
) -> String {
    let name_of = |index: usize| {
        abstractions
            .get(index)
            .map(|a| a.name.as_str())
            .unwrap_or("?")
    };

    let mut listing = String::new();
    for abstraction in abstractions {
        let _ = writeln!(
            listing,
            "- {} # {}: {}",
            abstraction.index, abstraction.name, abstraction.description
        );
    }

    let mut context = format!("Project Summary: {}\n\nRelationships:\n", graph.summary);
    for edge in &graph.edges {
        let _ = writeln!(
            context,
            "- {} ({}) → {} ({}): {}",
            edge.from,
            name_of(edge.from),
            edge.to,
            name_of(edge.to),
            edge.label
        );
    }

    format!(
        r#"You are planning a beginner tutorial for the "{project_name}" project.

ABSTRACTIONS:
{listing}
CONTEXT:
{context}
Decide the best order in which to teach these abstractions to a newcomer:
- start with foundational concepts or user-facing entry points
- move on to implementation details afterwards
- explain what something depends on before the thing itself

Answer with a YAML list of abstraction INDICES in teaching order, written as
"index # Name" for clarity. Include EVERY abstraction exactly once.
```yaml
- 2 # EntryPoint
- 0 # Foundation
- 1 # Implementation
```
"#
    )
}

/// Validate a proposed order as a permutation of `0..abstraction_count`
pub fn parse_response(raw: &str, abstraction_count: usize) -> Result<ChapterPlan> {
    let entries: Vec<IndexRef> = parse_structured(raw, "chapter order")?;

    let mut seen = vec![false; abstraction_count];
    let mut order = Vec::with_capacity(entries.len());

    for (position, entry) in entries.iter().enumerate() {
        let index = resolve_index(
            entry,
            abstraction_count,
            &format!("chapter order position {position}"),
        )?;

        if seen[index] {
            return Err(TutorError::DuplicatePlanEntry { index, position });
        }
        seen[index] = true;
        order.push(index);
    }

    let missing: Vec<usize> = seen
        .iter()
        .enumerate()
        .filter(|(_, present)| !**present)
        .map(|(index, _)| index)
        .collect();

    if !missing.is_empty() {
        return Err(TutorError::PlanIncomplete { missing });
    }

    Ok(ChapterPlan::new_unchecked(order))
}
