//! Pipeline state and resumable checkpoints
//!
//! A [`PipelineCheckpoint`] records every validated stage output of one run.
//! Nothing here touches the filesystem; an external substrate may serialize
//! the checkpoint and hand it back to `TutorialPipeline::execute` to resume
//! after a crash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ai::TokenUsage;
use crate::types::{
    Abstraction, Chapter, ChapterPlan, ChapterSummary, Corpus, RelationshipGraph, RunId,
};

/// Pipeline stage identifier
///
/// Stages are numbered 1-6 in execution order:
/// - 1: Corpus - repository walk
/// - 2: Abstractions - concept extraction
/// - 3: Relationships - concept graph
/// - 4: Sequence - teaching order
/// - 5: Chapters - one composition per plan entry
/// - 6: Emission - chapter files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Corpus = 1,
    Abstractions = 2,
    Relationships = 3,
    Sequence = 4,
    Chapters = 5,
    Emission = 6,
}

impl PipelineStage {
    /// Total number of stages
    pub const COUNT: usize = 6;

    pub fn name(&self) -> &'static str {
        match self {
            Self::Corpus => "Corpus",
            Self::Abstractions => "Abstraction Extraction",
            Self::Relationships => "Relationship Extraction",
            Self::Sequence => "Chapter Ordering",
            Self::Chapters => "Chapter Composition",
            Self::Emission => "Emission",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Run state machine
///
/// `Init → CorpusReady → AbstractionsReady → RelationshipsReady → PlanReady →
/// Composing(1..=N) → Done`; `Failed` is reachable from any running state
/// and is absorbing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PipelineState {
    Init,
    CorpusReady,
    AbstractionsReady,
    RelationshipsReady,
    PlanReady,
    /// Composing the given 1-based chapter
    Composing { chapter: usize },
    Done,
    Failed { stage: PipelineStage, reason: String },
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::CorpusReady => write!(f, "corpus ready"),
            Self::AbstractionsReady => write!(f, "abstractions ready"),
            Self::RelationshipsReady => write!(f, "relationships ready"),
            Self::PlanReady => write!(f, "plan ready"),
            Self::Composing { chapter } => write!(f, "composing chapter {}", chapter),
            Self::Done => write!(f, "done"),
            Self::Failed { stage, reason } => write!(f, "failed in {}: {}", stage, reason),
        }
    }
}

/// Validated outputs of a run so far
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineCheckpoint {
    pub run_id: RunId,
    pub project_name: String,
    pub state: PipelineState,
    pub corpus: Option<Corpus>,
    pub abstractions: Option<Vec<Abstraction>>,
    pub graph: Option<RelationshipGraph>,
    pub plan: Option<ChapterPlan>,
    /// Finished chapters in plan order
    pub chapters: Vec<Chapter>,
    /// Paths handed back by the emission sink
    pub written: Vec<PathBuf>,
    pub usage: TokenUsage,
    pub updated_at: DateTime<Utc>,
}

impl PipelineCheckpoint {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            run_id: RunId::generate(),
            project_name: project_name.into(),
            state: PipelineState::Init,
            corpus: None,
            abstractions: None,
            graph: None,
            plan: None,
            chapters: Vec::new(),
            written: Vec::new(),
            usage: TokenUsage::default(),
            updated_at: Utc::now(),
        }
    }

    pub(crate) fn transition(&mut self, state: PipelineState) {
        self.state = state;
        self.updated_at = Utc::now();
    }

    /// State implied by the stored outputs alone
    pub fn derived_state(&self) -> PipelineState {
        match (&self.corpus, &self.abstractions, &self.graph, &self.plan) {
            (None, ..) => PipelineState::Init,
            (Some(_), None, ..) => PipelineState::CorpusReady,
            (Some(_), Some(_), None, _) => PipelineState::AbstractionsReady,
            (Some(_), Some(_), Some(_), None) => PipelineState::RelationshipsReady,
            (Some(_), Some(_), Some(_), Some(plan)) => {
                if self.chapters.is_empty() {
                    PipelineState::PlanReady
                } else if self.chapters.len() < plan.len() || self.written.is_empty() {
                    PipelineState::Composing {
                        chapter: (self.chapters.len() + 1).min(plan.len()),
                    }
                } else {
                    PipelineState::Done
                }
            }
        }
    }

    /// Leave the failed state so the failed stage can be replayed
    ///
    /// Outputs of stages that had already validated are kept.
    pub fn retry(&mut self) {
        if matches!(self.state, PipelineState::Failed { .. }) {
            let state = self.derived_state();
            self.transition(state);
        }
    }

    /// Continuity context rebuilt from finished chapters
    pub fn summaries(&self) -> Vec<ChapterSummary> {
        self.chapters.iter().map(ChapterSummary::from_chapter).collect()
    }

    /// Fraction of stages finished (0.0 - 1.0)
    pub fn progress(&self) -> f32 {
        let done = match self.derived_state() {
            PipelineState::Init => 0,
            PipelineState::CorpusReady => 1,
            PipelineState::AbstractionsReady => 2,
            PipelineState::RelationshipsReady => 3,
            PipelineState::PlanReady | PipelineState::Composing { .. } => 4,
            PipelineState::Done => PipelineStage::COUNT,
            PipelineState::Failed { .. } => 0,
        };
        done as f32 / PipelineStage::COUNT as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checkpoint_is_init() {
        let checkpoint = PipelineCheckpoint::new("demo");
        assert_eq!(checkpoint.state, PipelineState::Init);
        assert_eq!(checkpoint.derived_state(), PipelineState::Init);
        assert_eq!(checkpoint.progress(), 0.0);
    }

    #[test]
    fn test_derived_state_follows_outputs() {
        let mut checkpoint = PipelineCheckpoint::new("demo");
        checkpoint.corpus = Some(Corpus::from_entries([("a.rs", "")]));
        assert_eq!(checkpoint.derived_state(), PipelineState::CorpusReady);

        checkpoint.abstractions = Some(vec![]);
        checkpoint.graph = Some(RelationshipGraph::default());
        checkpoint.plan = Some(ChapterPlan::new_unchecked(vec![0, 1]));
        assert_eq!(checkpoint.derived_state(), PipelineState::PlanReady);

        checkpoint.chapters.push(Chapter {
            number: 1,
            title: "A".into(),
            content: "text".into(),
        });
        assert_eq!(
            checkpoint.derived_state(),
            PipelineState::Composing { chapter: 2 }
        );
    }

    #[test]
    fn test_retry_leaves_failed_state() {
        let mut checkpoint = PipelineCheckpoint::new("demo");
        checkpoint.corpus = Some(Corpus::from_entries([("a.rs", "")]));
        checkpoint.transition(PipelineState::Failed {
            stage: PipelineStage::Abstractions,
            reason: "bad yaml".into(),
        });
        assert!(matches!(checkpoint.state, PipelineState::Failed { .. }));

        checkpoint.retry();
        assert_eq!(checkpoint.state, PipelineState::CorpusReady);
    }

    #[test]
    fn test_checkpoint_serializes() {
        let mut checkpoint = PipelineCheckpoint::new("demo");
        checkpoint.transition(PipelineState::Composing { chapter: 3 });

        let json = serde_json::to_string(&checkpoint).unwrap();
        let restored: PipelineCheckpoint = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.state, PipelineState::Composing { chapter: 3 });
        assert_eq!(restored.run_id, checkpoint.run_id);
    }
}
