//! Tutorial Pipeline Orchestrator
//!
//! Runs the stages in a fixed order, each one starting only after the
//! previous output validated:
//!
//! ```text
//! Corpus → Abstractions → Relationships → Sequence → Chapters(×N) → Emission
//! ```
//!
//! Chapters are composed strictly in plan order because chapter k+1 reads
//! the summaries of chapters 1..k. Any failure aborts the run before
//! emission, so a failed run writes nothing.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument};

use super::abstractions::AbstractionExtractor;
use super::chapters::ChapterComposer;
use super::checkpoint::{PipelineCheckpoint, PipelineStage, PipelineState};
use super::emit::ChapterSink;
use super::ordering::Sequencer;
use super::relationships::RelationshipExtractor;
use crate::ai::{SharedProvider, TokenUsage};
use crate::analyzer::CorpusProvider;
use crate::constants::tutorial::{DEFAULT_MAX_ABSTRACTIONS, FALLBACK_PROJECT_NAME};
use crate::types::{Chapter, ChapterSummary, Result, RunId, TutorError};

/// Per-run knobs
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub project_name: String,
    pub max_abstractions: usize,
}

impl PipelineOptions {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            max_abstractions: DEFAULT_MAX_ABSTRACTIONS,
        }
    }

    pub fn with_max_abstractions(mut self, max: usize) -> Self {
        self.max_abstractions = max;
        self
    }
}

/// Summary of a finished run
#[derive(Debug, Clone)]
pub struct TutorialOutput {
    pub run_id: RunId,
    pub project_name: String,
    pub files: usize,
    pub abstractions: usize,
    pub relationships: usize,
    pub chapters: Vec<Chapter>,
    pub written: Vec<PathBuf>,
    pub usage: TokenUsage,
    pub duration_secs: u64,
}

impl TutorialOutput {
    fn from_checkpoint(checkpoint: &PipelineCheckpoint, duration_secs: u64) -> Self {
        Self {
            run_id: checkpoint.run_id.clone(),
            project_name: checkpoint.project_name.clone(),
            files: checkpoint.corpus.as_ref().map_or(0, |c| c.len()),
            abstractions: checkpoint.abstractions.as_ref().map_or(0, Vec::len),
            relationships: checkpoint.graph.as_ref().map_or(0, |g| g.edges.len()),
            chapters: checkpoint.chapters.clone(),
            written: checkpoint.written.clone(),
            usage: checkpoint.usage,
            duration_secs,
        }
    }
}

pub struct TutorialPipeline {
    corpus: Arc<dyn CorpusProvider>,
    sink: Arc<dyn ChapterSink>,
    options: PipelineOptions,
    abstractions: AbstractionExtractor,
    relationships: RelationshipExtractor,
    sequencer: Sequencer,
    composer: ChapterComposer,
}

impl TutorialPipeline {
    pub fn new(
        provider: SharedProvider,
        corpus: Arc<dyn CorpusProvider>,
        sink: Arc<dyn ChapterSink>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            corpus,
            sink,
            options,
            abstractions: AbstractionExtractor::new(provider.clone()),
            relationships: RelationshipExtractor::new(provider.clone()),
            sequencer: Sequencer::new(provider.clone()),
            composer: ChapterComposer::new(provider),
        }
    }

    /// Run the whole pipeline (fresh start)
    pub async fn run(&self) -> Result<TutorialOutput> {
        let mut checkpoint = PipelineCheckpoint::new(self.options.project_name.clone());
        self.execute(&mut checkpoint).await
    }

    /// Run from wherever `checkpoint` left off
    ///
    /// Stage outputs already present are not recomputed. On failure the
    /// checkpoint moves to `Failed` and keeps everything that validated;
    /// call [`PipelineCheckpoint::retry`] before executing it again.
    #[instrument(skip_all, fields(run_id = %checkpoint.run_id, project = %checkpoint.project_name))]
    pub async fn execute(&self, checkpoint: &mut PipelineCheckpoint) -> Result<TutorialOutput> {
        match &checkpoint.state {
            PipelineState::Failed { stage, reason } => {
                return Err(TutorError::InputValidation(format!(
                    "run {} already failed in {}: {}; retry the checkpoint to replay it",
                    checkpoint.run_id, stage, reason
                )));
            }
            PipelineState::Done => {
                info!("Run already complete, nothing to do");
                return Ok(TutorialOutput::from_checkpoint(checkpoint, 0));
            }
            PipelineState::Init => info!("Tutorial pipeline: starting"),
            state => info!("Tutorial pipeline: resuming ({})", state),
        }

        let start_time = Instant::now();

        match self.advance(checkpoint).await {
            Ok(()) => {
                let duration = start_time.elapsed().as_secs();
                info!(
                    "Tutorial pipeline: done, {} chapters in {}s ({} tokens)",
                    checkpoint.chapters.len(),
                    duration,
                    checkpoint.usage.total()
                );
                Ok(TutorialOutput::from_checkpoint(checkpoint, duration))
            }
            Err(err) => {
                let stage = err.stage().unwrap_or(PipelineStage::Corpus);
                error!(%stage, kind = %err.kind(), "Tutorial pipeline failed: {}", err.root());
                checkpoint.transition(PipelineState::Failed {
                    stage,
                    reason: err.root().to_string(),
                });
                Err(err)
            }
        }
    }

    async fn advance(&self, checkpoint: &mut PipelineCheckpoint) -> Result<()> {
        // ===== STAGE 1: Corpus =====
        if checkpoint.corpus.is_none() {
            info!("Stage 1: Collecting source files");
            let corpus = self
                .corpus
                .load_corpus()
                .map_err(|e| e.in_stage(PipelineStage::Corpus))?;
            info!("Collected {} files", corpus.len());
            checkpoint.corpus = Some(corpus);
            checkpoint.transition(PipelineState::CorpusReady);
        } else {
            info!("Stage 1: Skipped (resuming from checkpoint)");
        }

        // ===== STAGE 2: Abstractions =====
        if checkpoint.abstractions.is_none() {
            info!("Stage 2: Extracting abstractions");
            let corpus = require(&checkpoint.corpus, "corpus", PipelineStage::Abstractions)?;
            let generated = self
                .abstractions
                .extract(corpus, &checkpoint.project_name, self.options.max_abstractions)
                .await
                .map_err(|e| e.in_stage(PipelineStage::Abstractions))?;
            checkpoint.usage += generated.usage;
            checkpoint.abstractions = Some(generated.value);
            checkpoint.transition(PipelineState::AbstractionsReady);
        } else {
            info!("Stage 2: Skipped (resuming from checkpoint)");
        }

        // ===== STAGE 3: Relationships =====
        if checkpoint.graph.is_none() {
            info!("Stage 3: Extracting relationships");
            let corpus = require(&checkpoint.corpus, "corpus", PipelineStage::Relationships)?;
            let abstractions = require(
                &checkpoint.abstractions,
                "abstractions",
                PipelineStage::Relationships,
            )?;
            let generated = self
                .relationships
                .extract(abstractions, corpus, &checkpoint.project_name)
                .await
                .map_err(|e| e.in_stage(PipelineStage::Relationships))?;
            checkpoint.usage += generated.usage;
            checkpoint.graph = Some(generated.value);
            checkpoint.transition(PipelineState::RelationshipsReady);
        } else {
            info!("Stage 3: Skipped (resuming from checkpoint)");
        }

        // ===== STAGE 4: Sequence =====
        if checkpoint.plan.is_none() {
            info!("Stage 4: Ordering chapters");
            let abstractions = require(
                &checkpoint.abstractions,
                "abstractions",
                PipelineStage::Sequence,
            )?;
            let graph = require(&checkpoint.graph, "relationship graph", PipelineStage::Sequence)?;
            let generated = self
                .sequencer
                .order(abstractions, graph, &checkpoint.project_name)
                .await
                .map_err(|e| e.in_stage(PipelineStage::Sequence))?;
            checkpoint.usage += generated.usage;
            checkpoint.plan = Some(generated.value);
            checkpoint.transition(PipelineState::PlanReady);
        } else {
            info!("Stage 4: Skipped (resuming from checkpoint)");
        }

        // ===== STAGE 5: Chapters =====
        let total = require(&checkpoint.plan, "chapter plan", PipelineStage::Chapters)?.len();
        let done = checkpoint.chapters.len();
        info!("Stage 5: Composing chapters {}..={} of {}", done + 1, total, total);

        // Only accumulator shared across iterations; rebuilt from finished
        // chapters when resuming
        let mut summaries: Vec<ChapterSummary> = checkpoint.summaries();

        for position in done..total {
            let number = position + 1;
            checkpoint.transition(PipelineState::Composing { chapter: number });

            let corpus = require(&checkpoint.corpus, "corpus", PipelineStage::Chapters)?;
            let abstractions = require(
                &checkpoint.abstractions,
                "abstractions",
                PipelineStage::Chapters,
            )?;
            let plan = require(&checkpoint.plan, "chapter plan", PipelineStage::Chapters)?;
            let abstraction = plan
                .order()
                .get(position)
                .and_then(|&index| abstractions.get(index))
                .ok_or_else(|| {
                    TutorError::InputValidation(format!(
                        "chapter plan position {} does not name an abstraction",
                        position
                    ))
                    .in_stage(PipelineStage::Chapters)
                })?;

            let generated = self
                .composer
                .compose(
                    abstraction,
                    corpus,
                    &summaries,
                    &checkpoint.project_name,
                    number,
                )
                .await
                .map_err(|e| e.in_stage(PipelineStage::Chapters))?;

            summaries.push(ChapterSummary::from_chapter(&generated.value));
            checkpoint.usage += generated.usage;
            checkpoint.chapters.push(generated.value);
        }

        // ===== STAGE 6: Emission =====
        info!("Stage 6: Writing {} chapters", checkpoint.chapters.len());
        let written = self
            .sink
            .emit(&checkpoint.chapters)
            .await
            .map_err(|e| e.in_stage(PipelineStage::Emission))?;
        checkpoint.written = written;
        checkpoint.transition(PipelineState::Done);

        Ok(())
    }
}

/// Stage input from the checkpoint, attributed to the stage that needs it
fn require<'a, T>(value: &'a Option<T>, what: &str, stage: PipelineStage) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| {
        TutorError::InputValidation(format!("checkpoint is missing the {}", what)).in_stage(stage)
    })
}

/// Final path segment of the repository path, or `Project` when there is none
pub fn derive_project_name(repo_path: &Path) -> String {
    repo_path
        .file_name()
        .map(|name| name.to_string_lossy().trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_PROJECT_NAME.to_string())
}
