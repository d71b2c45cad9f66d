//! Generate Command
//!
//! Builds a tutorial for a repository:
//!
//!   codetutor generate --repo <path> [--output <dir>] [--project <name>]
//!       [--max-files N] [--max-abstractions N] [--provider P] [--model M]
//!       [--include GLOB]... [--exclude GLOB]... [--checkpoint FILE] [--dry-run]
//!
//! With `--checkpoint`, a previous run's state is loaded from the file when it
//! exists and the updated state is written back whether the run succeeds or
//! fails, so a failed run can be continued without repeating finished stages.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::runtime::Runtime;
use tracing::info;

use crate::ai::{SharedProvider, create_provider};
use crate::analyzer::FileScanner;
use crate::cli::Output;
use crate::config::{Config, ConfigLoader};
use crate::tutorial::{
    MarkdownWriter, PipelineCheckpoint, PipelineOptions, PipelineState, TutorialOutput,
    TutorialPipeline, derive_project_name,
};
use crate::types::{Result, TutorError};

/// Command-line overrides for one run
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub repo: PathBuf,
    pub output: Option<PathBuf>,
    pub project: Option<String>,
    pub max_files: Option<usize>,
    pub max_abstractions: Option<usize>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub checkpoint: Option<PathBuf>,
    pub dry_run: bool,
}

pub fn run(options: GenerateOptions) -> Result<()> {
    let mut config = ConfigLoader::load()?;
    apply_overrides(&mut config, &options);
    config.validate()?;

    let project_name = config
        .tutorial
        .project_name
        .clone()
        .unwrap_or_else(|| derive_project_name(&options.repo));

    let output = Output::new();

    if options.dry_run {
        print_dry_run(&output, &config, &options.repo, &project_name);
        return Ok(());
    }

    let scanner = FileScanner::new(&options.repo)
        .with_include(config.analysis.include.clone())
        .with_exclude(config.analysis.exclude.clone())
        .with_max_file_size(config.analysis.max_file_size)
        .with_max_files(config.analysis.max_files);

    let provider = create_provider(&config.llm.to_provider_config())?;
    info!(
        "Using LLM provider: {} ({})",
        provider.name(),
        provider.model()
    );

    let output_dir = config.tutorial.output_dir.clone();
    let pipeline = TutorialPipeline::new(
        provider.clone(),
        Arc::new(scanner),
        Arc::new(MarkdownWriter::new(&output_dir)),
        PipelineOptions::new(project_name.clone())
            .with_max_abstractions(config.tutorial.max_abstractions),
    );

    let mut checkpoint = match &options.checkpoint {
        Some(path) if path.exists() => {
            let mut checkpoint = load_checkpoint(path)?;
            checkpoint.retry();
            output.info(&resume_message(&checkpoint));
            checkpoint
        }
        _ => PipelineCheckpoint::new(project_name),
    };

    let rt = Runtime::new()?;
    if checkpoint.state != PipelineState::Done {
        rt.block_on(preflight(&provider))?;
    }
    let result = rt.block_on(pipeline.execute(&mut checkpoint));

    if let Some(path) = &options.checkpoint {
        save_checkpoint(path, &checkpoint)?;
    }

    match result {
        Ok(summary) => {
            print_result(&output, &summary, &output_dir);
            Ok(())
        }
        Err(err) => {
            if let Some(path) = &options.checkpoint
                && err.is_recoverable()
            {
                output.warning(&format!(
                    "Run state saved to {}; rerun with the same --checkpoint to continue",
                    path.display()
                ));
            }
            Err(err)
        }
    }
}

/// Fail before any stage runs when the backend cannot be reached
async fn preflight(provider: &SharedProvider) -> Result<()> {
    if provider.health_check().await? {
        return Ok(());
    }
    Err(TutorError::Config(format!(
        "{} backend is not available for model {}",
        provider.name(),
        provider.model()
    )))
}

fn resume_message(checkpoint: &PipelineCheckpoint) -> String {
    format!(
        "Resuming run {} ({}, {:.0}% of stages done)",
        checkpoint.run_id,
        checkpoint.state,
        checkpoint.progress() * 100.0
    )
}

/// Layer command-line flags over the loaded configuration
pub fn apply_overrides(config: &mut Config, options: &GenerateOptions) {
    if let Some(provider) = &options.provider {
        config.llm.provider = provider.clone();
    }
    if let Some(model) = &options.model {
        config.llm.model = Some(model.clone());
    }
    if let Some(max_files) = options.max_files {
        config.analysis.max_files = max_files;
    }
    if !options.include.is_empty() {
        config.analysis.include = options.include.clone();
    }
    if !options.exclude.is_empty() {
        config.analysis.exclude = options.exclude.clone();
    }
    if let Some(project) = &options.project {
        config.tutorial.project_name = Some(project.clone());
    }
    if let Some(dir) = &options.output {
        config.tutorial.output_dir = dir.clone();
    }
    if let Some(max) = options.max_abstractions {
        config.tutorial.max_abstractions = max;
    }
}

fn load_checkpoint(path: &Path) -> Result<PipelineCheckpoint> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        TutorError::InputValidation(format!(
            "cannot read checkpoint {}: {}",
            path.display(),
            e
        ))
    })
}

fn save_checkpoint(path: &Path, checkpoint: &PipelineCheckpoint) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(checkpoint)?)?;
    info!("Saved checkpoint to {}", path.display());
    Ok(())
}

fn print_dry_run(output: &Output, config: &Config, repo: &Path, project_name: &str) {
    output.header("Dry run: resolved configuration");
    output.field("Repository", repo.display());
    output.field("Project", project_name);
    output.field("Output", config.tutorial.output_dir.display());
    output.field("Provider", &config.llm.provider);
    output.field(
        "Model",
        config.llm.model.as_deref().unwrap_or("(provider default)"),
    );
    output.field("Max files", config.analysis.max_files);
    output.field("Max file size", config.analysis.max_file_size);
    output.field("Max abstractions", config.tutorial.max_abstractions);
    output.field("Include", config.analysis.include.join(" "));
    output.field("Exclude", config.analysis.exclude.join(" "));
}

fn print_result(output: &Output, summary: &TutorialOutput, output_dir: &Path) {
    output.success(&format!(
        "Tutorial for {} complete",
        summary.project_name
    ));
    output.field("Run", &summary.run_id);
    output.field("Files", summary.files);
    output.field("Abstractions", summary.abstractions);
    output.field("Relationships", summary.relationships);
    output.field("Chapters", summary.chapters.len());
    output.field(
        "Tokens",
        format!(
            "{} in / {} out",
            summary.usage.input_tokens, summary.usage.output_tokens
        ),
    );
    output.field("Duration", format!("{}s", summary.duration_secs));
    output.field("Output", output_dir.display());

    output.section("Chapters");
    for path in &summary.written {
        output.item(path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tutorial::testing::ScriptedProvider;
    use crate::types::{Corpus, RelationshipGraph};
    use tempfile::TempDir;

    #[test]
    fn test_overrides_replace_only_given_values() {
        let mut config = Config::default();
        let options = GenerateOptions {
            repo: PathBuf::from("."),
            model: Some("gpt-4o-mini".into()),
            max_files: Some(5),
            output: Some(PathBuf::from("docs/tutorial")),
            ..Default::default()
        };

        apply_overrides(&mut config, &options);

        assert_eq!(config.llm.provider, "openrouter");
        assert_eq!(config.llm.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.analysis.max_files, 5);
        assert_eq!(config.tutorial.output_dir, PathBuf::from("docs/tutorial"));
        assert_eq!(config.tutorial.max_abstractions, 10);
        assert!(config.analysis.include.contains(&"*.rs".to_string()));
    }

    #[test]
    fn test_pattern_overrides_replace_defaults() {
        let mut config = Config::default();
        let options = GenerateOptions {
            include: vec!["*.py".into()],
            exclude: vec!["tests/*".into()],
            ..Default::default()
        };

        apply_overrides(&mut config, &options);

        assert_eq!(config.analysis.include, vec!["*.py".to_string()]);
        assert_eq!(config.analysis.exclude, vec!["tests/*".to_string()]);
    }

    #[test]
    fn test_checkpoint_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state/run.json");
        let checkpoint = PipelineCheckpoint::new("demo");

        save_checkpoint(&path, &checkpoint).unwrap();
        let loaded = load_checkpoint(&path).unwrap();

        assert_eq!(loaded.run_id, checkpoint.run_id);
        assert_eq!(loaded.project_name, "demo");
    }

    #[tokio::test]
    async fn test_preflight_rejects_unavailable_backend() {
        let provider = ScriptedProvider::new(Vec::<String>::new());
        preflight(&provider.shared()).await.unwrap();

        provider.set_healthy(false);
        let err = preflight(&provider.shared()).await.unwrap_err();
        assert!(matches!(err, TutorError::Config(_)));
        assert!(err.to_string().contains("scripted backend is not available"));
    }

    #[test]
    fn test_resume_message_reports_progress() {
        let mut checkpoint = PipelineCheckpoint::new("demo");
        checkpoint.corpus = Some(Corpus::from_entries([("a.rs", "")]));
        checkpoint.abstractions = Some(vec![]);
        checkpoint.graph = Some(RelationshipGraph::default());

        let message = resume_message(&checkpoint);
        assert!(message.starts_with(&format!("Resuming run {}", checkpoint.run_id)));
        assert!(message.ends_with("50% of stages done)"));
    }

    #[test]
    fn test_corrupt_checkpoint_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.json");
        fs::write(&path, "{not json").unwrap();

        let err = load_checkpoint(&path).unwrap_err();
        assert!(matches!(err, TutorError::InputValidation(_)));
    }
}
