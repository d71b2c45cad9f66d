//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Corpus scanning defaults
pub mod corpus {
    /// Maximum number of files collected per run
    pub const DEFAULT_MAX_FILES: usize = 100;

    /// Files larger than this are skipped (1 MiB)
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

    /// Include patterns applied when none are configured
    pub const DEFAULT_INCLUDE: &[&str] = &[
        "*.go", "*.py", "*.js", "*.ts", "*.java", "*.rb", "*.rs", "*.md",
    ];

    /// Exclude patterns applied when none are configured
    pub const DEFAULT_EXCLUDE: &[&str] = &[
        "*_test.go",
        "vendor/*",
        "node_modules/*",
        ".git/*",
        "*.min.js",
        "target/*",
    ];
}

/// Per-stage context budgets (in characters)
///
/// These bound how much source text each prompt carries.
pub mod context {
    /// Per-file sample in the abstraction prompt
    pub const ABSTRACTION_FILE_CHARS: usize = 5000;
    pub const ABSTRACTION_TRUNCATION_MARKER: &str = "\n... (truncated)";

    /// Per-file sample in the relationship prompt
    pub const RELATIONSHIP_FILE_CHARS: usize = 500;
    pub const RELATIONSHIP_TRUNCATION_MARKER: &str = "...";

    /// Per-file content in the chapter prompt
    pub const CHAPTER_FILE_CHARS: usize = 8000;
    pub const CHAPTER_TRUNCATION_MARKER: &str = "\n... (truncated for brevity)";

    /// Continuity summary of a finished chapter
    pub const SUMMARY_CHARS: usize = 200;
    pub const SUMMARY_TRUNCATION_MARKER: &str = "...";
}

/// Tutorial generation defaults
pub mod tutorial {
    /// Upper bound on abstractions kept from the extractor
    pub const DEFAULT_MAX_ABSTRACTIONS: usize = 10;

    /// Output directory, relative to the working directory
    pub const DEFAULT_OUTPUT_DIR: &str = "tutorial";

    /// Project name used when the repository path has no usable final segment
    pub const FALLBACK_PROJECT_NAME: &str = "Project";

    /// Fence info strings accepted for structured responses
    pub const STRUCTURED_TAGS: &[&str] = &["yaml", "yml"];
}

/// LLM backend defaults
pub mod llm {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
    pub const DEFAULT_MAX_TOKENS: usize = 4096;

    /// Environment variable overriding the model for OpenAI-compatible backends
    pub const MODEL_ENV: &str = "LLM_MODEL";

    pub const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";
    pub const OPENROUTER_DEFAULT_MODEL: &str = "openai/gpt-4";

    pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
    pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o";

    pub const OLLAMA_API_BASE: &str = "http://localhost:11434";
    pub const OLLAMA_DEFAULT_MODEL: &str = "llama3:latest";
}

/// System instructions sent with each stage's generator call
pub mod prompts {
    pub const ANALYST: &str =
        "You are a code analysis expert helping developers understand unfamiliar codebases.";

    pub const ARCHITECT: &str = "You are a software architecture analyst.";

    pub const EDUCATOR: &str = "You are an expert technical educator.";

    pub const CHAPTER_WRITER: &str = "You are an expert technical educator who excels at explaining complex code in simple terms.";
}
