/// Configuration module for doctend.
///
/// Everything the two batch jobs need (repository URL, roots, ignore lists,
/// categories, pool size) lives here and is passed explicitly into each run,
/// so the same logic can be pointed at any tree.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use tracing::info;

pub const DEFAULT_CONFIG_PATH: &str = "doctend.json";

// ── Default value functions ──────────────────────────────────────────

fn default_repo_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_docs_dir() -> PathBuf {
    PathBuf::from("docs")
}

fn default_references_file() -> PathBuf {
    PathBuf::from("docs/References.md")
}

fn default_repo_url() -> String {
    "https://github.com/microsoft/multi-agent-reference-architecture".to_string()
}

fn default_category() -> String {
    "q-a".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_script_url() -> String {
    "https://buttons.github.io/buttons.js".to_string()
}

fn default_ignored_files() -> Vec<String> {
    [
        "readme.md",
        "references.md",
        "summary.md",
        "contributing.md",
        "code_of_conduct.md",
        "license",
        "security.md",
        "contributors.md",
        "support.md",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_ignored_urls() -> Vec<String> {
    vec![default_script_url()]
}

fn default_categories() -> Vec<Category> {
    vec![
        Category {
            name: "Microsoft".to_string(),
            patterns: vec!["microsoft".to_string(), "azure".to_string()],
        },
        Category {
            name: "Open AI".to_string(),
            patterns: vec!["openai".to_string()],
        },
    ]
}

fn default_fallback_category() -> String {
    "Other".to_string()
}

fn default_workers() -> usize {
    8
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default = "default_repo_root")]
    pub repo_root: PathBuf,

    /// Documentation root for the button injector (relative to `repo_root`).
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,

    /// Generated reference index (relative to `repo_root`).
    #[serde(default = "default_references_file")]
    pub references_file: PathBuf,

    #[serde(default)]
    pub discussion: DiscussionConfig,

    /// Case-insensitive glob patterns matched against bare file names.
    #[serde(default = "default_ignored_files")]
    pub ignored_files: Vec<String>,

    /// A file mentioning any of these URLs is skipped by the aggregator.
    #[serde(default = "default_ignored_urls")]
    pub ignored_urls: Vec<String>,

    #[serde(default = "default_categories")]
    pub categories: Vec<Category>,

    #[serde(default = "default_fallback_category")]
    pub fallback_category: String,

    #[serde(default = "default_workers")]
    pub workers: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DiscussionConfig {
    #[serde(default = "default_repo_url")]
    pub repo_url: String,

    /// Discussion category slug used in the "new discussion" link.
    #[serde(default = "default_category")]
    pub category: String,

    /// Branch the source blob link points at.
    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(default = "default_script_url")]
    pub script_url: String,
}

/// A named bucket of the reference index.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    /// Case-insensitive substrings of the URL.
    pub patterns: Vec<String>,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            repo_root: default_repo_root(),
            docs_dir: default_docs_dir(),
            references_file: default_references_file(),
            discussion: DiscussionConfig::default(),
            ignored_files: default_ignored_files(),
            ignored_urls: default_ignored_urls(),
            categories: default_categories(),
            fallback_category: default_fallback_category(),
            workers: default_workers(),
        }
    }
}

impl Default for DiscussionConfig {
    fn default() -> Self {
        Self {
            repo_url: default_repo_url(),
            category: default_category(),
            branch: default_branch(),
            script_url: default_script_url(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Default configuration rooted at `repo_root`.
    #[must_use]
    pub fn with_root(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a JSON file.
    ///
    /// A missing file is not an error: defaults are returned.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("{} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let cfg: Config = serde_json::from_str(&data)
            .with_context(|| format!("invalid JSON in {}", path.display()))?;

        info!("Loaded configuration from {}", path.display());
        Ok(cfg)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data)
            .with_context(|| format!("failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.workers > 0, "workers must be positive");
        anyhow::ensure!(
            !self.discussion.repo_url.trim().is_empty(),
            "discussion.repo_url must not be empty"
        );
        anyhow::ensure!(
            !self.fallback_category.trim().is_empty(),
            "fallback_category must not be empty"
        );
        for category in &self.categories {
            anyhow::ensure!(
                !category.name.trim().is_empty(),
                "category names must not be empty"
            );
        }
        self.ignored_file_matcher()
            .context("invalid ignored_files pattern")?;
        Ok(())
    }

    /// Documentation root, resolved against `repo_root`.
    #[must_use]
    pub fn docs_path(&self) -> PathBuf {
        self.repo_root.join(&self.docs_dir)
    }

    /// Reference index location, resolved against `repo_root`.
    #[must_use]
    pub fn references_path(&self) -> PathBuf {
        self.repo_root.join(&self.references_file)
    }

    /// Compile `ignored_files` into a case-insensitive matcher.
    pub fn ignored_file_matcher(&self) -> crate::Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.ignored_files {
            let glob = GlobBuilder::new(pattern)
                .case_insensitive(true)
                .literal_separator(true)
                .build()?;
            builder.add(glob);
        }
        Ok(builder.build()?)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
