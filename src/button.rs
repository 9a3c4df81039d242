/// "Discuss this page" button injection.
///
/// Every Markdown file under the documentation root ends with a single
/// discussion block: a horizontal rule, a GitHub button anchor pointing at a
/// new-discussion URL for the page, and the button script tag. The block is
/// located by its header marker and appended, left alone or replaced.
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::{Config, DiscussionConfig};
use crate::document::{Document, repo_relative_path, walk_markdown_files};
use crate::error::{Error, Result};

/// Start of an injected block. Only matched at the start of a line.
pub const SNIPPET_MARKER: &str = "---\n\n<a class=\"github-button\"";

/// What an update did (or would do) to one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Added,
    Replaced,
    UpToDate,
}

/// Outcome of planning an update: the action and, unless up to date,
/// the full new file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonUpdate {
    pub action: ButtonAction,
    pub content: Option<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct InjectSummary {
    pub added: usize,
    pub replaced: usize,
    pub up_to_date: usize,
    pub failed: usize,
}

impl InjectSummary {
    fn record(&mut self, action: ButtonAction) {
        match action {
            ButtonAction::Added => self.added += 1,
            ButtonAction::Replaced => self.replaced += 1,
            ButtonAction::UpToDate => self.up_to_date += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.added + self.replaced + self.up_to_date + self.failed
    }
}

/// Build the canonical discussion block for a page.
#[must_use]
pub fn build_snippet(discussion: &DiscussionConfig, title: &str, rel_path: &str) -> String {
    let repo = discussion.repo_url.trim_end_matches('/');
    format!(
        "{SNIPPET_MARKER} href=\"{repo}/discussions/new?category={category}&body=Source: [{title}]({repo}/blob/{branch}/{rel_path})\" \
         data-icon=\"octicon-comment-discussion\" target=\"_blank\" data-size=\"large\" \
         aria-label=\"Discuss buttons/github-buttons on GitHub\">Discuss this page</a>\n\n\
         <script async defer src=\"{script}\"></script>",
        category = discussion.category,
        branch = discussion.branch,
        script = discussion.script_url,
    )
}

/// Byte offset of the last marker that starts a line.
fn find_marker(content: &str) -> Option<usize> {
    let mut haystack = content;
    while let Some(idx) = haystack.rfind(SNIPPET_MARKER) {
        if idx == 0 || haystack.as_bytes()[idx - 1] == b'\n' {
            return Some(idx);
        }
        haystack = &haystack[..idx];
    }
    None
}

fn join_block(prefix: &str, snippet: &str) -> String {
    let prefix = prefix.trim_end();
    if prefix.is_empty() {
        format!("{snippet}\n")
    } else {
        format!("{prefix}\n\n{snippet}\n")
    }
}

/// Decide how `content` must change so it ends with exactly `snippet`.
#[must_use]
pub fn plan_update(content: &str, snippet: &str) -> ButtonUpdate {
    match find_marker(content) {
        None => ButtonUpdate {
            action: ButtonAction::Added,
            content: Some(join_block(content, snippet)),
        },
        Some(idx) if content[idx..].trim() == snippet => ButtonUpdate {
            action: ButtonAction::UpToDate,
            content: None,
        },
        Some(idx) => ButtonUpdate {
            action: ButtonAction::Replaced,
            content: Some(join_block(&content[..idx], snippet)),
        },
    }
}

/// Adds or refreshes discussion buttons across a documentation tree.
pub struct ButtonInjector<'a> {
    config: &'a Config,
    dry_run: bool,
}

impl<'a> ButtonInjector<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            dry_run: false,
        }
    }

    /// Log decisions without writing any file.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Update a single file. The returned action is what was (or, in a dry
    /// run, would have been) done.
    pub fn update_file(&self, path: &Path) -> Result<ButtonAction> {
        let doc = Document::read(path)?;
        let rel_path = repo_relative_path(path, &self.config.repo_root)?;
        let snippet = build_snippet(&self.config.discussion, &doc.title(), &rel_path);

        let update = plan_update(&doc.content, &snippet);
        if !self.dry_run {
            if let Some(new_content) = &update.content {
                fs::write(path, new_content).map_err(|e| Error::write(path, e))?;
            }
        }

        match (update.action, self.dry_run) {
            (ButtonAction::Added, false) => info!("Discussions button added to {rel_path}"),
            (ButtonAction::Added, true) => info!("Would add discussions button to {rel_path}"),
            (ButtonAction::Replaced, false) => {
                info!("Discussions button replaced in {rel_path}")
            }
            (ButtonAction::Replaced, true) => {
                info!("Would replace discussions button in {rel_path}")
            }
            (ButtonAction::UpToDate, _) => {
                info!("Discussions button already present and up to date in {rel_path}")
            }
        }
        Ok(update.action)
    }

    /// Process every Markdown file under the documentation root on a bounded
    /// worker pool. Per-file failures and unreadable walk entries are logged
    /// and counted, never fatal.
    pub fn run(&self) -> Result<InjectSummary> {
        let docs = self.config.docs_path();
        let walk = walk_markdown_files(&docs);
        let files = walk.files;
        let mut summary = InjectSummary::default();
        for e in walk.errors {
            warn!("Skipping unreadable entry under {}: {e}", docs.display());
            summary.failed += 1;
        }
        info!(
            "Found {} markdown files under {}",
            files.len(),
            docs.display()
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .build()?;

        let outcomes: Vec<(PathBuf, Result<ButtonAction>)> = pool.install(|| {
            files
                .par_iter()
                .map(|path| (path.clone(), self.update_file(path)))
                .collect()
        });

        for (path, outcome) in outcomes {
            match outcome {
                Ok(action) => summary.record(action),
                Err(e) => {
                    warn!("Skipping {}: {e}", path.display());
                    summary.failed += 1;
                }
            }
        }
        Ok(summary)
    }
}
