/// Reference index generation.
///
/// Scans a repository for outbound http(s) links in Markdown files and keeps
/// a generated `References.md` in sync with them. The default mode only ever
/// appends: links already in the index are left alone and newly discovered
/// ones are added as category sections at the end. The rebuild mode rewrites
/// the whole index from the known and scanned links.
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use globset::GlobSet;
use tracing::{debug, info};

use crate::config::Config;
use crate::document::{Document, find_markdown_files, lowercase_file_name, relative_slash_path};
use crate::error::{Error, Result};
use crate::links::{LinkEntry, LinkSet, extract_links};

pub const INDEX_TITLE: &str = "# References";
pub const GENERATED_MARKER: &str = "<!-- GENERATED FILE DO NOT CHANGE -->";

#[derive(Debug, Default, PartialEq, Eq)]
pub struct AggregateSummary {
    /// Files whose links were extracted.
    pub scanned_files: usize,
    /// Files skipped by name or because they mention a poison URL.
    pub skipped_files: usize,
    /// Links already present in the index before the run.
    pub known_links: usize,
    /// Links added by this run.
    pub new_links: usize,
    pub written: bool,
}

/// Links of one category, sorted by URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub entries: Vec<LinkEntry>,
}

/// Parse the known links out of an index file. A missing file has none.
pub fn load_index(path: &Path) -> Result<LinkSet> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(LinkSet::from_content(&content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(LinkSet::new()),
        Err(e) => Err(Error::read(path, e)),
    }
}

fn index_header() -> String {
    format!("{INDEX_TITLE}\n\n{GENERATED_MARKER}\n")
}

fn render_section(out: &mut String, section: &Section) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&format!("\n## {}\n\n", section.name));
    for entry in &section.entries {
        out.push_str(&entry.to_list_item());
        out.push('\n');
    }
}

pub struct ReferenceAggregator<'a> {
    config: &'a Config,
    ignored_files: GlobSet,
    dry_run: bool,
}

impl<'a> ReferenceAggregator<'a> {
    pub fn new(config: &'a Config) -> Result<Self> {
        Ok(Self {
            config,
            ignored_files: config.ignored_file_matcher()?,
            dry_run: false,
        })
    }

    /// Log decisions without writing the index.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn is_poisoned(&self, content: &str) -> bool {
        self.config
            .ignored_urls
            .iter()
            .any(|url| !url.is_empty() && content.contains(url.as_str()))
    }

    fn is_index_file(path: &Path, index: &Path, index_canonical: Option<&PathBuf>) -> bool {
        if path == index {
            return true;
        }
        match (index_canonical, fs::canonicalize(path)) {
            (Some(index), Ok(path)) => &path == index,
            _ => false,
        }
    }

    /// Collect links from every eligible Markdown file under the repository
    /// root. When a URL appears more than once the first file in walk order
    /// (sorted by file name) supplies the description.
    pub fn scan(&self, summary: &mut AggregateSummary) -> Result<LinkSet> {
        let root = &self.config.repo_root;
        let index = self.config.references_path();
        let index_canonical = fs::canonicalize(&index).ok();

        let mut found = LinkSet::new();
        for path in find_markdown_files(root)? {
            let rel = relative_slash_path(&path, root)
                .unwrap_or_else(|| path.display().to_string());
            if Self::is_index_file(&path, &index, index_canonical.as_ref()) {
                continue;
            }

            if self.ignored_files.is_match(lowercase_file_name(&path)) {
                debug!("Ignoring {rel}");
                summary.skipped_files += 1;
                continue;
            }

            let doc = Document::read(&path)?;
            if self.is_poisoned(&doc.content) {
                debug!("Skipping generated content in {rel}");
                summary.skipped_files += 1;
                continue;
            }

            debug!("Extracting links from {rel}");
            found.extend(extract_links(&doc.content));
            summary.scanned_files += 1;
        }
        Ok(found)
    }

    /// Partition links into the configured categories plus the catch-all.
    ///
    /// A URL belongs to the first category with a pattern that is a
    /// case-insensitive substring of it.
    #[must_use]
    pub fn categorize(&self, links: &LinkSet) -> Vec<Section> {
        let mut sections: Vec<Section> = self
            .config
            .categories
            .iter()
            .map(|c| Section {
                name: c.name.clone(),
                entries: Vec::new(),
            })
            .collect();
        sections.push(Section {
            name: self.config.fallback_category.clone(),
            entries: Vec::new(),
        });
        let fallback = sections.len() - 1;

        for entry in links.iter() {
            let url = entry.url.to_lowercase();
            let slot = self
                .config
                .categories
                .iter()
                .position(|c| {
                    c.patterns
                        .iter()
                        .any(|p| !p.is_empty() && url.contains(&p.to_lowercase()))
                })
                .unwrap_or(fallback);
            sections[slot].entries.push(entry);
        }
        sections
    }

    /// Append newly discovered links to the index.
    pub fn run(&self) -> Result<AggregateSummary> {
        let index = self.config.references_path();
        let known = load_index(&index)?;
        let mut summary = AggregateSummary {
            known_links: known.len(),
            ..Default::default()
        };

        let scanned = self.scan(&mut summary)?;
        let new = scanned.difference(&known);
        summary.new_links = new.len();

        if new.is_empty() {
            info!("References up to date in {}", index.display());
            return Ok(summary);
        }

        let existing = match fs::read_to_string(&index) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(Error::read(&index, e)),
        };

        let mut addition = String::new();
        if existing.trim().is_empty() {
            addition.push_str(&index_header());
        } else if !existing.ends_with('\n') {
            addition.push('\n');
        }
        for section in self.categorize(&new) {
            if !section.entries.is_empty() {
                render_section(&mut addition, &section);
            }
        }

        if self.dry_run {
            info!(
                "Would append {} new references to {}",
                new.len(),
                index.display()
            );
            return Ok(summary);
        }

        if existing.trim().is_empty() {
            // Whitespace-only index: start it over with the header.
            write_file(&index, &addition)?;
        } else {
            let mut file = OpenOptions::new()
                .append(true)
                .open(&index)
                .map_err(|e| Error::write(&index, e))?;
            file.write_all(addition.as_bytes())
                .map_err(|e| Error::write(&index, e))?;
        }
        summary.written = true;
        info!(
            "Appended {} new references to {}",
            new.len(),
            index.display()
        );
        Ok(summary)
    }

    /// Regenerate the whole index from known and scanned links.
    pub fn rebuild(&self) -> Result<AggregateSummary> {
        let index = self.config.references_path();
        let known = load_index(&index)?;
        let mut summary = AggregateSummary {
            known_links: known.len(),
            ..Default::default()
        };

        let scanned = self.scan(&mut summary)?;
        summary.new_links = scanned.difference(&known).len();

        let mut all = known;
        all.extend(scanned.iter());

        let mut rendered = index_header();
        for section in self.categorize(&all) {
            render_section(&mut rendered, &section);
        }

        let current = fs::read_to_string(&index).unwrap_or_default();
        if current == rendered {
            info!("References up to date in {}", index.display());
            return Ok(summary);
        }

        if self.dry_run {
            info!("Would rebuild {} with {} links", index.display(), all.len());
            return Ok(summary);
        }

        write_file(&index, &rendered)?;
        summary.written = true;
        info!("Rebuilt {} with {} links", index.display(), all.len());
        Ok(summary)
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::write(parent, e))?;
        }
    }
    fs::write(path, content).map_err(|e| Error::write(path, e))
}
