//! Markdown documents on disk: discovery, display titles and repo-relative paths.
use std::fs;
use std::path::{Component, Path, PathBuf};

use ignore::WalkBuilder;

use crate::error::{Error, Result};

/// A Markdown file and its text content.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub content: String,
}

impl Document {
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            content,
        })
    }

    #[must_use]
    pub fn title(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        display_title(&name)
    }
}

/// Lowercased bare file name, used for ignore-list matching.
#[must_use]
pub fn lowercase_file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Turn a file name into a display title.
///
/// The extension is dropped, `-` and `_` become spaces and every word is
/// title-cased: a letter following a non-letter is uppercased, any other
/// letter is lowercased (`my-API_v2beta.md` → `My Api V2Beta`).
#[must_use]
pub fn display_title(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut title = String::with_capacity(stem.len());
    let mut prev_is_letter = false;
    for c in stem.chars() {
        let c = if c == '-' || c == '_' { ' ' } else { c };
        if c.is_alphabetic() {
            if prev_is_letter {
                title.extend(c.to_lowercase());
            } else {
                title.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            title.push(c);
            prev_is_letter = false;
        }
    }
    title
}

/// Path of `path` relative to `root`, always `/`-separated.
///
/// `None` when `path` is not under `root`. Both paths are compared as given.
#[must_use]
pub fn relative_slash_path(path: &Path, root: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts = rel
        .components()
        .map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

/// Repository-relative `/`-separated path of an existing file.
///
/// Both paths are canonicalized first, so a relative root and an absolute
/// file path (or the reverse) still line up.
pub fn repo_relative_path(path: &Path, root: &Path) -> Result<String> {
    let abs_path = fs::canonicalize(path).map_err(|e| Error::read(path, e))?;
    let abs_root = fs::canonicalize(root).map_err(|e| Error::read(root, e))?;
    relative_slash_path(&abs_path, &abs_root).ok_or_else(|| Error::OutsideRoot {
        path: abs_path,
        root: abs_root,
    })
}

/// Result of a Markdown walk that keeps going past unreadable entries.
#[derive(Debug, Default)]
pub struct MarkdownWalk {
    pub files: Vec<PathBuf>,
    pub errors: Vec<ignore::Error>,
}

/// Recursively collect `.md` files under `root`, sorted by path.
///
/// Every file is visited: `.gitignore`/`.ignore` rules and hidden-file
/// filtering are off. Only `.git` directories are skipped. Entries that
/// cannot be read are collected in `errors` and the walk continues.
/// A missing root yields no files.
#[must_use]
pub fn walk_markdown_files(root: &Path) -> MarkdownWalk {
    let mut walk = MarkdownWalk::default();
    if !root.is_dir() {
        return walk;
    }

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .filter_entry(|entry| entry.file_name() != ".git")
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                walk.errors.push(e);
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) == Some("md") {
            walk.files.push(path.to_path_buf());
        }
    }

    walk
}

/// Like [`walk_markdown_files`], but the first unreadable entry is an error.
pub fn find_markdown_files(root: &Path) -> Result<Vec<PathBuf>> {
    let walk = walk_markdown_files(root);
    if let Some(e) = walk.errors.into_iter().next() {
        return Err(e.into());
    }
    Ok(walk.files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_title() {
        assert_eq!(display_title("getting-started.md"), "Getting Started");
        assert_eq!(display_title("agent_registry.md"), "Agent Registry");
        assert_eq!(display_title("my-API_doc.md"), "My Api Doc");
        assert_eq!(display_title("v2beta-notes.md"), "V2Beta Notes");
        assert_eq!(display_title("README"), "Readme");
    }

    #[test]
    fn test_relative_slash_path() {
        let root = Path::new("/repo");
        let path = Path::new("/repo").join("docs").join("design").join("a.md");
        assert_eq!(
            relative_slash_path(&path, root).as_deref(),
            Some("docs/design/a.md")
        );
    }

    #[test]
    fn test_relative_slash_path_outside_root() {
        let path = Path::new("other/a.md");
        assert_eq!(relative_slash_path(path, Path::new("/repo")), None);
        assert_eq!(
            relative_slash_path(Path::new("/repo/../etc/a.md"), Path::new("/repo")),
            None
        );
    }

    #[test]
    fn test_repo_relative_path_mixed_forms() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("docs")).unwrap();
        fs::create_dir_all(temp.path().join("sub")).unwrap();
        let file = temp.path().join("docs/a.md");
        fs::write(&file, "a").unwrap();

        // Non-canonical root, absolute file path
        let root = temp.path().join("sub").join("..");
        assert_eq!(repo_relative_path(&file, &root).unwrap(), "docs/a.md");
    }

    #[test]
    fn test_repo_relative_path_outside_root() {
        let repo = tempfile::tempdir().unwrap();
        let elsewhere = tempfile::tempdir().unwrap();
        let file = elsewhere.path().join("a.md");
        fs::write(&file, "a").unwrap();

        let err = repo_relative_path(&file, repo.path()).unwrap_err();
        assert!(matches!(err, Error::OutsideRoot { .. }));
    }

    #[test]
    fn test_walk_ignores_ignore_files_but_skips_git_dir() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::create_dir_all(root.join(".github")).unwrap();
        fs::write(root.join(".git/notes.md"), "x").unwrap();
        fs::write(root.join(".github/pr.md"), "x").unwrap();
        fs::write(root.join(".ignore"), "skipped.md\n").unwrap();
        fs::write(root.join("skipped.md"), "x").unwrap();

        let files = find_markdown_files(root).unwrap();
        let names: Vec<String> = files
            .iter()
            .filter_map(|p| relative_slash_path(p, root))
            .collect();
        assert_eq!(names, vec![".github/pr.md", "skipped.md"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_continues_past_unreadable_dir() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        let locked = root.join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("hidden.md"), "x").unwrap();
        fs::write(root.join("z.md"), "z").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can still list the directory; nothing to observe then.
        let still_readable = fs::read_dir(&locked).is_ok();
        let walk = walk_markdown_files(root);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        if still_readable {
            return;
        }

        assert_eq!(walk.errors.len(), 1);
        assert_eq!(walk.files, vec![root.join("z.md")]);
    }

    #[test]
    fn test_find_markdown_files() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("nested/deeper")).unwrap();
        fs::write(root.join("b.md"), "b").unwrap();
        fs::write(root.join("a.md"), "a").unwrap();
        fs::write(root.join("notes.txt"), "x").unwrap();
        fs::write(root.join("nested/deeper/c.md"), "c").unwrap();

        let files = find_markdown_files(root).unwrap();
        let names: Vec<String> = files
            .iter()
            .filter_map(|p| relative_slash_path(p, root))
            .collect();
        assert_eq!(names, vec!["a.md", "b.md", "nested/deeper/c.md"]);
    }

    #[test]
    fn test_find_markdown_files_missing_root() {
        let temp = tempfile::tempdir().unwrap();
        let files = find_markdown_files(&temp.path().join("absent")).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_document_read_and_title() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("Multi_Agent-Patterns.md");
        fs::write(&path, "# Patterns").unwrap();

        let doc = Document::read(&path).unwrap();
        assert_eq!(doc.content, "# Patterns");
        assert_eq!(doc.title(), "Multi Agent Patterns");
        assert_eq!(lowercase_file_name(&doc.path), "multi_agent-patterns.md");
    }

    #[test]
    fn test_document_read_missing() {
        let temp = tempfile::tempdir().unwrap();
        let err = Document::read(&temp.path().join("nope.md")).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }
}
