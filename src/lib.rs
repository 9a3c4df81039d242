//! # doctend — Markdown knowledge-base upkeep
//!
//! Two independent batch jobs for a documentation repository:
//!
//! - **[`button`]** — appends or refreshes a "Discuss this page" GitHub
//!   discussion button at the end of every Markdown page
//! - **[`references`]** — collects outbound links from Markdown files into a
//!   generated `References.md`, appending new links by category or rebuilding
//!   the whole index
//!
//! Supporting modules:
//!
//! - **[`config`]** — JSON configuration with defaults and validation
//! - **[`document`]** — Markdown discovery, display titles, repo-relative paths
//! - **[`links`]** — http(s) link extraction and the URL-keyed [`links::LinkSet`]
//! - **[`error`]** — the crate [`Error`] type

pub mod button;
pub mod config;
pub mod document;
pub mod error;
pub mod links;
pub mod references;

pub use error::{Error, Result};
