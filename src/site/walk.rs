//! Page discovery
//!
//! Uses the ignore crate for traversal so `.gitignore` / `.ignore` rules apply.

use anyhow::{bail, Context, Result};
use ignore::WalkBuilder;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::paths::{has_extension, is_within_root, make_relative, normalize_path, resolve_scope};

/// Traversal switches shared by `mark` and `list`
#[derive(Debug, Clone, Copy)]
pub struct WalkOptions {
    /// Include hidden files/directories
    pub hidden: bool,
    /// Respect .gitignore and other ignore files
    pub ignore: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            hidden: false,
            ignore: true,
        }
    }
}

/// One page file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFile {
    pub path: PathBuf,
    /// Path relative to root, '/' separated
    pub relative: String,
}

/// Collect page files under the scopes (ROOT when empty), sorted by path.
///
/// Directories are walked and filtered by extension; explicit files are
/// taken as-is.
pub fn collect_pages(
    root: &Path,
    scopes: &[PathBuf],
    extensions: &[String],
    options: WalkOptions,
) -> Result<Vec<PageFile>> {
    let default_scope = [root.to_path_buf()];
    let scopes = if scopes.is_empty() {
        &default_scope[..]
    } else {
        scopes
    };

    let mut pages: BTreeMap<String, PathBuf> = BTreeMap::new();

    for scope in scopes {
        let resolved = resolve_scope(root, scope);
        if !resolved.exists() {
            bail!("Scope not found: {}", scope.display());
        }
        if !is_within_root(&resolved, root) {
            bail!("Scope is outside root: {}", scope.display());
        }
        let resolved = resolved
            .canonicalize()
            .with_context(|| format!("Failed to resolve scope: {}", scope.display()))?;

        if resolved.is_file() {
            let relative = relative_to(&resolved, root);
            pages.insert(relative, resolved);
            continue;
        }

        let mut builder = WalkBuilder::new(&resolved);
        builder
            .hidden(!options.hidden)
            .ignore(options.ignore)
            .git_ignore(options.ignore)
            .git_global(options.ignore)
            .git_exclude(options.ignore);

        for entry in builder.build() {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    debug!(error = %err, "skipping walk entry");
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_file() || !has_extension(path, extensions) {
                continue;
            }

            let relative = relative_to(path, root);
            pages.insert(relative, path.to_path_buf());
        }
    }

    Ok(pages
        .into_iter()
        .map(|(relative, path)| PageFile { path, relative })
        .collect())
}

fn relative_to(path: &Path, root: &Path) -> String {
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    make_relative(path, &root).unwrap_or_else(|| normalize_path(path))
}
