//! Source discovery: walk the root tree for `.pro` files.
//!
//! Discovery is deterministic: entries are visited in file-name order and
//! the final list is sorted, so a run over the same tree always parses files
//! in the same order. Ignore patterns are globs matched against paths
//! relative to the root.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use indexmap::IndexMap;
use tracing::debug;
use walkdir::WalkDir;

use crate::core::errors::{ProdocError, Result};

/// Build the ignore matcher from configured glob patterns. An invalid
/// pattern is a configuration error.
pub fn build_ignore_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            ProdocError::config_field(
                format!("invalid ignore pattern '{pattern}': {e}"),
                "ignore_globs",
            )
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| ProdocError::config_field(format!("ignore patterns: {e}"), "ignore_globs"))
}

/// Walk `root` and return every `.pro` file not matched by an ignore
/// pattern, sorted by path.
pub fn discover_sources(root: &Path, ignore_globs: &[String]) -> Result<Vec<PathBuf>> {
    let ignore = build_ignore_set(ignore_globs)?;

    let mut found = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            ProdocError::io(format!("walk failed under {}", root.display()), e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !has_pro_extension(path) {
            continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(path);
        if ignore.is_match(relative) {
            debug!(path = %relative.display(), "ignored");
            continue;
        }
        found.push(path.to_path_buf());
    }
    found.sort();
    Ok(found)
}

/// Group discovered files by their directory relative to the root, in
/// first-seen order. The root directory itself groups under `"."`.
pub fn group_by_directory(root: &Path, files: &[PathBuf]) -> IndexMap<String, Vec<PathBuf>> {
    let mut groups: IndexMap<String, Vec<PathBuf>> = IndexMap::new();
    for file in files {
        let directory = file
            .parent()
            .map(|parent| {
                let relative = parent.strip_prefix(root).unwrap_or(parent);
                if relative.as_os_str().is_empty() {
                    ".".to_string()
                } else {
                    relative.to_string_lossy().into_owned()
                }
            })
            .unwrap_or_else(|| ".".to_string());
        groups.entry(directory).or_default().push(file.clone());
    }
    groups
}

fn has_pro_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pro"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "end\n").unwrap();
    }

    #[test]
    fn test_discovers_only_pro_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("mg_plot.pro"));
        touch(&root.join("README.txt"));
        touch(&root.join("vis/mg_image.PRO"));

        let files = discover_sources(root, &[]).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["mg_plot.pro", "vis/mg_image.PRO"]);
    }

    #[test]
    fn test_ignore_globs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("mg_plot.pro"));
        touch(&root.join("attic/mg_old.pro"));

        let files = discover_sources(root, &["attic/**".to_string()]).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("mg_plot.pro"));
    }

    #[test]
    fn test_invalid_ignore_pattern_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = discover_sources(dir.path(), &["[".to_string()]);
        assert!(matches!(
            result,
            Err(ProdocError::Config { field: Some(f), .. }) if f == "ignore_globs"
        ));
    }

    #[test]
    fn test_grouping_by_directory() {
        let root = Path::new("/lib");
        let files = vec![
            PathBuf::from("/lib/mg_plot.pro"),
            PathBuf::from("/lib/vis/mg_image.pro"),
            PathBuf::from("/lib/vis/mg_contour.pro"),
        ];
        let groups = group_by_directory(root, &files);
        assert_eq!(groups["."].len(), 1);
        assert_eq!(groups["vis"].len(), 2);
    }
}
