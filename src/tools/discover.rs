//! discover_files tool - recursive pattern search under a directory
//!
//! Walks the requested directory depth-first with lexicographically sorted
//! children, so two invocations against an unchanged tree return the same
//! sequence. Entries the walk cannot read are skipped and reported as
//! warnings rather than failing the whole call; symlinks are followed, and
//! cycles are cut at the point of revisit.

use async_trait::async_trait;
use glob::{MatchOptions, Pattern};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::Path;
use walkdir::WalkDir;

use super::{Arguments, ParamKind, ParamSpec, Tool};
use crate::error::{BridgeError, Result};

/// `*` stays within one path segment; `**` is exempt and spans segments.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// One matched file or directory
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMatch {
    /// Path relative to the requested directory
    pub path: String,
    pub is_directory: bool,
    /// Size in bytes; files only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

pub struct DiscoverFilesTool;

#[async_trait]
impl Tool for DiscoverFilesTool {
    fn name(&self) -> &'static str {
        "discover_files"
    }

    fn description(&self) -> &'static str {
        "Find files in a directory matching a pattern"
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required("directory", ParamKind::String, "Directory to search in"),
            ParamSpec::required(
                "pattern",
                ParamKind::String,
                "File pattern to match (e.g. '*.md', '*.py')",
            ),
        ]
    }

    async fn execute(&self, args: &Arguments) -> Result<Value> {
        let directory = args
            .get("directory")
            .and_then(Value::as_str)
            .ok_or_else(|| BridgeError::InvalidArgument("directory is required".to_string()))?;
        let pattern_str = args
            .get("pattern")
            .and_then(Value::as_str)
            .ok_or_else(|| BridgeError::InvalidArgument("pattern is required".to_string()))?;

        let root = Path::new(directory);
        check_search_root(root, directory)?;

        let pattern = Pattern::new(pattern_str).map_err(|e| {
            BridgeError::InvalidArgument(format!("malformed pattern '{}': {}", pattern_str, e))
        })?;
        // A separator in the pattern means it targets relative paths;
        // otherwise it matches base names at any depth.
        let match_full_path = pattern_str.contains('/');

        let mut matches = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(root)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warnings.push(walk_warning(&e));
                    continue;
                }
            };

            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let candidate = if match_full_path {
                relative.to_string_lossy().to_string()
            } else {
                entry.file_name().to_string_lossy().to_string()
            };
            if !pattern.matches_with(&candidate, MATCH_OPTIONS) {
                continue;
            }

            let is_directory = entry.file_type().is_dir();
            let size = if is_directory {
                None
            } else {
                match entry.metadata() {
                    Ok(meta) => Some(meta.len()),
                    Err(e) => {
                        warnings.push(format!("could not stat '{}': {}", relative.display(), e));
                        None
                    }
                }
            };

            matches.push(FileMatch {
                path: relative.to_string_lossy().to_string(),
                is_directory,
                size,
            });
        }

        Ok(json!({
            "matches": matches,
            "count": matches.len(),
            "warnings": warnings
        }))
    }
}

/// Reject roots that do not exist, are not directories, or cannot be listed.
/// Distinguishes the permission case so the caller learns what to fix.
fn check_search_root(root: &Path, directory: &str) -> Result<()> {
    let meta = match std::fs::metadata(root) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(BridgeError::InvalidArgument(format!(
                "directory '{}' does not exist",
                directory
            )));
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(BridgeError::InvalidArgument(format!(
                "directory '{}' is not readable: permission denied",
                directory
            )));
        }
        Err(e) => {
            return Err(BridgeError::InvalidArgument(format!(
                "cannot access directory '{}': {}",
                directory, e
            )));
        }
    };

    if !meta.is_dir() {
        return Err(BridgeError::InvalidArgument(format!(
            "'{}' is not a directory",
            directory
        )));
    }

    if let Err(e) = std::fs::read_dir(root) {
        return Err(BridgeError::InvalidArgument(format!(
            "directory '{}' is not readable: {}",
            directory, e
        )));
    }

    Ok(())
}

fn walk_warning(err: &walkdir::Error) -> String {
    if let Some(ancestor) = err.loop_ancestor() {
        return format!("skipped symlink cycle back into '{}'", ancestor.display());
    }
    format!("skipped entry: {}", err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::collections::HashSet;
    use tempfile::tempdir;

    fn args(value: Value) -> Arguments {
        value.as_object().cloned().unwrap_or_default()
    }

    async fn discover(directory: &str, pattern: &str) -> Result<Value> {
        DiscoverFilesTool
            .execute(&args(json!({"directory": directory, "pattern": pattern})))
            .await
    }

    fn matched_paths(payload: &Value) -> HashSet<String> {
        payload["matches"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["path"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_base_name_pattern_matches_at_any_depth() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), "# a").unwrap();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/c.md"), "# c").unwrap();

        let payload = discover(dir.path().to_str().unwrap(), "*.md").await.unwrap();

        let expected: HashSet<String> = ["a.md", "sub/c.md"].iter().map(|s| s.to_string()).collect();
        assert_eq!(matched_paths(&payload), expected);
        assert_eq!(payload["count"], 2);
    }

    #[tokio::test]
    async fn test_listing_is_deterministic() {
        let dir = tempdir().unwrap();
        for name in ["zebra.md", "apple.md", "mango.md"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }

        let first = discover(dir.path().to_str().unwrap(), "*.md").await.unwrap();
        let second = discover(dir.path().to_str().unwrap(), "*.md").await.unwrap();
        assert_eq!(first["matches"], second["matches"]);

        let order: Vec<&str> = first["matches"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["path"].as_str().unwrap())
            .collect();
        assert_eq!(order, vec!["apple.md", "mango.md", "zebra.md"]);
    }

    #[tokio::test]
    async fn test_no_matches_is_success_with_empty_list() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("only.txt"), "x").unwrap();

        let payload = discover(dir.path().to_str().unwrap(), "*.rs").await.unwrap();
        assert_eq!(payload["count"], 0);
        assert!(payload["matches"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_directories_match_without_size() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("subdir")).unwrap();
        std::fs::write(dir.path().join("subfile"), "abc").unwrap();

        let payload = discover(dir.path().to_str().unwrap(), "sub*").await.unwrap();
        let matches = payload["matches"].as_array().unwrap();
        assert_eq!(matches.len(), 2);

        for m in matches {
            if m["isDirectory"].as_bool().unwrap() {
                assert!(m.get("size").is_none());
            } else {
                assert_eq!(m["size"], 3);
            }
        }
    }

    #[tokio::test]
    async fn test_path_pattern_scopes_to_subdirectory() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("top.md"), "x").unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/deep.md"), "x").unwrap();

        let payload = discover(dir.path().to_str().unwrap(), "docs/*.md").await.unwrap();

        let expected: HashSet<String> = ["docs/deep.md"].iter().map(|s| s.to_string()).collect();
        assert_eq!(matched_paths(&payload), expected);
    }

    #[tokio::test]
    async fn test_star_stays_within_one_path_segment() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/top.md"), "x").unwrap();
        std::fs::create_dir(dir.path().join("docs/sub")).unwrap();
        std::fs::write(dir.path().join("docs/sub/deep.md"), "x").unwrap();

        let payload = discover(dir.path().to_str().unwrap(), "docs/*.md").await.unwrap();

        // deep.md sits one segment further down, so `*` must not reach it
        let expected: HashSet<String> = ["docs/top.md"].iter().map(|s| s.to_string()).collect();
        assert_eq!(matched_paths(&payload), expected);
    }

    #[tokio::test]
    async fn test_recursive_wildcard_spans_segments() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/top.md"), "x").unwrap();
        std::fs::create_dir(dir.path().join("docs/sub")).unwrap();
        std::fs::write(dir.path().join("docs/sub/deep.md"), "x").unwrap();
        std::fs::write(dir.path().join("other.md"), "x").unwrap();

        let payload = discover(dir.path().to_str().unwrap(), "docs/**").await.unwrap();

        let paths = matched_paths(&payload);
        assert!(paths.contains("docs/top.md"));
        assert!(paths.contains("docs/sub/deep.md"));
        assert!(!paths.contains("other.md"));
    }

    #[tokio::test]
    async fn test_missing_directory_is_invalid_argument() {
        let err = discover("/definitely/not/here", "*.md").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn test_file_as_directory_is_invalid_argument() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, "x").unwrap();

        let err = discover(file.to_str().unwrap(), "*").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("not a directory"));
    }

    #[tokio::test]
    async fn test_malformed_pattern_is_invalid_argument() {
        let dir = tempdir().unwrap();
        let err = discover(dir.path().to_str().unwrap(), "[").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("malformed pattern"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_cycle_terminates_with_warning() {
        let dir = tempdir().unwrap();
        let nest = dir.path().join("nest");
        std::fs::create_dir(&nest).unwrap();
        std::fs::write(nest.join("inner.md"), "x").unwrap();
        std::os::unix::fs::symlink(dir.path(), nest.join("loop")).unwrap();

        let payload = discover(dir.path().to_str().unwrap(), "*.md").await.unwrap();

        // The walk must finish, find the real file once per reachable
        // prefix, and report the cut cycle.
        assert!(payload["count"].as_u64().unwrap() >= 1);
        let warnings = payload["warnings"].as_array().unwrap();
        assert!(warnings.iter().any(|w| {
            w.as_str().unwrap().contains("symlink cycle")
        }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinked_file_reports_target_size() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("real.md"), "12345").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.md"), dir.path().join("alias.md")).unwrap();

        let payload = discover(dir.path().to_str().unwrap(), "alias.md").await.unwrap();
        let matches = payload["matches"].as_array().unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0]["size"], 5);
        assert!(!matches[0]["isDirectory"].as_bool().unwrap());
    }
}
