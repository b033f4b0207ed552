// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Removal of generated files, either exactly by name or by glob pattern.
//!
//! Cleanup is not transactional: every file is attempted, the ones that
//! could be removed stay removed, and the rest are reported together.

use std::path::{Path, PathBuf};

use glob::MatchOptions;

use crate::{CleanFailure, Diagnostics, EffectiveConfig, TFGEN_DIRNAME, TFGEN_FILENAME};

#[cfg(test)]
#[path = "./cleanup_test.rs"]
mod cleanup_test;

/// Absolute paths of the files a render of `config` produces.
pub fn generated_paths(config: &EffectiveConfig) -> crate::Result<Vec<PathBuf>> {
    Ok(config
        .generated_files()?
        .into_iter()
        .map(|f| config.target_dir.join(f.output))
        .collect())
}

/// Remove exactly the files generated for `config`.
///
/// A generated file that does not exist is a failure.
pub fn clean_generated(
    config: &EffectiveConfig,
    diag: &mut Diagnostics,
) -> crate::Result<Vec<PathBuf>> {
    let paths = generated_paths(config)?;
    remove_files(&paths, diag)
}

/// Remove every path in `paths`, reporting all that could not be removed.
pub fn remove_files(paths: &[PathBuf], diag: &mut Diagnostics) -> crate::Result<Vec<PathBuf>> {
    let mut removed = Vec::with_capacity(paths.len());
    let mut failures = Vec::new();

    for path in paths {
        match std::fs::remove_file(path) {
            Ok(()) => {
                diag.info("tfgen::file_removed", format!("deleted {}", path.display()));
                removed.push(path.clone());
            }
            Err(err) => {
                let reason = if err.kind() == std::io::ErrorKind::NotFound {
                    "file does not exist".to_string()
                } else {
                    err.to_string()
                };
                diag.warn(
                    "tfgen::clean_failed",
                    format!("could not delete {}: {reason}", path.display()),
                );
                failures.push(CleanFailure {
                    path: path.clone(),
                    reason,
                });
            }
        }
    }

    if failures.is_empty() {
        Ok(removed)
    } else {
        Err(crate::Error::CleanFailed { removed, failures })
    }
}

/// Remove every regular file under `dir` matching the glob `pattern`.
///
/// The pattern is relative to `dir` and may use `**`. Hidden files only
/// match a pattern that names the leading dot, and control documents are
/// never removed.
pub fn clean_pattern(
    dir: &Path,
    pattern: &str,
    diag: &mut Diagnostics,
) -> crate::Result<Vec<PathBuf>> {
    let full = format!(
        "{}/{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        pattern.trim_start_matches('/')
    );
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };
    let entries =
        glob::glob_with(&full, options).map_err(|e| crate::Error::InvalidCleanPattern {
            pattern: pattern.to_string(),
            error: e,
        })?;

    let mut matches = Vec::new();
    let mut failures = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() && !is_control_file(&path) => matches.push(path),
            Ok(_) => {}
            Err(err) => failures.push(CleanFailure {
                path: err.path().to_path_buf(),
                reason: err.error().to_string(),
            }),
        }
    }

    diag.debug(
        "tfgen::pattern_matched",
        format!(
            "'{pattern}' matched {} file(s) in {}",
            matches.len(),
            dir.display()
        ),
    );

    let removed = match remove_files(&matches, diag) {
        Ok(removed) => removed,
        Err(crate::Error::CleanFailed {
            removed,
            failures: more,
        }) => {
            failures.extend(more);
            removed
        }
        Err(err) => return Err(err),
    };

    if failures.is_empty() {
        Ok(removed)
    } else {
        Err(crate::Error::CleanFailed { removed, failures })
    }
}

fn is_control_file(path: &Path) -> bool {
    path.file_name().is_some_and(|n| n == TFGEN_FILENAME)
        || path
            .components()
            .any(|c| c.as_os_str() == TFGEN_DIRNAME)
}
