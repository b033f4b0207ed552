// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end operations driving discovery, merging, rendering and cleanup.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{
    build_chain, build_context, clean_generated, clean_pattern, merge, render, CleanFailure,
    ConfigLayer, Diagnostics, DiscoveryOptions, EffectiveConfig, RenderReport, TFGEN_DIRNAME,
};

#[cfg(test)]
#[path = "./workflow_test.rs"]
mod workflow_test;

/// A resolved target: the layer chain and the effective configuration built from it.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// Layers from the closest to the root.
    pub chain: Vec<ConfigLayer>,
    pub config: EffectiveConfig,
}

impl Resolved {
    pub fn root(&self) -> Option<&ConfigLayer> {
        self.chain.last()
    }
}

/// Check that `path` is an existing directory and return its canonical form.
fn target_directory(path: &Path) -> crate::Result<PathBuf> {
    if !path.is_dir() {
        return Err(crate::Error::NotADirectory(path.to_path_buf()));
    }
    dunce::canonicalize(path).map_err(|e| crate::Error::ReadFailed {
        path: path.to_path_buf(),
        error: e,
    })
}

/// Locate, load, merge and contextualize the configuration for `target`.
pub fn resolve<P: AsRef<Path>>(
    target: P,
    options: &DiscoveryOptions,
    diag: &mut Diagnostics,
) -> crate::Result<Resolved> {
    let target = target_directory(target.as_ref())?;
    let chain = build_chain(&target, options, diag)?;
    let config = merge(&chain, &target, diag)?;
    let config = build_context(config, diag);
    Ok(Resolved { chain, config })
}

/// Generate every template into `target`.
pub fn exec<P: AsRef<Path>>(
    target: P,
    options: &DiscoveryOptions,
    diag: &mut Diagnostics,
) -> crate::Result<RenderReport> {
    let resolved = resolve(target, options, diag)?;
    diag.info(
        "tfgen::exec",
        format!("generating files in {}", resolved.config.target_dir.display()),
    );
    render(&resolved.config, diag)
}

/// Run [`exec`] in every directory under `target` that contains a `.tf` file.
///
/// `.git` and `.tfgen.d` directories are skipped. Stops at the first
/// directory that fails.
pub fn exec_recursive<P: AsRef<Path>>(
    target: P,
    options: &DiscoveryOptions,
    diag: &mut Diagnostics,
) -> crate::Result<Vec<RenderReport>> {
    let root = target_directory(target.as_ref())?;

    let mut dirs = BTreeSet::new();
    let walker = WalkDir::new(&root).into_iter().filter_entry(|e| {
        !(e.file_type().is_dir() && (e.file_name() == ".git" || e.file_name() == TFGEN_DIRNAME))
    });
    for entry in walker {
        let entry = entry.map_err(|e| crate::Error::ReadFailed {
            path: e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone()),
            error: e.into(),
        })?;
        let is_tf = entry.path().extension().is_some_and(|ext| ext == "tf");
        if entry.file_type().is_file() && is_tf {
            if let Some(parent) = entry.path().parent() {
                dirs.insert(parent.to_path_buf());
            }
        }
    }

    diag.info(
        "tfgen::exec_recursive",
        format!(
            "found {} directory(ies) with .tf files under {}",
            dirs.len(),
            root.display()
        ),
    );

    let mut reports = Vec::with_capacity(dirs.len());
    for dir in dirs {
        match exec(&dir, options, diag) {
            Ok(report) => reports.push(report),
            Err(err) => {
                diag.warn(
                    "tfgen::exec_failed",
                    format!("could not execute inside {}", dir.display()),
                );
                return Err(err);
            }
        }
    }
    Ok(reports)
}

/// Run [`exec`] in each `target_directories` entry of the root layer.
///
/// Entries are relative to `target`.
pub fn exec_all<P: AsRef<Path>>(
    target: P,
    options: &DiscoveryOptions,
    diag: &mut Diagnostics,
) -> crate::Result<Vec<RenderReport>> {
    let resolved = resolve(target, options, diag)?;
    let config = &resolved.config;
    if config.target_directories.is_empty() {
        let root = resolved
            .root()
            .map(ConfigLayer::control_file)
            .unwrap_or_else(|| config.root_dir.clone());
        return Err(crate::Error::NoTargetDirectories(root));
    }

    let mut reports = Vec::with_capacity(config.target_directories.len());
    for child in &config.target_directories {
        let dir = config.target_dir.join(child);
        diag.info(
            "tfgen::exec_all",
            format!("creating the files inside {}", dir.display()),
        );
        reports.push(exec(&dir, options, diag)?);
    }
    Ok(reports)
}

/// Remove exactly the files `exec` generates in `target`.
pub fn clean<P: AsRef<Path>>(
    target: P,
    options: &DiscoveryOptions,
    diag: &mut Diagnostics,
) -> crate::Result<Vec<PathBuf>> {
    let resolved = resolve(target, options, diag)?;
    clean_generated(&resolved.config, diag)
}

/// Remove every file matching the root layer's `clean_pattern`.
///
/// Applies to each `target_directories` entry of the root layer, or to
/// `target` itself when the root declares none. Every directory is
/// attempted, a missing one included; failures are reported together with
/// the files that were removed.
pub fn clean_all<P: AsRef<Path>>(
    target: P,
    options: &DiscoveryOptions,
    diag: &mut Diagnostics,
) -> crate::Result<Vec<PathBuf>> {
    let resolved = resolve(target, options, diag)?;
    let config = &resolved.config;
    let Some(pattern) = config.clean_pattern.as_deref() else {
        let root = resolved
            .root()
            .map(ConfigLayer::control_file)
            .unwrap_or_else(|| config.root_dir.clone());
        return Err(crate::Error::NoCleanPattern(root));
    };

    let dirs: Vec<PathBuf> = if config.target_directories.is_empty() {
        vec![config.target_dir.clone()]
    } else {
        config
            .target_directories
            .iter()
            .map(|child| config.target_dir.join(child))
            .collect()
    };

    let mut removed = Vec::new();
    let mut failures = Vec::new();
    for dir in dirs {
        if !dir.is_dir() {
            diag.warn(
                "tfgen::clean_failed",
                format!("{} is not a directory", dir.display()),
            );
            failures.push(CleanFailure {
                path: dir,
                reason: "not a directory".to_string(),
            });
            continue;
        }
        match clean_pattern(&dir, pattern, diag) {
            Ok(paths) => removed.extend(paths),
            Err(crate::Error::CleanFailed {
                removed: paths,
                failures: more,
            }) => {
                removed.extend(paths);
                failures.extend(more);
            }
            Err(err) => return Err(err),
        }
    }

    if !failures.is_empty() {
        return Err(crate::Error::CleanFailed { removed, failures });
    }
    diag.info(
        "tfgen::clean_all",
        format!(
            "removed {} file(s) matching '{pattern}' under {}",
            removed.len(),
            config.target_dir.display()
        ),
    );
    Ok(removed)
}
