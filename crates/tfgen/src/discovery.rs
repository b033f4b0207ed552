// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Discovery algorithm for locating .tfgen.yaml markers and building the
//! chain of layers from a target directory up to its root layer.

use std::path::{Path, PathBuf};

use crate::{ConfigLayer, Diagnostics, MAX_DEPTH, TFGEN_DIRNAME, TFGEN_FILENAME};

#[cfg(test)]
#[path = "./discovery_test.rs"]
mod discovery_test;

/// Options for discovery behavior.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Maximum number of directories examined while ascending, across the
    /// whole chain.
    pub max_depth: usize,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
        }
    }
}

/// A located configuration marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    /// Path of a standalone `.tfgen.yaml`.
    File(PathBuf),
    /// Path of a `.tfgen.d` directory known to contain a `.tfgen.yaml`.
    Directory(PathBuf),
}

impl Marker {
    /// Directory the marker was found in.
    pub fn layer_dir(&self) -> &Path {
        let path = match self {
            Self::File(p) | Self::Directory(p) => p,
        };
        path.parent().unwrap_or(path)
    }

    /// Path of the control document for this marker.
    pub fn control_file(&self) -> PathBuf {
        match self {
            Self::File(p) => p.clone(),
            Self::Directory(p) => p.join(TFGEN_FILENAME),
        }
    }
}

/// Inspect a single directory for a marker.
fn marker_in(dir: &Path) -> crate::Result<Option<Marker>> {
    let file = dir.join(TFGEN_FILENAME);
    let control_dir = dir.join(TFGEN_DIRNAME);

    match (file.is_file(), control_dir.is_dir()) {
        (true, true) => Err(crate::Error::AmbiguousConfig(dir.to_path_buf())),
        (true, false) => Ok(Some(Marker::File(file))),
        (false, true) => {
            if control_dir.join(TFGEN_FILENAME).is_file() {
                Ok(Some(Marker::Directory(control_dir)))
            } else {
                Err(crate::Error::IncompleteConfig(control_dir))
            }
        }
        (false, false) => Ok(None),
    }
}

/// Walk upward from `start_dir` to the nearest marker.
///
/// At most `max_depth` directories are examined, `start_dir` included.
/// Returns the marker and the number of directories examined.
fn locate_within(start_dir: &Path, max_depth: usize) -> crate::Result<Option<(Marker, usize)>> {
    let mut current = Some(start_dir);
    let mut examined = 0;

    while let Some(dir) = current {
        if examined >= max_depth {
            break;
        }
        examined += 1;
        tracing::trace!(dir = %dir.display(), "checking for configuration marker");
        if let Some(marker) = marker_in(dir)? {
            return Ok(Some((marker, examined)));
        }
        current = dir.parent();
    }

    Ok(None)
}

/// Find the nearest configuration marker at or above `start_dir`.
pub fn locate<P: AsRef<Path>>(start_dir: P, max_depth: usize) -> crate::Result<Marker> {
    let start = start_dir.as_ref();
    match locate_within(start, max_depth)? {
        Some((marker, _)) => Ok(marker),
        None => Err(crate::Error::NotFoundInTree {
            start: start.to_path_buf(),
            depth: max_depth,
        }),
    }
}

/// Collect the layers from `target_dir` up to and including the root layer.
///
/// Returns layers ordered from the closest to the target to the root.
pub fn build_chain<P: AsRef<Path>>(
    target_dir: P,
    options: &DiscoveryOptions,
    diag: &mut Diagnostics,
) -> crate::Result<Vec<ConfigLayer>> {
    let target = target_dir.as_ref();
    let mut chain: Vec<ConfigLayer> = Vec::new();
    let mut remaining = options.max_depth;
    let mut current = Some(target.to_path_buf());

    let root_not_found = |chain: &[ConfigLayer]| crate::Error::RootNotFound {
        start: target.to_path_buf(),
        depth: options.max_depth,
        layers: chain.iter().map(ConfigLayer::control_file).collect(),
    };

    while let Some(dir) = current {
        let Some((marker, examined)) = locate_within(&dir, remaining)? else {
            break;
        };

        let layer = ConfigLayer::load(&marker, diag)?;
        let is_root = layer.is_root();
        remaining -= examined;
        current = layer.directory.parent().map(Path::to_path_buf);
        chain.push(layer);

        if is_root {
            diag.debug(
                "tfgen::chain_built",
                format!(
                    "found {} layer(s) between {} and its root",
                    chain.len(),
                    target.display()
                ),
            );
            return Ok(chain);
        }
    }

    if chain.is_empty() {
        return Err(crate::Error::NotFoundInTree {
            start: target.to_path_buf(),
            depth: options.max_depth,
        });
    }
    Err(root_not_found(&chain))
}
