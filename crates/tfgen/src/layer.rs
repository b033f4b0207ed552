// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Loading a located marker into a typed configuration layer.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::discovery::Marker;
use crate::{ControlDocument, Diagnostics, TFGEN_FILENAME};

#[cfg(test)]
#[path = "./layer_test.rs"]
mod layer_test;

/// Where a layer's configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerSource {
    /// A standalone `.tfgen.yaml`.
    File { control_file: PathBuf },
    /// A `.tfgen.d/` directory; `templates` lists the scanned template files.
    Directory {
        control_dir: PathBuf,
        templates: Vec<String>,
    },
}

/// One configuration source discovered at one directory level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    /// Absolute directory the layer was discovered in.
    pub directory: PathBuf,
    pub source: LayerSource,
    /// Parsed control document. For directory layers its `template_files`
    /// already include the scanned files.
    pub document: ControlDocument,
}

impl ConfigLayer {
    /// Load the layer a marker points at.
    pub fn load(marker: &Marker, diag: &mut Diagnostics) -> crate::Result<Self> {
        let control_file = marker.control_file();
        let mut document = ControlDocument::load(&control_file)?;

        let source = match marker {
            Marker::File(path) => LayerSource::File {
                control_file: path.clone(),
            },
            Marker::Directory(control_dir) => {
                let scanned = scan_templates(control_dir)?;
                let templates = scanned.keys().cloned().collect();
                for (name, body) in scanned {
                    if document.template_files.insert(name.clone(), body).is_some() {
                        diag.warn(
                            "tfgen::template_shadowed",
                            format!(
                                "{name} in {} replaces the inline template of the same name",
                                control_dir.display()
                            ),
                        );
                    }
                }
                LayerSource::Directory {
                    control_dir: control_dir.clone(),
                    templates,
                }
            }
        };

        diag.info(
            "tfgen::layer_loaded",
            format!(
                "loaded {}layer from {}",
                if document.root_file { "root " } else { "" },
                control_file.display()
            ),
        );

        Ok(Self {
            directory: marker.layer_dir().to_path_buf(),
            source,
            document,
        })
    }

    pub fn is_root(&self) -> bool {
        self.document.root_file
    }

    /// Path of the control document backing this layer.
    pub fn control_file(&self) -> PathBuf {
        match &self.source {
            LayerSource::File { control_file } => control_file.clone(),
            LayerSource::Directory { control_dir, .. } => control_dir.join(TFGEN_FILENAME),
        }
    }

    pub fn variables(&self) -> &BTreeMap<String, String> {
        &self.document.vars
    }

    pub fn template_files(&self) -> &BTreeMap<String, String> {
        &self.document.template_files
    }
}

/// Read every regular file in a control directory except the control document.
fn scan_templates(control_dir: &Path) -> crate::Result<BTreeMap<String, String>> {
    let read_failed = |path: &Path, error: std::io::Error| crate::Error::ReadFailed {
        path: path.to_path_buf(),
        error,
    };

    let mut templates = BTreeMap::new();
    let entries = std::fs::read_dir(control_dir).map_err(|e| read_failed(control_dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| read_failed(control_dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name == TFGEN_FILENAME {
            continue;
        }
        tracing::debug!(path = %path.display(), "reading template file");
        let body = std::fs::read_to_string(&path).map_err(|e| read_failed(&path, e))?;
        templates.insert(name.to_string(), body);
    }
    Ok(templates)
}
