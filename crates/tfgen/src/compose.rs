// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Composition logic for merging a layer chain into one effective configuration.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::{
    ConfigLayer, Dependencies, Diagnostics, NameRewrite, TFGEN_DIRNAME, TFGEN_FILENAME,
};

#[cfg(test)]
#[path = "./compose_test.rs"]
mod compose_test;

/// The fully merged configuration used to drive rendering.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct EffectiveConfig {
    /// Directory resolution was requested for.
    pub target_dir: PathBuf,

    /// Directory of the root layer.
    pub root_dir: PathBuf,

    /// User variables merged per key, plus computed ones once the context is built.
    pub variables: BTreeMap<String, String>,

    /// Template name to body, merged per key.
    pub template_files: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_name_rewrite: Option<NameRewrite>,

    pub deps: Dependencies,

    /// Taken from the root layer only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clean_pattern: Option<String>,

    /// Taken from the root layer only.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub target_directories: Vec<String>,

    /// Control documents that contributed, root first.
    pub source_files: Vec<PathBuf>,
}

/// A template and the file name it is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub template: String,
    pub output: String,
}

impl EffectiveConfig {
    /// Output names for every template, after applying the name rewrite.
    ///
    /// Fails if a rewritten name is not a plain file name, names a control
    /// document, or if two templates would be written to the same file.
    pub fn generated_files(&self) -> crate::Result<Vec<GeneratedFile>> {
        Ok(self
            .templates()?
            .into_iter()
            .map(|(file, _)| file)
            .collect())
    }

    /// Every generated file paired with its template body, sorted by output name.
    pub(crate) fn templates(&self) -> crate::Result<Vec<(GeneratedFile, &str)>> {
        let rewrite = self
            .template_name_rewrite
            .as_ref()
            .map(NameRewrite::compile)
            .transpose()?;

        let mut by_output: BTreeMap<String, Vec<(String, &str)>> = BTreeMap::new();
        for (template, body) in &self.template_files {
            let output = match &rewrite {
                Some(r) => r.apply(template),
                None => template.clone(),
            };
            if !is_plain_file_name(&output) || is_reserved_name(&output) {
                return Err(crate::Error::InvalidTemplateName(output));
            }
            by_output
                .entry(output)
                .or_default()
                .push((template.clone(), body.as_str()));
        }

        let mut files = Vec::with_capacity(by_output.len());
        for (output, mut templates) in by_output {
            if templates.len() > 1 {
                return Err(crate::Error::DuplicateOutput {
                    name: output,
                    templates: templates.into_iter().map(|(name, _)| name).collect(),
                });
            }
            if let Some((template, body)) = templates.pop() {
                files.push((GeneratedFile { template, output }, body));
            }
        }
        Ok(files)
    }
}

fn is_plain_file_name(name: &str) -> bool {
    if name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Control documents are never generated.
fn is_reserved_name(name: &str) -> bool {
    name == TFGEN_FILENAME || name == TFGEN_DIRNAME
}

/// Merge a chain of layers, ordered closest first and root last.
///
/// The root layer seeds the result and the remaining layers are applied from
/// the most general to the closest, so the closest layer wins conflicts.
/// The input layers are never modified.
pub fn merge<P: AsRef<Path>>(
    chain: &[ConfigLayer],
    target_dir: P,
    diag: &mut Diagnostics,
) -> crate::Result<EffectiveConfig> {
    let Some((root, rest)) = chain.split_last() else {
        return Err(crate::Error::InvalidChain("no layers to merge".to_string()));
    };
    if !root.is_root() {
        return Err(crate::Error::InvalidChain(format!(
            "last layer {} is not a root layer",
            root.control_file().display()
        )));
    }
    if let Some(extra) = rest.iter().find(|l| l.is_root()) {
        return Err(crate::Error::InvalidChain(format!(
            "{} is a root layer but is not the last in the chain",
            extra.control_file().display()
        )));
    }

    let doc = &root.document;
    let mut merged = EffectiveConfig {
        target_dir: target_dir.as_ref().to_path_buf(),
        root_dir: root.directory.clone(),
        variables: doc.vars.clone(),
        template_files: doc.template_files.clone(),
        template_name_rewrite: doc.template_name_rewrite.clone(),
        deps: doc.deps.clone().unwrap_or_default(),
        clean_pattern: doc.clean_pattern.clone().filter(|p| !p.is_empty()),
        target_directories: doc.target_directories.clone(),
        source_files: vec![root.control_file()],
    };

    for layer in rest.iter().rev() {
        apply_layer(&mut merged, layer, diag);
    }

    diag.debug(
        "tfgen::merged",
        format!(
            "merged {} layer(s): {} variable(s), {} template(s)",
            chain.len(),
            merged.variables.len(),
            merged.template_files.len()
        ),
    );
    Ok(merged)
}

/// Fold one non-root layer into the accumulator.
fn apply_layer(merged: &mut EffectiveConfig, layer: &ConfigLayer, diag: &mut Diagnostics) {
    let doc = &layer.document;
    let source = layer.control_file();

    for (k, v) in &doc.vars {
        tracing::trace!(key = %k, value = %v, "setting variable");
        merged.variables.insert(k.clone(), v.clone());
    }
    for (k, v) in &doc.template_files {
        tracing::trace!(template = %k, "adding template file");
        merged.template_files.insert(k.clone(), v.clone());
    }
    if let Some(rewrite) = &doc.template_name_rewrite {
        merged.template_name_rewrite = Some(rewrite.clone());
    }

    if doc.clean_pattern.as_ref().is_some_and(|p| !p.is_empty()) {
        diag.warn(
            "tfgen::root_only_field",
            format!(
                "clean_pattern in {} is ignored; it is only read from the root layer",
                source.display()
            ),
        );
    }
    if !doc.target_directories.is_empty() {
        diag.warn(
            "tfgen::root_only_field",
            format!(
                "target_directories in {} is ignored; it is only read from the root layer",
                source.display()
            ),
        );
    }

    if let Some(deps) = &doc.deps {
        merge_deps(&mut merged.deps, deps);
    }

    merged.source_files.push(source);
}

fn merge_deps(merged: &mut Dependencies, deps: &Dependencies) {
    if !deps.terraform_version.is_empty() {
        merged.terraform_version = deps.terraform_version.clone();
    }
    for (k, v) in &deps.required_providers {
        merged.required_providers.insert(k.clone(), v.clone());
    }
    for (k, v) in &deps.modules {
        merged.modules.insert(k.clone(), v.clone());
    }

    // Default lists are owned by the closest layer that declares one
    if !deps.default_providers.is_empty() {
        merged.default_providers = deps.default_providers.clone();
    }
    if !deps.default_remote_states.is_empty() {
        merged.default_remote_states = deps.default_remote_states.clone();
    }

    // Extra lists accumulate across every level
    merged
        .extra_providers
        .extend(deps.extra_providers.iter().cloned());
    merged
        .extra_remote_states
        .extend(deps.extra_remote_states.iter().cloned());
}
