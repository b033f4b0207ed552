// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;
use crate::{STATE_KEY_VAR, TFGEN_FILENAME};

const ROOT_CONFIG: &str = r#"
root_file: true
vars:
  company: acme
  env: default
template_files:
  backend.tf: |
    key = "{{ company }}/{{ tfgen_state_key }}/terraform.tfstate"
  locals.tf: |
    env = "{{ env }}"
"#;

/// A tree with a root layer at `infra/` and a child layer at `infra/env/prod`.
struct Tree {
    _tmp: TempDir,
    root: PathBuf,
    prod: PathBuf,
}

#[fixture]
fn tree() -> Tree {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("infra");
    let prod = root.join("env/prod");
    std::fs::create_dir_all(&prod).unwrap();
    std::fs::write(root.join(TFGEN_FILENAME), ROOT_CONFIG).unwrap();
    std::fs::write(prod.join(TFGEN_FILENAME), "vars:\n  env: prod\n").unwrap();
    Tree {
        root: dunce::canonicalize(&root).unwrap(),
        prod: dunce::canonicalize(&prod).unwrap(),
        _tmp: tmp,
    }
}

fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn options() -> DiscoveryOptions {
    DiscoveryOptions::default()
}

#[rstest]
fn test_resolve_builds_context(tree: Tree) {
    let mut diag = Diagnostics::new();
    let resolved = resolve(&tree.prod, &options(), &mut diag).expect("Should resolve");

    assert_eq!(resolved.chain.len(), 2);
    assert_eq!(resolved.root().map(|l| l.directory.clone()), Some(tree.root.clone()));
    assert_eq!(resolved.config.target_dir, tree.prod);
    assert_eq!(resolved.config.variables[STATE_KEY_VAR], "env/prod");
    assert_eq!(resolved.config.variables["env"], "prod");
    assert_eq!(resolved.config.variables["company"], "acme");
}

#[rstest]
fn test_exec_generates_files(tree: Tree) {
    let mut diag = Diagnostics::new();
    let report = exec(&tree.prod, &options(), &mut diag).expect("Should exec");

    assert_eq!(report.written.len(), 2);
    assert_eq!(
        std::fs::read_to_string(tree.prod.join("backend.tf")).unwrap(),
        "key = \"acme/env/prod/terraform.tfstate\"\n"
    );
    assert_eq!(
        std::fs::read_to_string(tree.prod.join("locals.tf")).unwrap(),
        "env = \"prod\"\n"
    );
}

#[rstest]
fn test_exec_is_idempotent(tree: Tree) {
    let mut diag = Diagnostics::new();
    exec(&tree.prod, &options(), &mut diag).expect("first exec");
    let first = std::fs::read(tree.prod.join("backend.tf")).unwrap();
    exec(&tree.prod, &options(), &mut diag).expect("second exec");
    let second = std::fs::read(tree.prod.join("backend.tf")).unwrap();

    assert_eq!(first, second);
    assert_eq!(listing(&tree.prod), vec![".tfgen.yaml", "backend.tf", "locals.tf"]);
}

#[rstest]
fn test_exec_then_clean_restores_directory(tree: Tree) {
    std::fs::write(tree.prod.join("main.tf"), "handwritten").unwrap();
    let before = listing(&tree.prod);

    let mut diag = Diagnostics::new();
    let report = exec(&tree.prod, &options(), &mut diag).expect("Should exec");
    let mut removed = clean(&tree.prod, &options(), &mut diag).expect("Should clean");
    removed.sort();

    assert_eq!(removed, report.written);
    assert_eq!(listing(&tree.prod), before);
}

#[rstest]
fn test_failed_exec_leaves_directory_unchanged(tree: Tree) {
    let mut diag = Diagnostics::new();
    exec(&tree.prod, &options(), &mut diag).expect("Should exec");
    let backend = std::fs::read(tree.prod.join("backend.tf")).unwrap();

    std::fs::write(
        tree.prod.join(TFGEN_FILENAME),
        "vars:\n  env: changed\ntemplate_files:\n  broken.tf: \"{{ undeclared }}\"\n",
    )
    .unwrap();

    match exec(&tree.prod, &options(), &mut diag) {
        Err(crate::Error::RenderFailed { failures, .. }) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].name, "broken.tf");
        }
        other => panic!("Expected RenderFailed, got: {other:?}"),
    }

    assert_eq!(
        listing(&tree.prod),
        vec![".tfgen.yaml", "backend.tf", "locals.tf"]
    );
    assert_eq!(std::fs::read(tree.prod.join("backend.tf")).unwrap(), backend);
    assert_eq!(
        std::fs::read_to_string(tree.prod.join("locals.tf")).unwrap(),
        "env = \"prod\"\n"
    );
}

#[rstest]
fn test_exec_requires_directory(tree: Tree) {
    let mut diag = Diagnostics::new();
    let missing = tree.root.join("does-not-exist");
    assert!(matches!(
        exec(&missing, &options(), &mut diag),
        Err(crate::Error::NotADirectory(_))
    ));

    let file = tree.root.join(TFGEN_FILENAME);
    assert!(matches!(
        exec(&file, &options(), &mut diag),
        Err(crate::Error::NotADirectory(_))
    ));
}

#[rstest]
fn test_reserved_variable_collision_is_visible(tree: Tree) {
    std::fs::write(
        tree.prod.join(TFGEN_FILENAME),
        format!("vars:\n  {STATE_KEY_VAR}: custom\n"),
    )
    .unwrap();

    let mut diag = Diagnostics::new();
    exec(&tree.prod, &options(), &mut diag).expect("Should exec");

    assert!(diag.contains("tfgen::reserved_key_collision"));
    assert_eq!(
        std::fs::read_to_string(tree.prod.join("backend.tf")).unwrap(),
        "key = \"acme/env/prod/terraform.tfstate\"\n"
    );
}

#[rstest]
fn test_directory_form_layer(tree: Tree) {
    let app = tree.prod.join("app");
    let control_dir = app.join(crate::TFGEN_DIRNAME);
    std::fs::create_dir_all(&control_dir).unwrap();
    std::fs::write(control_dir.join(TFGEN_FILENAME), "vars:\n  tier: web\n").unwrap();
    std::fs::write(control_dir.join("tier.tf"), "tier = \"{{ tier }}\"\n").unwrap();

    let mut diag = Diagnostics::new();
    exec(&app, &options(), &mut diag).expect("Should exec");

    assert_eq!(
        std::fs::read_to_string(app.join("tier.tf")).unwrap(),
        "tier = \"web\"\n"
    );
    assert_eq!(
        std::fs::read_to_string(app.join("backend.tf")).unwrap(),
        "key = \"acme/env/prod/app/terraform.tfstate\"\n"
    );
}

#[rstest]
fn test_exec_recursive_only_visits_terraform_dirs(tree: Tree) {
    let network = tree.root.join("network");
    let docs = tree.root.join("docs");
    let git = tree.root.join(".git/modules");
    for dir in [&network, &docs, &git] {
        std::fs::create_dir_all(dir).unwrap();
    }
    std::fs::write(network.join("main.tf"), "resource {}").unwrap();
    std::fs::write(docs.join("README.md"), "docs").unwrap();
    std::fs::write(git.join("vendored.tf"), "resource {}").unwrap();

    let mut diag = Diagnostics::new();
    let reports = exec_recursive(&tree.root, &options(), &mut diag).expect("Should exec");

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].target_dir, network);
    assert!(network.join("backend.tf").exists());
    assert!(!docs.join("backend.tf").exists());
    assert!(!git.join("backend.tf").exists());
}

#[rstest]
fn test_exec_all_and_clean_all() {
    let tmp = TempDir::new().unwrap();
    let root = dunce::canonicalize(tmp.path()).unwrap();
    for child in ["dev", "prod"] {
        std::fs::create_dir_all(root.join(child)).unwrap();
    }
    std::fs::write(
        root.join(TFGEN_FILENAME),
        r#"
root_file: true
clean_pattern: "*.tf"
target_directories: [dev, prod]
template_files:
  backend.tf: "key = \"{{ tfgen_state_key }}\"\n"
"#,
    )
    .unwrap();
    std::fs::write(root.join("prod/notes.md"), "keep").unwrap();

    let mut diag = Diagnostics::new();
    let reports = exec_all(&root, &options(), &mut diag).expect("Should exec_all");
    assert_eq!(reports.len(), 2);
    assert_eq!(
        std::fs::read_to_string(root.join("dev/backend.tf")).unwrap(),
        "key = \"dev\"\n"
    );
    assert_eq!(
        std::fs::read_to_string(root.join("prod/backend.tf")).unwrap(),
        "key = \"prod\"\n"
    );

    let mut removed = clean_all(&root, &options(), &mut diag).expect("Should clean_all");
    removed.sort();
    assert_eq!(
        removed,
        vec![root.join("dev/backend.tf"), root.join("prod/backend.tf")]
    );
    assert!(root.join("prod/notes.md").exists());
    assert!(root.join(TFGEN_FILENAME).exists());
}

#[rstest]
fn test_exec_all_requires_target_directories(tree: Tree) {
    let mut diag = Diagnostics::new();
    match exec_all(&tree.root, &options(), &mut diag) {
        Err(crate::Error::NoTargetDirectories(path)) => {
            assert_eq!(path, tree.root.join(TFGEN_FILENAME));
        }
        other => panic!("Expected NoTargetDirectories, got: {other:?}"),
    }
}

#[rstest]
fn test_clean_all_requires_pattern(tree: Tree) {
    let mut diag = Diagnostics::new();
    assert!(matches!(
        clean_all(&tree.prod, &options(), &mut diag),
        Err(crate::Error::NoCleanPattern(_))
    ));
}

#[rstest]
fn test_clean_all_without_target_directories_cleans_target() {
    let tmp = TempDir::new().unwrap();
    let root = dunce::canonicalize(tmp.path()).unwrap();
    std::fs::write(
        root.join(TFGEN_FILENAME),
        "root_file: true\nclean_pattern: \"**/*.tf\"\n",
    )
    .unwrap();
    std::fs::create_dir_all(root.join("a/b")).unwrap();
    std::fs::write(root.join("a/b/x.tf"), "x").unwrap();
    std::fs::write(root.join("a/y.tf"), "y").unwrap();

    let mut diag = Diagnostics::new();
    let removed = clean_all(root.join("a"), &options(), &mut diag).expect("Should clean_all");

    assert_eq!(removed.len(), 2);
    assert!(!root.join("a/b/x.tf").exists());
    assert!(!root.join("a/y.tf").exists());
}

#[rstest]
fn test_clean_all_continues_past_missing_directory() {
    let tmp = TempDir::new().unwrap();
    let root = dunce::canonicalize(tmp.path()).unwrap();
    std::fs::create_dir_all(root.join("prod")).unwrap();
    std::fs::write(
        root.join(TFGEN_FILENAME),
        "root_file: true\nclean_pattern: \"*.tf\"\ntarget_directories: [missing, prod]\n",
    )
    .unwrap();
    std::fs::write(root.join("prod/x.tf"), "x").unwrap();

    let mut diag = Diagnostics::new();
    match clean_all(&root, &options(), &mut diag) {
        Err(crate::Error::CleanFailed { removed, failures }) => {
            assert_eq!(removed, vec![root.join("prod/x.tf")]);
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].path, root.join("missing"));
            assert_eq!(failures[0].reason, "not a directory");
        }
        other => panic!("Expected CleanFailed, got: {other:?}"),
    }
    assert!(!root.join("prod/x.tf").exists());
}

#[rstest]
fn test_template_cannot_overwrite_control_document() {
    let tmp = TempDir::new().unwrap();
    let root = dunce::canonicalize(tmp.path()).unwrap();
    let control = "root_file: true\ntemplate_files:\n  .tfgen.yaml: oops\n";
    std::fs::write(root.join(TFGEN_FILENAME), control).unwrap();

    let mut diag = Diagnostics::new();
    assert!(matches!(
        exec(&root, &options(), &mut diag),
        Err(crate::Error::InvalidTemplateName(_))
    ));
    assert!(matches!(
        clean(&root, &options(), &mut diag),
        Err(crate::Error::InvalidTemplateName(_))
    ));
    assert_eq!(
        std::fs::read_to_string(root.join(TFGEN_FILENAME)).unwrap(),
        control
    );
}
