// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;
use tempfile::TempDir;

use super::*;

#[rstest]
#[case::root(true)]
#[case::child(false)]
fn test_init_writes_loadable_document(#[case] root: bool) {
    let tmp = TempDir::new().unwrap();
    let path = create(tmp.path(), root).expect("Should create file");

    assert_eq!(path, tmp.path().join(tfgen::TFGEN_FILENAME));
    let document = tfgen::ControlDocument::load(&path).expect("Should parse");
    assert_eq!(document.root_file, root);
    assert!(document.vars.is_empty());
    assert!(document.template_files.is_empty());
}

#[rstest]
fn test_init_refuses_to_overwrite() {
    let tmp = TempDir::new().unwrap();
    let existing = tmp.path().join(tfgen::TFGEN_FILENAME);
    std::fs::write(&existing, "vars:\n  keep: me\n").unwrap();

    assert!(create(tmp.path(), true).is_err());
    assert_eq!(
        std::fs::read_to_string(&existing).unwrap(),
        "vars:\n  keep: me\n"
    );
}

#[rstest]
fn test_init_refuses_next_to_control_dir() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir(tmp.path().join(tfgen::TFGEN_DIRNAME)).unwrap();

    assert!(create(tmp.path(), false).is_err());
    assert!(!tmp.path().join(tfgen::TFGEN_FILENAME).exists());
}

#[rstest]
fn test_init_requires_directory() {
    let tmp = TempDir::new().unwrap();
    assert!(create(&tmp.path().join("missing"), false).is_err());
}
