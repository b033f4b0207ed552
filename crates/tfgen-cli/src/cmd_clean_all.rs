// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `tfgen clean_all` command.

use std::path::PathBuf;

use clap::Args;
use miette::Result;

use crate::cmd_clean::report;

/// Remove every file matching the root layer's clean_pattern
#[derive(Debug, Args)]
pub struct CmdCleanAll {
    /// Directory the root's target_directories are relative to
    #[clap(default_value = ".")]
    dir: PathBuf,
}

impl CmdCleanAll {
    pub fn run(&mut self, options: &tfgen::DiscoveryOptions) -> Result<i32> {
        let mut diag = tfgen::Diagnostics::new();
        report(tfgen::clean_all(&self.dir, options, &mut diag))
    }
}
