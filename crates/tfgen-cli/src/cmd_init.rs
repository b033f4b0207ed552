// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `tfgen init` command.

use std::path::{Path, PathBuf};

use clap::Args;
use miette::Result;

#[cfg(test)]
#[path = "./cmd_init_test.rs"]
mod cmd_init_test;

/// Create a new .tfgen.yaml file
#[derive(Debug, Args)]
pub struct CmdInit {
    /// Directory to create file in
    #[clap(default_value = ".")]
    path: PathBuf,

    /// Mark the file as the root of the hierarchy
    #[clap(long)]
    root: bool,
}

impl CmdInit {
    pub fn run(&mut self) -> Result<i32> {
        let spec_path = create(&self.path, self.root)?;

        println!("Created .tfgen.yaml at {:?}", spec_path);
        println!();
        println!("Next steps:");
        println!("  1. Edit the file to add your variables and templates");
        println!("  2. Run 'tfgen show' to preview the configuration");
        println!("  3. Run 'tfgen exec' to generate the files");

        Ok(0)
    }
}

/// Write a starter control document into `dir`, returning its path.
fn create(dir: &Path, root: bool) -> Result<PathBuf> {
    if !dir.is_dir() {
        return Err(tfgen::Error::NotADirectory(dir.to_path_buf()).into());
    }

    let spec_path = dir.join(tfgen::TFGEN_FILENAME);
    if spec_path.exists() {
        return Err(miette::miette!(
            ".tfgen.yaml already exists at {:?}",
            spec_path
        ));
    }
    let control_dir = dir.join(tfgen::TFGEN_DIRNAME);
    if control_dir.exists() {
        return Err(miette::miette!(
            help = "add the control file inside the .tfgen.d directory instead",
            "{:?} already declares a configuration layer",
            control_dir
        ));
    }

    let content = if root {
        root_template()
    } else {
        child_template()
    };
    std::fs::write(&spec_path, content)
        .map_err(|e| miette::miette!("Failed to write .tfgen.yaml: {}", e))?;

    Ok(spec_path)
}

fn root_template() -> String {
    "# tfgen root configuration\n\
    # Layers below this directory inherit and override these settings.\n\
    \n\
    root_file: true\n\
    \n\
    vars: {}\n\
    #   company: acme\n\
    \n\
    # Files removed by 'tfgen clean_all'\n\
    # clean_pattern: \"*.tf\"\n\
    \n\
    # Directories visited by 'tfgen exec_all' and 'tfgen clean_all'\n\
    # target_directories:\n\
    #   - dev\n\
    #   - prod\n\
    \n\
    template_files: {}\n\
    #   backend.tf: |\n\
    #     terraform {\n\
    #       backend \"s3\" {\n\
    #         key = \"{{ tfgen_state_key }}/terraform.tfstate\"\n\
    #       }\n\
    #     }\n\
    \n\
    # deps:\n\
    #   terraform_version: \">= 1.5\"\n\
    #   required_providers:\n\
    #     aws:\n\
    #       source: hashicorp/aws\n\
    #       version: \"~> 5.0\"\n\
    #   default_providers: [aws]\n"
        .to_string()
}

fn child_template() -> String {
    "# tfgen layer configuration\n\
    # Values here override the ones inherited from parent directories.\n\
    \n\
    vars: {}\n\
    #   env: prod\n\
    \n\
    template_files: {}\n\
    #   locals.tf: |\n\
    #     locals {\n\
    #       env = \"{{ env }}\"\n\
    #     }\n"
        .to_string()
}
