// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! `grow-contentful` keeps pod collections in sync with Contentful.
//!
//! `sync` writes one document per entry into every bound collection
//! and deletes documents without an entry. `inject` prints a document
//! with the contents of its entry, leaving the pod untouched.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser as _;
use grow_helpers::contentful::Api;
use grow_helpers::pod::Pod;
use grow_helpers::podspec::Podspec;
use grow_helpers::preprocessor::ContentfulPreprocessor;
use log::{info, warn};

#[derive(clap::Parser)]
#[command(about = "Sync Grow pod collections with Contentful")]
struct Cli {
    /// Root directory of the pod.
    #[arg(default_value = ".")]
    pod: PathBuf,
    /// Read draft entries from the preview API.
    #[arg(long)]
    preview: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Write bound collections from the remote entries.
    Sync,
    /// Print a document with the contents of its entry.
    Inject {
        /// Pod path of the document, such as `/content/posts/hello.md`.
        doc: String,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().filter_or("RUST_LOG", "info"));
    let cli = Cli::parse();
    let mut pod = Pod::new(cli.pod);
    let podspec = Podspec::load(&pod)?;
    let api = if cli.preview {
        Api::Preview
    } else {
        Api::Delivery
    };
    let preprocessors = podspec
        .contentful_preprocessors()
        .map(|config| ContentfulPreprocessor::new(config.clone(), api))
        .collect::<Vec<_>>();
    if preprocessors.is_empty() {
        warn!("No {} preprocessors in podspec.yaml", ContentfulPreprocessor::KIND);
        return Ok(());
    }

    match cli.command {
        Command::Sync => {
            for preprocessor in &preprocessors {
                for report in preprocessor.run(&mut pod)? {
                    info!(
                        "Saved {} and deleted {} documents",
                        report.saved.len(),
                        report.deleted.len()
                    );
                }
            }
        }
        Command::Inject { doc } => {
            let mut document = pod
                .read_doc(&doc)
                .with_context(|| format!("Could not load {doc}"))?;
            for preprocessor in &preprocessors {
                preprocessor.inject(&mut document)?;
            }
            print!("{}", document.render()?);
        }
    }
    Ok(())
}
