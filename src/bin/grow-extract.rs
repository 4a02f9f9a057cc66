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

//! `grow-extract` extracts translatable messages of a pod into
//! `/translations/messages.pot` and the catalogs of its locales.

use std::path::PathBuf;

use clap::Parser as _;
use grow_helpers::extract::extract;
use grow_helpers::pod::Pod;

#[derive(clap::Parser)]
#[command(about = "Extract translatable messages from a Grow pod")]
struct Cli {
    /// Root directory of the pod.
    #[arg(default_value = ".")]
    pod: PathBuf,
    /// Create fresh locale catalogs, discarding existing translations.
    #[arg(long)]
    init: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().filter_or("RUST_LOG", "info"));
    let cli = Cli::parse();
    extract(&Pod::new(cli.pod), cli.init)
}
