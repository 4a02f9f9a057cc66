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

//! `grow-gtt` exchanges locale catalogs with Google Translator Toolkit.

use std::path::PathBuf;

use clap::Parser as _;
use grow_helpers::pod::Pod;
use grow_helpers::podspec::{Podspec, TranslatorConfig};
use grow_helpers::translator::gtt::AccessLevel;
use grow_helpers::translator::GoogleTranslatorToolkitTranslator;
use log::info;

#[derive(clap::Parser)]
#[command(about = "Upload and download Grow catalogs with Google Translator Toolkit")]
struct Cli {
    /// Root directory of the pod.
    #[arg(default_value = ".")]
    pod: PathBuf,
    /// OAuth access token for the documents API.
    #[arg(long, env = "GTT_ACCESS_TOKEN", hide_env_values = true)]
    access_token: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Upload locale catalogs for translation.
    Upload {
        /// Locales to upload. Defaults to all locales of the pod.
        #[arg(long = "locale")]
        locales: Vec<String>,
        /// Source language. Defaults to the default locale of the pod.
        #[arg(long)]
        source_lang: Option<String>,
    },
    /// Download a translated document into a locale catalog.
    Download {
        document_id: String,
        #[arg(long)]
        locale: String,
    },
    /// Share a document with a user.
    Share {
        document_id: String,
        email: String,
        #[arg(long, value_enum, default_value_t = AccessLevel::ReadAndWrite)]
        access_level: AccessLevel,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().filter_or("RUST_LOG", "info"));
    let cli = Cli::parse();
    let pod = Pod::new(cli.pod);
    let podspec = Podspec::load(&pod)?;
    let config = podspec
        .translator(GoogleTranslatorToolkitTranslator::KIND)
        .cloned()
        .unwrap_or_else(|| TranslatorConfig {
            service: String::from(GoogleTranslatorToolkitTranslator::KIND),
            project_title: None,
            acl: Vec::new(),
        });
    let translator = GoogleTranslatorToolkitTranslator::new(config, cli.access_token);

    match cli.command {
        Command::Upload {
            locales,
            source_lang,
        } => {
            let locales = if locales.is_empty() {
                podspec.localization.locales.clone()
            } else {
                locales
            };
            let source_lang = source_lang.or(podspec.localization.default_locale);
            for uploaded in translator.upload_locales(&pod, &locales, source_lang.as_deref())? {
                println!("{}: {}", uploaded.locale, uploaded.edit_url);
            }
        }
        Command::Download {
            document_id,
            locale,
        } => {
            let catalog = translator.download_catalog(&pod, &document_id, &locale)?;
            info!("{} messages for {locale}", catalog.messages().count());
        }
        Command::Share {
            document_id,
            email,
            access_level,
        } => translator.share(&document_id, &email, access_level)?,
    }
    Ok(())
}
