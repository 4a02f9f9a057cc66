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

//! The `podspec.yaml` configuration file.
//!
//! Only the sections used by these helpers are modelled. Preprocessors
//! and translator services of other kinds are accepted and ignored.

use anyhow::Context;
use serde::Deserialize;

use crate::pod::Pod;

pub const PODSPEC_PATH: &str = "/podspec.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Podspec {
    #[serde(default)]
    pub localization: Localization,
    #[serde(default)]
    pub preprocessors: Vec<PreprocessorConfig>,
    #[serde(default)]
    pub translators: Translators,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Localization {
    pub default_locale: Option<String>,
    #[serde(default)]
    pub locales: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PreprocessorConfig {
    Contentful(ContentfulConfig),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentfulConfig {
    pub space: String,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default)]
    pub keys: KeyConfig,
    #[serde(default)]
    pub bind: Vec<Binding>,
}

fn default_environment() -> String {
    String::from("master")
}

/// Access tokens for the delivery and preview APIs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyConfig {
    pub preview: Option<String>,
    pub production: Option<String>,
}

/// Pairs a local collection with a remote content type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Binding {
    /// Pod path of the collection, such as `/content/posts/`.
    pub collection: String,
    /// Identifier of the remote content type.
    #[serde(rename = "type")]
    pub content_type: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Translators {
    #[serde(default)]
    pub services: Vec<TranslatorConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranslatorConfig {
    pub service: String,
    pub project_title: Option<String>,
    /// Email addresses given write access to uploaded catalogs.
    #[serde(default)]
    pub acl: Vec<String>,
}

impl Podspec {
    pub fn parse(yaml: &str) -> anyhow::Result<Self> {
        // An empty file is a valid, empty podspec.
        let podspec = serde_yaml_ng::from_str::<Option<Podspec>>(yaml)
            .context("Could not parse podspec")?;
        Ok(podspec.unwrap_or_default())
    }

    /// Read `podspec.yaml` from the root of `pod`.
    pub fn load(pod: &Pod) -> anyhow::Result<Self> {
        let yaml = pod.read_file(PODSPEC_PATH)?;
        Self::parse(&yaml)
            .with_context(|| format!("Invalid {}", pod.abs_path(PODSPEC_PATH).display()))
    }

    pub fn contentful_preprocessors(&self) -> impl Iterator<Item = &ContentfulConfig> {
        self.preprocessors.iter().filter_map(|preprocessor| match preprocessor {
            PreprocessorConfig::Contentful(config) => Some(config),
            PreprocessorConfig::Unsupported => None,
        })
    }

    /// The configuration of the translator service `service`, if any.
    pub fn translator(&self, service: &str) -> Option<&TranslatorConfig> {
        self.translators
            .services
            .iter()
            .find(|config| config.service == service)
    }
}
