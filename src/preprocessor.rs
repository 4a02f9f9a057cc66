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

//! This file contains the main logic used by the binary `grow-contentful`.

use std::cell::OnceCell;

use anyhow::Context;
use log::{debug, info};

use crate::contentful::{Api, ContentfulClient, EntrySource};
use crate::entry::parse_entry;
use crate::pod::{Document, DocumentStore};
use crate::podspec::{Binding, ContentfulConfig};
use crate::sync::{bind_collection, SyncReport};

/// Binds pod collections to Contentful content types.
pub struct ContentfulPreprocessor {
    config: ContentfulConfig,
    api: Api,
    client: OnceCell<ContentfulClient>,
}

impl ContentfulPreprocessor {
    /// The `kind` of the preprocessor in `podspec.yaml`.
    pub const KIND: &'static str = "contentful";

    pub fn new(config: ContentfulConfig, api: Api) -> Self {
        ContentfulPreprocessor {
            config,
            api,
            client: OnceCell::new(),
        }
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.config.bind
    }

    /// The API client, created on first use.
    fn client(&self) -> anyhow::Result<&ContentfulClient> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let client = ContentfulClient::new(&self.config, self.api)?;
        Ok(self.client.get_or_init(|| client))
    }

    /// Fetch all entries and sync every binding into `store`.
    pub fn run<S>(&self, store: &mut S) -> anyhow::Result<Vec<SyncReport>>
    where
        S: DocumentStore + ?Sized,
    {
        self.run_with(self.client()?, store)
    }

    /// Like [`run`](Self::run), reading entries from `source`.
    ///
    /// Entries are fetched once and shared by all bindings, which are
    /// processed one after the other.
    pub fn run_with<E, S>(&self, source: &E, store: &mut S) -> anyhow::Result<Vec<SyncReport>>
    where
        E: EntrySource + ?Sized,
        S: DocumentStore + ?Sized,
    {
        let entries = source
            .fetch_all_entries()
            .with_context(|| format!("Could not fetch entries of space {}", self.config.space))?;
        info!(
            "Fetched {} entries from space {}",
            entries.len(),
            self.config.space
        );
        self.bindings()
            .iter()
            .map(|binding| {
                bind_collection(
                    &entries,
                    &mut *store,
                    &binding.collection,
                    &binding.content_type,
                )
                .with_context(|| {
                    format!(
                        "Could not bind {} to content type {}",
                        binding.collection, binding.content_type
                    )
                })
            })
            .collect()
    }

    /// Replace the contents of `doc` in memory with the matching
    /// entry, without touching the filesystem.
    ///
    /// Nothing happens if there is no entry for the document.
    pub fn inject(&self, doc: &mut Document) -> anyhow::Result<()> {
        self.inject_with(self.client()?, doc)
    }

    /// Like [`inject`](Self::inject), reading the entry from `source`.
    pub fn inject_with<E: EntrySource + ?Sized>(
        &self,
        source: &E,
        doc: &mut Document,
    ) -> anyhow::Result<()> {
        let Some(entry) = source.fetch_entry(doc.base())? else {
            debug!("No entry for {}", doc.pod_path);
            return Ok(());
        };
        let parsed = parse_entry(entry);
        doc.inject(parsed.fields, parsed.body);
        Ok(())
    }
}
