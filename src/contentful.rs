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

//! Client for the Contentful Content Delivery and Preview APIs.
//!
//! Entries are fetched with their linked assets included, so asset
//! links can be resolved to URLs while decoding. Links to other
//! entries are kept as identifiers.

use std::collections::HashMap;

use anyhow::{anyhow, Context};
use indexmap::IndexMap;
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::entry::RemoteEntry;
use crate::fields::FieldValue;
use crate::podspec::ContentfulConfig;

const DELIVERY_API_URL: &str = "https://cdn.contentful.com";
const PREVIEW_API_URL: &str = "https://preview.contentful.com";

/// Maximum page size accepted by the delivery API.
const PAGE_LIMIT: usize = 1000;

/// A source of remote entries.
pub trait EntrySource {
    /// Fetch every entry of the space.
    fn fetch_all_entries(&self) -> anyhow::Result<Vec<RemoteEntry>>;

    /// Fetch the entry with the given identifier, if it exists.
    fn fetch_entry(&self, id: &str) -> anyhow::Result<Option<RemoteEntry>>;
}

/// The API to read content from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Api {
    /// Published content, read with the production key.
    #[default]
    Delivery,
    /// Draft content, read with the preview key.
    Preview,
}

#[derive(Debug, Deserialize)]
struct EntryPage {
    #[serde(default)]
    total: usize,
    #[serde(default)]
    items: Vec<RawEntry>,
    #[serde(default)]
    includes: Includes,
}

#[derive(Debug, Default, Deserialize)]
struct Includes {
    #[serde(default, rename = "Asset")]
    assets: Vec<RawResource>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    sys: Value,
    #[serde(default)]
    fields: IndexMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawResource {
    sys: Value,
    #[serde(default)]
    fields: Value,
}

fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}

/// Resolve a field value, turning link objects into assets and entry
/// references.
fn decode_field(value: Value, assets: &HashMap<String, String>) -> FieldValue {
    match value {
        Value::Array(items) => FieldValue::List(
            items
                .into_iter()
                .map(|item| decode_field(item, assets))
                .collect(),
        ),
        value if str_at(&value, "/sys/type") == Some("Link") => {
            let id = str_at(&value, "/sys/id").unwrap_or_default().to_owned();
            let link_type = str_at(&value, "/sys/linkType").map(str::to_owned);
            match link_type.as_deref() {
                Some("Asset") => match assets.get(&id) {
                    Some(url) => FieldValue::Asset { url: url.clone() },
                    None => {
                        warn!("Could not resolve asset {id}, keeping its identifier");
                        FieldValue::Scalar(Value::String(id))
                    }
                },
                Some("Entry") => FieldValue::Entry { id },
                _ => FieldValue::Scalar(value),
            }
        }
        value => FieldValue::Scalar(value),
    }
}

/// Decode one page of an entries response.
///
/// Returns the decoded entries and the total number of entries
/// matching the query.
pub fn decode_entries(json: &str) -> anyhow::Result<(Vec<RemoteEntry>, usize)> {
    let page: EntryPage = serde_json::from_str(json).context("Could not decode entries")?;
    let assets = page
        .includes
        .assets
        .iter()
        .filter_map(|asset| {
            let id = str_at(&asset.sys, "/id")?;
            let url = str_at(&asset.fields, "/file/url")?;
            Some((id.to_owned(), url.to_owned()))
        })
        .collect::<HashMap<_, _>>();

    let entries = page
        .items
        .into_iter()
        .map(|raw| {
            let id = str_at(&raw.sys, "/id")
                .ok_or_else(|| anyhow!("Entry without sys.id: {}", raw.sys))?
                .to_owned();
            let content_type = str_at(&raw.sys, "/contentType/sys/id")
                .unwrap_or_default()
                .to_owned();
            let fields = raw
                .fields
                .into_iter()
                .map(|(name, value)| (name, decode_field(value, &assets)))
                .collect();
            Ok(RemoteEntry {
                id,
                content_type,
                fields,
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok((entries, page.total))
}

/// Blocking client for a single Contentful space.
pub struct ContentfulClient {
    agent: ureq::Agent,
    base_url: String,
    space: String,
    environment: String,
    access_token: String,
}

impl ContentfulClient {
    /// Create a client reading from `api` with the matching key.
    pub fn new(config: &ContentfulConfig, api: Api) -> anyhow::Result<Self> {
        let (base_url, key, key_name) = match api {
            Api::Delivery => (DELIVERY_API_URL, &config.keys.production, "production"),
            Api::Preview => (PREVIEW_API_URL, &config.keys.preview, "preview"),
        };
        let access_token = key.clone().ok_or_else(|| {
            anyhow!("Missing keys.{key_name} for Contentful space {}", config.space)
        })?;
        Ok(ContentfulClient {
            agent: ureq::Agent::new_with_defaults(),
            base_url: String::from(base_url),
            space: config.space.clone(),
            environment: config.environment.clone(),
            access_token,
        })
    }

    fn entries_url(&self) -> String {
        format!(
            "{}/spaces/{}/environments/{}/entries",
            self.base_url,
            urlencoding::encode(&self.space),
            urlencoding::encode(&self.environment)
        )
    }

    fn fetch_page(&self, query: &[(&str, String)]) -> anyhow::Result<(Vec<RemoteEntry>, usize)> {
        let url = self.entries_url();
        debug!("Fetching {url} with {query:?}");
        let mut request = self
            .agent
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.access_token));
        for (key, value) in query {
            request = request.query(key, value);
        }
        let mut response = request
            .call()
            .with_context(|| format!("Could not fetch entries of space {}", self.space))?;
        let body = response
            .body_mut()
            .read_to_string()
            .context("Could not read entries response")?;
        decode_entries(&body)
    }
}

/// Read pages until `total` entries are collected.
///
/// `fetch_page` is called with the number of entries to skip and
/// returns a page and the reported total. An empty page ends the loop
/// even if fewer than `total` entries were returned.
fn collect_pages<F>(mut fetch_page: F) -> anyhow::Result<Vec<RemoteEntry>>
where
    F: FnMut(usize) -> anyhow::Result<(Vec<RemoteEntry>, usize)>,
{
    let mut entries = Vec::new();
    loop {
        let (page, total) = fetch_page(entries.len())?;
        let done = page.is_empty();
        entries.extend(page);
        if done || entries.len() >= total {
            return Ok(entries);
        }
    }
}

impl EntrySource for ContentfulClient {
    fn fetch_all_entries(&self) -> anyhow::Result<Vec<RemoteEntry>> {
        collect_pages(|skip| {
            self.fetch_page(&[
                ("include", String::from("1")),
                ("limit", PAGE_LIMIT.to_string()),
                ("skip", skip.to_string()),
            ])
        })
    }

    fn fetch_entry(&self, id: &str) -> anyhow::Result<Option<RemoteEntry>> {
        let query = [
            ("include", String::from("1")),
            ("limit", String::from("1")),
            ("sys.id", String::from(id)),
        ];
        let (entries, _) = self.fetch_page(&query)?;
        Ok(entries.into_iter().next())
    }
}
