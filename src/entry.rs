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

//! Remote entries and their conversion into document contents.

use crate::fields::{normalize_field, FieldValue, Fields};
use indexmap::IndexMap;
use serde_json::Value;

/// Field holding the long-form text of an entry.
const BODY_FIELD: &str = "body";

/// Field renamed to the reserved title key.
const TITLE_FIELD: &str = "title";

/// Reserved document key for the title.
pub const RESERVED_TITLE: &str = "$title";

/// A content record fetched from the content-management system.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEntry {
    /// The entry identifier (`sys.id`).
    pub id: String,
    /// The content type identifier (`sys.contentType.sys.id`).
    pub content_type: String,
    /// Field name to field value, in delivery order.
    pub fields: IndexMap<String, FieldValue>,
}

impl RemoteEntry {
    pub fn new(id: impl Into<String>, content_type: impl Into<String>) -> Self {
        RemoteEntry {
            id: id.into(),
            content_type: content_type.into(),
            fields: IndexMap::new(),
        }
    }

    /// Builder-style helper to append a field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// The document contents derived from a [`RemoteEntry`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEntry {
    pub fields: Fields,
    /// Markdown body, empty for data-only documents.
    pub body: String,
    /// File name of the document: `{id}.md` or `{id}.yaml`.
    pub basename: String,
}

/// Render a body field as text.
fn body_text(value: FieldValue) -> String {
    match normalize_field(value) {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    }
}

/// Convert a remote entry into document fields, body and file name.
///
/// The `body` field becomes the document body. Entries with a
/// non-empty body are written as Markdown, all other entries as YAML.
/// A `title` field is renamed to `$title` in place. Should the entry
/// also carry a `$title` field, the renamed `title` replaces it.
///
/// # Examples
///
/// ```
/// use grow_helpers::entry::{parse_entry, RemoteEntry};
/// use serde_json::json;
///
/// let entry = RemoteEntry::new("abc", "post")
///     .with_field("title", "Hello")
///     .with_field("body", "# Hi");
/// let parsed = parse_entry(entry);
/// assert_eq!(parsed.basename, "abc.md");
/// assert_eq!(parsed.body, "# Hi");
/// assert_eq!(parsed.fields.get("$title"), Some(&json!("Hello")));
/// ```
pub fn parse_entry(entry: RemoteEntry) -> ParsedEntry {
    let RemoteEntry { id, mut fields, .. } = entry;
    let body = fields
        .shift_remove(BODY_FIELD)
        .map(body_text)
        .unwrap_or_default();

    let has_title = fields.contains_key(TITLE_FIELD);
    if has_title {
        fields.shift_remove(RESERVED_TITLE);
    }
    let fields = fields
        .into_iter()
        .map(|(name, value)| {
            let name = if name == TITLE_FIELD {
                String::from(RESERVED_TITLE)
            } else {
                name
            };
            (name, normalize_field(value))
        })
        .collect::<Fields>();

    let ext = if body.is_empty() { "yaml" } else { "md" };
    ParsedEntry {
        fields,
        body,
        basename: format!("{id}.{ext}"),
    }
}
