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

//! Local pod storage.
//!
//! A pod is a directory holding a `podspec.yaml` file and the site
//! content. Files inside the pod are addressed by pod paths: paths
//! relative to the pod root, written with a leading `/`, such as
//! `/content/posts/hello.md`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};

use crate::fields::Fields;

/// File extensions recognized as documents.
const DOCUMENT_EXTENSIONS: &[&str] = &["md", "yaml", "yml", "html"];

const FRONT_MATTER_DELIMITER: &str = "---";

/// Storage of documents grouped into collections.
///
/// Collections are directories, addressed by pod path.
pub trait DocumentStore {
    /// List the pod paths of the documents in `collection`, sorted.
    ///
    /// Sub-collections are only descended into if `recursive` is set.
    fn list_docs(&self, collection: &str, recursive: bool) -> anyhow::Result<Vec<String>>;

    /// Create or overwrite the document `basename` in `collection`.
    ///
    /// Returns the pod path of the document.
    fn create_doc(
        &mut self,
        collection: &str,
        basename: &str,
        fields: &Fields,
        body: &str,
    ) -> anyhow::Result<String>;

    /// Delete the document at `pod_path`.
    fn delete_doc(&mut self, pod_path: &str) -> anyhow::Result<()>;
}

/// Join a collection pod path and a file name.
pub fn join_pod_path(collection: &str, basename: &str) -> String {
    format!("{}/{basename}", collection.trim_end_matches('/'))
}

/// Check if the file name denotes a document.
///
/// Blueprints (`_blueprint.yaml`) and hidden files are not documents.
pub fn is_document_name(name: &str) -> bool {
    if name.starts_with('_') || name.starts_with('.') {
        return false;
    }
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext))
}

/// Split the file stem of `pod_path` into the document base and the
/// locale suffix: `/content/posts/abc@de.md` gives `("abc", Some("de"))`.
pub fn split_locale(pod_path: &str) -> (&str, Option<&str>) {
    let name = pod_path.rsplit('/').next().unwrap_or_default();
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    match stem.split_once('@') {
        Some((base, locale)) => (base, Some(locale)),
        None => (stem, None),
    }
}

/// Render document contents to the text stored on disk.
///
/// Markdown documents carry their fields as YAML front matter.
/// Everything else is stored as plain YAML.
pub fn format_document(pod_path: &str, fields: &Fields, body: &str) -> anyhow::Result<String> {
    let is_markdown = pod_path.ends_with(".md");
    if !is_markdown {
        return serde_yaml_ng::to_string(fields)
            .with_context(|| format!("Could not serialize fields of {pod_path}"));
    }
    if fields.is_empty() {
        return Ok(String::from(body));
    }
    let front_matter = serde_yaml_ng::to_string(fields)
        .with_context(|| format!("Could not serialize front matter of {pod_path}"))?;
    Ok(format!(
        "{FRONT_MATTER_DELIMITER}\n{front_matter}{FRONT_MATTER_DELIMITER}\n{body}"
    ))
}

/// Split stored text into front matter and body.
///
/// Returns the front matter text (if any), the body and the number of
/// lines preceding the body.
pub fn split_front_matter(text: &str) -> (Option<&str>, &str, usize) {
    let Some(rest) = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))
    else {
        return (None, text, 0);
    };
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FRONT_MATTER_DELIMITER {
            let front_matter = &rest[..offset];
            let body = &rest[offset + line.len()..];
            let skipped_lines = front_matter.lines().count() + 2;
            return (Some(front_matter), body, skipped_lines);
        }
        offset += line.len();
    }
    // An unterminated front matter block is treated as plain text.
    (None, text, 0)
}

fn parse_fields(pod_path: &str, yaml: &str) -> anyhow::Result<Fields> {
    if yaml.trim().is_empty() {
        return Ok(Fields::new());
    }
    serde_yaml_ng::from_str::<Option<Fields>>(yaml)
        .map(Option::unwrap_or_default)
        .with_context(|| format!("Could not parse fields of {pod_path}"))
}

/// A document loaded into memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub pod_path: String,
    pub fields: Fields,
    pub body: String,
    /// Number of lines preceding the body in the stored file.
    pub body_offset: usize,
}

impl Document {
    pub fn new(pod_path: impl Into<String>) -> Self {
        Document {
            pod_path: pod_path.into(),
            fields: Fields::new(),
            body: String::new(),
            body_offset: 0,
        }
    }

    /// Parse stored document text.
    pub fn parse(pod_path: impl Into<String>, text: &str) -> anyhow::Result<Self> {
        let pod_path = pod_path.into();
        if pod_path.ends_with(".md") {
            let (front_matter, body, body_offset) = split_front_matter(text);
            let fields = match front_matter {
                Some(yaml) => parse_fields(&pod_path, yaml)?,
                None => Fields::new(),
            };
            Ok(Document {
                pod_path,
                fields,
                body: String::from(body),
                body_offset,
            })
        } else if pod_path.ends_with(".html") {
            Ok(Document {
                body: String::from(text),
                ..Document::new(pod_path)
            })
        } else {
            let fields = parse_fields(&pod_path, text)?;
            Ok(Document {
                fields,
                ..Document::new(pod_path)
            })
        }
    }

    /// The base name of the document: the file stem without a locale
    /// suffix, so both `/content/posts/abc.md` and
    /// `/content/posts/abc@de.md` have the base `abc`.
    pub fn base(&self) -> &str {
        split_locale(&self.pod_path).0
    }

    /// Replace the fields and body in memory, leaving the stored
    /// document untouched.
    pub fn inject(&mut self, fields: Fields, body: String) {
        self.fields = fields;
        self.body = body;
    }

    /// Render the document as it would be stored.
    pub fn render(&self) -> anyhow::Result<String> {
        format_document(&self.pod_path, &self.fields, &self.body)
    }
}

/// A pod on the local filesystem.
#[derive(Debug, Clone)]
pub struct Pod {
    root: PathBuf,
}

impl Pod {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Pod { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The filesystem path of `pod_path`.
    pub fn abs_path(&self, pod_path: &str) -> PathBuf {
        self.root.join(pod_path.trim_start_matches('/'))
    }

    pub fn file_exists(&self, pod_path: &str) -> bool {
        self.abs_path(pod_path).is_file()
    }

    pub fn read_file(&self, pod_path: &str) -> anyhow::Result<String> {
        let path = self.abs_path(pod_path);
        fs::read_to_string(&path).with_context(|| format!("Could not read {}", path.display()))
    }

    /// Write a file, creating its directory as needed.
    pub fn write_file(&self, pod_path: &str, contents: impl AsRef<[u8]>) -> anyhow::Result<()> {
        let path = self.abs_path(pod_path);
        let directory = path
            .parent()
            .ok_or_else(|| anyhow!("Invalid pod path {pod_path:?}"))?;
        fs::create_dir_all(directory)
            .with_context(|| format!("Could not create {}", directory.display()))?;
        fs::write(&path, contents).with_context(|| format!("Could not write {}", path.display()))
    }

    pub fn delete_file(&self, pod_path: &str) -> anyhow::Result<()> {
        let path = self.abs_path(pod_path);
        fs::remove_file(&path).with_context(|| format!("Could not delete {}", path.display()))
    }

    /// Load the document at `pod_path`.
    pub fn read_doc(&self, pod_path: &str) -> anyhow::Result<Document> {
        let text = self.read_file(pod_path)?;
        Document::parse(pod_path, &text)
    }

    fn collect_docs(
        &self,
        collection: &str,
        recursive: bool,
        docs: &mut Vec<String>,
    ) -> anyhow::Result<()> {
        let directory = self.abs_path(collection);
        if !directory.is_dir() {
            return Ok(());
        }
        let entries = fs::read_dir(&directory)
            .with_context(|| format!("Could not list {}", directory.display()))?;
        for entry in entries {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(String::from) else {
                continue;
            };
            let pod_path = join_pod_path(collection, &name);
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                if recursive && !name.starts_with('.') {
                    self.collect_docs(&pod_path, recursive, docs)?;
                }
            } else if is_document_name(&name) {
                docs.push(pod_path);
            }
        }
        Ok(())
    }
}

impl DocumentStore for Pod {
    fn list_docs(&self, collection: &str, recursive: bool) -> anyhow::Result<Vec<String>> {
        let mut docs = Vec::new();
        self.collect_docs(collection, recursive, &mut docs)?;
        docs.sort();
        Ok(docs)
    }

    fn create_doc(
        &mut self,
        collection: &str,
        basename: &str,
        fields: &Fields,
        body: &str,
    ) -> anyhow::Result<String> {
        let pod_path = join_pod_path(collection, basename);
        let contents = format_document(&pod_path, fields, body)?;
        self.write_file(&pod_path, contents)?;
        Ok(pod_path)
    }

    fn delete_doc(&mut self, pod_path: &str) -> anyhow::Result<()> {
        self.delete_file(pod_path)
    }
}
