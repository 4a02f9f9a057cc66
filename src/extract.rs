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

//! This file contains the main logic used by the binary `grow-extract`.
//!
//! Translatable strings are collected from the documents of the pod
//! into a `messages.pot` template. Locale catalogs are then either
//! created afresh from the template or updated, keeping the existing
//! translations of messages which are still in use.

use std::sync::OnceLock;

use anyhow::Context;
use log::info;
use polib::catalog::Catalog;
use polib::message::{Message, MessageView};
use polib::metadata::CatalogMetadata;
use polib::po_file;
use regex::Regex;
use serde_json::Value;

use crate::catalog::parse_catalog;
use crate::messages::extract_messages;
use crate::pod::{Document, DocumentStore, Pod};
use crate::podspec::Podspec;
use crate::translator::DEFAULT_PROJECT_TITLE;

/// Pod path of the collection tree scanned for messages.
pub const CONTENT_ROOT: &str = "/content";

/// Pod path of the extracted template.
pub const TEMPLATE_PATH: &str = "/translations/messages.pot";

/// Pod path of the catalog for `locale`.
pub fn catalog_path(locale: &str) -> String {
    format!("/translations/{locale}/LC_MESSAGES/messages.po")
}

/// How a field key is tagged.
#[derive(Debug, PartialEq)]
enum KeyTag<'a> {
    /// `key`: not translated.
    Plain,
    /// `key@`: the value is translatable.
    Translatable,
    /// `key@de`: the value is a translation for a locale.
    Localized(&'a str),
}

fn key_tag(key: &str) -> KeyTag<'_> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^(?<name>[^@]+)@(?<locale>[\w-]*)$").expect("well-formed regex")
    });
    match re.captures(key).and_then(|captures| captures.name("locale")) {
        None => KeyTag::Plain,
        Some(locale) if locale.as_str().is_empty() => KeyTag::Translatable,
        Some(locale) => KeyTag::Localized(locale.as_str()),
    }
}

fn collect_value(value: &Value, translatable: bool, messages: &mut Vec<String>) {
    match value {
        Value::String(text) if translatable && !text.trim().is_empty() => {
            messages.push(text.clone());
        }
        Value::Array(items) => {
            for item in items {
                collect_value(item, translatable, messages);
            }
        }
        Value::Object(map) => {
            for (key, value) in map {
                collect_field(key, value, messages);
            }
        }
        _ => {}
    }
}

fn collect_field(key: &str, value: &Value, messages: &mut Vec<String>) {
    match key_tag(key) {
        KeyTag::Plain => collect_value(value, false, messages),
        KeyTag::Translatable => collect_value(value, true, messages),
        KeyTag::Localized(_) => {}
    }
}

/// Extract the messages of a document as `(source, msgid)` pairs.
///
/// Fields tagged with a trailing `@` are translatable, at any depth.
/// Markdown bodies are split into messages as well; their sources
/// carry the line number in the stored file.
pub fn extract_document_messages(doc: &Document) -> Vec<(String, String)> {
    let mut field_messages = Vec::new();
    for (key, value) in &doc.fields {
        collect_field(key, value, &mut field_messages);
    }
    let mut messages = field_messages
        .into_iter()
        .map(|msgid| (doc.pod_path.clone(), msgid))
        .collect::<Vec<_>>();

    if doc.pod_path.ends_with(".md") {
        for (lineno, msgid) in extract_messages(&doc.body) {
            if msgid.trim().is_empty() {
                continue;
            }
            let source = format!("{}:{}", doc.pod_path, lineno + doc.body_offset);
            messages.push((source, msgid));
        }
    }
    messages
}

fn add_message(catalog: &mut Catalog, msgid: &str, source: &str) {
    let sources = match catalog.find_message(None, msgid, None) {
        Some(msg) if msg.source().lines().any(|line| line == source) => return,
        Some(msg) => format!("{}\n{}", msg.source(), source),
        None => String::from(source),
    };
    let message = Message::build_singular()
        .with_source(sources)
        .with_msgid(String::from(msgid))
        .done();
    catalog.append_or_update(message);
}

fn now() -> String {
    chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

fn template_metadata(pod: &Pod, podspec: &Podspec) -> CatalogMetadata {
    let mut metadata = CatalogMetadata::new();
    let project_title = podspec
        .translators
        .services
        .iter()
        .find_map(|service| service.project_title.clone())
        .or_else(|| {
            pod.root()
                .file_name()
                .and_then(|name| name.to_str())
                .map(String::from)
        });
    metadata.project_id_version =
        project_title.unwrap_or_else(|| String::from(DEFAULT_PROJECT_TITLE));
    if let Some(locale) = &podspec.localization.default_locale {
        metadata.language = locale.clone();
    }
    metadata.pot_creation_date = now();
    metadata.mime_version = String::from("1.0");
    metadata.content_type = String::from("text/plain; charset=UTF-8");
    metadata.content_transfer_encoding = String::from("8bit");
    metadata
}

/// Build the message template from every document under
/// [`CONTENT_ROOT`].
pub fn create_template(pod: &Pod, podspec: &Podspec) -> anyhow::Result<Catalog> {
    let mut catalog = Catalog::new(template_metadata(pod, podspec));
    for pod_path in pod.list_docs(CONTENT_ROOT, true)? {
        let doc = pod
            .read_doc(&pod_path)
            .with_context(|| format!("Could not load {pod_path}"))?;
        for (source, msgid) in extract_document_messages(&doc) {
            add_message(&mut catalog, &msgid, &source);
        }
    }
    Ok(catalog)
}

/// Build the catalog for `locale` from `template`.
///
/// Translations are taken from `existing` for every message still
/// present in the template. Messages missing from the template are
/// dropped.
pub fn merge_catalog(template: &Catalog, locale: &str, existing: Option<&Catalog>) -> Catalog {
    let mut metadata = CatalogMetadata::new();
    metadata.project_id_version = template.metadata.project_id_version.clone();
    metadata.pot_creation_date = template.metadata.pot_creation_date.clone();
    metadata.po_revision_date = now();
    metadata.language = String::from(locale);
    metadata.mime_version = template.metadata.mime_version.clone();
    metadata.content_type = template.metadata.content_type.clone();
    metadata.content_transfer_encoding = template.metadata.content_transfer_encoding.clone();
    if let Some(existing) = existing {
        metadata.last_translator = existing.metadata.last_translator.clone();
        metadata.language_team = existing.metadata.language_team.clone();
    }

    let mut catalog = Catalog::new(metadata);
    for msg in template.messages() {
        let msgstr = existing
            .and_then(|existing| existing.find_message(None, msg.msgid(), None))
            .and_then(|translated| translated.msgstr().ok())
            .unwrap_or_default();
        let message = Message::build_singular()
            .with_source(String::from(msg.source()))
            .with_msgid(String::from(msg.msgid()))
            .with_msgstr(String::from(msgstr))
            .done();
        catalog.append_or_update(message);
    }
    catalog
}

fn read_catalog(pod: &Pod, pod_path: &str) -> anyhow::Result<Catalog> {
    parse_catalog(&pod.abs_path(pod_path))
}

/// Write `catalog` to `pod_path`, creating directories as needed.
pub fn write_catalog(pod: &Pod, pod_path: &str, catalog: &Catalog) -> anyhow::Result<()> {
    let path = pod.abs_path(pod_path);
    if let Some(directory) = path.parent() {
        std::fs::create_dir_all(directory)
            .with_context(|| format!("Could not create {}", directory.display()))?;
    }
    po_file::write(catalog, &path)
        .with_context(|| format!("Writing messages to {}", path.display()))
}

/// Create fresh catalogs for `locales`, discarding existing
/// translations.
pub fn init_catalogs(pod: &Pod, template: &Catalog, locales: &[String]) -> anyhow::Result<()> {
    for locale in locales {
        let pod_path = catalog_path(locale);
        write_catalog(pod, &pod_path, &merge_catalog(template, locale, None))?;
        info!("Initialized -> {pod_path}");
    }
    Ok(())
}

/// Update the catalogs of `locales` to match `template`.
///
/// Missing catalogs are created.
pub fn update_catalogs(pod: &Pod, template: &Catalog, locales: &[String]) -> anyhow::Result<()> {
    for locale in locales {
        let pod_path = catalog_path(locale);
        let existing = if pod.file_exists(&pod_path) {
            Some(read_catalog(pod, &pod_path)?)
        } else {
            None
        };
        let catalog = merge_catalog(template, locale, existing.as_ref());
        write_catalog(pod, &pod_path, &catalog)?;
        info!("Updated -> {pod_path}");
    }
    Ok(())
}

/// Extract messages into the template and refresh the locale catalogs.
///
/// With `init`, existing locale catalogs are replaced.
pub fn extract(pod: &Pod, init: bool) -> anyhow::Result<()> {
    let podspec = Podspec::load(pod)?;
    let template = create_template(pod, &podspec).context("Extracting messages")?;
    write_catalog(pod, TEMPLATE_PATH, &template)?;
    info!(
        "Extracted {} messages -> {TEMPLATE_PATH}",
        template.messages().count()
    );

    let locales = &podspec.localization.locales;
    if locales.is_empty() {
        info!(
            "No pod-specific locales defined, \
             skipped generating locale-specific catalogs."
        );
        return Ok(());
    }
    if init {
        init_catalogs(pod, &template, locales)
    } else {
        update_catalogs(pod, &template, locales)
    }
}
