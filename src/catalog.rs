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

//! Reading PO files from outside sources.
//!
//! The PO parser expects a complete header entry. Files written by
//! other tools or edited by hand are checked first, and headers of
//! downloaded catalogs can be completed before they are stored.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context};
use polib::catalog::Catalog;
use polib::po_file;

/// Header fields which must be present for a PO file to be parsed.
pub const REQUIRED_HEADER_KEYS: &[&str] = &[
    "Project-Id-Version",
    "POT-Creation-Date",
    "PO-Revision-Date",
    "Language-Team",
    "MIME-Version",
    "Content-Type",
    "Content-Transfer-Encoding",
    "Language",
    "Plural-Forms",
];

/// The header entry of a PO file.
struct Header {
    /// Byte offset just past the last line of the entry.
    end: usize,
    keys: Vec<String>,
}

fn unquote(line: &str) -> &str {
    let line = line.strip_prefix('"').unwrap_or(line);
    line.strip_suffix('"').unwrap_or(line)
}

/// Find the leading `msgid ""` entry of `po`.
fn find_header(po: &str) -> Option<Header> {
    let mut end = 0;
    let mut seen_msgid = false;
    let mut in_msgstr = false;
    let mut text = String::new();
    for line in po.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            if seen_msgid {
                break;
            }
        } else if !seen_msgid {
            if trimmed != r#"msgid """# {
                return None;
            }
            seen_msgid = true;
        } else if let Some(rest) = trimmed.strip_prefix("msgstr ") {
            in_msgstr = true;
            text.push_str(unquote(rest.trim()));
        } else if trimmed.starts_with('"') {
            if !in_msgstr && trimmed != r#""""# {
                // A multi-line msgid: this is a regular message.
                return None;
            }
            text.push_str(unquote(trimmed));
        } else {
            break;
        }
        end += line.len();
    }
    if !in_msgstr {
        return None;
    }
    let keys = text
        .split("\\n")
        .filter_map(|line| line.split_once(':'))
        .map(|(key, _)| String::from(key))
        .collect();
    Some(Header { end, keys })
}

/// The required header fields missing from the PO text `po`.
pub fn missing_header_keys(po: &str) -> Vec<&'static str> {
    let present = find_header(po).map(|header| header.keys).unwrap_or_default();
    REQUIRED_HEADER_KEYS
        .iter()
        .copied()
        .filter(|key| !present.iter().any(|present| present == key))
        .collect()
}

fn header_line(key: &str, value: &str) -> String {
    let value = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{key}: {value}\\n\"\n")
}

/// Header values used for fields missing from a downloaded catalog.
pub fn default_header(project_title: &str, locale: &str) -> Vec<(&'static str, String)> {
    let now = chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    vec![
        ("Project-Id-Version", String::from(project_title)),
        ("POT-Creation-Date", now.clone()),
        ("PO-Revision-Date", now),
        ("Language-Team", String::new()),
        ("MIME-Version", String::from("1.0")),
        ("Content-Type", String::from("text/plain; charset=UTF-8")),
        ("Content-Transfer-Encoding", String::from("8bit")),
        ("Language", String::from(locale)),
        ("Plural-Forms", String::from("nplurals=1; plural=0;")),
    ]
}

/// Add the fields of `defaults` missing from the header of `po`.
///
/// A file without a header entry gets one holding all of `defaults`.
pub fn complete_header(po: &str, defaults: &[(&str, String)]) -> String {
    let Some(header) = find_header(po) else {
        let mut text = String::from("msgid \"\"\nmsgstr \"\"\n");
        for (key, value) in defaults {
            text.push_str(&header_line(key, value));
        }
        text.push('\n');
        text.push_str(po);
        return text;
    };
    let mut text = String::from(&po[..header.end]);
    if !text.ends_with('\n') {
        text.push('\n');
    }
    for (key, value) in defaults {
        if !header.keys.iter().any(|present| present == key) {
            text.push_str(&header_line(key, value));
        }
    }
    text.push_str(&po[header.end..]);
    text
}

/// Parse the PO file at `path`.
///
/// Files with an incomplete header are rejected.
pub fn parse_catalog(path: &Path) -> anyhow::Result<Catalog> {
    let po = fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    let missing = missing_header_keys(&po);
    if !missing.is_empty() {
        bail!(
            "{} lacks the PO header fields {}",
            path.display(),
            missing.join(", ")
        );
    }
    po_file::parse(path)
        .map_err(|err| anyhow!("{err}"))
        .with_context(|| format!("Could not parse {} as PO file", path.display()))
}
