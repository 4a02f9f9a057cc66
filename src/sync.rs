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

//! Reconciliation of a local collection with remote entries.

use std::collections::HashSet;

use log::info;

use crate::entry::{parse_entry, RemoteEntry};
use crate::pod::{split_locale, DocumentStore};

/// The documents touched by [`bind_collection`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Pod paths written, in entry order.
    pub saved: Vec<String>,
    /// Pod paths deleted, sorted.
    pub deleted: Vec<String>,
}

/// Make `collection` hold exactly one document per entry of
/// `content_type`.
///
/// Matching entries are written in the order given, overwriting
/// existing documents. Documents directly in the collection which no
/// longer correspond to an entry are deleted afterwards. Localized
/// variants such as `abc@de.md` are kept as long as the entry `abc`
/// exists. Entries of other content types are ignored.
///
/// The first failing write or delete aborts the run. Work done up to
/// that point is kept.
pub fn bind_collection<S: DocumentStore + ?Sized>(
    entries: &[RemoteEntry],
    store: &mut S,
    collection: &str,
    content_type: &str,
) -> anyhow::Result<SyncReport> {
    let existing_paths = store.list_docs(collection, false)?;

    let mut report = SyncReport::default();
    for entry in entries {
        if entry.content_type != content_type {
            continue;
        }
        let parsed = parse_entry(entry.clone());
        let pod_path =
            store.create_doc(collection, &parsed.basename, &parsed.fields, &parsed.body)?;
        info!("Saved -> {pod_path}");
        report.saved.push(pod_path);
    }

    let new_paths = report.saved.iter().collect::<HashSet<_>>();
    let new_bases = report
        .saved
        .iter()
        .map(|pod_path| split_locale(pod_path).0)
        .collect::<HashSet<_>>();
    let paths_to_delete = existing_paths
        .into_iter()
        .filter(|pod_path| match split_locale(pod_path) {
            // Localized variants follow the entry of their base.
            (base, Some(_)) => !new_bases.contains(base),
            (_, None) => !new_paths.contains(pod_path),
        })
        .collect::<Vec<_>>();
    for pod_path in paths_to_delete {
        store.delete_doc(&pod_path)?;
        info!("Deleted -> {pod_path}");
        report.deleted.push(pod_path);
    }

    Ok(report)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::fields::{FieldValue, Fields};
    use crate::pod::{join_pod_path, Document, Pod};
    use anyhow::anyhow;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::BTreeMap;

    /// A document store kept in memory.
    #[derive(Debug, Default)]
    pub(crate) struct MemoryStore {
        pub(crate) docs: BTreeMap<String, Document>,
        pub(crate) writes: usize,
        /// Pod path whose creation fails.
        pub(crate) fail_on: Option<String>,
    }

    impl MemoryStore {
        pub(crate) fn with_docs(pod_paths: &[&str]) -> Self {
            let docs = pod_paths
                .iter()
                .map(|pod_path| (String::from(*pod_path), Document::new(*pod_path)))
                .collect();
            MemoryStore {
                docs,
                ..MemoryStore::default()
            }
        }

        pub(crate) fn paths(&self) -> Vec<&str> {
            self.docs.keys().map(String::as_str).collect()
        }
    }

    impl DocumentStore for MemoryStore {
        fn list_docs(&self, collection: &str, recursive: bool) -> anyhow::Result<Vec<String>> {
            let prefix = format!("{}/", collection.trim_end_matches('/'));
            Ok(self
                .docs
                .keys()
                .filter(|pod_path| match pod_path.strip_prefix(&prefix) {
                    Some(rest) => recursive || !rest.contains('/'),
                    None => false,
                })
                .cloned()
                .collect())
        }

        fn create_doc(
            &mut self,
            collection: &str,
            basename: &str,
            fields: &Fields,
            body: &str,
        ) -> anyhow::Result<String> {
            let pod_path = join_pod_path(collection, basename);
            if self.fail_on.as_deref() == Some(pod_path.as_str()) {
                return Err(anyhow!("Could not write {pod_path}"));
            }
            let mut doc = Document::new(pod_path.clone());
            doc.inject(fields.clone(), String::from(body));
            self.docs.insert(pod_path.clone(), doc);
            self.writes += 1;
            Ok(pod_path)
        }

        fn delete_doc(&mut self, pod_path: &str) -> anyhow::Result<()> {
            self.docs
                .remove(pod_path)
                .map(|_| ())
                .ok_or_else(|| anyhow!("No document at {pod_path}"))
        }
    }

    fn post(id: &str, title: &str) -> RemoteEntry {
        RemoteEntry::new(id, "post").with_field("title", title)
    }

    #[test]
    fn test_bind_collection_creates_documents() -> anyhow::Result<()> {
        let mut store = MemoryStore::default();
        let entries = vec![
            post("a", "A"),
            post("b", "B").with_field("body", "# B"),
            RemoteEntry::new("x", "author").with_field("name", "X"),
        ];
        let report = bind_collection(&entries, &mut store, "/content/posts/", "post")?;
        assert_eq!(
            report,
            SyncReport {
                saved: vec![
                    String::from("/content/posts/a.yaml"),
                    String::from("/content/posts/b.md"),
                ],
                deleted: Vec::new(),
            }
        );
        assert_eq!(
            store.paths(),
            vec!["/content/posts/a.yaml", "/content/posts/b.md"]
        );
        let doc = &store.docs["/content/posts/b.md"];
        assert_eq!(doc.fields.get("$title"), Some(&json!("B")));
        assert_eq!(doc.body, "# B");
        Ok(())
    }

    #[test]
    fn test_bind_collection_deletes_orphans() -> anyhow::Result<()> {
        let mut store = MemoryStore::with_docs(&[
            "/content/posts/a.yaml",
            "/content/posts/old.md",
            "/content/posts/archive/kept.md",
            "/content/pages/about.md",
        ]);
        let report = bind_collection(&[post("a", "A")], &mut store, "/content/posts", "post")?;
        assert_eq!(report.deleted, vec!["/content/posts/old.md"]);
        assert_eq!(
            store.paths(),
            vec![
                "/content/pages/about.md",
                "/content/posts/a.yaml",
                "/content/posts/archive/kept.md",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_bind_collection_extension_change_replaces_document() -> anyhow::Result<()> {
        let mut store = MemoryStore::with_docs(&["/content/posts/a.md"]);
        let report = bind_collection(&[post("a", "A")], &mut store, "/content/posts", "post")?;
        assert_eq!(report.saved, vec!["/content/posts/a.yaml"]);
        assert_eq!(report.deleted, vec!["/content/posts/a.md"]);
        assert_eq!(store.paths(), vec!["/content/posts/a.yaml"]);
        Ok(())
    }

    #[test]
    fn test_bind_collection_keeps_localized_variants() -> anyhow::Result<()> {
        let mut store = MemoryStore::with_docs(&[
            "/content/posts/p1.md",
            "/content/posts/p1@de.md",
            "/content/posts/p1@fr.yaml",
            "/content/posts/gone@de.md",
        ]);
        let entries = vec![post("p1", "One").with_field("body", "Text")];
        let report = bind_collection(&entries, &mut store, "/content/posts", "post")?;
        assert_eq!(report.saved, vec!["/content/posts/p1.md"]);
        assert_eq!(report.deleted, vec!["/content/posts/gone@de.md"]);
        assert_eq!(
            store.paths(),
            vec![
                "/content/posts/p1.md",
                "/content/posts/p1@de.md",
                "/content/posts/p1@fr.yaml",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_bind_collection_is_idempotent() -> anyhow::Result<()> {
        let mut store = MemoryStore::with_docs(&["/content/posts/stale.yaml"]);
        let entries = vec![post("a", "A"), post("b", "B")];
        let first = bind_collection(&entries, &mut store, "/content/posts", "post")?;
        let paths_after_first = store.paths().join(",");
        let second = bind_collection(&entries, &mut store, "/content/posts", "post")?;
        assert_eq!(first.deleted, vec!["/content/posts/stale.yaml"]);
        assert!(second.deleted.is_empty());
        assert_eq!(second.saved, first.saved);
        assert_eq!(store.paths().join(","), paths_after_first);
        Ok(())
    }

    #[test]
    fn test_bind_collection_entry_removal_deletes_only_its_document() -> anyhow::Result<()> {
        let mut store = MemoryStore::default();
        let entries = vec![post("a", "A"), post("b", "B"), post("c", "C")];
        bind_collection(&entries, &mut store, "/content/posts", "post")?;
        let report = bind_collection(
            &[post("a", "A"), post("c", "C")],
            &mut store,
            "/content/posts",
            "post",
        )?;
        assert_eq!(report.deleted, vec!["/content/posts/b.yaml"]);
        assert_eq!(
            store.paths(),
            vec!["/content/posts/a.yaml", "/content/posts/c.yaml"]
        );
        Ok(())
    }

    #[test]
    fn test_bind_collection_other_content_types_have_no_effect() -> anyhow::Result<()> {
        let mut store = MemoryStore::with_docs(&["/content/posts/a.yaml"]);
        let entries = vec![
            post("a", "A"),
            RemoteEntry::new("z", "author").with_field("name", "Z"),
        ];
        let report = bind_collection(&entries, &mut store, "/content/posts", "post")?;
        assert_eq!(report.saved, vec!["/content/posts/a.yaml"]);
        assert!(report.deleted.is_empty());
        assert_eq!(store.writes, 1);
        Ok(())
    }

    #[test]
    fn test_bind_collection_no_matching_entries_empties_collection() -> anyhow::Result<()> {
        let mut store = MemoryStore::with_docs(&["/content/posts/a.yaml", "/content/posts/b.md"]);
        let entries = vec![RemoteEntry::new("z", "author")];
        let report = bind_collection(&entries, &mut store, "/content/posts", "post")?;
        assert!(report.saved.is_empty());
        assert_eq!(
            report.deleted,
            vec!["/content/posts/a.yaml", "/content/posts/b.md"]
        );
        assert!(store.paths().is_empty());
        Ok(())
    }

    #[test]
    fn test_bind_collection_failure_keeps_completed_work() {
        let mut store = MemoryStore::with_docs(&["/content/posts/stale.yaml"]);
        store.fail_on = Some(String::from("/content/posts/b.yaml"));
        let entries = vec![post("a", "A"), post("b", "B"), post("c", "C")];
        let result = bind_collection(&entries, &mut store, "/content/posts", "post");
        assert!(result.is_err());
        // Nothing is rolled back and nothing is deleted.
        assert_eq!(
            store.paths(),
            vec!["/content/posts/a.yaml", "/content/posts/stale.yaml"]
        );
    }

    #[test]
    fn test_bind_collection_on_pod() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let mut pod = Pod::new(tmpdir.path());
        pod.write_file("/content/posts/_blueprint.yaml", "$path: /posts/{base}/\n")?;
        pod.write_file("/content/posts/removed.md", "Gone soon")?;
        pod.write_file("/content/posts/hello@de.yaml", "$title: Hallo\n")?;

        let entries = vec![
            post("hello", "Hello").with_field(
                "cover",
                FieldValue::Asset {
                    url: String::from("//images.example.com/cover.png"),
                },
            ),
            post("world", "World").with_field("body", "Long text."),
        ];
        let report = bind_collection(&entries, &mut pod, "/content/posts/", "post")?;
        assert_eq!(report.deleted, vec!["/content/posts/removed.md"]);
        assert_eq!(
            pod.list_docs("/content/posts", false)?,
            vec![
                "/content/posts/hello.yaml",
                "/content/posts/hello@de.yaml",
                "/content/posts/world.md",
            ]
        );
        assert!(pod.file_exists("/content/posts/_blueprint.yaml"));
        assert_eq!(
            pod.read_file("/content/posts/hello.yaml")?,
            "$title: Hello\ncover: //images.example.com/cover.png\n"
        );
        assert_eq!(
            pod.read_file("/content/posts/world.md")?,
            "---\n$title: World\n---\nLong text."
        );
        Ok(())
    }
}
