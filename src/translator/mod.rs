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

//! This file contains the main logic used by the binary `grow-gtt`.
//!
//! Locale catalogs are uploaded to Google Translator Toolkit as
//! translation documents, and translated documents are downloaded back
//! into the pod.

pub mod gtt;

use std::cell::OnceCell;

use anyhow::{anyhow, Context};
use log::info;
use polib::catalog::Catalog;

use crate::catalog::{complete_header, default_header, parse_catalog};
use crate::extract::catalog_path;
use crate::pod::Pod;
use crate::podspec::TranslatorConfig;
use gtt::{AccessLevel, DocumentService, Gtt, NewDocument};

pub const DEFAULT_PROJECT_TITLE: &str = "Untitled Grow Project";
const CATALOG_MIMETYPE: &str = "text/x-gettext-translation";
const EDIT_URL_FORMAT: &str = "https://translate.google.com/toolkit/workbench?did=";

/// The URL for editing the translation document `document_id`.
pub fn edit_url(document_id: &str) -> String {
    format!("{EDIT_URL_FORMAT}{}", urlencoding::encode(document_id))
}

/// Map a source locale to the language code expected by the service.
///
/// ```
/// use grow_helpers::translator::normalize_source_lang;
///
/// assert_eq!(normalize_source_lang(None), "en");
/// assert_eq!(normalize_source_lang(Some("en_US")), "en");
/// assert_eq!(normalize_source_lang(Some("de")), "de");
/// ```
pub fn normalize_source_lang(source_lang: Option<&str>) -> String {
    match source_lang.map(str::to_lowercase) {
        None => String::from("en"),
        Some(lang) if lang == "en_us" => String::from("en"),
        Some(lang) => lang,
    }
}

/// A catalog uploaded for translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedCatalog {
    pub locale: String,
    pub document_id: String,
    pub edit_url: String,
}

pub struct GoogleTranslatorToolkitTranslator {
    config: TranslatorConfig,
    access_token: String,
    gtt: OnceCell<Gtt>,
}

impl GoogleTranslatorToolkitTranslator {
    /// The `service` of the translator in `podspec.yaml`.
    pub const KIND: &'static str = "google_translator_toolkit";

    pub fn new(config: TranslatorConfig, access_token: impl Into<String>) -> Self {
        GoogleTranslatorToolkitTranslator {
            config,
            access_token: access_token.into(),
            gtt: OnceCell::new(),
        }
    }

    fn gtt(&self) -> &Gtt {
        self.gtt.get_or_init(|| Gtt::new(self.access_token.clone()))
    }

    fn project_title(&self) -> &str {
        self.config
            .project_title
            .as_deref()
            .unwrap_or(DEFAULT_PROJECT_TITLE)
    }

    /// Upload the PO `content` of the catalog for `locale`.
    pub fn upload_catalog(
        &self,
        locale: &str,
        content: &[u8],
        source_lang: Option<&str>,
    ) -> anyhow::Result<UploadedCatalog> {
        self.upload_catalog_with(self.gtt(), locale, content, source_lang)
    }

    /// Like [`upload_catalog`](Self::upload_catalog), using `service`.
    pub fn upload_catalog_with<D: DocumentService + ?Sized>(
        &self,
        service: &D,
        locale: &str,
        content: &[u8],
        source_lang: Option<&str>,
    ) -> anyhow::Result<UploadedCatalog> {
        let name = format!("{} ({locale})", self.project_title());
        let source_lang = normalize_source_lang(source_lang);
        let document = service
            .insert_document(&NewDocument {
                name: &name,
                content,
                source_lang: &source_lang,
                lang: locale,
                mimetype: CATALOG_MIMETYPE,
                acl_emails: &self.config.acl,
            })
            .with_context(|| format!("Could not upload catalog for {locale}"))?;
        if document.id.is_empty() {
            return Err(anyhow!("No document id returned for {name}"));
        }
        info!("Uploaded {locale} -> {}", document.id);
        Ok(UploadedCatalog {
            locale: String::from(locale),
            edit_url: edit_url(&document.id),
            document_id: document.id,
        })
    }

    /// Upload the catalogs of `locales` stored in `pod`.
    pub fn upload_locales(
        &self,
        pod: &Pod,
        locales: &[String],
        source_lang: Option<&str>,
    ) -> anyhow::Result<Vec<UploadedCatalog>> {
        locales
            .iter()
            .map(|locale| {
                let content = pod.read_file(&catalog_path(locale))?;
                self.upload_catalog(locale, content.as_bytes(), source_lang)
            })
            .collect()
    }

    /// Download the translated document `document_id` into the catalog
    /// for `locale`.
    ///
    /// Header fields missing from the download are filled in.
    pub fn download_catalog(
        &self,
        pod: &Pod,
        document_id: &str,
        locale: &str,
    ) -> anyhow::Result<Catalog> {
        self.download_catalog_with(self.gtt(), pod, document_id, locale)
    }

    /// Like [`download_catalog`](Self::download_catalog), using
    /// `service`.
    pub fn download_catalog_with<D: DocumentService + ?Sized>(
        &self,
        service: &D,
        pod: &Pod,
        document_id: &str,
        locale: &str,
    ) -> anyhow::Result<Catalog> {
        let content = service
            .download_document(document_id)
            .with_context(|| format!("Could not download document {document_id}"))?;
        let content = complete_header(&content, &default_header(self.project_title(), locale));
        let pod_path = catalog_path(locale);
        pod.write_file(&pod_path, content)?;
        info!("Downloaded {document_id} -> {pod_path}");
        parse_catalog(&pod.abs_path(&pod_path))
    }

    /// Give `email` access to the document `document_id`.
    pub fn share(
        &self,
        document_id: &str,
        email: &str,
        access_level: AccessLevel,
    ) -> anyhow::Result<()> {
        self.gtt()
            .share_document(document_id, email, access_level)
            .with_context(|| format!("Could not share {document_id} with {email}"))?;
        info!("Shared {document_id} with {email}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::gtt::{GttDocument, GttError};
    use super::*;
    use crate::catalog::missing_header_keys;
    use polib::message::MessageView;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    /// Records uploads and serves a fixed download.
    #[derive(Default)]
    struct FakeService {
        uploads: RefCell<Vec<(String, String, String, Vec<String>)>>,
        download: String,
    }

    impl DocumentService for FakeService {
        fn insert_document(&self, document: &NewDocument) -> gtt::Result<GttDocument> {
            self.uploads.borrow_mut().push((
                String::from(document.name),
                String::from(document.source_lang),
                String::from(document.lang),
                document.acl_emails.to_vec(),
            ));
            Ok(GttDocument {
                id: format!("doc-{}", document.lang),
                ..GttDocument::default()
            })
        }

        fn download_document(&self, document_id: &str) -> gtt::Result<String> {
            if document_id == "missing" {
                return Err(GttError::Api {
                    code: 404,
                    message: String::from("Not Found"),
                    errors: Vec::new(),
                });
            }
            Ok(self.download.clone())
        }

        fn share_document(
            &self,
            _document_id: &str,
            _email: &str,
            _access_level: AccessLevel,
        ) -> gtt::Result<GttDocument> {
            Ok(GttDocument::default())
        }
    }

    fn translator(project_title: Option<&str>) -> GoogleTranslatorToolkitTranslator {
        let config = TranslatorConfig {
            service: String::from(GoogleTranslatorToolkitTranslator::KIND),
            project_title: project_title.map(String::from),
            acl: vec![String::from("translator@example.com")],
        };
        GoogleTranslatorToolkitTranslator::new(config, "token")
    }

    #[test]
    fn test_normalize_source_lang() {
        assert_eq!(normalize_source_lang(Some("EN_us")), "en");
        assert_eq!(normalize_source_lang(Some("pt_BR")), "pt_br");
        assert_eq!(normalize_source_lang(Some("en")), "en");
    }

    #[test]
    fn test_edit_url() {
        assert_eq!(
            edit_url("abc123"),
            "https://translate.google.com/toolkit/workbench?did=abc123"
        );
    }

    #[test]
    fn test_upload_catalog() -> anyhow::Result<()> {
        let service = FakeService::default();
        let uploaded =
            translator(Some("My Site")).upload_catalog_with(&service, "de", b"", Some("en_US"))?;
        assert_eq!(
            uploaded,
            UploadedCatalog {
                locale: String::from("de"),
                document_id: String::from("doc-de"),
                edit_url: String::from("https://translate.google.com/toolkit/workbench?did=doc-de"),
            }
        );
        assert_eq!(
            service.uploads.borrow().as_slice(),
            &[(
                String::from("My Site (de)"),
                String::from("en"),
                String::from("de"),
                vec![String::from("translator@example.com")],
            )]
        );
        Ok(())
    }

    #[test]
    fn test_upload_catalog_default_title() -> anyhow::Result<()> {
        let service = FakeService::default();
        translator(None).upload_catalog_with(&service, "fr", b"", None)?;
        assert_eq!(service.uploads.borrow()[0].0, "Untitled Grow Project (fr)");
        Ok(())
    }

    fn download(po: &str, locale: &str) -> anyhow::Result<(Catalog, String)> {
        let tmpdir = tempfile::tempdir()?;
        let pod = Pod::new(tmpdir.path());
        let service = FakeService {
            download: String::from(po),
            ..FakeService::default()
        };
        let catalog =
            translator(Some("My Site")).download_catalog_with(&service, &pod, "doc", locale)?;
        let stored = pod.read_file(&catalog_path(locale))?;
        Ok((catalog, stored))
    }

    fn translations(catalog: &Catalog) -> Vec<(&str, &str)> {
        catalog
            .messages()
            .map(|msg| (msg.msgid(), msg.msgstr().unwrap_or_default()))
            .collect()
    }

    #[test]
    fn test_download_catalog() -> anyhow::Result<()> {
        let (catalog, _) = download(
            "msgid \"\"\n\
             msgstr \"\"\n\
             \"Project-Id-Version: My Site\\n\"\n\
             \"POT-Creation-Date: 2023-01-01 00:00+0000\\n\"\n\
             \"PO-Revision-Date: 2023-01-02 00:00+0000\\n\"\n\
             \"Last-Translator: Ada\\n\"\n\
             \"Language-Team: German\\n\"\n\
             \"MIME-Version: 1.0\\n\"\n\
             \"Content-Type: text/plain; charset=UTF-8\\n\"\n\
             \"Content-Transfer-Encoding: 8bit\\n\"\n\
             \"Language: de\\n\"\n\
             \"Plural-Forms: nplurals=2; plural=(n != 1);\\n\"\n\
             \n\
             msgid \"Hello\"\n\
             msgstr \"Hallo\"\n",
            "de",
        )?;
        assert_eq!(catalog.metadata.last_translator, "Ada");
        assert_eq!(catalog.metadata.language_team, "German");
        assert_eq!(translations(&catalog), vec![("Hello", "Hallo")]);
        Ok(())
    }

    #[test]
    fn test_download_catalog_completes_truncated_header() -> anyhow::Result<()> {
        let (catalog, stored) = download(
            "msgid \"\"\n\
             msgstr \"\"\n\
             \"Language: de\\n\"\n\
             \"Content-Type: text/plain; charset=UTF-8\\n\"\n\
             \n\
             msgid \"Hello\"\n\
             msgstr \"Hallo\"\n",
            "de",
        )?;
        assert!(missing_header_keys(&stored).is_empty());
        assert_eq!(catalog.metadata.project_id_version, "My Site");
        assert_eq!(catalog.metadata.language, "de");
        assert_eq!(translations(&catalog), vec![("Hello", "Hallo")]);
        Ok(())
    }

    #[test]
    fn test_download_catalog_without_header() -> anyhow::Result<()> {
        let (catalog, _) = download("msgid \"Hello\"\nmsgstr \"Bonjour\"\n", "fr")?;
        assert_eq!(catalog.metadata.language, "fr");
        assert_eq!(translations(&catalog), vec![("Hello", "Bonjour")]);
        Ok(())
    }

    #[test]
    fn test_download_catalog_api_error() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let pod = Pod::new(tmpdir.path());
        let result = translator(None).download_catalog_with(
            &FakeService::default(),
            &pod,
            "missing",
            "de",
        );
        assert!(result.is_err());
        assert!(!pod.file_exists("/translations/de/LC_MESSAGES/messages.po"));
        Ok(())
    }
}
