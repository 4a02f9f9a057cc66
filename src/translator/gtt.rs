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

//! Blocking client for the Google Translator Toolkit documents API.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use log::{debug, error};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use ureq::typestate::WithBody;
use ureq::RequestBuilder;

pub const GTT_DOCUMENTS_BASE_URL: &str = "https://www.googleapis.com/gte/v1/documents";

#[derive(Error, Debug)]
pub enum GttError {
    #[error("GTT request error {code}: {message}")]
    Api {
        code: u16,
        message: String,
        errors: Vec<ApiErrorDetail>,
    },
    #[error("HTTP error: {0}")]
    Http(#[from] ureq::Error),
    #[error("Serde error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GttError>;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    code: u16,
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

/// Turn the body of a failed request into a [`GttError::Api`], logging
/// the error and each of its details.
pub fn api_error(status: u16, body: &str) -> GttError {
    let (code, message, errors) = match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(ApiErrorResponse { error }) => (error.code, error.message, error.errors),
        Err(_) => (status, String::from(body.trim()), Vec::new()),
    };
    error!("GTT Request Error {code}: {message}");
    for detail in &errors {
        error!("{}: {}", detail.message, detail.reason);
    }
    GttError::Api {
        code,
        message,
        errors,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessLevel {
    Admin,
    ReadAndComment,
    ReadAndWrite,
    ReadOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    Add,
    Modify,
}

/// A user on the access list of a document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AclUser {
    pub email_id: Option<String>,
    pub access_level: Option<String>,
    #[serde(default)]
    pub can_reshare: bool,
}

/// A translation document as returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GttDocument {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    pub language: Option<String>,
    pub source_lang: Option<String>,
    #[serde(default)]
    pub gtt_acl: Vec<AclUser>,
}

impl GttDocument {
    /// The access list entry of `email`, if any.
    pub fn acl_user(&self, email: &str) -> Option<&AclUser> {
        self.gtt_acl
            .iter()
            .find(|user| user.email_id.as_deref() == Some(email))
    }
}

/// A document to upload.
#[derive(Debug, Clone)]
pub struct NewDocument<'a> {
    pub name: &'a str,
    pub content: &'a [u8],
    pub source_lang: &'a str,
    pub lang: &'a str,
    pub mimetype: &'a str,
    /// Users given write access.
    pub acl_emails: &'a [String],
}

impl NewDocument<'_> {
    fn to_json(&self) -> Value {
        let acl = (!self.acl_emails.is_empty()).then(|| {
            self.acl_emails
                .iter()
                .map(|email| {
                    json!({"emailId": email, "accessLevel": AccessLevel::ReadAndWrite})
                })
                .collect::<Vec<_>>()
        });
        json!({
            "displayName": self.name,
            "gttAcl": acl,
            "language": self.lang,
            "mimetype": self.mimetype,
            "sourceDocBytes": URL_SAFE.encode(self.content),
            "sourceLang": self.source_lang,
        })
    }
}

fn acl_change(
    email: &str,
    access_level: AccessLevel,
    can_reshare: bool,
    change: ChangeType,
) -> Value {
    json!({
        "gttAclChange": [{
            "accessLevel": access_level,
            "canReshare": can_reshare,
            "emailId": email,
            "type": change,
        }]
    })
}

/// The operations on translation documents.
pub trait DocumentService {
    fn insert_document(&self, document: &NewDocument) -> Result<GttDocument>;

    /// Download the translated contents of a document.
    fn download_document(&self, document_id: &str) -> Result<String>;

    /// Grant `email` access to a document, adding or modifying its
    /// access list entry.
    fn share_document(
        &self,
        document_id: &str,
        email: &str,
        access_level: AccessLevel,
    ) -> Result<GttDocument>;
}

pub struct Gtt {
    agent: ureq::Agent,
    base_url: String,
    access_token: String,
}

type Response = ureq::http::Response<ureq::Body>;

impl Gtt {
    pub fn new(access_token: impl Into<String>) -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();
        Gtt {
            agent: ureq::Agent::new_with_config(config),
            base_url: String::from(GTT_DOCUMENTS_BASE_URL),
            access_token: access_token.into(),
        }
    }

    fn document_url(&self, document_id: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(document_id))
    }

    fn authorization(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    fn read_body(mut response: Response) -> Result<String> {
        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string()?;
        if status >= 400 {
            return Err(api_error(status, &body));
        }
        Ok(body)
    }

    /// Send `body` as JSON with `request` and decode the returned
    /// document.
    fn send_json(&self, request: RequestBuilder<WithBody>, body: &Value) -> Result<GttDocument> {
        let payload = serde_json::to_string(body)?;
        let response = request
            .header("Authorization", self.authorization())
            .header("Content-Type", "application/json")
            .send(payload)?;
        Ok(serde_json::from_str(&Self::read_body(response)?)?)
    }

    pub fn get_document(&self, document_id: &str) -> Result<GttDocument> {
        let url = self.document_url(document_id);
        debug!("GET {url}");
        let response = self
            .agent
            .get(&url)
            .header("Authorization", self.authorization())
            .call()?;
        Ok(serde_json::from_str(&Self::read_body(response)?)?)
    }

    pub fn get_user_from_acl(&self, document_id: &str, email: &str) -> Result<Option<AclUser>> {
        Ok(self.get_document(document_id)?.acl_user(email).cloned())
    }

    pub fn update_acl(
        &self,
        document_id: &str,
        email: &str,
        access_level: AccessLevel,
        can_reshare: bool,
        update: bool,
    ) -> Result<GttDocument> {
        let change = if update {
            ChangeType::Modify
        } else {
            ChangeType::Add
        };
        let body = acl_change(email, access_level, can_reshare, change);
        let url = self.document_url(document_id);
        debug!("PUT {url}");
        self.send_json(self.agent.put(&url), &body)
    }
}

impl DocumentService for Gtt {
    fn insert_document(&self, document: &NewDocument) -> Result<GttDocument> {
        debug!("POST {}", self.base_url);
        self.send_json(self.agent.post(&self.base_url), &document.to_json())
    }

    fn download_document(&self, document_id: &str) -> Result<String> {
        let url = self.document_url(document_id);
        debug!("GET {url}");
        let response = self
            .agent
            .get(&url)
            .header("Authorization", self.authorization())
            .query("alt", "media")
            .query("downloadContent", "true")
            .call()?;
        Self::read_body(response)
    }

    fn share_document(
        &self,
        document_id: &str,
        email: &str,
        access_level: AccessLevel,
    ) -> Result<GttDocument> {
        let in_acl = self.get_user_from_acl(document_id, email)?.is_some();
        self.update_acl(document_id, email, access_level, true, in_acl)
    }
}
