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

//! Helpers for content and translation workflows of Grow pods.
//!
//! A pod is a static site directory with a `podspec.yaml` at its root.
//! The modules here keep pod collections in sync with a Contentful
//! space, extract translatable messages into gettext catalogs and
//! exchange those catalogs with Google Translator Toolkit.
//!
//! The supplied binaries are `grow-contentful`, `grow-extract` and
//! `grow-gtt`.

pub mod catalog;
pub mod contentful;
pub mod entry;
pub mod extract;
pub mod fields;
pub mod messages;
pub mod pod;
pub mod podspec;
pub mod preprocessor;
pub mod sync;
pub mod translator;
