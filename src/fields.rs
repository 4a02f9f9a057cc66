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

//! Field values of remote entries and their normalized form.

use indexmap::IndexMap;
use serde_json::Value;

/// Normalized document fields, in the order they were received.
pub type Fields = IndexMap<String, Value>;

/// A field value as delivered by the content-management system.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A linked media asset.
    Asset { url: String },
    /// A link to another entry.
    Entry { id: String },
    /// A sequence of values, possibly nested.
    List(Vec<FieldValue>),
    /// Anything else: strings, numbers, booleans, objects.
    Scalar(Value),
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Scalar(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Scalar(Value::String(String::from(value)))
    }
}

/// Flatten a field value into something that can be written to a
/// document.
///
/// Assets are replaced by their URL and entry links by the linked
/// entry's identifier. Lists are normalized element by element.
///
/// # Examples
///
/// ```
/// use grow_helpers::fields::{normalize_field, FieldValue};
/// use serde_json::json;
///
/// let value = FieldValue::List(vec![
///     FieldValue::Asset { url: "//img/a.png".into() },
///     FieldValue::List(vec![FieldValue::Entry { id: "e1".into() }, "x".into()]),
/// ]);
/// assert_eq!(normalize_field(value), json!(["//img/a.png", ["e1", "x"]]));
/// ```
pub fn normalize_field(value: FieldValue) -> Value {
    match value {
        FieldValue::Asset { url } => Value::String(url),
        FieldValue::Entry { id } => Value::String(id),
        FieldValue::List(items) => Value::Array(items.into_iter().map(normalize_field).collect()),
        FieldValue::Scalar(value) => value,
    }
}
