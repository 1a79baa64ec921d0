//! Self-service flow payloads as returned by Kratos.
//!
//! Only the attributes the UI acts on are typed. Everything else the provider
//! sends is kept in `extra` maps so it reaches the templates untouched.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Which self-service flow a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowKind {
    Login,
    Registration,
}

impl FlowKind {
    /// Path segment, template name and log label for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            FlowKind::Login => "login",
            FlowKind::Registration => "registration",
        }
    }

    /// Browser endpoint that starts a new flow of this kind.
    pub fn browser_path(self) -> String {
        format!("/self-service/{}/browser", self.as_str())
    }

    /// Admin endpoint that looks up an existing flow of this kind.
    pub fn lookup_path(self) -> String {
        format!("/self-service/{}/flows", self.as_str())
    }

    #[cfg(test)]
    pub(crate) fn all() -> &'static [FlowKind] {
        &[FlowKind::Login, FlowKind::Registration]
    }
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque flow identifier taken from the `flow` query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowId(String);

impl FlowId {
    /// Builds a flow id from every value the `flow` parameter carried.
    ///
    /// Exactly one non-blank value is a usable id and is kept as sent. No
    /// value, a blank value, or a repeated parameter all mean the caller has
    /// no flow yet.
    pub fn from_query_values<'a, I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut values = values.into_iter();
        let first = values.next()?;
        if values.next().is_some() {
            return None;
        }
        (!first.trim().is_empty()).then(|| Self(first.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot of a login or registration flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthFlow {
    /// Method the user last submitted, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<String>,
    #[serde(default, deserialize_with = "methods_or_empty")]
    pub methods: BTreeMap<String, AuthMethod>,
    /// id, type, expires_at, issued_at, request_url, messages, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AuthFlow {
    /// The active method, treating an empty name as unset.
    pub fn active_method(&self) -> Option<&str> {
        self.active.as_deref().filter(|a| !a.is_empty())
    }

    pub fn method_config(&self, name: &str) -> Option<&MethodConfig> {
        self.methods.get(name)?.config.as_ref()
    }
}

/// One way of authenticating within a flow (password, oidc, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthMethod {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<MethodConfig>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Form description for a single method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: Vec<FormField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<UiMessage>>,
    /// Method specific hints, e.g. the OIDC provider list
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub messages: Vec<UiMessage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Info or validation message attached to a flow, method or field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reads an explicit `null` the same as a missing attribute.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Like [`null_as_default`], and drops methods whose entry is `null`.
fn methods_or_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, AuthMethod>, D::Error>
where
    D: Deserializer<'de>,
{
    let methods: Option<BTreeMap<String, Option<AuthMethod>>> =
        Option::deserialize(deserializer)?;
    Ok(methods
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(name, method)| Some((name, method?)))
        .collect())
}
