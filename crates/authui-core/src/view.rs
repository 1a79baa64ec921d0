//! Shapes a resolved flow into the data the templates render.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::PresentationConfig;
use crate::flow::{AuthFlow, FormField, MethodConfig};

/// Method blocks the UI knows how to render.
///
/// Provider methods outside this list are never promoted to a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodSlot {
    Oidc,
    Password,
}

impl MethodSlot {
    pub fn name(self) -> &'static str {
        match self {
            MethodSlot::Oidc => "oidc",
            MethodSlot::Password => "password",
        }
    }

    pub fn all() -> &'static [MethodSlot] {
        &[MethodSlot::Oidc, MethodSlot::Password]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FieldPattern {
    Exact(String),
    Prefix(String),
}

impl FieldPattern {
    fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.strip_suffix('*') {
            Some(prefix) => FieldPattern::Prefix(prefix.to_string()),
            None => FieldPattern::Exact(raw.to_string()),
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            FieldPattern::Exact(exact) => name == exact,
            FieldPattern::Prefix(prefix) => name.starts_with(prefix.as_str()),
        }
    }
}

/// Presentation priority of form fields.
///
/// A field ranks at the first pattern it matches; unmatched fields rank last.
/// Sorting is stable, so equal ranks keep the provider's order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOrder {
    patterns: Vec<FieldPattern>,
}

impl FieldOrder {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .filter(|p| !p.as_ref().trim().is_empty())
                .map(|p| FieldPattern::parse(p.as_ref()))
                .collect(),
        }
    }

    pub fn rank(&self, name: &str) -> usize {
        self.patterns
            .iter()
            .position(|p| p.matches(name))
            .unwrap_or(self.patterns.len())
    }

    pub fn sort(&self, fields: &mut [FormField]) {
        fields.sort_by_key(|field| self.rank(&field.name));
    }
}

impl Default for FieldOrder {
    fn default() -> Self {
        Self::new(&PresentationConfig::default().field_order)
    }
}

/// Human labels for field names, falling back to the raw name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldLabels(BTreeMap<String, String>);

impl FieldLabels {
    pub fn new(labels: BTreeMap<String, String>) -> Self {
        Self(labels)
    }

    pub fn label<'a>(&'a self, name: &'a str) -> &'a str {
        self.0.get(name).map_or(name, String::as_str)
    }
}

/// Request-scoped render payload: every flow attribute plus the two slots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    #[serde(flatten)]
    pub flow: AuthFlow,
    pub oidc: Option<MethodConfig>,
    pub password: Option<MethodConfig>,
}

impl ViewModel {
    #[cfg(test)]
    pub(crate) fn slot(&self, slot: MethodSlot) -> Option<&MethodConfig> {
        match slot {
            MethodSlot::Oidc => self.oidc.as_ref(),
            MethodSlot::Password => self.password.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewModelBuilder {
    order: FieldOrder,
}

impl ViewModelBuilder {
    pub fn new(order: FieldOrder) -> Self {
        Self { order }
    }

    pub fn from_config(config: &PresentationConfig) -> Self {
        Self::new(FieldOrder::new(&config.field_order))
    }

    /// Orders the password form and resolves the method slots.
    pub fn build(&self, mut flow: AuthFlow) -> ViewModel {
        if let Some(config) = flow
            .methods
            .get_mut(MethodSlot::Password.name())
            .and_then(|m| m.config.as_mut())
        {
            self.order.sort(&mut config.fields);
        }

        // Slots win over same-named top-level attributes.
        for slot in MethodSlot::all() {
            flow.extra.remove(slot.name());
        }

        let oidc = slot_config(&flow, MethodSlot::Oidc);
        let password = slot_config(&flow, MethodSlot::Password);

        ViewModel {
            flow,
            oidc,
            password,
        }
    }
}

/// A slot shows its method only while no other method is active, so a failed
/// submission re-renders just the form the user filled in.
fn slot_config(flow: &AuthFlow, slot: MethodSlot) -> Option<MethodConfig> {
    match flow.active_method() {
        Some(active) if active != slot.name() => None,
        _ => flow.method_config(slot.name()).cloned(),
    }
}
