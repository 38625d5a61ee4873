//! Attribute schemas and configuration validation

use serde_json::Value;
use std::collections::BTreeMap;

use crate::diag::{Diagnostic, Diagnostics};
use crate::resource_data::ResourceData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    String,
    /// Map of string to string.
    Map,
}

impl AttrKind {
    fn name(self) -> &'static str {
        match self {
            AttrKind::String => "string",
            AttrKind::Map => "map of strings",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            AttrKind::String => value.is_string(),
            AttrKind::Map => value
                .as_object()
                .is_some_and(|map| map.values().all(Value::is_string)),
        }
    }
}

/// Value check run after the type check passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validator {
    /// Inclusive bounds on the string length in characters.
    StringLenBetween { min: usize, max: usize },
}

pub fn string_len_between(min: usize, max: usize) -> Validator {
    Validator::StringLenBetween { min, max }
}

impl Validator {
    fn check(&self, name: &str, value: &Value) -> Option<Diagnostic> {
        match self {
            Validator::StringLenBetween { min, max } => {
                let len = value.as_str()?.chars().count();
                (len < *min || len > *max).then(|| {
                    Diagnostic::error("Invalid attribute value")
                        .with_attribute(name)
                        .with_detail(format!(
                            "expected length of {name} to be in the range ({min} - {max}), got {len}"
                        ))
                })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub kind: AttrKind,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    /// Changing the value replaces the resource.
    pub force_new: bool,
    pub default: Option<Value>,
    pub description: &'static str,
    pub validator: Option<Validator>,
}

impl Attribute {
    fn of(kind: AttrKind) -> Self {
        Self {
            kind,
            required: false,
            optional: false,
            computed: false,
            force_new: false,
            default: None,
            description: "",
            validator: None,
        }
    }

    pub fn string() -> Self {
        Self::of(AttrKind::String)
    }

    pub fn map() -> Self {
        Self::of(AttrKind::Map)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn validate_with(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    attributes: BTreeMap<&'static str, Attribute>,
    exactly_one_of: Vec<&'static str>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(mut self, name: &'static str, attribute: Attribute) -> Self {
        self.attributes.insert(name, attribute);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&'static str, &Attribute)> {
        self.attributes.iter().map(|(name, attr)| (*name, attr))
    }

    /// Read-only copy for a data source: every attribute becomes computed.
    pub fn for_data_source(&self) -> Self {
        let attributes = self
            .attributes
            .iter()
            .map(|(name, attr)| {
                let attr = Attribute {
                    required: false,
                    optional: false,
                    computed: true,
                    force_new: false,
                    default: None,
                    validator: None,
                    ..attr.clone()
                };
                (*name, attr)
            })
            .collect();
        Self {
            attributes,
            exactly_one_of: Vec::new(),
        }
    }

    /// Makes `names` configurable and requires exactly one of them.
    pub fn with_exactly_one_of(mut self, names: &[&'static str]) -> Self {
        for name in names {
            if let Some(attr) = self.attributes.get_mut(name) {
                attr.optional = true;
            }
        }
        self.exactly_one_of = names.to_vec();
        self
    }

    pub fn validate(&self, data: &ResourceData) -> Diagnostics {
        let mut diags = Diagnostics::new();

        for key in data.values().keys() {
            if data.get(key).is_some() && !self.attributes.contains_key(key.as_str()) {
                diags.push(
                    Diagnostic::error("Unsupported argument")
                        .with_attribute(key.as_str())
                        .with_detail(format!("An argument named {key:?} is not expected here.")),
                );
            }
        }

        for (name, attr) in &self.attributes {
            let Some(value) = data.get(name) else {
                if attr.required {
                    diags.push(
                        Diagnostic::error("Missing required argument")
                            .with_attribute(*name)
                            .with_detail(format!(
                                "The argument {name:?} is required, but no definition was found."
                            )),
                    );
                }
                continue;
            };

            if !attr.kind.matches(value) {
                diags.push(
                    Diagnostic::error("Incorrect attribute value type")
                        .with_attribute(*name)
                        .with_detail(format!("{name} must be a {}", attr.kind.name())),
                );
                continue;
            }

            if let Some(diag) = attr.validator.as_ref().and_then(|v| v.check(name, value)) {
                diags.push(diag);
            }
        }

        if !self.exactly_one_of.is_empty() {
            let set = self
                .exactly_one_of
                .iter()
                .filter(|name| data.get(name).is_some())
                .count();
            if set != 1 {
                let names = self
                    .exactly_one_of
                    .iter()
                    .map(|name| format!("`{name}`"))
                    .collect::<Vec<_>>()
                    .join(",");
                diags.push(
                    Diagnostic::error("Invalid combination of arguments")
                        .with_detail(format!("exactly one of {names} must be specified")),
                );
            }
        }

        diags
    }

    pub fn apply_defaults(&self, data: &mut ResourceData) {
        for (name, attr) in &self.attributes {
            if let Some(default) = &attr.default
                && data.get(name).is_none()
            {
                data.plan(name, default.clone());
            }
        }
    }

    /// Changed attributes that force replacement of the resource.
    pub fn requires_replace(&self, data: &ResourceData) -> Vec<&'static str> {
        self.attributes
            .iter()
            .filter(|(name, attr)| attr.force_new && data.has_change(name))
            .map(|(name, _)| *name)
            .collect()
    }
}
