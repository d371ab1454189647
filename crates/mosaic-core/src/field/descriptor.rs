use crate::{
    config::EngineConfig,
    error::{ErrorClass, ErrorOrigin, InternalError},
    field::rules::Rule,
    types::Truename,
    value::ValueKind,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};
use thiserror::Error as ThisError;

///
/// StorageKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// Value lives in a dedicated table keyed by entity locator + langcode.
    External,

    /// Value lives as a column on the owning entity's own row.
    Inline,
}

///
/// ParamKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Bool,
    Integer,
    Text,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Text => "text",
        };
        write!(f, "{s}")
    }
}

///
/// ParamValue
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamValue {
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl ParamValue {
    #[must_use]
    pub const fn kind(&self) -> ParamKind {
        match self {
            Self::Bool(_) => ParamKind::Bool,
            Self::Integer(_) => ParamKind::Integer,
            Self::Text(_) => ParamKind::Text,
        }
    }
}

///
/// ParamSpec
///
/// Schema entry for one configurable parameter of a field type.
///

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParamSpec {
    pub kind: ParamKind,
    pub default: Option<ParamValue>,
    pub required: bool,
}

impl ParamSpec {
    #[must_use]
    pub const fn optional(kind: ParamKind) -> Self {
        Self {
            kind,
            default: None,
            required: false,
        }
    }

    #[must_use]
    pub const fn with_default(kind: ParamKind, default: ParamValue) -> Self {
        Self {
            kind,
            default: Some(default),
            required: false,
        }
    }
}

///
/// ParameterError
///

#[derive(Debug, ThisError)]
pub enum ParameterError {
    #[error("missing required parameter '{name}'")]
    Missing { name: String },

    #[error("parameter '{name}' must be a {expected}")]
    WrongKind { name: String, expected: ParamKind },
}

impl From<ParameterError> for InternalError {
    fn from(err: ParameterError) -> Self {
        Self::new(ErrorClass::Validation, ErrorOrigin::Field, err.to_string())
    }
}

///
/// ConfigSchema
///
/// Parameter-name -> spec map a field type exposes to the admin UI. Raw
/// configuration is extracted against this schema; unknown keys are dropped,
/// missing keys take their default.
///

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConfigSchema(BTreeMap<String, ParamSpec>);

impl ConfigSchema {
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = (&'static str, ParamSpec)>) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(name, spec)| (name.to_string(), spec))
                .collect(),
        )
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamSpec)> {
        self.0.iter()
    }

    /// Extract configured parameters from raw admin input.
    pub fn extract(
        &self,
        raw: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<FieldParameters, ParameterError> {
        let mut params = BTreeMap::new();

        for (name, spec) in &self.0 {
            let value = match raw.get(name) {
                Some(serde_json::Value::Null) | None => spec.default.clone(),
                Some(raw_value) => Some(coerce_param(name, spec.kind, raw_value)?),
            };

            match value {
                Some(value) => {
                    params.insert(name.clone(), value);
                }
                None if spec.required => {
                    return Err(ParameterError::Missing { name: name.clone() });
                }
                None => {}
            }
        }

        Ok(FieldParameters(params))
    }
}

fn coerce_param(
    name: &str,
    kind: ParamKind,
    raw: &serde_json::Value,
) -> Result<ParamValue, ParameterError> {
    let wrong_kind = || ParameterError::WrongKind {
        name: name.to_string(),
        expected: kind,
    };

    match (kind, raw) {
        (ParamKind::Bool, serde_json::Value::Bool(b)) => Ok(ParamValue::Bool(*b)),
        (ParamKind::Integer, serde_json::Value::Number(n)) => {
            n.as_i64().map(ParamValue::Integer).ok_or_else(wrong_kind)
        }
        (ParamKind::Text, serde_json::Value::String(s)) => Ok(ParamValue::Text(s.clone())),
        _ => Err(wrong_kind()),
    }
}

///
/// FieldParameters
///
/// Parameters of one field definition, already validated against the type's
/// config schema.
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct FieldParameters(BTreeMap<String, ParamValue>);

impl FieldParameters {
    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.0.get(name) {
            Some(ParamValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_integer(&self, name: &str) -> Option<i64> {
        match self.0.get(name) {
            Some(ParamValue::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_text(&self, name: &str) -> Option<&str> {
        match self.0.get(name) {
            Some(ParamValue::Text(s)) => Some(s),
            _ => None,
        }
    }
}

///
/// ColumnSpec
///
/// Physical column shape for an Inline field, derived from the configured
/// parameters. Consumed by the (external) migration layer; this engine only
/// guarantees the contract.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
    pub nullable: bool,
}

///
/// ColumnKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    BigInt,
    Bool,
    Double,
    Text,
    Timestamp,
    Varchar(u32),
}

/// Builds the rule set for a definition from its configured parameters.
pub type RuleBuilder = fn(&FieldParameters, &EngineConfig) -> Vec<Rule>;

///
/// FieldTypeDescriptor
///
/// One registered field type. Immutable once registered; adding a new field
/// type means registering a new descriptor, not subclassing anything.
///

#[derive(Clone)]
pub struct FieldTypeDescriptor {
    pub type_id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub value_kind: ValueKind,
    pub storage_kind: StorageKind,
    pub searchable: bool,
    /// Hook name the templating collaborator dispatches on.
    pub renderer: &'static str,
    schema: ConfigSchema,
    rule_builder: RuleBuilder,
}

impl FieldTypeDescriptor {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        type_id: &'static str,
        label: &'static str,
        description: &'static str,
        value_kind: ValueKind,
        storage_kind: StorageKind,
        searchable: bool,
        renderer: &'static str,
        schema: ConfigSchema,
        rule_builder: RuleBuilder,
    ) -> Self {
        Self {
            type_id,
            label,
            description,
            value_kind,
            storage_kind,
            searchable,
            renderer,
            schema,
            rule_builder,
        }
    }

    /// Schema of configurable parameters, for the admin form layer.
    #[must_use]
    pub const fn schema(&self) -> &ConfigSchema {
        &self.schema
    }

    /// Extract configured parameters from raw admin input.
    pub fn extract_parameters(
        &self,
        raw: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<FieldParameters, ParameterError> {
        self.schema.extract(raw)
    }

    /// Build the validation rule set for a definition of this type.
    #[must_use]
    pub fn rules(&self, params: &FieldParameters, config: &EngineConfig) -> Vec<Rule> {
        (self.rule_builder)(params, config)
    }

    /// Translate configured parameters into physical column shapes.
    ///
    /// Only meaningful for Inline kinds; the registry gates access.
    #[must_use]
    pub fn columns(&self, field_id: &Truename, params: &FieldParameters) -> Vec<ColumnSpec> {
        let required = params.get_bool("required").unwrap_or(false);
        let kind = match self.value_kind {
            ValueKind::Bool => ColumnKind::Bool,
            ValueKind::Float64 => ColumnKind::Double,
            ValueKind::Int | ValueKind::Uint => ColumnKind::BigInt,
            ValueKind::Timestamp => ColumnKind::Timestamp,
            ValueKind::Text => params.get_integer("max").map_or(ColumnKind::Text, |max| {
                ColumnKind::Varchar(u32::try_from(max.max(1)).unwrap_or(u32::MAX))
            }),
        };

        vec![ColumnSpec {
            name: format!("{field_id}_value"),
            kind,
            nullable: !required,
        }]
    }
}

impl fmt::Debug for FieldTypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldTypeDescriptor")
            .field("type_id", &self.type_id)
            .field("value_kind", &self.value_kind)
            .field("storage_kind", &self.storage_kind)
            .field("searchable", &self.searchable)
            .field("renderer", &self.renderer)
            .finish_non_exhaustive()
    }
}
