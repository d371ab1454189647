use crate::{
    field::descriptor::{FieldParameters, StorageKind},
    field::rules::Rule,
    types::{Langcode, Truename},
    value::{Value, ValueKind},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

///
/// FieldDisplay
///
/// Display metadata (label, help text) for one language.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FieldDisplay {
    pub label: String,
    pub help: Option<String>,
}

impl FieldDisplay {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            help: None,
        }
    }

    #[must_use]
    pub fn with_help(label: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            help: Some(help.into()),
        }
    }
}

///
/// FieldDefinition
///
/// Administrator-created instance of a field type. Long-lived, process-wide
/// metadata: deleting one cascades to the removal of all its stored values
/// but must not affect sibling fields.
///

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub field_id: Truename,
    pub type_id: String,

    /// Shared across every mold rather than owned by one.
    pub is_global: bool,

    /// Reserved fields cannot be deleted by administrator action.
    pub is_reserved: bool,

    pub group_title: Option<String>,
    pub parameters: FieldParameters,

    /// Language the definition itself was authored in; display fallback
    /// target when a translation is missing.
    pub langcode: Langcode,

    /// Value returned when no stored value exists in any language.
    pub default: Option<Value>,

    display: BTreeMap<Langcode, FieldDisplay>,
}

impl FieldDefinition {
    #[must_use]
    pub fn new(
        field_id: Truename,
        type_id: impl Into<String>,
        langcode: Langcode,
        label: impl Into<String>,
    ) -> Self {
        let display = BTreeMap::from([(langcode.clone(), FieldDisplay::new(label))]);

        Self {
            field_id,
            type_id: type_id.into(),
            is_global: false,
            is_reserved: false,
            group_title: None,
            parameters: FieldParameters::default(),
            langcode,
            default: None,
            display,
        }
    }

    #[must_use]
    pub fn global(mut self) -> Self {
        self.is_global = true;
        self
    }

    #[must_use]
    pub fn reserved(mut self) -> Self {
        self.is_reserved = true;
        self
    }

    #[must_use]
    pub fn with_parameters(mut self, parameters: FieldParameters) -> Self {
        self.parameters = parameters;
        self
    }

    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    #[must_use]
    pub fn with_group(mut self, group_title: impl Into<String>) -> Self {
        self.group_title = Some(group_title.into());
        self
    }

    /// Add or replace display metadata for a language.
    pub fn set_display(&mut self, langcode: Langcode, display: FieldDisplay) {
        self.display.insert(langcode, display);
    }

    /// Display metadata in the requested language, falling back to the
    /// authoring language.
    #[must_use]
    pub fn display(&self, langcode: &Langcode) -> &FieldDisplay {
        self.display
            .get(langcode)
            .or_else(|| self.display.get(&self.langcode))
            .expect("authoring-language display is set at construction")
    }
}

///
/// ResolvedField
///
/// A field definition merged with its descriptor's metadata and with display
/// text resolved for one language. This is what `EntityMold::fields` returns
/// and what the templating collaborator consumes.
///

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResolvedField {
    pub field_id: Truename,
    pub type_id: String,
    pub label: String,
    pub help: Option<String>,
    pub group_title: Option<String>,
    pub is_global: bool,
    pub is_reserved: bool,
    pub value_kind: ValueKind,
    pub storage_kind: StorageKind,
    pub searchable: bool,
    pub renderer: String,
    pub parameters: FieldParameters,
    pub default: Option<Value>,
    pub rules: Vec<Rule>,
}
