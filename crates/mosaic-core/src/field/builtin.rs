//! Builtin field types.
//!
//! The original system shipped these as class-per-type plugins; here each is
//! a descriptor value registered under a stable `type_id`.

use crate::{
    config::EngineConfig,
    field::{
        descriptor::{
            ConfigSchema, FieldParameters, FieldTypeDescriptor, ParamKind, ParamSpec, ParamValue,
            StorageKind,
        },
        rules::Rule,
    },
    value::ValueKind,
};

/// All builtin descriptors, in registration order.
#[must_use]
pub fn descriptors() -> Vec<FieldTypeDescriptor> {
    vec![
        text(),
        longtext(),
        html(),
        file(),
        number(),
        toggle(),
        timestamp(),
        path_view(),
    ]
}

fn base_schema(extra: Vec<(&'static str, ParamSpec)>) -> ConfigSchema {
    let mut entries = vec![
        (
            "required",
            ParamSpec::with_default(ParamKind::Bool, ParamValue::Bool(false)),
        ),
        ("helptext", ParamSpec::optional(ParamKind::Text)),
    ];
    entries.extend(extra);

    ConfigSchema::new(entries)
}

fn base_rules(params: &FieldParameters) -> Vec<Rule> {
    let mut rules = Vec::new();
    if params.get_bool("required").unwrap_or(false) {
        rules.push(Rule::Required);
    }
    if let Some(max) = params.get_integer("max") {
        if max > 0 {
            rules.push(Rule::MaxLength(usize::try_from(max).unwrap_or(usize::MAX)));
        }
    }

    rules
}

fn text() -> FieldTypeDescriptor {
    FieldTypeDescriptor::new(
        "text",
        "Text",
        "Single-line text",
        ValueKind::Text,
        StorageKind::Inline,
        true,
        "text",
        base_schema(vec![(
            "max",
            ParamSpec::with_default(ParamKind::Integer, ParamValue::Integer(200)),
        )]),
        |params, _config| base_rules(params),
    )
}

/// Long prose body, stored in its own table rather than on the entity row.
fn longtext() -> FieldTypeDescriptor {
    FieldTypeDescriptor::new(
        "longtext",
        "Long text",
        "Multi-line text stored in a dedicated table",
        ValueKind::Text,
        StorageKind::External,
        false,
        "textarea",
        base_schema(vec![("max", ParamSpec::optional(ParamKind::Integer))]),
        |params, _config| base_rules(params),
    )
}

fn html() -> FieldTypeDescriptor {
    FieldTypeDescriptor::new(
        "html",
        "HTML",
        "Rich text rendered as markup",
        ValueKind::Text,
        StorageKind::Inline,
        true,
        "html",
        base_schema(Vec::new()),
        |params, _config| base_rules(params),
    )
}

fn file() -> FieldTypeDescriptor {
    FieldTypeDescriptor::new(
        "file",
        "File name",
        "File path with a browse button",
        ValueKind::Text,
        StorageKind::Inline,
        false,
        "file",
        base_schema(vec![
            (
                "max",
                ParamSpec::with_default(ParamKind::Integer, ParamValue::Integer(200)),
            ),
            ("file_type", ParamSpec::optional(ParamKind::Text)),
        ]),
        file_rules,
    )
}

fn file_rules(params: &FieldParameters, config: &EngineConfig) -> Vec<Rule> {
    let mut rules = base_rules(params);

    if let Some(category) = params.get_text("file_type") {
        if let Some(exts) = config.file_extensions(category) {
            rules.push(Rule::SlugPath {
                extensions: exts.to_vec(),
            });
        }
    }

    rules
}

fn number() -> FieldTypeDescriptor {
    FieldTypeDescriptor::new(
        "number",
        "Number",
        "Integer value",
        ValueKind::Int,
        StorageKind::Inline,
        false,
        "number",
        base_schema(Vec::new()),
        |params, _config| base_rules(params),
    )
}

fn toggle() -> FieldTypeDescriptor {
    FieldTypeDescriptor::new(
        "toggle",
        "Toggle",
        "On/off switch",
        ValueKind::Bool,
        StorageKind::Inline,
        false,
        "toggle",
        base_schema(Vec::new()),
        |params, _config| base_rules(params),
    )
}

fn timestamp() -> FieldTypeDescriptor {
    FieldTypeDescriptor::new(
        "timestamp",
        "Timestamp",
        "Point in time, stored as UTC epoch seconds",
        ValueKind::Timestamp,
        StorageKind::Inline,
        false,
        "timestamp",
        base_schema(Vec::new()),
        |params, _config| base_rules(params),
    )
}

/// Template path per entity path + langcode. Lives in its own table and is
/// never searchable; its `search` surface reports no matches.
fn path_view() -> FieldTypeDescriptor {
    FieldTypeDescriptor::new(
        "path_view",
        "Path view",
        "Template override for the entity's rendered path",
        ValueKind::Text,
        StorageKind::External,
        false,
        "path_view",
        base_schema(Vec::new()),
        |params, _config| {
            let mut rules = base_rules(params);
            rules.push(Rule::SlugPath {
                extensions: vec!["twig".to_string(), "html.twig".to_string()],
            });

            rules
        },
    )
}
