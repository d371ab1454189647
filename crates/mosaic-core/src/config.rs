use crate::types::Langcode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

///
/// EngineConfig
///
/// Global settings supplied by the configuration collaborator and consumed by
/// rule builders and langcode validation. Deserializable so the hosting
/// application can load it from whatever config layer it runs.
///

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Language used when a caller does not select one.
    pub default_langcode: Langcode,

    /// Languages content may be translated into.
    pub langcodes: Vec<Langcode>,

    /// File-type category -> permitted extensions, consumed by the `file`
    /// field type's rule builder.
    pub file_types: BTreeMap<String, Vec<String>>,
}

impl EngineConfig {
    /// Permitted extensions for a file-type category, if configured.
    #[must_use]
    pub fn file_extensions(&self, category: &str) -> Option<&[String]> {
        self.file_types.get(category).map(Vec::as_slice)
    }

    /// True if the langcode is the default or a configured translation.
    #[must_use]
    pub fn knows_langcode(&self, code: &Langcode) -> bool {
        *code == self.default_langcode || self.langcodes.contains(code)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        let en = Langcode::new("en").expect("static langcode");
        let file_types = BTreeMap::from([
            (
                "image".to_string(),
                ["png", "gif", "jpg", "jpeg", "webp", "svg"]
                    .map(String::from)
                    .to_vec(),
            ),
            (
                "file".to_string(),
                ["pdf", "doc", "ppt", "xls", "dwg", "zip"]
                    .map(String::from)
                    .to_vec(),
            ),
            (
                "media".to_string(),
                ["mp4", "mp3", "webm"].map(String::from).to_vec(),
            ),
        ]);

        Self {
            default_langcode: en.clone(),
            langcodes: vec![en],
            file_types,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_knows_its_own_langcode() {
        let config = EngineConfig::default();
        assert!(config.knows_langcode(&Langcode::new("en").unwrap()));
        assert!(!config.knows_langcode(&Langcode::new("fr").unwrap()));
    }

    #[test]
    fn file_extensions_by_category() {
        let config = EngineConfig::default();
        assert!(config.file_extensions("image").unwrap().contains(&"png".to_string()));
        assert!(config.file_extensions("nope").is_none());
    }
}
