// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Immutable mapping from style key to instruction template

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// Token standing for "the subject depicted in the image"
pub const SUBJECT_PLACEHOLDER: &str = "[CHARACHTER]";

/// Style used when a request names none
pub const DEFAULT_STYLE: &str = "sleaze1";

const BUILTIN_CATALOG: &str = include_str!("builtin.toml");

#[derive(Debug, Error)]
pub enum StyleError {
    #[error("Failed to read style catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid style catalog: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Style catalog contains no styles")]
    Empty,

    #[error("Duplicate style key '{0}'")]
    DuplicateKey(String),

    #[error("Style '{0}' has an empty instruction")]
    EmptyInstruction(String),

    #[error("Default style '{0}' is not defined in the catalog")]
    UnknownDefault(String),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    default: Option<String>,
    #[serde(default)]
    style: Vec<StyleEntry>,
}

#[derive(Debug, Deserialize)]
struct StyleEntry {
    key: String,
    instruction: String,
}

/// One instruction template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleInstruction {
    key: String,
    template: String,
}

impl StyleInstruction {
    pub fn new(key: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            template: template.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The template exactly as written in the catalog
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn has_placeholder(&self) -> bool {
        self.template.contains(SUBJECT_PLACEHOLDER)
    }

    /// Produce the instruction text.
    ///
    /// With `None` the template is returned untouched, placeholder included;
    /// this is what the generation request carries, since the subject comes
    /// from the attached image. With a subject every placeholder is replaced.
    pub fn render(&self, subject: Option<&str>) -> Cow<'_, str> {
        match subject {
            Some(subject) if self.has_placeholder() => {
                Cow::Owned(self.template.replace(SUBJECT_PLACEHOLDER, subject))
            }
            _ => Cow::Borrowed(&self.template),
        }
    }
}

/// Read-only style catalog, built once at startup
#[derive(Debug, Clone)]
pub struct StyleCatalog {
    order: Vec<String>,
    styles: HashMap<String, StyleInstruction>,
    default_key: String,
}

impl StyleCatalog {
    /// Catalog compiled into the binary
    pub fn builtin() -> Result<Self, StyleError> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    /// Load a catalog from a TOML file on disk
    pub fn load(path: &Path) -> Result<Self, StyleError> {
        let contents = std::fs::read_to_string(path).map_err(|source| StyleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_toml_str(&contents)?;
        info!(
            "Loaded {} styles from {} (default: {})",
            catalog.len(),
            path.display(),
            catalog.default_key()
        );
        Ok(catalog)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, StyleError> {
        let file: CatalogFile = toml::from_str(contents)?;
        let default_key = file.default.unwrap_or_else(|| DEFAULT_STYLE.to_string());
        Self::from_entries(
            default_key,
            file.style.into_iter().map(|e| (e.key, e.instruction)),
        )
    }

    /// Build a catalog from `(key, template)` pairs, keeping their order
    pub fn from_entries<I, K, V>(default_key: impl Into<String>, entries: I) -> Result<Self, StyleError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut order = Vec::new();
        let mut styles = HashMap::new();

        for (key, template) in entries {
            let key = key.into();
            let template = template.into();
            if template.trim().is_empty() {
                return Err(StyleError::EmptyInstruction(key));
            }
            if styles.contains_key(&key) {
                return Err(StyleError::DuplicateKey(key));
            }
            order.push(key.clone());
            styles.insert(key.clone(), StyleInstruction::new(key, template));
        }

        if styles.is_empty() {
            return Err(StyleError::Empty);
        }

        let default_key = default_key.into();
        if !styles.contains_key(&default_key) {
            return Err(StyleError::UnknownDefault(default_key));
        }

        Ok(Self {
            order,
            styles,
            default_key,
        })
    }

    pub fn get(&self, key: &str) -> Option<&StyleInstruction> {
        self.styles.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.styles.contains_key(key)
    }

    /// Resolve a style key, falling back to the default style for unknown keys
    pub fn resolve(&self, key: &str) -> &StyleInstruction {
        match self.styles.get(key) {
            Some(style) => style,
            None => {
                debug!(
                    "Unknown style '{}', falling back to '{}'",
                    key, self.default_key
                );
                &self.styles[&self.default_key]
            }
        }
    }

    pub fn default_key(&self) -> &str {
        &self.default_key
    }

    pub fn default_style(&self) -> &StyleInstruction {
        &self.styles[&self.default_key]
    }

    /// Style keys in catalog order
    pub fn keys(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
