//! Canonical field dictionary.
//!
//! An ordered map from canonical field name to its known synonyms:
//!
//! ```json
//! { "Nombre": ["Nombre completo", "Nombre y apellidos"], "DNI": ["D.N.I."] }
//! ```
//!
//! Insertion order is kept and is the order the resolver scores keys in.
//! The dictionary only grows through explicit calls; resolving a candidate
//! never writes to it.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dictionary(IndexMap<String, Vec<String>>);

impl Dictionary {
    pub fn new() -> Self {
        Dictionary::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Canonical keys, in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn synonyms(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Add a canonical field with no synonyms. An existing field keeps its
    /// synonyms; returns whether anything was added.
    pub fn insert_field(&mut self, field: impl Into<String>) -> bool {
        let field = field.into();
        if self.0.contains_key(&field) {
            return false;
        }
        self.0.insert(field, Vec::new());
        true
    }

    /// Record `synonym` under `field`, creating the field if needed. Returns
    /// whether the dictionary changed.
    pub fn add_synonym(&mut self, field: impl Into<String>, synonym: impl Into<String>) -> bool {
        let synonym = synonym.into();
        let list = self.0.entry(field.into()).or_default();
        if list.contains(&synonym) {
            return false;
        }
        list.push(synonym);
        true
    }

    /// The canonical field `name` stands for, if it is a key or a listed
    /// synonym. Exact match only.
    pub fn canonical_for(&self, name: &str) -> Option<&str> {
        if let Some((key, _)) = self.0.get_key_value(name) {
            return Some(key);
        }
        self.0.iter().find(|(_, syns)| syns.iter().any(|s| s == name)).map(|(k, _)| k.as_str())
    }
}

/// Where a dictionary lives between runs.
pub trait DictionaryStore {
    /// Load the stored dictionary. A missing or unreadable store is an empty
    /// dictionary.
    fn load(&self) -> Dictionary;

    fn save(&self, dictionary: &Dictionary) -> Result<()>;
}

/// A pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonDictionaryStore {
    path: PathBuf,
}

impl Default for JsonDictionaryStore {
    fn default() -> Self {
        JsonDictionaryStore::new("campos.json")
    }
}

impl JsonDictionaryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonDictionaryStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DictionaryStore for JsonDictionaryStore {
    fn load(&self) -> Dictionary {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Dictionary::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "dictionary unreadable, starting empty");
                return Dictionary::new();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(dictionary) => dictionary,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "dictionary malformed, starting empty");
                Dictionary::new()
            }
        }
    }

    /// Written to a sibling temp file first and renamed over the target, so a
    /// reader never sees a half-written dictionary.
    fn save(&self, dictionary: &Dictionary) -> Result<()> {
        let json = serde_json::to_string_pretty(dictionary)
            .map_err(|source| Error::Encode { what: "dictionary", source })?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| Error::io(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| Error::io(&self.path, e))?;
        tracing::debug!(path = %self.path.display(), fields = dictionary.len(), "dictionary saved");
        Ok(())
    }
}
