use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use rolechat_traits::{Persona, PersonaRegistry};
use serde::Deserialize;

/// Demo personas embedded at compile time
const BUILTIN_PERSONAS: &str = include_str!("../../assets/personas.toml");

#[derive(Debug, Deserialize)]
struct PersonaFile {
    #[serde(default)]
    personas: HashMap<String, Persona>,
}

/// Immutable in-memory persona map.
#[derive(Debug, Clone, Default)]
pub struct StaticPersonaRegistry {
    personas: HashMap<String, Persona>,
}

impl StaticPersonaRegistry {
    pub fn new(personas: HashMap<String, Persona>) -> Self {
        Self { personas }
    }

    /// The built-in demo personas.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_PERSONAS).context("Invalid built-in persona table")
    }

    /// Parse a `[personas.<key>]` table document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: PersonaFile = toml::from_str(content)?;
        Ok(Self::new(file.personas))
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read persona file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse persona file {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}

impl PersonaRegistry for StaticPersonaRegistry {
    fn lookup(&self, key: &str) -> Option<Persona> {
        self.personas.get(key).cloned()
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.personas.keys().cloned().collect();
        keys.sort();
        keys
    }
}
