//! Persona reference data and its lookup seam.

use serde::{Deserialize, Serialize};

/// Role-playing persona selected by a role key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    /// Instruction prepended as the `system` turn. Empty means none.
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub voice: String,
}

impl Persona {
    pub fn new(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        voice: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
            voice: voice.into(),
        }
    }

    /// The system instruction, if the persona defines one.
    pub fn system_instruction(&self) -> Option<&str> {
        let prompt = self.system_prompt.trim();
        (!prompt.is_empty()).then_some(self.system_prompt.as_str())
    }
}

/// Read-only persona lookup.
pub trait PersonaRegistry: Send + Sync {
    fn lookup(&self, key: &str) -> Option<Persona>;

    /// Keys known to the registry, sorted.
    fn keys(&self) -> Vec<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_prompt_is_not_an_instruction() {
        let persona = Persona::new("plain", "   ", "default");
        assert_eq!(persona.system_instruction(), None);

        let persona = Persona::new("mentor", "Be patient.", "mentor");
        assert_eq!(persona.system_instruction(), Some("Be patient."));
    }
}
