//! Persona configuration: who the assistant speaks as.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Read-only persona fields supplied at process start.
///
/// Missing fields take their default values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    /// The assistant's name (e.g. "Compliance Assistant").
    pub persona_name: String,

    /// The institution operating the service.
    pub institution_name: String,

    /// Base behavioural instructions placed at the top of the system prompt.
    pub base_instructions: String,

    /// How to refer to a client whose display name is unknown.
    pub default_client_name: String,
}

impl PersonaConfig {
    /// Reject a persona with any required field empty.
    pub fn validate(&self) -> Result<(), Error> {
        let required = [
            ("persona_name", &self.persona_name),
            ("institution_name", &self.institution_name),
            ("base_instructions", &self.base_instructions),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::config(format!("persona field '{field}' is empty")));
            }
        }
        Ok(())
    }
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            persona_name: "AI Expert".into(),
            institution_name: "AI Assistant".into(),
            base_instructions: "Answer the user's question in your own words. \
                Ground the answer in the provided context when it is relevant, \
                and say so plainly when the context does not cover the question."
                .into(),
            default_client_name: "the client".into(),
        }
    }
}
