//! The generation-provider contract.
//!
//! The provider is an external collaborator: it receives a rendered request
//! and returns narrative content plus an optional raw patch object. The core
//! only inspects the patch.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use world_model::StatePatch;

use crate::context_assembler::GenerationRequest;
use crate::conversation::ContentPart;
use crate::error::{PatchError, ProviderError};

/// What the generator produced for one turn.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutput {
    pub parts: Vec<ContentPart>,
    /// Expected to have the [`StatePatch`] shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_patch: Option<Value>,
}

impl GenerationOutput {
    /// Output with a single text part and no patch.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![ContentPart::text(text)],
            raw_patch: None,
        }
    }

    /// Attach a raw patch object.
    pub fn with_raw_patch(mut self, raw_patch: Value) -> Self {
        self.raw_patch = Some(raw_patch);
        self
    }

    /// Decode the raw patch, if one was produced.
    ///
    /// `null` counts as no patch.
    pub fn state_patch(&self) -> Result<Option<StatePatch>, PatchError> {
        match &self.raw_patch {
            None | Some(Value::Null) => Ok(None),
            Some(raw) => Ok(Some(StatePatch::deserialize(raw)?)),
        }
    }
}

/// A text-generation backend.
pub trait GenerationProvider {
    fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutput, ProviderError>;
}

impl<F> GenerationProvider for F
where
    F: Fn(&GenerationRequest) -> Result<GenerationOutput, ProviderError>,
{
    fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutput, ProviderError> {
        self(request)
    }
}
