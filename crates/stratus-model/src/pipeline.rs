// Data-processing pipelines on the flow plane. The `source` field holds the
// pipeline description in the platform's pipeline DSL; the client treats it
// as opaque text.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransformError;

/// A pipeline definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub name: String,
    pub source: String,
    pub description: Option<String>,
    /// JSON schema for per-instance configuration, if declared.
    pub schema: Option<Value>,
}

/// Wire shape of a pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDto {
    pub name: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

impl TryFrom<PipelineDto> for Pipeline {
    type Error = TransformError;

    fn try_from(dto: PipelineDto) -> Result<Self, Self::Error> {
        if dto.name.is_empty() {
            return Err(TransformError::MissingField { field: "name" });
        }
        Ok(Self {
            name: dto.name,
            source: dto.source,
            description: dto.description,
            schema: dto.schema,
        })
    }
}

impl From<&Pipeline> for PipelineDto {
    fn from(pipeline: &Pipeline) -> Self {
        Self {
            name: pipeline.name.clone(),
            source: pipeline.source.clone(),
            description: pipeline.description.clone(),
            schema: pipeline.schema.clone(),
        }
    }
}
