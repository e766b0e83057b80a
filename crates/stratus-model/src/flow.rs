// Flow instances: running instantiations of a pipeline with a concrete
// configuration.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransformError;

/// A running flow instance on the flow plane.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowInstance {
    pub name: String,
    /// Name of the pipeline this instance was created from.
    pub pipeline: String,
    pub config: Value,
}

/// Wire shape of a flow instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowInstanceDto {
    pub name: String,
    pub pipeline: String,
    #[serde(default)]
    pub config: Value,
}

impl TryFrom<FlowInstanceDto> for FlowInstance {
    type Error = TransformError;

    fn try_from(dto: FlowInstanceDto) -> Result<Self, Self::Error> {
        if dto.pipeline.is_empty() {
            return Err(TransformError::MissingField { field: "pipeline" });
        }
        Ok(Self {
            name: dto.name,
            pipeline: dto.pipeline,
            config: dto.config,
        })
    }
}

impl From<&FlowInstance> for FlowInstanceDto {
    fn from(flow: &FlowInstance) -> Self {
        Self {
            name: flow.name.clone(),
            pipeline: flow.pipeline.clone(),
            config: flow.config.clone(),
        }
    }
}
