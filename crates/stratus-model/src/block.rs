// Computation blocks composable into pipelines. Custom blocks are
// registered on the flow plane with a DSL source; built-in blocks ship with
// the platform and have no source.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransformError;

/// A pipeline building block.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub name: String,
    pub block_type: BlockType,
    /// DSL source for custom blocks; `None` for built-ins.
    pub source: Option<String>,
    /// JSON schema describing the block's options.
    pub schema: Value,
}

/// Where a block can sit in a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Producer,
    Consumer,
    ProducerConsumer,
}

/// Wire shape of a block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockDto {
    pub name: String,
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub schema: Value,
}

impl TryFrom<BlockDto> for Block {
    type Error = TransformError;

    fn try_from(dto: BlockDto) -> Result<Self, Self::Error> {
        let block_type = match dto.block_type.as_str() {
            "producer" => BlockType::Producer,
            "consumer" => BlockType::Consumer,
            "producer_consumer" => BlockType::ProducerConsumer,
            other => {
                return Err(TransformError::UnknownValue {
                    field: "type",
                    value: other.to_owned(),
                });
            }
        };

        Ok(Self {
            name: dto.name,
            block_type,
            source: dto.source,
            schema: dto.schema,
        })
    }
}

impl From<&Block> for BlockDto {
    fn from(block: &Block) -> Self {
        Self {
            name: block.name.clone(),
            block_type: match block.block_type {
                BlockType::Producer => "producer",
                BlockType::Consumer => "consumer",
                BlockType::ProducerConsumer => "producer_consumer",
            }
            .to_owned(),
            source: block.source.clone(),
            schema: block.schema.clone(),
        }
    }
}
