// Block endpoints (flow plane)
//
// The platform ships a set of built-in blocks; custom blocks are
// registered per realm. Listing merges the two with built-ins winning
// name ties, and built-in names are immutable: registering over one or
// deleting one is rejected locally, without any network call.

use std::sync::LazyLock;

use serde_json::json;

use stratus_model::{Block, BlockDto, BlockType};

use crate::client::{Client, ensure_non_empty};
use crate::endpoints::encode_segment;
use crate::error::Error;

// ── Built-in blocks ──────────────────────────────────────────────────

static BUILTIN_BLOCKS: LazyLock<Vec<Block>> = LazyLock::new(|| {
    vec![
        Block {
            name: "http_source".to_owned(),
            block_type: BlockType::Producer,
            source: None,
            schema: json!({
                "type": "object",
                "required": ["base_url"],
                "properties": {
                    "base_url": { "type": "string" },
                    "target_paths": { "type": "array", "items": { "type": "string" } },
                    "polling_interval_ms": { "type": "integer", "minimum": 100 }
                }
            }),
        },
        Block {
            name: "http_sink".to_owned(),
            block_type: BlockType::Consumer,
            source: None,
            schema: json!({
                "type": "object",
                "required": ["url"],
                "properties": { "url": { "type": "string" } }
            }),
        },
        Block {
            name: "filter".to_owned(),
            block_type: BlockType::ProducerConsumer,
            source: None,
            schema: json!({
                "type": "object",
                "required": ["script"],
                "properties": { "script": { "type": "string" } }
            }),
        },
        Block {
            name: "json_mapper".to_owned(),
            block_type: BlockType::ProducerConsumer,
            source: None,
            schema: json!({
                "type": "object",
                "required": ["template"],
                "properties": { "template": { "type": "string" } }
            }),
        },
        Block {
            name: "downsampler".to_owned(),
            block_type: BlockType::ProducerConsumer,
            source: None,
            schema: json!({
                "type": "object",
                "required": ["interval_ms"],
                "properties": { "interval_ms": { "type": "integer", "minimum": 1 } }
            }),
        },
        Block {
            name: "virtual_device_pool".to_owned(),
            block_type: BlockType::Consumer,
            source: None,
            schema: json!({
                "type": "object",
                "required": ["pairing_url"],
                "properties": {
                    "pairing_url": { "type": "string" },
                    "devices": { "type": "array" }
                }
            }),
        },
    ]
});

/// The blocks bundled with the platform, available in every realm.
pub fn builtin_blocks() -> &'static [Block] {
    &BUILTIN_BLOCKS
}

fn is_builtin(name: &str) -> bool {
    BUILTIN_BLOCKS.iter().any(|block| block.name == name)
}

/// Merge server-registered blocks into the built-in list, de-duplicating
/// by name. Built-ins always win a tie.
fn merge_with_builtins(custom: Vec<Block>) -> Vec<Block> {
    let mut merged = BUILTIN_BLOCKS.clone();
    for block in custom {
        if !merged.iter().any(|existing| existing.name == block.name) {
            merged.push(block);
        }
    }
    merged
}

// ── Endpoints ────────────────────────────────────────────────────────

impl Client {
    /// List all blocks: built-ins plus the realm's custom blocks, merged
    /// and de-duplicated by name.
    ///
    /// `GET v1/{realm}/blocks`
    pub async fn list_blocks(&self) -> Result<Vec<Block>, Error> {
        let url = self.endpoints().blocks.render(&[("realm", &self.realm())]);
        let dtos: Vec<BlockDto> = self.get(&url).await?;
        let custom = dtos
            .into_iter()
            .map(Block::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(merge_with_builtins(custom))
    }

    /// Fetch one block by name. Built-in names resolve locally.
    ///
    /// `GET v1/{realm}/blocks/{blockName}`
    pub async fn get_block(&self, block_name: &str) -> Result<Block, Error> {
        ensure_non_empty(block_name, "block name")?;
        if let Some(builtin) = BUILTIN_BLOCKS.iter().find(|b| b.name == block_name) {
            return Ok(builtin.clone());
        }
        let url = self.endpoints().block.render(&[
            ("realm", &self.realm()),
            ("blockName", &encode_segment(block_name)),
        ]);
        let dto: BlockDto = self.get(&url).await?;
        Ok(Block::try_from(dto)?)
    }

    /// Register a custom block. A name colliding with a built-in is
    /// rejected before any request is made.
    ///
    /// `POST v1/{realm}/blocks`
    pub async fn register_block(&self, block: &Block) -> Result<Block, Error> {
        ensure_non_empty(&block.name, "block name")?;
        if is_builtin(&block.name) {
            return Err(Error::BlockNameConflict {
                name: block.name.clone(),
            });
        }
        let url = self.endpoints().blocks.render(&[("realm", &self.realm())]);
        let dto: BlockDto = self.post(&url, &BlockDto::from(block)).await?;
        Ok(Block::try_from(dto)?)
    }

    /// Delete a custom block. Built-ins cannot be deleted; that is
    /// rejected before any request is made.
    ///
    /// `DELETE v1/{realm}/blocks/{blockName}`
    pub async fn delete_block(&self, block_name: &str) -> Result<(), Error> {
        ensure_non_empty(block_name, "block name")?;
        if is_builtin(block_name) {
            return Err(Error::BuiltinBlock {
                name: block_name.to_owned(),
            });
        }
        let url = self.endpoints().block.render(&[
            ("realm", &self.realm()),
            ("blockName", &encode_segment(block_name)),
        ]);
        self.delete(&url).await
    }
}

// ── Tests ────────────────────────────────────────────────────────────
