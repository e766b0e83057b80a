//! Domain types and wire-format conversions for the Stratus control plane.
//!
//! Every backend resource has two shapes: the JSON **DTO** the API speaks
//! and the in-memory **domain** type the rest of the workspace works with.
//! This crate owns both and the pure mapping between them -- no I/O, no
//! transport concerns. `stratus-api` calls into these conversions after
//! unwrapping the response envelope.
//!
//! Conversions are lossless for resources the client can write back
//! (interfaces, triggers, pipelines): `to_dto` followed by `from_dto`
//! yields an equivalent domain value.

pub mod block;
pub mod device;
pub mod error;
pub mod event;
pub mod flow;
pub mod interface;
pub mod pipeline;
pub mod policy;
pub mod trigger;

pub use block::{Block, BlockDto, BlockType};
pub use device::{Device, DeviceDto, InterfaceVersion};
pub use error::TransformError;
pub use event::{DeviceEvent, EventPayload};
pub use flow::{FlowInstance, FlowInstanceDto};
pub use interface::{
    Aggregation, Interface, InterfaceDto, InterfaceKind, Mapping, MappingDto, MappingType,
    Ownership,
};
pub use pipeline::{Pipeline, PipelineDto};
pub use policy::{DeliveryPolicy, DeliveryPolicyDto, ErrorHandler, ErrorKind, RetryStrategy};
pub use trigger::{
    DataTriggerEvent, DeviceTriggerEvent, MatchOperator, SimpleTrigger, Trigger, TriggerAction,
    TriggerDto,
};
