// Flow-plane endpoints: pipelines and their running instances.

use stratus_model::{FlowInstance, FlowInstanceDto, Pipeline, PipelineDto};

use crate::client::{Client, ensure_non_empty};
use crate::endpoints::encode_segment;
use crate::error::Error;

impl Client {
    // ── Pipelines ────────────────────────────────────────────────────

    /// List the names of all registered pipelines.
    ///
    /// `GET v1/{realm}/pipelines`
    pub async fn list_pipelines(&self) -> Result<Vec<String>, Error> {
        let url = self.endpoints().pipelines.render(&[("realm", &self.realm())]);
        self.get(&url).await
    }

    /// Fetch one pipeline by name.
    ///
    /// `GET v1/{realm}/pipelines/{pipelineName}`
    pub async fn get_pipeline(&self, pipeline_name: &str) -> Result<Pipeline, Error> {
        ensure_non_empty(pipeline_name, "pipeline name")?;
        let url = self.endpoints().pipeline.render(&[
            ("realm", &self.realm()),
            ("pipelineName", &encode_segment(pipeline_name)),
        ]);
        let dto: PipelineDto = self.get(&url).await?;
        Ok(Pipeline::try_from(dto)?)
    }

    /// Register a pipeline.
    ///
    /// `POST v1/{realm}/pipelines`
    pub async fn register_pipeline(&self, pipeline: &Pipeline) -> Result<Pipeline, Error> {
        ensure_non_empty(&pipeline.name, "pipeline name")?;
        let url = self.endpoints().pipelines.render(&[("realm", &self.realm())]);
        let dto: PipelineDto = self.post(&url, &PipelineDto::from(pipeline)).await?;
        Ok(Pipeline::try_from(dto)?)
    }

    /// Delete a pipeline by name.
    ///
    /// `DELETE v1/{realm}/pipelines/{pipelineName}`
    pub async fn delete_pipeline(&self, pipeline_name: &str) -> Result<(), Error> {
        ensure_non_empty(pipeline_name, "pipeline name")?;
        let url = self.endpoints().pipeline.render(&[
            ("realm", &self.realm()),
            ("pipelineName", &encode_segment(pipeline_name)),
        ]);
        self.delete(&url).await
    }

    // ── Flow instances ───────────────────────────────────────────────

    /// List the names of all running flow instances.
    ///
    /// `GET v1/{realm}/flows`
    pub async fn list_flows(&self) -> Result<Vec<String>, Error> {
        let url = self.endpoints().flows.render(&[("realm", &self.realm())]);
        self.get(&url).await
    }

    /// Fetch one flow instance by name.
    ///
    /// `GET v1/{realm}/flows/{flowName}`
    pub async fn get_flow(&self, flow_name: &str) -> Result<FlowInstance, Error> {
        ensure_non_empty(flow_name, "flow name")?;
        let url = self.endpoints().flow.render(&[
            ("realm", &self.realm()),
            ("flowName", &encode_segment(flow_name)),
        ]);
        let dto: FlowInstanceDto = self.get(&url).await?;
        Ok(FlowInstance::try_from(dto)?)
    }

    /// Instantiate a pipeline as a new flow.
    ///
    /// `POST v1/{realm}/flows`
    pub async fn create_flow(&self, flow: &FlowInstance) -> Result<FlowInstance, Error> {
        ensure_non_empty(&flow.name, "flow name")?;
        let url = self.endpoints().flows.render(&[("realm", &self.realm())]);
        let dto: FlowInstanceDto = self.post(&url, &FlowInstanceDto::from(flow)).await?;
        Ok(FlowInstance::try_from(dto)?)
    }

    /// Stop and delete a flow instance.
    ///
    /// `DELETE v1/{realm}/flows/{flowName}`
    pub async fn delete_flow(&self, flow_name: &str) -> Result<(), Error> {
        ensure_non_empty(flow_name, "flow name")?;
        let url = self.endpoints().flow.render(&[
            ("realm", &self.realm()),
            ("flowName", &encode_segment(flow_name)),
        ]);
        self.delete(&url).await
    }
}
