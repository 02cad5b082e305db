//! Agent gateway: replays the transcript to the model and services any
//! capability calls it makes before producing the next interviewer message.

#[cfg(test)]
pub mod testing;

use crate::conversation::{Message, Role};
use crate::llm::{
    ContentBlock, LlmError, LlmMessage, LlmRequest, LlmService, MessageRole, SystemContent,
};
use crate::tools::ToolRegistry;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Failure reaching the model or completing its reasoning loop
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("model call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("model requested unknown capability `{0}`")]
    UnknownTool(String),

    #[error("model exceeded {0} capability rounds without answering")]
    ToolRoundLimit(usize),
}

/// Produces the next assistant message for a transcript
#[async_trait]
pub trait AgentGateway: Send + Sync {
    /// Returns `None` when the model answered with no text.
    async fn invoke(&self, history: &[Message]) -> Result<Option<String>, GatewayError>;
}

/// Production gateway: one model plus the capability registry
pub struct ToolCallingAgent {
    llm: Arc<dyn LlmService>,
    tools: ToolRegistry,
    max_tool_rounds: usize,
}

impl ToolCallingAgent {
    pub fn new(llm: Arc<dyn LlmService>, tools: ToolRegistry, max_tool_rounds: usize) -> Self {
        Self {
            llm,
            tools,
            max_tool_rounds,
        }
    }

    fn build_request(&self, history: &[Message]) -> LlmRequest {
        let mut system = Vec::new();
        let mut messages = Vec::with_capacity(history.len());

        for message in history {
            match message.role {
                Role::System => system.push(SystemContent::new(message.content.clone())),
                Role::User => messages.push(LlmMessage::user_text(message.content.clone())),
                Role::Assistant => {
                    messages.push(LlmMessage::assistant_text(message.content.clone()));
                }
            }
        }

        LlmRequest {
            system,
            messages,
            tools: self.tools.definitions(),
        }
    }
}

#[async_trait]
impl AgentGateway for ToolCallingAgent {
    async fn invoke(&self, history: &[Message]) -> Result<Option<String>, GatewayError> {
        let mut request = self.build_request(history);
        let mut rounds = 0;

        loop {
            let response = self.llm.complete(&request).await?;

            if !response.has_tool_use() {
                let text = response.text();
                return Ok(Some(text).filter(|t| !t.is_empty()));
            }

            if rounds == self.max_tool_rounds {
                return Err(GatewayError::ToolRoundLimit(self.max_tool_rounds));
            }
            rounds += 1;

            let mut results = Vec::new();
            for (id, name, input) in response.tool_uses() {
                tracing::info!(tool = %name, id = %id, round = rounds, "Executing capability");
                let output = self
                    .tools
                    .execute(name, input.clone())
                    .await
                    .ok_or_else(|| GatewayError::UnknownTool(name.to_string()))?;
                if !output.success {
                    tracing::warn!(tool = %name, error = %output.output, "Capability rejected input");
                }
                results.push(ContentBlock::tool_result(id, output.output, !output.success));
            }

            // Capability traffic stays in this scratch transcript only
            request.messages.push(LlmMessage {
                role: MessageRole::Assistant,
                content: response.content,
            });
            request.messages.push(LlmMessage {
                role: MessageRole::User,
                content: results,
            });
        }
    }
}
