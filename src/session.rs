use tracing::{debug, info};

use crate::config::Config;
use crate::conversation::Conversation;
use crate::error::ChatError;
use crate::message::{ContentBlock, Message};
use crate::models::{ContentType, ModelInfo};
use crate::providers;
use crate::stream::{self, AssembledReply, ReplySink};
use crate::transport::{Invocation, InvokeRequest, Transport};

pub struct ChatSession<'a> {
    cfg: &'a Config,
    transport: &'a dyn Transport,
    model: &'static ModelInfo,
    conversation: Conversation,
    attachment: Option<ContentBlock>,
}

impl<'a> ChatSession<'a> {
    pub fn new(
        cfg: &'a Config,
        transport: &'a dyn Transport,
        model: &'static ModelInfo,
    ) -> Result<Self, ChatError> {
        if model.content_type != ContentType::Text {
            return Err(ChatError::TextGenerationUnsupported(model.model_id.to_string()));
        }
        if cfg.stream && !model.supports_streaming {
            return Err(ChatError::StreamingUnsupported(model.model_id.to_string()));
        }
        Ok(Self {
            cfg,
            transport,
            model,
            conversation: Conversation::new(model.provider),
            attachment: None,
        })
    }

    pub fn with_attachment(mut self, image: ContentBlock) -> Result<Self, ChatError> {
        if !self.model.supports_vision {
            return Err(ChatError::VisionUnsupported(self.model.model_id.to_string()));
        }
        self.attachment = Some(image);
        Ok(self)
    }

    pub fn model(&self) -> &'static ModelInfo {
        self.model
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn conversation_mut(&mut self) -> &mut Conversation {
        &mut self.conversation
    }

    // On failure the conversation is left as it was before the call.
    pub async fn run_turn(
        &mut self,
        prompt: &str,
        sink: &mut dyn ReplySink,
    ) -> Result<AssembledReply, ChatError> {
        let mut turn = Message::user(prompt);
        if let Some(image) = &self.attachment {
            turn = turn.with_block(image.clone());
        }
        self.conversation.begin_turn(turn);

        match self.exchange(sink).await {
            Ok(reply) => {
                if self.conversation.complete_turn(&reply) {
                    self.attachment = None;
                }
                Ok(reply)
            }
            Err(err) => {
                self.conversation.abandon_turn();
                Err(err)
            }
        }
    }

    async fn exchange(&self, sink: &mut dyn ReplySink) -> Result<AssembledReply, ChatError> {
        let provider = self.model.provider;
        let streaming = self.cfg.stream;
        let params = self.cfg.generation_params(provider, streaming);
        let body = providers::encode(provider, self.conversation.prompt_input(), &params)?;
        debug!(
            provider = %provider,
            model_id = self.model.model_id,
            streaming,
            "sending turn"
        );

        let invocation = self
            .transport
            .invoke(InvokeRequest {
                provider,
                model_id: self.model.model_id,
                body,
                streaming,
            })
            .await?;

        let reply = match invocation {
            Invocation::Stream(mut source) => stream::assemble(provider, source.as_mut(), sink).await?,
            Invocation::Complete(body) => stream::assemble_complete(provider, &body, sink)?,
        };
        info!(
            model_id = self.model.model_id,
            reply_len = reply.text.len(),
            decode_failures = reply.decode_failures,
            "turn complete"
        );
        Ok(reply)
    }
}
