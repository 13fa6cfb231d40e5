use aws_config::Region;
use aws_sdk_bedrockruntime::Client as BedrockRuntimeClient;
use aws_sdk_bedrockruntime::operation::invoke_model_with_response_stream::InvokeModelWithResponseStreamOutput;
use aws_sdk_bedrockruntime::primitives::Blob;
use aws_sdk_bedrockruntime::types::ResponseStream;
use tracing::{debug, error};

use crate::config::Config;
use crate::error::ChatError;
use crate::providers::sdk_errors::model_api_error;
use crate::transport::{
    EventFuture, EventSource, Invocation, InvokeRequest, StreamEvent, Transport, TransportFuture,
};

const CONTENT_TYPE: &str = "application/json";
const ACCEPT: &str = "*/*";

async fn load_sdk_config(region: &str) -> aws_config::SdkConfig {
    aws_config::from_env()
        .region(Region::new(region.to_string()))
        .load()
        .await
}

pub struct BedrockTransport {
    client: BedrockRuntimeClient,
    region: String,
}

impl BedrockTransport {
    pub async fn new(cfg: &Config) -> Self {
        let sdk_config = load_sdk_config(&cfg.region).await;
        Self {
            client: BedrockRuntimeClient::new(&sdk_config),
            region: cfg.region.clone(),
        }
    }

    async fn invoke_complete(&self, request: InvokeRequest<'_>) -> Result<Invocation, ChatError> {
        let output = self
            .client
            .invoke_model()
            .model_id(request.model_id)
            .content_type(CONTENT_TYPE)
            .accept(ACCEPT)
            .body(Blob::new(request.body))
            .send()
            .await
            .map_err(|err| {
                error!(model_id = request.model_id, error = ?err, "InvokeModel failed");
                model_api_error(err, request.model_id, &self.region)
            })?;
        Ok(Invocation::Complete(output.body.into_inner()))
    }

    async fn invoke_streaming(&self, request: InvokeRequest<'_>) -> Result<Invocation, ChatError> {
        let output = self
            .client
            .invoke_model_with_response_stream()
            .model_id(request.model_id)
            .content_type(CONTENT_TYPE)
            .accept(ACCEPT)
            .body(Blob::new(request.body))
            .send()
            .await
            .map_err(|err| {
                error!(
                    model_id = request.model_id,
                    error = ?err,
                    "InvokeModelWithResponseStream failed"
                );
                model_api_error(err, request.model_id, &self.region)
            })?;
        Ok(Invocation::Stream(Box::new(BedrockEventSource {
            output: Some(output),
            error: None,
            model_id: request.model_id.to_string(),
            region: self.region.clone(),
        })))
    }
}

impl Transport for BedrockTransport {
    fn invoke<'a>(&'a self, request: InvokeRequest<'a>) -> TransportFuture<'a> {
        Box::pin(async move {
            debug!(
                provider = %request.provider,
                model_id = request.model_id,
                streaming = request.streaming,
                body_len = request.body.len(),
                "invoking model"
            );
            if request.streaming {
                self.invoke_streaming(request).await
            } else {
                self.invoke_complete(request).await
            }
        })
    }
}

struct BedrockEventSource {
    output: Option<InvokeModelWithResponseStreamOutput>,
    error: Option<ChatError>,
    model_id: String,
    region: String,
}

fn classify(frame: ResponseStream) -> StreamEvent {
    match frame {
        ResponseStream::Chunk(part) => StreamEvent::Chunk(
            part.bytes()
                .map(|bytes| bytes.as_ref().to_vec())
                .unwrap_or_default(),
        ),
        other => {
            let raw = format!("{other:?}");
            StreamEvent::Unknown {
                tag: variant_name(&raw),
                raw,
            }
        }
    }
}

fn variant_name(debug: &str) -> String {
    let name: String = debug
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if name.is_empty() {
        "unknown".to_string()
    } else {
        name
    }
}

impl EventSource for BedrockEventSource {
    fn next_event(&mut self) -> EventFuture<'_> {
        Box::pin(async move {
            let output = self.output.as_mut()?;
            match output.body.recv().await {
                Ok(Some(frame)) => Some(classify(frame)),
                Ok(None) => None,
                Err(err) => {
                    self.error = Some(model_api_error(err, &self.model_id, &self.region));
                    self.output = None;
                    None
                }
            }
        })
    }

    fn close(&mut self) -> Result<(), ChatError> {
        self.output = None;
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteModel {
    pub model_id: String,
    pub provider_name: Option<String>,
    pub model_name: Option<String>,
}

pub async fn list_foundation_models(cfg: &Config) -> Result<Vec<RemoteModel>, ChatError> {
    let sdk_config = load_sdk_config(&cfg.region).await;
    let client = aws_sdk_bedrock::Client::new(&sdk_config);
    let response = client
        .list_foundation_models()
        .send()
        .await
        .map_err(|err| model_api_error(err, "ListFoundationModels", &cfg.region))?;

    Ok(response
        .model_summaries()
        .iter()
        .map(|summary| RemoteModel {
            model_id: summary.model_id().to_string(),
            provider_name: summary.provider_name().map(str::to_string),
            model_name: summary.model_name().map(str::to_string),
        })
        .collect())
}
