use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use super::{ProviderTag, from_json, to_json};
use crate::error::ChatError;

const PROVIDER: ProviderTag = ProviderTag::StabilityImage;

const DEFAULT_CFG_SCALE: f64 = 10.0;
const DEFAULT_STEPS: u32 = 50;
const DEFAULT_SEED: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageParams {
    pub cfg_scale: f64,
    pub steps: u32,
    pub seed: u32,
}

impl Default for ImageParams {
    fn default() -> Self {
        Self {
            cfg_scale: DEFAULT_CFG_SCALE,
            steps: DEFAULT_STEPS,
            seed: DEFAULT_SEED,
        }
    }
}

#[derive(Debug, Serialize)]
struct StabilityRequest<'a> {
    text_prompts: [TextPrompt<'a>; 1],
    cfg_scale: f64,
    steps: u32,
    seed: u32,
}

#[derive(Debug, Serialize)]
struct TextPrompt<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct StabilityResponse {
    #[serde(default)]
    artifacts: Vec<Artifact>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Artifact {
    base64: String,
    #[serde(default)]
    finish_reason: Option<String>,
}

pub(super) fn encode(prompt: &str, params: &ImageParams) -> Result<Vec<u8>, ChatError> {
    let body = StabilityRequest {
        text_prompts: [TextPrompt { text: prompt }],
        cfg_scale: params.cfg_scale,
        steps: params.steps,
        seed: params.seed,
    };
    to_json(PROVIDER, &body)
}

pub fn decode_image(body: &[u8]) -> Result<Vec<u8>, ChatError> {
    let response: StabilityResponse = from_json(PROVIDER, body)?;
    let artifact = response
        .artifacts
        .into_iter()
        .next()
        .ok_or(ChatError::MissingField {
            provider: PROVIDER,
            field: "artifacts[0].base64",
        })?;
    if let Some(reason) = artifact.finish_reason.as_deref()
        && reason != "SUCCESS"
    {
        tracing::warn!(finish_reason = %reason, "image generation finished abnormally");
    }
    Ok(STANDARD.decode(artifact.base64)?)
}
