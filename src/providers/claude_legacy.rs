use serde::{Deserialize, Serialize};

use super::{ChunkContent, GenerationParams, ProviderTag, from_json, to_json};
use crate::error::ChatError;

pub const PROMPT_PREFIX: &str = "Human: \n\nHuman: ";
pub const PROMPT_SUFFIX: &str = "\n\nAssistant:";

const PROVIDER: ProviderTag = ProviderTag::ClaudeLegacy;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: String,
    max_tokens_to_sample: u32,
    temperature: f64,
    top_k: u32,
    top_p: f64,
    stop_sequences: &'a [String],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    completion: String,
}

pub(super) fn frame_prompt(prompt: &str) -> String {
    format!("{PROMPT_PREFIX}{prompt}{PROMPT_SUFFIX}")
}

pub(super) fn encode(prompt: &str, params: &GenerationParams) -> Result<Vec<u8>, ChatError> {
    let body = CompletionRequest {
        prompt: frame_prompt(prompt),
        max_tokens_to_sample: params.max_tokens,
        temperature: params.temperature,
        top_k: params.top_k,
        top_p: params.top_p,
        stop_sequences: &params.stop_sequences,
    };
    to_json(PROVIDER, &body)
}

pub(super) fn decode_chunk(bytes: &[u8]) -> Result<ChunkContent, ChatError> {
    let chunk: CompletionResponse = from_json(PROVIDER, bytes)?;
    Ok(ChunkContent::text(chunk.completion))
}

pub(super) fn decode_response(body: &[u8]) -> Result<String, ChatError> {
    let response: CompletionResponse = from_json(PROVIDER, body)?;
    Ok(response.completion)
}
