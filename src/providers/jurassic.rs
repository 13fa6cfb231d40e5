use serde::{Deserialize, Serialize};

use super::{GenerationParams, ProviderTag, from_json, to_json};
use crate::error::ChatError;

const PROVIDER: ProviderTag = ProviderTag::Jurassic;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JurassicRequest<'a> {
    prompt: &'a str,
    temperature: f64,
    top_p: f64,
    max_tokens: u32,
    stop_sequences: &'a [String],
}

#[derive(Debug, Deserialize)]
struct JurassicResponse {
    #[serde(default)]
    completions: Vec<Completion>,
}

#[derive(Debug, Deserialize)]
struct Completion {
    data: CompletionData,
}

#[derive(Debug, Deserialize)]
struct CompletionData {
    text: String,
}

pub(super) fn encode(prompt: &str, params: &GenerationParams) -> Result<Vec<u8>, ChatError> {
    let body = JurassicRequest {
        prompt,
        temperature: params.temperature,
        top_p: params.top_p,
        max_tokens: params.max_tokens,
        stop_sequences: &params.stop_sequences,
    };
    to_json(PROVIDER, &body)
}

pub(super) fn decode_response(body: &[u8]) -> Result<String, ChatError> {
    let response: JurassicResponse = from_json(PROVIDER, body)?;
    response
        .completions
        .into_iter()
        .next()
        .map(|completion| completion.data.text)
        .ok_or(ChatError::MissingField {
            provider: PROVIDER,
            field: "completions[0].data.text",
        })
}
