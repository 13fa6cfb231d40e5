use serde::{Deserialize, Serialize};

use super::{GenerationParams, ProviderTag, from_json, to_json};
use crate::error::ChatError;

const PROVIDER: ProviderTag = ProviderTag::Titan;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TitanRequest<'a> {
    input_text: &'a str,
    text_generation_config: TextGenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TextGenerationConfig<'a> {
    temperature: f64,
    top_p: f64,
    max_token_count: u32,
    stop_sequences: &'a [String],
}

#[derive(Debug, Deserialize)]
struct TitanResponse {
    #[serde(default)]
    results: Vec<TitanResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TitanResult {
    output_text: String,
}

pub(super) fn encode(prompt: &str, params: &GenerationParams) -> Result<Vec<u8>, ChatError> {
    let body = TitanRequest {
        input_text: prompt,
        text_generation_config: TextGenerationConfig {
            temperature: params.temperature,
            top_p: params.top_p,
            max_token_count: params.max_tokens,
            stop_sequences: &params.stop_sequences,
        },
    };
    to_json(PROVIDER, &body)
}

pub(super) fn decode_response(body: &[u8]) -> Result<String, ChatError> {
    let response: TitanResponse = from_json(PROVIDER, body)?;
    response
        .results
        .into_iter()
        .next()
        .map(|result| result.output_text)
        .ok_or(ChatError::MissingField {
            provider: PROVIDER,
            field: "results[0].outputText",
        })
}
