use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use super::{ChunkContent, GenerationParams, PromptInput, ProviderTag, from_json, to_json};
use crate::error::ChatError;
use crate::message::{ContentBlock, Message, Role};

const PROVIDER: ProviderTag = ProviderTag::ClaudeMessages;
const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    anthropic_version: &'static str,
    max_tokens: u32,
    messages: Vec<WireMessage<'a>>,
    temperature: f64,
    top_p: f64,
    top_k: u32,
    stop_sequences: &'a [String],
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: Vec<WireContent<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireContent<'a> {
    Text { text: &'a str },
    Image { source: ImageSource<'a> },
}

#[derive(Debug, Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'a str,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamChunk {
    MessageStart { message: StartedMessage },
    ContentBlockDelta { delta: Delta },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct StartedMessage {
    role: Role,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(default)]
    text: Option<String>,
}

fn to_wire(message: &Message) -> WireMessage<'_> {
    let content = message
        .content
        .iter()
        .map(|block| match block {
            ContentBlock::Text(text) => WireContent::Text { text },
            ContentBlock::Image { data, media_type } => WireContent::Image {
                source: ImageSource {
                    kind: "base64",
                    media_type,
                    data: STANDARD.encode(data),
                },
            },
        })
        .collect();

    WireMessage {
        role: message.role.as_str(),
        content,
    }
}

pub(super) fn encode(input: PromptInput<'_>, params: &GenerationParams) -> Result<Vec<u8>, ChatError> {
    let messages = match input {
        PromptInput::Text(text) => vec![WireMessage {
            role: Role::User.as_str(),
            content: vec![WireContent::Text { text }],
        }],
        PromptInput::Messages(messages) => messages.iter().map(to_wire).collect(),
    };

    let body = MessagesRequest {
        anthropic_version: ANTHROPIC_VERSION,
        max_tokens: params.max_tokens,
        messages,
        temperature: params.temperature,
        top_p: params.top_p,
        top_k: params.top_k,
        stop_sequences: &params.stop_sequences,
    };
    to_json(PROVIDER, &body)
}

pub(super) fn decode_chunk(bytes: &[u8]) -> Result<ChunkContent, ChatError> {
    let chunk: StreamChunk = from_json(PROVIDER, bytes)?;
    Ok(match chunk {
        StreamChunk::MessageStart { message } => ChunkContent::MessageStart(message.role),
        StreamChunk::ContentBlockDelta { delta } => ChunkContent::text(delta.text),
        StreamChunk::Other => ChunkContent::Empty,
    })
}

pub(super) fn decode_response(body: &[u8]) -> Result<String, ChatError> {
    let response: MessagesResponse = from_json(PROVIDER, body)?;
    Ok(response
        .content
        .into_iter()
        .filter_map(|block| block.text)
        .collect())
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::{decode_chunk, decode_response, encode};
    use crate::message::{ContentBlock, Message, Role};
    use crate::providers::{ChunkContent, GenerationParams, PromptInput, ProviderTag};

    fn params() -> GenerationParams {
        GenerationParams::defaults_for(ProviderTag::ClaudeMessages)
    }

    #[test]
    fn text_input_becomes_a_single_user_message() {
        let bytes = encode(PromptInput::Text("hi"), &params()).unwrap();
        let payload: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(payload["anthropic_version"], "bedrock-2023-05-31");
        assert_eq!(payload["messages"][0]["role"], "user");
        assert_eq!(payload["messages"][0]["content"][0]["type"], "text");
        assert_eq!(payload["messages"][0]["content"][0]["text"], "hi");
    }

    #[test]
    fn image_blocks_are_inlined_as_base64() {
        let messages = vec![
            Message::user("what is this?").with_block(ContentBlock::Image {
                data: b"png-bytes".to_vec(),
                media_type: "image/png".to_string(),
            }),
            Message::assistant("a cat"),
            Message::user("are you sure?"),
        ];
        let bytes = encode(PromptInput::Messages(&messages), &params()).unwrap();
        let payload: Value = serde_json::from_slice(&bytes).unwrap();

        let image = &payload["messages"][0]["content"][1];
        assert_eq!(image["type"], "image");
        assert_eq!(image["source"]["type"], "base64");
        assert_eq!(image["source"]["media_type"], "image/png");
        assert_eq!(image["source"]["data"], "cG5nLWJ5dGVz");
        assert_eq!(payload["messages"][1]["role"], "assistant");
        assert_eq!(payload["messages"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn only_content_block_deltas_carry_text() {
        let delta = br#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hel"}}"#;
        assert_eq!(
            decode_chunk(delta).unwrap(),
            ChunkContent::Text("Hel".to_string())
        );

        let start = br#"{"type":"message_start","message":{"id":"msg_1","role":"assistant","content":[]}}"#;
        assert_eq!(
            decode_chunk(start).unwrap(),
            ChunkContent::MessageStart(Role::Assistant)
        );

        for control in [
            br#"{"type":"content_block_start","index":0,"content_block":{"type":"text","text":""}}"#
                .as_slice(),
            br#"{"type":"message_delta","delta":{"stop_reason":"end_turn"}}"#,
            br#"{"type":"message_stop","amazon-bedrock-invocationMetrics":{}}"#,
            br#"{"type":"ping"}"#,
        ] {
            assert_eq!(decode_chunk(control).unwrap(), ChunkContent::Empty);
        }
    }

    #[test]
    fn full_response_concatenates_text_blocks() {
        let body = br#"{"id":"msg_1","role":"assistant","content":[{"type":"text","text":"Hello, "},{"type":"text","text":"world"}]}"#;
        assert_eq!(decode_response(body).unwrap(), "Hello, world");
    }
}
