use std::io::Write;

use tracing::{debug, warn};

use crate::error::ChatError;
use crate::message::{ContentBlock, Message, Role};
use crate::providers::{self, ChunkContent, ProviderTag};
use crate::transport::{EventSource, StreamEvent};

pub trait ReplySink {
    fn emit(&mut self, fragment: &str);
}

impl<F> ReplySink for F
where
    F: FnMut(&str),
{
    fn emit(&mut self, fragment: &str) {
        self(fragment)
    }
}

pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> ReplySink for WriterSink<W> {
    fn emit(&mut self, fragment: &str) {
        let result = self
            .writer
            .write_all(fragment.as_bytes())
            .and_then(|()| self.writer.flush());
        if let Err(err) = result {
            warn!(error = %err, "failed to write reply fragment");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    Idle,
    Open,
    Closed(StreamOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledReply {
    pub text: String,
    pub message: Option<Message>,
    pub decode_failures: usize,
}

pub struct ReplyAssembler {
    provider: ProviderTag,
    state: DecoderState,
    text: String,
    role: Role,
    fragments: usize,
    decode_failures: usize,
}

impl ReplyAssembler {
    pub fn new(provider: ProviderTag) -> Self {
        Self {
            provider,
            state: DecoderState::Idle,
            text: String::new(),
            role: Role::Assistant,
            fragments: 0,
            decode_failures: 0,
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn open(&mut self) {
        debug_assert_eq!(self.state, DecoderState::Idle);
        self.state = DecoderState::Open;
        debug!(provider = %self.provider, "response stream opened");
    }

    pub fn handle(&mut self, event: StreamEvent, sink: &mut dyn ReplySink) {
        debug_assert_eq!(self.state, DecoderState::Open);
        match event {
            StreamEvent::Chunk(bytes) => match providers::decode_chunk(self.provider, &bytes) {
                Ok(ChunkContent::Text(text)) => self.push_fragment(&text, sink),
                Ok(ChunkContent::MessageStart(role)) => self.role = role,
                Ok(ChunkContent::Empty) => {}
                Err(err) => {
                    self.decode_failures += 1;
                    warn!(
                        provider = %self.provider,
                        chunk_len = bytes.len(),
                        error = %err,
                        "unable to decode response chunk; skipping"
                    );
                }
            },
            StreamEvent::MessageStart(role) => self.role = role,
            StreamEvent::ContentDelta(text) => self.push_fragment(&text, sink),
            StreamEvent::Unknown { tag, raw } => {
                debug!(tag = %tag, raw_len = raw.len(), "forwarding unrecognised stream event");
                sink.emit(&raw);
            }
        }
    }

    fn push_fragment(&mut self, fragment: &str, sink: &mut dyn ReplySink) {
        self.text.push_str(fragment);
        self.fragments += 1;
        sink.emit(fragment);
    }

    pub fn fail(&mut self) {
        self.state = DecoderState::Closed(StreamOutcome::Error);
    }

    pub fn finish(mut self) -> AssembledReply {
        self.state = DecoderState::Closed(StreamOutcome::Success);
        debug!(
            provider = %self.provider,
            fragments = self.fragments,
            decode_failures = self.decode_failures,
            reply_len = self.text.len(),
            "response stream closed"
        );
        let message = self.provider.is_messages_style().then(|| Message {
            role: self.role,
            content: vec![ContentBlock::Text(self.text.clone())],
        });
        AssembledReply {
            text: self.text,
            message,
            decode_failures: self.decode_failures,
        }
    }
}

// The source is closed exactly once on every path.
pub async fn assemble(
    provider: ProviderTag,
    source: &mut dyn EventSource,
    sink: &mut dyn ReplySink,
) -> Result<AssembledReply, ChatError> {
    let mut assembler = ReplyAssembler::new(provider);
    assembler.open();

    while let Some(event) = source.next_event().await {
        assembler.handle(event, sink);
    }

    match source.close() {
        Ok(()) => Ok(assembler.finish()),
        Err(err) => {
            assembler.fail();
            warn!(provider = %provider, error = %err, "response stream failed");
            Err(err)
        }
    }
}

pub fn assemble_complete(
    provider: ProviderTag,
    body: &[u8],
    sink: &mut dyn ReplySink,
) -> Result<AssembledReply, ChatError> {
    let text = providers::decode_response(provider, body)?;
    let mut assembler = ReplyAssembler::new(provider);
    assembler.open();
    if !text.is_empty() {
        assembler.push_fragment(&text, sink);
    }
    Ok(assembler.finish())
}
