use std::future::Future;
use std::pin::Pin;

use crate::error::ChatError;
use crate::message::Role;
use crate::providers::ProviderTag;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Chunk(Vec<u8>),
    MessageStart(Role),
    ContentDelta(String),
    Unknown { tag: String, raw: String },
}

pub type EventFuture<'a> = Pin<Box<dyn Future<Output = Option<StreamEvent>> + 'a>>;

// `next_event` yields `None` on clean end and on failure alike; `close`
// reports the failure and releases the connection.
pub trait EventSource {
    fn next_event(&mut self) -> EventFuture<'_>;

    fn close(&mut self) -> Result<(), ChatError>;
}

pub enum Invocation {
    Stream(Box<dyn EventSource>),
    Complete(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct InvokeRequest<'a> {
    pub provider: ProviderTag,
    pub model_id: &'a str,
    pub body: Vec<u8>,
    pub streaming: bool,
}

pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<Invocation, ChatError>> + 'a>>;

pub trait Transport {
    fn invoke<'a>(&'a self, request: InvokeRequest<'a>) -> TransportFuture<'a>;
}
