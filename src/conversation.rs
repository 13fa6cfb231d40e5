use tracing::warn;

use crate::message::{ContentBlock, Message, Role};
use crate::providers::{CLAUDE_MARKERS, PromptInput, ProviderTag, RoleMarkers};
use crate::stream::AssembledReply;

#[derive(Debug, Clone, PartialEq, Eq)]
enum History {
    Legacy(String),
    Messages(Vec<Message>),
}

#[derive(Debug, Clone)]
pub struct Conversation {
    provider: ProviderTag,
    history: History,
    checkpoint: Option<usize>,
}

impl Conversation {
    pub fn new(provider: ProviderTag) -> Self {
        let history = if provider.is_messages_style() {
            History::Messages(Vec::new())
        } else {
            History::Legacy(String::new())
        };
        Self {
            provider,
            history,
            checkpoint: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.history {
            History::Legacy(buffer) => buffer.is_empty(),
            History::Messages(messages) => messages.is_empty(),
        }
    }

    pub fn messages(&self) -> Option<&[Message]> {
        match &self.history {
            History::Legacy(_) => None,
            History::Messages(messages) => Some(messages),
        }
    }

    fn markers(&self) -> RoleMarkers {
        self.provider.role_markers()
    }

    fn len(&self) -> usize {
        match &self.history {
            History::Legacy(buffer) => buffer.len(),
            History::Messages(messages) => messages.len(),
        }
    }

    pub fn append(&mut self, turn: Message) {
        let markers = self.markers();
        match &mut self.history {
            History::Legacy(buffer) => {
                if !(buffer.is_empty() && turn.role == Role::User) {
                    buffer.push_str(markers.for_role(turn.role));
                }
                buffer.push_str(&turn.text());
            }
            History::Messages(messages) => messages.push(turn),
        }
    }

    pub fn begin_turn(&mut self, turn: Message) {
        if self.checkpoint.is_some() {
            warn!("previous turn was never completed; discarding it");
            self.abandon_turn();
        }
        self.checkpoint = Some(self.len());
        self.append(turn);
    }

    // Returns `false` when the turn was rolled back instead: message lists
    // never hold an assistant turn without text.
    pub fn complete_turn(&mut self, reply: &AssembledReply) -> bool {
        let message = reply
            .message
            .clone()
            .unwrap_or_else(|| Message::assistant(reply.text.clone()));
        if matches!(self.history, History::Messages(_)) && message.text().is_empty() {
            warn!(provider = %self.provider, "model returned no text; dropping the turn");
            self.abandon_turn();
            return false;
        }
        self.append(message);
        self.checkpoint = None;
        true
    }

    pub fn abandon_turn(&mut self) {
        let Some(checkpoint) = self.checkpoint.take() else {
            return;
        };
        match &mut self.history {
            History::Legacy(buffer) => buffer.truncate(checkpoint),
            History::Messages(messages) => messages.truncate(checkpoint),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.provider);
    }

    pub fn prompt_input(&self) -> PromptInput<'_> {
        match &self.history {
            History::Legacy(buffer) => PromptInput::Text(buffer),
            History::Messages(messages) => PromptInput::Messages(messages),
        }
    }

    pub fn render(&self) -> String {
        match &self.history {
            History::Legacy(buffer) => buffer.clone(),
            History::Messages(messages) => messages
                .iter()
                .flat_map(|message| [CLAUDE_MARKERS.for_role(message.role).to_string(), message.text()])
                .collect(),
        }
    }

    pub fn restore(&mut self, transcript: &str) {
        self.checkpoint = None;
        self.history = match self.history {
            History::Legacy(_) => History::Legacy(transcript.to_string()),
            History::Messages(_) => History::Messages(parse_transcript(transcript)),
        };
    }
}

fn parse_transcript(transcript: &str) -> Vec<Message> {
    let mut messages = Vec::new();
    let mut role = Role::User;
    let mut rest = transcript;

    loop {
        let next = [Role::User, Role::Assistant]
            .into_iter()
            .filter_map(|candidate| {
                rest.find(CLAUDE_MARKERS.for_role(candidate))
                    .map(|at| (at, candidate))
            })
            .min_by_key(|(at, _)| *at);

        let end = next.map(|(at, _)| at).unwrap_or(rest.len());
        let text = &rest[..end];
        if !text.is_empty() {
            messages.push(Message {
                role,
                content: vec![ContentBlock::Text(text.to_string())],
            });
        }

        match next {
            Some((at, next_role)) => {
                rest = &rest[at + CLAUDE_MARKERS.for_role(next_role).len()..];
                role = next_role;
            }
            None => break,
        }
    }

    messages
}
