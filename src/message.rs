use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    Text(String),
    Image { data: Vec<u8>, media_type: String },
}

impl ContentBlock {
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Image { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::Text(content.into())],
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentBlock::Text(content.into())],
        }
    }

    pub fn with_block(mut self, block: ContentBlock) -> Self {
        self.content.push(block);
        self
    }

    pub fn text(&self) -> String {
        self.content.iter().filter_map(ContentBlock::text).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{ContentBlock, Message, Role};

    #[test]
    fn text_skips_image_blocks() {
        let message = Message::user("describe ").with_block(ContentBlock::Image {
            data: vec![1, 2, 3],
            media_type: "image/png".to_string(),
        });
        assert_eq!(message.role, Role::User);
        assert_eq!(message.content.len(), 2);
        assert_eq!(message.text(), "describe ");
    }
}
