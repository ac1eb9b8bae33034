use serde::{Deserialize, Serialize};

/// Severity of a metadata message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Say,
    Warn,
    Error,
}

/// One localisation of a message: a language tag plus the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageContent {
    pub lang: String,
    pub text: String,
}

impl MessageContent {
    pub fn new<L: Into<String>, T: Into<String>>(lang: L, text: T) -> Self {
        MessageContent {
            lang: lang.into(),
            text: text.into(),
        }
    }
}

/// Language tag used when a message is given as a single bare string, and
/// as the fallback when no content matches the requested language.
pub const DEFAULT_LANGUAGE: &str = "en";

/// A metadata message: a severity, an ordered list of localised content,
/// and an optional condition controlling its visibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "MessageDoc", into = "MessageDoc")]
pub struct Message {
    pub message_type: MessageType,
    pub content: Vec<MessageContent>,
    pub condition: Option<String>,
}

impl Message {
    pub fn new<S: Into<String>>(message_type: MessageType, text: S) -> Self {
        Message {
            message_type,
            content: vec![MessageContent::new(DEFAULT_LANGUAGE, text)],
            condition: None,
        }
    }

    pub fn with_condition<S: Into<String>>(mut self, condition: S) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Pick the content for a language tag, falling back to English and
    /// then to the first entry.
    pub fn content_for(&self, lang: &str) -> Option<&MessageContent> {
        self.content
            .iter()
            .find(|c| c.lang.eq_ignore_ascii_case(lang))
            .or_else(|| {
                self.content
                    .iter()
                    .find(|c| c.lang.eq_ignore_ascii_case(DEFAULT_LANGUAGE))
            })
            .or_else(|| self.content.first())
    }
}

/// Document form: `content` is a bare string (English) or a list of
/// `{lang, text}` mappings.
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct MessageDoc {
    #[serde(rename = "type")]
    message_type: MessageType,
    content: ContentRepr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    condition: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ContentRepr {
    Single(String),
    Localised(Vec<MessageContent>),
}

impl From<MessageDoc> for Message {
    fn from(doc: MessageDoc) -> Self {
        let content = match doc.content {
            ContentRepr::Single(text) => vec![MessageContent::new(DEFAULT_LANGUAGE, text)],
            ContentRepr::Localised(content) => content,
        };
        Message {
            message_type: doc.message_type,
            content,
            condition: doc.condition,
        }
    }
}

impl From<Message> for MessageDoc {
    fn from(message: Message) -> Self {
        let single = match message.content.as_slice() {
            [only] if only.lang == DEFAULT_LANGUAGE => Some(only.text.clone()),
            _ => None,
        };
        let content = match single {
            Some(text) => ContentRepr::Single(text),
            None => ContentRepr::Localised(message.content),
        };
        MessageDoc {
            message_type: message.message_type,
            content,
            condition: message.condition,
        }
    }
}
