use crate::hints::DataHints;

/// Tag name with its attributes and round-trip hints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    /// In document order, without the hints attribute
    pub attributes: Vec<(String, String)>,
    pub hints: DataHints,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn with_hints(mut self, hints: DataHints) -> Self {
        self.hints = hints;
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    TagOpen(Tag),
    TagClose(Tag),
    Text(String),
    Comment(String),
    Newline,
    Eof,
}

impl Token {
    pub fn text(text: impl Into<String>) -> Self {
        Token::Text(text.into())
    }

    /// Name of an opening tag
    pub fn opened_tag(&self) -> Option<&str> {
        match self {
            Token::TagOpen(tag) => Some(&tag.name),
            _ => None,
        }
    }
}
