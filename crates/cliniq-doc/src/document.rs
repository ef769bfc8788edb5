use serde::Serialize;

/// A structurally distinct unit of a parsed message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// Only level 3 (`### `) is recognised.  Holds the first line only.
    Heading { level: u8, text: String },
    Paragraph { lines: Vec<String> },
    UnorderedList { items: Vec<String> },
    OrderedList { items: Vec<String> },
    CodeBlock { code: String },
    HorizontalRule,
    /// Disclaimer body with emphasis markers and the `Disclaimer:` label removed.
    Disclaimer { text: String },
}

impl Block {
    pub fn heading(text: impl Into<String>) -> Self {
        Self::Heading { level: 3, text: text.into() }
    }

    pub fn paragraph<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        Self::Paragraph { lines: lines.into_iter().map(Into::into).collect() }
    }

    pub fn unordered<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Self {
        Self::UnorderedList { items: items.into_iter().map(Into::into).collect() }
    }

    pub fn ordered<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Self {
        Self::OrderedList { items: items.into_iter().map(Into::into).collect() }
    }

    pub fn code(code: impl Into<String>) -> Self {
        Self::CodeBlock { code: code.into() }
    }

    pub fn disclaimer(text: impl Into<String>) -> Self {
        Self::Disclaimer { text: text.into() }
    }
}

/// Ordered blocks of one message, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}
