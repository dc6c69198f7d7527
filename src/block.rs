/// Inline text spans with formatting. Emphasis never nests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Plain(String),
    Bold(String),
    Italic(String),
    Code(String),
}

impl Span {
    /// The text carried by the span, without markers.
    pub fn text(&self) -> &str {
        match self {
            Span::Plain(text) | Span::Bold(text) | Span::Italic(text) | Span::Code(text) => text,
        }
    }
}

/// Block-level elements segmented from the input text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading {
        level: u8,
        text: String,
    },
    Paragraph {
        text: String,
    },
    BulletList {
        items: Vec<String>,
    },
    NumberedList {
        items: Vec<String>,
    },
    CodeBlock {
        language: Option<String>,
        text: String,
    },
    /// Visual break between successive appends. The segmenter never emits it.
    Separator,
}

/// Ordered blocks of one conversion.
pub type Document = Vec<Block>;
