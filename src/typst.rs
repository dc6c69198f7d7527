use crate::block::{Block, Span};
use crate::config::Config;
use crate::inline;

/// Lists with at most this many items are kept on one page.
const UNBREAKABLE_LIST_ITEMS: usize = 5;

/// Document header written once, when a backing document is created.
pub fn preamble(config: &Config) -> String {
    let mut out = String::new();

    // Set up paragraph settings to prevent widows/orphans
    out.push_str("#set par(linebreaks: \"optimized\")\n");
    out.push_str(&format!(
        "#show raw: set text(font: \"{}\", size: {})\n",
        escape_string(&config.code.font),
        config.code.size
    ));
    if config.page.numbers {
        out.push_str("#set page(numbering: \"1\")\n");
    }
    out.push('\n');

    out
}

/// Convert blocks to Typst markup
pub fn blocks_to_typst(blocks: &[Block]) -> String {
    let mut out = String::new();

    let mut i = 0;
    while i < blocks.len() {
        let block = &blocks[i];

        match block {
            Block::Heading { .. } => {
                // Keep heading with following content using a block that prevents breaks
                out.push_str("#block(breakable: false)[\n");
                emit_block(block, &mut out);

                // Include the next block if it exists (to keep heading with first content)
                if let Some(next) = blocks.get(i + 1) {
                    if !matches!(next, Block::Heading { .. } | Block::Separator) {
                        i += 1;
                        emit_block(next, &mut out);
                    }
                }
                out.push_str("]\n\n");
            }
            _ => {
                emit_block(block, &mut out);
            }
        }

        i += 1;
    }

    out
}

fn emit_block(block: &Block, out: &mut String) {
    match block {
        Block::Heading { level, text } => {
            for _ in 0..*level {
                out.push('=');
            }
            out.push(' ');
            // Heading text is taken literally, markers included
            spans_to_typst(&[Span::Plain(text.clone())], out);
            out.push_str("\n\n");
        }
        Block::Paragraph { text } => {
            spans_to_typst(&inline::format(text), out);
            out.push_str("\n\n");
        }
        Block::BulletList { items } => emit_list(items, '-', out),
        Block::NumberedList { items } => emit_list(items, '+', out),
        Block::CodeBlock { language, text } => {
            // Keep code blocks together when possible
            let fence = raw_fence(text);
            out.push_str("#block(breakable: false)[\n");
            out.push_str(&fence);
            if let Some(lang) = language.as_deref().filter(|lang| is_raw_language(lang)) {
                out.push_str(lang);
            }
            out.push('\n');
            out.push_str(text);
            out.push('\n');
            out.push_str(&fence);
            out.push_str("\n]\n\n");
        }
        Block::Separator => {
            out.push_str("#line(length: 100%)\n\n");
        }
    }
}

/// Typst numbers `+` items itself, so input digits are not carried over.
fn emit_list(items: &[String], marker: char, out: &mut String) {
    // Wrap list to keep together when small, allow breaks when large
    let wrap = items.len() <= UNBREAKABLE_LIST_ITEMS;
    if wrap {
        out.push_str("#block(breakable: false)[\n");
    }
    for item in items {
        out.push(marker);
        out.push(' ');
        spans_to_typst(&inline::format(item), out);
        out.push('\n');
    }
    if wrap {
        out.push_str("]\n\n");
    } else {
        out.push('\n');
    }
}

/// Render spans that begin a line of markup.
fn spans_to_typst(spans: &[Span], out: &mut String) {
    for (index, span) in spans.iter().enumerate() {
        let next = spans.get(index + 1).and_then(|span| span.text().chars().next());
        span_to_typst(span, index == 0, next, out);
    }
}

/// `next` is the first character rendered after this span, if any.
fn span_to_typst(span: &Span, line_start: bool, next: Option<char>, out: &mut String) {
    match span {
        Span::Plain(text) => escape_text(text, line_start, out),
        Span::Bold(text) => emphasis(text, '*', "strong", next, out),
        Span::Italic(text) => emphasis(text, '_', "emph", next, out),
        Span::Code(text) => {
            // Inline code may hold backticks, so use the function form
            out.push_str("#raw(\"");
            out.push_str(&escape_string(text));
            out.push_str("\")");
            end_expression(next, out);
        }
    }
}

/// Markup delimiters are literal text inside a word, so fall back to the
/// function form when the span touches a letter or digit.
fn emphasis(text: &str, delimiter: char, function: &str, next: Option<char>, out: &mut String) {
    let in_word = out.chars().last().is_some_and(char::is_alphanumeric)
        || next.is_some_and(char::is_alphanumeric);

    if in_word {
        out.push('#');
        out.push_str(function);
        out.push('[');
        escape_text(text, false, out);
        out.push(']');
        end_expression(next, out);
    } else {
        out.push(delimiter);
        escape_text(text, false, out);
        out.push(delimiter);
    }
}

/// Stop an embedded expression from swallowing a following call or field access.
fn end_expression(next: Option<char>, out: &mut String) {
    if matches!(next, Some('(' | '.')) {
        out.push(';');
    }
}

/// Escape special Typst characters in running text.
///
/// At the start of a line `=`, `+`, `-` and `N.` would otherwise open a
/// heading or list, so those are escaped there too. Shorthands (`~`, `--`,
/// `-1`, `-?`, `...`) and smart quotes are kept literal.
fn escape_text(text: &str, line_start: bool, out: &mut String) {
    let enum_marker = line_start && starts_with_enum_marker(text);
    let mut chars = text.char_indices().peekable();

    while let Some((index, ch)) = chars.next() {
        let next = chars.peek().map(|&(_, next)| next);
        let escape = match ch {
            '#' | '*' | '_' | '@' | '$' | '\\' | '`' | '<' | '>' | '[' | ']' | '/' => true,
            '~' | '\'' | '"' => true,
            '=' | '+' if line_start && index == 0 => true,
            '-' => {
                (line_start && index == 0)
                    || next.is_some_and(|next| next == '-' || next == '?' || next.is_ascii_digit())
            }
            '.' => {
                next == Some('.')
                    || (enum_marker && text[..index].bytes().all(|b| b.is_ascii_digit()))
            }
            _ => false,
        };
        if escape {
            out.push('\\');
        }
        out.push(ch);
    }
}

fn starts_with_enum_marker(text: &str) -> bool {
    let digits = text.bytes().take_while(u8::is_ascii_digit).count();
    digits > 0 && text[digits..].starts_with('.')
}

/// A backtick fence longer than any backtick run in `text`, at least three.
fn raw_fence(text: &str) -> String {
    let longest = text
        .split(|c: char| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat((longest + 1).max(3))
}

/// Whether Typst reads all of `lang` as the language tag of a raw block.
fn is_raw_language(lang: &str) -> bool {
    let mut chars = lang.chars();
    chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

/// Quote a value for use inside a Typst string literal.
fn escape_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
