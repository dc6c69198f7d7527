use crate::block::Span;

/// Split paragraph or list item text into formatted spans.
///
/// Scans left to right for the earliest marker that closes: `**bold**`,
/// `*italic*` or `` `code` ``, each with the shortest non-empty content. At a
/// position where both `**` and `*` could open, `**` is tried first. A matched
/// span is taken whole and its content is not scanned again, so emphasis
/// never nests. Markers that never close stay in the plain text.
pub fn format(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut plain_start = 0;
    let mut pos = 0;

    while let Some(offset) = text[pos..].find(['*', '`']) {
        let start = pos + offset;
        match match_marker(text, start) {
            Some((span, end)) => {
                push_plain(&mut spans, &text[plain_start..start]);
                spans.push(span);
                plain_start = end;
                pos = end;
            }
            None => pos = start + 1,
        }
    }
    push_plain(&mut spans, &text[plain_start..]);

    spans
}

fn push_plain(spans: &mut Vec<Span>, text: &str) {
    if !text.is_empty() {
        spans.push(Span::Plain(text.to_string()));
    }
}

/// Try each marker at `start`, returning the span and the byte offset just past it.
fn match_marker(text: &str, start: usize) -> Option<(Span, usize)> {
    let rest = &text[start..];

    if let Some(inner) = delimited(rest, "**") {
        return Some((Span::Bold(inner.to_string()), start + inner.len() + 4));
    }
    if let Some(inner) = delimited(rest, "*") {
        return Some((Span::Italic(inner.to_string()), start + inner.len() + 2));
    }
    if let Some(inner) = delimited(rest, "`") {
        return Some((Span::Code(inner.to_string()), start + inner.len() + 2));
    }
    None
}

/// Content between an opening `marker` at the start of `rest` and the next
/// closing `marker`, at least one character long.
fn delimited<'a>(rest: &'a str, marker: &str) -> Option<&'a str> {
    let body = rest.strip_prefix(marker)?;
    let first = body.chars().next()?.len_utf8();
    let close = first + body[first..].find(marker)?;
    Some(&body[..close])
}
