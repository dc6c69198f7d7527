use std::ops::Range;

use crate::block::Block;

const FENCE: &str = "```";
const MAX_HEADING_LEVEL: usize = 4;

/// What a single (right-trimmed) line looks like on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineKind<'a> {
    Blank,
    Heading { level: u8, text: &'a str },
    Bullet(&'a str),
    Numbered(&'a str),
    Fence { info: &'a str },
    Plain,
}

impl LineKind<'_> {
    /// Lines that start a block of their own and so end a paragraph.
    fn is_special(&self) -> bool {
        !matches!(self, LineKind::Blank | LineKind::Plain)
    }
}

/// Classify one line. Checked in the order heading, list item, fence, plain.
pub(crate) fn classify(line: &str) -> LineKind<'_> {
    if line.is_empty() {
        return LineKind::Blank;
    }
    if let Some((level, text)) = heading(line) {
        return LineKind::Heading { level, text };
    }
    if let Some(item) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        return LineKind::Bullet(item);
    }
    if let Some(item) = numbered_item(line) {
        return LineKind::Numbered(item);
    }
    if let Some(info) = line.strip_prefix(FENCE) {
        return LineKind::Fence { info };
    }
    LineKind::Plain
}

/// `#` through `####` followed by a space. Deeper runs of `#` are not headings.
fn heading(line: &str) -> Option<(u8, &str)> {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if hashes == 0 || hashes > MAX_HEADING_LEVEL {
        return None;
    }
    let text = line[hashes..].strip_prefix(' ')?;
    Some((hashes as u8, text))
}

/// `<digits>. ` prefix; the digit value itself is discarded.
fn numbered_item(line: &str) -> Option<&str> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    line[digits..].strip_prefix(". ")
}

/// Split input into lines, dropping terminators and trailing whitespace.
pub(crate) fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n').map(str::trim_end).collect()
}

/// Parse the next block starting at `cursor`, skipping blank lines first.
///
/// Returns the block together with the line range it was built from; the
/// range end is the cursor to resume from. `None` once only blank lines
/// remain.
pub fn parse_block(lines: &[&str], mut cursor: usize) -> Option<(Block, Range<usize>)> {
    while cursor < lines.len() && lines[cursor].is_empty() {
        cursor += 1;
    }
    let start = cursor;
    let line = *lines.get(cursor)?;

    let (block, end) = match classify(line) {
        LineKind::Heading { level, text } => (
            Block::Heading {
                level,
                text: text.to_string(),
            },
            cursor + 1,
        ),
        LineKind::Bullet(_) => {
            let (items, end) = collect_items(lines, cursor, |kind| match kind {
                LineKind::Bullet(item) => Some(item),
                _ => None,
            });
            (Block::BulletList { items }, end)
        }
        LineKind::Numbered(_) => {
            let (items, end) = collect_items(lines, cursor, |kind| match kind {
                LineKind::Numbered(item) => Some(item),
                _ => None,
            });
            (Block::NumberedList { items }, end)
        }
        LineKind::Fence { info } => code_block(lines, cursor, info),
        LineKind::Plain => paragraph(lines, cursor),
        LineKind::Blank => unreachable!("blank lines skipped above"),
    };

    Some((block, start..end))
}

/// Consume consecutive lines of one list marker family.
fn collect_items<'a>(
    lines: &[&'a str],
    mut cursor: usize,
    item: impl Fn(LineKind<'a>) -> Option<&'a str>,
) -> (Vec<String>, usize) {
    let mut items = Vec::new();
    while let Some(text) = lines.get(cursor).copied().and_then(|line| item(classify(line))) {
        items.push(text.to_string());
        cursor += 1;
    }
    (items, cursor)
}

/// Lines after the opening fence, verbatim, up to the closing fence or end of input.
fn code_block(lines: &[&str], open: usize, info: &str) -> (Block, usize) {
    let body_start = open + 1;
    let close = lines[body_start..]
        .iter()
        .position(|line| line.starts_with(FENCE))
        .map(|offset| body_start + offset);

    let text = lines[body_start..close.unwrap_or(lines.len())].join("\n");
    // Only the first word of the info string names the language
    let language = info.split_whitespace().next().map(str::to_string);

    let end = close.map_or(lines.len(), |close| close + 1);
    (Block::CodeBlock { language, text }, end)
}

fn paragraph(lines: &[&str], start: usize) -> (Block, usize) {
    let end = lines[start + 1..]
        .iter()
        .position(|line| {
            let kind = classify(line);
            kind == LineKind::Blank || kind.is_special()
        })
        .map_or(lines.len(), |offset| start + 1 + offset);

    let text = lines[start..end].join(" ");
    (Block::Paragraph { text }, end)
}

/// Segment text into an ordered sequence of blocks.
pub fn segment(text: &str) -> Vec<Block> {
    segment_with_lines(text)
        .into_iter()
        .map(|(block, _)| block)
        .collect()
}

/// Like [`segment`], also returning the input line range behind each block.
pub fn segment_with_lines(text: &str) -> Vec<(Block, Range<usize>)> {
    let lines = split_lines(text);
    let mut blocks = Vec::new();
    let mut cursor = 0;

    while let Some((block, span)) = parse_block(&lines, cursor) {
        tracing::trace!(lines = ?span, ?block, "segmented block");
        cursor = span.end;
        blocks.push((block, span));
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    fn para(text: &str) -> Block {
        Block::Paragraph {
            text: text.to_string(),
        }
    }

    fn code(text: &str) -> Block {
        Block::CodeBlock {
            language: None,
            text: text.to_string(),
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case("", LineKind::Blank)]
    #[case("# Title", LineKind::Heading { level: 1, text: "Title" })]
    #[case("## Two", LineKind::Heading { level: 2, text: "Two" })]
    #[case("### Three", LineKind::Heading { level: 3, text: "Three" })]
    #[case("#### Four", LineKind::Heading { level: 4, text: "Four" })]
    #[case("##### Five", LineKind::Plain)]
    #[case("#hashtag", LineKind::Plain)]
    #[case("#", LineKind::Plain)]
    #[case("- item", LineKind::Bullet("item"))]
    #[case("* item", LineKind::Bullet("item"))]
    #[case("-item", LineKind::Plain)]
    #[case("12. item", LineKind::Numbered("item"))]
    #[case("1.item", LineKind::Plain)]
    #[case("a. item", LineKind::Plain)]
    #[case("```", LineKind::Fence { info: "" })]
    #[case("```rust", LineKind::Fence { info: "rust" })]
    #[case("`` not a fence", LineKind::Plain)]
    #[case("  - indented", LineKind::Plain)]
    fn classifies_lines(#[case] line: &str, #[case] expected: LineKind) {
        assert_eq!(classify(line), expected);
    }

    #[test]
    fn heading_then_paragraph() {
        assert_eq!(
            segment("# Title\n\nSome text\nmore text\n"),
            vec![
                Block::Heading {
                    level: 1,
                    text: "Title".to_string()
                },
                para("Some text more text"),
            ]
        );
    }

    #[test]
    fn heading_levels() {
        let blocks = segment("# a\n## b\n### c\n#### d");
        let levels: Vec<u8> = blocks
            .iter()
            .map(|block| match block {
                Block::Heading { level, .. } => *level,
                other => panic!("expected heading, got {other:?}"),
            })
            .collect();
        assert_eq!(levels, vec![1, 2, 3, 4]);
    }

    #[test]
    fn heading_keeps_raw_remainder() {
        assert_eq!(
            segment("##  **Loud** title"),
            vec![Block::Heading {
                level: 2,
                text: " **Loud** title".to_string()
            }]
        );
    }

    #[test]
    fn five_hashes_is_a_paragraph() {
        assert_eq!(segment("##### Deep"), vec![para("##### Deep")]);
    }

    #[test]
    fn hash_without_space_continues_paragraph() {
        assert_eq!(
            segment("tagged with\n#rust"),
            vec![para("tagged with #rust")]
        );
    }

    #[test]
    fn bullet_then_numbered() {
        assert_eq!(
            segment("- a\n- b\n\n1. x\n1. y"),
            vec![
                Block::BulletList {
                    items: strings(&["a", "b"])
                },
                Block::NumberedList {
                    items: strings(&["x", "y"])
                },
            ]
        );
    }

    #[test]
    fn mixed_bullet_markers_share_a_list() {
        assert_eq!(
            segment("- a\n* b\n- c"),
            vec![Block::BulletList {
                items: strings(&["a", "b", "c"])
            }]
        );
    }

    #[test]
    fn switching_list_family_starts_new_list() {
        assert_eq!(
            segment("1. one\n- two\n2. three"),
            vec![
                Block::NumberedList {
                    items: strings(&["one"])
                },
                Block::BulletList {
                    items: strings(&["two"])
                },
                Block::NumberedList {
                    items: strings(&["three"])
                },
            ]
        );
    }

    #[test]
    fn blank_line_splits_list() {
        assert_eq!(
            segment("- a\n\n- b"),
            vec![
                Block::BulletList {
                    items: strings(&["a"])
                },
                Block::BulletList {
                    items: strings(&["b"])
                },
            ]
        );
    }

    #[test]
    fn plain_line_ends_list() {
        assert_eq!(
            segment("- a\ntrailing words"),
            vec![
                Block::BulletList {
                    items: strings(&["a"])
                },
                para("trailing words"),
            ]
        );
    }

    #[test]
    fn special_lines_end_paragraph() {
        assert_eq!(
            segment("intro\n- item\nmore\n# Head\nlast\n```\nx\n```"),
            vec![
                para("intro"),
                Block::BulletList {
                    items: strings(&["item"])
                },
                para("more"),
                Block::Heading {
                    level: 1,
                    text: "Head".to_string()
                },
                para("last"),
                code("x"),
            ]
        );
    }

    #[test]
    fn closed_fence() {
        assert_eq!(segment("```\ncode line\n```"), vec![code("code line")]);
    }

    #[test]
    fn open_fence_runs_to_end() {
        assert_eq!(segment("```\nopen"), vec![code("open")]);
        assert_eq!(
            segment("```\nopen\n\n# not a heading"),
            vec![code("open\n\n# not a heading")]
        );
    }

    #[test]
    fn fence_alone_is_empty_code_block() {
        assert_eq!(segment("```"), vec![code("")]);
        assert_eq!(segment("```\n```"), vec![code("")]);
    }

    #[test]
    fn fence_keeps_indentation_and_language() {
        assert_eq!(
            segment("```rust\nfn main() {\n    run();\n}\n```\nafter"),
            vec![
                Block::CodeBlock {
                    language: Some("rust".to_string()),
                    text: "fn main() {\n    run();\n}".to_string(),
                },
                para("after"),
            ]
        );
    }

    #[test]
    fn fence_info_keeps_first_word_only() {
        assert_eq!(
            segment("```rust ignore\nlet x = 1;\n```"),
            vec![Block::CodeBlock {
                language: Some("rust".to_string()),
                text: "let x = 1;".to_string(),
            }]
        );
        assert_eq!(segment("```   \nx\n```"), vec![code("x")]);
    }

    #[test]
    fn code_content_is_opaque() {
        let body = "# heading\n- bullet\n1. number\n\nplain";
        assert_eq!(segment(&format!("```\n{body}\n```")), vec![code(body)]);
    }

    #[test]
    fn crlf_and_trailing_whitespace_are_stripped() {
        assert_eq!(
            segment("# Title  \r\nline one \r\nline two\r\n"),
            vec![
                Block::Heading {
                    level: 1,
                    text: "Title".to_string()
                },
                para("line one line two"),
            ]
        );
    }

    #[rstest]
    #[case("")]
    #[case("\n")]
    #[case("   \n\t\n")]
    fn blank_input_has_no_blocks(#[case] input: &str) {
        assert_eq!(segment(input), Vec::<Block>::new());
    }

    #[test]
    fn parse_block_reports_line_range() {
        let lines = split_lines("\n\n- a\n- b\n\nnext");
        let (block, span) = parse_block(&lines, 0).unwrap();
        assert_eq!(
            block,
            Block::BulletList {
                items: strings(&["a", "b"])
            }
        );
        assert_eq!(span, 2..4);
        let (block, span) = parse_block(&lines, span.end).unwrap();
        assert_eq!(block, para("next"));
        assert_eq!(span, 5..6);
        assert_eq!(parse_block(&lines, span.end), None);
    }

    fn markdownish_line() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            Just("```".to_string()),
            "#{1,6} [a-z*`]{0,8}",
            "[-*] [a-z*`]{0,8}",
            "[0-9]{1,3}\\. [a-z]{0,8}",
            "[ a-z*`#]{1,12}",
        ]
    }

    proptest! {
        #[test]
        fn spans_are_disjoint_and_cover_non_blank_lines(
            lines in proptest::collection::vec(markdownish_line(), 0..24)
        ) {
            let text = lines.join("\n");
            let split = split_lines(&text);
            let segments = segment_with_lines(&text);

            let mut covered = vec![false; split.len()];
            let mut previous_end = 0;
            for (_, span) in &segments {
                prop_assert!(span.start >= previous_end);
                prop_assert!(span.start < span.end);
                for index in span.clone() {
                    covered[index] = true;
                }
                previous_end = span.end;
            }
            for (index, line) in split.iter().enumerate() {
                if !line.is_empty() {
                    prop_assert!(covered[index], "line {index} {line:?} not covered");
                }
            }
        }

        #[test]
        fn never_emits_separator(text in "[ -~\n]{0,200}") {
            prop_assert!(!segment(&text).contains(&Block::Separator));
        }
    }
}
