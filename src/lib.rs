mod block;
mod config;
mod error;
mod inline;
mod parser;
mod session;
mod typst;

pub use block::{Block, Document, Span};
pub use config::{CodeConfig, Config, DocumentConfig, PageConfig, SeparatorConfig};
pub use error::{Error, Result};
pub use parser::{parse_block, segment_with_lines};
pub use session::{AppendReport, DocumentSession, DocumentStatus};
pub use typst::{blocks_to_typst, preamble};

use typst_as_lib::TypstEngine;
use typst_as_lib::typst_kit_options::TypstKitFontOptions;
use typst_pdf::PdfOptions;

/// Segment text into an ordered sequence of blocks.
pub fn segment(text: &str) -> Document {
    parser::segment(text)
}

/// Split paragraph or list item text into formatted spans.
pub fn format(text: &str) -> Vec<Span> {
    inline::format(text)
}

/// Convert markdown to Typst body markup, without a preamble.
pub fn markdown_to_typst(markdown: &str) -> String {
    typst::blocks_to_typst(&segment(markdown))
}

/// Convert markdown to a standalone Typst document with custom config.
pub fn markdown_to_typst_with_config(markdown: &str, config: &Config) -> String {
    let mut out = typst::preamble(config);
    out.push_str(&markdown_to_typst(markdown));
    out
}

/// Convert markdown to PDF bytes with custom config.
pub fn markdown_to_pdf(markdown: &str, config: &Config) -> Result<Vec<u8>> {
    typst_to_pdf(markdown_to_typst_with_config(markdown, config))
}

/// Compile Typst source to PDF bytes.
pub fn typst_to_pdf(source: String) -> Result<Vec<u8>> {
    use typst_library::layout::PagedDocument;

    let font_options = TypstKitFontOptions::new()
        .include_embedded_fonts(true)
        .include_system_fonts(true);

    let engine = TypstEngine::builder()
        .main_file(source)
        .search_fonts_with(font_options)
        .build();

    tracing::debug!("compiling typst document");
    let doc: PagedDocument = engine
        .compile()
        .output
        .map_err(|e| Error::Compile(format!("{:?}", e)))?;

    typst_pdf::pdf(&doc, &PdfOptions::default()).map_err(|e| Error::Export(format!("{:?}", e)))
}
