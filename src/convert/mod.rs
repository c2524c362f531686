//! Link conversion for the mirrored vault
//!
//! This module turns HedgeDoc server links into local wiki links and, once
//! that is done, optionally renames every file after its resolved title.
//!
//! # Components
//!
//! - `Converter`: Textual rewrite of `[text](ROOT/pad)` into `[[pad|text]]`
//! - `Converter::convert_parsed_links`: Relative, autolink and reference
//!   links taken from the parsed document, through `rewrite_links`
//! - `TranslationTable` / `rename_documents`: Two-phase rename pass
//! - `RenameManifest`: Which files earlier rename passes produced

mod converter;
mod rename;

pub use converter::{convert_document, rewrite_links, ConversionReport, Converter};
pub use rename::{
    is_safe_file_name, rename_documents, ReferenceRewriter, RenameManifest, RenameReport,
    TranslationTable, MANIFEST_FILE,
};
