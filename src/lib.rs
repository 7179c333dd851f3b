//! prettyxml - deterministic pretty-printing for an XML/XHTML subset
//!
//! A single-pass reformatter: given raw markup and a fixed [`FormatOptions`],
//! [`format`] produces canonical, width-aware, idempotent output, and
//! [`check`] verifies that input already is its own formatting, in one pass
//! and without ever materializing the formatted text.
//!
//! The crate is built from three pieces:
//! - [`Parser`]: streaming recursive descent over the grammar subset, with
//!   exactly one character of pushback, emitting [`MarkupEvent`]s
//! - [`Formatter`]: an [`EventSink`] that commits to line-layout decisions
//!   on the fly, never holding more than one open tag and one short text
//!   child
//! - the checker: reconciles the parser's consumed characters against the
//!   formatter's would-be output, chunk by chunk
//!
//! ```
//! use prettyxml::{check, format_to_string, FormatOptions};
//!
//! let options = FormatOptions::default();
//! let formatted = format_to_string("<a><b x=\"1\"/></a>", &options).unwrap();
//! assert_eq!(formatted, "<a>\n  <b x=\"1\" />\n</a>\n");
//!
//! assert!(check(&formatted, &options).unwrap());
//! assert!(!check("<a><b x=\"1\"/></a>", &options).unwrap());
//! ```
//!
//! Formatting is intentionally lenient where full XML validation is not
//! needed for layout: end tag names are not matched against start tags, and
//! attribute values keep their original quote characters and entity
//! references untouched. Grammar violations outside the supported subset
//! abort the run with an [`Error`].
//!
//! Logging goes through the [`tracing`] facade and is a no-op unless the
//! embedding application installs a subscriber; it never influences output.

pub mod checker;
pub mod error;
pub mod event;
pub mod formatter;
pub mod options;
pub mod parser;
pub mod scanner;

pub use checker::check;
pub use error::{Error, Result};
pub use event::{EventSink, MarkupEvent};
pub use formatter::{format, format_to_string, Formatter, TextSink};
pub use options::{FormatOptions, LineEnding};
pub use parser::Parser;
pub use scanner::CharSource;
