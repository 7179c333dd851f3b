//! Streaming verification that input is already in canonical form.
//!
//! The formatted text is never materialized. Every character the parser
//! consumes and every chunk the formatter would write are folded into one
//! [`Reconciler`] that holds only the current surplus of one stream over the
//! other, so memory stays proportional to the peak divergence between the
//! two (in practice, one tag's worth).

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::error::{Error, Result};
use crate::formatter::{Formatter, TextSink};
use crate::options::FormatOptions;
use crate::parser::Parser;
use crate::scanner::CharSource;

/// True iff `input` is character-for-character its own formatting under
/// `options`, including the trailing line ending.
///
/// A divergence is an expected outcome and returns `Ok(false)`; only grammar
/// violations and unsupported constructs surface as errors.
pub fn check(input: &str, options: &FormatOptions) -> Result<bool> {
    let progress = Rc::new(RefCell::new(Reconciler::new()));

    let source = TapSource {
        chars: input.chars(),
        progress: Rc::clone(&progress),
    };
    let formatter = Formatter::new(
        TapSink {
            progress: Rc::clone(&progress),
        },
        *options,
    );

    let mut parser = Parser::new(source, formatter);
    match parser.parse_all() {
        // a leftover surplus usually means a trailing-newline or final
        // whitespace discrepancy
        Ok(()) => Ok(progress.borrow().is_settled()),
        Err(Error::Mismatch) => Ok(false),
        Err(e) => Err(e),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Reading,
    Writing,
}

/// Tracks which of the two streams is ahead, and by what text.
///
/// Chunks arrive through [`add`](Reconciler::add) from either side. While
/// one side is ahead, its surplus only grows; a chunk from the other side
/// must match the front of that surplus and consumes it, flipping sides once
/// the surplus is exhausted. Any non-prefix comparison is a mismatch and
/// ends the check immediately.
struct Reconciler {
    side: Side,
    excess: String,
}

impl Reconciler {
    fn new() -> Self {
        Reconciler {
            side: Side::Reading,
            excess: String::new(),
        }
    }

    /// True when neither stream is ahead of the other.
    fn is_settled(&self) -> bool {
        self.excess.is_empty()
    }

    /// Fold one chunk from either stream into the surplus.
    fn add(&mut self, side: Side, text: &str) -> Result<()> {
        trace!(?side, text = ?text, excess = ?self.excess, "reconcile");

        if self.excess.is_empty() || self.side == side {
            self.side = side;
            self.excess.push_str(text);
        } else if text.len() < self.excess.len() {
            // the chunk cannot exhaust the surplus
            if !self.excess.starts_with(text) {
                return Err(Error::Mismatch);
            }
            self.excess.drain(..text.len());
        } else {
            // the chunk exhausts the surplus, so the lead flips over
            if !text.starts_with(self.excess.as_str()) {
                return Err(Error::Mismatch);
            }
            self.side = side;
            self.excess = text[self.excess.len()..].to_owned();
        }

        Ok(())
    }
}

/// Records every character the parser consumes as reading-side progress.
///
/// Pushback lives above this source, in the parser's reader, so a character
/// pushed back and read again is recorded exactly once.
struct TapSource<'a> {
    chars: std::str::Chars<'a>,
    progress: Rc<RefCell<Reconciler>>,
}

impl CharSource for TapSource<'_> {
    fn next_char(&mut self) -> Result<Option<char>> {
        let next = self.chars.next();
        if let Some(c) = next {
            let mut buf = [0u8; 4];
            self.progress
                .borrow_mut()
                .add(Side::Reading, c.encode_utf8(&mut buf))?;
        }
        Ok(next)
    }
}

/// Records every chunk the formatter writes as writing-side progress.
struct TapSink {
    progress: Rc<RefCell<Reconciler>>,
}

impl TextSink for TapSink {
    fn write_str(&mut self, text: &str) -> Result<()> {
        self.progress.borrow_mut().add(Side::Writing, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(input: &str) -> bool {
        check(input, &FormatOptions::default()).unwrap()
    }

    #[test]
    fn test_reconciler_extends_and_consumes() {
        let mut r = Reconciler::new();
        r.add(Side::Reading, "<root />\n").unwrap();
        r.add(Side::Writing, "<root").unwrap();
        assert_eq!(r.excess, " />\n");
        assert_eq!(r.side, Side::Reading);
        r.add(Side::Writing, " />").unwrap();
        r.add(Side::Writing, "\n").unwrap();
        assert!(r.is_settled());
    }

    #[test]
    fn test_reconciler_flips_sides() {
        let mut r = Reconciler::new();
        r.add(Side::Reading, "<a").unwrap();
        r.add(Side::Writing, "<a>").unwrap();
        assert_eq!(r.side, Side::Writing);
        assert_eq!(r.excess, ">");
        r.add(Side::Reading, ">").unwrap();
        assert!(r.is_settled());
    }

    #[test]
    fn test_reconciler_rejects_non_prefix() {
        let mut r = Reconciler::new();
        r.add(Side::Reading, "<a/>").unwrap();
        assert!(matches!(r.add(Side::Writing, "<b"), Err(Error::Mismatch)));
    }

    #[test]
    fn test_canonical_input_passes() {
        assert!(ok("<a>\n  <b x=\"1\" />\n</a>\n"));
        assert!(ok("<p>hello</p>\n"));
        assert!(ok(""));
    }

    #[test]
    fn test_unformatted_input_fails() {
        assert!(!ok("<a><b x=\"1\"/></a>"));
        assert!(!ok("<a  ></a>"));
    }

    #[test]
    fn test_missing_trailing_newline_fails() {
        assert!(!ok("<p>hello</p>"));
    }

    #[test]
    fn test_trailing_blank_line_fails() {
        assert!(!ok("<p>hello</p>\n\n"));
    }

    #[test]
    fn test_wrong_indentation_fails() {
        assert!(!ok("<a>\n    <b />\n</a>\n"));
    }

    #[test]
    fn test_grammar_errors_still_propagate() {
        assert!(check("<!-- -- -->", &FormatOptions::default()).is_err());
    }

    #[test]
    fn test_check_agrees_with_format() {
        let inputs = [
            "<a><b/></a>",
            "<a>\n  <b />\n</a>\n",
            "<p>hi</p>\n",
            "<a/>\n\n\n<b/>",
        ];
        for input in inputs {
            let formatted =
                crate::formatter::format_to_string(input, &FormatOptions::default()).unwrap();
            assert_eq!(ok(input), formatted == input, "{input:?}");
        }
    }
}
