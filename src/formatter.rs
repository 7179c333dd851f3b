//! Single-pass, width-aware layout of the event stream.
//!
//! The formatter commits to each tag's line layout the moment the tag opens,
//! before any of its children are known, from a closed-form length
//! computation. Only two things are ever held back:
//! - the attributes of a tag that fits as `<name attrs>` but not as
//!   `<name attrs />`, until its emptiness is known;
//! - one short text child that may keep the whole element on one physical
//!   line, until a sibling demotes it or the end tag collapses it.
//!
//! The formatted document is never materialized here; chunks go straight to
//! a [`TextSink`].

use std::io;

use tracing::trace;

use crate::error::{Error, Result};
use crate::event::{EventSink, MarkupEvent};
use crate::options::FormatOptions;
use crate::parser::Parser;

/// Receiver for formatted text chunks.
pub trait TextSink {
    /// Write one chunk.
    fn write_str(&mut self, text: &str) -> Result<()>;
}

impl TextSink for String {
    #[inline]
    fn write_str(&mut self, text: &str) -> Result<()> {
        self.push_str(text);
        Ok(())
    }
}

/// Adapter from [`io::Write`] to [`TextSink`].
struct IoSink<W>(W);

impl<W: io::Write> TextSink for IoSink<W> {
    fn write_str(&mut self, text: &str) -> Result<()> {
        self.0.write_all(text.as_bytes())?;
        Ok(())
    }
}

/// Format `input`, writing the styled text to `output`.
///
/// The entire input is consumed and the output is flushed on success. The
/// first grammar violation aborts the run with no partial-output guarantee.
pub fn format<W: io::Write>(input: &str, output: W, options: &FormatOptions) -> Result<()> {
    let formatter = Formatter::new(IoSink(output), *options);
    let mut parser = Parser::new(input.chars(), formatter);
    parser.parse_all()?;

    let mut sink = parser.into_sink().into_sink();
    sink.0.flush()?;
    Ok(())
}

/// Format `input` into a fresh string.
pub fn format_to_string(input: &str, options: &FormatOptions) -> Result<String> {
    let formatter = Formatter::new(String::new(), *options);
    let mut parser = Parser::new(input.chars(), formatter);
    parser.parse_all()?;
    Ok(parser.into_sink().into_sink())
}

/// Layout classification of the currently open tag, decided at open time.
#[derive(Debug)]
enum OpenTag {
    /// Fits on one physical line; attributes are already written.
    OneLine { inline: InlineChild },

    /// Fits on one line only if the element turns out non-empty; attributes
    /// are held back until that is known.
    OneLineUnlessEmpty { attrs: Vec<String> },

    /// Does not fit; attributes are already written one per line.
    MultipleLines,
}

/// A single short text child that may keep its element on one physical line.
#[derive(Debug)]
enum InlineChild {
    /// No room is left for any inline text.
    None,

    /// Room for a newline-free text child of at most this many characters.
    Budget(usize),

    /// The buffered text child, not yet written.
    Text(String),
}

/// Writes the event stream as styled text under a fixed [`FormatOptions`].
///
/// One instance serves one run; the pending-tag state never survives past
/// the next event.
pub struct Formatter<W> {
    out: W,
    options: FormatOptions,
    indent: usize,
    pending: Option<OpenTag>,
}

impl<W: TextSink> Formatter<W> {
    /// Create a formatter writing chunks into `out`.
    pub fn new(out: W, options: FormatOptions) -> Self {
        Formatter {
            out,
            options,
            indent: 0,
            pending: None,
        }
    }

    /// Consume the formatter and return its sink.
    pub fn into_sink(self) -> W {
        self.out
    }

    fn eol(&mut self) -> Result<()> {
        self.out.write_str(self.options.end_of_line.as_str())
    }

    fn write_indent(&mut self) -> Result<()> {
        let rendered = if self.options.use_tabs {
            "\t".repeat(self.indent)
        } else {
            " ".repeat(self.indent * self.options.tab_width)
        };
        self.out.write_str(&rendered)
    }

    /// Columns consumed by the current indentation. Charged as
    /// `indent * tab_width` even when tabs render, so wrap decisions do not
    /// move with the tab/space configuration.
    fn indent_columns(&self) -> usize {
        self.indent * self.options.tab_width
    }

    fn empty_tag(&mut self, name: &str, attrs: &[String]) -> Result<()> {
        self.finish_pending(None)?;

        let one_line = if self.options.single_attribute_per_line {
            false
        } else {
            let mut line_length = self.indent_columns() + 1 + char_len(name);
            for attr in attrs {
                line_length += 1 + char_len(attr);
            }
            line_length += 3; // " />"
            trace!(line_length, "empty tag layout");
            line_length <= self.options.print_width
        };

        self.write_tag_open(name, attrs, one_line)?;
        self.out.write_str(if one_line || self.options.bracket_same_line {
            " />"
        } else {
            "/>"
        })?;
        self.eol()
    }

    fn start_tag(&mut self, name: &str, attrs: Vec<String>) -> Result<()> {
        self.finish_pending(None)?;

        let mut line_length = self.indent_columns() + 1 + char_len(name);
        for attr in &attrs {
            line_length += 1 + char_len(attr);
        }
        trace!(line_length, "start tag layout");

        let open = if attrs.is_empty() || line_length + 3 <= self.options.print_width {
            // guaranteed to fit even if the tag turns out empty and closes
            // with " />"; attribute-less tags always stay on one line
            self.write_tag_open(name, &attrs, true)?;

            // remaining room for a lone text child that would keep the
            // whole element on one physical line: <name attrs>text</name>
            let full_length = line_length + 1 + 2 + char_len(name) + 1;
            let inline = match self.options.print_width.checked_sub(full_length) {
                Some(budget) if budget > 0 => InlineChild::Budget(budget),
                _ => InlineChild::None,
            };
            OpenTag::OneLine { inline }
        } else if self.options.single_attribute_per_line
            || line_length + 1 > self.options.print_width
        {
            // guaranteed not to fit even as a plain ">" start tag
            self.write_tag_open(name, &attrs, false)?;
            OpenTag::MultipleLines
        } else {
            // fits as "<name attrs>" but not as "<name attrs />": the
            // attributes cannot be written until emptiness is known
            self.write_indent()?;
            self.out.write_str("<")?;
            self.out.write_str(name)?;
            OpenTag::OneLineUnlessEmpty { attrs }
        };

        self.pending = Some(open);
        Ok(())
    }

    /// Indent and write `<name`, then the attributes.
    fn write_tag_open(&mut self, name: &str, attrs: &[String], one_line: bool) -> Result<()> {
        self.write_indent()?;
        self.out.write_str("<")?;
        self.out.write_str(name)?;

        if attrs.is_empty() {
            return Ok(());
        }
        self.write_attributes(attrs, one_line)
    }

    /// Attributes, space-separated or one per indented line. In the
    /// multi-line form the closing bracket starts a fresh line unless
    /// `bracket_same_line` keeps it on the last attribute's line.
    fn write_attributes(&mut self, attrs: &[String], one_line: bool) -> Result<()> {
        self.indent += 1;
        for attr in attrs {
            if one_line {
                self.out.write_str(" ")?;
            } else {
                self.eol()?;
                self.write_indent()?;
            }
            self.out.write_str(attr)?;
        }
        self.indent -= 1;

        if !(one_line || self.options.bracket_same_line) {
            self.eol()?;
            self.write_indent()?;
        }
        Ok(())
    }

    /// Resolve the pending tag, if any, before the next event takes effect.
    ///
    /// `end_tag` carries the closing tag's name when the next event is the
    /// element's own end tag, the one case that can still collapse the
    /// element onto a single physical line or into an empty-tag form.
    fn finish_pending(&mut self, end_tag: Option<&str>) -> Result<()> {
        let Some(open) = self.pending.take() else {
            // nothing in progress, so the writer sits on a fresh line
            if let Some(name) = end_tag {
                self.indent = self
                    .indent
                    .checked_sub(1)
                    .ok_or_else(|| Error::grammar("end tag without a matching start tag"))?;
                self.write_indent()?;
                self.out.write_str("</")?;
                self.out.write_str(name)?;
                self.out.write_str(">")?;
                self.eol()?;
            }
            return Ok(());
        };

        let (one_line, inline_text) = match open {
            OpenTag::OneLine { inline } => {
                let text = match inline {
                    InlineChild::Text(text) => Some(text),
                    InlineChild::None | InlineChild::Budget(_) => None,
                };
                (true, text)
            }
            OpenTag::MultipleLines => (false, None),
            OpenTag::OneLineUnlessEmpty { attrs } => {
                // emptiness is known now: nothing can be buffered in this
                // state, so the element is empty iff its end tag is next
                let one_line = end_tag.is_none();
                self.write_attributes(&attrs, one_line)?;
                (one_line, None)
            }
        };

        let empty = inline_text.is_none() && end_tag.is_some();
        trace!(one_line, empty, "resolving open tag");

        self.out.write_str(if !empty {
            ">"
        } else if one_line || self.options.bracket_same_line {
            " />"
        } else {
            "/>"
        })?;

        // children of a surviving start tag sit one level deeper
        if end_tag.is_none() {
            self.indent += 1;
        }

        if let Some(text) = inline_text {
            match end_tag {
                Some(name) => {
                    // the element collapses to <name attrs>text</name>
                    self.out.write_str(&text)?;
                    self.out.write_str("</")?;
                    self.out.write_str(name)?;
                    self.out.write_str(">")?;
                }
                None => {
                    // a sibling demoted the buffered text to a plain child
                    self.eol()?;
                    self.write_indent()?;
                    self.out.write_str(&text)?;
                }
            }
        }

        self.eol()
    }

    fn text(&mut self, content: String) -> Result<()> {
        if let Some(OpenTag::OneLine { inline }) = &mut self.pending {
            if let InlineChild::Budget(budget) = inline {
                if char_len(&content) <= *budget && !content.contains('\n') {
                    trace!(text = ?content, "buffering inline text child");
                    *inline = InlineChild::Text(content);
                    return Ok(());
                }
            }
        }

        self.finish_pending(None)?;
        self.write_indent()?;
        self.out.write_str(&content)?;
        self.eol()
    }

    fn blank_line(&mut self) -> Result<()> {
        self.finish_pending(None)?;
        self.eol()
    }

    /// A construct written verbatim on its own indented line between fixed
    /// delimiters.
    fn delimited(&mut self, before: &str, content: &str, after: &str) -> Result<()> {
        self.finish_pending(None)?;
        self.write_indent()?;
        self.out.write_str(before)?;
        self.out.write_str(content)?;
        self.out.write_str(after)?;
        self.eol()
    }
}

impl<W: TextSink> EventSink for Formatter<W> {
    fn event(&mut self, event: MarkupEvent) -> Result<()> {
        match event {
            MarkupEvent::StartTag { name, attrs } => self.start_tag(&name, attrs),
            MarkupEvent::EmptyTag { name, attrs } => self.empty_tag(&name, &attrs),
            MarkupEvent::EndTag { name } => self.finish_pending(Some(&name)),
            MarkupEvent::Text { content } => self.text(content),
            MarkupEvent::BlankLine => self.blank_line(),
            MarkupEvent::ProcessingInstruction { raw } => self.delimited("<?", &raw, "?>"),
            MarkupEvent::Doctype { raw } => self.delimited("", &raw, ""),
            MarkupEvent::Cdata { content } => self.delimited("<![CDATA[", &content, "]]>"),
            MarkupEvent::Comment { content } => self.delimited("<!--", &content, "-->"),
        }
    }
}

/// Width arithmetic counts characters, the same unit the input is read in.
fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::LineEnding;

    fn fmt(input: &str) -> String {
        format_to_string(input, &FormatOptions::default()).unwrap()
    }

    fn fmt_with(input: &str, options: &FormatOptions) -> String {
        format_to_string(input, options).unwrap()
    }

    #[test]
    fn test_basic_nesting() {
        assert_eq!(fmt("<a><b x=\"1\"/></a>"), "<a>\n  <b x=\"1\" />\n</a>\n");
    }

    #[test]
    fn test_empty_element_pair_collapses() {
        assert_eq!(fmt("<a></a>"), "<a />\n");
    }

    #[test]
    fn test_inline_text_collapses() {
        assert_eq!(fmt("<p>hello</p>"), "<p>hello</p>\n");
    }

    #[test]
    fn test_inline_text_demoted_by_sibling() {
        assert_eq!(
            fmt("<a>short<b/></a>"),
            "<a>\n  short\n  <b />\n</a>\n"
        );
    }

    #[test]
    fn test_text_beyond_budget_goes_on_its_own_line() {
        // "<p></p>" is 7 columns, leaving 73 for an inline text child
        let fits = "x".repeat(73);
        assert_eq!(fmt(&format!("<p>{fits}</p>")), format!("<p>{fits}</p>\n"));

        let too_long = "x".repeat(74);
        assert_eq!(
            fmt(&format!("<p>{too_long}</p>")),
            format!("<p>\n  {too_long}\n</p>\n")
        );
    }

    #[test]
    fn test_no_inline_budget_for_very_long_names() {
        // zero-attribute tags stay on one line no matter how long the name,
        // but no inline budget remains
        let name = "n".repeat(40);
        assert_eq!(
            fmt(&format!("<{name}>x</{name}>")),
            format!("<{name}>\n  x\n</{name}>\n")
        );
    }

    #[test]
    fn test_attributes_wrap_beyond_print_width() {
        let long = "v".repeat(80);
        let input = format!("<a x=\"{long}\"/>");
        assert_eq!(fmt(&input), format!("<a\n  x=\"{long}\"\n/>\n"));
    }

    #[test]
    fn test_deferred_tag_resolves_empty() {
        // 79 columns as "<a x=...>", 81 as "<a x=... />": emptiness decides
        let value = "v".repeat(71);
        let input = format!("<a x=\"{value}\"></a>");
        assert_eq!(fmt(&input), format!("<a\n  x=\"{value}\"\n/>\n"));
    }

    #[test]
    fn test_deferred_tag_resolves_with_children() {
        let value = "v".repeat(71);
        let input = format!("<a x=\"{value}\"><b/></a>");
        assert_eq!(
            fmt(&input),
            format!("<a x=\"{value}\">\n  <b />\n</a>\n")
        );
    }

    #[test]
    fn test_single_attribute_per_line_on_empty_tag() {
        let options = FormatOptions {
            single_attribute_per_line: true,
            ..FormatOptions::default()
        };
        assert_eq!(
            fmt_with("<a x=\"1\" y=\"2\"/>", &options),
            "<a\n  x=\"1\"\n  y=\"2\"\n/>\n"
        );
        // with no attributes there is no line to split, and no space before
        // the bracket either
        assert_eq!(fmt_with("<br/>", &options), "<br/>\n");
    }

    #[test]
    fn test_single_attribute_per_line_on_start_tag() {
        let options = FormatOptions {
            single_attribute_per_line: true,
            ..FormatOptions::default()
        };

        // a start tag in the guaranteed-fit range commits to one line before
        // the option is consulted
        assert_eq!(
            fmt_with("<a x=\"1\">hi</a>", &options),
            "<a x=\"1\">hi</a>\n"
        );

        // outside that range the option forces one attribute per line
        let value = "v".repeat(71);
        assert_eq!(
            fmt_with(&format!("<a x=\"{value}\"><b/></a>"), &options),
            format!("<a\n  x=\"{value}\"\n>\n  <b />\n</a>\n")
        );
    }

    #[test]
    fn test_bracket_same_line() {
        let options = FormatOptions {
            bracket_same_line: true,
            ..FormatOptions::default()
        };
        let long = "v".repeat(80);
        assert_eq!(
            fmt_with(&format!("<a x=\"{long}\"/>"), &options),
            format!("<a\n  x=\"{long}\" />\n")
        );
        assert_eq!(
            fmt_with(&format!("<a x=\"{long}\">t</a>"), &options),
            format!("<a\n  x=\"{long}\">\n  t\n</a>\n")
        );
    }

    #[test]
    fn test_bracket_same_line_deferred_empty_matches_direct_form() {
        let options = FormatOptions {
            bracket_same_line: true,
            ..FormatOptions::default()
        };
        let value = "v".repeat(71);
        let as_pair = format!("<a x=\"{value}\"></a>");
        let as_empty = format!("<a x=\"{value}\"/>");
        assert_eq!(
            fmt_with(&as_pair, &options),
            fmt_with(&as_empty, &options)
        );
    }

    #[test]
    fn test_tabs_render_but_width_still_counts_tab_width() {
        let options = FormatOptions {
            use_tabs: true,
            ..FormatOptions::default()
        };
        assert_eq!(
            fmt_with("<a><b x=\"1\"/></a>", &options),
            "<a>\n\t<b x=\"1\" />\n</a>\n"
        );
    }

    #[test]
    fn test_crlf_line_endings() {
        let options = FormatOptions {
            end_of_line: LineEnding::Crlf,
            ..FormatOptions::default()
        };
        assert_eq!(
            fmt_with("<a><b/></a>", &options),
            "<a>\r\n  <b />\r\n</a>\r\n"
        );
    }

    #[test]
    fn test_blank_line_between_siblings() {
        assert_eq!(fmt("<a/>\n\n\n<b/>"), "<a />\n\n<b />\n");
    }

    #[test]
    fn test_leading_blank_lines_do_not_survive() {
        assert_eq!(fmt("\n\n<a/>"), "<a />\n");
    }

    #[test]
    fn test_comment_cdata_doctype_pi_on_their_own_lines() {
        assert_eq!(fmt("<!-- c -->"), "<!-- c -->\n");
        assert_eq!(fmt("<a><![CDATA[x]]></a>"), "<a>\n  <![CDATA[x]]>\n</a>\n");
        assert_eq!(fmt("<!DOCTYPE html>"), "<!DOCTYPE html>\n");
        assert_eq!(
            fmt("<?xml version=\"1.0\"?>"),
            "<?xml version=\"1.0\"?>\n"
        );
    }

    #[test]
    fn test_unbalanced_end_tag_is_an_error() {
        assert!(format_to_string("</a>", &FormatOptions::default()).is_err());
    }

    #[test]
    fn test_format_into_io_writer() {
        let mut out = Vec::new();
        format("<a></a>", &mut out, &FormatOptions::default()).unwrap();
        assert_eq!(out, b"<a />\n");
    }
}
