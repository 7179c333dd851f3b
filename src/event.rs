//! Markup events and the sink abstraction that consumes them.
//!
//! The parser turns its input into an ordered stream of [`MarkupEvent`]s and
//! pushes each one into an [`EventSink`]. Events are transient: produced,
//! consumed, discarded. No document tree is ever built.

use crate::error::Result;

/// One construct recognized by the [`Parser`](crate::Parser).
///
/// Attribute strings keep their source form, `key=<quote>value<quote>`: the
/// original quote character is preserved and entity references inside the
/// value are neither decoded nor re-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupEvent {
    /// Start of an element: `<name attrs>`
    StartTag { name: String, attrs: Vec<String> },

    /// Self-closing element: `<name attrs />`
    EmptyTag { name: String, attrs: Vec<String> },

    /// End of an element: `</name>`
    ///
    /// The name is not checked against the enclosing start tag.
    EndTag { name: String },

    /// A text run, leading and trailing whitespace already trimmed.
    Text { content: String },

    /// Two or more consecutive newlines appeared at this position.
    BlankLine,

    /// XML declaration or processing instruction, without `<?` and `?>`.
    ProcessingInstruction { raw: String },

    /// DOCTYPE declaration, including the `<!DOCTYPE` and `>` delimiters.
    Doctype { raw: String },

    /// CDATA section content, without `<![CDATA[` and `]]>`.
    Cdata { content: String },

    /// Comment content, without `<!--` and `-->`.
    Comment { content: String },
}

impl MarkupEvent {
    /// The tag name, if this is a start, empty, or end tag.
    pub fn tag_name(&self) -> Option<&str> {
        match self {
            MarkupEvent::StartTag { name, .. }
            | MarkupEvent::EmptyTag { name, .. }
            | MarkupEvent::EndTag { name } => Some(name),
            _ => None,
        }
    }
}

/// Receiver for the parser's event stream.
///
/// The parser calls [`event`](EventSink::event) once per construct, in
/// document order, and never buffers more than the construct it is currently
/// reading. An error return aborts the whole run.
pub trait EventSink {
    /// Consume one event.
    fn event(&mut self, event: MarkupEvent) -> Result<()>;
}

/// Collects the event stream, mostly useful in tests.
impl EventSink for Vec<MarkupEvent> {
    fn event(&mut self, event: MarkupEvent) -> Result<()> {
        self.push(event);
        Ok(())
    }
}
