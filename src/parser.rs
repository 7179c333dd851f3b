//! Streaming recursive-descent parser for the supported XML/XHTML subset.
//!
//! The parser drives a [`CharSource`] through a single-pushback reader and
//! emits [`MarkupEvent`]s into an [`EventSink`] as each construct completes.
//! Supported productions:
//! - Names (XML 1.1 name character classes)
//! - Character data, with lexically validated entity references
//! - Start, end, and empty element tags
//! - Comments, CDATA sections, DOCTYPE declarations
//! - XML declarations and processing instructions
//!
//! Any grammar violation aborts the whole parse; there is no recovery and no
//! position reporting. End tag names are not matched against their enclosing
//! start tags.

use tracing::trace;

use crate::error::{Error, Result};
use crate::event::{EventSink, MarkupEvent};
use crate::scanner::{self, CharReader, CharSource};

/// Recursive-descent parser pushing events into a sink.
pub struct Parser<S, E> {
    reader: CharReader<S>,
    sink: E,
    started: bool,
}

impl<S: CharSource, E: EventSink> Parser<S, E> {
    /// Create a parser reading from `source` and emitting into `sink`.
    pub fn new(source: S, sink: E) -> Self {
        Parser {
            reader: CharReader::new(source),
            sink,
            started: false,
        }
    }

    /// Consume the parser and return its sink.
    pub fn into_sink(self) -> E {
        self.sink
    }

    /// Parse the entire input, draining the source.
    pub fn parse_all(&mut self) -> Result<()> {
        while self.parse_one_step()? {}
        Ok(())
    }

    /// Parse one top-level construct: one tag, or one run of character data.
    ///
    /// Returns `true` while input remains, which makes incremental driving
    /// possible (the checker stops on the first divergence it hits).
    pub fn parse_one_step(&mut self) -> Result<bool> {
        let Some(c) = self.reader.read()? else {
            return Ok(false);
        };

        if c == '<' {
            self.parse_tag()?;
            self.started = true;
            return Ok(true);
        }
        self.reader.unread(c);

        // raw character data, without any trimming
        let raw = self.parse_char_data(None)?;

        let at_eof = match self.reader.read()? {
            None => true,
            Some(next) => {
                self.reader.unread(next);
                false
            }
        };

        let trimmed_start = raw.trim_start_matches(scanner::is_whitespace);
        if trimmed_start.is_empty() {
            // an all-whitespace run still produces a blank line if it held
            // two or more newlines; larger counts collapse to one. blank
            // lines survive only between constructs: a run that starts or
            // ends the input produces nothing.
            if self.started && !at_eof && has_multiple_newlines(&raw) {
                self.sink.event(MarkupEvent::BlankLine)?;
            } else {
                trace!(raw = ?raw, "whitespace-only character data");
            }
            return Ok(true);
        }

        let prefix = &raw[..raw.len() - trimmed_start.len()];
        if self.started && has_multiple_newlines(prefix) {
            self.sink.event(MarkupEvent::BlankLine)?;
        }
        self.started = true;

        // the text itself is not re-indented or re-wrapped
        let content = trimmed_start.trim_end_matches(scanner::is_whitespace);
        self.sink.event(MarkupEvent::Text {
            content: content.to_string(),
        })?;

        let suffix = &trimmed_start[content.len()..];
        if has_multiple_newlines(suffix) {
            self.sink.event(MarkupEvent::BlankLine)?;
        }

        Ok(true)
    }

    /// Character data, optionally terminated by a known string (the closing
    /// quote of an attribute value). Entity references are validated and
    /// kept verbatim; a `<` always ends the run and stays in the stream.
    fn parse_char_data(&mut self, terminator: Option<&str>) -> Result<String> {
        let mut buf = String::new();
        let mut terminated = false;

        loop {
            if let Some(end) = terminator {
                if buf.ends_with(end) {
                    buf.truncate(buf.len() - end.len());
                    terminated = true;
                    break;
                }
            }

            let Some(c) = self.reader.read()? else {
                break;
            };

            if c == '<' {
                self.reader.unread('<');
                break;
            }

            if c == '&' {
                let reference = self.parse_reference()?;
                buf.push_str(&reference);
                continue;
            }

            buf.push(c);
        }

        if let Some(end) = terminator {
            if !terminated {
                return Err(Error::grammar(format!(
                    "expected '{end}' before end of character data"
                )));
            }
        }

        Ok(buf)
    }

    /// An entity reference, already past its `&`. The reference is validated
    /// lexically and returned verbatim, never decoded.
    fn parse_reference(&mut self) -> Result<String> {
        let Some(c) = self.reader.read()? else {
            return Err(Error::grammar("unterminated reference"));
        };

        if c != '#' {
            // named reference, like &nbsp;
            self.reader.unread(c);
            let name = self.parse_name()?;
            self.expect_char(';')?;
            return Ok(format!("&{name};"));
        }

        // numeric character reference: decimal, or hex after an 'x'
        let mut buf = String::from("&#");
        let mut next = self.reader.read()?;
        let accepts: fn(char) -> bool = if next == Some('x') {
            buf.push('x');
            next = self.reader.read()?;
            scanner::is_hex_digit
        } else {
            scanner::is_digit
        };

        let mut any_digits = false;
        while let Some(d) = next {
            if !accepts(d) {
                break;
            }
            any_digits = true;
            buf.push(d);
            next = self.reader.read()?;
        }
        if !any_digits {
            return Err(Error::grammar("expected digits in character reference"));
        }

        match next {
            Some(';') => {
                buf.push(';');
                Ok(buf)
            }
            other => Err(unexpected(';', other)),
        }
    }

    /// A name: one name-start character followed by name characters. The
    /// first non-name character goes back into the stream.
    fn parse_name(&mut self) -> Result<String> {
        let mut name = String::new();

        match self.reader.read()? {
            Some(c) if scanner::is_name_start_char(c) => name.push(c),
            Some(c) => {
                return Err(Error::grammar(format!(
                    "expected name start character, found '{c}'"
                )))
            }
            None => {
                return Err(Error::grammar(
                    "expected name start character, found end of input",
                ))
            }
        }

        loop {
            match self.reader.read()? {
                Some(c) if scanner::is_name_char(c) => name.push(c),
                Some(c) => {
                    self.reader.unread(c);
                    break;
                }
                None => break,
            }
        }

        Ok(name)
    }

    /// Skip a whitespace run. Whitespace between tag internals is never
    /// preserved, so nothing is returned.
    fn skip_whitespace(&mut self) -> Result<()> {
        loop {
            match self.reader.read()? {
                Some(c) if scanner::is_whitespace(c) => {}
                Some(c) => {
                    self.reader.unread(c);
                    return Ok(());
                }
                None => return Ok(()),
            }
        }
    }

    /// Dispatch on the character after a `<`.
    fn parse_tag(&mut self) -> Result<()> {
        let Some(c) = self.reader.read()? else {
            return Err(Error::grammar("unclosed tag"));
        };

        match c {
            '?' => self.parse_question(),
            '!' => self.parse_exclamation(),
            '/' => self.parse_end_tag(),
            _ => {
                self.reader.unread(c);
                self.parse_start_tag()
            }
        }
    }

    /// A start or empty tag: `name (ws? key ws? = ws? quoted-value)* (/> | >)`.
    fn parse_start_tag(&mut self) -> Result<()> {
        let name = self.parse_name()?;

        // attributes are kept as raw 'key="value"' strings
        let mut attrs = Vec::new();

        loop {
            self.skip_whitespace()?;

            match self.reader.read()? {
                Some('/') => {
                    self.expect_char('>')?;
                    trace!(name = %name, attrs = attrs.len(), "empty tag");
                    return self.sink.event(MarkupEvent::EmptyTag { name, attrs });
                }
                Some('>') => {
                    trace!(name = %name, attrs = attrs.len(), "start tag");
                    return self.sink.event(MarkupEvent::StartTag { name, attrs });
                }
                Some(c) => {
                    self.reader.unread(c);

                    let key = self.parse_name()?;
                    self.skip_whitespace()?;
                    self.expect_char('=')?;
                    self.skip_whitespace()?;
                    let quoted = self.parse_quoted_value()?;

                    attrs.push(format!("{key}={quoted}"));
                }
                None => return Err(Error::grammar("unclosed tag")),
            }
        }
    }

    /// A quoted attribute value, returned with its quotes. Single and double
    /// quotes are both accepted and the original character is preserved;
    /// entity references inside the value are validated but kept as written.
    fn parse_quoted_value(&mut self) -> Result<String> {
        let quote = self.parse_quote()?;

        let mut quote_buf = [0u8; 4];
        let terminator = quote.encode_utf8(&mut quote_buf);
        let value = self.parse_char_data(Some(terminator))?;

        Ok(format!("{quote}{value}{quote}"))
    }

    /// A quoted string copied verbatim, quotes included. Used inside DOCTYPE
    /// where entity references are not recognized.
    fn parse_raw_string(&mut self) -> Result<String> {
        let quote = self.parse_quote()?;

        let mut buf = String::new();
        buf.push(quote);
        loop {
            let Some(c) = self.reader.read()? else {
                return Err(Error::grammar("unclosed string"));
            };
            buf.push(c);
            if c == quote {
                return Ok(buf);
            }
        }
    }

    fn parse_quote(&mut self) -> Result<char> {
        match self.reader.read()? {
            Some(c @ ('"' | '\'')) => Ok(c),
            Some(c) => Err(Error::grammar(format!(
                "expected '\"' or '\\'', found '{c}'"
            ))),
            None => Err(Error::grammar("expected '\"' or '\\'', found end of input")),
        }
    }

    /// An end tag, already past its `</`.
    fn parse_end_tag(&mut self) -> Result<()> {
        let name = self.parse_name()?;
        self.skip_whitespace()?;
        self.expect_char('>')?;
        self.sink.event(MarkupEvent::EndTag { name })
    }

    /// Dispatch after `<?`: the XML declaration, or a processing
    /// instruction. Case variants of "xml" are reserved and rejected.
    fn parse_question(&mut self) -> Result<()> {
        let target = self.parse_name()?;

        if target == "xml" {
            self.parse_xml_declaration()
        } else if target.eq_ignore_ascii_case("xml") {
            Err(Error::grammar(format!(
                "processing instruction target cannot be a case variant of \"xml\": {target}"
            )))
        } else {
            self.parse_processing_instruction(target)
        }
    }

    /// The XML declaration, already past `<?xml`. The declaration is rebuilt
    /// in canonical form: keyword order and spelling are fixed, only the
    /// quoted values pass through.
    fn parse_xml_declaration(&mut self) -> Result<()> {
        let mut decl = String::from("xml");

        self.skip_whitespace()?;
        self.expect_literal("version")?;
        self.skip_whitespace()?;
        self.expect_char('=')?;
        self.skip_whitespace()?;

        let version = self.parse_quoted_value()?;
        if !is_valid_version(&version) {
            return Err(Error::grammar(format!("unexpected version: {version}")));
        }
        decl.push_str(" version=");
        decl.push_str(&version);

        self.skip_whitespace()?;
        let mut next = self.reader.read()?;

        if next == Some('e') {
            self.expect_literal("ncoding")?;
            self.skip_whitespace()?;
            self.expect_char('=')?;
            self.skip_whitespace()?;

            let encoding = self.parse_quoted_value()?;
            if !is_valid_encoding(&encoding) {
                return Err(Error::grammar(format!("only UTF-8 is supported: {encoding}")));
            }
            decl.push_str(" encoding=");
            decl.push_str(&encoding);

            self.skip_whitespace()?;
            next = self.reader.read()?;
        }

        if next == Some('s') {
            self.expect_literal("tandalone")?;
            self.skip_whitespace()?;
            self.expect_char('=')?;
            self.skip_whitespace()?;

            let standalone = self.parse_quoted_value()?;
            if !is_valid_standalone(&standalone) {
                return Err(Error::grammar(format!("only yes/no are allowed: {standalone}")));
            }
            decl.push_str(" standalone=");
            decl.push_str(&standalone);

            self.skip_whitespace()?;
            next = self.reader.read()?;
        }

        if next != Some('?') {
            return Err(unexpected('?', next));
        }
        self.expect_char('>')?;

        self.sink.event(MarkupEvent::ProcessingInstruction { raw: decl })
    }

    /// A processing instruction, already past `<?{target}`. Everything up to
    /// the first `?>` passes through opaquely.
    fn parse_processing_instruction(&mut self, target: String) -> Result<()> {
        let mut raw = target;

        let mut last_question = false;
        loop {
            let Some(c) = self.reader.read()? else {
                return Err(Error::grammar("unterminated processing instruction"));
            };

            if c == '?' {
                last_question = true;
            } else {
                if last_question && c == '>' {
                    // drop the '?' of the "?>" terminator
                    raw.pop();
                    break;
                }
                last_question = false;
            }

            raw.push(c);
        }

        self.sink.event(MarkupEvent::ProcessingInstruction { raw })
    }

    /// Dispatch after `<!`: DOCTYPE, CDATA, or comment.
    fn parse_exclamation(&mut self) -> Result<()> {
        match self.reader.read()? {
            Some('D') => {
                self.expect_literal("OCTYPE")?;
                self.parse_doctype()
            }
            Some('[') => {
                self.expect_literal("CDATA[")?;
                self.parse_cdata()
            }
            Some('-') => {
                self.expect_char('-')?;
                self.parse_comment()
            }
            Some(c) => Err(Error::grammar(format!("unexpected exclamation tag: '{c}'"))),
            None => Err(Error::grammar("unclosed tag")),
        }
    }

    /// A DOCTYPE declaration, already past `<!DOCTYPE`: a name with an
    /// optional `SYSTEM "uri"` or `PUBLIC "pubid" "uri"` external reference.
    /// An internal subset is out of the supported grammar.
    fn parse_doctype(&mut self) -> Result<()> {
        let mut raw = String::from("<!DOCTYPE ");

        self.skip_whitespace()?;
        let name = self.parse_name()?;
        raw.push_str(&name);
        self.skip_whitespace()?;

        let mut next = self.reader.read()?;
        if next == Some('S') {
            self.expect_literal("YSTEM")?;
            raw.push_str(" SYSTEM ");

            self.skip_whitespace()?;
            raw.push_str(&self.parse_raw_string()?);

            self.skip_whitespace()?;
            next = self.reader.read()?;
        } else if next == Some('P') {
            self.expect_literal("UBLIC")?;
            raw.push_str(" PUBLIC ");

            self.skip_whitespace()?;
            raw.push_str(&self.parse_raw_string()?);
            raw.push(' ');

            self.skip_whitespace()?;
            raw.push_str(&self.parse_raw_string()?);

            self.skip_whitespace()?;
            next = self.reader.read()?;
        }

        if next == Some('[') {
            return Err(Error::unsupported("internal DTD subset"));
        }
        if next != Some('>') {
            return Err(unexpected('>', next));
        }
        raw.push('>');

        self.sink.event(MarkupEvent::Doctype { raw })
    }

    /// A CDATA section, already past `<![CDATA[`. Ends at the first `]]>`.
    fn parse_cdata(&mut self) -> Result<()> {
        let mut content = String::new();

        let mut brackets = 0usize;
        loop {
            let Some(c) = self.reader.read()? else {
                return Err(Error::grammar("unterminated CDATA section"));
            };

            if c == ']' {
                brackets += 1;
            } else {
                if brackets >= 2 && c == '>' {
                    content.truncate(content.len() - 2);
                    break;
                }
                brackets = 0;
            }

            content.push(c);
        }

        self.sink.event(MarkupEvent::Cdata { content })
    }

    /// A comment, already past `<!--`. A `--` anywhere but the `-->`
    /// terminator is outside the grammar.
    fn parse_comment(&mut self) -> Result<()> {
        let mut content = String::new();

        let mut dashes = 0usize;
        loop {
            let Some(c) = self.reader.read()? else {
                return Err(Error::grammar("unterminated comment"));
            };

            if c == '-' {
                dashes += 1;
                content.push(c);
                continue;
            }

            if dashes >= 2 {
                if dashes > 2 || c != '>' {
                    return Err(Error::grammar("'--' is not permitted in comments"));
                }
                content.truncate(content.len() - 2);
                break;
            }

            dashes = 0;
            content.push(c);
        }

        self.sink.event(MarkupEvent::Comment { content })
    }

    fn expect_char(&mut self, expected: char) -> Result<()> {
        match self.reader.read()? {
            Some(c) if c == expected => Ok(()),
            other => Err(unexpected(expected, other)),
        }
    }

    fn expect_literal(&mut self, literal: &str) -> Result<()> {
        for expected in literal.chars() {
            self.expect_char(expected)?;
        }
        Ok(())
    }
}

fn unexpected(expected: char, actual: Option<char>) -> Error {
    match actual {
        Some(c) => Error::grammar(format!("expected '{expected}', found '{c}'")),
        None => Error::grammar(format!("expected '{expected}', found end of input")),
    }
}

/// True if the run contains at least two newline characters.
fn has_multiple_newlines(s: &str) -> bool {
    s.bytes().filter(|&b| b == b'\n').nth(1).is_some()
}

/// Matches `1.<digits>` inside the quotes `parse_quoted_value` produced.
fn is_valid_version(quoted: &str) -> bool {
    let Some(inner) = unquote(quoted) else {
        return false;
    };
    let Some(digits) = inner.strip_prefix("1.") else {
        return false;
    };
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn is_valid_encoding(quoted: &str) -> bool {
    unquote(quoted).is_some_and(|inner| inner.eq_ignore_ascii_case("UTF-8"))
}

fn is_valid_standalone(quoted: &str) -> bool {
    unquote(quoted).is_some_and(|inner| inner == "yes" || inner == "no")
}

/// Strip a matching pair of surrounding quotes.
fn unquote(quoted: &str) -> Option<&str> {
    let mut chars = quoted.chars();
    let first = chars.next()?;
    let last = chars.next_back()?;
    if first == last && (first == '"' || first == '\'') {
        Some(chars.as_str())
    } else {
        None
    }
}
