//! Character-level reading layer and grammar character classes.
//!
//! The parser consumes its input one character at a time and may push at
//! most one character back. Several productions (the XML declaration in
//! particular) are written as literal character-by-character matches because
//! no further lookback exists.

use crate::error::Result;

/// A character stream the parser can drain.
pub trait CharSource {
    /// The next character, or `None` at end of input.
    fn next_char(&mut self) -> Result<Option<char>>;
}

impl CharSource for std::str::Chars<'_> {
    #[inline]
    fn next_char(&mut self) -> Result<Option<char>> {
        Ok(self.next())
    }
}

/// A [`CharSource`] with a single character of pushback.
pub(crate) struct CharReader<S> {
    source: S,
    pushback: Option<char>,
}

impl<S: CharSource> CharReader<S> {
    pub(crate) fn new(source: S) -> Self {
        CharReader {
            source,
            pushback: None,
        }
    }

    /// Read one character, draining the pushback slot first.
    pub(crate) fn read(&mut self) -> Result<Option<char>> {
        match self.pushback.take() {
            Some(c) => Ok(Some(c)),
            None => self.source.next_char(),
        }
    }

    /// Push one character back onto the stream.
    ///
    /// At most one character may be pending at a time.
    pub(crate) fn unread(&mut self, c: char) {
        debug_assert!(self.pushback.is_none(), "single-character pushback");
        self.pushback = Some(c);
    }
}

/// XML whitespace: space, tab, carriage return, newline.
#[inline]
pub(crate) fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

#[inline]
pub(crate) fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

/// Hex digits as scanned in character references. Any ASCII letter is
/// accepted; references are re-emitted verbatim either way.
#[inline]
pub(crate) fn is_hex_digit(c: char) -> bool {
    c.is_ascii_digit() || c.is_ascii_alphabetic()
}

/// XML 1.1 NameStartChar.
pub(crate) fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | '_'
        | 'A'..='Z'
        | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

/// XML 1.1 NameChar.
pub(crate) fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.'
            | '0'..='9'
            | '\u{B7}'
            | '\u{300}'..='\u{36F}'
            | '\u{203F}'..='\u{2040}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pushback_round_trip() {
        let mut reader = CharReader::new("ab".chars());
        assert_eq!(reader.read().unwrap(), Some('a'));
        reader.unread('a');
        assert_eq!(reader.read().unwrap(), Some('a'));
        assert_eq!(reader.read().unwrap(), Some('b'));
        assert_eq!(reader.read().unwrap(), None);
    }

    #[test]
    fn test_name_start_chars() {
        for c in [':', '_', 'A', 'z', 'é', 'ш', '中', '\u{10000}'] {
            assert!(is_name_start_char(c), "{c:?}");
        }
        for c in ['-', '.', '1', ' ', '<', '\u{B7}'] {
            assert!(!is_name_start_char(c), "{c:?}");
        }
    }

    #[test]
    fn test_name_chars() {
        for c in ['-', '.', '0', '9', '\u{B7}', 'x'] {
            assert!(is_name_char(c), "{c:?}");
        }
        for c in [' ', '=', '>', '/', '&'] {
            assert!(!is_name_char(c), "{c:?}");
        }
    }

    #[test]
    fn test_whitespace() {
        for c in [' ', '\t', '\r', '\n'] {
            assert!(is_whitespace(c));
        }
        assert!(!is_whitespace('\u{A0}'));
    }

    #[test]
    fn test_hex_digits() {
        for c in ['0', '9', 'a', 'f', 'A', 'F', 'g', 'Z'] {
            assert!(is_hex_digit(c), "{c:?}");
        }
        assert!(!is_hex_digit(';'));
    }
}
