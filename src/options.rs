//! Style configuration for a formatting run.
//!
//! The option set mirrors prettier's, minus `singleQuote`: attribute quotes
//! are preserved as written, so there is nothing to configure there.

/// Line terminator written after every formatted line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LineEnding {
    /// Unix/macOS line endings (`\n`).
    #[default]
    Lf,
    /// Windows line endings (`\r\n`).
    Crlf,
    /// Whatever the compilation target considers native.
    System,
}

impl LineEnding {
    /// The line ending as a string.
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
            LineEnding::System => {
                if cfg!(windows) {
                    "\r\n"
                } else {
                    "\n"
                }
            }
        }
    }
}

/// Formatting style, immutable for the duration of one run.
///
/// See the [prettier option docs](https://prettier.io/docs/options) for the
/// intent behind each knob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct FormatOptions {
    /// Line length the printer wraps on. Must be positive.
    pub print_width: usize,

    /// Number of columns per indentation level. Must be positive.
    ///
    /// Width arithmetic always charges this many columns per level, even
    /// when [`use_tabs`](Self::use_tabs) renders each level as one tab.
    pub tab_width: usize,

    /// Indent lines with tabs instead of spaces.
    pub use_tabs: bool,

    /// Put the `>` of a multi-line element at the end of its last attribute
    /// line instead of alone on the next line.
    pub bracket_same_line: bool,

    /// Line ending to write.
    pub end_of_line: LineEnding,

    /// Force every attribute onto its own line.
    pub single_attribute_per_line: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            print_width: 80,
            tab_width: 2,
            use_tabs: false,
            bracket_same_line: false,
            end_of_line: LineEnding::Lf,
            single_attribute_per_line: false,
        }
    }
}
