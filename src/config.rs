#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The record terminator to use when writing delimited text.
///
/// When reading, `\r`, `\n` and `\r\n` are always accepted as a single
/// record terminator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Terminator {
    /// `\n`
    LF,
    /// `\r`
    CR,
    /// `\r\n`
    CRLF,
}

impl Terminator {
    /// The newline sequence of the platform this crate was compiled for.
    pub fn platform() -> Terminator {
        if cfg!(windows) {
            Terminator::CRLF
        } else {
            Terminator::LF
        }
    }

    /// Parse a terminator from its textual form.
    ///
    /// Only `"\n"`, `"\r"` and `"\r\n"` are accepted.
    pub fn from_str_eol(eol: &str) -> Result<Terminator> {
        match eol {
            "\n" => Ok(Terminator::LF),
            "\r" => Ok(Terminator::CR),
            "\r\n" => Ok(Terminator::CRLF),
            _ => Err(Error::Argument(format!(
                "end of line must be \"\\r\", \"\\n\" or \"\\r\\n\", \
                 but got {:?}",
                eol
            ))),
        }
    }

    /// The characters written for this terminator.
    pub fn as_str(&self) -> &'static str {
        match *self {
            Terminator::LF => "\n",
            Terminator::CR => "\r",
            Terminator::CRLF => "\r\n",
        }
    }
}

impl Default for Terminator {
    fn default() -> Terminator {
        Terminator::platform()
    }
}

/// The quoting style to use when writing delimited text.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum QuoteStyle {
    /// This puts quotes around every field. Always.
    Always,
    /// This puts quotes around fields only when necessary.
    ///
    /// They are necessary when fields contain the delimiter, the quote
    /// character, the quote escape character or a line terminator.
    ///
    /// This is the default.
    Necessary,
}

impl Default for QuoteStyle {
    fn default() -> QuoteStyle {
        QuoteStyle::Necessary
    }
}

/// The grammar used by a `Reader`.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReaderConfig {
    /// The string that separates fields. Defaults to `,`.
    pub delimiter: String,
    /// The quote character. Defaults to `"`.
    pub quote: char,
    /// The character that escapes a quote inside a quoted field. Defaults
    /// to the quote character, i.e., quotes are escaped by doubling them.
    pub escape: char,
    /// Whether unquoted fields have surrounding whitespace removed.
    pub trim_whitespace: bool,
    /// Whether fields may be enclosed in quotes at all.
    pub has_fields_enclosed_in_quotes: bool,
    /// Whether to reproduce the quirks of the classic TextFieldParser.
    pub compatibility_mode: bool,
}

impl Default for ReaderConfig {
    fn default() -> ReaderConfig {
        ReaderConfig {
            delimiter: ",".to_string(),
            quote: '"',
            escape: '"',
            trim_whitespace: false,
            has_fields_enclosed_in_quotes: true,
            compatibility_mode: false,
        }
    }
}

impl ReaderConfig {
    /// Check every value of this configuration.
    pub fn validate(&self) -> Result<()> {
        check_delimiter(&self.delimiter, self.compatibility_mode)?;
        check_quote(self.quote)?;
        check_escape(self.escape)
    }

    /// Set the quote character, keeping the escape character in step if
    /// it currently matches the quote character.
    pub(crate) fn relink_quote(&mut self, quote: char) {
        if self.escape == self.quote {
            self.escape = quote;
        }
        self.quote = quote;
    }
}

/// The grammar used by a `Writer`.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WriterConfig {
    /// The string written between fields. Defaults to `,`.
    pub delimiter: String,
    /// The quote character. Defaults to `"`.
    pub quote: char,
    /// The character written before a quote inside a quoted field.
    /// Defaults to the quote character.
    pub escape: char,
    /// The record terminator. Defaults to the platform newline.
    pub terminator: Terminator,
    /// When fields are quoted.
    pub quote_style: QuoteStyle,
}

impl Default for WriterConfig {
    fn default() -> WriterConfig {
        WriterConfig {
            delimiter: ",".to_string(),
            quote: '"',
            escape: '"',
            terminator: Terminator::default(),
            quote_style: QuoteStyle::default(),
        }
    }
}

impl WriterConfig {
    /// Check every value of this configuration.
    pub fn validate(&self) -> Result<()> {
        check_delimiter(&self.delimiter, false)?;
        check_quote(self.quote)?;
        check_escape(self.escape)
    }

    /// Set the quote character, keeping the escape character in step if
    /// it currently matches the quote character.
    pub(crate) fn relink_quote(&mut self, quote: char) {
        if self.escape == self.quote {
            self.escape = quote;
        }
        self.quote = quote;
    }
}

fn is_eol(c: char) -> bool {
    c == '\r' || c == '\n'
}

pub(crate) fn check_delimiter(delimiter: &str, single_char: bool) -> Result<()> {
    if delimiter.is_empty() {
        return Err(Error::Argument("a delimiter cannot be empty".to_string()));
    }
    if delimiter.chars().any(is_eol) {
        return Err(Error::Argument(format!(
            "a delimiter cannot contain end of line characters: {:?}",
            delimiter
        )));
    }
    if single_char && delimiter.chars().count() > 1 {
        return Err(Error::Argument(format!(
            "compatibility mode requires a single character delimiter, \
             but got {:?}",
            delimiter
        )));
    }
    Ok(())
}

pub(crate) fn check_quote(quote: char) -> Result<()> {
    if is_eol(quote) {
        return Err(Error::Argument(
            "the quote character cannot be an end of line character"
                .to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn check_escape(escape: char) -> Result<()> {
    if is_eol(escape) {
        return Err(Error::Argument(
            "the quote escape character cannot be an end of line character"
                .to_string(),
        ));
    }
    Ok(())
}
