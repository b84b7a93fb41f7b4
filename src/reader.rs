use std::fs::File;
use std::io;
use std::path::Path;

use tracing::{debug, trace};

use crate::config::{self, ReaderConfig};
use crate::error::{Error, Result};
use crate::source::CharReader;

/// Builds a delimited text reader with various configuration knobs.
///
/// Every option can also be changed on a live `Reader`, in which case it
/// takes effect for the next record read.
#[derive(Debug, Default)]
pub struct ReaderBuilder {
    config: ReaderConfig,
}

impl ReaderBuilder {
    /// Create a new builder with the default configuration.
    pub fn new() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// Create a new builder from an existing configuration.
    pub fn from_config(config: ReaderConfig) -> ReaderBuilder {
        ReaderBuilder { config: config }
    }

    /// Build a reader from this configuration that reads from `rdr`.
    ///
    /// This returns an error if the configuration is invalid.
    pub fn from_reader<R: io::Read>(&self, rdr: R) -> Result<Reader<R>> {
        self.config.validate()?;
        Ok(Reader::new(rdr, self.config.clone()))
    }

    /// Build a reader from this configuration that reads from the file at
    /// the given path.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Reader<File>> {
        self.config.validate()?;
        Ok(Reader::new(File::open(path)?, self.config.clone()))
    }

    /// The field delimiter. The default is `,`.
    ///
    /// Any non-empty string without line terminators may be used. In
    /// compatibility mode it must be a single character.
    pub fn delimiter(&mut self, delimiter: &str) -> &mut ReaderBuilder {
        self.config.delimiter = delimiter.to_string();
        self
    }

    /// The quote character. The default is `"`.
    ///
    /// If the escape character currently equals the quote character, it is
    /// changed along with it.
    pub fn quote(&mut self, quote: char) -> &mut ReaderBuilder {
        self.config.relink_quote(quote);
        self
    }

    /// The character that escapes a quote character inside a quoted field.
    ///
    /// The default is the quote character, so `""` decodes to `"`.
    pub fn escape(&mut self, escape: char) -> &mut ReaderBuilder {
        self.config.escape = escape;
        self
    }

    /// Whether to strip leading and trailing whitespace from unquoted
    /// fields. Disabled by default.
    pub fn trim_whitespace(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.config.trim_whitespace = yes;
        self
    }

    /// Whether quotes are recognized at all. Enabled by default.
    pub fn has_fields_enclosed_in_quotes(
        &mut self,
        yes: bool,
    ) -> &mut ReaderBuilder {
        self.config.has_fields_enclosed_in_quotes = yes;
        self
    }

    /// Whether to reproduce the quirks of the classic TextFieldParser.
    /// Disabled by default.
    pub fn compatibility_mode(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.config.compatibility_mode = yes;
        self
    }
}

/// How a field ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum FieldEnd {
    Delimiter,
    Record,
    Malformed,
}

/// A pull based reader of delimited text.
///
/// Records are read one at a time with `read_record`. A record is a logical
/// line, which spans several physical lines when a quoted field contains
/// line terminators. `\r`, `\n` and `\r\n` are all accepted as terminators,
/// and lines without any characters are skipped.
///
/// When a logical line violates the quoting grammar, `read_record` returns
/// `Error::MalformedLine` after skipping to the end of the offending
/// physical line. Reading may continue afterwards. The raw text of the last
/// malformed line is kept in `error_line`.
///
/// # Compatibility mode
///
/// By default, the reader fixes several defects of the classic
/// TextFieldParser. In compatibility mode it reproduces them instead:
///
/// * lines containing only whitespace are skipped,
/// * whitespace before an opening quote is ignored,
/// * whitespace after a closing quote is accepted (and at the very end of
///   the input produces an extra empty field),
/// * blank lines inside a quoted field are dropped,
/// * two consecutive quote characters always decode to one, even with a
///   distinct escape character,
/// * the delimiter must be a single character,
/// * the error line survives `close`.
#[derive(Debug)]
pub struct Reader<R> {
    src: Option<CharReader<R>>,
    config: ReaderConfig,
    /// The physical line of the next character, starting at 1.
    line: u64,
    /// The raw text of the logical line currently being read.
    raw: String,
    error_line: String,
    error_line_number: i64,
}

impl<R: io::Read> Reader<R> {
    /// Create a new reader with the default configuration.
    pub fn from_reader(rdr: R) -> Reader<R> {
        Reader::new(rdr, ReaderConfig::default())
    }

    fn new(rdr: R, config: ReaderConfig) -> Reader<R> {
        Reader {
            src: Some(CharReader::new(rdr)),
            config: config,
            line: 1,
            raw: String::new(),
            error_line: String::new(),
            error_line_number: -1,
        }
    }
}

impl Reader<File> {
    /// Create a new reader with the default configuration for the file at
    /// the given path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Reader<File>> {
        ReaderBuilder::new().from_path(path)
    }
}

impl<R: io::Read> Reader<R> {
    /// Returns true if another call to `read_record` would produce a record
    /// or a malformed line error.
    ///
    /// Blank lines before the next record are consumed, which advances the
    /// line number.
    pub fn has_more_data(&mut self) -> Result<bool> {
        self.skip_blank_lines(self.config.compatibility_mode)?;
        Ok(self.peek()?.is_some())
    }

    /// Read the next record.
    ///
    /// Returns `None` once all data has been read, and keeps doing so on
    /// subsequent calls.
    pub fn read_record(&mut self) -> Result<Option<Vec<String>>> {
        self.src()?;
        self.check_grammar()?;
        if !self.has_more_data()? {
            return Ok(None);
        }
        let start = self.line;
        self.raw.clear();
        let mut fields = vec![];
        loop {
            match self.read_field(&mut fields)? {
                FieldEnd::Delimiter => {}
                FieldEnd::Record => return Ok(Some(fields)),
                FieldEnd::Malformed => return Err(self.recover(start)?),
            }
        }
    }

    /// Returns an iterator over all remaining records.
    ///
    /// Malformed lines are yielded as errors and iteration continues with
    /// the next line. Any other error ends the iteration.
    pub fn records(&mut self) -> RecordsIter<'_, R> {
        RecordsIter { rdr: self, done: false }
    }

    /// The physical line number of the next character to be read, or `-1`
    /// if all data has been read or the reader is closed.
    pub fn line_number(&mut self) -> Result<i64> {
        if self.src.is_none() || self.peek()?.is_none() {
            return Ok(-1);
        }
        Ok(self.line as i64)
    }

    /// Close this reader, dropping the underlying source.
    ///
    /// Closing is idempotent. Any further read returns `Error::Closed`.
    /// Outside of compatibility mode this also clears the error line.
    pub fn close(&mut self) {
        if self.src.take().is_some() {
            debug!(line = self.line, "closed reader");
        }
        if !self.config.compatibility_mode {
            self.error_line.clear();
            self.error_line_number = -1;
        }
    }
}

impl<R> Reader<R> {
    /// The raw text of the most recent malformed line, without its final
    /// line terminator. Empty if there was none.
    pub fn error_line(&self) -> &str {
        &self.error_line
    }

    /// The physical line on which the most recent malformed line started,
    /// or `-1` if there was none.
    pub fn error_line_number(&self) -> i64 {
        self.error_line_number
    }

    /// Returns true if `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.src.is_none()
    }

    /// The current configuration.
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Set the field delimiter.
    pub fn set_delimiter(&mut self, delimiter: &str) -> Result<()> {
        config::check_delimiter(delimiter, self.config.compatibility_mode)?;
        self.config.delimiter = delimiter.to_string();
        Ok(())
    }

    /// Set the quote character.
    ///
    /// If the escape character currently equals the quote character, it is
    /// changed along with it.
    pub fn set_quote(&mut self, quote: char) -> Result<()> {
        config::check_quote(quote)?;
        self.config.relink_quote(quote);
        Ok(())
    }

    /// Set the quote escape character.
    pub fn set_escape(&mut self, escape: char) -> Result<()> {
        config::check_escape(escape)?;
        self.config.escape = escape;
        Ok(())
    }

    /// Set whether unquoted fields are trimmed.
    pub fn set_trim_whitespace(&mut self, yes: bool) {
        self.config.trim_whitespace = yes;
    }

    /// Set whether quotes are recognized.
    pub fn set_has_fields_enclosed_in_quotes(&mut self, yes: bool) {
        self.config.has_fields_enclosed_in_quotes = yes;
    }

    /// Enable or disable compatibility mode.
    ///
    /// Enabling fails if the current delimiter is longer than one
    /// character.
    pub fn set_compatibility_mode(&mut self, yes: bool) -> Result<()> {
        if yes {
            config::check_delimiter(&self.config.delimiter, true)?;
        }
        self.config.compatibility_mode = yes;
        Ok(())
    }

    fn check_grammar(&self) -> Result<()> {
        let cfg = &self.config;
        if cfg.has_fields_enclosed_in_quotes && cfg.delimiter.contains(cfg.quote)
        {
            return Err(Error::InvalidOperation(format!(
                "the quote character {:?} cannot be part of the \
                 delimiter {:?} when fields may be quoted",
                cfg.quote, cfg.delimiter
            )));
        }
        Ok(())
    }

    /// Whitespace that may surround a quoted field.
    fn is_space(&self, c: char) -> bool {
        (c == ' ' || c == '\t')
            && c != self.config.quote
            && c != self.config.escape
            && !self.config.delimiter.contains(c)
    }

    /// Characters that make up a whitespace-only line.
    fn is_blank(&self, c: char) -> bool {
        c.is_whitespace()
            && !is_eol(c)
            && c != self.config.quote
            && c != self.config.escape
    }

    fn finish(&self, field: String) -> String {
        if self.config.trim_whitespace {
            field.trim().to_string()
        } else {
            field
        }
    }
}

// The state machine. Everything below reads through the look-ahead of the
// character source: `peek*` never consumes, `bump*` consumes into the raw
// line, and `discard`/`eat_terminator` consume without recording.
impl<R: io::Read> Reader<R> {
    fn read_field(&mut self, fields: &mut Vec<String>) -> Result<FieldEnd> {
        if self.config.has_fields_enclosed_in_quotes {
            let n = if self.config.compatibility_mode
                || self.config.trim_whitespace
            {
                self.count_spaces(0)?
            } else {
                0
            };
            if self.peek_nth(n)? == Some(self.config.quote) {
                self.bump_n(n + 1)?;
                return self.read_quoted(fields);
            }
        }
        self.read_unquoted(fields)
    }

    fn read_unquoted(&mut self, fields: &mut Vec<String>) -> Result<FieldEnd> {
        let mut field = String::new();
        loop {
            if self.at_delimiter(0)? {
                self.bump_delimiter()?;
                fields.push(self.finish(field));
                return Ok(FieldEnd::Delimiter);
            }
            match self.peek()? {
                None => {
                    fields.push(self.finish(field));
                    return Ok(FieldEnd::Record);
                }
                Some(c) if is_eol(c) => {
                    self.eat_terminator()?;
                    fields.push(self.finish(field));
                    return Ok(FieldEnd::Record);
                }
                Some(c) => {
                    self.bump()?;
                    field.push(c);
                }
            }
        }
    }

    fn read_quoted(&mut self, fields: &mut Vec<String>) -> Result<FieldEnd> {
        let (quote, escape) = (self.config.quote, self.config.escape);
        let compat = self.config.compatibility_mode;
        let mut field = String::new();
        loop {
            let c = match self.peek()? {
                None => return Ok(FieldEnd::Malformed),
                Some(c) => c,
            };
            if is_eol(c) {
                let term = self.eat_terminator()?;
                self.raw.push_str(term);
                field.push_str(term);
                if compat {
                    self.skip_blank_lines(true)?;
                }
                continue;
            }
            self.bump()?;
            if c == quote {
                let doubled = self.peek()? == Some(quote);
                if doubled && (escape == quote || compat) {
                    self.bump()?;
                    field.push(quote);
                } else {
                    fields.push(field);
                    return self.end_quoted(fields);
                }
            } else if c == escape && self.peek()? == Some(quote) {
                self.bump()?;
                field.push(quote);
            } else {
                field.push(c);
            }
        }
    }

    /// Handle whatever follows a closing quote.
    fn end_quoted(&mut self, fields: &mut Vec<String>) -> Result<FieldEnd> {
        let compat = self.config.compatibility_mode;
        let n = if compat || self.config.trim_whitespace {
            self.count_spaces(0)?
        } else {
            0
        };
        if self.at_delimiter(n)? {
            self.bump_n(n)?;
            self.bump_delimiter()?;
            return Ok(FieldEnd::Delimiter);
        }
        match self.peek_nth(n)? {
            None => {
                self.bump_n(n)?;
                if compat && n > 0 {
                    fields.push(String::new());
                }
                Ok(FieldEnd::Record)
            }
            Some(c) if is_eol(c) => {
                self.bump_n(n)?;
                self.eat_terminator()?;
                Ok(FieldEnd::Record)
            }
            Some(_) => Ok(FieldEnd::Malformed),
        }
    }

    /// Skip the rest of the current physical line and record the error.
    fn recover(&mut self, start: u64) -> Result<Error> {
        while let Some(c) = self.peek()? {
            if is_eol(c) {
                self.eat_terminator()?;
                break;
            }
            self.bump()?;
        }
        let text = self.raw.trim_end_matches(is_eol).to_string();
        debug!(line = start, text = %text, "skipped malformed line");
        self.error_line = text.clone();
        self.error_line_number = start as i64;
        Ok(Error::MalformedLine { line: start, text: text })
    }

    /// Consume lines that have no characters, or, when `whitespace` is
    /// set, only whitespace characters.
    ///
    /// Trailing whitespace at the end of the input is consumed as well.
    fn skip_blank_lines(&mut self, whitespace: bool) -> Result<()> {
        loop {
            let mut n = 0;
            if whitespace {
                while let Some(c) = self.peek_nth(n)? {
                    if !self.is_blank(c) {
                        break;
                    }
                    n += 1;
                }
            }
            match self.peek_nth(n)? {
                Some(c) if is_eol(c) => {
                    self.discard(n)?;
                    self.eat_terminator()?;
                    trace!(line = self.line - 1, "skipped blank line");
                }
                None if n > 0 => return self.discard(n),
                _ => return Ok(()),
            }
        }
    }

    /// Count the whitespace characters starting `offset` characters ahead.
    fn count_spaces(&mut self, offset: usize) -> Result<usize> {
        let mut n = 0;
        while let Some(c) = self.peek_nth(offset + n)? {
            if !self.is_space(c) {
                break;
            }
            n += 1;
        }
        Ok(n)
    }

    /// Returns true if the delimiter starts `offset` characters ahead.
    fn at_delimiter(&mut self, offset: usize) -> Result<bool> {
        let src = self.src.as_mut().ok_or(Error::Closed)?;
        for (i, d) in self.config.delimiter.chars().enumerate() {
            if src.peek_nth(offset + i)? != Some(d) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn bump_delimiter(&mut self) -> Result<()> {
        let n = self.config.delimiter.chars().count();
        self.bump_n(n)
    }

    /// Consume a line terminator, which must be next, and return it.
    fn eat_terminator(&mut self) -> Result<&'static str> {
        let first = self.src()?.next()?;
        let term = match first {
            Some('\r') => {
                if self.peek()? == Some('\n') {
                    self.discard(1)?;
                    "\r\n"
                } else {
                    "\r"
                }
            }
            _ => "\n",
        };
        self.line += 1;
        Ok(term)
    }

    fn bump(&mut self) -> Result<Option<char>> {
        let c = self.src()?.next()?;
        if let Some(c) = c {
            self.raw.push(c);
        }
        Ok(c)
    }

    fn bump_n(&mut self, n: usize) -> Result<()> {
        for _ in 0..n {
            self.bump()?;
        }
        Ok(())
    }

    fn discard(&mut self, n: usize) -> Result<()> {
        self.src()?.skip(n)?;
        Ok(())
    }

    fn peek(&mut self) -> Result<Option<char>> {
        self.peek_nth(0)
    }

    fn peek_nth(&mut self, n: usize) -> Result<Option<char>> {
        Ok(self.src()?.peek_nth(n)?)
    }

    fn src(&mut self) -> Result<&mut CharReader<R>> {
        self.src.as_mut().ok_or(Error::Closed)
    }
}

/// An iterator over the remaining records of a `Reader`.
///
/// The lifetime parameter `'r` refers to the lifetime of the underlying
/// reader.
#[derive(Debug)]
pub struct RecordsIter<'r, R: 'r> {
    rdr: &'r mut Reader<R>,
    done: bool,
}

impl<'r, R: io::Read> Iterator for RecordsIter<'r, R> {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Result<Vec<String>>> {
        if self.done {
            return None;
        }
        match self.rdr.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = !err.is_malformed_line();
                Some(Err(err))
            }
        }
    }
}

fn is_eol(c: char) -> bool {
    c == '\r' || c == '\n'
}

#[cfg(test)]
mod tests {
    use super::{Reader, ReaderBuilder};
    use crate::error::Error;

    type Csv = Vec<Vec<String>>;

    fn parse(rdr: &mut Reader<&[u8]>) -> Csv {
        let mut csv = Csv::new();
        while let Some(record) = rdr.read_record().unwrap() {
            csv.push(record);
        }
        csv
    }

    macro_rules! csv {
        ($([$($field:expr),*]),*) => {{
            #[allow(unused_mut)]
            let mut csv = Csv::new();
            $(
                csv.push(vec![$($field.to_string()),*]);
            )*
            csv
        }}
    }

    macro_rules! parses_to {
        ($name:ident, $data:expr, $expected:expr) => {
            parses_to!($name, $data, $expected, |builder| builder);
        };
        ($name:ident, $data:expr, $expected:expr, $config:expr) => {
            #[test]
            fn $name() {
                let mut builder = ReaderBuilder::new();
                $config(&mut builder);
                let mut rdr = builder.from_reader($data.as_bytes()).unwrap();
                let got = parse(&mut rdr);
                assert_eq!($expected, got, "default mode");
            }
        };
    }

    parses_to!(one_row_one_field, "a", csv![["a"]]);
    parses_to!(one_row_many_fields, "a,b,c", csv![["a", "b", "c"]]);
    parses_to!(one_row_trailing_comma, "a,b,", csv![["a", "b", ""]]);
    parses_to!(one_row_one_field_lf, "a\n", csv![["a"]]);
    parses_to!(one_row_one_field_crlf, "a\r\n", csv![["a"]]);
    parses_to!(one_row_one_field_cr, "a\r", csv![["a"]]);
    parses_to!(comma_only, ",", csv![["", ""]]);

    parses_to!(many_rows_one_field, "a\nb", csv![["a"], ["b"]]);
    parses_to!(
        many_rows_many_fields_crlf,
        "a,b,c\r\nx,y,z\r\n",
        csv![["a", "b", "c"], ["x", "y", "z"]]
    );
    parses_to!(
        many_rows_many_fields_cr,
        "a,b,c\rx,y,z\r",
        csv![["a", "b", "c"], ["x", "y", "z"]]
    );

    parses_to!(empty, "", csv![]);
    parses_to!(empty_lines, "\n\n\n\n", csv![]);
    parses_to!(empty_lines_mixed, "\r\n\n\r\n\r\r", csv![]);
    parses_to!(
        empty_lines_interspersed,
        "\n\na,b\n\n\nx,y\r\n\r\n\rm,n\n",
        csv![["a", "b"], ["x", "y"], ["m", "n"]]
    );
    parses_to!(whitespace_line_is_a_record, "a\n \nb", csv![["a"], [" "], ["b"]]);

    parses_to!(quote_empty, "\"\"", csv![[""]]);
    parses_to!(quote_lf, "\"\"\n", csv![[""]]);
    parses_to!(quote_space, "\" \"", csv![[" "]]);
    parses_to!(quote_inner_space, "\" a \"", csv![[" a "]]);
    parses_to!(quote_outer_space, "  \"a\"", csv![["  \"a\""]]);
    parses_to!(quote_in_middle, "te\"st", csv![["te\"st"]]);
    parses_to!(quote_doubled, "\"a\"\"b\"", csv![["a\"b"]]);
    parses_to!(quote_delimiter, "\"a,b\",c", csv![["a,b", "c"]]);
    parses_to!(
        quote_line_terminators,
        "\"t\ne\rs\r\nt\",x",
        csv![["t\ne\rs\r\nt", "x"]]
    );
    parses_to!(
        quote_blank_lines_kept,
        "\"2\r\n\r\n2\"",
        csv![["2\r\n\r\n2"]]
    );

    parses_to!(
        quote_change,
        "'a,''b''',c",
        csv![["a,'b'", "c"]],
        |b: &mut ReaderBuilder| {
            b.quote('\'');
        }
    );
    parses_to!(
        escape_backslash,
        r#""a\"b","""#,
        csv![[r#"a"b"#, ""]],
        |b: &mut ReaderBuilder| {
            b.escape('\\');
        }
    );
    parses_to!(
        escape_before_other_char,
        r#""a\b""#,
        csv![[r#"a\b"#]],
        |b: &mut ReaderBuilder| {
            b.escape('\\');
        }
    );

    parses_to!(
        delimiter_tab,
        "a\tb\t\"c\td\"",
        csv![["a", "b", "c\td"]],
        |b: &mut ReaderBuilder| {
            b.delimiter("\t");
        }
    );
    parses_to!(
        delimiter_multi_char,
        "a||b|c||\"x||y\"",
        csv![["a", "b|c", "x||y"]],
        |b: &mut ReaderBuilder| {
            b.delimiter("||");
        }
    );
    parses_to!(
        delimiter_multi_char_partial_at_end,
        "a|",
        csv![["a|"]],
        |b: &mut ReaderBuilder| {
            b.delimiter("||");
        }
    );

    parses_to!(
        trim_unquoted,
        " a , b\t,\t\n",
        csv![["a", "b", ""]],
        |b: &mut ReaderBuilder| {
            b.trim_whitespace(true);
        }
    );
    parses_to!(
        trim_keeps_quoted_interior,
        "  \" a \"  , b ",
        csv![[" a ", "b"]],
        |b: &mut ReaderBuilder| {
            b.trim_whitespace(true);
        }
    );

    parses_to!(
        quotes_disabled,
        "\"a,b\",\"c\"\"\n",
        csv![["\"a", "b\"", "\"c\"\""]],
        |b: &mut ReaderBuilder| {
            b.has_fields_enclosed_in_quotes(false);
        }
    );

    #[test]
    fn line_numbers() {
        let mut rdr = Reader::from_reader("1,2\n3,4".as_bytes());
        assert_eq!(rdr.line_number().unwrap(), 1);
        assert_eq!(rdr.read_record().unwrap().unwrap(), vec!["1", "2"]);
        assert_eq!(rdr.line_number().unwrap(), 2);
        assert_eq!(rdr.read_record().unwrap().unwrap(), vec!["3", "4"]);
        assert_eq!(rdr.line_number().unwrap(), -1);
        assert!(!rdr.has_more_data().unwrap());
    }

    #[test]
    fn line_numbers_multi_line_field() {
        let mut rdr = Reader::from_reader("\"a\nb\nc\",d\ne".as_bytes());
        assert_eq!(rdr.read_record().unwrap().unwrap(), vec!["a\nb\nc", "d"]);
        assert_eq!(rdr.line_number().unwrap(), 4);
    }

    #[test]
    fn has_more_data_skips_blank_lines() {
        let mut rdr = Reader::from_reader("\n\r\n\ra".as_bytes());
        assert!(rdr.has_more_data().unwrap());
        assert_eq!(rdr.line_number().unwrap(), 4);
    }

    #[test]
    fn exhausted_stays_exhausted() {
        let mut rdr = Reader::from_reader("a\n\n".as_bytes());
        assert!(rdr.read_record().unwrap().is_some());
        assert!(!rdr.has_more_data().unwrap());
        assert!(rdr.read_record().unwrap().is_none());
        assert!(rdr.read_record().unwrap().is_none());
    }

    #[test]
    fn malformed_then_recovers() {
        let mut rdr = Reader::from_reader("\"te\"st\n2,22".as_bytes());
        match rdr.read_record() {
            Err(Error::MalformedLine { line, text }) => {
                assert_eq!(line, 1);
                assert_eq!(text, "\"te\"st");
            }
            res => panic!("expected malformed line, got {:?}", res),
        }
        assert_eq!(rdr.error_line(), "\"te\"st");
        assert_eq!(rdr.error_line_number(), 1);
        assert_eq!(rdr.line_number().unwrap(), 2);
        assert_eq!(rdr.read_record().unwrap().unwrap(), vec!["2", "22"]);
        assert_eq!(rdr.error_line(), "\"te\"st");
    }

    #[test]
    fn unterminated_quote_spans_lines() {
        let mut rdr = Reader::from_reader("1\n\"2,22\n3\r\n4".as_bytes());
        assert_eq!(rdr.read_record().unwrap().unwrap(), vec!["1"]);
        let err = rdr.read_record().unwrap_err();
        assert!(err.is_malformed_line());
        assert_eq!(rdr.error_line(), "\"2,22\n3\r\n4");
        assert_eq!(rdr.error_line_number(), 2);
        assert!(!rdr.has_more_data().unwrap());
    }

    #[test]
    fn trailing_content_after_quote_with_trim() {
        let mut rdr = ReaderBuilder::new()
            .trim_whitespace(true)
            .from_reader("\"2\" ,3\n\"4\" \t\n\"5\" x".as_bytes())
            .unwrap();
        assert_eq!(rdr.read_record().unwrap().unwrap(), vec!["2", "3"]);
        assert_eq!(rdr.read_record().unwrap().unwrap(), vec!["4"]);
        assert!(rdr.read_record().unwrap_err().is_malformed_line());
    }

    #[test]
    fn settings_apply_mid_stream() {
        let mut rdr = Reader::from_reader("a,b\na|b\n'x|y'".as_bytes());
        assert_eq!(rdr.read_record().unwrap().unwrap(), vec!["a", "b"]);
        rdr.set_delimiter("|").unwrap();
        assert_eq!(rdr.read_record().unwrap().unwrap(), vec!["a", "b"]);
        rdr.set_quote('\'').unwrap();
        assert_eq!(rdr.read_record().unwrap().unwrap(), vec!["x|y"]);
    }

    #[test]
    fn setter_validation() {
        let mut rdr = Reader::from_reader("".as_bytes());
        assert!(rdr.set_delimiter("").is_err());
        assert!(rdr.set_delimiter("\r").is_err());
        assert!(rdr.set_delimiter(";\n").is_err());
        assert!(rdr.set_quote('\n').is_err());
        assert!(rdr.set_escape('\r').is_err());
        assert!(rdr.set_delimiter("::").is_ok());
        assert!(rdr.set_compatibility_mode(true).is_err());
        assert!(!rdr.config().compatibility_mode);
        rdr.set_delimiter(";").unwrap();
        rdr.set_compatibility_mode(true).unwrap();
        assert!(rdr.set_delimiter("::").is_err());
    }

    #[test]
    fn builder_validation() {
        assert!(ReaderBuilder::new().delimiter("").from_reader(&b""[..]).is_err());
        assert!(ReaderBuilder::new()
            .delimiter("ab")
            .compatibility_mode(true)
            .from_reader(&b""[..])
            .is_err());
    }

    #[test]
    fn quote_in_delimiter_is_invalid() {
        let mut rdr = Reader::from_reader("a|b".as_bytes());
        rdr.set_quote('|').unwrap();
        rdr.set_delimiter("|").unwrap();
        match rdr.read_record() {
            Err(Error::InvalidOperation(_)) => {}
            res => panic!("expected invalid operation, got {:?}", res),
        }
        rdr.set_has_fields_enclosed_in_quotes(false);
        assert_eq!(rdr.read_record().unwrap().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn closed_reader() {
        let mut rdr = Reader::from_reader("\"te\"st\nx".as_bytes());
        assert!(rdr.read_record().is_err());
        rdr.close();
        rdr.close();
        assert!(rdr.is_closed());
        assert!(rdr.read_record().unwrap_err().is_closed());
        assert!(rdr.has_more_data().unwrap_err().is_closed());
        assert_eq!(rdr.line_number().unwrap(), -1);
        assert_eq!(rdr.error_line(), "");
        assert_eq!(rdr.error_line_number(), -1);
    }

    #[test]
    fn closed_reader_compatibility_keeps_error() {
        let mut rdr = ReaderBuilder::new()
            .compatibility_mode(true)
            .from_reader("\"te\"st".as_bytes())
            .unwrap();
        assert!(rdr.read_record().is_err());
        rdr.close();
        assert_eq!(rdr.error_line(), "\"te\"st");
        assert_eq!(rdr.error_line_number(), 1);
    }

    #[test]
    fn records_iter_continues_after_malformed() {
        let mut rdr = Reader::from_reader("a\n\"b\"c\nd".as_bytes());
        let got: Vec<_> = rdr.records().collect();
        assert_eq!(got.len(), 3);
        assert_eq!(got[0].as_ref().unwrap(), &vec!["a".to_string()]);
        assert!(got[1].as_ref().unwrap_err().is_malformed_line());
        assert_eq!(got[2].as_ref().unwrap(), &vec!["d".to_string()]);
    }

    #[test]
    fn records_iter_stops_on_fatal_error() {
        let mut rdr = Reader::from_reader("a".as_bytes());
        rdr.close();
        let got: Vec<_> = rdr.records().collect();
        assert_eq!(got.len(), 1);
        assert!(got[0].as_ref().unwrap_err().is_closed());
    }
}
