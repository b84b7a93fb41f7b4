use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use tracing::debug;

use crate::config::{self, QuoteStyle, Terminator, WriterConfig};
use crate::error::{Error, Result};

/// Builds a delimited text writer with various configuration knobs.
#[derive(Debug, Default)]
pub struct WriterBuilder {
    config: WriterConfig,
}

impl WriterBuilder {
    /// Create a new builder with the default configuration.
    pub fn new() -> WriterBuilder {
        WriterBuilder::default()
    }

    /// Create a new builder from an existing configuration.
    pub fn from_config(config: WriterConfig) -> WriterBuilder {
        WriterBuilder { config: config }
    }

    /// Build a writer from this configuration that writes to `wtr`.
    ///
    /// This returns an error if the configuration is invalid.
    pub fn from_writer<W: io::Write>(&self, wtr: W) -> Result<Writer<W>> {
        self.config.validate()?;
        Ok(Writer::new(wtr, self.config.clone()))
    }

    /// Build a writer from this configuration that writes to the file at
    /// the given path. The file is truncated if it exists.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Writer<File>> {
        self.config.validate()?;
        Ok(Writer::new(File::create(path)?, self.config.clone()))
    }

    /// The field delimiter to write. The default is `,`.
    pub fn delimiter(&mut self, delimiter: &str) -> &mut WriterBuilder {
        self.config.delimiter = delimiter.to_string();
        self
    }

    /// The quote character. The default is `"`.
    ///
    /// If the escape character currently equals the quote character, it is
    /// changed along with it.
    pub fn quote(&mut self, quote: char) -> &mut WriterBuilder {
        self.config.relink_quote(quote);
        self
    }

    /// The character written before every quote character inside a quoted
    /// field. The default is the quote character, i.e., quotes are doubled.
    pub fn escape(&mut self, escape: char) -> &mut WriterBuilder {
        self.config.escape = escape;
        self
    }

    /// The record terminator. The default is the platform newline.
    pub fn terminator(&mut self, term: Terminator) -> &mut WriterBuilder {
        self.config.terminator = term;
        self
    }

    /// The quoting style. The default is `QuoteStyle::Necessary`.
    pub fn quote_style(&mut self, style: QuoteStyle) -> &mut WriterBuilder {
        self.config.quote_style = style;
        self
    }
}

/// A writer of delimited text.
///
/// A field is quoted when it contains the delimiter, the quote character,
/// the escape character, `\r` or `\n`, or always when the quote style is
/// `QuoteStyle::Always`. With a multi-character delimiter, a field that
/// ends with the start of the delimiter is quoted too. Inside a quoted
/// field, every quote character is preceded by the escape character.
///
/// One slight deviation is that records with a single empty field are
/// always encoded as two quote characters. Otherwise the record would be an
/// empty line, which readers skip.
///
/// Output is buffered. Call `flush` or `close` to make sure everything has
/// reached the underlying writer.
#[derive(Debug)]
pub struct Writer<W: io::Write> {
    wtr: Option<io::BufWriter<W>>,
    config: WriterConfig,
}

impl<W: io::Write> Writer<W> {
    /// Create a new writer with the default configuration.
    pub fn from_writer(wtr: W) -> Writer<W> {
        Writer::new(wtr, WriterConfig::default())
    }

    fn new(wtr: W, config: WriterConfig) -> Writer<W> {
        Writer { wtr: Some(io::BufWriter::new(wtr)), config: config }
    }
}

impl Writer<File> {
    /// Create a new writer with the default configuration for the file at
    /// the given path. The file is truncated if it exists.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Writer<File>> {
        WriterBuilder::new().from_path(path)
    }
}

impl<W: io::Write> Writer<W> {
    /// Write a single record.
    ///
    /// An empty record writes only the record terminator.
    pub fn write_record<I, T>(&mut self, record: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut count = 0;
        let mut last_empty = false;
        for field in record {
            let field = field.as_ref();
            if count > 0 {
                let wtr = self.wtr.as_mut().ok_or(Error::Closed)?;
                wtr.write_all(self.config.delimiter.as_bytes())?;
            }
            count += 1;
            last_empty = field.is_empty();
            self.w_field(field)?;
        }
        if count == 1 && last_empty && !self.should_quote("") {
            let q = self.config.quote;
            self.w_char(q)?;
            self.w_char(q)?;
        }
        let term = self.config.terminator.as_str();
        self.w_str(term)
    }

    /// Flush the contents of the internal buffer to the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.wtr()?.flush()?;
        Ok(())
    }

    /// Flush and release the underlying writer.
    ///
    /// Closing is idempotent. Any further write returns `Error::Closed`.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut wtr) = self.wtr.take() {
            debug!("closed writer");
            wtr.flush()?;
        }
        Ok(())
    }

    /// Flush the internal buffer and return the underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        match self.wtr.take() {
            None => Err(Error::Closed),
            Some(wtr) => wtr.into_inner().map_err(|err| Error::Io(err.into())),
        }
    }

    fn w_field(&mut self, field: &str) -> Result<()> {
        if !self.should_quote(field) {
            return self.w_str(field);
        }
        let quoted = self.quote_field(field);
        self.w_str(&quoted)
    }

    fn w_char(&mut self, c: char) -> Result<()> {
        let mut buf = [0; 4];
        self.w_str(c.encode_utf8(&mut buf))
    }

    fn w_str(&mut self, s: &str) -> Result<()> {
        self.wtr()?.write_all(s.as_bytes())?;
        Ok(())
    }

    fn wtr(&mut self) -> Result<&mut io::BufWriter<W>> {
        self.wtr.as_mut().ok_or(Error::Closed)
    }
}

impl<W: io::Write> Writer<W> {
    /// Returns true if `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.wtr.is_none()
    }

    /// The current configuration.
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Set the field delimiter.
    pub fn set_delimiter(&mut self, delimiter: &str) -> Result<()> {
        config::check_delimiter(delimiter, false)?;
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

    /// Set the record terminator from its textual form.
    ///
    /// An empty string restores the platform newline. Otherwise only
    /// `"\n"`, `"\r"` and `"\r\n"` are accepted.
    pub fn set_end_of_line(&mut self, eol: &str) -> Result<()> {
        self.config.terminator = if eol.is_empty() {
            Terminator::platform()
        } else {
            Terminator::from_str_eol(eol)?
        };
        Ok(())
    }

    /// Set the record terminator.
    pub fn set_terminator(&mut self, term: Terminator) {
        self.config.terminator = term;
    }

    /// Set whether every field is quoted.
    pub fn set_force_quotes(&mut self, yes: bool) {
        self.config.quote_style =
            if yes { QuoteStyle::Always } else { QuoteStyle::Necessary };
    }

    /// Set the quoting style.
    pub fn set_quote_style(&mut self, style: QuoteStyle) {
        self.config.quote_style = style;
    }

    fn should_quote(&self, field: &str) -> bool {
        match self.config.quote_style {
            QuoteStyle::Always => true,
            QuoteStyle::Necessary => {
                runs_into_delimiter(field, &self.config.delimiter)
                    || field.contains(self.config.quote)
                    || field.contains(self.config.escape)
                    || memchr::memchr2(b'\r', b'\n', field.as_bytes())
                        .is_some()
            }
        }
    }

    fn quote_field(&self, field: &str) -> String {
        let (quote, escape) = (self.config.quote, self.config.escape);
        let mut buf = String::with_capacity(field.len() + 2);
        buf.push(quote);
        for c in field.chars() {
            if c == quote {
                buf.push(escape);
            }
            buf.push(c);
        }
        buf.push(quote);
        buf
    }
}

/// Returns true if a reader would find the delimiter somewhere other than
/// right after `field`, i.e., if `field` contains the delimiter or ends with
/// a prefix of it.
fn runs_into_delimiter(field: &str, delim: &str) -> bool {
    if delim.chars().nth(1).is_none() {
        return field.contains(delim);
    }
    let mut joined = String::with_capacity(field.len() + delim.len());
    joined.push_str(field);
    joined.push_str(delim);
    joined.find(delim) != Some(field.len())
}
