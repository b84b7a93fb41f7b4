use std::collections::VecDeque;
use std::io;

const BUF_SIZE: usize = 1024 * 8;

/// A forward-only stream of characters decoded from UTF-8 bytes.
///
/// Characters can be peeked at an arbitrary distance ahead of the current
/// position. Peeked characters are decoded once and queued, so the
/// underlying reader is never read twice for the same bytes. Invalid UTF-8
/// decodes to U+FFFD.
#[derive(Debug)]
pub struct CharReader<R> {
    rdr: R,
    buf: Vec<u8>,
    start: usize,
    end: usize,
    eof: bool,
    ahead: VecDeque<char>,
}

impl<R: io::Read> CharReader<R> {
    pub fn new(rdr: R) -> CharReader<R> {
        CharReader {
            rdr: rdr,
            buf: vec![0; BUF_SIZE],
            start: 0,
            end: 0,
            eof: false,
            ahead: VecDeque::new(),
        }
    }

    /// Consume and return the next character.
    pub fn next(&mut self) -> io::Result<Option<char>> {
        if let Some(c) = self.ahead.pop_front() {
            return Ok(Some(c));
        }
        self.decode()
    }

    /// Return the character `n` positions ahead without consuming anything.
    pub fn peek_nth(&mut self, n: usize) -> io::Result<Option<char>> {
        while self.ahead.len() <= n {
            match self.decode()? {
                None => return Ok(None),
                Some(c) => self.ahead.push_back(c),
            }
        }
        Ok(Some(self.ahead[n]))
    }

    /// Consume `n` characters, discarding them.
    pub fn skip(&mut self, n: usize) -> io::Result<()> {
        for _ in 0..n {
            if self.next()?.is_none() {
                break;
            }
        }
        Ok(())
    }

    fn decode(&mut self) -> io::Result<Option<char>> {
        // A UTF-8 sequence is at most 4 bytes, so keep at least that many
        // buffered unless the reader is exhausted.
        if self.end - self.start < 4 && !self.eof {
            self.fill()?;
        }
        if self.start == self.end {
            return Ok(None);
        }
        let (ch, size) = bstr::decode_utf8(&self.buf[self.start..self.end]);
        self.start += size;
        Ok(Some(ch.unwrap_or('\u{FFFD}')))
    }

    fn fill(&mut self) -> io::Result<()> {
        self.buf.copy_within(self.start..self.end, 0);
        self.end -= self.start;
        self.start = 0;
        while self.end < 4 && !self.eof {
            match self.rdr.read(&mut self.buf[self.end..]) {
                Ok(0) => self.eof = true,
                Ok(n) => self.end += n,
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}
