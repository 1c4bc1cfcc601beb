//! JSONL reader: a single-pass byte scanner, not a general JSON parser
//! (spec.md §6 names this a deliberate Non-goal). Extracts only `"id"`
//! and a configurable content key from each top-level object, honouring
//! `\n \r \t \" \\` escapes and skipping array/object values and any
//! other key. The content field is whitespace-tokenised — no
//! tokenizer, UDPipe or otherwise, is in scope.

use super::{Sentence, Token};
use crate::error::{CliError, Result};
use linereader::LineReader;
use std::io::Read;

struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
}

fn utf8_len(lead: u8) -> usize {
    if lead & 0x80 == 0 {
        1
    } else if lead & 0xE0 == 0xC0 {
        2
    } else if lead & 0xF0 == 0xE0 {
        3
    } else if lead & 0xF8 == 0xF0 {
        4
    } else {
        1
    }
}

impl<'a> Scanner<'a> {
    fn new(s: &'a str) -> Self {
        Self { bytes: s.as_bytes(), pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.pos += 1;
        }
    }

    /// Assumes the current byte is the opening `"`.
    fn parse_quoted_string(&mut self) -> Option<String> {
        self.advance();
        let mut out = String::new();
        loop {
            match self.advance()? {
                b'"' => return Some(out),
                b'\\' => match self.advance()? {
                    b'n' => out.push('\n'),
                    b'r' => out.push('\r'),
                    b't' => out.push('\t'),
                    b'"' => out.push('"'),
                    b'\\' => out.push('\\'),
                    other => out.push(other as char),
                },
                lead => {
                    let len = utf8_len(lead);
                    let start = self.pos - 1;
                    for _ in 1..len {
                        if self.advance().is_none() {
                            break;
                        }
                    }
                    if let Ok(s) = std::str::from_utf8(&self.bytes[start..self.pos]) {
                        out.push_str(s);
                    }
                }
            }
        }
    }

    /// Skips a value of any JSON type without allocating: quoted
    /// strings via [`Self::parse_quoted_string`], arrays/objects by
    /// depth-counted bracket matching (quote-aware so braces inside
    /// strings don't confuse the count), scalars by scanning to the
    /// next `,` or `}`.
    fn skip_value(&mut self) {
        self.skip_ws();
        match self.peek() {
            Some(b'"') => {
                self.parse_quoted_string();
            }
            Some(open @ (b'[' | b'{')) => {
                let close = if open == b'[' { b']' } else { b'}' };
                let mut depth = 0;
                loop {
                    match self.peek() {
                        Some(b'"') => {
                            self.parse_quoted_string();
                        }
                        Some(c) if c == open => {
                            depth += 1;
                            self.advance();
                        }
                        Some(c) if c == close => {
                            depth -= 1;
                            self.advance();
                            if depth == 0 {
                                break;
                            }
                        }
                        Some(_) => {
                            self.advance();
                        }
                        None => break,
                    }
                }
            }
            _ => {
                while let Some(c) = self.peek() {
                    if c == b',' || c == b'}' {
                        break;
                    }
                    self.advance();
                }
            }
        }
    }
}

/// Extracts `(id, content)` from one JSONL line's top-level object.
fn extract_fields(line: &str, content_key: &str) -> (Option<String>, Option<String>) {
    let mut sc = Scanner::new(line);
    sc.skip_ws();
    if sc.peek() != Some(b'{') {
        return (None, None);
    }
    sc.advance();

    let mut id = None;
    let mut content = None;

    loop {
        sc.skip_ws();
        match sc.peek() {
            None | Some(b'}') => break,
            Some(b',') => {
                sc.advance();
                continue;
            }
            Some(b'"') => {
                let key = sc.parse_quoted_string().unwrap_or_default();
                sc.skip_ws();
                if sc.peek() == Some(b':') {
                    sc.advance();
                }
                sc.skip_ws();

                if key == "id" {
                    id = if sc.peek() == Some(b'"') {
                        sc.parse_quoted_string()
                    } else {
                        let start = sc.pos;
                        while let Some(c) = sc.peek() {
                            if c == b',' || c == b'}' {
                                break;
                            }
                            sc.advance();
                        }
                        Some(line[start..sc.pos].trim().to_string())
                    };
                } else if key == content_key {
                    content = if sc.peek() == Some(b'"') {
                        sc.parse_quoted_string()
                    } else {
                        sc.skip_value();
                        None
                    };
                } else {
                    sc.skip_value();
                }
            }
            _ => {
                sc.advance();
            }
        }
    }

    (id, content)
}

pub struct JsonlReader<R> {
    lines: LineReader<R>,
    content_key: String,
}

impl<R: Read> JsonlReader<R> {
    pub fn new(inner: R, content_key: String) -> Self {
        Self { lines: LineReader::new(inner), content_key }
    }
}

impl<R: Read> Iterator for JsonlReader<R> {
    type Item = Result<Sentence>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let raw = match self.lines.next_line() {
                Some(Ok(bytes)) => bytes,
                Some(Err(e)) => return Some(Err(CliError::Core(lexdiv_core::Error::Io(e)))),
                None => return None,
            };
            let line = match std::str::from_utf8(raw) {
                Ok(s) => s.trim_end_matches(['\n', '\r']),
                Err(_) => continue,
            };
            if line.trim().is_empty() {
                continue;
            }

            let (_id, content) = extract_fields(line, &self.content_key);
            let content = match content {
                Some(c) => c,
                None => continue,
            };
            let tokens = content
                .split_whitespace()
                .map(|w| Token {
                    form: w.to_string(),
                    lemma: w.to_string(),
                    mwe: None,
                })
                .collect();
            return Some(Ok(Sentence { tokens, contains_mwe: false }));
        }
    }
}
