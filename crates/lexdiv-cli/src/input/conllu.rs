//! CoNLL-U / CUPT reader. Tab-split rows, ten or eleven columns, with
//! `#`-prefixed comment lines, `# sent_id =` / `# source_sent_id =`
//! sentence markers, and a blank-line sentence terminator. Column 11,
//! when present, carries PARSEME-style MWE group annotations
//! (`<group_id>[:<category>]`, semicolon-separated for tokens in more
//! than one expression), from which [`super::MweSpan`] surfaces are
//! reconstructed per sentence.

use super::{MweSpan, Sentence, Token};
use crate::error::{CliError, Result};
use linereader::LineReader;
use std::collections::HashMap;
use std::io::Read;

pub struct ConlluReader<R> {
    lines: LineReader<R>,
    done: bool,
}

impl<R: Read> ConlluReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            lines: LineReader::new(inner),
            done: false,
        }
    }
}

struct PendingToken {
    form: String,
    lemma: String,
    mwe_group: Option<u32>,
}

fn parse_row(line: &str) -> Option<PendingToken> {
    let cols: Vec<&str> = line.split('\t').collect();
    if cols.len() != 10 && cols.len() != 11 {
        return None;
    }
    // Multiword-token ranges ("1-2") and empty nodes ("1.1") are not
    // themselves graph tokens; their constituent simple tokens carry
    // the real FORM/LEMMA rows.
    if cols[0].contains('-') || cols[0].contains('.') {
        return None;
    }
    let form = cols[1].to_string();
    let lemma = cols[2].to_string();
    let mwe_group = cols
        .get(10)
        .and_then(|raw| raw.split(';').next())
        .and_then(|first| first.split(':').next())
        .and_then(|id| id.parse::<u32>().ok());
    Some(PendingToken { form, lemma, mwe_group })
}

impl<R: Read> Iterator for ConlluReader<R> {
    type Item = Result<Sentence>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut pending: Vec<PendingToken> = Vec::new();
        let mut group_surfaces: HashMap<u32, Vec<String>> = HashMap::new();

        loop {
            let raw = match self.lines.next_line() {
                Some(Ok(bytes)) => bytes,
                Some(Err(e)) => return Some(Err(CliError::Core(lexdiv_core::Error::Io(e)))),
                None => {
                    self.done = true;
                    break;
                }
            };

            let line = match std::str::from_utf8(raw) {
                Ok(s) => s.trim_end_matches(['\n', '\r']),
                Err(_) => continue,
            };

            if line.is_empty() {
                // Blank line: sentence terminator. Only emit if we
                // actually collected tokens (guards against runs of
                // blank lines between sentences).
                if !pending.is_empty() {
                    break;
                }
                continue;
            }

            if line.starts_with('#') {
                // `# sent_id = ...`, `# source_sent_id = ...`,
                // `# text[_xx] = ...` (including wrapped continuations)
                // are all just skipped.
                continue;
            }

            if let Some(tok) = parse_row(line) {
                if let Some(group) = tok.mwe_group {
                    group_surfaces.entry(group).or_default().push(tok.form.clone());
                }
                pending.push(tok);
            }
        }

        if pending.is_empty() {
            return None;
        }

        let surfaces: HashMap<u32, String> = group_surfaces
            .into_iter()
            .map(|(id, forms)| (id, forms.join("_")))
            .collect();

        let mut contains_mwe = false;
        let tokens = pending
            .into_iter()
            .map(|tok| {
                let mwe = tok.mwe_group.and_then(|id| {
                    surfaces.get(&id).map(|surface| {
                        contains_mwe = true;
                        MweSpan {
                            group_id: id,
                            surface: surface.clone(),
                        }
                    })
                });
                Token {
                    form: tok.form,
                    lemma: tok.lemma,
                    mwe,
                }
            })
            .collect();

        Some(Ok(Sentence { tokens, contains_mwe }))
    }
}
