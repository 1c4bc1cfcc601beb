//! Corpus readers: CoNLL-U/CUPT sentence files and JSONL documents,
//! dispatched by file extension per spec.md §4.K step 2.

pub mod conllu;
pub mod jsonl;

use crate::config::TargetColumn;
use crate::error::{CliError, Result};
use std::fs::File;
use std::path::Path;

/// A PARSEME-style multiword-expression span: the group id shared by
/// every token of the expression, and the expression's reconstructed
/// surface form (the token forms in appearance order, underscore
/// joined). `--target_column=UD_MWE` selects this as the graph key.
#[derive(Debug, Clone)]
pub struct MweSpan {
    pub group_id: u32,
    pub surface: String,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub form: String,
    pub lemma: String,
    pub mwe: Option<MweSpan>,
}

impl Token {
    /// The string that should be looked up in the embedding index for
    /// this token, per the requested `--target_column`. `None` for
    /// `UD_MWE` tokens outside any expression.
    pub fn key_for(&self, column: TargetColumn) -> Option<&str> {
        match column {
            TargetColumn::UdForm => Some(self.form.as_str()),
            TargetColumn::UdLemma => Some(self.lemma.as_str()),
            TargetColumn::UdMwe => self.mwe.as_ref().map(|m| m.surface.as_str()),
        }
    }
}

#[derive(Debug, Default)]
pub struct Sentence {
    pub tokens: Vec<Token>,
    pub contains_mwe: bool,
}

/// Dispatches to the correct reader by file extension and yields one
/// [`Sentence`] per CoNLL-U sentence or per JSONL line.
pub enum DocumentReader {
    Conllu(conllu::ConlluReader<File>),
    Jsonl(jsonl::JsonlReader<File>),
}

impl DocumentReader {
    pub fn open<P: AsRef<Path>>(path: P, content_key: &str) -> Result<Self> {
        let path = path.as_ref();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let file = File::open(path).map_err(lexdiv_core::Error::Io)?;
        match ext {
            "conllu" | "cupt" => Ok(Self::Conllu(conllu::ConlluReader::new(file))),
            "jsonl" => Ok(Self::Jsonl(jsonl::JsonlReader::new(file, content_key.to_string()))),
            other => Err(CliError::InvalidFlag {
                flag: "input_path".to_string(),
                reason: format!("unrecognised corpus file extension: {other:?}"),
            }),
        }
    }

    /// Whether each line of this file is its own document (JSONL) as
    /// opposed to the whole file being one document (CoNLL-U/CUPT,
    /// which carries no per-line document marker).
    pub fn is_document_grained(&self) -> bool {
        matches!(self, Self::Jsonl(_))
    }
}

impl Iterator for DocumentReader {
    type Item = Result<Sentence>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Conllu(r) => r.next(),
            Self::Jsonl(r) => r.next(),
        }
    }
}
