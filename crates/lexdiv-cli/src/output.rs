//! Output sinks: the primary checkpoint TSV plus the optional
//! `*_timing.tsv` / `*_memory.tsv` siblings (spec.md §6, SPEC_FULL.md
//! §3.6). Each sink lazily writes its header on the first row so the
//! column set (which depends on which indices are enabled) only needs
//! to be known once, at the first checkpoint.

use crate::error::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

pub struct CheckpointRow {
    pub checkpoint_index: u64,
    pub sentences_elapsed: u64,
    pub documents_elapsed: u64,
    pub node_count: usize,
    pub discarded_count: usize,
    pub fitted_s: f64,
    pub values: Vec<(String, f64)>,
}

pub struct TsvSink {
    writer: BufWriter<File>,
    header_written: bool,
}

impl TsvSink {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path).map_err(lexdiv_core::Error::Io)?;
        Ok(Self { writer: BufWriter::new(file), header_written: false })
    }

    pub fn write_row(&mut self, row: &CheckpointRow) -> Result<()> {
        if !self.header_written {
            write!(
                self.writer,
                "checkpoint\tsentences\tdocuments\tnodes\tdiscarded\tzipf_s"
            )
            .map_err(lexdiv_core::Error::Io)?;
            for (name, _) in &row.values {
                write!(self.writer, "\t{name}").map_err(lexdiv_core::Error::Io)?;
            }
            writeln!(self.writer).map_err(lexdiv_core::Error::Io)?;
            self.header_written = true;
        }

        write!(
            self.writer,
            "{}\t{}\t{}\t{}\t{}\t{}",
            row.checkpoint_index,
            row.sentences_elapsed,
            row.documents_elapsed,
            row.node_count,
            row.discarded_count,
            row.fitted_s
        )
        .map_err(lexdiv_core::Error::Io)?;
        for (_, value) in &row.values {
            write!(self.writer, "\t{value}").map_err(lexdiv_core::Error::Io)?;
        }
        writeln!(self.writer).map_err(lexdiv_core::Error::Io)?;
        self.writer.flush().map_err(lexdiv_core::Error::Io)?;
        Ok(())
    }
}

pub struct StageTimings {
    pub ingestion: Duration,
    pub proportions: Duration,
    pub zipf: Duration,
    pub matrix: Duration,
    pub diversity: Duration,
}

pub struct TimingSink {
    writer: BufWriter<File>,
    header_written: bool,
}

impl TimingSink {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path).map_err(lexdiv_core::Error::Io)?;
        Ok(Self { writer: BufWriter::new(file), header_written: false })
    }

    pub fn write_row(&mut self, checkpoint_index: u64, t: &StageTimings) -> Result<()> {
        if !self.header_written {
            writeln!(
                self.writer,
                "checkpoint\tingestion_ns\tproportions_ns\tzipf_ns\tmatrix_ns\tdiversity_ns"
            )
            .map_err(lexdiv_core::Error::Io)?;
            self.header_written = true;
        }
        writeln!(
            self.writer,
            "{}\t{}\t{}\t{}\t{}\t{}",
            checkpoint_index,
            t.ingestion.as_nanos(),
            t.proportions.as_nanos(),
            t.zipf.as_nanos(),
            t.matrix.as_nanos(),
            t.diversity.as_nanos()
        )
        .map_err(lexdiv_core::Error::Io)?;
        self.writer.flush().map_err(lexdiv_core::Error::Io)?;
        Ok(())
    }
}

pub struct MemorySink {
    writer: BufWriter<File>,
    header_written: bool,
}

impl MemorySink {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path).map_err(lexdiv_core::Error::Io)?;
        Ok(Self { writer: BufWriter::new(file), header_written: false })
    }

    pub fn write_row(&mut self, checkpoint_index: u64, rss_bytes: u64) -> Result<()> {
        if !self.header_written {
            writeln!(self.writer, "checkpoint\trss_bytes").map_err(lexdiv_core::Error::Io)?;
            self.header_written = true;
        }
        writeln!(self.writer, "{checkpoint_index}\t{rss_bytes}").map_err(lexdiv_core::Error::Io)?;
        self.writer.flush().map_err(lexdiv_core::Error::Io)?;
        Ok(())
    }
}

/// Current process RSS in bytes, read from `/proc/self/status`. Not
/// every platform exposes this; `0` is reported rather than failing
/// the checkpoint over a diagnostic.
pub fn current_rss_bytes() -> u64 {
    let Ok(status) = std::fs::read_to_string("/proc/self/status") else {
        return 0;
    };
    status
        .lines()
        .find(|line| line.starts_with("VmRSS:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|kb| kb.parse::<u64>().ok())
        .map(|kb| kb * 1024)
        .unwrap_or(0)
}
