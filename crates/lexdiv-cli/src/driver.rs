//! Measurement driver (spec.md §4.K): load embeddings, fan ingestion
//! of corpus files out across a thread pool, gate checkpoints on
//! per-sentence/per-document schedules, and on each qualifying gate
//! hit recompute proportions, fit the Zipfian exponent, build whatever
//! distance-matrix-or-iterative-aggregator state the enabled indices
//! need, and emit a TSV row.

use crate::config::CliOpts;
use crate::error::{CliError, Result};
use crate::indices::{self, IterativeResults};
use crate::input::DocumentReader;
use crate::output::{current_rss_bytes, CheckpointRow, MemorySink, StageTimings, TimingSink, TsvSink};
use lexdiv_core::diversity::{LeinsterCobboldAggregator, PairwiseAggregator, StirlingAggregator};
use lexdiv_core::embedding::EmbeddingIndex;
use lexdiv_core::graph::{GraphNode, TypeGraph};
use lexdiv_core::heap::DistanceHeap;
use lexdiv_core::matrix::DistanceRowEngine;
use lexdiv_core::mst::MinimumSpanningTree;
use lexdiv_core::zipf::zipfian_fit;
use lexdiv_core::FpMode;
use parking_lot::Mutex;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;

/// Fires on a linear step (`count % step == 0`) or, with `log10`
/// spacing, at the next power-of-ten-scaled threshold (1, 10, 100, ...
/// scaled by `step`) -- a coarser schedule for corpora too large to
/// checkpoint every N sentences.
struct GateSchedule {
    step: u64,
    log10: bool,
    next_threshold: u64,
}

impl GateSchedule {
    fn new(step: u64, log10: bool) -> Self {
        let next_threshold = if log10 { step.max(1) } else { step };
        Self { step, log10, next_threshold }
    }

    fn should_fire(&mut self, count: u64) -> bool {
        if self.step == 0 {
            return false;
        }
        if self.log10 {
            if count >= self.next_threshold {
                while self.next_threshold <= count {
                    self.next_threshold *= 10;
                }
                true
            } else {
                false
            }
        } else {
            count % self.step == 0
        }
    }
}

struct MeasurementMutables {
    sentences_containing_mwe: u64,
    total_sentences: u64,
    total_documents: u64,
    sentence_gate: GateSchedule,
    document_gate: GateSchedule,
    prev_s: Option<f64>,
    prev_node_count: Option<usize>,
    checkpoint_index: u64,
    last_checkpoint_at: Instant,
}

impl MeasurementMutables {
    fn new(opts: &CliOpts) -> Self {
        Self {
            sentences_containing_mwe: 0,
            total_sentences: 0,
            total_documents: 0,
            sentence_gate: GateSchedule::new(opts.sentence_count_recompute_step, opts.sentence_count_recompute_step_log10),
            document_gate: GateSchedule::new(opts.document_count_recompute_step, opts.document_count_recompute_step_log10),
            prev_s: None,
            prev_node_count: None,
            checkpoint_index: 0,
            last_checkpoint_at: Instant::now(),
        }
    }

    fn record_sentence(&mut self, contains_mwe: bool) -> bool {
        self.total_sentences += 1;
        if contains_mwe {
            self.sentences_containing_mwe += 1;
        }
        self.sentence_gate.should_fire(self.total_sentences)
    }

    fn record_document(&mut self) -> bool {
        self.total_documents += 1;
        self.document_gate.should_fire(self.total_documents)
    }
}

struct Sinks {
    primary: Mutex<TsvSink>,
    timing: Option<Mutex<TimingSink>>,
    memory: Option<Mutex<MemorySink>>,
}

struct Shared {
    embeddings: EmbeddingIndex,
    graph: TypeGraph,
    mutables: Mutex<MeasurementMutables>,
    sinks: Sinks,
}

pub fn run(opts: &CliOpts) -> Result<()> {
    log::info!("loading embeddings from {}", opts.w2v_path);
    let embeddings = EmbeddingIndex::load_word2vec_binary(&opts.w2v_path).map_err(CliError::Core)?;
    log::info!(
        "loaded {} embeddings of dimension {}",
        embeddings.num_vectors(),
        embeddings.num_dimensions()
    );

    let graph = TypeGraph::new();
    let mutables = Mutex::new(MeasurementMutables::new(opts));

    let primary = Mutex::new(TsvSink::create(&opts.output_path)?);
    let timing = if opts.enable_timing_output {
        Some(Mutex::new(TimingSink::create(format!("{}_timing.tsv", opts.output_path))?))
    } else {
        None
    };
    let memory = if opts.enable_memory_output {
        Some(Mutex::new(MemorySink::create(format!("{}_memory.tsv", opts.output_path))?))
    } else {
        None
    };

    let shared = Shared { embeddings, graph, mutables, sinks: Sinks { primary, timing, memory } };

    let files = read_file_list(&opts.input_path)?;
    log::info!("processing {} corpus files", files.len());

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.num_file_reading_threads.max(1))
        .build()
        .map_err(|e| CliError::Core(lexdiv_core::Error::ThreadSpawn(e.to_string())))?;

    pool.install(|| files.par_iter().try_for_each(|path| process_file(path, opts, &shared)))?;

    log::info!("final snapshot");
    maybe_emit_checkpoint(opts, &shared, true)?;
    Ok(())
}

fn read_file_list(path: &str) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(lexdiv_core::Error::Io)?;
    Ok(content.lines().map(str::trim).filter(|l| !l.is_empty()).map(String::from).collect())
}

/// The content key a JSONL document's text lives under. Spec.md leaves
/// this configurable at the driver's interface but names no CLI flag
/// for it (§6 only lists `"id"` and "a configurable content key");
/// `"text"` is the conventional default the corpora in this domain use.
const JSONL_CONTENT_KEY: &str = "text";

/// A JSONL file's "documents" are its individual lines; a CoNLL-U/CUPT
/// file has no per-line document marker, so the whole file counts as
/// one document, and the document gate is only checked once the file
/// is fully read.
fn process_file(path: &str, opts: &CliOpts, shared: &Shared) -> Result<()> {
    let reader = DocumentReader::open(path, JSONL_CONTENT_KEY)?;
    let per_line_documents = reader.is_document_grained();

    for sentence in reader {
        let sentence = sentence?;
        for token in &sentence.tokens {
            if let Some(key) = token.key_for(opts.target_column) {
                shared.graph.observe(&shared.embeddings, key);
            }
        }

        let fire = {
            let mut m = shared.mutables.lock();
            let mut fire = m.record_sentence(sentence.contains_mwe);
            if per_line_documents {
                fire |= m.record_document();
            }
            fire
        };
        if fire {
            maybe_emit_checkpoint(opts, shared, false)?;
        }
    }

    if !per_line_documents {
        let fire = shared.mutables.lock().record_document();
        if fire {
            maybe_emit_checkpoint(opts, shared, false)?;
        }
    }
    Ok(())
}

fn compute_iterative(
    engine: &DistanceRowEngine,
    nodes: &[Arc<GraphNode>],
    p: &[f64],
    opts: &CliOpts,
    result: &mut IterativeResults,
) -> Result<()> {
    let idx = &opts.indices;
    if !(idx.enable_pairwise || idx.enable_stirling || idx.enable_leinster_cobbold) {
        return Ok(());
    }
    let n = nodes.len();
    let threads = opts.num_row_threads.max(1);

    let mut pairwise = idx.enable_pairwise.then(|| PairwiseAggregator::new(n));
    let mut stirling = idx.enable_stirling.then(|| StirlingAggregator::new(p, idx.stirling_alpha, idx.stirling_beta));
    let mut leinster_cobbold =
        idx.enable_leinster_cobbold.then(|| LeinsterCobboldAggregator::new(p, idx.leinster_cobbold_alpha));

    let mut i = 0;
    while i < n {
        let batch = threads.min(n - i);
        let mut buf = vec![0.0_f32; batch * n];
        engine.compute_row_batch(nodes, i, batch, threads, &mut buf).map_err(CliError::Core)?;
        for b in 0..batch {
            let row = &buf[b * n..(b + 1) * n];
            if let Some(agg) = pairwise.as_mut() {
                agg.accumulate_row(i + b, row);
            }
            if let Some(agg) = stirling.as_mut() {
                agg.accumulate_row(i + b, row);
            }
            if let Some(agg) = leinster_cobbold.as_mut() {
                agg.accumulate_row(i + b, row);
            }
        }
        i += batch;
    }

    result.pairwise = pairwise.map(|a| a.finalize());
    result.stirling = stirling.map(|a| a.finalize());
    result.leinster_cobbold = leinster_cobbold.map(|a| a.finalize());
    Ok(())
}

/// Recomputes proportions, fits Zipf, builds whatever distance-matrix
/// or iterative-aggregator state the enabled indices need, and writes
/// one checkpoint row -- unless deduplicated per spec.md §8 scenario 6
/// (`s` and node count both unchanged since the previous emission).
///
/// Proportions, counts and the node list are all read from one
/// [`TypeGraph::checkpoint_snapshot`] call, which holds the graph's
/// nodes-mutex for the whole recompute-then-read sequence (spec.md §5,
/// §4.K step 2). Reading them via four separately-locked calls instead
/// would let a concurrent `observe()` from another file-ingestion thread
/// splice a node in between reads, leaving `nodes.len()` and `p.len()`
/// inconsistent with each other -- an out-of-bounds panic waiting to
/// happen in the per-row iterative aggregators below.
fn maybe_emit_checkpoint(opts: &CliOpts, shared: &Shared, is_final: bool) -> Result<()> {
    let checkpoint_started = Instant::now();

    let t0 = Instant::now();
    let snap = shared.graph.checkpoint_snapshot();
    let proportions_elapsed = t0.elapsed();

    let p = snap.relative;
    let absolute = snap.absolute;
    let nodes = snap.nodes;
    let node_count = p.len();

    let t1 = Instant::now();
    let fitted_s = zipfian_fit(&p);
    let zipf_elapsed = t1.elapsed();

    let (checkpoint_index, sentences_elapsed, documents_elapsed, ingestion_elapsed) = {
        let mut m = shared.mutables.lock();
        let unchanged = !is_final && m.prev_s == Some(fitted_s) && m.prev_node_count == Some(node_count);
        if unchanged {
            log::debug!("checkpoint skipped: (s, n_nodes) unchanged since last emission");
            return Ok(());
        }
        let ingestion_elapsed = checkpoint_started.duration_since(m.last_checkpoint_at);
        m.prev_s = Some(fitted_s);
        m.prev_node_count = Some(node_count);
        m.checkpoint_index += 1;
        m.last_checkpoint_at = checkpoint_started;
        (m.checkpoint_index, m.total_sentences, m.total_documents, ingestion_elapsed)
    };

    let engine = DistanceRowEngine::new(&shared.graph, &shared.embeddings);
    let n = nodes.len();

    let t2 = Instant::now();
    let mut matrix = None;
    let mut mst = None;
    let mut iterative = IterativeResults::default();

    if n >= 2 {
        if opts.enable_iterative_distance_computation {
            compute_iterative(&engine, &nodes, &p, opts, &mut iterative)?;
        }
        if indices::needs_full_matrix(&opts.indices, opts.enable_iterative_distance_computation) {
            let built = engine
                .compute_full_matrix(FpMode::Fp32, opts.num_matrix_threads.max(1))
                .map_err(CliError::Core)?;
            if opts.indices.enable_functional_evenness {
                let mut heap = DistanceHeap::from_matrix(&built);
                mst = Some(MinimumSpanningTree::build(n, &mut heap));
            }
            matrix = Some(built);
        }
    }
    let matrix_elapsed = t2.elapsed();

    let t3 = Instant::now();
    let mut values = indices::non_disparity_values(&opts.indices, &p, &absolute);
    if let Some(dim) = nodes.first().map(|node| node.num_dimensions()) {
        if let Some(v) = indices::pielou_1977_value(&opts.indices, &p, dim) {
            values.push(v);
        }
    }
    values.extend(indices::disparity_values(&opts.indices, &p, matrix.as_ref(), mst.as_ref(), &iterative)?);
    if indices::needs_raw_vectors(&opts.indices) {
        let vectors: Vec<&[f32]> = nodes.iter().map(|node| shared.embeddings.vector(node.embedding_index())).collect();
        values.extend(indices::raw_vector_values(&opts.indices, &vectors, &p));
    }
    let diversity_elapsed = t3.elapsed();

    let row = CheckpointRow {
        checkpoint_index,
        sentences_elapsed,
        documents_elapsed,
        node_count,
        discarded_count: shared.embeddings.discarded_snapshot().len(),
        fitted_s,
        values,
    };
    shared.sinks.primary.lock().write_row(&row)?;

    if let Some(timing) = &shared.sinks.timing {
        let timings = StageTimings {
            ingestion: ingestion_elapsed,
            proportions: proportions_elapsed,
            zipf: zipf_elapsed,
            matrix: matrix_elapsed,
            diversity: diversity_elapsed,
        };
        timing.lock().write_row(checkpoint_index, &timings)?;
    }
    if let Some(memory) = &shared.sinks.memory {
        memory.lock().write_row(checkpoint_index, current_rss_bytes())?;
    }

    log::info!("checkpoint {checkpoint_index}: nodes={node_count} s={fitted_s:.4}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_gate_fires_on_multiples_of_step() {
        let mut gate = GateSchedule::new(3, false);
        let fires: Vec<bool> = (1..=9).map(|c| gate.should_fire(c)).collect();
        assert_eq!(fires, vec![false, false, true, false, false, true, false, false, true]);
    }

    #[test]
    fn log10_gate_fires_at_scaled_powers_of_ten() {
        let mut gate = GateSchedule::new(2, true);
        assert!(gate.should_fire(2));
        assert!(!gate.should_fire(5));
        assert!(gate.should_fire(20));
        assert!(!gate.should_fire(50));
        assert!(gate.should_fire(200));
    }

    #[test]
    fn disabled_gate_never_fires() {
        let mut gate = GateSchedule::new(0, false);
        assert!(!gate.should_fire(100));
    }
}
