//! Bounded worker pool for top-level inputs.
//!
//! # Invariants
//! - Each worker scans one entire input, recursion included, sequentially;
//!   nothing inside a single input fans out.
//! - Workers share only the read-only `Scanner`; every input gets a fresh
//!   depth/budget pair owned by that worker's call stack.
//! - Results accumulate in per-worker local vectors and merge when all
//!   workers have finished. Ordering across workers is unspecified.

use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, unbounded};
use tracing::debug;

use crate::candidate::Candidate;
use crate::deep::{ByteBudget, DeepScanner, DEFAULT_BYTE_BUDGET};
use crate::provider::{Content, InputUnit};
use crate::scanner::Scanner;

/// Traversal settings applied to every input.
#[derive(Clone, Copy, Debug)]
pub struct ScanOptions {
    pub workers: usize,
    /// Container nesting levels to unwrap; zero scans text/strings only.
    pub depth: usize,
    /// Extracted-bytes budget per top-level input.
    pub byte_budget: u64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            workers: 4,
            depth: 4,
            byte_budget: DEFAULT_BYTE_BUDGET,
        }
    }
}

/// Scan all inputs across a bounded pool of worker threads and return the
/// merged candidates.
pub fn scan_inputs(
    scanner: Arc<Scanner>,
    inputs: Vec<InputUnit>,
    options: ScanOptions,
) -> Vec<Candidate> {
    let workers = options.workers.max(1).min(inputs.len().max(1));
    let (work_tx, work_rx) = bounded::<InputUnit>(workers * 2);
    let (result_tx, result_rx) = unbounded::<Vec<Candidate>>();

    thread::scope(|scope| {
        for _ in 0..workers {
            let scanner = Arc::clone(&scanner);
            let work_rx = work_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                let deep = DeepScanner::new(scanner);
                let mut local = Vec::new();
                while let Ok(unit) = work_rx.recv() {
                    local.extend(scan_one(&deep, &unit, options));
                }
                let _ = result_tx.send(local);
            });
        }
        drop(work_rx);
        drop(result_tx);

        for unit in inputs {
            if work_tx.send(unit).is_err() {
                break;
            }
        }
        drop(work_tx);

        let mut merged = Vec::new();
        while let Ok(mut local) = result_rx.recv() {
            merged.append(&mut local);
        }
        merged
    })
}

fn scan_one(deep: &DeepScanner, unit: &InputUnit, options: ScanOptions) -> Vec<Candidate> {
    debug!(path = %unit.path, "scanning input");
    let descriptor = unit.descriptor();
    match &unit.content {
        Content::Lines { lines, line_nums } => {
            deep.scanner().scan_numbered(&descriptor, lines, line_nums)
        }
        Content::Bytes { data, .. } => {
            let mut budget = ByteBudget::new(options.byte_budget);
            deep.scan(data, &descriptor, options.depth, &mut budget)
        }
    }
}
