use crate::config::Config;
use crate::error::{SslcError, SslcResult};
use crate::layout::{current_slot_count, slot_breakdown, SlotBreakdown, SLOT_CAPACITY};
use crate::optimizer::{Optimizer, PackingResult, ProgressCallback, SearchOptions, Termination};
use crate::solidity::{extract_records, Record};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Current vs optimized slot usage of one struct.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LayoutReport {
    pub source: String,
    pub container: Option<String>,
    pub record: String,
    pub current: u32,
    pub optimized: u32,
    pub slots_saved: u32,
    pub timed_out: bool,
    pub termination: Termination,
}

impl LayoutReport {
    pub fn can_be_optimized(&self) -> bool {
        self.optimized < self.current
    }

    /// `Container.Record`, or just the record name at file level.
    pub fn qualified_name(&self) -> String {
        match &self.container {
            Some(c) => format!("{}.{}", c, self.record),
            None => self.record.clone(),
        }
    }
}

/// Engine result for a bare size list.
#[derive(Debug, Clone)]
pub struct SizeAnalysis {
    pub current: u32,
    pub optimized: u32,
    pub total_bytes: u32,
    pub packing: PackingResult,
}

impl SizeAnalysis {
    pub fn slots_saved(&self) -> u32 {
        self.current - self.optimized
    }

    pub fn lower_bound(&self) -> u32 {
        self.total_bytes.div_ceil(SLOT_CAPACITY)
    }
}

#[derive(Debug, Clone)]
pub struct StructAnalysis {
    pub record: Record,
    pub breakdown: SlotBreakdown,
    pub packing: PackingResult,
    pub report: LayoutReport,
}

#[derive(Debug, Clone)]
pub struct FileAnalysis {
    pub label: String,
    pub structs: Vec<StructAnalysis>,
}

/// Baseline and optimum for `sizes`.
///
/// The declared order is itself a valid packing, so the optimum is never
/// reported above the baseline even when the search stopped early.
pub fn analyze_sizes<CB: ProgressCallback>(
    sizes: &[u8],
    optimizer: &Optimizer,
    callback: &CB,
) -> SslcResult<SizeAnalysis> {
    let current = current_slot_count(sizes);
    let packing = optimizer.run(sizes, callback)?;
    let optimized = packing.slots_used.min(current);

    Ok(SizeAnalysis {
        current,
        optimized,
        total_bytes: sizes.iter().map(|&s| s as u32).sum(),
        packing,
    })
}

pub fn analyze_record<CB: ProgressCallback>(
    label: &str,
    record: Record,
    optimizer: &Optimizer,
    callback: &CB,
) -> SslcResult<StructAnalysis> {
    let sizes = record.sizes();
    let analysis = analyze_sizes(&sizes, optimizer, callback)?;

    if analysis.packing.timed_out {
        warn!(
            "⏱️  Search for struct '{}' stopped early ({}); result is a best-effort bound",
            record.name, analysis.packing.termination
        );
    }
    debug!(
        "{}: {} current, {} optimized, {} orderings evaluated",
        record.name, analysis.current, analysis.optimized, analysis.packing.orderings_evaluated
    );

    let report = LayoutReport {
        source: label.to_string(),
        container: record.container.clone(),
        record: record.name.clone(),
        current: analysis.current,
        optimized: analysis.optimized,
        slots_saved: analysis.slots_saved(),
        timed_out: analysis.packing.timed_out,
        termination: analysis.packing.termination,
    };

    Ok(StructAnalysis {
        breakdown: slot_breakdown(&sizes),
        packing: analysis.packing,
        record,
        report,
    })
}

/// Analyzes every struct of one Solidity source. Structs are searched in
/// parallel; the result keeps declaration order.
pub fn analyze_source<CB: ProgressCallback>(
    label: &str,
    source: &str,
    config: &Config,
    callback: &CB,
) -> SslcResult<FileAnalysis> {
    let records = extract_records(source, config.extract.only_last)?;
    let optimizer = Optimizer::new(SearchOptions::from(config));

    // Each in-flight search holds its own duplicate filter, up to
    // `max_trie_nodes` nodes, so peak memory scales with the worker count.
    let structs = records
        .into_par_iter()
        .map(|record| analyze_record(label, record, &optimizer, callback))
        .collect::<SslcResult<Vec<_>>>()?;

    Ok(FileAnalysis {
        label: label.to_string(),
        structs,
    })
}

pub fn analyze_files<CB: ProgressCallback>(
    paths: &[PathBuf],
    config: &Config,
    callback: &CB,
) -> SslcResult<Vec<FileAnalysis>> {
    let labels = source_labels(paths);
    let mut results = Vec::with_capacity(paths.len());

    for (path, label) in paths.iter().zip(labels) {
        info!("📂 Analyzing {}", path.display());
        let source = fs::read_to_string(path).map_err(|e| SslcError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        results.push(analyze_source(&label, &source, config, callback)?);
    }

    Ok(results)
}

fn has_glob_chars(s: &str) -> bool {
    s.contains(['*', '?', '['])
}

/// Expands glob patterns; plain paths are passed through untouched.
pub fn expand_inputs(inputs: &[String]) -> SslcResult<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        if !has_glob_chars(input) {
            paths.push(PathBuf::from(input));
            continue;
        }

        let before = paths.len();
        for entry in glob::glob(input)? {
            let path = entry.map_err(|e| SslcError::Io(e.into_error()))?;
            if path.is_file() {
                paths.push(path);
            }
        }
        if paths.len() == before {
            warn!("⚠️  Pattern '{}' matched no files", input);
        }
    }
    Ok(paths)
}

/// Display labels for input files: each path minus the directory prefix shared
/// by all inputs.
pub fn source_labels(paths: &[PathBuf]) -> Vec<String> {
    let strings: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
    let Some(first) = strings.first() else {
        return Vec::new();
    };

    let mut shared = first.len();
    for s in &strings[1..] {
        shared = first
            .bytes()
            .zip(s.bytes())
            .take(shared)
            .take_while(|(a, b)| a == b)
            .count();
    }

    // Cut at a directory boundary so file names stay whole.
    let cut = first.as_bytes()[..shared]
        .iter()
        .rposition(|&b| b == b'/' || b == b'\\')
        .map(|idx| idx + 1)
        .unwrap_or(0);

    strings.iter().map(|s| s[cut..].to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::NoProgress;

    #[test]
    fn test_source_labels_strip_shared_directory() {
        let paths = vec![
            PathBuf::from("contracts/tokens/A.sol"),
            PathBuf::from("contracts/tokens/AB.sol"),
            PathBuf::from("contracts/vaults/V.sol"),
        ];
        assert_eq!(
            source_labels(&paths),
            vec!["tokens/A.sol", "tokens/AB.sol", "vaults/V.sol"]
        );
    }

    #[test]
    fn test_single_source_keeps_file_name() {
        let paths = vec![PathBuf::from("contracts/Token.sol")];
        assert_eq!(source_labels(&paths), vec!["Token.sol"]);
    }

    #[test]
    fn test_analyze_sizes_clamps_to_baseline() {
        let optimizer = Optimizer::new(SearchOptions {
            timeout: std::time::Duration::ZERO,
            progress_interval: 1,
            ..SearchOptions::default()
        });
        // Declared order fills two slots exactly; the first searched
        // ordering (largest first) needs three.
        let sizes = [20, 8, 4, 20, 8, 4];
        let analysis = analyze_sizes(&sizes, &optimizer, &NoProgress).unwrap();
        assert!(analysis.packing.timed_out);
        assert_eq!(analysis.packing.slots_used, 3);
        assert_eq!(analysis.current, 2);
        assert_eq!(analysis.optimized, 2);
        assert_eq!(analysis.lower_bound(), 2);
    }

    #[test]
    fn test_analyze_source_keeps_order() {
        let src = r#"
contract C {
    struct A { uint8 a; uint256 b; uint8 c; }
    struct B { uint128 a; uint128 b; }
    struct D { address a; uint256 b; uint96 c; }
}
"#;
        let analysis = analyze_source("C.sol", src, &Config::default(), &NoProgress).unwrap();
        let names: Vec<&str> = analysis
            .structs
            .iter()
            .map(|s| s.report.record.as_str())
            .collect();
        assert_eq!(names, vec!["A", "B", "D"]);

        let a = &analysis.structs[0].report;
        assert_eq!((a.current, a.optimized, a.slots_saved), (3, 2, 1));
        assert!(a.can_be_optimized());
        assert_eq!(a.qualified_name(), "C.A");

        let b = &analysis.structs[1].report;
        assert_eq!((b.current, b.optimized), (1, 1));

        let d = &analysis.structs[2].report;
        assert_eq!((d.current, d.optimized), (3, 2));
        assert_eq!(d.termination, Termination::Exact);
    }
}
