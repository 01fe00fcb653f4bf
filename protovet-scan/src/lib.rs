//! Implementation-side symbol discovery.
//!
//! The reconciliation engine only ever sees an [`ImplIndex`]; which strategy
//! produced it is this crate's business. The preferred strategy is an
//! external AST-based extractor; when that tool is absent, errors out, or
//! times out, the pattern scanner takes over. When both fail the index is
//! empty, which makes every manifest-to-implementation check report
//! missing: a loud failure mode rather than a silent skip.

mod ast;
mod pattern;
pub mod query;

pub use ast::AstExtractor;
pub use pattern::PatternExtractor;

use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

/// A declared symbol in the implementation tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Declaration kind: struct, class, enum, protocol, typealias, actor.
    pub kind: String,
    pub file: String,
    pub line: Option<u64>,
}

/// Read-only index of declared symbols, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ImplIndex {
    symbols: BTreeMap<String, Symbol>,
}

impl ImplIndex {
    pub fn from_symbols(symbols: Vec<(String, Symbol)>) -> Self {
        Self {
            symbols: symbols.into_iter().collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.symbols.keys().map(String::as_str)
    }
}

/// A strategy that yields declared symbols for a source tree.
pub trait SymbolSource {
    /// Short strategy name for logs.
    fn describe(&self) -> &'static str;

    fn symbols(&self, sources: &Utf8Path) -> anyhow::Result<Vec<(String, Symbol)>>;
}

/// How to run the scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// External AST extractor argv; empty means pattern scan only.
    pub ast_command: Vec<String>,

    /// Working directory for the AST extractor.
    pub ast_workdir: Option<Utf8PathBuf>,

    pub timeout: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            ast_command: vec![],
            ast_workdir: None,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Build the implementation index, degrading from AST tool to pattern scan
/// to an empty index. Never aborts the run.
pub fn build_index(repo_root: &Utf8Path, sources: &Utf8Path, opts: &ScanOptions) -> ImplIndex {
    if !opts.ast_command.is_empty() {
        let extractor = AstExtractor::new(
            opts.ast_command.clone(),
            opts.ast_workdir.clone(),
            opts.timeout,
        );
        match extractor.symbols(sources) {
            Ok(symbols) if !symbols.is_empty() => {
                debug!(count = symbols.len(), "indexed symbols via AST extractor");
                return ImplIndex::from_symbols(symbols);
            }
            Ok(_) => warn!("AST extractor produced no symbols; falling back to pattern scan"),
            Err(e) => warn!("AST extractor failed ({e}); falling back to pattern scan"),
        }
    }

    let fallback = PatternExtractor::new(repo_root.to_path_buf());
    match fallback.symbols(sources) {
        Ok(symbols) => {
            debug!(count = symbols.len(), "indexed symbols via pattern scan");
            ImplIndex::from_symbols(symbols)
        }
        Err(e) => {
            warn!("pattern scan failed ({e}); implementation index is empty");
            ImplIndex::default()
        }
    }
}
