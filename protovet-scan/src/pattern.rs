//! Regex fallback for symbol extraction.
//!
//! Scans `*.swift` sources for top-level declaration keywords, skipping
//! `.build` trees, private/fileprivate declarations, and anything inside
//! comments. Less precise than the AST extractor but needs no toolchain.

use crate::{Symbol, SymbolSource};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use glob::glob;
use regex::Regex;
use std::sync::LazyLock;

static DECL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?P<modifier>public|open|internal|private|fileprivate)\s+)?(?P<kind>struct|class|enum|protocol|typealias|actor)\s+(?P<name>[A-Z][A-Za-z0-9_]*)",
    )
    .expect("static regex")
});

pub struct PatternExtractor {
    repo_root: Utf8PathBuf,
}

impl PatternExtractor {
    pub fn new(repo_root: Utf8PathBuf) -> Self {
        Self { repo_root }
    }
}

impl SymbolSource for PatternExtractor {
    fn describe(&self) -> &'static str {
        "pattern"
    }

    fn symbols(&self, sources: &Utf8Path) -> anyhow::Result<Vec<(String, Symbol)>> {
        let pattern = sources.join("**").join("*.swift");
        let mut out = Vec::new();

        for entry in glob(pattern.as_str()).context("glob source tree")? {
            let path = match entry {
                Ok(p) => p,
                Err(_) => continue,
            };
            let Some(path) = Utf8PathBuf::from_path_buf(path).ok() else {
                continue;
            };
            if path.as_str().contains(".build") {
                continue;
            }
            let Ok(contents) = fs::read_to_string(&path) else {
                continue;
            };

            let file = path
                .strip_prefix(&self.repo_root)
                .map(|p| p.to_string())
                .unwrap_or_else(|_| path.to_string());

            for (line_no, line) in comment_free_lines(&contents) {
                let Some(caps) = DECL_RE.captures(&line) else {
                    continue;
                };
                if matches!(
                    caps.name("modifier").map(|m| m.as_str()),
                    Some("private" | "fileprivate")
                ) {
                    continue;
                }
                out.push((
                    caps["name"].to_string(),
                    Symbol {
                        kind: caps["kind"].to_string(),
                        file: file.clone(),
                        line: Some(line_no as u64),
                    },
                ));
            }
        }

        Ok(out)
    }
}

/// Source lines with `//` and `/* ... */` comments removed, keeping
/// 1-based line numbers aligned with the original text.
pub(crate) fn comment_free_lines(source: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut in_block = false;

    for (idx, raw) in source.lines().enumerate() {
        let mut kept = String::new();
        let mut rest = raw;

        while !rest.is_empty() {
            if in_block {
                match rest.find("*/") {
                    Some(end) => {
                        rest = &rest[end + 2..];
                        in_block = false;
                    }
                    None => {
                        rest = "";
                    }
                }
                continue;
            }

            match (rest.find("//"), rest.find("/*")) {
                (Some(line_start), block_start)
                    if block_start.is_none_or(|b| line_start < b) =>
                {
                    kept.push_str(&rest[..line_start]);
                    rest = "";
                }
                (_, Some(block_start)) => {
                    kept.push_str(&rest[..block_start]);
                    rest = &rest[block_start + 2..];
                    in_block = true;
                }
                (None, None) => {
                    kept.push_str(rest);
                    rest = "";
                }
                (Some(line_start), None) => {
                    kept.push_str(&rest[..line_start]);
                    rest = "";
                }
            }
        }

        out.push((idx + 1, kept));
    }

    out
}
