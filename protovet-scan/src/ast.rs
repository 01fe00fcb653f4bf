//! External AST-based symbol extraction.
//!
//! The extractor is any command that prints one `name:kind:file:line` line
//! per declared symbol. Output is read tolerantly: malformed lines, enum
//! `case` symbols, and `.CodingKeys` helper types contribute nothing.

use crate::{Symbol, SymbolSource};
use anyhow::{Context, bail};
use camino::{Utf8Path, Utf8PathBuf};
use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::debug;

pub struct AstExtractor {
    command: Vec<String>,
    workdir: Option<Utf8PathBuf>,
    timeout: Duration,
}

impl AstExtractor {
    pub fn new(command: Vec<String>, workdir: Option<Utf8PathBuf>, timeout: Duration) -> Self {
        Self {
            command,
            workdir,
            timeout,
        }
    }
}

impl SymbolSource for AstExtractor {
    fn describe(&self) -> &'static str {
        "ast"
    }

    fn symbols(&self, sources: &Utf8Path) -> anyhow::Result<Vec<(String, Symbol)>> {
        let Some((program, args)) = self.command.split_first() else {
            bail!("no AST extractor command configured");
        };

        let mut cmd = Command::new(program);
        cmd.args(args)
            .arg(sources.as_str())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .stdin(Stdio::null());
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }

        debug!(command = ?self.command, sources = %sources, "running AST extractor");
        let mut child = cmd.spawn().with_context(|| format!("spawn {program}"))?;

        // Drain stdout on a separate thread so a chatty extractor cannot
        // fill the pipe and deadlock against our wait loop.
        let mut stdout = child.stdout.take().context("capture extractor stdout")?;
        let reader = std::thread::spawn(move || -> std::io::Result<String> {
            let mut buf = String::new();
            stdout.read_to_string(&mut buf)?;
            Ok(buf)
        });

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait().context("wait for extractor")? {
                break status;
            }
            if started.elapsed() > self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                bail!("AST extractor timed out after {:?}", self.timeout);
            }
            std::thread::sleep(Duration::from_millis(50));
        };

        let output = reader
            .join()
            .map_err(|_| anyhow::anyhow!("extractor reader thread panicked"))?
            .context("read extractor output")?;

        if !status.success() {
            bail!("AST extractor exited with {status}");
        }

        Ok(parse_symbol_lines(&output))
    }
}

/// Parse `name:kind:file:line` lines, skipping anything that does not fit.
pub fn parse_symbol_lines(output: &str) -> Vec<(String, Symbol)> {
    let mut out = Vec::new();
    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() < 4 {
            continue;
        }
        let (name, kind, file, line_no) = (parts[0], parts[1], parts[2], parts[3]);

        // Enum cases and nested coding-key helpers are not index material.
        if kind == "case" || name.contains(".CodingKeys") {
            continue;
        }

        out.push((
            name.to_string(),
            Symbol {
                kind: kind.to_string(),
                file: file.to_string(),
                line: line_no.parse().ok(),
            },
        ));
    }
    out
}
