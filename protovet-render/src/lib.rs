//! Rendering helpers (colored console text) for human-readable output.
//!
//! The engines return structured results; every ANSI escape in the project
//! originates here. Renderers return plain `String`s so callers decide
//! where output goes.

use owo_colors::OwoColorize;
use protovet_types::issue::{Issue, VerificationStatus};
use protovet_types::report::{CategoryCheck, VerifyOutcome};
use protovet_types::sync::{SyncCategory, SyncOutcome};
use std::fmt::Write;

fn header(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{}", format!("## {title}").cyan());
    let _ = writeln!(out, "{}", "-".repeat(title.len() + 3));
    let _ = writeln!(out);
}

fn ok_line(out: &mut String, msg: &str) {
    let _ = writeln!(out, "{} {msg}", "✓".green());
}

fn missing_line(out: &mut String, msg: &str) {
    let _ = writeln!(out, "{} {msg}", "MISSING:".red());
}

fn warn_line(out: &mut String, msg: &str) {
    let _ = writeln!(out, "{} {msg}", "⚠".yellow());
}

fn dim_line(out: &mut String, msg: &str) {
    let _ = writeln!(out, "{}", msg.dimmed());
}

/// Render the full verification report: per-category detail, deprecated and
/// not-implemented inventory, the summary table, and the pass/fail line.
pub fn render_verify(outcome: &VerifyOutcome) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", "=".repeat(46));
    let _ = writeln!(out, "Protocol Coverage Verification");
    let _ = writeln!(out, "Protocol Version: {}", outcome.protocol_version);
    let _ = writeln!(out, "{}", "=".repeat(46));
    let _ = writeln!(out, "\nIndexed {} implementation symbols", outcome.indexed_symbols);

    header(&mut out, "IMPLEMENTATION FILE VALIDATION");
    for file in &outcome.files.found {
        ok_line(&mut out, file);
    }
    for file in &outcome.files.missing {
        missing_line(&mut out, file);
    }
    if outcome.files.missing.is_empty() {
        ok_line(&mut out, "All referenced implementation files exist");
    }

    header(&mut out, "SPEC → MANIFEST");
    dim_line(&mut out, "(Facts in the spec but not documented in the manifest)");
    let _ = writeln!(out);
    for (label, check) in outcome.spec_manifest.iter() {
        let _ = writeln!(out, "{}", format!("{label}:").cyan());
        for msg in &check.missing {
            missing_line(&mut out, msg);
        }
        for msg in &check.warnings {
            warn_line(&mut out, msg);
        }
        if check.missing.is_empty() {
            ok_line(
                &mut out,
                &format!("All {} documented in manifest", check.found_count()),
            );
        }
        let _ = writeln!(out);
    }

    header(&mut out, "MANIFEST → IMPLEMENTATION");
    for (label, check) in outcome.manifest_impl.iter() {
        let _ = writeln!(out, "{}", format!("{label}:").cyan());
        render_check_lines(&mut out, check);
        let _ = writeln!(out);
    }

    if !outcome.deprecated.is_empty() {
        header(&mut out, "DEPRECATED IN SPEC");
        dim_line(
            &mut out,
            "These types are marked deprecated and filtered from verification:",
        );
        let _ = writeln!(out);
        for entry in &outcome.deprecated {
            let _ = writeln!(out, "  {} {}", "○".dimmed(), entry.name);
            if !entry.replacement.is_empty() {
                dim_line(&mut out, &format!("    Replacement: {}", entry.replacement));
            }
            if !entry.notes.is_empty() {
                dim_line(&mut out, &format!("    {}", entry.notes));
            }
        }
        let _ = writeln!(out);
    }

    header(&mut out, "NOT YET IMPLEMENTED");
    if outcome.not_implemented_files.is_empty() && outcome.not_implemented_types.is_empty() {
        ok_line(&mut out, "All features are implemented!");
    } else {
        if !outcome.not_implemented_files.is_empty() {
            dim_line(&mut out, "Files (planned for future implementation):");
            for file in &outcome.not_implemented_files {
                let _ = writeln!(out, "  {} {file}", "○".dimmed());
            }
            let _ = writeln!(out);
        }
        if !outcome.not_implemented_types.is_empty() {
            dim_line(&mut out, "Types (planned for future implementation):");
            for name in &outcome.not_implemented_types {
                let _ = writeln!(out, "  {} {name}", "○".dimmed());
            }
        }
    }

    render_summary(&mut out, outcome);
    out
}

fn render_check_lines(out: &mut String, check: &CategoryCheck) {
    for msg in &check.found {
        ok_line(out, msg);
    }
    for msg in &check.missing {
        missing_line(out, msg);
    }
    for msg in &check.warnings {
        warn_line(out, msg);
    }
    for msg in &check.info {
        dim_line(out, msg);
    }
}

fn render_summary(out: &mut String, outcome: &VerifyOutcome) {
    let _ = writeln!(out, "\n{}", "=".repeat(50));
    let _ = writeln!(out, "SUMMARY");
    let _ = writeln!(out, "{}", "=".repeat(50));

    let _ = writeln!(out, "\n{:<36} {:>6}", "Spec → Manifest", "Gaps");
    for (label, check) in outcome.spec_manifest.iter() {
        let _ = writeln!(out, "  {:<34} {:>6}", label, check.missing_count());
    }

    let _ = writeln!(
        out,
        "\n{:<28} {:>8} {:>7}",
        "Manifest → Implementation", "Found", "Missing"
    );
    for (label, check) in outcome.manifest_impl.iter() {
        let _ = writeln!(
            out,
            "  {:<26} {:>8} {:>7}",
            label,
            check.found_count(),
            check.missing_count()
        );
    }

    let _ = writeln!(out, "\nOther");
    if outcome.files.missing.is_empty() {
        let _ = writeln!(out, "  {:<26} all exist", "Implementation files");
    } else {
        let _ = writeln!(
            out,
            "  {:<26} {} missing",
            "Implementation files",
            outcome.files.missing.len()
        );
    }
    let _ = writeln!(
        out,
        "  {:<26} {} files, {} types",
        "Not yet implemented",
        outcome.not_implemented_files.len(),
        outcome.not_implemented_types.len()
    );
    let _ = writeln!(
        out,
        "  {:<26} {} (skipped)",
        "Builtin types", outcome.builtin_count
    );

    let _ = writeln!(out, "\n{}", "-".repeat(50));
    let total = outcome.gap_total();
    if total == 0 {
        let _ = writeln!(out, "{}", "✓ All verifications passed".green());
    } else {
        let gaps_word = if total == 1 { "gap" } else { "gaps" };
        let _ = writeln!(
            out,
            "{}",
            format!("✗ {total} {gaps_word} requiring attention").red()
        );
    }
}

/// Render sync results: per-category additions, warnings, the diff (dry
/// runs only), and the closing total.
pub fn render_sync(outcome: &SyncOutcome, dry_run: bool) -> String {
    let mut out = String::new();

    if dry_run {
        let _ = writeln!(out, "Dry run - showing changes:\n");
    }

    for category in SyncCategory::ALL {
        let changes: Vec<&str> = outcome
            .changes
            .iter()
            .filter(|c| c.category == category)
            .map(|c| c.detail.as_str())
            .collect();
        if changes.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{}", format!("{}:", category.label()).cyan());
        for detail in changes {
            let _ = writeln!(out, "  + {detail}");
        }
        let _ = writeln!(out);
    }

    for warning in &outcome.warnings {
        warn_line(&mut out, &warning.detail);
    }

    if dry_run {
        if let Some(diff) = &outcome.diff {
            let _ = writeln!(out, "\n{diff}");
        }
    }

    let total = outcome.total();
    if total == 0 {
        let _ = writeln!(out, "{}", "✓ Manifest is in sync with spec".green());
    } else if dry_run {
        let _ = writeln!(out, "Would make {total} total changes:");
        render_change_breakdown(&mut out, outcome);
    } else {
        let _ = writeln!(out, "{}", format!("✓ Made {total} changes to manifest").green());
        render_change_breakdown(&mut out, outcome);
    }

    out
}

fn render_change_breakdown(out: &mut String, outcome: &SyncOutcome) {
    let _ = writeln!(
        out,
        "  {} types, {} methods, {} notifications",
        outcome.count_for(SyncCategory::Types),
        outcome.count_for(SyncCategory::Methods),
        outcome.count_for(SyncCategory::Notifications),
    );
    let _ = writeln!(
        out,
        "  {} enums, {} error codes, {} capabilities, {} deprecated",
        outcome.count_for(SyncCategory::Enums),
        outcome.count_for(SyncCategory::ErrorCodes),
        outcome.count_for(SyncCategory::Capabilities),
        outcome.count_for(SyncCategory::Deprecated),
    );
}

/// Render the issue listing, grouped by severity, fixes last.
pub fn render_issues(issues: &[Issue]) -> String {
    let mut out = String::new();

    if issues.is_empty() {
        let _ = writeln!(out, "No issues found.");
        return out;
    }

    let order = [
        VerificationStatus::Critical,
        VerificationStatus::Warning,
        VerificationStatus::Info,
        VerificationStatus::Fixed,
    ];

    let counts: Vec<String> = order
        .iter()
        .filter_map(|status| {
            let count = issues.iter().filter(|i| i.status == *status).count();
            (count > 0).then(|| format!("{count} {status}"))
        })
        .collect();
    let _ = writeln!(out, "Found {} items ({})\n", issues.len(), counts.join(", "));

    for status in order {
        for issue in issues.iter().filter(|i| i.status == status) {
            let icon = match status {
                VerificationStatus::Critical => format!("{}", "✖".red()),
                VerificationStatus::Warning => format!("{}", "⚠".yellow()),
                VerificationStatus::Info => format!("{}", "ℹ".cyan()),
                VerificationStatus::Fixed => format!("{}", "✓".green()),
                VerificationStatus::Pending => "?".to_string(),
            };
            let _ = writeln!(
                out,
                "{icon} [{}] {}",
                status.as_str().to_uppercase(),
                issue.location
            );
            for line in issue.notes.lines() {
                let _ = writeln!(out, "  {line}");
            }
            let _ = writeln!(out);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use protovet_types::sync::{SyncChange, SyncWarning};

    fn sample_outcome() -> VerifyOutcome {
        let mut outcome = VerifyOutcome {
            protocol_version: "2025-11-25".to_string(),
            indexed_symbols: 42,
            ..VerifyOutcome::default()
        };
        outcome.files.ok("Sources/Server/Resources.swift");
        outcome.spec_manifest.types.gap("Foo");
        outcome.manifest_impl.types.ok("Resource → Resource");
        outcome.manifest_impl.enums.warn("Role: extra cases [\"admin\"]");
        outcome.manifest_impl.error_codes.note("REQUEST_TIMEOUT (-32001): serverError(code:message:)");
        outcome
    }

    #[test]
    fn verify_report_contains_sections_and_verdict() {
        let rendered = render_verify(&sample_outcome());
        assert!(rendered.contains("IMPLEMENTATION FILE VALIDATION"));
        assert!(rendered.contains("SPEC → MANIFEST"));
        assert!(rendered.contains("MANIFEST → IMPLEMENTATION"));
        assert!(rendered.contains("SUMMARY"));
        assert!(rendered.contains("Foo"));
        assert!(rendered.contains("1 gap requiring attention"));
    }

    #[test]
    fn verify_report_passes_with_no_gaps() {
        let mut outcome = sample_outcome();
        outcome.spec_manifest.types.missing.clear();
        let rendered = render_verify(&outcome);
        assert!(rendered.contains("All verifications passed"));
        // Warnings stay visible even on a pass.
        assert!(rendered.contains("extra cases"));
    }

    #[test]
    fn sync_render_lists_changes_and_totals() {
        let outcome = SyncOutcome {
            changes: vec![
                SyncChange {
                    category: SyncCategory::Types,
                    detail: "Foo → Foo (exact name)".to_string(),
                },
                SyncChange {
                    category: SyncCategory::ErrorCodes,
                    detail: "PARSE_ERROR (-32700): new error code".to_string(),
                },
            ],
            warnings: vec![SyncWarning {
                category: SyncCategory::Types,
                detail: "Bar: ambiguous implementation candidates".to_string(),
            }],
            diff: Some("+++ modified\n+[types.Foo]".to_string()),
        };

        let dry = render_sync(&outcome, true);
        assert!(dry.contains("Dry run"));
        assert!(dry.contains("+ Foo → Foo (exact name)"));
        assert!(dry.contains("Would make 2 total changes"));
        assert!(dry.contains("+[types.Foo]"));
        assert!(dry.contains("ambiguous"));

        let applied = render_sync(&outcome, false);
        assert!(applied.contains("Made 2 changes to manifest"));
        assert!(!applied.contains("+[types.Foo]"));
    }

    #[test]
    fn sync_render_reports_in_sync_when_empty() {
        let rendered = render_sync(&SyncOutcome::default(), false);
        assert!(rendered.contains("in sync with spec"));
    }

    #[test]
    fn issues_render_groups_by_severity() {
        let issues = vec![
            Issue {
                location: "tools > callTool".to_string(),
                status: VerificationStatus::Warning,
                notes: "check errors\nsecond line".to_string(),
                module_id: "tools".to_string(),
            },
            Issue {
                location: "type: Resource".to_string(),
                status: VerificationStatus::Critical,
                notes: String::new(),
                module_id: "types".to_string(),
            },
        ];
        let rendered = render_issues(&issues);
        assert!(rendered.contains("Found 2 items (1 critical, 1 warning)"));
        // Critical is listed before warning.
        let critical_pos = rendered.find("type: Resource").unwrap();
        let warning_pos = rendered.find("tools > callTool").unwrap();
        assert!(critical_pos < warning_pos);
        assert!(rendered.contains("  second line"));
    }

    #[test]
    fn empty_issue_list_says_so() {
        assert!(render_issues(&[]).contains("No issues found."));
    }
}
