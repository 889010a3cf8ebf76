use serde::Serialize;

use hafalan_core::ledger::{LedgerAudit, Recovery};
use hafalan_core::roster::LoadReport;
use hafalan_core::StudentId;

use crate::app::AppContext;
use crate::cli::CheckArgs;
use crate::errors::CliError;
use crate::ui::{badge, header, print, receipt, table, Badge, Column};

#[derive(Debug, Serialize)]
struct Finding {
    kind: &'static str,
    student_id: Option<StudentId>,
    detail: String,
}

fn describe_audit(audit: &LedgerAudit) -> String {
    let mut parts = Vec::new();
    if !audit.missing.is_empty() {
        parts.push(format!("missing {}", audit.missing.join(", ")));
    }
    for mismatch in &audit.wrong_length {
        parts.push(format!(
            "{} has {} verses, expected {}",
            mismatch.chapter, mismatch.actual, mismatch.expected
        ));
    }
    if !audit.unknown.is_empty() {
        parts.push(format!("unknown {}", audit.unknown.join(", ")));
    }
    parts.join("; ")
}

fn collect_findings(report: &LoadReport, audits: &[(StudentId, LedgerAudit)]) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (id, recovery) in &report.recovered {
        match recovery {
            Recovery::Clean => {}
            Recovery::Repaired(audit) => findings.push(Finding {
                kind: "ledger_repaired",
                student_id: Some(id.clone()),
                detail: describe_audit(audit),
            }),
            Recovery::Regenerated(reason) => findings.push(Finding {
                kind: "ledger_regenerated",
                student_id: Some(id.clone()),
                detail: reason.clone(),
            }),
        }
    }
    for (id, audit) in audits {
        findings.push(Finding {
            kind: "ledger_malformed",
            student_id: Some(id.clone()),
            detail: describe_audit(audit),
        });
    }
    for id in &report.stale_totals {
        findings.push(Finding {
            kind: "stale_total",
            student_id: Some(id.clone()),
            detail: "stored total did not match the ledger".to_string(),
        });
    }
    for id in &report.bad_timestamps {
        findings.push(Finding {
            kind: "bad_timestamp",
            student_id: Some(id.clone()),
            detail: "last modified time could not be parsed".to_string(),
        });
    }
    for id in &report.duplicate_rows {
        findings.push(Finding {
            kind: "duplicate_row",
            student_id: Some(id.clone()),
            detail: "later row with the same id was dropped".to_string(),
        });
    }
    if report.dropped_log_rows > 0 {
        findings.push(Finding {
            kind: "dropped_log_rows",
            student_id: None,
            detail: format!("{} unreadable log row(s)", report.dropped_log_rows),
        });
    }
    findings
}

/// Audit every stored ledger. Loading already repairs in memory, so the
/// findings describe what the store on disk still holds.
pub fn handle_check(ctx: &AppContext, args: &CheckArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(&args.output)?;
    let mut session = ctx.open_session()?;
    let audits = session.roster.audit_all();
    let findings = collect_findings(&session.report, &audits);

    let repaired = args.repair && !findings.is_empty();
    if repaired {
        let fixed = session.roster.repair_all();
        tracing::info!(students = fixed.len(), "repaired ledgers");
        session.save()?;
    }

    if ui.mode.is_json() {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "ok": findings.is_empty() || repaired,
                "repaired": repaired,
                "findings": findings,
            }))?
        );
    } else {
        print(&ui, &header(&ui, "check", Some(&session.roster.len().to_string())));
        if findings.is_empty() {
            print(&ui, &badge(&ui, Badge::Ok, "All ledgers match the curriculum"));
            return Ok(());
        }
        let columns = [
            Column::new("Problem"),
            Column::new("Student"),
            Column::new("Detail"),
        ];
        let rows: Vec<Vec<String>> = findings
            .iter()
            .map(|f| {
                vec![
                    f.kind.to_string(),
                    f.student_id
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_else(|| "-".to_string()),
                    f.detail.clone(),
                ]
            })
            .collect();
        println!("{}", table(&ui, &columns, &rows));
        if repaired {
            print(
                &ui,
                &receipt(
                    &ui,
                    "Store repaired",
                    &[
                        ("Problems fixed", findings.len().to_string()),
                        ("Store", session.store.describe()),
                    ],
                ),
            );
        }
    }

    if findings.is_empty() || repaired {
        return Ok(());
    }
    Err(CliError::integrity_failed(
        format!("{} problem(s) found", findings.len()),
        "Run `hafalan check --repair` to save the repaired ledgers.",
    )
    .into())
}
