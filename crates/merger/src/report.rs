//! Merge log emission
//!
//! One line per required character: codepoint, printable form, winning
//! source, and the chain of higher-priority sources that were checked and
//! rejected first. The log is a best-effort diagnostic; failing to write it
//! never invalidates the output font.

use std::{
    collections::HashSet,
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use crate::{
    ReportError,
    resolver::{MergeReport, ResolutionDecision},
    types::SourceRank,
};

/// Write the merge log for `report` to `w`.
///
/// `labels` maps rank to a human-readable source identity, in rank order.
pub fn write_log<W: Write>(report: &MergeReport, labels: &[String], w: &mut W) -> io::Result<()> {
    writeln!(w, "# sources (priority order):")?;
    for (rank, label) in labels.iter().enumerate() {
        writeln!(w, "#   {rank}: {label}")?;
    }
    writeln!(w)?;

    for decision in report.decisions() {
        writeln!(w, "{}", format_decision(decision, labels))?;
    }

    writeln!(w)?;
    writeln!(
        w,
        "# {} characters: {} resolved, {} unresolved",
        report.total(),
        report.resolved_count(),
        report.unresolved_count()
    )?;

    let winners: HashSet<usize> = report
        .decisions()
        .iter()
        .filter_map(|d| d.winner.map(SourceRank::as_usize))
        .collect();
    for (rank, label) in labels.iter().enumerate() {
        if !winners.contains(&rank) {
            writeln!(w, "# unused source: {label}")?;
        }
    }

    Ok(())
}

/// Write the merge log to a file, creating or truncating it.
pub fn write_log_file(
    report: &MergeReport,
    labels: &[String],
    path: &Path,
) -> Result<(), ReportError> {
    let log_err = |source| ReportError::Log { path: path.to_path_buf(), source };

    let file = File::create(path).map_err(log_err)?;
    let mut w = BufWriter::new(file);
    write_log(report, labels, &mut w).map_err(log_err)?;
    w.flush().map_err(log_err)
}

fn format_decision(decision: &ResolutionDecision, labels: &[String]) -> String {
    let cp = decision.codepoint;
    let printable = match cp.to_char() {
        Some(ch) if !ch.is_control() => format!("'{ch}'"),
        _ => "(unprintable)".to_string(),
    };

    let rejected = format_ranks(&decision.rejected, labels);

    match decision.winner {
        Some(rank) => {
            let winner = label_for(rank, labels);
            if decision.rejected.is_empty() {
                format!("{cp} {printable} <- {winner}")
            } else {
                format!("{cp} {printable} <- {winner} (rejected: {rejected})")
            }
        }
        None => format!("{cp} {printable} UNRESOLVED (rejected: {rejected})"),
    }
}

fn format_ranks(ranks: &[SourceRank], labels: &[String]) -> String {
    ranks
        .iter()
        .map(|&rank| label_for(rank, labels))
        .collect::<Vec<_>>()
        .join(", ")
}

fn label_for(rank: SourceRank, labels: &[String]) -> String {
    labels
        .get(rank.as_usize())
        .cloned()
        .unwrap_or_else(|| rank.to_string())
}
