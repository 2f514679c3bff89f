//! Glyph resolution
//!
//! For each required character the sources are scanned in ascending rank
//! order and the first one that covers it wins. Ranks are unique per source,
//! so the scan is a total order with no ties. Everything the resolver learns
//! goes into the returned [`MergeReport`]; there is no side channel, which
//! keeps the decisions inspectable in tests.

use std::collections::HashSet;

use log::{info, warn};

use crate::{
    charset::CharacterSet,
    source::SourceRegistry,
    types::{Codepoint, SourceRank},
};

/// The outcome for one required character
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionDecision {
    pub codepoint: Codepoint,
    /// The winning source, or `None` when no source covers the character
    pub winner: Option<SourceRank>,
    /// Sources checked and rejected before the winner (all of them when
    /// unresolved), in the order they were checked
    pub rejected: Vec<SourceRank>,
}

impl ResolutionDecision {
    pub fn is_resolved(&self) -> bool {
        self.winner.is_some()
    }
}

/// The ordered decision trace for a whole merge run
#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    decisions: Vec<ResolutionDecision>,
    resolved: usize,
}

impl MergeReport {
    /// Build a report from an existing decision list.
    pub fn from_decisions(decisions: Vec<ResolutionDecision>) -> Self {
        let resolved = decisions.iter().filter(|d| d.is_resolved()).count();
        Self { decisions, resolved }
    }

    /// Decisions in character-set order, exactly one per required character
    pub fn decisions(&self) -> &[ResolutionDecision] {
        &self.decisions
    }

    /// Decisions that found a glyph, in character-set order
    pub fn resolved(&self) -> impl Iterator<Item = &ResolutionDecision> {
        self.decisions.iter().filter(|d| d.is_resolved())
    }

    /// Characters no source could supply, in character-set order
    pub fn unresolved(&self) -> impl Iterator<Item = &ResolutionDecision> {
        self.decisions.iter().filter(|d| !d.is_resolved())
    }

    pub fn resolved_count(&self) -> usize {
        self.resolved
    }

    pub fn unresolved_count(&self) -> usize {
        self.decisions.len() - self.resolved
    }

    pub fn total(&self) -> usize {
        self.decisions.len()
    }

    /// Ranks of sources that never won a character.
    ///
    /// Not an error: an unused source is simply never selected, but the
    /// operator should know it contributed nothing.
    pub fn unused_sources(&self, registry: &SourceRegistry) -> Vec<SourceRank> {
        let winners: HashSet<SourceRank> =
            self.decisions.iter().filter_map(|d| d.winner).collect();
        registry
            .iter()
            .map(|s| s.rank())
            .filter(|rank| !winners.contains(rank))
            .collect()
    }
}

/// Resolve every character in `chars` against `registry`.
///
/// Unresolved characters are recorded, not fatal; the caller decides whether
/// a non-zero unresolved count is acceptable.
pub fn resolve(chars: &CharacterSet, registry: &SourceRegistry) -> MergeReport {
    let mut decisions = Vec::with_capacity(chars.len());
    let mut resolved = 0usize;

    for cp in chars.codepoints() {
        let mut rejected = Vec::new();
        let mut winner = None;

        for source in registry.iter() {
            if source.has(cp) {
                winner = Some(source.rank());
                break;
            }
            rejected.push(source.rank());
        }

        if winner.is_some() {
            resolved += 1;
        } else {
            warn!("no source covers {cp}");
        }

        decisions.push(ResolutionDecision { codepoint: cp, winner, rejected });
    }

    let report = MergeReport { decisions, resolved };
    info!(
        "resolved {} of {} characters ({} unresolved)",
        report.resolved_count(),
        report.total(),
        report.unresolved_count()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision(cp: char, winner: Option<usize>, rejected: &[usize]) -> ResolutionDecision {
        ResolutionDecision {
            codepoint: Codepoint::from(cp),
            winner: winner.map(SourceRank::new),
            rejected: rejected.iter().copied().map(SourceRank::new).collect(),
        }
    }

    #[test]
    fn test_report_counts() {
        let report = MergeReport {
            decisions: vec![
                decision('a', Some(0), &[]),
                decision('b', Some(1), &[0]),
                decision('c', None, &[0, 1]),
            ],
            resolved: 2,
        };

        assert_eq!(report.resolved_count(), 2);
        assert_eq!(report.unresolved_count(), 1);
        assert_eq!(report.resolved_count() + report.unresolved_count(), report.total());
        assert_eq!(report.resolved().count(), 2);
        assert_eq!(report.unresolved().next().unwrap().codepoint, Codepoint::from('c'));
    }
}
