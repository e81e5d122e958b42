use crate::scheduler::{Outcome, ScheduleResult};
use std::fmt::Write as _;

/// Permet de customiser le rendu du compte rendu (texte, e-mail, etc.).
pub trait ReportRenderer {
    fn render(&self, result: &ScheduleResult) -> String;
}

/// Compte rendu texte : statut, relaxation, capacité, violations, effectifs, pistes.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextReport;

impl ReportRenderer for TextReport {
    fn render(&self, result: &ScheduleResult) -> String {
        let mut out = String::new();
        match &result.outcome {
            Outcome::Solved(s) => {
                let _ = writeln!(out, "Schedule found ({} entries).", s.schedule.len());
                let _ = writeln!(out, "Relaxed rules: {}\n", s.relaxation);
                let _ = writeln!(out, "{}", result.capacity);
                let _ = writeln!(out, "Weekend constraint violations:");
                if s.violations.is_empty() {
                    let _ = writeln!(out, "None");
                }
                for v in &s.violations {
                    let _ = writeln!(out, "{v}");
                }
                let _ = write!(out, "\n{}", s.staffing);
            }
            Outcome::Exhausted(e) => {
                let _ = writeln!(
                    out,
                    "Failed to find a feasible schedule after {} attempt(s).\n",
                    result.attempts.len()
                );
                let _ = writeln!(out, "{}", result.capacity);
                let _ = writeln!(out, "Possible fixes:");
                for (i, hint) in e.hints.iter().enumerate() {
                    let _ = writeln!(out, "{}. {hint}", i + 1);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{AreaCapacity, CapacityReport, Exhausted};

    #[test]
    fn exhausted_report_lists_numbered_hints() {
        let result = ScheduleResult {
            capacity: CapacityReport {
                areas: vec![AreaCapacity::new("Bar", 20, 15)],
                slot_gaps: Vec::new(),
            },
            outcome: Outcome::Exhausted(Exhausted {
                hints: vec!["first".into(), "second".into()],
                cancelled: false,
            }),
            attempts: Vec::new(),
        };
        let text = TextReport.render(&result);
        assert!(text.starts_with("Failed to find a feasible schedule after 0 attempt(s)."));
        assert!(text.contains("• Bar: short by 5 shift(s)"));
        assert!(text.contains("1. first\n2. second\n"));
    }
}
