use super::types::{Schedule, WeekendViolation, WeekendWindow};
use crate::model::Worker;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Recompte, à partir du planning final, les jours travaillés par fenêtre de week-end.
///
/// Indépendant de la configuration de relaxation retenue : un jour compte une seule fois,
/// même si la personne y a plusieurs shifts.
pub fn detect_weekend_violations(
    schedule: &Schedule,
    windows: &[WeekendWindow],
    workers: &[Worker],
) -> Vec<WeekendViolation> {
    let mut out = Vec::new();

    for worker in workers {
        let worked: BTreeSet<_> = schedule
            .entries()
            .filter(|e| e.worker == worker.id)
            .map(|e| e.date)
            .collect();

        for window in windows.iter().filter(|w| w.start <= w.end) {
            let days = worked.range(window.start..=window.end).count() as u32;
            if days > worker.max_weekend_days {
                out.push(WeekendViolation {
                    worker: worker.id.clone(),
                    days_worked: days,
                    limit: worker.max_weekend_days,
                    window: *window,
                });
            }
        }
    }

    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaStaffing {
    pub area: String,
    pub current_workers: u32,
    pub required_workers: u32,
}

/// Effectif actuel vs effectif nécessaire pour éviter les dépassements constatés.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffingSummary {
    pub areas: Vec<AreaStaffing>,
}

impl StaffingSummary {
    /// Chaque jour de dépassement est imputé à la première zone de la personne.
    pub fn from_violations(
        areas: &[String],
        workers: &[Worker],
        violations: &[WeekendViolation],
    ) -> Self {
        let mut rows: Vec<AreaStaffing> = areas
            .iter()
            .map(|a| {
                let current = workers.iter().filter(|w| w.is_eligible(a)).count() as u32;
                AreaStaffing {
                    area: a.clone(),
                    current_workers: current,
                    required_workers: current,
                }
            })
            .collect();

        for v in violations {
            let excess = v.days_worked.saturating_sub(v.limit);
            let home = workers
                .iter()
                .find(|w| w.id == v.worker)
                .and_then(|w| w.areas.iter().find(|a| areas.contains(a)));
            if let Some(row) = home.and_then(|a| rows.iter_mut().find(|r| &r.area == a)) {
                row.required_workers += excess;
            }
        }

        Self { areas: rows }
    }
}

impl fmt::Display for StaffingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Employee Summary (Current vs Required):")?;
        for a in &self.areas {
            writeln!(
                f,
                "- {}: {} current employees, {} employees required to avoid weekend violations",
                a.area, a.current_workers, a.required_workers
            )?;
        }
        Ok(())
    }
}
