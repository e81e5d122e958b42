use super::problem::Problem;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Besoin vs capacité d'une zone sur tout l'horizon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaCapacity {
    pub area: String,
    pub required: u32,
    pub available: u32,
    pub shortfall: u32,
}

impl AreaCapacity {
    pub fn new<S: Into<String>>(area: S, required: u32, available: u32) -> Self {
        Self {
            area: area.into(),
            required,
            available,
            shortfall: required.saturating_sub(available),
        }
    }
}

/// Créneau dont le besoin dépasse le nombre de personnes mobilisables ce jour-là.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotGap {
    pub date: NaiveDate,
    pub area: String,
    pub shift: String,
    pub required: u32,
    pub available_workers: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityReport {
    pub areas: Vec<AreaCapacity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slot_gaps: Vec<SlotGap>,
}

impl CapacityReport {
    pub fn area(&self, name: &str) -> Option<&AreaCapacity> {
        self.areas.iter().find(|a| a.area == name)
    }

    pub fn under_capacity(&self) -> impl Iterator<Item = &AreaCapacity> {
        self.areas.iter().filter(|a| a.shortfall > 0)
    }
}

impl fmt::Display for CapacityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Capacity Report:")?;
        for a in &self.areas {
            writeln!(
                f,
                "- {}: {} shifts required, {} max shifts available",
                a.area, a.required, a.available
            )?;
        }
        if self.under_capacity().next().is_some() {
            writeln!(f, "\nUnder-capacity areas:")?;
            for a in self.under_capacity() {
                writeln!(f, "  • {}: short by {} shift(s)", a.area, a.shortfall)?;
            }
        }
        if !self.slot_gaps.is_empty() {
            writeln!(f, "\nUncoverable slots:")?;
            for g in &self.slot_gaps {
                writeln!(
                    f,
                    "  • {} {} {}: {} required, {} available",
                    g.date, g.area, g.shift, g.required, g.available_workers
                )?;
            }
        }
        Ok(())
    }
}

pub(super) fn analyze(problem: &Problem<'_>) -> CapacityReport {
    let weeks = problem.weeks() as u32;
    let horizon = problem.dates.len() as u32;
    let per_day = problem.options.max_shifts_per_day;

    let areas = problem
        .areas()
        .map(|a| {
            let required = problem
                .days()
                .flat_map(|d| problem.shifts().map(move |s| (d, s)))
                .map(|(d, s)| problem.required(d, a, s))
                .fold(0u32, u32::saturating_add);
            let available = problem
                .workers()
                .filter(|(w, _)| problem.is_eligible(*w, a))
                .map(|(_, worker)| match worker.max_shifts_per_week {
                    Some(max) => max.saturating_mul(weeks),
                    None => per_day.saturating_mul(horizon),
                })
                .fold(0u32, u32::saturating_add);
            AreaCapacity::new(problem.area_name(a), required, available)
        })
        .collect();

    let mut slot_gaps = Vec::new();
    for d in problem.days() {
        for a in problem.areas() {
            let free = problem
                .workers()
                .filter(|(w, _)| problem.is_eligible(*w, a) && !problem.is_off(*w, d))
                .count() as u32;
            for s in problem.shifts() {
                let required = problem.required(d, a, s);
                if required > free {
                    slot_gaps.push(SlotGap {
                        date: problem.date(d),
                        area: problem.area_name(a).to_string(),
                        shift: problem.shift_name(s).to_string(),
                        required,
                        available_workers: free,
                    });
                }
            }
        }
    }

    CapacityReport { areas, slot_gaps }
}
