mod builder;
mod calendar;
mod capacity;
mod extract;
mod problem;
mod relax;
mod types;
mod violations;

pub use builder::{AssignmentVar, ScheduleModel};
pub use calendar::weekend_windows;
pub use capacity::{AreaCapacity, CapacityReport, SlotGap};
pub use problem::{AreaIdx, DayIdx, ShiftIdx, WorkerIdx};
pub use relax::relaxation_sequence;
pub use types::{
    AreaSchedule, Attempt, AttemptStatus, EngineOptions, ObjectiveWeights, PartialWindows,
    RelaxationConfig, RelaxationSlack, SchedError, Schedule, ScheduleEntry, WeekendPolicy,
    WeekendViolation, WeekendWindow,
};
pub use violations::{detect_weekend_violations, AreaStaffing, StaffingSummary};

use crate::milp::{GoodLpSolver, MilpSolver};
use crate::model::{ScheduleInput, SoftRule};
use problem::Problem;
use relax::SearchOutcome;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Planning trouvé.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solved {
    /// Règles relâchées pour y parvenir ("none" si aucune).
    pub relaxation: String,
    pub schedule: Schedule,
    pub violations: Vec<WeekendViolation>,
    pub staffing: StaffingSummary,
}

/// Toutes les configurations ont échoué.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exhausted {
    pub hints: Vec<String>,
    /// Arrêt sur l'échéance globale de l'appelant.
    pub cancelled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Solved(Solved),
    Exhausted(Exhausted),
}

/// Réponse complète ; le rapport de capacité est toujours présent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub capacity: CapacityReport,
    pub outcome: Outcome,
    pub attempts: Vec<Attempt>,
}

impl ScheduleResult {
    pub fn is_solved(&self) -> bool {
        matches!(self.outcome, Outcome::Solved(_))
    }

    pub fn solved(&self) -> Option<&Solved> {
        match &self.outcome {
            Outcome::Solved(s) => Some(s),
            Outcome::Exhausted(_) => None,
        }
    }

    pub fn relaxation(&self) -> Option<&str> {
        self.solved().map(|s| s.relaxation.as_str())
    }

    pub fn violation_messages(&self) -> Vec<String> {
        self.solved()
            .map(|s| s.violations.iter().map(ToString::to_string).collect())
            .unwrap_or_default()
    }

    /// Pour les appelants qui préfèrent `?` : l'épuisement devient une erreur.
    pub fn into_solved(self) -> Result<Solved, SchedError> {
        match self.outcome {
            Outcome::Solved(s) => Ok(s),
            Outcome::Exhausted(_) => Err(SchedError::Infeasible {
                attempts: self.attempts.len(),
            }),
        }
    }
}

/// Scheduler : compose analyse de capacité, recherche par relaxation, extraction et
/// vérification des week-ends.
pub struct Scheduler {
    options: EngineOptions,
    solver: Box<dyn MilpSolver>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            solver: Box::new(GoodLpSolver::new()),
        }
    }

    pub fn with_solver<S: MilpSolver + 'static>(mut self, solver: S) -> Self {
        self.solver = Box::new(solver);
        self
    }

    /// Rapport de capacité seul (aucune résolution).
    pub fn capacity(&self, input: &ScheduleInput) -> Result<CapacityReport, SchedError> {
        let problem = Problem::new(input, self.options)?;
        Ok(capacity::analyze(&problem))
    }

    /// Fenêtres de week-end de l'horizon selon la politique configurée (entrée validée).
    pub fn weekend_windows(
        &self,
        input: &ScheduleInput,
    ) -> Result<Vec<WeekendWindow>, SchedError> {
        Ok(Problem::new(input, self.options)?.windows)
    }

    pub fn run(
        &self,
        input: &ScheduleInput,
        order: &[SoftRule],
    ) -> Result<ScheduleResult, SchedError> {
        let started = Instant::now();
        let problem = Problem::new(input, self.options)?;

        let capacity = capacity::analyze(&problem);
        tracing::info!(
            workers = input.workers.len(),
            days = problem.dates.len(),
            under_capacity = capacity.under_capacity().count(),
            "capacity checked"
        );

        match relax::search(&problem, order, self.solver.as_ref(), started)? {
            SearchOutcome::Solved {
                model,
                values,
                attempts,
            } => {
                let schedule = extract::extract(&problem, &model, &values);
                let violations =
                    detect_weekend_violations(&schedule, &problem.windows, &input.workers);
                let staffing =
                    StaffingSummary::from_violations(&input.areas, &input.workers, &violations);
                let relaxation = model.config.label();
                tracing::info!(
                    relaxation = %relaxation,
                    entries = schedule.len(),
                    violations = violations.len(),
                    "schedule found"
                );
                Ok(ScheduleResult {
                    capacity,
                    outcome: Outcome::Solved(Solved {
                        relaxation,
                        schedule,
                        violations,
                        staffing,
                    }),
                    attempts,
                })
            }
            SearchOutcome::Exhausted {
                attempts,
                cancelled,
            } => {
                let hints = remediation_hints(&capacity, input, order, cancelled, attempts.len());
                tracing::warn!(attempts = attempts.len(), cancelled, "no feasible schedule");
                Ok(ScheduleResult {
                    capacity,
                    outcome: Outcome::Exhausted(Exhausted { hints, cancelled }),
                    attempts,
                })
            }
        }
    }
}

/// Point d'entrée simple : options par défaut, limite de temps par tentative.
///
/// La limite est prise à la milliseconde près ; en dessous d'une milliseconde, l'entrée est
/// rejetée comme toute limite nulle.
pub fn schedule(
    input: &ScheduleInput,
    order: &[SoftRule],
    attempt_time_limit: Duration,
) -> Result<ScheduleResult, SchedError> {
    let options = EngineOptions {
        attempt_time_limit_ms: u64::try_from(attempt_time_limit.as_millis()).unwrap_or(u64::MAX),
        ..EngineOptions::default()
    };
    Scheduler::new(options).run(input, order)
}

fn remediation_hints(
    capacity: &CapacityReport,
    input: &ScheduleInput,
    order: &[SoftRule],
    cancelled: bool,
    attempts: usize,
) -> Vec<String> {
    let mut hints = Vec::new();
    if cancelled {
        hints.push(format!(
            "Search stopped at the caller deadline after {attempts} attempt(s); allow more time."
        ));
    }
    for a in capacity.under_capacity() {
        hints.push(format!(
            "Raise Max Shifts per Week for workers eligible for {} (short by {} shift(s)).",
            a.area, a.shortfall
        ));
    }
    for g in &capacity.slot_gaps {
        hints.push(format!(
            "{} needs {} worker(s) on {} ({}) but only {} are eligible and not marked off; \
             adjust must-off dates or eligibility.",
            g.area, g.required, g.date, g.shift, g.available_workers
        ));
    }
    if !order.contains(&SoftRule::MaxShiftsPerWeek)
        && input.workers.iter().any(|w| w.max_shifts_per_week.is_some())
    {
        hints.push(format!(
            "Add \"{}\" to the relaxation order.",
            SoftRule::MaxShiftsPerWeek
        ));
    }
    if !order.contains(&SoftRule::MinShiftsPerWeek)
        && input.workers.iter().any(|w| w.min_shifts_per_week > 0)
    {
        hints.push(format!(
            "Add \"{}\" to the relaxation order.",
            SoftRule::MinShiftsPerWeek
        ));
    }
    if hints.is_empty() {
        hints.push(
            "Review must-off dates and weekly min/max shifts of the workers in each area."
                .to_string(),
        );
    }
    hints
}
