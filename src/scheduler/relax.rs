use super::builder::{self, ScheduleModel};
use super::problem::Problem;
use super::types::{Attempt, AttemptStatus, RelaxationConfig, SchedError};
use crate::milp::{MilpSolver, SolveStatus};
use crate::model::SoftRule;
use std::sync::Arc;
use std::time::Instant;

/// Séquence monotone des configurations : aucune règle relâchée, puis chaque règle de
/// `order` ajoutée à son tour. Les doublons consécutifs sont retirés.
pub fn relaxation_sequence(order: &[SoftRule]) -> Vec<RelaxationConfig> {
    let mut configs = vec![RelaxationConfig::strict()];
    for rule in order {
        let next = configs[configs.len() - 1].relaxing(*rule);
        if configs.last() != Some(&next) {
            configs.push(next);
        }
    }
    configs
}

pub(super) enum SearchOutcome {
    Solved {
        model: ScheduleModel,
        values: Vec<f64>,
        attempts: Vec<Attempt>,
    },
    Exhausted {
        attempts: Vec<Attempt>,
        cancelled: bool,
    },
}

pub(super) fn search(
    problem: &Problem<'_>,
    order: &[SoftRule],
    solver: &dyn MilpSolver,
    started: Instant,
) -> Result<SearchOutcome, SchedError> {
    let time_limit = problem.options.attempt_time_limit();
    let deadline = problem.options.deadline();
    let mut attempts = Vec::new();

    for (level, config) in relaxation_sequence(order).into_iter().enumerate() {
        if let Some(limit) = deadline {
            if started.elapsed() >= limit {
                tracing::warn!(level, "deadline reached, no further attempt");
                return Ok(SearchOutcome::Exhausted {
                    attempts,
                    cancelled: true,
                });
            }
        }

        let label = config.label();
        tracing::info!(attempt = level + 1, relaxation = %label, "solving");
        let t0 = Instant::now();
        let model = builder::build(problem, &config)?;
        let milp = Arc::new(model.milp);
        let outcome = solver.solve(Arc::clone(&milp), time_limit);

        let status = match &outcome.status {
            SolveStatus::Optimal => AttemptStatus::Solved,
            SolveStatus::Infeasible => AttemptStatus::Infeasible,
            SolveStatus::TimedOut => AttemptStatus::TimedOut,
            SolveStatus::Failed(reason) => {
                tracing::warn!(attempt = level + 1, %reason, "solver failed");
                AttemptStatus::Failed
            }
        };
        attempts.push(Attempt {
            level,
            relaxation: label,
            status,
            elapsed_ms: t0.elapsed().as_millis() as u64,
        });

        if status != AttemptStatus::Solved {
            tracing::info!(attempt = level + 1, ?status, "no solution at this level");
            continue;
        }
        if outcome.values.len() != milp.var_count() {
            return Err(SchedError::ModelBuild(format!(
                "solver returned {} values for {} variables",
                outcome.values.len(),
                milp.var_count()
            )));
        }

        let milp = Arc::try_unwrap(milp).unwrap_or_else(|shared| (*shared).clone());
        return Ok(SearchOutcome::Solved {
            model: ScheduleModel { milp, ..model },
            values: outcome.values,
            attempts,
        });
    }

    Ok(SearchOutcome::Exhausted {
        attempts,
        cancelled: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::milp::{MilpModel, SolveOutcome};
    use crate::model::{ScheduleInput, Worker};
    use crate::scheduler::types::EngineOptions;
    use chrono::NaiveDate;
    use std::cell::RefCell;
    use std::time::Duration;

    /// Solveur simulé : rejoue une liste de statuts.
    struct Scripted {
        statuses: RefCell<Vec<SolveStatus>>,
        calls: RefCell<usize>,
    }

    impl Scripted {
        fn new(mut statuses: Vec<SolveStatus>) -> Self {
            statuses.reverse();
            Self {
                statuses: RefCell::new(statuses),
                calls: RefCell::new(0),
            }
        }
    }

    impl MilpSolver for Scripted {
        fn solve(&self, model: Arc<MilpModel>, _time_limit: Duration) -> SolveOutcome {
            *self.calls.borrow_mut() += 1;
            let status = self.statuses.borrow_mut().pop().unwrap_or(SolveStatus::Infeasible);
            let values = if status == SolveStatus::Optimal {
                vec![0.0; model.var_count()]
            } else {
                Vec::new()
            };
            SolveOutcome { status, values }
        }
    }

    fn input() -> ScheduleInput {
        let start = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let mut input = ScheduleInput::new(start, 1);
        input.shifts = vec!["Morning".into()];
        input.areas = vec!["Bar".into()];
        input.workers = vec![Worker::new("ana", "Bar")];
        input.require(start, "Bar", "Morning", 1);
        input
    }

    #[test]
    fn sequence_is_monotonic_and_deduplicated() {
        let seq = relaxation_sequence(&[
            SoftRule::PreferredDay,
            SoftRule::PreferredDay,
            SoftRule::MaxWeekendDays,
        ]);
        let labels: Vec<_> = seq.iter().map(|c| c.label()).collect();
        assert_eq!(
            labels,
            vec!["none", "Day Weights", "Day Weights, Max Number of Weekend Days"]
        );
        assert!(seq[2].is_relaxed(SoftRule::PreferredDay));
        assert!(!seq[2].is_relaxed(SoftRule::MaxShiftsPerWeek));
        assert_eq!(relaxation_sequence(&[]).len(), 1);
    }

    #[test]
    fn stops_at_first_solved_level() {
        let input = input();
        let p = Problem::new(&input, EngineOptions::default()).unwrap();
        let solver = Scripted::new(vec![SolveStatus::Infeasible, SolveStatus::Optimal]);
        let order = [SoftRule::PreferredDay, SoftRule::PreferredShift, SoftRule::MaxWeekendDays];

        let SearchOutcome::Solved { model, attempts, .. } =
            search(&p, &order, &solver, Instant::now()).unwrap()
        else {
            panic!("expected a solution");
        };
        assert_eq!(*solver.calls.borrow(), 2);
        assert_eq!(model.config.label(), "Day Weights");
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].status, AttemptStatus::Infeasible);
    }

    #[test]
    fn timeouts_and_failures_advance_the_search() {
        let input = input();
        let p = Problem::new(&input, EngineOptions::default()).unwrap();
        let solver = Scripted::new(vec![
            SolveStatus::TimedOut,
            SolveStatus::Failed("boom".into()),
            SolveStatus::Infeasible,
        ]);
        let order = [SoftRule::PreferredDay, SoftRule::MaxShiftsPerWeek];

        let SearchOutcome::Exhausted { attempts, cancelled } =
            search(&p, &order, &solver, Instant::now()).unwrap()
        else {
            panic!("expected exhaustion");
        };
        assert!(!cancelled);
        let statuses: Vec<_> = attempts.iter().map(|a| a.status).collect();
        assert_eq!(
            statuses,
            vec![AttemptStatus::TimedOut, AttemptStatus::Failed, AttemptStatus::Infeasible]
        );
    }

    #[test]
    fn deadline_stops_before_next_attempt() {
        let input = input();
        let opts = EngineOptions {
            deadline_secs: Some(0),
            ..EngineOptions::default()
        };
        let p = Problem::new(&input, opts).unwrap();
        let solver = Scripted::new(vec![SolveStatus::Optimal]);

        let SearchOutcome::Exhausted { attempts, cancelled } =
            search(&p, &[SoftRule::PreferredDay], &solver, Instant::now()).unwrap()
        else {
            panic!("expected cancellation");
        };
        assert!(cancelled);
        assert!(attempts.is_empty());
        assert_eq!(*solver.calls.borrow(), 0);
    }
}
