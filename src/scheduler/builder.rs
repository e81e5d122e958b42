//! Compilation d'une entrée validée + configuration de relaxation en modèle MILP.

use super::problem::{AreaIdx, DayIdx, Problem, ShiftIdx, WorkerIdx};
use super::types::{RelaxationConfig, SchedError};
use crate::milp::{Cmp, MilpModel, VarId};
use crate::model::SoftRule;
use std::collections::HashMap;

/// Variable d'affectation : `worker` travaille `day`, `shift`, `area`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignmentVar {
    pub worker: WorkerIdx,
    pub day: DayIdx,
    pub shift: ShiftIdx,
    pub area: AreaIdx,
    pub var: VarId,
}

/// Modèle prêt à être résolu, avec l'index de ses variables.
#[derive(Debug)]
pub struct ScheduleModel {
    pub milp: MilpModel,
    pub assignments: Vec<AssignmentVar>,
    /// Indicateur "a travaillé ce jour-là" par (personne, jour).
    pub worked: HashMap<(WorkerIdx, DayIdx), VarId>,
    pub config: RelaxationConfig,
}

pub(super) fn build(
    problem: &Problem<'_>,
    config: &RelaxationConfig,
) -> Result<ScheduleModel, SchedError> {
    let mut b = Builder {
        problem,
        config,
        milp: MilpModel::new("staff_schedule"),
        assignments: Vec::new(),
        by_worker_day: HashMap::new(),
        worked: HashMap::new(),
    };
    b.variables()?;
    b.objective();
    b.staffing();
    b.must_off();
    b.per_day();
    b.per_week();
    b.weekends();

    tracing::debug!(
        relaxation = %config.label(),
        variables = b.milp.var_count(),
        constraints = b.milp.constraints().len(),
        "model built"
    );

    Ok(ScheduleModel {
        milp: b.milp,
        assignments: b.assignments,
        worked: b.worked,
        config: config.clone(),
    })
}

struct Builder<'p, 'a> {
    problem: &'p Problem<'a>,
    config: &'p RelaxationConfig,
    milp: MilpModel,
    assignments: Vec<AssignmentVar>,
    by_worker_day: HashMap<(WorkerIdx, DayIdx), Vec<VarId>>,
    worked: HashMap<(WorkerIdx, DayIdx), VarId>,
}

impl Builder<'_, '_> {
    fn variables(&mut self) -> Result<(), SchedError> {
        let p = self.problem;
        for (w, worker) in p.workers() {
            for d in p.days() {
                for s in p.shifts() {
                    for &a in p.eligible_areas(w) {
                        if p.required(d, a, s) == 0 {
                            continue;
                        }
                        self.add_assignment(w, d, s, a)?;
                    }
                }
                let y = self.milp.add_binary(format!(
                    "worked_{}_w{}_{}",
                    worker.id,
                    d.week(),
                    p.weekday(d)
                ));
                self.worked.insert((w, d), y);
            }
        }
        Ok(())
    }

    fn add_assignment(
        &mut self,
        w: WorkerIdx,
        d: DayIdx,
        s: ShiftIdx,
        a: AreaIdx,
    ) -> Result<VarId, SchedError> {
        let p = self.problem;
        if !p.is_eligible(w, a) {
            return Err(SchedError::ModelBuild(format!(
                "assignment for {} in ineligible area {}",
                p.worker(w).id,
                p.area_name(a)
            )));
        }
        let var = self.milp.add_binary(format!(
            "assign_{}_w{}_{}_{}_{}",
            p.worker(w).id,
            d.week(),
            p.weekday(d),
            p.shift_name(s),
            p.area_name(a)
        ));
        self.assignments.push(AssignmentVar {
            worker: w,
            day: d,
            shift: s,
            area: a,
            var,
        });
        self.by_worker_day.entry((w, d)).or_default().push(var);
        Ok(var)
    }

    fn objective(&mut self) {
        let p = self.problem;
        let weights = p.options.weights;
        let day_penalty = if self.config.is_relaxed(SoftRule::PreferredDay) {
            weights.day_penalty
        } else {
            0.0
        };
        let shift_penalty = if self.config.is_relaxed(SoftRule::PreferredShift) {
            weights.shift_penalty
        } else {
            0.0
        };
        let day_weights: Vec<[f64; 7]> = p
            .workers()
            .map(|(_, worker)| normalized_day_weights(worker, &p.options.weekend))
            .collect();

        for av in &self.assignments {
            let weekday = p.weekday(av.day).num_days_from_sunday() as usize;
            let preferred_day = day_weights[av.worker.0][weekday];
            let day_term = if preferred_day > 0.0 {
                preferred_day
            } else {
                day_penalty
            };
            let shift_term = if p.preferred_shift(av.worker) == Some(av.shift) {
                weights.shift_bonus
            } else {
                shift_penalty
            };
            self.milp
                .add_objective_term(av.var, day_term + shift_term + weights.assignment_bonus);
        }
    }

    fn staffing(&mut self) {
        let p = self.problem;
        let mut slots: HashMap<(DayIdx, AreaIdx, ShiftIdx), Vec<(VarId, f64)>> = HashMap::new();
        for av in &self.assignments {
            slots
                .entry((av.day, av.area, av.shift))
                .or_default()
                .push((av.var, 1.0));
        }
        for d in p.days() {
            for a in p.areas() {
                for s in p.shifts() {
                    let required = p.required(d, a, s);
                    if required == 0 {
                        continue;
                    }
                    let terms = slots.remove(&(d, a, s)).unwrap_or_default();
                    self.milp.add_constraint(
                        format!("staff_{}_{}_{}", p.date(d), p.area_name(a), p.shift_name(s)),
                        terms,
                        Cmp::Eq,
                        f64::from(required),
                    );
                }
            }
        }
    }

    fn must_off(&mut self) {
        let p = self.problem;
        for (w, worker) in p.workers() {
            for d in p.days().filter(|d| p.is_off(w, *d)) {
                let Some(vars) = self.by_worker_day.get(&(w, d)) else {
                    continue;
                };
                self.milp.add_constraint(
                    format!("off_{}_{}", worker.id, p.date(d)),
                    ones(vars),
                    Cmp::Eq,
                    0.0,
                );
            }
        }
    }

    fn per_day(&mut self) {
        let p = self.problem;
        let limit = f64::from(p.options.max_shifts_per_day);
        for (w, worker) in p.workers() {
            for d in p.days() {
                let Some(vars) = self.by_worker_day.get(&(w, d)) else {
                    continue;
                };
                self.milp.add_constraint(
                    format!("per_day_{}_{}", worker.id, p.date(d)),
                    ones(vars),
                    Cmp::Le,
                    limit,
                );
                // y >= somme(x) / n : y vaut 1 dès qu'une affectation du jour est prise
                let y = self.worked[&(w, d)];
                let n = vars.len() as f64;
                let mut terms = vec![(y, 1.0)];
                terms.extend(vars.iter().map(|v| (*v, -1.0 / n)));
                self.milp.add_constraint(
                    format!("worked_link_{}_{}", worker.id, p.date(d)),
                    terms,
                    Cmp::Ge,
                    0.0,
                );
            }
        }
    }

    fn per_week(&mut self) {
        let p = self.problem;
        let slack = p.options.slack;
        let relax_max = self.config.is_relaxed(SoftRule::MaxShiftsPerWeek);
        let relax_min = self.config.is_relaxed(SoftRule::MinShiftsPerWeek);

        for (w, worker) in p.workers() {
            for week in 0..p.weeks() {
                let terms: Vec<(VarId, f64)> = (week * 7..week * 7 + 7)
                    .filter_map(|k| self.by_worker_day.get(&(w, DayIdx(k))))
                    .flat_map(|vars| ones(vars))
                    .collect();

                if let Some(max) = worker.max_shifts_per_week {
                    let bound = if relax_max { max + slack.max_shifts } else { max };
                    self.milp.add_constraint(
                        format!("max_week_{}_w{week}", worker.id),
                        terms.clone(),
                        Cmp::Le,
                        f64::from(bound),
                    );
                }

                let min = if relax_min {
                    worker.min_shifts_per_week.saturating_sub(slack.min_shifts)
                } else {
                    worker.min_shifts_per_week
                };
                if min > 0 {
                    self.milp.add_constraint(
                        format!("min_week_{}_w{week}", worker.id),
                        terms,
                        Cmp::Ge,
                        f64::from(min),
                    );
                }
            }
        }
    }

    fn weekends(&mut self) {
        if self.config.is_relaxed(SoftRule::MaxWeekendDays) {
            return;
        }
        let p = self.problem;
        for window in &p.windows {
            let days = p.window_days(window);
            for (w, worker) in p.workers() {
                let terms: Vec<(VarId, f64)> = days
                    .iter()
                    .filter(|d| self.by_worker_day.contains_key(&(w, **d)))
                    .map(|d| (self.worked[&(w, *d)], 1.0))
                    .collect();
                if terms.is_empty() {
                    continue;
                }
                self.milp.add_constraint(
                    format!("weekend_{}_{}", worker.id, window.start),
                    terms,
                    Cmp::Le,
                    f64::from(worker.max_weekend_days),
                );
            }
        }
    }
}

fn ones(vars: &[VarId]) -> Vec<(VarId, f64)> {
    vars.iter().map(|v| (*v, 1.0)).collect()
}

/// Poids de préférence par jour (index dimanche = 0).
///
/// Les jours hors week-end marqués préférés reçoivent tous la moyenne des poids non nuls
/// de ces jours. Un jour de fenêtre de week-end n'est jamais préféré.
pub(super) fn normalized_day_weights(
    worker: &crate::model::Worker,
    weekend: &super::types::WeekendPolicy,
) -> [f64; 7] {
    use chrono::Weekday;
    const WEEK: [Weekday; 7] = [
        Weekday::Sun,
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
    ];

    let weekday_prefs: Vec<u32> = WEEK
        .iter()
        .filter(|d| !weekend.covers(**d))
        .map(|d| worker.day_weight(*d))
        .filter(|w| *w > 0)
        .collect();
    let avg = if weekday_prefs.is_empty() {
        0.0
    } else {
        weekday_prefs.iter().map(|w| f64::from(*w)).sum::<f64>() / weekday_prefs.len() as f64
    };

    let mut out = [0.0; 7];
    for (i, day) in WEEK.iter().enumerate() {
        if !weekend.covers(*day) && worker.day_weight(*day) > 0 {
            out[i] = avg;
        }
    }
    out
}
