//! Validation de l'entrée et indexation forte (zones, shifts, jours, personnes).

use super::calendar;
use super::types::{EngineOptions, SchedError, WeekendWindow};
use crate::model::{ScheduleInput, Worker};
use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerIdx(pub usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayIdx(pub usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShiftIdx(pub usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AreaIdx(pub usize);

impl DayIdx {
    pub fn week(self) -> usize {
        self.0 / 7
    }
}

/// Entrée validée, avec tous les noms résolus en index.
#[derive(Debug)]
pub struct Problem<'a> {
    pub input: &'a ScheduleInput,
    pub options: EngineOptions,
    pub dates: Vec<NaiveDate>,
    eligible: Vec<Vec<AreaIdx>>,
    preferred_shift: Vec<Option<ShiftIdx>>,
    must_off: Vec<HashSet<DayIdx>>,
    /// [jour][zone][shift]
    required: Vec<u32>,
    pub windows: Vec<WeekendWindow>,
}

impl<'a> Problem<'a> {
    pub fn new(input: &'a ScheduleInput, options: EngineOptions) -> Result<Self, SchedError> {
        let mut errors = Vec::new();
        let days = match check_horizon(input) {
            Ok(days) => days,
            Err(e) => {
                errors.push(e);
                0
            }
        };
        if options.max_shifts_per_day == 0 {
            errors.push("max_shifts_per_day must be > 0".to_string());
        }
        if options.attempt_time_limit_ms == 0 {
            errors.push("attempt_time_limit_ms must be > 0".to_string());
        }
        if options.weekend.length == 0 || options.weekend.length > 7 {
            errors.push("weekend window length must be within 1..=7".to_string());
        }
        let shifts = index_names("shift", &input.shifts, &mut errors);
        let areas = index_names("area", &input.areas, &mut errors);

        let mut seen = HashSet::new();
        for w in &input.workers {
            if w.id.as_str().trim().is_empty() {
                errors.push("worker id cannot be empty".to_string());
            }
            if !seen.insert(&w.id) {
                errors.push(format!("duplicate worker: {}", w.id));
            }
            check_worker(w, &areas, &shifts, &mut errors);
        }

        let n_days = days as usize;
        let (n_areas, n_shifts) = (input.areas.len(), input.shifts.len());
        let mut required = vec![0u32; n_days * n_areas * n_shifts];
        let mut slots_seen = HashSet::new();
        for r in input.requirements.iter().filter(|_| days > 0) {
            let Some(day) = calendar::day_offset(input.start_date, days, r.date) else {
                errors.push(format!("requirement date {} outside the horizon", r.date));
                continue;
            };
            let (Some(&a), Some(&s)) = (areas.get(r.area.as_str()), shifts.get(r.shift.as_str()))
            else {
                errors.push(format!(
                    "requirement on {} references unknown area/shift {}/{}",
                    r.date, r.area, r.shift
                ));
                continue;
            };
            if !slots_seen.insert((day, a, s)) {
                errors.push(format!(
                    "duplicate requirement for {} {} {}",
                    r.date, r.area, r.shift
                ));
                continue;
            }
            required[(day * n_areas + a) * n_shifts + s] = r.headcount;
        }

        if !errors.is_empty() {
            return Err(SchedError::Validation(errors));
        }

        let eligible = input
            .workers
            .iter()
            .map(|w| {
                let mut idx: Vec<AreaIdx> =
                    w.areas.iter().map(|a| AreaIdx(areas[a.as_str()])).collect();
                idx.sort();
                idx.dedup();
                idx
            })
            .collect();
        let preferred_shift = input
            .workers
            .iter()
            .map(|w| w.preferred_shift.as_deref().map(|s| ShiftIdx(shifts[s])))
            .collect();
        let must_off = input
            .workers
            .iter()
            .map(|w| {
                w.must_off
                    .iter()
                    .filter_map(|d| calendar::day_offset(input.start_date, days, *d))
                    .map(DayIdx)
                    .collect()
            })
            .collect();

        Ok(Self {
            input,
            options,
            dates: input.dates().collect(),
            eligible,
            preferred_shift,
            must_off,
            required,
            windows: calendar::weekend_windows(input.start_date, days, &options.weekend),
        })
    }

    pub fn workers(&self) -> impl Iterator<Item = (WorkerIdx, &'a Worker)> {
        self.input.workers.iter().enumerate().map(|(i, w)| (WorkerIdx(i), w))
    }

    pub fn worker(&self, w: WorkerIdx) -> &'a Worker {
        &self.input.workers[w.0]
    }

    pub fn days(&self) -> impl Iterator<Item = DayIdx> {
        (0..self.dates.len()).map(DayIdx)
    }

    pub fn shifts(&self) -> impl Iterator<Item = ShiftIdx> {
        (0..self.input.shifts.len()).map(ShiftIdx)
    }

    pub fn areas(&self) -> impl Iterator<Item = AreaIdx> {
        (0..self.input.areas.len()).map(AreaIdx)
    }

    pub fn weeks(&self) -> usize {
        self.input.weeks as usize
    }

    pub fn date(&self, d: DayIdx) -> NaiveDate {
        self.dates[d.0]
    }

    pub fn weekday(&self, d: DayIdx) -> Weekday {
        self.dates[d.0].weekday()
    }

    pub fn day_of(&self, date: NaiveDate) -> Option<DayIdx> {
        calendar::day_offset(self.input.start_date, self.dates.len() as u32, date).map(DayIdx)
    }

    pub fn area_name(&self, a: AreaIdx) -> &'a str {
        &self.input.areas[a.0]
    }

    pub fn shift_name(&self, s: ShiftIdx) -> &'a str {
        &self.input.shifts[s.0]
    }

    pub fn eligible_areas(&self, w: WorkerIdx) -> &[AreaIdx] {
        &self.eligible[w.0]
    }

    pub fn is_eligible(&self, w: WorkerIdx, a: AreaIdx) -> bool {
        self.eligible[w.0].binary_search(&a).is_ok()
    }

    pub fn preferred_shift(&self, w: WorkerIdx) -> Option<ShiftIdx> {
        self.preferred_shift[w.0]
    }

    pub fn is_off(&self, w: WorkerIdx, d: DayIdx) -> bool {
        self.must_off[w.0].contains(&d)
    }

    pub fn required(&self, d: DayIdx, a: AreaIdx, s: ShiftIdx) -> u32 {
        let (n_areas, n_shifts) = (self.input.areas.len(), self.input.shifts.len());
        self.required[(d.0 * n_areas + a.0) * n_shifts + s.0]
    }

    /// Jours de l'horizon couverts par une fenêtre de week-end.
    pub fn window_days(&self, window: &WeekendWindow) -> Vec<DayIdx> {
        window
            .start
            .iter_days()
            .take_while(|d| *d <= window.end)
            .filter_map(|d| self.day_of(d))
            .collect()
    }
}

/// Plus de dix ans d'horizon n'a pas de sens pour un planning d'équipe.
const MAX_WEEKS: u32 = 520;

/// Nombre de jours de l'horizon, s'il est représentable.
fn check_horizon(input: &ScheduleInput) -> Result<u32, String> {
    if input.weeks == 0 {
        return Err("weeks must be > 0".to_string());
    }
    if input.weeks > MAX_WEEKS {
        return Err(format!("weeks must be <= {MAX_WEEKS}, got {}", input.weeks));
    }
    let days = input.horizon_days();
    if input.end_date().is_none() {
        return Err(format!(
            "horizon of {days} days from {} exceeds the supported calendar",
            input.start_date
        ));
    }
    Ok(days)
}

fn index_names<'n>(
    kind: &str,
    names: &'n [String],
    errors: &mut Vec<String>,
) -> HashMap<&'n str, usize> {
    if names.is_empty() {
        errors.push(format!("at least one {kind} is required"));
    }
    let mut out = HashMap::new();
    for (i, name) in names.iter().enumerate() {
        if name.trim().is_empty() {
            errors.push(format!("{kind} name cannot be empty"));
        }
        if out.insert(name.as_str(), i).is_some() {
            errors.push(format!("duplicate {kind}: {name}"));
        }
    }
    out
}

fn check_worker(
    w: &Worker,
    areas: &HashMap<&str, usize>,
    shifts: &HashMap<&str, usize>,
    errors: &mut Vec<String>,
) {
    if w.areas.is_empty() {
        errors.push(format!("worker {} has no work area", w.id));
    }
    for a in &w.areas {
        if !areas.contains_key(a.as_str()) {
            errors.push(format!("worker {} references unknown area {a}", w.id));
        }
    }
    if let Some(s) = &w.preferred_shift {
        if !shifts.contains_key(s.as_str()) {
            errors.push(format!("worker {} prefers unknown shift {s}", w.id));
        }
    }
    if let Some(max) = w.max_shifts_per_week {
        if w.min_shifts_per_week > max {
            errors.push(format!(
                "worker {}: min shifts per week {} exceeds max {max}",
                w.id, w.min_shifts_per_week
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Worker;

    fn base() -> ScheduleInput {
        let start = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let mut input = ScheduleInput::new(start, 1);
        input.shifts = vec!["Morning".into(), "Evening".into()];
        input.areas = vec!["Bar".into(), "Kitchen".into()];
        input.workers = vec![
            Worker::new("ana", "Bar").with_preferred_shift("Evening"),
            Worker::new("bo", "Kitchen").with_area("Bar"),
        ];
        input.require(start, "Kitchen", "Evening", 2);
        input
    }

    #[test]
    fn resolves_names_to_indices() {
        let input = base();
        let p = Problem::new(&input, EngineOptions::default()).unwrap();
        assert_eq!(p.required(DayIdx(0), AreaIdx(1), ShiftIdx(1)), 2);
        assert_eq!(p.required(DayIdx(1), AreaIdx(1), ShiftIdx(1)), 0);
        assert_eq!(p.preferred_shift(WorkerIdx(0)), Some(ShiftIdx(1)));
        assert_eq!(p.eligible_areas(WorkerIdx(1)), &[AreaIdx(0), AreaIdx(1)]);
        assert!(!p.is_eligible(WorkerIdx(0), AreaIdx(1)));
        assert_eq!(p.windows.len(), 1);
        assert_eq!(p.window_days(&p.windows[0]), vec![DayIdx(4), DayIdx(5), DayIdx(6)]);
    }

    #[test]
    fn collects_every_validation_problem() {
        let mut input = base();
        input.workers.push(Worker::new("ana", "Terrace").with_shifts_per_week(5, Some(3)));
        input.require(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(), "Bar", "Morning", 1);
        let err = Problem::new(&input, EngineOptions::default()).unwrap_err();
        let SchedError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 4, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("duplicate worker")));
        assert!(errors.iter().any(|e| e.contains("unknown area Terrace")));
        assert!(errors.iter().any(|e| e.contains("exceeds max")));
        assert!(errors.iter().any(|e| e.contains("outside the horizon")));
    }

    #[test]
    fn rejects_unusable_horizon_and_time_limit() {
        let mut input = base();
        input.weeks = u32::MAX;
        let opts = EngineOptions {
            attempt_time_limit_ms: 0,
            ..EngineOptions::default()
        };
        let SchedError::Validation(errors) = Problem::new(&input, opts).unwrap_err() else {
            panic!("expected validation error");
        };
        assert!(errors.iter().any(|e| e.starts_with("weeks must be <=")));
        assert!(errors.iter().any(|e| e.contains("attempt_time_limit_ms")));
        // pas de faux "outside the horizon" quand l'horizon lui-même est invalide
        assert_eq!(errors.len(), 2, "{errors:?}");

        input.weeks = 2;
        input.start_date = NaiveDate::MAX - chrono::Duration::days(3);
        input.requirements.clear();
        let err = Problem::new(&input, EngineOptions::default()).unwrap_err();
        assert!(err.to_string().contains("exceeds the supported calendar"));
    }

    #[test]
    fn must_off_outside_horizon_is_ignored() {
        let mut input = base();
        input.workers[0]
            .must_off
            .insert(NaiveDate::from_ymd_opt(2025, 6, 3).unwrap());
        input.workers[0]
            .must_off
            .insert(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        let p = Problem::new(&input, EngineOptions::default()).unwrap();
        assert!(p.is_off(WorkerIdx(0), DayIdx(1)));
        assert!(!p.is_off(WorkerIdx(0), DayIdx(0)));
    }
}
