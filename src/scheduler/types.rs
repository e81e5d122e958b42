use crate::model::{SoftRule, WorkerId};
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Options du moteur (tout ce qui n'est pas codé en dur).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub max_shifts_per_day: u32,
    /// Limite de temps par tentative de résolution, en millisecondes (> 0).
    pub attempt_time_limit_ms: u64,
    /// Budget global optionnel : au-delà, plus aucune tentative n'est lancée.
    pub deadline_secs: Option<u64>,
    pub weekend: WeekendPolicy,
    pub weights: ObjectiveWeights,
    pub slack: RelaxationSlack,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_shifts_per_day: 1,
            attempt_time_limit_ms: 300_000,
            deadline_secs: None,
            weekend: WeekendPolicy::default(),
            weights: ObjectiveWeights::default(),
            slack: RelaxationSlack::default(),
        }
    }
}

impl EngineOptions {
    pub fn attempt_time_limit(&self) -> Duration {
        Duration::from_millis(self.attempt_time_limit_ms)
    }
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

/// Définition d'une fenêtre de week-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeekendPolicy {
    pub first_day: Weekday,
    pub length: u32,
    pub partial: PartialWindows,
}

impl Default for WeekendPolicy {
    fn default() -> Self {
        Self {
            first_day: Weekday::Fri,
            length: 3,
            partial: PartialWindows::Truncate,
        }
    }
}

impl WeekendPolicy {
    pub fn covers(&self, day: Weekday) -> bool {
        let offset = (day.num_days_from_monday() + 7 - self.first_day.num_days_from_monday()) % 7;
        offset < self.length
    }
}

/// Traitement des fenêtres coupées par les bornes de l'horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialWindows {
    /// On garde la partie incluse dans l'horizon.
    Truncate,
    /// On ignore la fenêtre.
    Skip,
}

/// Coefficients de l'objectif.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveWeights {
    pub day_penalty: f64,
    pub shift_bonus: f64,
    pub shift_penalty: f64,
    pub assignment_bonus: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            day_penalty: -10.0,
            shift_bonus: 10.0,
            shift_penalty: -10.0,
            assignment_bonus: 0.1,
        }
    }
}

/// Marge appliquée aux bornes hebdomadaires une fois relâchées.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaxationSlack {
    pub min_shifts: u32,
    pub max_shifts: u32,
}

impl Default for RelaxationSlack {
    fn default() -> Self {
        Self {
            min_shifts: 2,
            max_shifts: 2,
        }
    }
}

/// Ensemble de règles souples relâchées pour une tentative.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RelaxationConfig {
    mask: u8,
    /// Règles relâchées, dans l'ordre où elles l'ont été.
    order: Vec<SoftRule>,
}

impl RelaxationConfig {
    pub fn strict() -> Self {
        Self::default()
    }

    pub fn relaxing(&self, rule: SoftRule) -> Self {
        let mut next = self.clone();
        if !next.is_relaxed(rule) {
            next.mask |= rule.bit();
            next.order.push(rule);
        }
        next
    }

    pub fn is_relaxed(&self, rule: SoftRule) -> bool {
        self.mask & rule.bit() != 0
    }

    /// "none" ou la liste des règles relâchées.
    pub fn label(&self) -> String {
        if self.order.is_empty() {
            return "none".to_string();
        }
        self.order
            .iter()
            .map(|r| r.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Solved,
    Infeasible,
    TimedOut,
    Failed,
}

/// Trace d'une tentative de résolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub level: usize,
    pub relaxation: String,
    pub status: AttemptStatus,
    pub elapsed_ms: u64,
}

/// Ligne de planning extraite de la solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub worker: WorkerId,
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub shift: String,
    pub area: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaSchedule {
    pub area: String,
    pub entries: Vec<ScheduleEntry>,
}

/// Planning regroupé par zone (ordre des zones de l'entrée).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub areas: Vec<AreaSchedule>,
}

impl Schedule {
    pub fn entries(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.areas.iter().flat_map(|a| a.entries.iter())
    }

    pub fn len(&self) -> usize {
        self.areas.iter().map(|a| a.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn area(&self, name: &str) -> Option<&AreaSchedule> {
        self.areas.iter().find(|a| a.area == name)
    }
}

/// Fenêtre de week-end (dates incluses).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekendWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekendWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for WeekendWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Dépassement du plafond de jours travaillés sur un week-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekendViolation {
    pub worker: WorkerId,
    pub days_worked: u32,
    pub limit: u32,
    pub window: WeekendWindow,
}

impl fmt::Display for WeekendViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} has {} weekend days (max {}) in {}",
            self.worker, self.days_worked, self.limit, self.window
        )
    }
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("invalid input: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("model build failed: {0}")]
    ModelBuild(String),
    #[error("no feasible schedule after {attempts} attempt(s)")]
    Infeasible { attempts: usize },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekend_policy_wraps_around_the_week() {
        let p = WeekendPolicy::default();
        assert!(p.covers(Weekday::Fri));
        assert!(p.covers(Weekday::Sat));
        assert!(p.covers(Weekday::Sun));
        assert!(!p.covers(Weekday::Mon));
        assert!(!p.covers(Weekday::Thu));
    }

    #[test]
    fn relaxation_label_follows_relaxation_order() {
        let cfg = RelaxationConfig::strict();
        assert_eq!(cfg.label(), "none");
        let cfg = cfg
            .relaxing(SoftRule::MaxShiftsPerWeek)
            .relaxing(SoftRule::PreferredDay)
            .relaxing(SoftRule::MaxShiftsPerWeek);
        assert_eq!(cfg.label(), "Max Shifts per Week, Day Weights");
        assert!(cfg.is_relaxed(SoftRule::PreferredDay));
        assert!(!cfg.is_relaxed(SoftRule::MaxWeekendDays));
    }

    #[test]
    fn options_fill_missing_fields_with_defaults() {
        let opts: EngineOptions = serde_json::from_str(
            r#"{ "max_shifts_per_day": 2, "slack": { "max_shifts": 3 },
                "attempt_time_limit_ms": 1500 }"#,
        )
        .unwrap();
        assert_eq!(opts.max_shifts_per_day, 2);
        assert_eq!(opts.slack.max_shifts, 3);
        assert_eq!(opts.slack.min_shifts, 2);
        assert_eq!(opts.weekend.first_day, Weekday::Fri);
        assert_eq!(opts.attempt_time_limit(), Duration::from_millis(1500));
        assert_eq!(
            EngineOptions::default().attempt_time_limit(),
            Duration::from_secs(300)
        );
    }
}
