use chrono::{Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

/// Identifiant fort pour Worker
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(String);

impl WorkerId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Membre de l'équipe à planifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    /// Zones de travail autorisées (au moins une).
    pub areas: Vec<String>,
    /// Poids de préférence par jour de semaine (absent ou 0 = pas de préférence).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub day_weights: HashMap<Weekday, u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_shift: Option<String>,
    /// Dates où la personne ne doit pas travailler.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub must_off: BTreeSet<NaiveDate>,
    #[serde(default)]
    pub min_shifts_per_week: u32,
    /// `None` = pas de plafond hebdomadaire.
    #[serde(default)]
    pub max_shifts_per_week: Option<u32>,
    #[serde(default = "default_max_weekend_days")]
    pub max_weekend_days: u32,
}

fn default_max_weekend_days() -> u32 {
    2
}

impl Worker {
    pub fn new<I: AsRef<str>, A: Into<String>>(id: I, area: A) -> Self {
        Self {
            id: WorkerId::new(id),
            areas: vec![area.into()],
            day_weights: HashMap::new(),
            preferred_shift: None,
            must_off: BTreeSet::new(),
            min_shifts_per_week: 0,
            max_shifts_per_week: None,
            max_weekend_days: default_max_weekend_days(),
        }
    }

    pub fn with_area<A: Into<String>>(mut self, area: A) -> Self {
        self.areas.push(area.into());
        self
    }

    pub fn with_shifts_per_week(mut self, min: u32, max: Option<u32>) -> Self {
        self.min_shifts_per_week = min;
        self.max_shifts_per_week = max;
        self
    }

    pub fn with_max_weekend_days(mut self, days: u32) -> Self {
        self.max_weekend_days = days;
        self
    }

    pub fn with_day_weight(mut self, day: Weekday, weight: u32) -> Self {
        self.day_weights.insert(day, weight);
        self
    }

    pub fn with_preferred_shift<S: Into<String>>(mut self, shift: S) -> Self {
        self.preferred_shift = Some(shift.into());
        self
    }

    pub fn with_must_off(mut self, date: NaiveDate) -> Self {
        self.must_off.insert(date);
        self
    }

    pub fn day_weight(&self, day: Weekday) -> u32 {
        self.day_weights.get(&day).copied().unwrap_or(0)
    }

    pub fn is_eligible(&self, area: &str) -> bool {
        self.areas.iter().any(|a| a == area)
    }
}

/// Effectif requis pour un triplet (date, zone, shift).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub date: NaiveDate,
    pub area: String,
    pub shift: String,
    pub headcount: u32,
}

/// Règles souples pouvant être relâchées, dans l'ordre choisi par l'appelant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum SoftRule {
    PreferredDay,
    PreferredShift,
    MaxWeekendDays,
    MinShiftsPerWeek,
    MaxShiftsPerWeek,
}

impl SoftRule {
    pub const ALL: [SoftRule; 5] = [
        SoftRule::PreferredDay,
        SoftRule::PreferredShift,
        SoftRule::MaxWeekendDays,
        SoftRule::MinShiftsPerWeek,
        SoftRule::MaxShiftsPerWeek,
    ];

    /// Libellé opérateur.
    pub fn label(self) -> &'static str {
        match self {
            SoftRule::PreferredDay => "Day Weights",
            SoftRule::PreferredShift => "Shift Weights",
            SoftRule::MaxWeekendDays => "Max Number of Weekend Days",
            SoftRule::MinShiftsPerWeek => "Min Shifts per Week",
            SoftRule::MaxShiftsPerWeek => "Max Shifts per Week",
        }
    }

    pub(crate) fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for SoftRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SoftRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "preferredday" | "dayweights" | "dayweight" => Ok(SoftRule::PreferredDay),
            "preferredshift" | "shiftweights" | "shiftweight" => Ok(SoftRule::PreferredShift),
            "maxweekenddays" | "maxnumberofweekenddays" => Ok(SoftRule::MaxWeekendDays),
            "minshiftsperweek" => Ok(SoftRule::MinShiftsPerWeek),
            "maxshiftsperweek" => Ok(SoftRule::MaxShiftsPerWeek),
            _ => Err(format!("unknown soft rule: {s}")),
        }
    }
}

impl TryFrom<String> for SoftRule {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Données d'entrée complètes d'une demande de planification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInput {
    pub start_date: NaiveDate,
    pub weeks: u32,
    /// Shifts ordonnés dans la journée (ex. Morning, Evening).
    pub shifts: Vec<String>,
    pub areas: Vec<String>,
    pub workers: Vec<Worker>,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
}

impl ScheduleInput {
    pub fn new(start_date: NaiveDate, weeks: u32) -> Self {
        Self {
            start_date,
            weeks,
            shifts: Vec::new(),
            areas: Vec::new(),
            workers: Vec::new(),
            requirements: Vec::new(),
        }
    }

    pub fn horizon_days(&self) -> u32 {
        self.weeks.saturating_mul(7)
    }

    /// Dernier jour (inclus) de l'horizon ; `None` si vide ou hors calendrier.
    pub fn end_date(&self) -> Option<NaiveDate> {
        let last = self.horizon_days().checked_sub(1)?;
        self.start_date
            .checked_add_signed(Duration::days(i64::from(last)))
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        self.start_date.iter_days().take(self.horizon_days() as usize)
    }

    pub fn find_worker(&self, id: &WorkerId) -> Option<&Worker> {
        self.workers.iter().find(|w| &w.id == id)
    }

    /// Ajoute (ou remplace) un besoin pour le triplet donné.
    pub fn require<A: Into<String>, S: Into<String>>(
        &mut self,
        date: NaiveDate,
        area: A,
        shift: S,
        headcount: u32,
    ) {
        let (area, shift) = (area.into(), shift.into());
        self.requirements
            .retain(|r| !(r.date == date && r.area == area && r.shift == shift));
        self.requirements.push(Requirement {
            date,
            area,
            shift,
            headcount,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soft_rule_parses_operator_labels() {
        assert_eq!("Day Weights".parse::<SoftRule>(), Ok(SoftRule::PreferredDay));
        assert_eq!("Shift Weight".parse::<SoftRule>(), Ok(SoftRule::PreferredShift));
        assert_eq!(
            "Max Number of Weekend Days".parse::<SoftRule>(),
            Ok(SoftRule::MaxWeekendDays)
        );
        assert_eq!("max_shifts_per_week".parse::<SoftRule>(), Ok(SoftRule::MaxShiftsPerWeek));
        assert!("Coffee Breaks".parse::<SoftRule>().is_err());
    }

    #[test]
    fn require_replaces_existing_slot() {
        let day = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let mut input = ScheduleInput::new(day, 1);
        input.require(day, "Bar", "Morning", 1);
        input.require(day, "Bar", "Morning", 3);
        assert_eq!(input.requirements.len(), 1);
        assert_eq!(input.requirements[0].headcount, 3);
        assert_eq!(input.end_date(), NaiveDate::from_ymd_opt(2025, 6, 8));
        assert_eq!(ScheduleInput::new(day, 0).end_date(), None);
    }
}
