use crate::model::{Requirement, ScheduleInput};
use anyhow::{bail, Context, Result};
use chrono::{Datelike, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Besoins hebdomadaires types, répétés sur tout l'horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffingTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub areas: Vec<AreaPattern>,
    /// Besoins ponctuels qui remplacent le motif pour une date donnée.
    #[serde(default)]
    pub overrides: Vec<Requirement>,
}

/// Motif d'une zone : par jour de semaine, effectifs par shift au format "1/2".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaPattern {
    pub area: String,
    pub days: HashMap<Weekday, String>,
}

impl StaffingTemplate {
    pub fn validate(&self, shifts: &[String]) -> Result<()> {
        if self.id.trim().is_empty() {
            bail!("template id cannot be empty");
        }
        if self.areas.is_empty() && self.overrides.is_empty() {
            bail!("template must contain at least one area pattern");
        }
        for pattern in &self.areas {
            if pattern.area.trim().is_empty() {
                bail!("area pattern name cannot be empty");
            }
            for (day, cell) in &pattern.days {
                parse_counts(cell, shifts.len())
                    .with_context(|| format!("{} on {day}", pattern.area))?;
            }
        }
        Ok(())
    }

    /// Génère les besoins datés pour l'horizon de `input`.
    pub fn expand(&self, input: &ScheduleInput) -> Result<Vec<Requirement>> {
        self.validate(&input.shifts)?;

        let mut out = Vec::new();
        for date in input.dates() {
            for pattern in &self.areas {
                let Some(cell) = pattern.days.get(&date.weekday()) else {
                    continue;
                };
                let counts = parse_counts(cell, input.shifts.len())?;
                for (shift, headcount) in input.shifts.iter().zip(counts) {
                    if headcount == 0 {
                        continue;
                    }
                    out.push(Requirement {
                        date,
                        area: pattern.area.clone(),
                        shift: shift.clone(),
                        headcount,
                    });
                }
            }
        }

        for o in &self.overrides {
            out.retain(|r| !(r.date == o.date && r.area == o.area && r.shift == o.shift));
            if o.headcount > 0 {
                out.push(o.clone());
            }
        }
        out.sort_by(|a, b| (a.date, &a.area, &a.shift).cmp(&(b.date, &b.area, &b.shift)));
        Ok(out)
    }

    /// Remplace les besoins de `input` par ceux du modèle.
    pub fn apply_to(&self, input: &mut ScheduleInput) -> Result<()> {
        input.requirements = self.expand(input)?;
        Ok(())
    }
}

/// "1/2" -> [1, 2] ; une cellule vide vaut zéro partout.
pub fn parse_counts(cell: &str, shifts: usize) -> Result<Vec<u32>> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(vec![0; shifts]);
    }
    let counts = cell
        .split('/')
        .map(|c| {
            c.trim()
                .parse::<u32>()
                .with_context(|| format!("invalid headcount: {c:?}"))
        })
        .collect::<Result<Vec<_>>>()?;
    if counts.len() != shifts {
        bail!("expected {shifts} shift count(s), got {}", counts.len());
    }
    Ok(counts)
}

pub fn load_template_from_file<P: AsRef<Path>>(path: P) -> Result<StaffingTemplate> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("reading template {}", path.display()))?;
    let template: StaffingTemplate = serde_json::from_slice(&data)
        .with_context(|| format!("parsing template {}", path.display()))?;
    Ok(template)
}
