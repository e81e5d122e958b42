use crate::model::{ScheduleInput, SoftRule};
use crate::scheduler::{EngineOptions, SchedError, ScheduleResult, Scheduler};
use crate::template::StaffingTemplate;
use serde::{Deserialize, Serialize};

/// Demande complète telle que lue par la CLI : données, ordre de relaxation, options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub input: ScheduleInput,
    #[serde(default = "default_relaxation_order")]
    pub relaxation_order: Vec<SoftRule>,
    #[serde(default)]
    pub options: EngineOptions,
    /// Si présent, remplace `input.requirements`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<StaffingTemplate>,
}

/// Ordre historique : préférences d'abord, bornes hebdomadaires minimales ensuite.
pub fn default_relaxation_order() -> Vec<SoftRule> {
    vec![
        SoftRule::PreferredDay,
        SoftRule::PreferredShift,
        SoftRule::MaxWeekendDays,
        SoftRule::MinShiftsPerWeek,
    ]
}

impl ScheduleRequest {
    pub fn new(input: ScheduleInput) -> Self {
        Self {
            input,
            relaxation_order: default_relaxation_order(),
            options: EngineOptions::default(),
            template: None,
        }
    }

    /// Entrée effective (modèle de besoins appliqué).
    pub fn resolved_input(&self) -> Result<ScheduleInput, SchedError> {
        let mut input = self.input.clone();
        if let Some(template) = &self.template {
            template
                .apply_to(&mut input)
                .map_err(|e| SchedError::Validation(vec![format!("{e:#}")]))?;
        }
        Ok(input)
    }

    pub fn run(&self) -> Result<ScheduleResult, SchedError> {
        let input = self.resolved_input()?;
        Scheduler::new(self.options).run(&input, &self.relaxation_order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_accepts_operator_labels_and_template() {
        let raw = r#"{
            "input": {
                "start_date": "2025-06-02",
                "weeks": 1,
                "shifts": ["Morning", "Evening"],
                "areas": ["Bar"],
                "workers": [{ "id": "ana", "areas": ["Bar"], "day_weights": { "Mon": 10 } }]
            },
            "relaxation_order": ["Shift Weight", "MaxShiftsPerWeek"],
            "options": { "attempt_time_limit_ms": 5000 },
            "template": {
                "id": "bar",
                "name": "Bar",
                "areas": [{ "area": "Bar", "days": { "Mon": "1/0", "Sat": "1/1" } }]
            }
        }"#;
        let req: ScheduleRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(
            req.relaxation_order,
            vec![SoftRule::PreferredShift, SoftRule::MaxShiftsPerWeek]
        );
        assert_eq!(req.options.attempt_time_limit_ms, 5000);
        assert_eq!(req.options.max_shifts_per_day, 1);
        assert_eq!(req.input.workers[0].max_weekend_days, 2);
        assert_eq!(req.input.workers[0].day_weight(chrono::Weekday::Mon), 10);

        let input = req.resolved_input().unwrap();
        assert_eq!(input.requirements.len(), 3);
    }

    #[test]
    fn missing_order_falls_back_to_default() {
        let raw = r#"{ "input": { "start_date": "2025-06-02", "weeks": 1,
            "shifts": ["Morning"], "areas": ["Bar"], "workers": [] } }"#;
        let req: ScheduleRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(req.relaxation_order, default_relaxation_order());
        assert!(serde_json::from_str::<ScheduleRequest>(
            r#"{ "input": { "start_date": "2025-06-02", "weeks": 1, "shifts": [], "areas": [],
                "workers": [] }, "relaxation_order": ["Lunch Breaks"] }"#
        )
        .is_err());
    }
}
