use super::builder::ScheduleModel;
use super::problem::Problem;
use super::types::{AreaSchedule, Schedule, ScheduleEntry};

/// Projette la solution 0/1 en lignes de planning, regroupées par zone.
pub(super) fn extract(problem: &Problem<'_>, model: &ScheduleModel, values: &[f64]) -> Schedule {
    let mut areas: Vec<AreaSchedule> = problem
        .areas()
        .map(|a| AreaSchedule {
            area: problem.area_name(a).to_string(),
            entries: Vec::new(),
        })
        .collect();

    let mut chosen: Vec<_> = model
        .assignments
        .iter()
        .filter(|av| values.get(av.var.index()).copied().unwrap_or(0.0) >= 0.5)
        .collect();
    chosen.sort_by_key(|av| (av.day, av.shift, av.worker));

    for av in chosen {
        areas[av.area.0].entries.push(ScheduleEntry {
            worker: problem.worker(av.worker).id.clone(),
            date: problem.date(av.day),
            weekday: problem.weekday(av.day),
            shift: problem.shift_name(av.shift).to_string(),
            area: problem.area_name(av.area).to_string(),
        });
    }

    Schedule { areas }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ScheduleInput, Worker, WorkerId};
    use crate::scheduler::builder::build;
    use crate::scheduler::types::{EngineOptions, RelaxationConfig};
    use chrono::{NaiveDate, Weekday};

    #[test]
    fn rounds_values_and_groups_by_area() {
        let start = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let mut input = ScheduleInput::new(start, 1);
        input.shifts = vec!["Morning".into()];
        input.areas = vec!["Bar".into(), "Kitchen".into()];
        input.workers = vec![Worker::new("ana", "Bar"), Worker::new("bo", "Kitchen")];
        input.require(start, "Kitchen", "Morning", 1);
        input.require(start.succ_opt().unwrap(), "Bar", "Morning", 1);

        let p = Problem::new(&input, EngineOptions::default()).unwrap();
        let model = build(&p, &RelaxationConfig::strict()).unwrap();
        let mut values = vec![0.0; model.milp.var_count()];
        for av in &model.assignments {
            // valeurs "presque" entières comme en sortie de solveur
            values[av.var.index()] = 0.9999;
        }

        let schedule = extract(&p, &model, &values);
        assert_eq!(schedule.len(), 2);
        let bar = schedule.area("Bar").unwrap();
        assert_eq!(bar.entries.len(), 1);
        assert_eq!(bar.entries[0].worker, WorkerId::new("ana"));
        assert_eq!(bar.entries[0].weekday, Weekday::Tue);
        assert_eq!(schedule.area("Kitchen").unwrap().entries[0].date, start);

        let none = extract(&p, &model, &vec![0.49; model.milp.var_count()]);
        assert!(none.is_empty());
        assert_eq!(none.areas.len(), 2);
    }
}
