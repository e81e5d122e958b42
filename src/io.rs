use crate::scheduler::{Schedule, WeekendViolation};
use csv::WriterBuilder;
use std::path::Path;

/// Export CSV du planning: header `worker,date,weekday,shift,area`
pub fn export_schedule_csv<P: AsRef<Path>>(path: P, schedule: &Schedule) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["worker", "date", "weekday", "shift", "area"])?;
    for e in schedule.entries() {
        let date = e.date.to_string();
        let weekday = e.weekday.to_string();
        w.write_record([
            e.worker.as_str(),
            date.as_str(),
            weekday.as_str(),
            e.shift.as_str(),
            e.area.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Export CSV des dépassements: header `worker,days_worked,limit,window_start,window_end`
pub fn export_violations_csv<P: AsRef<Path>>(
    path: P,
    violations: &[WeekendViolation],
) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["worker", "days_worked", "limit", "window_start", "window_end"])?;
    for v in violations {
        w.write_record([
            v.worker.as_str().to_string(),
            v.days_worked.to_string(),
            v.limit.to_string(),
            v.window.start.to_string(),
            v.window.end.to_string(),
        ])?;
    }
    w.flush()?;
    Ok(())
}
