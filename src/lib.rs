#![forbid(unsafe_code)]
//! Staffplan : moteur de planification d'équipes par programmation linéaire en nombres entiers.
//!
//! - Affectation personnes × jours × shifts × zones sur plusieurs semaines.
//! - Règles dures toujours respectées (effectifs exacts, jours off, shifts par jour).
//! - Règles souples relâchées une à une, dans un ordre fixé par l'appelant.
//! - Rapport de capacité systématique, vérification a posteriori des week-ends.
//! - Aucun accès fichier dans le moteur ; stockage JSON et export CSV à part.

pub mod io;
pub mod milp;
pub mod model;
pub mod report;
pub mod request;
pub mod scheduler;
pub mod storage;
pub mod template;

pub use milp::{GoodLpSolver, MilpModel, MilpSolver, SolveOutcome, SolveStatus};
pub use model::{Requirement, ScheduleInput, SoftRule, Worker, WorkerId};
pub use report::{ReportRenderer, TextReport};
pub use request::{default_relaxation_order, ScheduleRequest};
pub use scheduler::{
    detect_weekend_violations, schedule, CapacityReport, EngineOptions, Outcome, SchedError,
    Schedule, ScheduleEntry, ScheduleResult, Scheduler, WeekendPolicy, WeekendViolation,
    WeekendWindow,
};
pub use storage::{JsonStorage, Storage};
pub use template::{load_template_from_file, StaffingTemplate};
