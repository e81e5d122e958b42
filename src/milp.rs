//! Modèle MILP neutre vis-à-vis du solveur, et point d'accroche du solveur externe.
//!
//! Le constructeur de modèle ne produit que des données (`MilpModel`) ; la résolution est
//! déléguée à un `MilpSolver`. L'implémentation par défaut s'appuie sur `good_lp` (backend
//! microlp, pur Rust) exécuté sur un thread de travail unique, borné par une limite de temps.

use good_lp::{default_solver, variable, variables, Expression, Solution, SolverModel};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Index d'une variable dans un `MilpModel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub(crate) usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Le,
    Ge,
    Eq,
}

#[derive(Debug, Clone)]
pub struct LinearConstraint {
    pub name: String,
    pub terms: Vec<(VarId, f64)>,
    pub cmp: Cmp,
    pub rhs: f64,
}

impl LinearConstraint {
    /// Vérifie la contrainte pour une affectation donnée.
    pub fn is_satisfied(&self, values: &[f64]) -> bool {
        const EPS: f64 = 1e-6;
        let lhs: f64 = self
            .terms
            .iter()
            .map(|(v, c)| c * values.get(v.0).copied().unwrap_or(0.0))
            .sum();
        match self.cmp {
            Cmp::Le => lhs <= self.rhs + EPS,
            Cmp::Ge => lhs >= self.rhs - EPS,
            Cmp::Eq => (lhs - self.rhs).abs() <= EPS,
        }
    }
}

/// Programme linéaire en variables binaires, à maximiser.
#[derive(Debug, Clone, Default)]
pub struct MilpModel {
    pub name: String,
    var_names: Vec<String>,
    objective: Vec<(VarId, f64)>,
    constraints: Vec<LinearConstraint>,
}

impl MilpModel {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_binary<S: Into<String>>(&mut self, name: S) -> VarId {
        self.var_names.push(name.into());
        VarId(self.var_names.len() - 1)
    }

    pub fn add_objective_term(&mut self, var: VarId, coef: f64) {
        if coef != 0.0 {
            self.objective.push((var, coef));
        }
    }

    pub fn add_constraint<S: Into<String>>(
        &mut self,
        name: S,
        terms: Vec<(VarId, f64)>,
        cmp: Cmp,
        rhs: f64,
    ) {
        self.constraints.push(LinearConstraint {
            name: name.into(),
            terms,
            cmp,
            rhs,
        });
    }

    pub fn var_count(&self) -> usize {
        self.var_names.len()
    }

    pub fn objective(&self) -> &[(VarId, f64)] {
        &self.objective
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn constraints_named<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = &'a LinearConstraint> + 'a {
        self.constraints
            .iter()
            .filter(move |c| c.name.starts_with(prefix))
    }

    /// Contraintes sans terme : décidables sans solveur.
    fn trivially_infeasible(&self) -> Option<&LinearConstraint> {
        self.constraints
            .iter()
            .find(|c| c.terms.is_empty() && !c.is_satisfied(&[]))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    TimedOut,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    /// Valeurs indexées par `VarId` (vide si pas de solution).
    pub values: Vec<f64>,
}

impl SolveOutcome {
    pub fn without_solution(status: SolveStatus) -> Self {
        Self {
            status,
            values: Vec::new(),
        }
    }

    pub fn is_solved(&self) -> bool {
        self.status == SolveStatus::Optimal
    }
}

/// Solveur MILP externe.
pub trait MilpSolver {
    /// Résout `model` en au plus `time_limit` ; bloquant.
    fn solve(&self, model: Arc<MilpModel>, time_limit: Duration) -> SolveOutcome;
}

/// Solveur par défaut : `good_lp` sur un unique thread de travail, propre à l'instance.
///
/// Une tentative qui dépasse sa limite est marquée abandonnée : le backend ne sait pas
/// s'interrompre, mais le thread ne résout jamais deux modèles à la fois et saute les
/// modèles abandonnés encore en file. Il s'arrête quand le solveur est détruit.
pub struct GoodLpSolver {
    worker: Mutex<Option<Sender<Job>>>,
    runner: Runner,
}

type Runner = fn(&MilpModel) -> SolveOutcome;

struct Job {
    model: Arc<MilpModel>,
    abandoned: Arc<AtomicBool>,
    reply: Sender<SolveOutcome>,
}

impl std::fmt::Debug for GoodLpSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoodLpSolver").finish_non_exhaustive()
    }
}

impl Default for GoodLpSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl GoodLpSolver {
    pub fn new() -> Self {
        Self::with_runner(run_good_lp)
    }

    fn with_runner(runner: Runner) -> Self {
        Self {
            worker: Mutex::new(None),
            runner,
        }
    }

    fn sender(&self) -> Result<Sender<Job>, String> {
        let mut slot = self
            .worker
            .lock()
            .map_err(|_| "solver worker lock poisoned".to_string())?;
        if let Some(tx) = slot.as_ref() {
            return Ok(tx.clone());
        }
        let (tx, rx) = channel::<Job>();
        let runner = self.runner;
        thread::Builder::new()
            .name("milp-worker".into())
            .spawn(move || worker_loop(rx, runner))
            .map_err(|e| e.to_string())?;
        *slot = Some(tx.clone());
        Ok(tx)
    }

    fn reset(&self) {
        if let Ok(mut slot) = self.worker.lock() {
            *slot = None;
        }
    }
}

fn worker_loop(rx: Receiver<Job>, runner: Runner) {
    while let Ok(job) = rx.recv() {
        if job.abandoned.load(Ordering::Acquire) {
            tracing::debug!(model = %job.model.name, "skipping abandoned model");
            continue;
        }
        let outcome = catch_unwind(AssertUnwindSafe(|| runner(&job.model))).unwrap_or_else(|_| {
            SolveOutcome::without_solution(SolveStatus::Failed("solver panicked".to_string()))
        });
        let _ = job.reply.send(outcome);
    }
}

impl MilpSolver for GoodLpSolver {
    fn solve(&self, model: Arc<MilpModel>, time_limit: Duration) -> SolveOutcome {
        if let Some(row) = model.trivially_infeasible() {
            tracing::debug!(constraint = %row.name, "empty row cannot be satisfied");
            return SolveOutcome::without_solution(SolveStatus::Infeasible);
        }

        let worker = match self.sender() {
            Ok(tx) => tx,
            Err(reason) => return SolveOutcome::without_solution(SolveStatus::Failed(reason)),
        };
        let (tx, rx) = channel();
        let abandoned = Arc::new(AtomicBool::new(false));
        let job = Job {
            model,
            abandoned: Arc::clone(&abandoned),
            reply: tx,
        };
        if worker.send(job).is_err() {
            self.reset();
            return SolveOutcome::without_solution(SolveStatus::Failed(
                "solver worker stopped".to_string(),
            ));
        }

        // l'attente d'un modèle précédent encore en cours compte dans la limite
        match rx.recv_timeout(time_limit) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => {
                abandoned.store(true, Ordering::Release);
                SolveOutcome::without_solution(SolveStatus::TimedOut)
            }
            Err(RecvTimeoutError::Disconnected) => {
                self.reset();
                SolveOutcome::without_solution(SolveStatus::Failed(
                    "solver worker disconnected".to_string(),
                ))
            }
        }
    }
}

fn run_good_lp(model: &MilpModel) -> SolveOutcome {
    let mut vars = variables!();
    let xs: Vec<_> = model
        .var_names
        .iter()
        .map(|name| vars.add(variable().binary().name(name.clone())))
        .collect();

    let objective = model
        .objective
        .iter()
        .fold(Expression::from(0.0), |acc, (v, c)| acc + *c * xs[v.0]);

    let mut problem = vars.maximise(objective).using(default_solver);
    for row in &model.constraints {
        if row.terms.is_empty() {
            continue;
        }
        let lhs = row
            .terms
            .iter()
            .fold(Expression::from(0.0), |acc, (v, c)| acc + *c * xs[v.0]);
        let constraint = match row.cmp {
            Cmp::Le => lhs.leq(row.rhs),
            Cmp::Ge => lhs.geq(row.rhs),
            Cmp::Eq => lhs.eq(row.rhs),
        };
        problem.add_constraint(constraint);
    }

    match problem.solve() {
        Ok(solution) => SolveOutcome {
            status: SolveStatus::Optimal,
            values: xs.iter().map(|x| solution.value(*x)).collect(),
        },
        Err(good_lp::ResolutionError::Infeasible) => {
            SolveOutcome::without_solution(SolveStatus::Infeasible)
        }
        Err(err) => SolveOutcome::without_solution(SolveStatus::Failed(err.to_string())),
    }
}
