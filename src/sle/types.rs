//! Types for tensor-train linear solvers.

use std::str::FromStr;

use super::error::{SleError, SleResult};

/// Sweep scheme used to solve `A · x = b` in tensor-train format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TtSolver {
    /// Alternating linear scheme: one core at a time, ranks fixed by the guess.
    #[default]
    Als,
    /// Modified alternating linear scheme: two neighbouring cores at a time.
    ///
    /// Each solved supercore is split by a truncated SVD, so ranks adapt to
    /// `threshold` and `max_rank`.
    Mals,
}

impl FromStr for TtSolver {
    type Err = SleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "als" => Ok(Self::Als),
            "mals" => Ok(Self::Mals),
            other => Err(SleError::InvalidParameter {
                parameter: "tt_solver".to_string(),
                message: format!("unknown solver '{}', expected 'als' or 'mals'", other),
            }),
        }
    }
}

/// Dense solver used for the local (micro) systems of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MicroSolver {
    /// numr's dense linear solve.
    #[default]
    Solve,
    /// LU factorization with partial pivoting.
    Lu,
}

impl FromStr for MicroSolver {
    type Err = SleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "solve" => Ok(Self::Solve),
            "lu" => Ok(Self::Lu),
            other => Err(SleError::InvalidParameter {
                parameter: "micro_solver".to_string(),
                message: format!("unknown micro solver '{}', expected 'solve' or 'lu'", other),
            }),
        }
    }
}

/// Options for tensor-train linear solvers.
#[derive(Debug, Clone)]
pub struct SleOptions {
    /// Sweep scheme (default: ALS)
    pub tt_solver: TtSolver,

    /// Local solver (default: dense solve)
    pub micro_solver: MicroSolver,

    /// Number of double sweeps (default: 1)
    pub repeats: usize,

    /// Relative truncation threshold for MALS splits (default: 1e-12)
    pub threshold: f64,

    /// Rank cap for MALS splits (default: 50)
    pub max_rank: usize,

    /// Relative residual `‖A x - b‖ / ‖b‖` checked after the sweeps (default: unchecked)
    pub tolerance: Option<f64>,
}

impl Default for SleOptions {
    fn default() -> Self {
        Self {
            tt_solver: TtSolver::default(),
            micro_solver: MicroSolver::default(),
            repeats: 1,
            threshold: 1e-12,
            max_rank: 50,
            tolerance: None,
        }
    }
}

impl SleOptions {
    /// Set the sweep scheme.
    pub fn tt_solver(mut self, tt_solver: TtSolver) -> Self {
        self.tt_solver = tt_solver;
        self
    }

    /// Set the local solver.
    pub fn micro_solver(mut self, micro_solver: MicroSolver) -> Self {
        self.micro_solver = micro_solver;
        self
    }

    /// Set the number of double sweeps.
    pub fn repeats(mut self, repeats: usize) -> Self {
        self.repeats = repeats;
        self
    }

    /// Set the truncation parameters used by MALS.
    pub fn truncation(mut self, threshold: f64, max_rank: usize) -> Self {
        self.threshold = threshold;
        self.max_rank = max_rank;
        self
    }

    /// Require a relative residual below `tolerance`.
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Check that all numeric options are in range.
    pub fn validate(&self) -> SleResult<()> {
        if self.repeats == 0 {
            return Err(invalid("repeats", "must be at least 1"));
        }
        if self.max_rank == 0 {
            return Err(invalid("max_rank", "must be at least 1"));
        }
        if !(self.threshold >= 0.0) {
            return Err(invalid("threshold", "must be a nonnegative number"));
        }
        if let Some(tol) = self.tolerance {
            if !(tol > 0.0) {
                return Err(invalid("tolerance", "must be positive"));
            }
        }
        Ok(())
    }
}

fn invalid(parameter: &str, message: &str) -> SleError {
    SleError::InvalidParameter {
        parameter: parameter.to_string(),
        message: message.to_string(),
    }
}
