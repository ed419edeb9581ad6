//! Types for tensor-train time integration.

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::integrate::error::{IntegrateError, IntegrateResult};
use crate::sle::{MicroSolver, SleOptions, TtSolver};
use crate::tensor_train::TtNorm;

/// Fixed-step integration scheme for `dx/dt = A x`.
///
/// | Scheme | Order | Update |
/// |--------|-------|--------|
/// | ExplicitEuler | 1 | `x' = (I + hA) x` |
/// | SymmetrizedEuler | 2 | `x' = x_prev + 2hA x` |
/// | ImplicitEuler | 1 | `(I - hA) x' = x` |
/// | TrapezoidalRule | 2 | `(I - h/2 A) x' = (I + h/2 A) x` |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedStepMethod {
    /// Explicit Euler with truncation after every step.
    ExplicitEuler,
    /// Second order differencing (SOD), a time-symmetrized explicit Euler.
    ///
    /// The state before the first step is synthesized as `(I - hA) x_0`.
    SymmetrizedEuler,
    /// Implicit Euler; each step is one linear solve.
    ImplicitEuler,
    /// Trapezoidal rule; each step is one linear solve. Always normalized
    /// in the Manhattan norm.
    TrapezoidalRule,
}

impl FixedStepMethod {
    /// Label used for progress reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ExplicitEuler => "Running explicit Euler method",
            Self::SymmetrizedEuler => "Running time-symmetrized explicit Euler method",
            Self::ImplicitEuler => "Running implicit Euler method",
            Self::TrapezoidalRule => "Running trapezoidal rule",
        }
    }

    /// Returns true if steps require a linear solve.
    pub fn is_implicit(&self) -> bool {
        matches!(self, Self::ImplicitEuler | Self::TrapezoidalRule)
    }

    /// Order of accuracy.
    pub fn order(&self) -> usize {
        match self {
            Self::ExplicitEuler | Self::ImplicitEuler => 1,
            Self::SymmetrizedEuler | Self::TrapezoidalRule => 2,
        }
    }
}

impl FromStr for FixedStepMethod {
    type Err = IntegrateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "explicit_euler" => Ok(Self::ExplicitEuler),
            "sod" => Ok(Self::SymmetrizedEuler),
            "implicit_euler" => Ok(Self::ImplicitEuler),
            "trapezoidal_rule" => Ok(Self::TrapezoidalRule),
            other => Err(IntegrateError::invalid_configuration(
                "method",
                format!("unknown fixed-step method '{}'", other),
            )),
        }
    }
}

/// Secondary method of the embedded pair used by the adaptive controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecondMethod {
    /// Two implicit Euler half steps.
    #[default]
    TwoStepEuler,
    /// One trapezoidal step.
    TrapezoidalRule,
}

impl FromStr for SecondMethod {
    type Err = IntegrateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "two_step_Euler" => Ok(Self::TwoStepEuler),
            "trapezoidal_rule" => Ok(Self::TrapezoidalRule),
            other => Err(IntegrateError::invalid_configuration(
                "second_method",
                format!(
                    "unknown second method '{}', expected 'two_step_Euler' or 'trapezoidal_rule'",
                    other
                ),
            )),
        }
    }
}

/// Method that produced a [`TtOdeResult`](crate::integrate::TtOdeResult).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtOdeMethod {
    /// Fixed step sizes from a [`StepSizeSchedule`].
    Fixed(FixedStepMethod),
    /// Adaptive step size control with the given secondary method.
    Adaptive(SecondMethod),
}

/// Normalization applied to every new state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalization {
    /// Keep states as computed.
    None,
    /// Divide by the Manhattan norm (probability distributions).
    #[default]
    Manhattan,
    /// Divide by the Euclidean norm.
    Euclidean,
}

impl Normalization {
    /// Norm to divide by, if any.
    pub fn norm(&self) -> Option<TtNorm> {
        match self {
            Self::None => None,
            Self::Manhattan => Some(TtNorm::Manhattan),
            Self::Euclidean => Some(TtNorm::Euclidean),
        }
    }
}

impl TryFrom<u8> for Normalization {
    type Error = IntegrateError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Manhattan),
            2 => Ok(Self::Euclidean),
            other => Err(IntegrateError::invalid_configuration(
                "normalize",
                format!("expected 0, 1 or 2, got {}", other),
            )),
        }
    }
}

/// Step sizes of a fixed-step run, one per step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSizeSchedule {
    steps: Vec<f64>,
}

impl StepSizeSchedule {
    /// Build a schedule from positive, finite step sizes.
    pub fn new(steps: Vec<f64>) -> IntegrateResult<Self> {
        if let Some((i, h)) = steps.iter().enumerate().find(|(_, h)| !(h.is_finite() && **h > 0.0)) {
            return Err(IntegrateError::invalid_configuration(
                "step_sizes",
                format!("step {} has non-positive size {}", i, h),
            ));
        }
        Ok(Self { steps })
    }

    /// `n` steps of size `h`.
    pub fn uniform(h: f64, n: usize) -> IntegrateResult<Self> {
        Self::new(vec![h; n])
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.steps
    }

    /// Absolute times `[0, h_0, h_0 + h_1, ...]` of the trajectory.
    pub fn times(&self) -> Vec<f64> {
        let mut times = Vec::with_capacity(self.steps.len() + 1);
        let mut t = 0.0;
        times.push(t);
        for h in &self.steps {
            t += h;
            times.push(t);
        }
        times
    }
}

/// Options for fixed-step schemes.
#[derive(Debug, Clone)]
pub struct FixedStepOptions {
    /// Relative truncation threshold (default: 1e-12)
    pub threshold: f64,

    /// Maximum bond rank of every state (default: 50)
    pub max_rank: usize,

    /// Normalization of new states (default: Manhattan).
    ///
    /// Ignored by the trapezoidal rule, which always uses Manhattan.
    pub normalize: Normalization,

    /// Sweeps per linear solve (default: 1)
    pub repeats: usize,

    /// Sweep scheme of implicit steps (default: ALS)
    pub tt_solver: TtSolver,

    /// Local solver of implicit steps (default: dense solve)
    pub micro_solver: MicroSolver,

    /// Relative residual required from every linear solve (default: unchecked)
    pub residual_tol: Option<f64>,
}

impl Default for FixedStepOptions {
    fn default() -> Self {
        Self {
            threshold: 1e-12,
            max_rank: 50,
            normalize: Normalization::default(),
            repeats: 1,
            tt_solver: TtSolver::default(),
            micro_solver: MicroSolver::default(),
            residual_tol: None,
        }
    }
}

impl FixedStepOptions {
    /// Set truncation threshold and rank cap.
    pub fn truncation(mut self, threshold: f64, max_rank: usize) -> Self {
        self.threshold = threshold;
        self.max_rank = max_rank;
        self
    }

    /// Set the normalization.
    pub fn normalize(mut self, normalize: Normalization) -> Self {
        self.normalize = normalize;
        self
    }

    /// Set the sweep scheme and local solver of implicit steps.
    pub fn solver(mut self, tt_solver: TtSolver, micro_solver: MicroSolver) -> Self {
        self.tt_solver = tt_solver;
        self.micro_solver = micro_solver;
        self
    }

    /// Set the sweeps per linear solve.
    pub fn repeats(mut self, repeats: usize) -> Self {
        self.repeats = repeats;
        self
    }

    /// Require a relative residual below `tol` from every linear solve.
    pub fn residual_tol(mut self, tol: f64) -> Self {
        self.residual_tol = Some(tol);
        self
    }

    /// Linear solver configuration derived from these options.
    pub fn sle_options(&self) -> SleOptions {
        SleOptions {
            tt_solver: self.tt_solver,
            micro_solver: self.micro_solver,
            repeats: self.repeats,
            threshold: self.threshold,
            max_rank: self.max_rank,
            tolerance: self.residual_tol,
        }
    }

    /// Check that all numeric options are in range.
    pub fn validate(&self) -> IntegrateResult<()> {
        Ok(self.sle_options().validate()?)
    }
}

/// Options for the adaptive step size controller.
#[derive(Debug, Clone)]
pub struct AdaptiveOptions {
    /// First proposed step size (default: 1e-10)
    pub step_size_first: f64,

    /// Sweeps per linear solve (default: 1)
    pub repeats: usize,

    /// Sweep scheme of the linear solves (default: ALS)
    pub tt_solver: TtSolver,

    /// Local solver of the linear solves (default: dense solve)
    pub micro_solver: MicroSolver,

    /// Tolerance of the relative local error (default: 0.1)
    pub error_tol: f64,

    /// Tolerance of the relative change in closeness (default: 0.5)
    pub closeness_tol: f64,

    /// Integration stops once the step size falls to this value (default: 1e-14)
    pub step_size_min: f64,

    /// Upper bound on accepted step sizes (default: 10)
    pub step_size_max: f64,

    /// Integration stops once the closeness falls to this value (default: 1e-3)
    pub closeness_min: f64,

    /// Largest growth factor of the step size (default: 2)
    pub factor_max: f64,

    /// Safety factor applied to the error-based factors, in `(0, 1)` (default: 0.9)
    pub factor_safe: f64,

    /// Secondary method of the embedded pair (default: two implicit Euler half steps)
    pub second_method: SecondMethod,

    /// Relative truncation threshold used by MALS (default: 1e-12)
    pub threshold: f64,

    /// Maximum bond rank (default: 50)
    pub max_rank: usize,

    /// Relative residual required from every linear solve (default: unchecked)
    pub residual_tol: Option<f64>,

    /// Cooperative cancellation flag, checked before every step (default: none)
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for AdaptiveOptions {
    fn default() -> Self {
        Self {
            step_size_first: 1e-10,
            repeats: 1,
            tt_solver: TtSolver::default(),
            micro_solver: MicroSolver::default(),
            error_tol: 1e-1,
            closeness_tol: 0.5,
            step_size_min: 1e-14,
            step_size_max: 10.0,
            closeness_min: 1e-3,
            factor_max: 2.0,
            factor_safe: 0.9,
            second_method: SecondMethod::default(),
            threshold: 1e-12,
            max_rank: 50,
            residual_tol: None,
            cancel: None,
        }
    }
}

impl AdaptiveOptions {
    /// Set the first proposed step size.
    pub fn initial_step(mut self, h0: f64) -> Self {
        self.step_size_first = h0;
        self
    }

    /// Set step size bounds.
    pub fn step_bounds(mut self, min: f64, max: f64) -> Self {
        self.step_size_min = min;
        self.step_size_max = max;
        self
    }

    /// Set the local error and closeness tolerances.
    pub fn tolerances(mut self, error_tol: f64, closeness_tol: f64) -> Self {
        self.error_tol = error_tol;
        self.closeness_tol = closeness_tol;
        self
    }

    /// Set the closeness at which the run is considered stationary.
    pub fn closeness_min(mut self, closeness_min: f64) -> Self {
        self.closeness_min = closeness_min;
        self
    }

    /// Set the growth cap and safety factor of the step size.
    pub fn factors(mut self, factor_max: f64, factor_safe: f64) -> Self {
        self.factor_max = factor_max;
        self.factor_safe = factor_safe;
        self
    }

    /// Set the secondary method.
    pub fn second_method(mut self, second_method: SecondMethod) -> Self {
        self.second_method = second_method;
        self
    }

    /// Set the sweep scheme and local solver.
    pub fn solver(mut self, tt_solver: TtSolver, micro_solver: MicroSolver) -> Self {
        self.tt_solver = tt_solver;
        self.micro_solver = micro_solver;
        self
    }

    /// Set the sweeps per linear solve.
    pub fn repeats(mut self, repeats: usize) -> Self {
        self.repeats = repeats;
        self
    }

    /// Set truncation threshold and rank cap.
    pub fn truncation(mut self, threshold: f64, max_rank: usize) -> Self {
        self.threshold = threshold;
        self.max_rank = max_rank;
        self
    }

    /// Require a relative residual below `tol` from every linear solve.
    pub fn residual_tol(mut self, tol: f64) -> Self {
        self.residual_tol = Some(tol);
        self
    }

    /// Attach a cancellation flag.
    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Linear solver configuration derived from these options.
    pub fn sle_options(&self) -> SleOptions {
        SleOptions {
            tt_solver: self.tt_solver,
            micro_solver: self.micro_solver,
            repeats: self.repeats,
            threshold: self.threshold,
            max_rank: self.max_rank,
            tolerance: self.residual_tol,
        }
    }

    /// Check that all numeric options are in range.
    pub fn validate(&self) -> IntegrateResult<()> {
        self.sle_options().validate()?;

        let positive = [
            ("step_size_first", self.step_size_first),
            ("step_size_max", self.step_size_max),
            ("error_tol", self.error_tol),
            ("closeness_tol", self.closeness_tol),
            ("factor_max", self.factor_max),
            ("factor_safe", self.factor_safe),
        ];
        for (name, value) in positive {
            if !(value > 0.0) || value.is_infinite() {
                return Err(IntegrateError::invalid_configuration(
                    name,
                    format!("must be positive and finite, got {}", value),
                ));
            }
        }

        let nonnegative = [
            ("step_size_min", self.step_size_min),
            ("closeness_min", self.closeness_min),
        ];
        for (name, value) in nonnegative {
            if !(value >= 0.0) {
                return Err(IntegrateError::invalid_configuration(
                    name,
                    format!("must be nonnegative, got {}", value),
                ));
            }
        }

        if self.factor_safe >= 1.0 {
            return Err(IntegrateError::invalid_configuration(
                "factor_safe",
                format!("must lie in (0, 1), got {}", self.factor_safe),
            ));
        }

        if self.step_size_min > self.step_size_max {
            return Err(IntegrateError::invalid_configuration(
                "step_size_min",
                format!(
                    "exceeds step_size_max ({} > {})",
                    self.step_size_min, self.step_size_max
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_method_names() {
        assert_eq!(
            "explicit_euler".parse::<FixedStepMethod>().unwrap(),
            FixedStepMethod::ExplicitEuler
        );
        assert_eq!("sod".parse::<FixedStepMethod>().unwrap(), FixedStepMethod::SymmetrizedEuler);
        assert_eq!(
            "two_step_Euler".parse::<SecondMethod>().unwrap(),
            SecondMethod::TwoStepEuler
        );
        assert_eq!(
            "trapezoidal_rule".parse::<SecondMethod>().unwrap(),
            SecondMethod::TrapezoidalRule
        );
        assert!("two_step_euler".parse::<SecondMethod>().is_err());
        assert!("rk45".parse::<FixedStepMethod>().is_err());
    }

    #[test]
    fn test_normalization_from_u8() {
        assert_eq!(Normalization::try_from(0).unwrap(), Normalization::None);
        assert_eq!(Normalization::try_from(1).unwrap(), Normalization::Manhattan);
        assert_eq!(Normalization::try_from(2).unwrap(), Normalization::Euclidean);
        assert!(matches!(
            Normalization::try_from(3),
            Err(IntegrateError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_schedule() {
        let schedule = StepSizeSchedule::new(vec![0.1, 0.2, 0.3]).unwrap();
        let times = schedule.times();
        assert_eq!(times.len(), 4);
        assert!((times[3] - 0.6).abs() < 1e-15);

        assert!(StepSizeSchedule::new(vec![0.1, 0.0]).is_err());
        assert!(StepSizeSchedule::new(vec![f64::NAN]).is_err());
        assert!(StepSizeSchedule::uniform(-1.0, 3).is_err());
        assert!(StepSizeSchedule::uniform(0.1, 0).unwrap().is_empty());
    }

    #[test]
    fn test_adaptive_defaults_and_validation() {
        let opts = AdaptiveOptions::default();
        assert_eq!(opts.step_size_first, 1e-10);
        assert_eq!(opts.error_tol, 0.1);
        assert_eq!(opts.closeness_tol, 0.5);
        assert_eq!(opts.step_size_min, 1e-14);
        assert_eq!(opts.step_size_max, 10.0);
        assert_eq!(opts.closeness_min, 1e-3);
        assert_eq!(opts.factor_max, 2.0);
        assert_eq!(opts.factor_safe, 0.9);
        assert_eq!(opts.second_method, SecondMethod::TwoStepEuler);
        assert!(opts.validate().is_ok());

        assert!(AdaptiveOptions::default().initial_step(0.0).validate().is_err());
        assert!(AdaptiveOptions::default().factors(2.0, -0.1).validate().is_err());
        assert!(AdaptiveOptions::default().factors(2.0, 1.5).validate().is_err());
        assert!(AdaptiveOptions::default().factors(2.0, 1.0).validate().is_err());
        assert!(AdaptiveOptions::default().factors(3.0, 0.5).validate().is_ok());
        assert!(AdaptiveOptions::default().step_bounds(1.0, 0.5).validate().is_err());
        assert!(AdaptiveOptions::default().repeats(0).validate().is_err());
    }

    #[test]
    fn test_fixed_step_defaults() {
        let opts = FixedStepOptions::default();
        assert_eq!(opts.threshold, 1e-12);
        assert_eq!(opts.max_rank, 50);
        assert_eq!(opts.normalize, Normalization::Manhattan);
        assert!(opts.validate().is_ok());
        assert!(FixedStepOptions::default().truncation(1e-12, 0).validate().is_err());
    }
}
