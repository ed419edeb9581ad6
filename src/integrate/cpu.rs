//! CPU implementation of tensor-train integration.
#![allow(clippy::too_many_arguments)]

use numr::runtime::cpu::{CpuClient, CpuRuntime};

use crate::integrate::TtOdeAlgorithms;
use crate::integrate::error::IntegrateResult;
use crate::integrate::impl_generic::{
    TtOdeResult, adaptive_step_size_impl, errors_expl_euler_impl, errors_impl_euler_impl,
    errors_trapezoidal_impl, explicit_euler_impl, fixed_step_impl, implicit_euler_impl,
    sod_impl, trapezoidal_rule_impl,
};
use crate::integrate::ode::{AdaptiveOptions, FixedStepMethod, FixedStepOptions, StepSizeSchedule};
use crate::integrate::progress::ProgressReporter;
use crate::tensor_train::TensorTrain;

impl TtOdeAlgorithms<CpuRuntime> for CpuClient {
    fn explicit_euler(
        &self,
        operator: &TensorTrain<CpuRuntime>,
        initial_value: &TensorTrain<CpuRuntime>,
        step_sizes: &StepSizeSchedule,
        options: &FixedStepOptions,
        progress: &dyn ProgressReporter,
    ) -> IntegrateResult<TtOdeResult<CpuRuntime>> {
        explicit_euler_impl(self, operator, initial_value, step_sizes, options, progress)
    }

    fn sod(
        &self,
        operator: &TensorTrain<CpuRuntime>,
        initial_value: &TensorTrain<CpuRuntime>,
        step_sizes: &StepSizeSchedule,
        options: &FixedStepOptions,
        progress: &dyn ProgressReporter,
    ) -> IntegrateResult<TtOdeResult<CpuRuntime>> {
        sod_impl(self, operator, initial_value, step_sizes, options, progress)
    }

    fn implicit_euler(
        &self,
        operator: &TensorTrain<CpuRuntime>,
        initial_value: &TensorTrain<CpuRuntime>,
        initial_guess: &TensorTrain<CpuRuntime>,
        step_sizes: &StepSizeSchedule,
        options: &FixedStepOptions,
        progress: &dyn ProgressReporter,
    ) -> IntegrateResult<TtOdeResult<CpuRuntime>> {
        implicit_euler_impl(
            self,
            operator,
            initial_value,
            initial_guess,
            step_sizes,
            options,
            progress,
        )
    }

    fn trapezoidal_rule(
        &self,
        operator: &TensorTrain<CpuRuntime>,
        initial_value: &TensorTrain<CpuRuntime>,
        initial_guess: &TensorTrain<CpuRuntime>,
        step_sizes: &StepSizeSchedule,
        options: &FixedStepOptions,
        progress: &dyn ProgressReporter,
    ) -> IntegrateResult<TtOdeResult<CpuRuntime>> {
        trapezoidal_rule_impl(
            self,
            operator,
            initial_value,
            initial_guess,
            step_sizes,
            options,
            progress,
        )
    }

    fn solve_fixed_step(
        &self,
        method: FixedStepMethod,
        operator: &TensorTrain<CpuRuntime>,
        initial_value: &TensorTrain<CpuRuntime>,
        initial_guess: Option<&TensorTrain<CpuRuntime>>,
        step_sizes: &StepSizeSchedule,
        options: &FixedStepOptions,
        progress: &dyn ProgressReporter,
    ) -> IntegrateResult<TtOdeResult<CpuRuntime>> {
        fixed_step_impl(
            self,
            method,
            operator,
            initial_value,
            initial_guess,
            step_sizes,
            options,
            progress,
        )
    }

    fn errors_expl_euler(
        &self,
        operator: &TensorTrain<CpuRuntime>,
        solution: &[TensorTrain<CpuRuntime>],
        step_sizes: &StepSizeSchedule,
    ) -> IntegrateResult<Vec<f64>> {
        errors_expl_euler_impl(self, operator, solution, step_sizes)
    }

    fn errors_impl_euler(
        &self,
        operator: &TensorTrain<CpuRuntime>,
        solution: &[TensorTrain<CpuRuntime>],
        step_sizes: &StepSizeSchedule,
    ) -> IntegrateResult<Vec<f64>> {
        errors_impl_euler_impl(self, operator, solution, step_sizes)
    }

    fn errors_trapezoidal(
        &self,
        operator: &TensorTrain<CpuRuntime>,
        solution: &[TensorTrain<CpuRuntime>],
        step_sizes: &StepSizeSchedule,
    ) -> IntegrateResult<Vec<f64>> {
        errors_trapezoidal_impl(self, operator, solution, step_sizes)
    }

    fn adaptive_step_size(
        &self,
        operator: &TensorTrain<CpuRuntime>,
        initial_value: &TensorTrain<CpuRuntime>,
        initial_guess: &TensorTrain<CpuRuntime>,
        time_end: f64,
        options: &AdaptiveOptions,
        progress: &dyn ProgressReporter,
    ) -> IntegrateResult<TtOdeResult<CpuRuntime>> {
        adaptive_step_size_impl(
            self,
            operator,
            initial_value,
            initial_guess,
            time_end,
            options,
            progress,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrate::error::IntegrateError;
    use crate::integrate::ode::{Normalization, SecondMethod, TtOdeMethod};
    use crate::integrate::progress::NoProgress;
    use crate::sle::{MicroSolver, SleError, TtSolver};
    use crate::tensor_train::{TensorTrainAlgorithms, TtNorm};
    use numr::runtime::cpu::CpuDevice;
    use std::cell::RefCell;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    fn setup() -> (CpuDevice, CpuClient) {
        let device = CpuDevice::new();
        let client = CpuClient::new(device.clone());
        (device, client)
    }

    fn minus_identity(client: &CpuClient, device: &CpuDevice) -> TensorTrain<CpuRuntime> {
        let eye = TensorTrain::<CpuRuntime>::eye(&[2, 2], device).unwrap();
        client.tt_scale(&eye, -1.0).unwrap()
    }

    fn product_state(device: &CpuDevice) -> TensorTrain<CpuRuntime> {
        TensorTrain::<CpuRuntime>::kron_state(&[vec![0.5, 0.5], vec![0.2, 0.8]], device).unwrap()
    }

    /// Two independent two-state Markov chains, `G ⊗ I + I ⊗ G`.
    ///
    /// The stationary distribution is `[1/3, 2/3] ⊗ [1/3, 2/3]`.
    fn markov_generator(client: &CpuClient, device: &CpuDevice) -> TensorTrain<CpuRuntime> {
        let g = vec![-1.0, 0.5, 1.0, -0.5];
        let eye = vec![1.0, 0.0, 0.0, 1.0];
        let left = TensorTrain::<CpuRuntime>::kron_operator(&[g.clone(), eye.clone()], &[2, 2], device)
            .unwrap();
        let right = TensorTrain::<CpuRuntime>::kron_operator(&[eye, g], &[2, 2], device).unwrap();
        client.tt_add(&left, &right).unwrap()
    }

    /// Rank-2 guess; ranks `[1, 2, 1]` cover every state of a 2x2 system.
    fn markov_guess(client: &CpuClient, device: &CpuDevice) -> TensorTrain<CpuRuntime> {
        let corner = TensorTrain::<CpuRuntime>::kron_state(&[vec![1.0, 0.0], vec![1.0, 0.0]], device)
            .unwrap();
        let flat = TensorTrain::<CpuRuntime>::kron_state(&[vec![0.5, 0.5], vec![0.5, 0.5]], device)
            .unwrap();
        client.tt_add(&corner, &flat).unwrap()
    }

    fn euclidean(client: &CpuClient, x: &TensorTrain<CpuRuntime>) -> f64 {
        client.tt_norm(x, TtNorm::Euclidean).unwrap()
    }

    #[test]
    fn test_explicit_euler_decay() {
        let (device, client) = setup();
        let a = minus_identity(&client, &device);
        let x0 = product_state(&device);
        let steps = StepSizeSchedule::uniform(0.1, 10).unwrap();
        let options = FixedStepOptions::default().normalize(Normalization::None);

        let result = client
            .explicit_euler(&a, &x0, &steps, &options, &NoProgress)
            .unwrap();

        assert!(result.success);
        assert_eq!(result.method, TtOdeMethod::Fixed(FixedStepMethod::ExplicitEuler));
        assert_eq!(result.y.len(), 11);
        assert_eq!(result.t.len(), 11);
        assert!((result.t[10] - 1.0).abs() < 1e-12);
        assert_eq!(result.nsolve, 0);
        for pair in result.y.windows(2) {
            let ratio = euclidean(&client, &pair[1]) / euclidean(&client, &pair[0]);
            assert!((ratio - 0.9).abs() < 1e-12, "ratio {}", ratio);
        }
        for state in &result.y {
            assert!(state.rank() <= options.max_rank);
        }

        let errors = client.errors_expl_euler(&a, &result.y, &steps).unwrap();
        assert_eq!(errors.len(), 10);
        assert!(errors.iter().all(|&e| e < 1e-12));
    }

    #[test]
    fn test_error_metrics_resolve_exact_steps() {
        let (device, client) = setup();
        let a = minus_identity(&client, &device);
        let guess = markov_guess(&client, &device);
        let total = client.tt_norm(&guess, TtNorm::Manhattan).unwrap();
        let x0 = client.tt_scale(&guess, 1.0 / total).unwrap();
        let steps = StepSizeSchedule::uniform(0.1, 10).unwrap();
        let options = FixedStepOptions::default().normalize(Normalization::None);

        let result = client
            .explicit_euler(&a, &x0, &steps, &options, &NoProgress)
            .unwrap();
        assert!(result.success);
        assert_eq!(result.y[0].ranks(), &[1, 2, 1]);

        // Residuals of exact steps sit at rounding level, far below sqrt(eps)
        let errors = client.errors_expl_euler(&a, &result.y, &steps).unwrap();
        assert_eq!(errors.len(), 10);
        for e in errors {
            assert!(e < 1e-12, "residual {}", e);
        }
    }

    #[test]
    fn test_implicit_euler_decay() {
        let (device, client) = setup();
        let a = minus_identity(&client, &device);
        let x0 = product_state(&device);
        let steps = StepSizeSchedule::uniform(0.1, 10).unwrap();
        let options = FixedStepOptions::default().normalize(Normalization::None);

        let result = client
            .implicit_euler(&a, &x0, &x0, &steps, &options, &NoProgress)
            .unwrap();

        assert!(result.success);
        assert_eq!(result.nsolve, 10);
        for pair in result.y.windows(2) {
            let ratio = euclidean(&client, &pair[1]) / euclidean(&client, &pair[0]);
            assert!((ratio - 1.0 / 1.1).abs() < 1e-10, "ratio {}", ratio);
        }

        let errors = client.errors_impl_euler(&a, &result.y, &steps).unwrap();
        assert!(errors.iter().all(|&e| e < 1e-10));
    }

    #[test]
    fn test_trapezoidal_rule_stays_normalized() {
        let (device, client) = setup();
        let a = minus_identity(&client, &device);
        let x0 = product_state(&device);
        let steps = StepSizeSchedule::uniform(0.1, 10).unwrap();
        // Normalization setting is ignored by the trapezoidal rule
        let options = FixedStepOptions::default().normalize(Normalization::None);

        let result = client
            .trapezoidal_rule(&a, &x0, &x0, &steps, &options, &NoProgress)
            .unwrap();

        assert!(result.success);
        for state in &result.y {
            let total = client.tt_norm(state, TtNorm::Manhattan).unwrap();
            assert!((total - 1.0).abs() < 1e-12);
        }

        // Each unnormalized step scales by 0.95 / 1.05, so consecutive
        // normalized states are equal and the residual is 0.1 / 0.95.
        let errors = client.errors_trapezoidal(&a, &result.y, &steps).unwrap();
        for e in errors {
            assert!((e - 0.1 / 0.95).abs() < 1e-10, "error {}", e);
        }
    }

    #[test]
    fn test_sod_recursion() {
        let (device, client) = setup();
        let a = minus_identity(&client, &device);
        let x0 = product_state(&device);
        let steps = StepSizeSchedule::uniform(0.1, 2).unwrap();
        let options = FixedStepOptions::default().normalize(Normalization::None);

        let result = client.sod(&a, &x0, &steps, &options, &NoProgress).unwrap();

        // x_{-1} = 1.1 x0, x1 = 1.1 x0 - 0.2 x0, x2 = x0 - 0.2 x1
        let base = x0.to_full().unwrap();
        for (scale, state) in [(0.9, &result.y[1]), (0.82, &result.y[2])] {
            for (got, want) in state.to_full().unwrap().iter().zip(&base) {
                assert!((got - scale * want).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_solve_fixed_step_dispatch() {
        let (device, client) = setup();
        let a = markov_generator(&client, &device);
        let x0 = TensorTrain::<CpuRuntime>::kron_state(&[vec![1.0, 0.0], vec![1.0, 0.0]], &device)
            .unwrap();
        let guess = markov_guess(&client, &device);
        let steps = StepSizeSchedule::new(vec![0.05, 0.1, 0.2]).unwrap();
        let options = FixedStepOptions::default();

        let direct = client
            .implicit_euler(&a, &x0, &guess, &steps, &options, &NoProgress)
            .unwrap();
        let dispatched = client
            .solve_fixed_step(
                FixedStepMethod::ImplicitEuler,
                &a,
                &x0,
                Some(&guess),
                &steps,
                &options,
                &NoProgress,
            )
            .unwrap();

        assert_eq!(direct.t, dispatched.t);
        for (x, y) in direct.y.iter().zip(&dispatched.y) {
            for (u, v) in x.to_full().unwrap().iter().zip(y.to_full().unwrap()) {
                assert!((u - v).abs() < 1e-14);
            }
        }
        let errors = client.errors_impl_euler(&a, &direct.y, &steps).unwrap();
        assert!(errors.iter().all(|&e| e < 1e-10), "{:?}", errors);
    }

    #[test]
    fn test_implicit_euler_with_mals_respects_rank_bound() {
        let (device, client) = setup();
        let a = markov_generator(&client, &device);
        let x0 = TensorTrain::<CpuRuntime>::kron_state(&[vec![1.0, 0.0], vec![1.0, 0.0]], &device)
            .unwrap();
        let steps = StepSizeSchedule::uniform(0.1, 5).unwrap();

        let options = FixedStepOptions::default().solver(TtSolver::Mals, MicroSolver::Lu);
        let result = client
            .implicit_euler(&a, &x0, &x0, &steps, &options, &NoProgress)
            .unwrap();
        assert!(result.success);
        let errors = client.errors_impl_euler(&a, &result.y, &steps).unwrap();
        assert!(errors.iter().all(|&e| e < 1e-8), "{:?}", errors);

        let capped = FixedStepOptions::default()
            .solver(TtSolver::Mals, MicroSolver::Solve)
            .truncation(1e-12, 1);
        let result = client
            .implicit_euler(&a, &x0, &x0, &steps, &capped, &NoProgress)
            .unwrap();
        assert!(result.y.iter().all(|x| x.rank() <= 1));
    }

    #[test]
    fn test_explicit_euler_truncates_to_max_rank() {
        let (device, client) = setup();
        let a = markov_generator(&client, &device);
        let x0 = markov_guess(&client, &device);
        let steps = StepSizeSchedule::uniform(0.05, 4).unwrap();
        let options = FixedStepOptions::default().truncation(1e-12, 1);

        let result = client
            .explicit_euler(&a, &x0, &steps, &options, &NoProgress)
            .unwrap();
        assert!(result.y[1..].iter().all(|x| x.rank() <= 1));
    }

    #[test]
    fn test_adaptive_terminates_by_closeness() {
        let (device, client) = setup();
        let a = markov_generator(&client, &device);
        let x0 = TensorTrain::<CpuRuntime>::kron_state(&[vec![1.0, 0.0], vec![1.0, 0.0]], &device)
            .unwrap();
        let guess = markov_guess(&client, &device);
        let time_end = 100.0;
        let options = AdaptiveOptions::default().initial_step(1e-2).closeness_min(1e-2);

        let result = client
            .adaptive_step_size(&a, &x0, &guess, time_end, &options, &NoProgress)
            .unwrap();

        assert!(result.success, "{:?}", result.message);
        assert_eq!(result.method, TtOdeMethod::Adaptive(SecondMethod::TwoStepEuler));
        assert_eq!(result.t.len(), result.y.len());
        assert_eq!(result.t[0], 0.0);
        assert!(result.t.windows(2).all(|w| w[1] > w[0]));
        assert!(*result.t.last().unwrap() < time_end);
        assert_eq!(result.nsolve, 3 * (result.naccept + result.nreject));

        let last = result.y_final().unwrap();
        let applied = client.tt_dot(&a, last).unwrap();
        assert!(euclidean(&client, &applied) <= options.closeness_min);
        for state in &result.y[1..] {
            let total = client.tt_norm(state, TtNorm::Manhattan).unwrap();
            assert!((total - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_adaptive_rejects_oversized_first_step() {
        let (device, client) = setup();
        let a = markov_generator(&client, &device);
        let x0 = TensorTrain::<CpuRuntime>::kron_state(&[vec![1.0, 0.0], vec![1.0, 0.0]], &device)
            .unwrap();
        let guess = markov_guess(&client, &device);
        let options = AdaptiveOptions::default()
            .initial_step(5.0)
            .second_method(SecondMethod::TrapezoidalRule);

        let result = client
            .adaptive_step_size(&a, &x0, &guess, 50.0, &options, &NoProgress)
            .unwrap();

        assert!(result.success);
        assert!(result.nreject >= 1);
        // The rejected proposal left no state behind; the first accepted step is shorter
        assert!(result.t.len() >= 2);
        assert!(result.t[1] > 0.0 && result.t[1] <= options.factor_safe * 5.0);
        assert_eq!(result.nsolve, 2 * (result.naccept + result.nreject));
    }

    #[test]
    fn test_adaptive_accepts_stationary_state() {
        let (device, client) = setup();
        let a = minus_identity(&client, &device);
        // Normalization maps every implicit step back onto x0, so the local
        // error and the closeness change both vanish
        let x0 = TensorTrain::<CpuRuntime>::kron_state(&[vec![0.5, 0.5], vec![0.5, 0.5]], &device)
            .unwrap();
        let options = AdaptiveOptions::default().initial_step(0.5);

        let result = client
            .adaptive_step_size(&a, &x0, &x0, 5.0, &options, &NoProgress)
            .unwrap();

        assert!(result.success, "{:?}", result.message);
        assert_eq!(result.nreject, 0);
        assert!(result.naccept >= 1);
        assert_eq!(result.t.len(), result.naccept + 1);
        assert!((result.t[result.t.len() - 1] - 5.0).abs() < 1e-12);
        for pair in result.t.windows(2) {
            assert!(pair[1] > pair[0]);
        }
        let base = x0.to_full().unwrap();
        for (got, want) in result.y_final().unwrap().to_full().unwrap().iter().zip(&base) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn test_adaptive_cancellation_keeps_initial_state() {
        let (device, client) = setup();
        let a = markov_generator(&client, &device);
        let x0 = TensorTrain::<CpuRuntime>::kron_state(&[vec![1.0, 0.0], vec![1.0, 0.0]], &device)
            .unwrap();
        let flag = Arc::new(AtomicBool::new(true));
        let options = AdaptiveOptions::default().cancel_flag(flag);

        let result = client
            .adaptive_step_size(&a, &x0, &x0, 1.0, &options, &NoProgress)
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.y.len(), 1);
        assert!(matches!(result.failure, Some(IntegrateError::Cancelled { t }) if t == 0.0));
    }

    #[test]
    fn test_solver_failure_returns_partial_trajectory() {
        let (device, client) = setup();
        // I - h A is singular for h = 1
        let a = TensorTrain::<CpuRuntime>::kron_operator(&[vec![1.0, 0.0, 0.0, 0.0]], &[2], &device)
            .unwrap();
        let x0 = TensorTrain::<CpuRuntime>::kron_state(&[vec![0.5, 0.5]], &device).unwrap();
        let steps = StepSizeSchedule::new(vec![0.5, 1.0, 0.5]).unwrap();
        let options = FixedStepOptions::default()
            .normalize(Normalization::None)
            .solver(TtSolver::Als, MicroSolver::Lu);

        let result = client
            .implicit_euler(&a, &x0, &x0, &steps, &options, &NoProgress)
            .unwrap();

        assert!(!result.success);
        assert!(result.message.is_some());
        assert_eq!(result.t, vec![0.0, 0.5]);
        assert_eq!(result.y.len(), 2);
        assert_eq!(result.nsolve, 1);
        let full = result.y[1].to_full().unwrap();
        assert!((full[0] - 1.0).abs() < 1e-12);
        assert!((full[1] - 0.5).abs() < 1e-12);
        assert!(matches!(
            result.failure,
            Some(IntegrateError::SolverFailure {
                t: Some(t),
                reason: SleError::SingularMicroSystem { .. },
            }) if t == 0.5
        ));
        assert!(result.into_result().is_err());
    }

    #[test]
    fn test_invalid_input_fails_before_stepping() {
        let (device, client) = setup();
        let a = minus_identity(&client, &device);
        let wrong = TensorTrain::<CpuRuntime>::kron_state(&[vec![1.0, 0.0, 0.0]], &device).unwrap();
        let x0 = product_state(&device);
        let steps = StepSizeSchedule::uniform(0.1, 3).unwrap();

        assert!(matches!(
            client.explicit_euler(&a, &wrong, &steps, &FixedStepOptions::default(), &NoProgress),
            Err(IntegrateError::InvalidInput { .. })
        ));
        assert!(matches!(
            client.implicit_euler(
                &a,
                &x0,
                &x0,
                &steps,
                &FixedStepOptions::default().repeats(0),
                &NoProgress
            ),
            Err(IntegrateError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            client.adaptive_step_size(&a, &x0, &x0, -1.0, &AdaptiveOptions::default(), &NoProgress),
            Err(IntegrateError::InvalidConfiguration { .. })
        ));
        // Trajectory longer than the schedule
        let too_long = vec![x0.clone(); 5];
        assert!(client.errors_expl_euler(&a, &too_long, &steps).is_err());
    }

    #[test]
    fn test_progress_reports() {
        let (device, client) = setup();
        let a = minus_identity(&client, &device);
        let x0 = product_state(&device);
        let steps = StepSizeSchedule::uniform(0.1, 4).unwrap();

        let seen = RefCell::new(Vec::new());
        let reporter = |label: &str, percent: f64, _elapsed: f64| {
            seen.borrow_mut().push((label.to_string(), percent));
        };
        client
            .explicit_euler(&a, &x0, &steps, &FixedStepOptions::default(), &reporter)
            .unwrap();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 5);
        assert!(seen.iter().all(|(label, _)| label == "Running explicit Euler method"));
        let percents: Vec<f64> = seen.iter().map(|(_, p)| *p).collect();
        assert_eq!(percents, vec![0.0, 25.0, 50.0, 75.0, 100.0]);
    }
}
