//! CPU implementation of tensor-train algorithms.

use numr::error::Result;
use numr::runtime::cpu::{CpuClient, CpuRuntime};

use crate::tensor_train::impl_generic::{
    tt_add_impl, tt_dot_impl, tt_norm_impl, tt_ortho_impl, tt_ortho_left_impl,
    tt_ortho_right_impl, tt_scale_impl, tt_sub_impl,
};
use crate::tensor_train::{TensorTrain, TensorTrainAlgorithms, TtNorm};

impl TensorTrainAlgorithms<CpuRuntime> for CpuClient {
    fn tt_add(
        &self,
        a: &TensorTrain<CpuRuntime>,
        b: &TensorTrain<CpuRuntime>,
    ) -> Result<TensorTrain<CpuRuntime>> {
        tt_add_impl(self, a, b)
    }

    fn tt_sub(
        &self,
        a: &TensorTrain<CpuRuntime>,
        b: &TensorTrain<CpuRuntime>,
    ) -> Result<TensorTrain<CpuRuntime>> {
        tt_sub_impl(self, a, b)
    }

    fn tt_scale(&self, a: &TensorTrain<CpuRuntime>, alpha: f64) -> Result<TensorTrain<CpuRuntime>> {
        tt_scale_impl(self, a, alpha)
    }

    fn tt_dot(
        &self,
        a: &TensorTrain<CpuRuntime>,
        b: &TensorTrain<CpuRuntime>,
    ) -> Result<TensorTrain<CpuRuntime>> {
        tt_dot_impl(self, a, b)
    }

    fn tt_norm(&self, a: &TensorTrain<CpuRuntime>, norm: TtNorm) -> Result<f64> {
        tt_norm_impl(self, a, norm)
    }

    fn tt_ortho(
        &self,
        a: &TensorTrain<CpuRuntime>,
        threshold: f64,
        max_rank: usize,
    ) -> Result<TensorTrain<CpuRuntime>> {
        tt_ortho_impl(self, a, threshold, max_rank)
    }

    fn tt_ortho_left(
        &self,
        a: &TensorTrain<CpuRuntime>,
        threshold: f64,
        max_rank: usize,
    ) -> Result<TensorTrain<CpuRuntime>> {
        tt_ortho_left_impl(self, a, threshold, max_rank)
    }

    fn tt_ortho_right(
        &self,
        a: &TensorTrain<CpuRuntime>,
        threshold: f64,
        max_rank: usize,
    ) -> Result<TensorTrain<CpuRuntime>> {
        tt_ortho_right_impl(self, a, threshold, max_rank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use numr::runtime::cpu::CpuDevice;

    fn setup() -> (CpuDevice, CpuClient) {
        let device = CpuDevice::new();
        let client = CpuClient::new(device.clone());
        (device, client)
    }

    #[test]
    fn test_identity_application_and_norm() {
        let (device, client) = setup();
        let eye = TensorTrain::<CpuRuntime>::eye(&[2, 2, 2], &device).unwrap();
        let x = TensorTrain::<CpuRuntime>::kron_state(
            &[vec![0.5, 0.5], vec![0.1, 0.9], vec![1.0, 0.0]],
            &device,
        )
        .unwrap();

        let y = client.tt_dot(&eye, &x).unwrap();
        let diff = client.tt_sub(&y, &x).unwrap();
        assert!(client.tt_norm(&diff, TtNorm::Euclidean).unwrap() < 1e-14);
        assert!((client.tt_norm(&y, TtNorm::Manhattan).unwrap() - 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_scale_then_truncate_keeps_rank_one() {
        let (device, client) = setup();
        let x = TensorTrain::<CpuRuntime>::kron_state(&[vec![1.0, 2.0], vec![3.0, 4.0]], &device).unwrap();
        let doubled = client.tt_add(&x, &x).unwrap();
        let truncated = client.tt_ortho(&doubled, 1e-12, 50).unwrap();
        assert_eq!(truncated.rank(), 1);

        let expected = client.tt_scale(&x, 2.0).unwrap();
        let err = client
            .tt_norm(&client.tt_sub(&truncated, &expected).unwrap(), TtNorm::Euclidean)
            .unwrap();
        assert!(err < 1e-10);
    }
}
