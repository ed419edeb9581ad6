//! Interface stacks of the sweep solvers.
//!
//! For a system `A · x = b` the left stack at bond `k` is the contraction of
//! cores `0..k` of `xᵀ A x` (shape `[r_x, r_A, r_x]`) and of `xᵀ b` (shape
//! `[r_x, r_b]`). Right stacks are the mirror images over cores `k..d`.

use numr::error::Result;
use numr::runtime::Runtime;
use numr::tensor::Tensor;

use crate::tensor_train::TtClient;
use crate::tensor_train::host::{matmul_2d, permuted};

fn dims4<R: Runtime>(t: &Tensor<R>) -> [usize; 4] {
    let s = t.shape();
    [s[0], s[1], s[2], s[3]]
}

fn transposed<R: Runtime>(t: &Tensor<R>, shape: [usize; 2]) -> Result<Tensor<R>> {
    Ok(t.contiguous().reshape(&shape)?.transpose(0, 1)?.contiguous())
}

/// Left and right interface stacks, indexed by bond `0..=d`.
pub(crate) struct InterfaceStacks<R: Runtime> {
    left_a: Vec<Tensor<R>>,
    left_b: Vec<Tensor<R>>,
    right_a: Vec<Tensor<R>>,
    right_b: Vec<Tensor<R>>,
}

impl<R: Runtime> InterfaceStacks<R> {
    /// Stacks for a train of order `d`, all set to the trivial boundary.
    pub fn new(d: usize, device: &R::Device) -> Self {
        let a = Tensor::<R>::from_slice(&[1.0], &[1, 1, 1], device);
        let b = Tensor::<R>::from_slice(&[1.0], &[1, 1], device);
        Self {
            left_a: vec![a.clone(); d + 1],
            left_b: vec![b.clone(); d + 1],
            right_a: vec![a; d + 1],
            right_b: vec![b; d + 1],
        }
    }

    pub fn left(&self, bond: usize) -> (&Tensor<R>, &Tensor<R>) {
        (&self.left_a[bond], &self.left_b[bond])
    }

    pub fn right(&self, bond: usize) -> (&Tensor<R>, &Tensor<R>) {
        (&self.right_a[bond], &self.right_b[bond])
    }

    /// Extend the left stacks over core `k`, setting bond `k + 1`.
    pub fn push_left<C: TtClient<R>>(
        &mut self,
        client: &C,
        k: usize,
        x_core: &Tensor<R>,
        a_core: &Tensor<R>,
        b_core: &Tensor<R>,
    ) -> Result<()> {
        self.left_a[k + 1] = left_step_a(client, &self.left_a[k], x_core, a_core)?;
        self.left_b[k + 1] = left_step_b(client, &self.left_b[k], x_core, b_core)?;
        Ok(())
    }

    /// Extend the right stacks over core `k`, setting bond `k`.
    pub fn push_right<C: TtClient<R>>(
        &mut self,
        client: &C,
        k: usize,
        x_core: &Tensor<R>,
        a_core: &Tensor<R>,
        b_core: &Tensor<R>,
    ) -> Result<()> {
        self.right_a[k] = right_step_a(client, &self.right_a[k + 1], x_core, a_core)?;
        self.right_b[k] = right_step_b(client, &self.right_b[k + 1], x_core, b_core)?;
        Ok(())
    }
}

/// `LA'[q, β, q'] = Σ LA[p, α, p'] X[p, i, q] A[α, i, j, β] X[p', j, q']`
fn left_step_a<R, C>(client: &C, la: &Tensor<R>, x: &Tensor<R>, a: &Tensor<R>) -> Result<Tensor<R>>
where
    R: Runtime,
    C: TtClient<R>,
{
    let [p, m, _, q] = dims4(x);
    let [alpha, _, n, beta] = dims4(a);

    let la_perm = permuted(la, &[1, 2, 0])?;
    let t1 = matmul_2d(client, &la_perm, [alpha * p, p], x, [p, m * q])?
        .reshape(&[alpha, p, m, q])?;

    let t1 = permuted(&t1, &[1, 3, 0, 2])?;
    let t2 = matmul_2d(client, &t1, [p * q, alpha * m], a, [alpha * m, n * beta])?
        .reshape(&[p, q, n, beta])?;

    let t2 = permuted(&t2, &[1, 3, 0, 2])?;
    matmul_2d(client, &t2, [q * beta, p * n], x, [p * n, q])?.reshape(&[q, beta, q])
}

/// `Lb'[q, δ] = Σ Lb[p, γ] X[p, i, q] B[γ, i, δ]`
fn left_step_b<R, C>(client: &C, lb: &Tensor<R>, x: &Tensor<R>, b: &Tensor<R>) -> Result<Tensor<R>>
where
    R: Runtime,
    C: TtClient<R>,
{
    let [p, m, _, q] = dims4(x);
    let [gamma, _, _, delta] = dims4(b);

    let lb_t = transposed(lb, [p, gamma])?;
    let t1 = matmul_2d(client, &lb_t, [gamma, p], x, [p, m * q])?.reshape(&[gamma, m, q])?;

    let t1 = permuted(&t1, &[2, 0, 1])?;
    matmul_2d(client, &t1, [q, gamma * m], b, [gamma * m, delta])
}

/// `RA[q, β, q'] = Σ X[q, i, s] A[β, i, j, β'] RA'[s, β', s'] X[q', j, s']`
fn right_step_a<R, C>(client: &C, ra: &Tensor<R>, x: &Tensor<R>, a: &Tensor<R>) -> Result<Tensor<R>>
where
    R: Runtime,
    C: TtClient<R>,
{
    let [q, m, _, s] = dims4(x);
    let [beta, _, n, beta_next] = dims4(a);

    let t1 = matmul_2d(client, x, [q * m, s], ra, [s, beta_next * s])?
        .reshape(&[q, m, beta_next, s])?;
    let t1 = permuted(&t1, &[1, 2, 0, 3])?;

    let a_perm = permuted(a, &[0, 2, 1, 3])?;
    let t2 = matmul_2d(
        client,
        &a_perm,
        [beta * n, m * beta_next],
        &t1,
        [m * beta_next, q * s],
    )?
    .reshape(&[beta, n, q, s])?;

    let t2 = permuted(&t2, &[2, 0, 1, 3])?;
    let x_t = transposed(x, [q, n * s])?;
    matmul_2d(client, &t2, [q * beta, n * s], &x_t, [n * s, q])?.reshape(&[q, beta, q])
}

/// `Rb[q, γ] = Σ X[q, i, s] B[γ, i, δ] Rb'[s, δ]`
fn right_step_b<R, C>(client: &C, rb: &Tensor<R>, x: &Tensor<R>, b: &Tensor<R>) -> Result<Tensor<R>>
where
    R: Runtime,
    C: TtClient<R>,
{
    let [q, m, _, s] = dims4(x);
    let [gamma, _, _, delta] = dims4(b);

    let rb_t = transposed(rb, [s, delta])?;
    let t1 = matmul_2d(client, b, [gamma * m, delta], &rb_t, [delta, s])?;
    let t1_t = transposed(&t1, [gamma, m * s])?;
    matmul_2d(client, x, [q, m * s], &t1_t, [m * s, gamma])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor_train::TensorTrain;
    use numr::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};

    fn setup() -> (CpuDevice, CpuClient) {
        let device = CpuDevice::new();
        let client = CpuClient::new(device.clone());
        (device, client)
    }

    #[test]
    fn test_full_stacks_give_quadratic_forms() {
        let (device, client) = setup();
        let op = TensorTrain::<CpuRuntime>::kron_operator(
            &[vec![2.0, 1.0, 0.5, 3.0], vec![1.0, -1.0, 0.0, 2.0]],
            &[2, 2],
            &device,
        )
        .unwrap();
        let x = TensorTrain::<CpuRuntime>::kron_state(&[vec![1.0, 2.0], vec![0.5, -1.0]], &device).unwrap();
        let b = TensorTrain::<CpuRuntime>::kron_state(&[vec![3.0, 1.0], vec![2.0, 2.0]], &device).unwrap();

        let full_a = op.to_full().unwrap();
        let full_x = x.to_full().unwrap();
        let full_b = b.to_full().unwrap();
        let xax: f64 = (0..4)
            .map(|i| (0..4).map(|j| full_x[i] * full_a[i * 4 + j] * full_x[j]).sum::<f64>())
            .sum();
        let xb: f64 = (0..4).map(|i| full_x[i] * full_b[i]).sum();

        // Left to right
        let mut stacks = InterfaceStacks::<CpuRuntime>::new(2, &device);
        for k in 0..2 {
            stacks
                .push_left(&client, k, x.core(k), op.core(k), b.core(k))
                .unwrap();
        }
        let (la, lb) = stacks.left(2);
        let la: Vec<f64> = la.to_vec();
        let lb: Vec<f64> = lb.to_vec();
        assert!((la[0] - xax).abs() < 1e-12);
        assert!((lb[0] - xb).abs() < 1e-12);

        // Right to left
        let mut stacks = InterfaceStacks::<CpuRuntime>::new(2, &device);
        for k in (0..2).rev() {
            stacks
                .push_right(&client, k, x.core(k), op.core(k), b.core(k))
                .unwrap();
        }
        let (ra, rb) = stacks.right(0);
        let ra: Vec<f64> = ra.to_vec();
        let rb: Vec<f64> = rb.to_vec();
        assert!((ra[0] - xax).abs() < 1e-12);
        assert!((rb[0] - xb).abs() < 1e-12);
    }
}
