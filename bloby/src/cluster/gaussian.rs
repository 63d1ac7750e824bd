//! 二维正态分布的对数密度.

use std::f64::consts::TAU;

use nalgebra::{Matrix2, SymmetricEigen, Vector2};

use crate::consts::gmm::SINGULAR_COND;

/// 二维正态分布. 协方差矩阵对称, 但允许奇异.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Gaussian2 {
    pub(crate) mean: [f64; 2],
    pub(crate) cov: [[f64; 2]; 2],
}

impl Gaussian2 {
    /// 由均值与协方差矩阵创建分布. 不检查协方差的正定性.
    #[inline]
    pub fn new(mean: [f64; 2], cov: [[f64; 2]; 2]) -> Self {
        Self { mean, cov }
    }

    /// 均值向量.
    #[inline]
    pub fn mean(&self) -> [f64; 2] {
        self.mean
    }

    /// 协方差矩阵.
    #[inline]
    pub fn covariance(&self) -> [[f64; 2]; 2] {
        self.cov
    }

    #[inline]
    fn cov_matrix(&self) -> Matrix2<f64> {
        let [[a, b], [c, d]] = self.cov;
        Matrix2::new(a, b, c, d)
    }

    #[inline]
    fn centered(&self, x: &[f64; 2]) -> Vector2<f64> {
        Vector2::new(x[0] - self.mean[0], x[1] - self.mean[1])
    }

    /// 点 `x` 处的对数概率密度. 协方差不是正定矩阵时返回 `None`.
    pub fn log_pdf(&self, x: &[f64; 2]) -> Option<f64> {
        let chol = self.cov_matrix().cholesky()?;
        let d = self.centered(x);
        // 由 Cholesky 因子的对角线得到 ln|Σ|.
        let log_det = 2.0 * chol.l_dirty().diagonal().map(f64::ln).sum();
        let maha = d.dot(&chol.solve(&d));
        (log_det.is_finite() && maha.is_finite())
            .then(|| -0.5 * (2.0 * TAU.ln() + log_det + maha))
    }

    /// 点 `x` 处的对数概率密度, 容忍奇异协方差.
    ///
    /// 特征值不超过 `SINGULAR_COND * max|λ|` 的方向被视为退化方向,
    /// 使用伪逆与伪行列式计算, 秩相应降低.
    pub fn log_pdf_singular(&self, x: &[f64; 2]) -> f64 {
        let eig = SymmetricEigen::new(self.cov_matrix());
        let eps = SINGULAR_COND * eig.eigenvalues.amax();
        let d = self.centered(x);

        let mut rank = 0u32;
        let mut log_pdet = 0.0;
        let mut maha = 0.0;
        for (l, v) in eig
            .eigenvalues
            .iter()
            .zip(eig.eigenvectors.column_iter())
            .filter(|(l, _)| **l > eps)
        {
            let proj = v.dot(&d);
            rank += 1;
            log_pdet += l.ln();
            maha += proj * proj / l;
        }
        -0.5 * (rank as f64 * TAU.ln() + log_pdet + maha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_not_positive_definite() {
        let g = Gaussian2::new([0.0, 0.0], [[1.0, 2.0], [2.0, 1.0]]);
        assert_eq!(g.log_pdf(&[0.0, 0.0]), None);
        let g = Gaussian2::new([0.0, 0.0], [[-1.0, 0.0], [0.0, 1.0]]);
        assert_eq!(g.log_pdf(&[0.0, 0.0]), None);
    }

    #[test]
    fn test_rotated_singular_covariance() {
        // 方差全部集中在 (1, 1) 方向上, 方差为 2.
        let g = Gaussian2::new([0.0, 0.0], [[1.0, 1.0], [1.0, 1.0]]);
        assert_eq!(g.log_pdf(&[0.0, 0.0]), None);
        let one_d = -0.5 * (TAU.ln() + 2.0f64.ln());
        assert!(f64_eq(g.log_pdf_singular(&[0.0, 0.0]), one_d));
        // 垂直方向的偏移不影响密度.
        assert!(f64_eq(g.log_pdf_singular(&[3.0, -3.0]), one_d));
        // 沿 (1, 1) 方向偏移 sqrt(2), 马氏距离平方为 1.
        assert!(f64_eq(g.log_pdf_singular(&[1.0, 1.0]), one_d - 0.5));
    }

    #[test]
    fn test_standard_normal() {
        let g = Gaussian2::new([0.0, 0.0], [[1.0, 0.0], [0.0, 1.0]]);
        let expected = -TAU.ln();
        assert!(f64_eq(g.log_pdf(&[0.0, 0.0]).unwrap(), expected));
        assert!(f64_eq(g.log_pdf_singular(&[0.0, 0.0]), expected));
        assert!(f64_eq(g.log_pdf(&[1.0, 1.0]).unwrap(), expected - 1.0));
        assert!(f64_eq(g.log_pdf_singular(&[1.0, 1.0]), expected - 1.0));
    }

    #[test]
    fn test_correlated_agrees() {
        let g = Gaussian2::new([3.0, -1.0], [[2.0, 0.5], [0.5, 1.5]]);
        for x in [[3.0, -1.0], [0.0, 0.0], [10.0, 4.0]] {
            assert!(f64_eq(g.log_pdf(&x).unwrap(), g.log_pdf_singular(&x)));
        }
    }

    #[test]
    fn test_singular_covariance() {
        // 第二维方差为 0.
        let g = Gaussian2::new([5.0, 1.0], [[4.0, 0.0], [0.0, 0.0]]);
        assert_eq!(g.log_pdf(&[5.0, 1.0]), None);

        // 退化为一维正态分布, 只沿第一维衡量距离.
        let one_d = -0.5 * (TAU.ln() + 4.0f64.ln());
        assert!(f64_eq(g.log_pdf_singular(&[5.0, 1.0]), one_d));
        assert!(f64_eq(g.log_pdf_singular(&[5.0, 100.0]), one_d));
        assert!(f64_eq(g.log_pdf_singular(&[7.0, 1.0]), one_d - 0.5));
    }
}
