//! 强度聚类.
//!
//! 在体数据的 "不同强度值" 域上拟合高斯混合模型. 每个不同强度值以
//! `[强度, 体素个数]` 特征点的形式恰好参与一次拟合, 因此拟合规模只取决于
//! 不同强度的个数, 与体数据大小无关.
//!
//! 拟合完成后, 每个分量的代表强度是使该分量密度最大的那个不同强度值
//! (即经验众数), 而不是分量均值.

use itertools::izip;
use log::debug;
use ndarray::Array2;
use ordered_float::NotNan;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cmp::Reverse;

use crate::consts::{gmm, DEFAULT_COMPONENTS};
use crate::error::{BlobError, BlobResult, ConfigError, DataError};
use crate::histogram::IntensityHistogram;

mod gaussian;
mod kmeans;

pub use gaussian::Gaussian2;

/// 混合模型拟合参数.
///
/// 该结构是只读的, 修改参数请使用 `with_*` 系列方法得到新实例.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClusterConfig {
    components: usize,
    tol: f64,
    reg_covar: f64,
    max_iter: u32,
    kmeans_max_iter: u32,
    seed: Option<u64>,
}

impl Default for ClusterConfig {
    #[inline]
    fn default() -> Self {
        Self::new(DEFAULT_COMPONENTS)
    }
}

impl ClusterConfig {
    /// 以 `components` 个分量和默认参数构建配置. 初始化是随机的 (无种子).
    #[inline]
    pub const fn new(components: usize) -> Self {
        Self {
            components,
            tol: gmm::TOL,
            reg_covar: gmm::REG_COVAR,
            max_iter: gmm::MAX_ITER,
            kmeans_max_iter: gmm::KMEANS_MAX_ITER,
            seed: None,
        }
    }

    /// 固定随机种子, 使初始化 (从而整个拟合) 可复现.
    #[inline]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// 修改分量个数.
    #[inline]
    pub fn with_components(mut self, components: usize) -> Self {
        self.components = components;
        self
    }

    /// 修改 EM 收敛阈值.
    #[inline]
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// 修改协方差正则项.
    #[inline]
    pub fn with_reg_covar(mut self, reg_covar: f64) -> Self {
        self.reg_covar = reg_covar;
        self
    }

    /// 修改 EM 最大迭代次数.
    #[inline]
    pub fn with_max_iter(mut self, max_iter: u32) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// 修改 k-means 初始化的最大迭代次数.
    #[inline]
    pub fn with_kmeans_max_iter(mut self, kmeans_max_iter: u32) -> Self {
        self.kmeans_max_iter = kmeans_max_iter;
        self
    }

    /// 分量个数.
    #[inline]
    pub fn components(&self) -> usize {
        self.components
    }

    /// EM 收敛阈值.
    #[inline]
    pub fn tol(&self) -> f64 {
        self.tol
    }

    /// 协方差正则项.
    #[inline]
    pub fn reg_covar(&self) -> f64 {
        self.reg_covar
    }

    /// EM 最大迭代次数.
    #[inline]
    pub fn max_iter(&self) -> u32 {
        self.max_iter
    }

    /// k-means 初始化的最大迭代次数.
    #[inline]
    pub fn kmeans_max_iter(&self) -> u32 {
        self.kmeans_max_iter
    }

    /// 随机种子. `None` 代表每次从系统熵源初始化.
    #[inline]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// 检查参数是否合法.
    pub fn validate(&self) -> BlobResult<()> {
        if self.components == 0 {
            return Err(ConfigError::TooFewComponents(0).into());
        }
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.tol) || !positive(self.reg_covar) {
            return Err(ConfigError::InvalidTolerance.into());
        }
        if self.max_iter == 0 || self.kmeans_max_iter == 0 {
            return Err(ConfigError::ZeroIterations.into());
        }
        Ok(())
    }
}

/// 混合模型的单个分量.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Component {
    weight: f64,
    gaussian: Gaussian2,
}

impl Component {
    /// 混合权重.
    #[inline]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// 均值向量 `[强度, 体素个数]`.
    #[inline]
    pub fn mean(&self) -> [f64; 2] {
        self.gaussian.mean()
    }

    /// 协方差矩阵.
    #[inline]
    pub fn covariance(&self) -> [[f64; 2]; 2] {
        self.gaussian.covariance()
    }

    /// 该分量的正态分布.
    #[inline]
    pub fn gaussian(&self) -> &Gaussian2 {
        &self.gaussian
    }
}

/// 拟合完成的高斯混合模型. 拟合后不再修改.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClusterModel {
    components: Vec<Component>,
    iterations: u32,
    lower_bound: f64,
}

impl ClusterModel {
    /// 在 `hist` 的特征点上拟合混合模型.
    ///
    /// # 错误
    ///
    /// 1. `config` 非法时返回 `BlobError::Config`;
    /// 2. 直方图为空、不同强度值少于分量个数、EM 未收敛或数值失效时返回 `BlobError::Data`.
    pub fn fit(hist: &IntensityHistogram, config: &ClusterConfig) -> BlobResult<Self> {
        config.validate()?;
        let k = config.components;
        if hist.is_empty() {
            return Err(DataError::EmptyVolume.into());
        }
        if hist.len() < k {
            return Err(DataError::TooFewIntensities {
                distinct: hist.len(),
                components: k,
            }
            .into());
        }

        let points = hist.points();
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        // 由 k-means 的硬分配初始化责任矩阵.
        let labels = kmeans::kmeans(&points, k, config.kmeans_max_iter, &mut rng);
        let mut resp = Array2::<f64>::zeros((points.len(), k));
        for (i, &l) in labels.iter().enumerate() {
            resp[(i, l)] = 1.0;
        }
        let mut components = m_step(&points, &resp, config.reg_covar);

        let mut lower_bound = f64::NEG_INFINITY;
        for iter in 1..=config.max_iter {
            let prev = lower_bound;
            lower_bound = e_step(&points, &components, &mut resp)?;
            components = m_step(&points, &resp, config.reg_covar);

            let change = lower_bound - prev;
            debug!("EM iteration {iter}: lower bound {lower_bound:.6}, change {change:.6}");
            if change.abs() < config.tol {
                return Ok(Self {
                    components,
                    iterations: iter,
                    lower_bound,
                });
            }
        }
        Err(DataError::NotConverged {
            iterations: config.max_iter,
        }
        .into())
    }

    /// 分量个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// 是否不含任何分量? 拟合成功的模型总是返回 `false`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// 所有分量.
    #[inline]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// 收敛时的 EM 迭代次数.
    #[inline]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// 收敛时每个特征点的平均对数似然.
    #[inline]
    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    /// 每个分量的代表强度, 顺序与 [`Self::components`] 一致. 见 [`representatives`].
    #[inline]
    pub fn representatives(&self, hist: &IntensityHistogram) -> BlobResult<Vec<u16>> {
        representatives(hist, &self.components)
    }
}

/// 为每个分量选取代表强度.
///
/// 对每个分量, 在其 (容忍奇异协方差的) 正态分布下计算 `candidates`
/// 中每个特征点的对数密度, 取密度最大的点的强度值. 密度相同时取强度较小者.
/// 计算不按体素个数加权.
///
/// 返回值与 `components` 一一对应, 未排序. 若某个分量在所有候选点上的密度均为 NaN,
/// 返回 `DataError::IllConditioned`.
pub fn representatives(
    candidates: &IntensityHistogram,
    components: &[Component],
) -> BlobResult<Vec<u16>> {
    let points = candidates.points();
    components
        .iter()
        .map(|comp| {
            points
                .iter()
                .zip(candidates.intensities())
                .filter_map(|(p, &v)| {
                    NotNan::new(comp.gaussian.log_pdf_singular(p))
                        .ok()
                        .map(|d| (v, d))
                })
                .min_by_key(|(_, d)| Reverse(*d))
                .map(|(v, _)| v)
                .ok_or(BlobError::Data(DataError::IllConditioned))
        })
        .collect()
}

/// M 步: 由责任矩阵估计每个分量的权重、均值与协方差.
fn m_step(points: &[[f64; 2]], resp: &Array2<f64>, reg_covar: f64) -> Vec<Component> {
    let n = points.len() as f64;
    let mut components: Vec<Component> = resp
        .columns()
        .into_iter()
        .map(|r| {
            // 防止空分量除零.
            let nk = r.sum() + 10.0 * f64::EPSILON;

            let mut mean = [0.0; 2];
            for (p, w) in izip!(points, r.iter()) {
                mean[0] += w * p[0];
                mean[1] += w * p[1];
            }
            mean = [mean[0] / nk, mean[1] / nk];

            let mut cov = [[0.0; 2]; 2];
            for (p, w) in izip!(points, r.iter()) {
                let (d0, d1) = (p[0] - mean[0], p[1] - mean[1]);
                cov[0][0] += w * d0 * d0;
                cov[0][1] += w * d0 * d1;
                cov[1][1] += w * d1 * d1;
            }
            cov[0][0] = cov[0][0] / nk + reg_covar;
            cov[1][1] = cov[1][1] / nk + reg_covar;
            cov[0][1] /= nk;
            cov[1][0] = cov[0][1];

            Component {
                weight: nk / n,
                gaussian: Gaussian2::new(mean, cov),
            }
        })
        .collect();

    let total: f64 = components.iter().map(|c| c.weight).sum();
    components.iter_mut().for_each(|c| c.weight /= total);
    components
}

/// E 步: 原地更新责任矩阵, 返回每个特征点的平均对数似然.
fn e_step(
    points: &[[f64; 2]],
    components: &[Component],
    resp: &mut Array2<f64>,
) -> BlobResult<f64> {
    let mut log_prob = vec![0.0; components.len()];
    let mut total = 0.0;

    for (p, mut row) in izip!(points, resp.rows_mut()) {
        for (lp, comp) in log_prob.iter_mut().zip(components) {
            *lp = comp.gaussian.log_pdf(p).ok_or(DataError::IllConditioned)? + comp.weight.ln();
        }
        let norm = log_sum_exp(&log_prob);
        if !norm.is_finite() {
            return Err(DataError::IllConditioned.into());
        }
        for (r, lp) in row.iter_mut().zip(log_prob.iter()) {
            *r = (lp - norm).exp();
        }
        total += norm;
    }
    Ok(total / points.len() as f64)
}

/// 数值稳定的 `ln(Σ exp(x_i))`.
fn log_sum_exp(xs: &[f64]) -> f64 {
    let max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    max + xs.iter().map(|x| (x - max).exp()).sum::<f64>().ln()
}
