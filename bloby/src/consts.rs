//! 通用常量.

/// 连通区域标签中, 背景的标签值.
pub const BACKGROUND_LABEL: u32 = 0;

/// 默认强度聚类个数.
pub const DEFAULT_COMPONENTS: usize = 3;

/// 混合模型拟合的默认参数.
pub mod gmm {
    /// EM 收敛阈值 (平均对数似然下界的变化量).
    pub const TOL: f64 = 1e-3;

    /// 加在协方差矩阵对角线上的非负正则项, 保证协方差正定.
    pub const REG_COVAR: f64 = 1e-6;

    /// EM 最大迭代次数.
    pub const MAX_ITER: u32 = 100;

    /// k-means 初始化的最大迭代次数.
    pub const KMEANS_MAX_ITER: u32 = 300;

    /// 判定协方差特征值为零的相对阈值 (乘以最大特征值绝对值).
    pub const SINGULAR_COND: f64 = 1e6 * f64::EPSILON;
}
