//! 运行时错误.
//!
//! 所有错误都对当前调用不可恢复: 要么返回完整结果, 要么整体失败,
//! 不存在 "部分成功".

use crate::Idx3d;
use std::fmt;

/// 检测 / 统计流程的顶层错误.
#[derive(Debug, Clone, PartialEq)]
pub enum BlobError {
    /// 参数配置错误, 如聚类个数 `k < 2`.
    Config(ConfigError),

    /// 输入数据无法支撑当前计算, 或混合模型拟合失败.
    Data(DataError),

    /// 原始体数据与区域标签体数据形状不一致.
    ShapeMismatch {
        /// 原始强度体数据形状 `(z, y, x)`.
        volume: Idx3d,

        /// 区域标签体数据形状 `(z, y, x)`.
        regions: Idx3d,
    },
}

/// 参数配置错误.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 聚类个数不足. 阈值计算至少需要 2 个聚类, 参数为实际给定的个数.
    TooFewComponents(usize),

    /// 收敛阈值或协方差正则项不是有限正数.
    InvalidTolerance,

    /// 最大迭代次数为 0.
    ZeroIterations,
}

/// 数据错误.
#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    /// 体数据不含任何体素.
    EmptyVolume,

    /// 不同强度值的个数少于聚类个数.
    TooFewIntensities {
        /// 体数据中不同强度值的个数.
        distinct: usize,

        /// 请求的聚类个数.
        components: usize,
    },

    /// EM 在给定迭代次数内未收敛.
    NotConverged {
        /// 已经执行的迭代次数.
        iterations: u32,
    },

    /// 拟合过程中出现非有限似然值, 或协方差矩阵非正定.
    IllConditioned,

    /// 扁平数据长度与给定形状不符.
    BadShape,
}

/// 检测 / 统计运行时结果.
pub type BlobResult<T> = Result<T, BlobError>;

impl BlobError {
    /// 是否为参数配置错误?
    #[inline]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// 是否为数据错误?
    #[inline]
    pub fn is_data(&self) -> bool {
        matches!(self, Self::Data(_))
    }
}

impl From<ConfigError> for BlobError {
    #[inline]
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<DataError> for BlobError {
    #[inline]
    fn from(e: DataError) -> Self {
        Self::Data(e)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewComponents(k) => {
                write!(f, "at least 2 intensity clusters are required, got {k}")
            }
            Self::InvalidTolerance => {
                f.write_str("tolerance and covariance regularization must be finite and positive")
            }
            Self::ZeroIterations => f.write_str("iteration limit must be non-zero"),
        }
    }
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyVolume => f.write_str("volume contains no voxels"),
            Self::TooFewIntensities {
                distinct,
                components,
            } => write!(
                f,
                "volume has {distinct} distinct intensities, cannot fit {components} clusters"
            ),
            Self::NotConverged { iterations } => {
                write!(f, "mixture fit did not converge after {iterations} iterations")
            }
            Self::IllConditioned => f.write_str("mixture fit became numerically ill-conditioned"),
            Self::BadShape => f.write_str("data length does not match the requested shape"),
        }
    }
}

impl fmt::Display for BlobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration error: {e}"),
            Self::Data(e) => write!(f, "data error: {e}"),
            Self::ShapeMismatch { volume, regions } => write!(
                f,
                "shape mismatch: volume is {volume:?}, region volume is {regions:?}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

impl std::error::Error for DataError {}

impl std::error::Error for BlobError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Data(e) => Some(e),
            Self::ShapeMismatch { .. } => None,
        }
    }
}
