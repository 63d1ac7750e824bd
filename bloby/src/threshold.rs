//! 自适应阈值.
//!
//! 阈值取最亮与次亮两个聚类代表强度的中点. 在荧光图像典型的多峰强度分布下,
//! 真实信号簇与次亮簇之间的分界比全局均值 / 中位数更稳定.

use crate::error::{BlobResult, ConfigError};
use crate::mask::BinaryMask;
use crate::volume::{Volume, VolumeAttr};

/// 单个标量强度阈值.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Threshold(f64);

impl Threshold {
    /// 由各聚类代表强度计算阈值: `(max + second_max) / 2`.
    ///
    /// 代表强度少于 2 个时返回 `ConfigError::TooFewComponents`.
    pub fn from_representatives(representatives: &[u16]) -> BlobResult<Self> {
        let mut sorted = representatives.to_vec();
        sorted.sort_unstable();
        match sorted.as_slice() {
            [.., second, max] => Ok(Self((*max as f64 + *second as f64) / 2.0)),
            _ => Err(ConfigError::TooFewComponents(sorted.len()).into()),
        }
    }

    /// 阈值数值.
    #[inline]
    pub fn value(&self) -> f64 {
        self.0
    }

    /// 强度 `v` 是否属于前景?
    #[inline]
    pub fn is_foreground(&self, v: u16) -> bool {
        v as f64 >= self.0
    }

    /// 逐体素比较得到二值掩膜: 强度 `>=` 阈值为前景, 否则为背景.
    pub fn binary_mask(&self, volume: &Volume) -> BinaryMask {
        BinaryMask::new(volume.data().map(|&v| self.is_foreground(v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BlobError;

    #[test]
    fn test_threshold_two_brightest() {
        let t = Threshold::from_representatives(&[900, 10, 300]).unwrap();
        assert_eq!(t.value(), 600.0);

        let t = Threshold::from_representatives(&[0, 1000]).unwrap();
        assert_eq!(t.value(), 500.0);

        // 两个代表强度相同时阈值等于该强度.
        let t = Threshold::from_representatives(&[7, 7, 1]).unwrap();
        assert_eq!(t.value(), 7.0);
    }

    #[test]
    fn test_threshold_half_values() {
        let t = Threshold::from_representatives(&[1, 2]).unwrap();
        assert_eq!(t.value(), 1.5);
        assert!(t.is_foreground(2));
        assert!(!t.is_foreground(1));
    }

    #[test]
    fn test_threshold_too_few() {
        assert_eq!(
            Threshold::from_representatives(&[5]),
            Err(BlobError::Config(ConfigError::TooFewComponents(1)))
        );
        assert_eq!(
            Threshold::from_representatives(&[]),
            Err(BlobError::Config(ConfigError::TooFewComponents(0)))
        );
    }

    #[test]
    fn test_threshold_between_representatives() {
        let reps = [3u16, 65535, 120, 40000, 8];
        let t = Threshold::from_representatives(&reps).unwrap();
        let min = *reps.iter().min().unwrap() as f64;
        let max = *reps.iter().max().unwrap() as f64;
        assert!(min <= t.value() && t.value() <= max);
    }

    #[test]
    fn test_binary_mask_inclusive() {
        let v = Volume::from_shape_vec((1, 1, 4), vec![499, 500, 501, 0]).unwrap();
        let t = Threshold::from_representatives(&[0, 1000]).unwrap();
        let m = t.binary_mask(&v);
        assert_eq!(m.foreground_pos(), vec![(0, 0, 1), (0, 0, 2)]);
    }
}
