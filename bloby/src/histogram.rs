//! 体数据强度直方图.

use crate::volume::{Volume, VolumeAttr};

/// 体数据中每个不同强度值及其体素个数. 按强度升序排列, 不包含计数为 0 的强度.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntensityHistogram {
    intensities: Vec<u16>,
    counts: Vec<u64>,
}

impl IntensityHistogram {
    /// 统计 `volume` 的强度直方图.
    pub fn from_volume(volume: &Volume) -> Self {
        // `u16` 的取值空间足够小, 直接计数.
        let mut bins = vec![0u64; u16::MAX as usize + 1];
        for &v in volume.data().iter() {
            bins[v as usize] += 1;
        }
        let (intensities, counts) = bins
            .into_iter()
            .enumerate()
            .filter(|(_, c)| *c != 0)
            .map(|(v, c)| (v as u16, c))
            .unzip();
        Self {
            intensities,
            counts,
        }
    }

    /// 不同强度值的个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.intensities.len()
    }

    /// 直方图是否为空 (即体数据不含体素)?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.intensities.is_empty()
    }

    /// 所有不同强度值, 升序.
    #[inline]
    pub fn intensities(&self) -> &[u16] {
        &self.intensities
    }

    /// 与 [`Self::intensities`] 一一对应的体素个数.
    #[inline]
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// 按强度升序迭代 `(强度, 体素个数)`.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (u16, u64)> + '_ {
        self.intensities
            .iter()
            .copied()
            .zip(self.counts.iter().copied())
    }

    /// 用于聚类的特征点 `[强度, 体素个数]`. 每个不同强度恰好出现一次.
    pub fn points(&self) -> Vec<[f64; 2]> {
        self.iter().map(|(v, c)| [v as f64, c as f64]).collect()
    }

    /// 体素总数.
    #[inline]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_histogram_distinct() {
        let v = Volume::from_shape_vec((1, 2, 3), vec![7, 0, 7, 65535, 0, 7]).unwrap();
        let h = v.histogram();
        assert_eq!(h.intensities(), &[0, 7, 65535]);
        assert_eq!(h.counts(), &[2, 3, 1]);
        assert_eq!(h.total(), 6);
        assert_eq!(h.points(), vec![[0.0, 2.0], [7.0, 3.0], [65535.0, 1.0]]);
    }

    #[test]
    fn test_histogram_empty() {
        let v = Volume::new(Array3::zeros((0, 4, 4)));
        let h = v.histogram();
        assert!(h.is_empty());
        assert_eq!(h.len(), 0);
        assert_eq!(h.total(), 0);
    }
}
