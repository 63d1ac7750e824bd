//! 斑点质心.

use std::fmt;

use crate::consts::BACKGROUND_LABEL;
use crate::label::LabeledVolume;
use crate::volume::VolumeAttr;
use crate::Idx3d;

/// 斑点质心, 按 `(z, y, x)` 保存取整后的体素坐标.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Centroid {
    /// z 方向坐标 (切片索引).
    pub z: usize,

    /// y 方向坐标.
    pub y: usize,

    /// x 方向坐标.
    pub x: usize,
}

impl From<Idx3d> for Centroid {
    #[inline]
    fn from((z, y, x): Idx3d) -> Self {
        Self { z, y, x }
    }
}

impl From<Centroid> for Idx3d {
    #[inline]
    fn from(c: Centroid) -> Self {
        (c.z, c.y, c.x)
    }
}

impl fmt::Display for Centroid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.z, self.y, self.x)
    }
}

/// 将轴向平均坐标取整 (四舍六入五成双), 并限制在 `[0, len - 1]` 内.
#[inline]
fn round_axis(mean: f64, len: usize) -> usize {
    let max = len.saturating_sub(1) as f64;
    mean.round_ties_even().clamp(0.0, max) as usize
}

impl LabeledVolume {
    /// 计算每个非零标签区域的质心, 按标签升序返回.
    ///
    /// 质心是区域内体素坐标在每个轴上的算术平均值, 各轴独立取整.
    /// 返回的坐标保证位于体数据范围内.
    pub fn centroids(&self) -> Vec<Centroid> {
        let mut sums = vec![[0.0f64; 3]; self.len()];
        let mut counts = vec![0u64; self.len()];

        for ((z, y, x), &l) in self.data().indexed_iter() {
            if l == BACKGROUND_LABEL {
                continue;
            }
            let i = l as usize - 1;
            sums[i][0] += z as f64;
            sums[i][1] += y as f64;
            sums[i][2] += x as f64;
            counts[i] += 1;
        }

        let (sz, sy, sx) = self.shape();
        sums.iter()
            .zip(counts.iter())
            .map(|(s, &n)| {
                debug_assert!(n > 0);
                let n = n as f64;
                Centroid {
                    z: round_axis(s[0] / n, sz),
                    y: round_axis(s[1] / n, sy),
                    x: round_axis(s[2] / n, sx),
                }
            })
            .collect()
    }
}
