//! 三维形态学分离.
//!
//! 在连通区域标记前对前景掩膜做一次三维二值腐蚀, 使相互接触的斑点分开.
//!
//! # 注意
//!
//! 是否腐蚀由聚类个数 `k` 决定 (见 [`ErosionPolicy::for_components`]):
//! `k == 2` 时直接标记原始掩膜, `k > 2` 时先腐蚀再标记. 因此 `k = 2`
//! 与 `k > 2` 的检测结果在性质上不同: 前者保留单体素斑点与细小结构,
//! 但相互接触的斑点会被合并; 后者能分开接触的斑点, 但会丢弃腐蚀后消失的小斑点.

use ndarray::{Array3, Zip};

use crate::mask::BinaryMask;
use crate::volume::VolumeAttr;

/// 标记前的形态学处理策略.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErosionPolicy {
    /// 不腐蚀, 直接标记阈值掩膜.
    Skip,

    /// 腐蚀一次后再标记.
    Erode,
}

impl ErosionPolicy {
    /// 由聚类个数决定策略: `k == 2` 时为 [`Self::Skip`], 否则为 [`Self::Erode`].
    #[inline]
    pub const fn for_components(k: usize) -> Self {
        if k == 2 {
            Self::Skip
        } else {
            Self::Erode
        }
    }

    /// 按照该策略处理 `mask`, 得到用于标记的掩膜.
    pub fn apply(&self, mask: BinaryMask) -> BinaryMask {
        match self {
            Self::Skip => mask,
            Self::Erode => mask.eroded(),
        }
    }
}

impl BinaryMask {
    /// 以 6-邻域 (钻石型) 结构元做一次三维二值腐蚀.
    ///
    /// 一个前景体素在腐蚀后仍为前景, 当且仅当它在数据范围内的 6 个邻居全为前景.
    /// 数据范围外的位置视为前景, 即边界不会额外腐蚀掩膜.
    pub fn eroded(&self) -> BinaryMask {
        let mut out = Array3::from_elem(self.shape(), false);
        let src = self.data();
        Zip::indexed(&mut out).and(&src).for_each(|pos, o, &fg| {
            *o = fg && self.diamond_neighbours(pos).into_iter().all(|n| src[n]);
        });
        BinaryMask::new(out)
    }
}
