//! 合成体数据 (phantom).
//!
//! 背景、弱自发荧光与亮斑三个强度水平, 外加均匀噪声. 所有生成器都由种子决定, 结果可复现.

use bloby::{Idx3d, Volume};
use ndarray::Array3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 背景强度.
pub const BACKGROUND: u16 = 100;

/// 弱自发荧光强度.
pub const DIM: u16 = 400;

/// 亮斑强度.
pub const BRIGHT: u16 = 1000;

/// 合成体数据及其真实斑点中心.
#[derive(Debug, Clone)]
pub struct Phantom {
    /// 强度体数据.
    pub volume: Volume,

    /// 每个亮斑的中心, 按生成顺序.
    pub centres: Vec<Idx3d>,
}

/// 在 `data` 中填充以 `c` 为中心、半径为 `r` 的实心球. 只会提高已有强度.
fn ball(data: &mut Array3<u16>, c: Idx3d, r: usize, value: u16) {
    let r2 = (r * r) as isize;
    for ((z, y, x), v) in data.indexed_iter_mut() {
        let dz = z as isize - c.0 as isize;
        let dy = y as isize - c.1 as isize;
        let dx = x as isize - c.2 as isize;
        if dz * dz + dy * dy + dx * dx <= r2 {
            *v = (*v).max(value);
        }
    }
}

/// 对每个体素叠加 `[0, amp]` 均匀噪声.
fn add_noise(data: &mut Array3<u16>, amp: u16, rng: &mut StdRng) {
    if amp == 0 {
        return;
    }
    data.iter_mut()
        .for_each(|v| *v = v.saturating_add(rng.random_range(0..=amp)));
}

/// `n` 对相切亮球. 每对球沿 x 方向排列, 球心距恰为 `2 * radius`,
/// 两球在切点处共享一个体素. 另在体数据一角放置一个弱自发荧光块.
///
/// 返回的 `centres` 中相邻两项为同一对球.
pub fn touching_pairs(shape: Idx3d, n: usize, radius: usize, noise: u16, seed: u64) -> Phantom {
    let (sz, sy, sx) = shape;
    let mut data = Array3::from_elem(shape, BACKGROUND);
    let mut centres = Vec::with_capacity(2 * n);

    let z = sz / 2;
    let xm = sx / 2;
    for i in 0..n {
        let y = (i + 1) * sy / (n + 1);
        for c in [(z, y, xm - radius), (z, y, xm + radius)] {
            ball(&mut data, c, radius, BRIGHT);
            centres.push(c);
        }
    }
    data.slice_mut(ndarray::s![0..sz / 4, 0..sy / 4, 0..sx / 4])
        .fill(DIM);

    let mut rng = StdRng::seed_from_u64(seed);
    add_noise(&mut data, noise, &mut rng);
    Phantom {
        volume: Volume::new(data),
        centres,
    }
}

/// `n` 个随机分布的单体素亮点, 互不相邻且不在边界上.
pub fn isolated_points(shape: Idx3d, n: usize, noise: u16, seed: u64) -> Phantom {
    let (sz, sy, sx) = shape;
    let mut data = Array3::from_elem(shape, BACKGROUND);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut centres: Vec<Idx3d> = Vec::with_capacity(n);

    let far = |a: &Idx3d, b: &Idx3d| {
        a.0.abs_diff(b.0) > 1 || a.1.abs_diff(b.1) > 1 || a.2.abs_diff(b.2) > 1
    };
    // 体数据过小时可能无法放下 `n` 个点, 此时尽力而为.
    for _ in 0..n * 64 {
        if centres.len() == n {
            break;
        }
        let c = (
            rng.random_range(1..sz - 1),
            rng.random_range(1..sy - 1),
            rng.random_range(1..sx - 1),
        );
        if centres.iter().all(|p| far(p, &c)) {
            data[c] = BRIGHT;
            centres.push(c);
        }
    }
    centres.sort_unstable();

    add_noise(&mut data, noise, &mut rng);
    Phantom {
        volume: Volume::new(data),
        centres,
    }
}
