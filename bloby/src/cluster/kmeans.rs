//! k-means 聚类, 仅用于初始化混合模型的责任矩阵.

use log::warn;
use rand::Rng;

#[inline]
fn dist2(a: &[f64; 2], b: &[f64; 2]) -> f64 {
    let (d0, d1) = (a[0] - b[0], a[1] - b[1]);
    d0 * d0 + d1 * d1
}

/// 距离 `p` 最近的中心的下标. 距离相同时取下标最小者.
fn nearest(p: &[f64; 2], centers: &[[f64; 2]]) -> usize {
    let mut best = (0, f64::INFINITY);
    for (i, c) in centers.iter().enumerate() {
        let d = dist2(p, c);
        if d < best.1 {
            best = (i, d);
        }
    }
    best.0
}

/// k-means++ 选取初始中心.
///
/// 第一个中心均匀随机选取, 之后每个中心按照到已选中心最近距离的平方加权抽样.
fn seed_centers<R: Rng>(points: &[[f64; 2]], k: usize, rng: &mut R) -> Vec<[f64; 2]> {
    debug_assert!(k >= 1 && points.len() >= k);

    let mut centers = Vec::with_capacity(k);
    centers.push(points[rng.random_range(0..points.len())]);

    let mut d2: Vec<f64> = points.iter().map(|p| dist2(p, &centers[0])).collect();
    while centers.len() < k {
        let total: f64 = d2.iter().sum();
        let next = if total > 0.0 && total.is_finite() {
            let target = rng.random::<f64>() * total;
            let mut acc = 0.0;
            let mut chosen = None;
            for (i, w) in d2.iter().enumerate().filter(|(_, w)| **w > 0.0) {
                acc += w;
                chosen = Some(i);
                if acc > target {
                    break;
                }
            }
            chosen.unwrap_or(0)
        } else {
            // 所有点都与已有中心重合.
            rng.random_range(0..points.len())
        };

        let c = points[next];
        centers.push(c);
        for (d, p) in d2.iter_mut().zip(points.iter()) {
            *d = d.min(dist2(p, &c));
        }
    }
    centers
}

/// 对 `points` 运行 k-means (Lloyd 迭代), 返回每个点所属的簇下标.
///
/// 当簇分配不再变化, 或达到 `max_iter` 次迭代时停止.
pub(crate) fn kmeans<R: Rng>(
    points: &[[f64; 2]],
    k: usize,
    max_iter: u32,
    rng: &mut R,
) -> Vec<usize> {
    let mut centers = seed_centers(points, k, rng);
    let mut labels: Vec<usize> = points.iter().map(|p| nearest(p, &centers)).collect();

    for _ in 0..max_iter {
        let mut sums = vec![[0.0f64; 2]; k];
        let mut counts = vec![0usize; k];
        for (p, &l) in points.iter().zip(labels.iter()) {
            sums[l][0] += p[0];
            sums[l][1] += p[1];
            counts[l] += 1;
        }
        for (j, center) in centers.iter_mut().enumerate() {
            if counts[j] == 0 {
                // 空簇保留原中心.
                warn!("k-means cluster {j} became empty");
                continue;
            }
            let n = counts[j] as f64;
            *center = [sums[j][0] / n, sums[j][1] / n];
        }

        let next: Vec<usize> = points.iter().map(|p| nearest(p, &centers)).collect();
        if next == labels {
            break;
        }
        labels = next;
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_kmeans_two_groups() {
        let points = [[0.0, 1.0], [1.0, 1.0], [2.0, 1.0], [100.0, 1.0], [101.0, 1.0]];
        for seed in 0..8 {
            let mut rng = StdRng::seed_from_u64(seed);
            let labels = kmeans(&points, 2, 300, &mut rng);
            assert_eq!(labels[0], labels[1]);
            assert_eq!(labels[1], labels[2]);
            assert_eq!(labels[3], labels[4]);
            assert_ne!(labels[0], labels[3]);
        }
    }

    #[test]
    fn test_kmeans_one_point_per_cluster() {
        let points = [[0.0, 63.0], [1000.0, 1.0]];
        let mut rng = StdRng::seed_from_u64(42);
        let labels = kmeans(&points, 2, 300, &mut rng);
        assert_ne!(labels[0], labels[1]);
    }

    #[test]
    fn test_kmeans_deterministic_with_seed() {
        let points: Vec<[f64; 2]> = (0..50).map(|i| [(i * 37 % 101) as f64, i as f64]).collect();
        let a = kmeans(&points, 4, 300, &mut StdRng::seed_from_u64(7));
        let b = kmeans(&points, 4, 300, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }
}
