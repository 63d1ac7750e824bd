//! 程序运行函数.

use crate::profile::Profile;
use crate::result::AblationResult;
use bloby::prelude::*;
use log::{info, warn};
use std::thread;
use utils::{loader, phantom};

/// 每种 phantom 生成的体数据个数.
const ROUNDS: u64 = 8;

/// 参与对比的聚类个数. `k = 2` 不腐蚀, 其余腐蚀.
const COMPONENTS: [usize; 3] = [2, 3, 4];

/// 质心是否落在某个真实中心的 26-邻域 (含自身) 内?
fn is_hit(c: &Centroid, centres: &[Idx3d]) -> bool {
    centres
        .iter()
        .any(|t| c.z.abs_diff(t.0) <= 1 && c.y.abs_diff(t.1) <= 1 && c.x.abs_diff(t.2) <= 1)
}

/// 在 `make` 生成的一组 phantom 上运行 `k` 聚类检测.
fn run_k<F>(k: usize, make: F) -> Profile
where
    F: Fn(u64) -> phantom::Phantom,
{
    let mut profile = Profile::new();
    for seed in 0..ROUNDS {
        let p = make(seed);
        let detector = BlobDetector::new(DetectorConfig::new(k).with_seed(seed));

        profile.start();
        let res = detector.get_blob_centroids(&p.volume);
        profile.stop();

        match res {
            Ok(centroids) => {
                let hits = centroids.iter().filter(|c| is_hit(c, &p.centres)).count();
                profile.count_found(p.centres.len(), centroids.len(), hits);
            }
            Err(e) => {
                warn!("k = {k}, seed {seed}: {e}");
                profile.count_failed();
            }
        }
    }
    profile
}

/// 若通过环境变量给出了真实体数据, 则在其上运行一次检测 (及分区统计).
pub fn run_env() -> Result<(), Box<dyn std::error::Error>> {
    let Some(volume) = loader::volume_from_env() else {
        return Ok(());
    };
    let volume = volume?;
    info!("loaded volume of shape {:?}", volume.shape());

    let detector = BlobDetector::default();
    let d = detector.detect(&volume)?;
    println!(
        "Detected {} blobs, threshold {:.2}, representatives {:?}",
        d.centroids.len(),
        d.threshold.value(),
        d.representatives
    );

    if let Some(regions) = loader::regions_from_env() {
        let sums = detector.intensity_by_region(&volume, &regions?)?;
        for (region, total) in sums.iter() {
            println!("region {region}: {total}");
        }
    }
    Ok(())
}

/// 实际运行.
pub fn run() -> AblationResult {
    println!("Running ablation studies on {} cores...", utils::cpus());
    thread::scope(|s| {
        let handles = COMPONENTS.map(|k| {
            s.spawn(move || {
                let pairs = run_k(k, |seed| {
                    phantom::touching_pairs((11, 32, 32), 3, 3, 30, seed)
                });
                let points = run_k(k, |seed| {
                    phantom::isolated_points((10, 16, 16), 12, 30, seed)
                });
                [
                    (format!("touching pairs, k = {k}"), pairs),
                    (format!("isolated points, k = {k}"), points),
                ]
            })
        });

        handles
            .into_iter()
            .flat_map(|th| th.join().expect("Thread joining error"))
            .collect()
    })
}
