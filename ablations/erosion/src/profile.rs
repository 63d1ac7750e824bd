//! 算法运行统计.

use std::time::{Duration, Instant};

/// ablation/benchmark 计时器.
///
/// 该计时器支持 "中途中断" 与 "结束中断, 继续开始计时".
#[derive(Clone, Debug)]
struct AccTimer {
    consumed: Duration,
    since: Instant,
}

impl AccTimer {
    /// 初始化计时器. 初始化时会视为已经开始计时.
    #[inline]
    fn new() -> Self {
        Self {
            consumed: Duration::ZERO,
            since: Instant::now(),
        }
    }

    /// 开始计时.
    #[inline]
    fn start(&mut self) {
        self.since = Instant::now();
    }

    /// 结束计时, 并将这一区间的时间累加. 返回本轮计时时长.
    #[inline]
    fn elapsed(&mut self) -> Duration {
        let d = self.since.elapsed();
        self.consumed += d;
        d
    }

    /// 获得总共累计下来的时间 (以微秒为单位).
    #[inline]
    fn total_us(&self) -> u64 {
        self.consumed.as_micros() as u64
    }
}

/// 单个检测配置在一组合成体数据上的统计.
#[derive(Clone, Debug)]
pub struct Profile {
    /// 处理的体数据个数.
    volumes: u64,

    /// 检测失败 (返回错误) 的体数据个数.
    failed: u64,

    /// 真实斑点总数.
    expected: u64,

    /// 检测到的斑点总数.
    found: u64,

    /// 与某个真实斑点中心的切比雪夫距离不超过 1 的质心个数.
    hits: u64,

    /// 检测耗时.
    timer: AccTimer,

    /// 最耗时的一次检测.
    most: Duration,
}

impl Profile {
    /// 初始化.
    #[inline]
    pub fn new() -> Self {
        Self {
            volumes: 0,
            failed: 0,
            expected: 0,
            found: 0,
            hits: 0,
            timer: AccTimer::new(),
            most: Duration::ZERO,
        }
    }

    /// 开始一次检测计时.
    #[inline]
    pub fn start(&mut self) {
        self.volumes += 1;
        self.timer.start();
    }

    /// 结束一次检测计时.
    #[inline]
    pub fn stop(&mut self) {
        self.most = self.most.max(self.timer.elapsed());
    }

    /// 记录一次失败的检测.
    #[inline]
    pub fn count_failed(&mut self) {
        self.failed += 1;
    }

    /// 记录一次成功检测的结果.
    #[inline]
    pub fn count_found(&mut self, expected: usize, found: usize, hits: usize) {
        self.expected += expected as u64;
        self.found += found as u64;
        self.hits += hits as u64;
    }

    /// 体数据个数.
    #[inline]
    pub fn get_volumes(&self) -> u64 {
        self.volumes
    }

    /// 失败个数.
    #[inline]
    pub fn get_failed(&self) -> u64 {
        self.failed
    }

    /// 真实斑点总数.
    #[inline]
    pub fn get_expected(&self) -> u64 {
        self.expected
    }

    /// 检测斑点总数.
    #[inline]
    pub fn get_found(&self) -> u64 {
        self.found
    }

    /// 命中率: 命中质心数 / 真实斑点数.
    #[inline]
    pub fn get_recall(&self) -> Option<f64> {
        (self.expected != 0).then(|| self.hits as f64 / self.expected as f64)
    }

    /// 总检测耗时 (微秒).
    #[inline]
    pub fn get_time_us(&self) -> u64 {
        self.timer.total_us()
    }

    /// 平均检测耗时 (微秒).
    #[inline]
    pub fn get_avg_time_us(&self) -> Option<f64> {
        (self.volumes != 0).then(|| self.get_time_us() as f64 / self.volumes as f64)
    }

    /// 最耗时的一次检测.
    #[inline]
    pub fn get_most_time_consuming(&self) -> Option<Duration> {
        (self.volumes != 0).then_some(self.most)
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new()
    }
}
