use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// 累计下载字节数。
///
/// 已知总大小时，根据回调给出的剩余字节数求增量，累计值不会超过总大小；
/// 未知总大小时直接累加每个分块的长度。
#[derive(Debug, Clone)]
pub struct ProgressAccumulator {
    total: Option<u64>,
    last_remaining: u64,
    transferred: u64,
}

impl ProgressAccumulator {
    pub fn new(total: Option<u64>) -> Self {
        Self {
            total,
            last_remaining: total.unwrap_or(0),
            transferred: 0,
        }
    }

    /// 记录一个分块，返回本次前进的字节数
    pub fn record(&mut self, chunk_len: u64, bytes_remaining: u64) -> u64 {
        let delta = match self.total {
            None => chunk_len,
            Some(_) => {
                let delta = self.last_remaining.saturating_sub(bytes_remaining);
                self.last_remaining = self.last_remaining.min(bytes_remaining);
                delta
            }
        };
        self.transferred += delta;
        delta
    }

    /// 累计字节数
    pub fn transferred(&self) -> u64 {
        self.transferred
    }
}

/// 单个文件的终端进度条，Drop 时保证关闭
pub struct DownloadProgress {
    bar: ProgressBar,
}

impl DownloadProgress {
    pub fn new(total: Option<u64>, label: &str, visible: bool) -> Self {
        let target = if visible {
            ProgressDrawTarget::stdout()
        } else {
            ProgressDrawTarget::hidden()
        };

        let bar = ProgressBar::with_draw_target(total, target);
        let template = match total {
            Some(_) => {
                "{msg} {percent:>3}% [{wide_bar:.green}] {bytes}/{total_bytes} {binary_bytes_per_sec} {elapsed}"
            }
            // 未知大小时只显示已下载字节数
            None => "{msg} {spinner:.green} {bytes} {binary_bytes_per_sec} {elapsed}",
        };
        bar.set_style(
            ProgressStyle::with_template(template)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("━╸ "),
        );
        bar.set_message(label.to_string());

        Self { bar }
    }

    pub fn update(&self, accumulator: &ProgressAccumulator) {
        self.bar.set_position(accumulator.transferred());
    }

    pub fn finish(&self) {
        self.bar.finish();
    }
}

impl Drop for DownloadProgress {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.abandon();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 模拟提供方的回调：每个分块后给出剩余字节数
    fn feed(acc: &mut ProgressAccumulator, total: u64, chunks: &[u64]) -> Vec<u64> {
        let mut received = 0u64;
        let mut history = Vec::new();
        for &len in chunks {
            received += len;
            acc.record(len, total.saturating_sub(received));
            history.push(acc.transferred());
        }
        history
    }

    #[test]
    fn test_known_total_reaches_total_exactly_once() {
        let mut acc = ProgressAccumulator::new(Some(10_000));
        let history = feed(&mut acc, 10_000, &[4096, 4096, 1808]);

        assert_eq!(history, vec![4096, 8192, 10_000]);
        assert_eq!(history.iter().filter(|&&v| v == 10_000).count(), 1);
        assert!(history.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_known_total_never_exceeds_total() {
        // 估算大小比实际偏小
        let mut acc = ProgressAccumulator::new(Some(5000));
        let history = feed(&mut acc, 5000, &[4096, 4096, 4096]);

        assert_eq!(history, vec![4096, 5000, 5000]);
        assert!(history.iter().all(|&v| v <= 5000));
    }

    #[test]
    fn test_unknown_total_counts_chunks() {
        let mut acc = ProgressAccumulator::new(None);
        assert_eq!(acc.record(100, 0), 100);
        assert_eq!(acc.record(250, 0), 250);
        assert_eq!(acc.record(0, 0), 0);
        assert_eq!(acc.transferred(), 350);
        assert_eq!(acc.total, None);
    }

    #[test]
    fn test_progress_bar_tracks_cumulative_position() {
        let progress = DownloadProgress::new(Some(300), "test", false);
        let mut acc = ProgressAccumulator::new(Some(300));
        acc.record(100, 200);
        progress.update(&acc);
        acc.record(200, 0);
        progress.update(&acc);
        assert_eq!(progress.bar.position(), 300);

        progress.finish();
        assert!(progress.bar.is_finished());
    }

    #[test]
    fn test_dropped_progress_bar_is_closed() {
        let progress = DownloadProgress::new(None, "test", false);
        let bar = progress.bar.clone();
        drop(progress);
        assert!(bar.is_finished());
    }
}
