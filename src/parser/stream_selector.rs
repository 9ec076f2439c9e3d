use thiserror::Error;
use tracing::debug;

use crate::parser::models::StreamDescriptor;

/// 既没有音视频合一流，也凑不齐一对纯视频 + 纯音频流
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("没有可用的视频流")]
pub struct NoSuitableStream;

/// 一次运行的选流结果，计算后不再修改
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionResult {
    pub progressive: Option<StreamDescriptor>,
    pub video: Option<StreamDescriptor>,
    pub audio: Option<StreamDescriptor>,
    pub use_split: bool,
}

/// 实际要执行的下载方式
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadPlan {
    Split {
        video: StreamDescriptor,
        audio: StreamDescriptor,
    },
    Progressive(StreamDescriptor),
}

impl SelectionResult {
    pub fn plan(&self) -> Option<DownloadPlan> {
        if self.use_split {
            if let (Some(video), Some(audio)) = (&self.video, &self.audio) {
                return Some(DownloadPlan::Split {
                    video: video.clone(),
                    audio: audio.clone(),
                });
            }
        }
        self.progressive.clone().map(DownloadPlan::Progressive)
    }
}

/// 解析 "1080p" 这样的分辨率，缺失或无法解析时为 0
pub fn parse_resolution(resolution: Option<&str>) -> u32 {
    resolution
        .map(|r| r.trim().trim_end_matches('p'))
        .and_then(|r| r.parse().ok())
        .unwrap_or(0)
}

pub fn resolution_value(stream: Option<&StreamDescriptor>) -> u32 {
    stream.map_or(0, |s| parse_resolution(s.resolution.as_deref()))
}

// 取 key 最大的一个，相同时保留输入顺序中靠前的
fn best_by<F>(streams: &[StreamDescriptor], key: F) -> Option<&StreamDescriptor>
where
    F: Fn(&StreamDescriptor) -> u32,
{
    let mut best: Option<(&StreamDescriptor, u32)> = None;
    for stream in streams {
        let value = key(stream);
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((stream, value)),
        }
    }
    best.map(|(stream, _)| stream)
}

/// 选择最佳的音视频合一流、纯视频流、纯音频流，并决定是否分离下载
pub fn select_streams(
    progressive: &[StreamDescriptor],
    video_only: &[StreamDescriptor],
    audio_only: &[StreamDescriptor],
    merge_available: bool,
) -> Result<SelectionResult, NoSuitableStream> {
    debug!(
        "候选流数量: 合一流={}, 纯视频={}, 纯音频={}",
        progressive.len(),
        video_only.len(),
        audio_only.len()
    );

    let best_progressive = best_by(progressive, |s| parse_resolution(s.resolution.as_deref()));
    let best_video = best_by(video_only, |s| parse_resolution(s.resolution.as_deref()));
    let best_audio = best_by(audio_only, |s| s.audio_bitrate.unwrap_or(0));

    if best_progressive.is_none() && (best_video.is_none() || best_audio.is_none()) {
        return Err(NoSuitableStream);
    }

    let progressive_res = resolution_value(best_progressive);
    let video_res = resolution_value(best_video);

    let use_split = merge_available
        && best_video.is_some()
        && best_audio.is_some()
        && video_res > progressive_res;

    debug!(
        "合一流 {}p, 纯视频 {}p, ffmpeg 可用={}, 分离下载={}",
        progressive_res, video_res, merge_available, use_split
    );

    Ok(SelectionResult {
        progressive: best_progressive.cloned(),
        video: best_video.cloned(),
        audio: best_audio.cloned(),
        use_split,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::models::{StreamKind, stream};

    fn progressive(id: &str, res: &str) -> StreamDescriptor {
        stream(id, StreamKind::Progressive, "mp4", Some(res), None)
    }

    fn video(id: &str, res: &str) -> StreamDescriptor {
        stream(id, StreamKind::VideoOnly, "mp4", Some(res), None)
    }

    fn audio(id: &str, kbps: u32) -> StreamDescriptor {
        stream(id, StreamKind::AudioOnly, "m4a", None, Some(kbps))
    }

    #[test]
    fn test_parse_resolution() {
        assert_eq!(parse_resolution(Some("1080p")), 1080);
        assert_eq!(parse_resolution(Some("720p")), 720);
        assert_eq!(parse_resolution(None), 0);
        assert_eq!(parse_resolution(Some("")), 0);
        assert_eq!(parse_resolution(Some("hd")), 0);
        assert_eq!(parse_resolution(Some("p")), 0);
    }

    #[test]
    fn test_split_when_adaptive_is_better() {
        let result = select_streams(
            &[progressive("22", "720p"), progressive("18", "360p")],
            &[video("136", "720p"), video("137", "1080p")],
            &[audio("139", 48), audio("140", 128)],
            true,
        )
        .unwrap();

        assert!(result.use_split);
        assert_eq!(result.progressive.as_ref().unwrap().format_id, "22");
        assert_eq!(result.video.as_ref().unwrap().format_id, "137");
        assert_eq!(result.audio.as_ref().unwrap().format_id, "140");
        assert!(matches!(result.plan(), Some(DownloadPlan::Split { .. })));
    }

    #[test]
    fn test_no_split_without_merge_tool() {
        let result = select_streams(
            &[progressive("22", "720p")],
            &[video("137", "1080p")],
            &[audio("140", 128)],
            false,
        )
        .unwrap();

        assert!(!result.use_split);
        assert_eq!(
            result.plan(),
            Some(DownloadPlan::Progressive(progressive("22", "720p")))
        );
    }

    #[test]
    fn test_no_split_when_adaptive_not_higher() {
        let result = select_streams(
            &[progressive("22", "720p")],
            &[video("136", "720p")],
            &[audio("140", 128)],
            true,
        )
        .unwrap();
        assert!(!result.use_split);

        let result = select_streams(
            &[progressive("22", "720p")],
            &[video("135", "480p")],
            &[audio("140", 128)],
            true,
        )
        .unwrap();
        assert!(!result.use_split);
    }

    #[test]
    fn test_no_split_without_audio_falls_back() {
        let result = select_streams(
            &[progressive("18", "360p")],
            &[video("137", "1080p")],
            &[],
            true,
        )
        .unwrap();
        assert!(!result.use_split);
        assert!(matches!(result.plan(), Some(DownloadPlan::Progressive(_))));
    }

    #[test]
    fn test_split_without_progressive() {
        let result =
            select_streams(&[], &[video("137", "1080p")], &[audio("140", 128)], true).unwrap();
        assert!(result.use_split);
        assert!(result.progressive.is_none());
    }

    #[test]
    fn test_adaptive_only_without_merge_tool_has_no_plan() {
        let result =
            select_streams(&[], &[video("137", "1080p")], &[audio("140", 128)], false).unwrap();
        assert!(!result.use_split);
        assert_eq!(result.plan(), None);
    }

    #[test]
    fn test_no_suitable_stream() {
        assert_eq!(select_streams(&[], &[], &[], true), Err(NoSuitableStream));
        assert_eq!(
            select_streams(&[], &[video("137", "1080p")], &[], true),
            Err(NoSuitableStream)
        );
        assert_eq!(
            select_streams(&[], &[], &[audio("140", 128)], true),
            Err(NoSuitableStream)
        );
    }

    #[test]
    fn test_ties_keep_input_order() {
        let result = select_streams(
            &[progressive("first", "720p"), progressive("second", "720p")],
            &[video("v1", "1080p"), video("v2", "1080p")],
            &[audio("a1", 128), audio("a2", 128)],
            true,
        )
        .unwrap();

        assert_eq!(result.progressive.unwrap().format_id, "first");
        assert_eq!(result.video.unwrap().format_id, "v1");
        assert_eq!(result.audio.unwrap().format_id, "a1");
    }

    #[test]
    fn test_unknown_resolution_counts_as_zero() {
        let unknown = stream("x", StreamKind::VideoOnly, "mp4", None, None);
        let result =
            select_streams(&[progressive("18", "360p")], &[unknown], &[audio("140", 128)], true)
                .unwrap();
        assert!(!result.use_split);
    }
}
