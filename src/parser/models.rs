use std::collections::HashMap;

use crate::common::utils::sanitize_filename;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Progressive, // 音视频合一
    VideoOnly,   // 纯视频（自适应流）
    AudioOnly,   // 纯音频（自适应流）
}

/// 一路可下载的编码流，由元数据提供方在边界处构造
#[derive(Debug, Clone, PartialEq)]
pub struct StreamDescriptor {
    pub format_id: String,
    pub kind: StreamKind,
    pub extension: String,
    pub resolution: Option<String>, // 例如 "1080p"
    pub audio_bitrate: Option<u32>, // kbps
    pub filesize: Option<u64>,
    pub filesize_approx: Option<u64>,
    pub url: String,
    pub http_headers: HashMap<String, String>,
}

impl StreamDescriptor {
    /// 精确大小优先，否则使用估算大小
    pub fn size(&self) -> Option<u64> {
        self.filesize.or(self.filesize_approx)
    }

    /// 未指定文件名时使用的默认文件名
    pub fn default_filename(&self) -> String {
        sanitize_filename(&format!("{}.{}", self.format_id, self.extension))
    }
}

/// 选择器的三类候选流
#[derive(Debug, Clone, Default)]
pub struct StreamCandidates {
    pub progressive: Vec<StreamDescriptor>,
    pub video_only: Vec<StreamDescriptor>,
    pub audio_only: Vec<StreamDescriptor>,
}

// 视频元数据
#[derive(Debug, Clone)]
pub struct VideoMeta {
    pub id: String,
    pub title: String,
    pub streams: Vec<StreamDescriptor>,
}

impl VideoMeta {
    /// 音视频合一流和纯视频流只考虑 mp4 容器，纯音频流不限容器
    pub fn candidates(&self) -> StreamCandidates {
        let mut candidates = StreamCandidates::default();
        for stream in &self.streams {
            match stream.kind {
                StreamKind::Progressive if stream.extension == "mp4" => {
                    candidates.progressive.push(stream.clone())
                }
                StreamKind::VideoOnly if stream.extension == "mp4" => {
                    candidates.video_only.push(stream.clone())
                }
                StreamKind::AudioOnly => candidates.audio_only.push(stream.clone()),
                _ => {}
            }
        }
        candidates
    }
}

#[cfg(test)]
pub(crate) fn stream(
    format_id: &str,
    kind: StreamKind,
    extension: &str,
    resolution: Option<&str>,
    audio_bitrate: Option<u32>,
) -> StreamDescriptor {
    StreamDescriptor {
        format_id: format_id.to_string(),
        kind,
        extension: extension.to_string(),
        resolution: resolution.map(str::to_string),
        audio_bitrate,
        filesize: None,
        filesize_approx: None,
        url: format!("https://media.example.com/{}", format_id),
        http_headers: HashMap::new(),
    }
}
