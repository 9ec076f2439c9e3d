use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info, warn};
use url::Url;

use super::MetadataProvider;
use super::errors::ParseError;
use super::models::{StreamDescriptor, StreamKind, VideoMeta};
use crate::common::utils::FALLBACK_FILENAME;

pub const YTDLP_BINARY: &str = "yt-dlp";

#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    formats: Vec<YtDlpFormat>,
}

#[derive(Debug, Deserialize)]
struct YtDlpFormat {
    format_id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    ext: Option<String>,
    #[serde(default)]
    protocol: Option<String>,
    #[serde(default)]
    vcodec: Option<String>,
    #[serde(default)]
    acodec: Option<String>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    abr: Option<f64>,
    #[serde(default)]
    filesize: Option<u64>,
    #[serde(default)]
    filesize_approx: Option<f64>,
    #[serde(default)]
    http_headers: HashMap<String, String>,
}

impl YtDlpFormat {
    fn kind(&self) -> Option<StreamKind> {
        let is_none = |codec: &Option<String>| codec.as_deref() == Some("none");
        match (is_none(&self.vcodec), is_none(&self.acodec)) {
            (true, true) => None,
            (true, false) => Some(StreamKind::AudioOnly),
            (false, true) => Some(StreamKind::VideoOnly),
            (false, false) => Some(StreamKind::Progressive),
        }
    }

    // 只接受可直接 HTTP 下载的格式，跳过 m3u8/dash 分片和故事板
    fn is_direct(&self) -> bool {
        matches!(self.protocol.as_deref(), None | Some("http") | Some("https"))
    }

    fn into_descriptor(self) -> Option<StreamDescriptor> {
        if !self.is_direct() {
            return None;
        }
        let kind = self.kind()?;
        let url = self.url?;

        Some(StreamDescriptor {
            format_id: self.format_id,
            kind,
            extension: self.ext.unwrap_or_default(),
            resolution: self.height.map(|h| format!("{}p", h)),
            audio_bitrate: self.abr.map(|abr| abr.round() as u32),
            filesize: self.filesize,
            filesize_approx: self.filesize_approx.map(|size| size.round() as u64),
            url,
            http_headers: self.http_headers,
        })
    }
}

/// 把 yt-dlp 的 JSON 输出转换为视频元数据
pub fn parse_info(stdout: &[u8]) -> Result<VideoMeta, ParseError> {
    let info: YtDlpInfo = serde_json::from_slice(stdout)?;

    let title = info
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string());

    let total = info.formats.len();
    let streams: Vec<StreamDescriptor> = info
        .formats
        .into_iter()
        .filter_map(YtDlpFormat::into_descriptor)
        .collect();
    debug!("yt-dlp 返回 {} 个格式，可直接下载 {} 个", total, streams.len());

    Ok(VideoMeta {
        id: info.id,
        title,
        streams,
    })
}

pub fn validate_url(url: &str) -> Result<Url, ParseError> {
    let parsed = Url::parse(url).map_err(|e| ParseError::InvalidUrl(format!("{}: {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(ParseError::InvalidUrl(format!("不支持的协议 {}: {}", scheme, url))),
    }
}

fn classify_failure(stderr: &str) -> ParseError {
    let message = stderr
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("yt-dlp 异常退出")
        .trim()
        .to_string();

    let lower = stderr.to_lowercase();
    if lower.contains("video unavailable")
        || lower.contains("private video")
        || lower.contains("has been removed")
    {
        ParseError::VideoUnavailable(message)
    } else {
        ParseError::ExtractorFailed(message)
    }
}

/// 通过 yt-dlp 命令行获取视频元数据
#[derive(Debug, Clone)]
pub struct YtDlpProvider {
    binary: PathBuf,
}

impl YtDlpProvider {
    pub fn new(binary: Option<PathBuf>) -> Self {
        Self {
            binary: binary.unwrap_or_else(|| PathBuf::from(YTDLP_BINARY)),
        }
    }
}

#[async_trait]
impl MetadataProvider for YtDlpProvider {
    async fn fetch(&self, url: &str) -> Result<VideoMeta, ParseError> {
        let url = validate_url(url)?;
        info!("获取视频信息: {}", url);

        let output = Command::new(&self.binary)
            .arg("--dump-single-json")
            .arg("--no-playlist")
            .arg("--no-warnings")
            .arg(url.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    ParseError::ExtractorNotFound(self.binary.display().to_string())
                }
                _ => ParseError::Io(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("yt-dlp 退出码 {:?}: {}", output.status.code(), stderr.trim());
            return Err(classify_failure(&stderr));
        }

        parse_info(&output.stdout)
    }
}
