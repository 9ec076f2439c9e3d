use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("无效的URL: {0}")]
    InvalidUrl(String),
    #[error("未找到 yt-dlp，请确认已安装或通过 YTDLP_PATH 指定: {0}")]
    ExtractorNotFound(String),
    #[error("视频不可用: {0}")]
    VideoUnavailable(String),
    #[error("yt-dlp 解析失败: {0}")]
    ExtractorFailed(String),
    #[error("响应解析失败: {0}")]
    InvalidResponse(String),
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ParseError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidResponse(e.to_string())
    }
}
