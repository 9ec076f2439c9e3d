use thiserror::Error;

use crate::downloader::error::DownloadError;
use crate::parser::errors::ParseError;
use crate::parser::stream_selector::NoSuitableStream;
use crate::post_process::error::MergeError;

/// 一次运行中所有可能的终止性错误，均不重试
#[derive(Debug, Error)]
pub enum AppError {
    #[error("获取视频信息失败: {0}")]
    Metadata(#[from] ParseError),

    #[error("未找到合适的视频流")]
    NoSuitableStream,

    #[error("下载失败: {0}")]
    Download(#[from] DownloadError),

    #[error("FFmpeg 合并失败: {0}")]
    Merge(#[from] MergeError),

    #[error("下载被用户中断")]
    UserInterrupted,

    #[error("未知错误: {0:#}")]
    Unexpected(#[from] anyhow::Error),
}

impl From<NoSuitableStream> for AppError {
    fn from(_: NoSuitableStream) -> Self {
        AppError::NoSuitableStream
    }
}

impl AppError {
    /// 进程退出码，任何错误都是 1
    pub fn exit_code(&self) -> u8 {
        1
    }
}
