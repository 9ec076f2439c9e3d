use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HTTP错误: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("IO错误: {0}")]
    IoError(#[from] std::io::Error),
    #[error("HTTP 请求失败，状态码: {status}，URL: {url}")]
    Status { status: u16, url: String },
    #[error("无效的请求头: {0}")]
    InvalidHeader(String),
    #[error("下载流中断: {0}")]
    Stream(String),
}
