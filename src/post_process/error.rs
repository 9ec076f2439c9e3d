use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("未检测到 ffmpeg，请安装 ffmpeg 或设置 FFMPEG_PATH")]
    ToolNotFound,
    #[error("文件不存在: {0:?}")]
    FileNotFound(PathBuf),
    #[error("无法启动 ffmpeg: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("ffmpeg 退出码 {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },
}
