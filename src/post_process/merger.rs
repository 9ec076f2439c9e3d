use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, error, info};

use super::error::MergeError;

pub const MERGE_TOOL: &str = "ffmpeg";

// 错误日志只保留最后几行
const STDERR_TAIL_LINES: usize = 10;

/// 在 PATH 中查找 ffmpeg；指定了路径时只检查该路径
pub fn locate_merge_tool(override_path: Option<&Path>) -> Option<PathBuf> {
    let found = match override_path {
        Some(path) => which::which(path),
        None => which::which(MERGE_TOOL),
    };
    match found {
        Ok(path) => {
            debug!("找到 ffmpeg: {:?}", path);
            Some(path)
        }
        Err(e) => {
            debug!("未找到 ffmpeg: {}", e);
            None
        }
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

/// 调用系统 ffmpeg 合并音视频
#[derive(Debug, Clone)]
pub struct MediaMerger {
    tool: PathBuf,
}

impl MediaMerger {
    pub fn new(tool: impl Into<PathBuf>) -> Self {
        Self { tool: tool.into() }
    }

    /// 直接复制音视频流（不重新编码）到一个容器，已存在的输出文件会被覆盖
    pub async fn merge_av(
        &self,
        video_path: &Path,
        audio_path: &Path,
        output_path: &Path,
    ) -> Result<(), MergeError> {
        // 检查输入文件是否存在
        if !video_path.exists() {
            return Err(MergeError::FileNotFound(video_path.to_path_buf()));
        }
        if !audio_path.exists() {
            return Err(MergeError::FileNotFound(audio_path.to_path_buf()));
        }

        debug!("开始合并视频和音频 -> 输出路径: {:?}", output_path);

        let output = Command::new(&self.tool)
            .arg("-y") // 自动覆盖
            .arg("-i")
            .arg(video_path)
            .arg("-i")
            .arg(audio_path)
            .arg("-c")
            .arg("copy")
            .arg(output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = stderr_tail(&output.stderr);
            error!("❌ ffmpeg 合并失败，错误日志如下：\n{}", stderr);
            return Err(MergeError::Failed {
                code: output.status.code(),
                stderr,
            });
        }

        info!("✅ 视频与音频合并成功，输出文件: {:?}", output_path);
        Ok(())
    }
}
