use std::path::{Path, PathBuf};

use crate::parser::models::StreamDescriptor;

/// 一次下载：在开始前创建，完成或出错后丢弃
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub descriptor: StreamDescriptor,
    pub output_path: PathBuf,
    pub expected_size: Option<u64>,
}

impl DownloadTask {
    pub fn new(descriptor: StreamDescriptor, output_dir: &Path, filename: Option<String>) -> Self {
        let filename = filename.unwrap_or_else(|| descriptor.default_filename());
        Self {
            output_path: output_dir.join(filename),
            expected_size: descriptor.size(),
            descriptor,
        }
    }

    /// 连接建立后确定进度条总大小：精确大小 > Content-Length > 估算大小
    pub fn resolve_total(&self, content_length: Option<u64>) -> Option<u64> {
        self.descriptor
            .filesize
            .or(content_length)
            .or(self.descriptor.filesize_approx)
    }
}
