pub mod error;
pub mod merger;

use std::path::Path;

use tracing::debug;

/// 合并成功后删除中间文件，删除失败忽略
pub async fn remove_intermediates(paths: &[&Path]) {
    for path in paths {
        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!("已删除中间文件: {:?}", path),
            Err(e) => debug!("删除中间文件失败 {:?}: {}", path, e),
        }
    }
}
