use async_trait::async_trait;

use errors::ParseError;
use models::VideoMeta;

pub mod errors;
pub mod models;
pub mod stream_selector;
pub mod ytdlp;

// 元数据提供方：给定链接，返回标题、ID 和所有可下载的流
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<VideoMeta, ParseError>;
}
