use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::error::DownloadError;
use super::progress::{DownloadProgress, ProgressAccumulator};
use super::task::DownloadTask;
use crate::parser::models::StreamDescriptor;

pub type ChunkStream = BoxStream<'static, Result<Bytes, DownloadError>>;

/// 已打开的远程流
pub struct RemoteStream {
    pub content_length: Option<u64>,
    pub chunks: ChunkStream,
}

// 字节来源，真实实现走 HTTP
#[async_trait]
pub trait StreamSource: Send + Sync {
    async fn open(&self, descriptor: &StreamDescriptor) -> Result<RemoteStream, DownloadError>;
}

#[derive(Debug, Clone)]
pub struct HttpStreamSource {
    client: reqwest::Client,
}

impl HttpStreamSource {
    pub fn new() -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("ytdl/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    fn build_headers(descriptor: &StreamDescriptor) -> Result<HeaderMap, DownloadError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &descriptor.http_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| DownloadError::InvalidHeader(format!("{}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| DownloadError::InvalidHeader(format!("{}: {}", name, e)))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl StreamSource for HttpStreamSource {
    async fn open(&self, descriptor: &StreamDescriptor) -> Result<RemoteStream, DownloadError> {
        let headers = Self::build_headers(descriptor)?;
        let response = self
            .client
            .get(&descriptor.url)
            .headers(headers)
            .send()
            .await?;

        let status = response.status();
        debug!("Response Status: {}", status);
        if !status.is_success() {
            warn!("❌ 非成功状态码: {}", status);
            return Err(DownloadError::Status {
                status: status.as_u16(),
                url: descriptor.url.clone(),
            });
        }

        let content_length = response.content_length();
        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| DownloadError::Stream(e.to_string())))
            .boxed();

        Ok(RemoteStream {
            content_length,
            chunks,
        })
    }
}

/// 带进度条的单文件下载
#[derive(Clone)]
pub struct DownloadCore {
    source: Arc<dyn StreamSource>,
    show_progress: bool,
}

impl DownloadCore {
    pub fn new(source: Arc<dyn StreamSource>, show_progress: bool) -> Self {
        Self {
            source,
            show_progress,
        }
    }

    /// 下载一路流到本地，返回文件路径。失败不重试
    pub async fn fetch(&self, task: &DownloadTask, label: &str) -> Result<PathBuf, DownloadError> {
        debug!("开始下载: {} -> {:?}", task.descriptor.format_id, task.output_path);

        let remote = self.source.open(&task.descriptor).await?;
        let total = task.resolve_total(remote.content_length);

        // 出错返回时 progress 被 drop，进度条随之关闭
        let progress = DownloadProgress::new(total, label, self.show_progress);
        let mut accumulator = ProgressAccumulator::new(total);

        let mut file = tokio::fs::File::create(&task.output_path).await?;
        let mut chunks = remote.chunks;
        let mut received = 0u64;

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;

            let len = chunk.len() as u64;
            received += len;
            let remaining = total.map_or(0, |t| t.saturating_sub(received));
            accumulator.record(len, remaining);
            progress.update(&accumulator);
        }

        file.flush().await?;
        progress.finish();

        info!(
            "✅ 下载完成: {:?} ({} 字节)",
            task.output_path, received
        );
        Ok(task.output_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::models::{StreamKind, stream};

    struct ChunkedSource {
        chunks: Vec<Vec<u8>>,
        content_length: Option<u64>,
        fail_after: Option<usize>,
    }

    #[async_trait]
    impl StreamSource for ChunkedSource {
        async fn open(&self, _: &StreamDescriptor) -> Result<RemoteStream, DownloadError> {
            let mut items: Vec<Result<Bytes, DownloadError>> = self
                .chunks
                .iter()
                .map(|c| Ok(Bytes::from(c.clone())))
                .collect();
            if let Some(n) = self.fail_after {
                items.truncate(n);
                items.push(Err(DownloadError::Stream("connection reset".to_string())));
            }
            Ok(RemoteStream {
                content_length: self.content_length,
                chunks: futures::stream::iter(items).boxed(),
            })
        }
    }

    fn task(dir: &std::path::Path, size: Option<u64>) -> DownloadTask {
        let mut s = stream("18", StreamKind::Progressive, "mp4", Some("360p"), None);
        s.filesize = size;
        DownloadTask::new(s, dir, Some("out.mp4".to_string()))
    }

    #[tokio::test]
    async fn test_fetch_writes_all_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let source = ChunkedSource {
            chunks: vec![b"hello ".to_vec(), b"world".to_vec()],
            content_length: None,
            fail_after: None,
        };
        let core = DownloadCore::new(Arc::new(source), false);

        let path = core.fetch(&task(dir.path(), Some(11)), "下载").await.unwrap();
        assert_eq!(path, dir.path().join("out.mp4"));
        assert_eq!(std::fs::read(&path).unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn test_fetch_with_unknown_size() {
        let dir = tempfile::tempdir().unwrap();
        let source = ChunkedSource {
            chunks: vec![vec![1; 1000], vec![2; 24]],
            content_length: None,
            fail_after: None,
        };
        let core = DownloadCore::new(Arc::new(source), false);

        let path = core.fetch(&task(dir.path(), None), "下载").await.unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 1024);
    }

    #[tokio::test]
    async fn test_fetch_propagates_stream_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = ChunkedSource {
            chunks: vec![vec![0; 10], vec![0; 10]],
            content_length: Some(20),
            fail_after: Some(1),
        };
        let core = DownloadCore::new(Arc::new(source), false);

        let result = core.fetch(&task(dir.path(), None), "下载").await;
        assert!(matches!(result, Err(DownloadError::Stream(_))));
    }

    #[test]
    fn test_build_headers() {
        let mut s = stream("18", StreamKind::Progressive, "mp4", Some("360p"), None);
        s.http_headers
            .insert("User-Agent".to_string(), "Mozilla/5.0".to_string());
        let headers = HttpStreamSource::build_headers(&s).unwrap();
        assert_eq!(headers.get("user-agent").unwrap(), "Mozilla/5.0");

        s.http_headers
            .insert("Bad Header".to_string(), "x".to_string());
        assert!(matches!(
            HttpStreamSource::build_headers(&s),
            Err(DownloadError::InvalidHeader(_))
        ));
    }
}
