use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, error, info};

use self::core::{DownloadCore, StreamSource};
use self::task::DownloadTask;

use crate::common::logger::Console;
use crate::common::utils::{format_size, sanitize_filename};
use crate::error::AppError;
use crate::parser::MetadataProvider;
use crate::parser::models::{StreamDescriptor, VideoMeta};
use crate::parser::stream_selector::{DownloadPlan, SelectionResult, resolution_value, select_streams};
use crate::post_process::error::MergeError;
use crate::post_process::merger::MediaMerger;
use crate::post_process::remove_intermediates;

pub mod core;
pub mod error;
pub mod progress;
pub mod task;

/// 下载流程的各个阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    FetchingMetadata,
    SelectingStream,
    DownloadingProgressive,
    DownloadingSplit,
    Merging,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadMode {
    Progressive,
    Split,
}

/// 一次成功运行的结果
#[derive(Debug, Clone)]
pub struct RunReport {
    pub mode: DownloadMode,
    pub output: PathBuf,
    pub stages: Vec<Stage>,
}

#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub output_dir: PathBuf,
    /// ffmpeg 路径，None 表示不可用
    pub merge_tool: Option<PathBuf>,
    pub show_progress: bool,
}

struct StageLog {
    stages: Vec<Stage>,
}

impl StageLog {
    fn new() -> Self {
        Self {
            stages: vec![Stage::Init],
        }
    }

    fn current(&self) -> Stage {
        self.stages.last().copied().unwrap_or(Stage::Init)
    }

    fn enter(&mut self, stage: Stage) {
        debug!("状态切换: {:?} -> {:?}", self.current(), stage);
        self.stages.push(stage);
    }
}

pub struct VideoDownloader {
    provider: Arc<dyn MetadataProvider>,
    download_core: DownloadCore,
    options: DownloadOptions,
    console: Console,
}

impl VideoDownloader {
    pub fn new(
        provider: Arc<dyn MetadataProvider>,
        source: Arc<dyn StreamSource>,
        options: DownloadOptions,
        console: Console,
    ) -> Self {
        Self {
            provider,
            download_core: DownloadCore::new(source, options.show_progress),
            options,
            console,
        }
    }

    /// 获取信息 -> 选流 -> 下载 -> (合并)，任何错误都终止本次运行
    pub async fn run(&self, url: &str) -> Result<RunReport, AppError> {
        let mut log = StageLog::new();
        match self.drive(url, &mut log).await {
            Ok((mode, output)) => {
                log.enter(Stage::Done);
                Ok(RunReport {
                    mode,
                    output,
                    stages: log.stages,
                })
            }
            Err(e) => {
                error!("{:?} 阶段失败: {}", log.current(), e);
                log.enter(Stage::Failed);
                Err(e)
            }
        }
    }

    /// 与中断信号竞争执行，信号先到时放弃本次运行（进度条随 future 一起被 drop）
    pub async fn run_until<F>(&self, url: &str, interrupt: F) -> Result<RunReport, AppError>
    where
        F: Future<Output = io::Result<()>>,
    {
        tokio::select! {
            biased;
            signal = interrupt => match signal {
                Ok(()) => {
                    info!("收到中断信号，停止下载");
                    Err(AppError::UserInterrupted)
                }
                Err(e) => Err(AppError::Unexpected(e.into())),
            },
            result = self.run(url) => result,
        }
    }

    async fn drive(&self, url: &str, log: &mut StageLog) -> Result<(DownloadMode, PathBuf), AppError> {
        let output_dir = &self.options.output_dir;
        log.enter(Stage::FetchingMetadata);
        tokio::fs::create_dir_all(output_dir)
            .await
            .with_context(|| format!("创建输出目录失败: {:?}", output_dir))?;

        self.console.step("获取视频信息…");
        let meta = self.provider.fetch(url).await?;
        self.console.video_info(&meta.title);

        log.enter(Stage::SelectingStream);
        let candidates = meta.candidates();
        let selection = select_streams(
            &candidates.progressive,
            &candidates.video_only,
            &candidates.audio_only,
            self.options.merge_tool.is_some(),
        )?;
        self.print_selection(&selection);

        match selection.plan() {
            Some(DownloadPlan::Split { video, audio }) => {
                log.enter(Stage::DownloadingSplit);
                let output = self.download_split(&meta, video, audio, log).await?;
                Ok((DownloadMode::Split, output))
            }
            Some(DownloadPlan::Progressive(stream)) => {
                log.enter(Stage::DownloadingProgressive);
                let output = self.download_progressive(&meta, stream).await?;
                Ok((DownloadMode::Progressive, output))
            }
            None => Err(AppError::NoSuitableStream),
        }
    }

    fn print_selection(&self, selection: &SelectionResult) {
        let describe = |res: u32| {
            if res == 0 {
                "N/A".to_string()
            } else {
                format!("{}p", res)
            }
        };
        self.console.info(format!(
            "最佳音视频合一流: {}",
            describe(resolution_value(selection.progressive.as_ref()))
        ));
        self.console.info(format!(
            "最佳纯视频流: {}",
            describe(resolution_value(selection.video.as_ref()))
        ));
        self.console.info(format!(
            "ffmpeg 可用: {}",
            self.options.merge_tool.is_some()
        ));
    }

    async fn download_split(
        &self,
        meta: &VideoMeta,
        video: StreamDescriptor,
        audio: StreamDescriptor,
        log: &mut StageLog,
    ) -> Result<PathBuf, AppError> {
        let tool = self
            .options
            .merge_tool
            .clone()
            .ok_or(MergeError::ToolNotFound)?;
        let output_dir = &self.options.output_dir;
        let id = sanitize_filename(&meta.id);

        self.console.step("使用高画质模式（分别下载视频和音频后用 ffmpeg 合并）");

        let video_name = format!("{}_video.{}", id, non_empty_or(&video.extension, "mp4"));
        let video_task = DownloadTask::new(video, output_dir, Some(video_name));
        if let Some(size) = video_task.expected_size {
            self.console.info(format!("视频大小: {}", format_size(size)));
        }
        let video_path = self.download_core.fetch(&video_task, "下载视频").await?;

        let audio_name = format!("{}_audio.{}", id, non_empty_or(&audio.extension, "m4a"));
        let audio_task = DownloadTask::new(audio, output_dir, Some(audio_name));
        if let Some(size) = audio_task.expected_size {
            self.console.info(format!("音频大小: {}", format_size(size)));
        }
        let audio_path = self.download_core.fetch(&audio_task, "下载音频").await?;

        log.enter(Stage::Merging);
        let final_path = merged_output_path(
            output_dir,
            &meta.title,
            &[video_path.as_path(), audio_path.as_path()],
        );
        self.console.step(format!(
            "使用 ffmpeg 合并视频和音频: {}",
            final_path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default()
        ));

        // 合并失败时保留中间文件以便排查
        MediaMerger::new(tool)
            .merge_av(&video_path, &audio_path, &final_path)
            .await?;
        remove_intermediates(&[video_path.as_path(), audio_path.as_path()]).await;

        self.console.success("下载并合并完成！");
        self.console.file_info("最终文件", final_path.display().to_string());
        info!("输出文件: {:?}", final_path);
        Ok(final_path)
    }

    async fn download_progressive(
        &self,
        meta: &VideoMeta,
        stream: StreamDescriptor,
    ) -> Result<PathBuf, AppError> {
        let output_dir = &self.options.output_dir;
        self.console.step("使用普通模式（单文件，音视频合一）");

        if let Some(size) = stream.size() {
            self.console.info(format!(
                "分辨率: {}",
                stream.resolution.as_deref().unwrap_or("N/A")
            ));
            self.console.info(format!("大小: {}", format_size(size)));
        }
        self.console.file_info("输出目录", output_dir.display().to_string());

        let filename = format!("{}.mp4", sanitize_filename(&meta.title));
        let task = DownloadTask::new(stream, output_dir, Some(filename));
        let final_path = self.download_core.fetch(&task, "下载中").await?;

        self.console.success("下载完成！");
        self.console.file_info("文件保存到", final_path.display().to_string());
        info!("输出文件: {:?}", final_path);
        Ok(final_path)
    }
}

/// 合并输出文件名，与中间文件同名时加后缀，避免 ffmpeg 读写同一个文件
fn merged_output_path(output_dir: &Path, title: &str, intermediates: &[&Path]) -> PathBuf {
    let stem = sanitize_filename(title);
    let path = output_dir.join(format!("{}.mp4", stem));
    if intermediates.iter().any(|p| *p == path.as_path()) {
        output_dir.join(format!("{}_merged.mp4", stem))
    } else {
        path
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}
