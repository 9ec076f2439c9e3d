use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, info, warn};

use yt_downloader::cli::Cli;
use yt_downloader::common::logger::{Console, Palette};
use yt_downloader::downloader::core::HttpStreamSource;
use yt_downloader::downloader::{DownloadOptions, RunReport, VideoDownloader};
use yt_downloader::parser::ytdlp::YtDlpProvider;
use yt_downloader::post_process::merger::locate_merge_tool;
use yt_downloader::{AppError, Result};

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: &Cli, console: Console) -> Result<RunReport> {
    let merge_tool = locate_merge_tool(args.ffmpeg.as_deref());
    if merge_tool.is_none() {
        warn!("未检测到 ffmpeg，只能下载音视频合一流");
    }

    let provider = YtDlpProvider::new(args.yt_dlp.clone());
    let source = HttpStreamSource::new()?;
    let options = DownloadOptions {
        output_dir: args.output.clone(),
        merge_tool,
        show_progress: !args.no_progress,
    };
    debug!("下载选项: {:?}", options);

    let downloader = VideoDownloader::new(Arc::new(provider), Arc::new(source), options, console);

    // Ctrl-C 转换为正常的失败退出
    downloader
        .run_until(&args.url, tokio::signal::ctrl_c())
        .await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // 解析命令行参数
    let args = Cli::parse();
    init_tracing(args.verbose);

    let console = Console::new(Palette::detect(args.no_color));
    info!("开始下载视频: {}", args.url);

    match run(&args, console).await {
        Ok(report) => {
            debug!("运行阶段: {:?}", report.stages);
            ExitCode::SUCCESS
        }
        Err(e) => {
            if matches!(e, AppError::UserInterrupted) {
                println!();
            }
            console.error(e.to_string());
            ExitCode::from(e.exit_code())
        }
    }
}
