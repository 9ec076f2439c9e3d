use clap::Parser;
use std::path::PathBuf;

/// 单视频下载器
#[derive(Parser, Debug)]
#[command(name = "ytdl")]
#[command(version = "1.0")]
#[command(author = "rpeng252@gmail.com")]
#[command(
    about = "以尽可能高的画质下载单个视频",
    long_about = "以尽可能高的画质下载单个视频。\n\
                  如果系统中有 ffmpeg，且存在比音视频合一流更高分辨率的纯视频流，\n\
                  则分别下载视频和音频（各自带进度条），然后用 ffmpeg 合并。"
)]
pub struct Cli {
    /// 视频链接
    #[arg(value_name = "URL")]
    #[arg(value_hint = clap::ValueHint::Url)]
    pub url: String,

    /// 视频保存目录
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    #[arg(default_value = "downloads")]
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub output: PathBuf,

    /// 指定 ffmpeg 可执行文件 (默认在 PATH 中查找)
    #[arg(long, value_name = "PATH", env = "FFMPEG_PATH")]
    #[arg(value_hint = clap::ValueHint::ExecutablePath)]
    pub ffmpeg: Option<PathBuf>,

    /// 指定 yt-dlp 可执行文件 (默认在 PATH 中查找)
    #[arg(long = "yt-dlp", value_name = "PATH", env = "YTDLP_PATH")]
    #[arg(value_hint = clap::ValueHint::ExecutablePath)]
    pub yt_dlp: Option<PathBuf>,

    /// 关闭彩色输出
    #[arg(long)]
    pub no_color: bool,

    /// 不显示下载进度条
    #[arg(long)]
    pub no_progress: bool,

    /// 输出调试日志
    #[arg(short, long)]
    pub verbose: bool,
}
