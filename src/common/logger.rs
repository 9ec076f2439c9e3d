use colored::*;
use std::io::IsTerminal;

/// 终端配色配置，由调用方传入，不使用全局状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub enabled: bool,
}

impl Palette {
    pub fn plain() -> Self {
        Self { enabled: false }
    }

    /// 根据命令行开关、NO_COLOR 环境变量和 stdout 是否为终端决定是否着色
    pub fn detect(no_color: bool) -> Self {
        let enabled = !no_color
            && std::env::var_os("NO_COLOR").is_none()
            && std::io::stdout().is_terminal();
        Self { enabled }
    }
}

/// 漂亮的终端输出工具
#[derive(Debug, Clone, Copy)]
pub struct Console {
    palette: Palette,
}

impl Console {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    fn paint(&self, text: &str, style: impl FnOnce(&str) -> ColoredString) -> String {
        if self.palette.enabled {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// 显示成功消息
    pub fn success(&self, message: impl AsRef<str>) {
        println!("{} {}", self.paint("✓", |s| s.green().bold()), message.as_ref());
    }

    /// 显示信息消息
    pub fn info(&self, message: impl AsRef<str>) {
        println!("{} {}", self.paint("ℹ", |s| s.blue().bold()), message.as_ref());
    }

    /// 显示错误消息，写到 stderr
    pub fn error(&self, message: impl AsRef<str>) {
        eprintln!("{} {}", self.paint("✗", |s| s.red().bold()), message.as_ref());
    }

    /// 显示步骤开始
    pub fn step(&self, step: impl AsRef<str>) {
        println!(
            "\n{} {}",
            self.paint("▶", |s| s.cyan().bold()),
            self.paint(step.as_ref(), |s| s.bold())
        );
    }

    /// 显示文件信息
    pub fn file_info(&self, label: impl AsRef<str>, path: impl AsRef<str>) {
        println!(
            "{} {}: {}",
            self.paint("📁", |s| s.blue().bold()),
            self.paint(label.as_ref(), |s| s.bold()),
            path.as_ref()
        );
    }

    /// 显示视频信息
    pub fn video_info(&self, title: impl AsRef<str>) {
        println!(
            "{} {}",
            self.paint("🎬", |s| s.magenta().bold()),
            self.paint(title.as_ref(), |s| s.bold())
        );
    }
}
