use lazy_static::lazy_static;
use regex::Regex;

/// 文件名最大长度（字符数）
pub const MAX_FILENAME_LEN: usize = 200;

/// 文件名为空时使用的默认名称
pub const FALLBACK_FILENAME: &str = "video";

lazy_static! {
    static ref FORBIDDEN_CHARS: Regex = Regex::new(r#"[\\/*?:"<>|]"#).unwrap();
}

/// 把任意标题转换为在常见文件系统上安全的文件名
pub fn sanitize_filename(name: &str) -> String {
    // 只由非法字符和空白组成的标题视为空标题
    if FORBIDDEN_CHARS.replace_all(name, "").trim().is_empty() {
        return FALLBACK_FILENAME.to_string();
    }

    let replaced = FORBIDDEN_CHARS.replace_all(name, "_");
    replaced.trim().chars().take(MAX_FILENAME_LEN).collect()
}

// 格式化文件大小
pub fn format_size(size: u64) -> String {
    if size == 0 {
        "0 MB".to_string()
    } else if size > 1024 * 1024 * 1024 {
        format!("{:.2} GB", size as f64 / 1024.0 / 1024.0 / 1024.0)
    } else {
        format!("{:.2} MB", size as f64 / 1024.0 / 1024.0)
    }
}
