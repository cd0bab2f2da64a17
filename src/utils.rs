use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};

/// ====== 공통 로거 ======
/// 전역 DEBUG 플래그 대신 명시적으로 전달되는 로그 설정입니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct Logger {
    pub debug: bool,
}

impl Logger {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }

    /// 항상 출력되는 진행 로그 (로컬 시간 기준)
    pub fn log(&self, msg: impl AsRef<str>) {
        let now = Local::now();
        println!("{} {}", now.format("%Y-%m-%d %H:%M:%S"), msg.as_ref());
    }

    /// `--debug` 가 켜진 경우에만 출력되는 상세 로그
    pub fn debug(&self, msg: impl AsRef<str>) {
        if self.debug {
            self.log(format!("[DEBUG] {}", msg.as_ref()));
        }
    }

    /// 경고는 stderr 로 출력합니다.
    pub fn warn(&self, msg: impl AsRef<str>) {
        let now = Local::now();
        eprintln!("{} Warning: {}", now.format("%Y-%m-%d %H:%M:%S"), msg.as_ref());
    }
}

/// ====== 공통 Progress Bar 생성 함수 ======
/// 표준 스타일의 ProgressBar를 생성합니다.
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>7}/{len:7} ({eta}) {msg}",
    ) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(message.to_string());
    pb
}
