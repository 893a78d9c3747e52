//! # Logging モジュール
//!
//! 追跡シミュレーションのログ管理機能を提供します。
//!
//! tracing-appenderによる非同期ファイル出力と、コンソール出力を切り替えられます。
//! ファイルには JSON、コンソールには compact 形式で書き出します。
//!
//! ## 設定可能な出力先
//!
//! - `Console`: コンソールのみ（標準エラー出力）
//! - `File`: ファイルのみ（logs/pursuitsim.YYYY-MM-DD）
//! - `Both`: コンソールとファイルの両方

use std::str::FromStr;
use tracing::{Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt,
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// ログ出力先の設定
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogOutput {
    /// コンソールのみ
    Console,
    /// ファイルのみ
    File,
    /// コンソールとファイルの両方
    Both,
}

impl FromStr for LogOutput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "console" | "stderr" => Ok(LogOutput::Console),
            "file" => Ok(LogOutput::File),
            "both" | "all" => Ok(LogOutput::Both),
            _ => Err(format!("無効な出力先: {}. 利用可能: console, file, both", s)),
        }
    }
}

/// ログ設定構造体
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// ログレベル
    pub level: Level,
    /// 出力先
    pub output: LogOutput,
    /// ログファイルのディレクトリ（Fileまたは Bothの場合）
    pub log_dir: String,
    /// ログファイル名のプレフィックス
    pub file_prefix: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            output: LogOutput::Console,
            log_dir: "logs".to_string(),
            file_prefix: "pursuitsim".to_string(),
        }
    }
}

/// ログシステムを初期化
///
/// RUST_LOG が設定されていればそちらを優先します。
/// ファイル出力時は書き込みスレッドのガードを返すので、プログラム終了まで保持してください。
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.level.to_string()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match config.output {
        LogOutput::Console => {
            Registry::default()
                .with(env_filter)
                .with(console_layer())
                .try_init()?;
            Ok(None)
        }
        LogOutput::File => {
            ensure_log_directory(&config.log_dir)?;
            let file_appender = rolling::daily(&config.log_dir, &config.file_prefix);
            let (writer, guard) = non_blocking(file_appender);

            Registry::default()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(writer)
                        .with_target(true)
                        .with_thread_ids(false)
                        .json(),
                )
                .try_init()?;
            Ok(Some(guard))
        }
        LogOutput::Both => {
            ensure_log_directory(&config.log_dir)?;
            let file_appender = rolling::daily(&config.log_dir, &config.file_prefix);
            let (writer, guard) = non_blocking(file_appender);

            Registry::default()
                .with(env_filter)
                .with(console_layer())
                .with(
                    fmt::layer()
                        .with_writer(writer)
                        .with_target(true)
                        .with_thread_ids(false)
                        .json(),
                )
                .try_init()?;
            Ok(Some(guard))
        }
    }
}

/// コンソール向けの compact レイヤー
fn console_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
}

/// ログレベルを文字列から解析
///
/// 無効な文字列の場合はINFOを返します。
pub fn parse_log_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!("警告: 無効なログレベル '{}'. INFOを使用します", level_str);
            Level::INFO
        }
    }
}

/// 詳細出力レベル（-v の回数）からログレベルを決定
pub fn level_for_verbosity(verbose_level: u8) -> Level {
    match verbose_level {
        0 => Level::INFO,
        1 | 2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// ログディレクトリを作成
pub fn ensure_log_directory(log_dir: &str) -> Result<(), std::io::Error> {
    std::fs::create_dir_all(log_dir)?;
    Ok(())
}
