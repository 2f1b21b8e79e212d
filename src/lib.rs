pub mod config;
pub mod engine;
pub mod error;
pub mod selector;

#[cfg(any(test, feature = "native"))]
pub mod headless;

#[cfg(feature = "native")]
mod cli;

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub mod wasm;
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub mod wasm_entry;

pub use config::{ExpanderConfig, Selectors};
pub use engine::{ExpandOutcome, ExpansionEngine, Slot, TargetId, TargetQueue, TickOutcome};
pub use error::{ExpanderError, Result};

#[cfg(any(test, feature = "native"))]
pub use headless::{HeadlessRunner, RunOptions, RunReport};

#[cfg(feature = "native")]
pub use cli::{parse_args, parse_args_from, run_headless, show_help, CliArgs};

// ========================================
// ログ設定
// ========================================

#[derive(Debug, Clone)]
pub enum LogLevel {
    Off,   // ログを一切表示しない（panicは除く）
    Error, // エラーレベルのみ
    Warn,  // 警告レベル以上
    Info,  // 情報レベル以上
    Debug, // デバッグレベル以上
    Trace, // 全てのログ
}

/// ログレベルを初期化する関数
pub fn init_logger(log_level: &LogLevel) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::sync::Once;

    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let level = match log_level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        };

        let mut builder = Builder::from_default_env();

        if matches!(log_level, LogLevel::Off) {
            // quietモードの場合、何も出力しない（panicは別途処理される）
            builder
                .filter_level(LevelFilter::Off)
                .format(|_, _| Ok(()))
                .try_init()
                .ok(); // エラーを無視
        } else {
            builder
                .filter_level(level)
                .format_timestamp_secs()
                .try_init()
                .ok(); // エラーを無視
        }
    });
}
