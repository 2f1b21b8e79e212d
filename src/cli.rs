// ========================================
// コマンドライン引数（ネイティブ版のみ）
// ========================================

use crate::headless::{HeadlessRunner, RunOptions, RunReport};
use crate::{init_logger, ExpanderConfig, LogLevel, Result, Slot};
use std::env;

/// コマンドライン引数の設定（ネイティブ版のヘッドレス実行用）
#[derive(Debug)]
pub struct CliArgs {
    pub config_path: Option<String>,
    pub generations: u32,
    pub slots: Option<Vec<Slot>>,
    pub interval_ms: Option<u32>,
    pub idle_ticks: u32,
    pub max_ticks: u64,
    pub json: bool,
    pub quiet: bool, // panic以外のログを抑制
    pub log_level: LogLevel,
    /// 解釈できなかった引数（ロガー初期化後に警告する）
    pub warnings: Vec<String>,
}

impl Default for CliArgs {
    fn default() -> Self {
        let run = RunOptions::default();
        Self {
            config_path: None,
            generations: run.generations,
            slots: None,
            interval_ms: None,
            idle_ticks: run.idle_ticks_before_stop,
            max_ticks: run.max_ticks,
            json: false,
            quiet: false,
            log_level: LogLevel::Info,
            warnings: Vec::new(),
        }
    }
}

impl CliArgs {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            generations: self.generations,
            max_ticks: self.max_ticks,
            idle_ticks_before_stop: self.idle_ticks,
        }
    }

    /// 設定ファイル（あれば）を読み、引数での上書きを適用する
    pub fn load_config(&self) -> Result<ExpanderConfig> {
        #[cfg(not(target_arch = "wasm32"))]
        let mut config = match &self.config_path {
            Some(path) => ExpanderConfig::from_file(path)?,
            None => ExpanderConfig::default(),
        };
        #[cfg(target_arch = "wasm32")]
        let mut config = ExpanderConfig::default();

        if let Some(slots) = &self.slots {
            config.auto_slots = slots.clone();
        }
        if let Some(interval) = self.interval_ms {
            config.tick_interval_ms = interval;
        }
        config.validate()?;
        Ok(config)
    }
}

fn parse_slots(value: &str) -> Option<Vec<Slot>> {
    value
        .split(',')
        .map(|s| s.trim().parse::<u8>().ok().and_then(|n| Slot::try_from(n).ok()))
        .collect()
}

pub fn parse_args() -> CliArgs {
    let args: Vec<String> = env::args().collect();
    parse_args_from(args.iter().skip(1).map(String::as_str))
}

pub fn parse_args_from<'a>(args: impl IntoIterator<Item = &'a str>) -> CliArgs {
    let mut cli_args = CliArgs::default();

    for arg in args {
        let (key, value) = match arg.split_once('=') {
            Some((k, v)) => (k, Some(v)),
            None => (arg, None),
        };

        match (key, value) {
            ("--config", Some(v)) => cli_args.config_path = Some(v.to_string()),
            ("--generations", Some(v)) => match v.parse() {
                Ok(n) => cli_args.generations = n,
                Err(_) => cli_args.warnings.push(format!("invalid --generations value: {}", v)),
            },
            ("--slots", Some(v)) => match parse_slots(v) {
                Some(slots) => cli_args.slots = Some(slots),
                None => cli_args.warnings.push(format!("invalid --slots value: {}", v)),
            },
            ("--interval", Some(v)) => match v.parse() {
                Ok(ms) => cli_args.interval_ms = Some(ms),
                Err(_) => cli_args.warnings.push(format!("invalid --interval value: {}", v)),
            },
            ("--idle-ticks", Some(v)) => match v.parse() {
                Ok(n) => cli_args.idle_ticks = n,
                Err(_) => cli_args.warnings.push(format!("invalid --idle-ticks value: {}", v)),
            },
            ("--max-ticks", Some(v)) => match v.parse() {
                Ok(n) => cli_args.max_ticks = n,
                Err(_) => cli_args.warnings.push(format!("invalid --max-ticks value: {}", v)),
            },
            ("--json", None) => cli_args.json = true,
            ("--quiet" | "-q" | "--silent", None) => {
                cli_args.quiet = true;
                cli_args.log_level = LogLevel::Off;
            }
            ("--log-level", Some("off")) => cli_args.log_level = LogLevel::Off,
            ("--log-level", Some("error")) => cli_args.log_level = LogLevel::Error,
            ("--log-level", Some("warn")) => cli_args.log_level = LogLevel::Warn,
            ("--log-level", Some("info")) => cli_args.log_level = LogLevel::Info,
            ("--log-level", Some("debug")) => cli_args.log_level = LogLevel::Debug,
            ("--log-level", Some("trace")) => cli_args.log_level = LogLevel::Trace,
            ("--help" | "-h", None) => {
                show_help();
                std::process::exit(0);
            }
            _ => cli_args.warnings.push(format!("unrecognized argument: {}", arg)),
        }
    }
    cli_args
}

pub fn show_help() {
    println!("Ancestor Expander (headless pedigree run)

USAGE:
    ancestor_expander [OPTIONS]

OPTIONS:
    --config=PATH            Load expander settings from a JSON file
    --generations=N          Generations the simulated pedigree can show (default: 5)
    --slots=LIST             Slots to auto-expand, e.g. 1 or 1,2 (default: 1)
    --interval=MS            Tick interval in milliseconds (default: 100)
    --idle-ticks=N           Press stop after N consecutive empty ticks (default: 3)
    --max-ticks=N            Press stop after N ticks (default: 10000)
    --json                   Print the run report as JSON
    --quiet, -q              Suppress all logs except panics
    --silent                 Same as --quiet
    --log-level=LEVEL        Set log level (off/error/warn/info/debug/trace)
    --help, -h               Show this help");
}

/// 家系図ページのシミュレーション上でエンジンを動かす
pub fn run_headless(cli_args: &CliArgs) -> Result<RunReport> {
    init_logger(&cli_args.log_level);
    for warning in &cli_args.warnings {
        log::warn!("{}", warning);
    }

    let config = cli_args.load_config()?;
    log::info!(
        "Running headless expansion: {} generation(s), slots {:?}, {}ms interval",
        cli_args.generations,
        config.auto_slots.iter().map(|s| s.number()).collect::<Vec<_>>(),
        config.tick_interval_ms
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let mut runner = HeadlessRunner::new(config, cli_args.run_options());
    Ok(runtime.block_on(runner.run_paced()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExpanderError;

    #[test]
    fn test_parse_args_overrides() {
        let args = parse_args_from(["--generations=7", "--slots=1,2", "--interval=20", "--json", "--log-level=debug"]);
        assert_eq!(args.generations, 7);
        assert_eq!(args.slots, Some(vec![Slot::One, Slot::Two]));
        assert_eq!(args.interval_ms, Some(20));
        assert!(args.json);
        assert!(matches!(args.log_level, LogLevel::Debug));
        assert!(args.warnings.is_empty());

        let config = args.load_config().unwrap();
        assert_eq!(config.auto_slots, vec![Slot::One, Slot::Two]);
        assert_eq!(config.tick_interval_ms, 20);
    }

    #[test]
    fn test_parse_args_collects_warnings() {
        let args = parse_args_from(["--slots=3", "--generations=lots", "--bogus"]);
        assert_eq!(args.warnings.len(), 3);
        assert!(args.slots.is_none());
        assert_eq!(args.generations, RunOptions::default().generations);
    }

    #[test]
    fn test_invalid_override_fails_validation() {
        let args = parse_args_from(["--interval=0"]);
        assert!(matches!(args.load_config(), Err(ExpanderError::InvalidConfig(_))));
    }
}
