use super::host::HeadlessHost;
use super::pedigree::PedigreePage;
use super::tree::SimDocument;
use crate::config::ExpanderConfig;
use crate::engine::actuator::ExpandOutcome;
use crate::engine::lifecycle::{EngineStats, TickOutcome};
use serde::Serialize;

/// ヘッドレス実行の条件
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// 家系図ページが表示できる世代数
    pub generations: u32,
    /// この回数tickしたら停止ボタンを押す
    pub max_ticks: u64,
    /// 連続してキューが空だったら停止ボタンを押す回数
    pub idle_ticks_before_stop: u32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            generations: 5,
            max_ticks: 10_000,
            idle_ticks_before_stop: 3,
        }
    }
}

/// 実行結果
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub stats: EngineStats,
    /// 表示されたカップル（表示順）
    pub couples: Vec<String>,
    pub ticks_fired: u64,
    pub pending: usize,
    pub stopped_by_user: bool,
}

/// 家系図ページ上でエンジンを動かす
///
/// 利用者の操作（手動ボタン、停止ボタン）もここで代行する。
pub struct HeadlessRunner {
    host: HeadlessHost,
    page: PedigreePage,
    options: RunOptions,
    ticks_fired: u64,
    idle_streak: u32,
    stopped_by_user: bool,
}

impl HeadlessRunner {
    pub fn new(config: ExpanderConfig, options: RunOptions) -> Self {
        let document = SimDocument::new();
        let page = PedigreePage::new(document.clone(), options.generations);
        let host = HeadlessHost::new(document, config);
        Self {
            host,
            page,
            options,
            ticks_fired: 0,
            idle_streak: 0,
            stopped_by_user: false,
        }
    }

    pub fn host(&self) -> &HeadlessHost {
        &self.host
    }

    pub fn page(&self) -> &PedigreePage {
        &self.page
    }

    /// 最初の人物コンテナの手動ボタンを押す
    pub fn begin(&mut self) -> ExpandOutcome {
        let anchor_selector = self.host.engine.borrow().config().selectors.person_anchor.clone();
        let Some(anchor) = self.page.person_anchors(&anchor_selector).into_iter().next() else {
            log::warn!("No person container to anchor the manual control");
            return ExpandOutcome::ContainerMissing;
        };
        self.host.engine.borrow_mut().manual_expand(&anchor)
    }

    /// ページを落ち着かせてからtickを1回。続行するなら`true`
    pub fn step(&mut self) -> bool {
        let revealed = self.page.settle();
        if revealed > 0 {
            log::debug!("Page revealed {} couple(s)", revealed);
        }

        match self.host.fire_tick() {
            None => return false,
            Some(TickOutcome::Idle) => self.idle_streak += 1,
            Some(TickOutcome::Processed { .. }) => self.idle_streak = 0,
            Some(TickOutcome::Inactive) => return false,
        }
        self.ticks_fired += 1;

        if self.idle_streak >= self.options.idle_ticks_before_stop || self.ticks_fired >= self.options.max_ticks {
            log::info!("Pressing stop after {} ticks", self.ticks_fired);
            self.stopped_by_user = self.host.press_stop();
            return false;
        }
        true
    }

    /// 待ち時間なしで最後まで回す
    pub fn run_to_completion(&mut self) -> RunReport {
        self.begin();
        while self.step() {}
        self.report()
    }

    /// 設定された間隔でtickを刻みながら回す
    #[cfg(feature = "native")]
    pub async fn run_paced(&mut self) -> RunReport {
        use tokio::time::{interval, Duration, MissedTickBehavior};

        let period = self.host.engine.borrow().config().tick_interval_ms.max(1);
        let mut ticker = interval(Duration::from_millis(u64::from(period)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.begin();
        loop {
            ticker.tick().await;
            if !self.step() {
                break;
            }
        }
        self.report()
    }

    pub fn report(&self) -> RunReport {
        let engine = self.host.engine.borrow();
        RunReport {
            stats: engine.stats(),
            couples: self.page.rendered_couples().to_vec(),
            ticks_fired: self.ticks_fired,
            pending: engine.queue_len(),
            stopped_by_user: self.stopped_by_user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::target::Slot;

    fn options(generations: u32) -> RunOptions {
        RunOptions {
            generations,
            ..RunOptions::default()
        }
    }

    #[test]
    fn test_slot_one_follows_a_single_line() {
        let mut runner = HeadlessRunner::new(ExpanderConfig::default(), options(4));
        let report = runner.run_to_completion();

        assert_eq!(report.couples, vec!["couple-2", "couple-4", "couple-8", "couple-16"]);
        assert_eq!(report.stats.activated, 2);
        assert_eq!(report.stats.already_expanded, 1);
        assert!(report.stopped_by_user);
        assert_eq!(report.pending, 0);
        assert!(!runner.host().engine.borrow().is_active());
        assert!(runner.host().engine.borrow().lifecycle_consistent());
    }

    #[test]
    fn test_both_slots_expand_the_whole_subtree() {
        let config = ExpanderConfig {
            auto_slots: vec![Slot::One, Slot::Two],
            ..ExpanderConfig::default()
        };
        let mut runner = HeadlessRunner::new(config, options(4));
        let report = runner.run_to_completion();

        let mut couples = report.couples.clone();
        couples.sort();
        assert_eq!(
            couples,
            vec!["couple-10", "couple-16", "couple-18", "couple-2", "couple-20", "couple-22", "couple-4", "couple-8"]
        );
        assert_eq!(report.stats.activated, 6);
        assert_eq!(report.stats.missing, 0);
    }

    #[test]
    fn test_newest_lineage_is_expanded_first() {
        let config = ExpanderConfig {
            auto_slots: vec![Slot::One, Slot::Two],
            ..ExpanderConfig::default()
        };
        let mut runner = HeadlessRunner::new(config, options(4));
        let report = runner.run_to_completion();

        // couple-4を展開すると8と10がこの順で現れ、後から来た10の家系が先に伸びる
        let position = |id: &str| report.couples.iter().position(|c| c == id).unwrap();
        assert!(position("couple-20") < position("couple-16"));
    }

    #[test]
    fn test_max_ticks_presses_stop_with_backlog() {
        let config = ExpanderConfig {
            auto_slots: vec![Slot::One, Slot::Two],
            ..ExpanderConfig::default()
        };
        let mut runner = HeadlessRunner::new(
            config,
            RunOptions {
                generations: 6,
                max_ticks: 2,
                idle_ticks_before_stop: 3,
            },
        );
        let report = runner.run_to_completion();
        assert_eq!(report.ticks_fired, 2);
        assert!(report.stopped_by_user);
        assert!(report.pending > 0);
    }

    #[cfg(feature = "native")]
    #[tokio::test]
    async fn test_paced_run_matches_unpaced_run() {
        let config = ExpanderConfig {
            tick_interval_ms: 1,
            ..ExpanderConfig::default()
        };
        let mut runner = HeadlessRunner::new(config, options(3));
        let report = runner.run_paced().await;
        assert_eq!(report.couples, vec!["couple-2", "couple-4", "couple-8"]);
        assert!(report.stopped_by_user);
    }
}
