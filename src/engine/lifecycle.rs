use super::actuator::{Actuator, ExpandOutcome};
use super::change_source::{ChangeSource, InsertSink};
use super::document::HostDocument;
use super::queue::TargetQueue;
use super::scheduler::{ControlSurface, TickTimer};
use super::target::{Slot, TargetId};
use crate::config::ExpanderConfig;
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// 稼働中の集計値
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub ticks: u64,
    pub idle_ticks: u64,
    /// キューに入ったターゲット数
    pub discovered: u64,
    /// 待機中だったため捨てた通知数
    pub duplicates: u64,
    pub activated: u64,
    pub already_expanded: u64,
    /// コンテナまたはスロットが見つからなかった回数
    pub missing: u64,
}

impl EngineStats {
    fn record(&mut self, outcome: ExpandOutcome) {
        match outcome {
            ExpandOutcome::Activated => self.activated += 1,
            ExpandOutcome::AlreadyExpanded => self.already_expanded += 1,
            ExpandOutcome::ContainerMissing | ExpandOutcome::SlotMissing => self.missing += 1,
            ExpandOutcome::Inactive => {}
        }
    }
}

impl fmt::Display for EngineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ticks={} idle={} discovered={} duplicates={} activated={} already_expanded={} missing={}",
            self.ticks,
            self.idle_ticks,
            self.discovered,
            self.duplicates,
            self.activated,
            self.already_expanded,
            self.missing
        )
    }
}

/// 1回のtickで起きたこと
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// 停止中（キャンセル直前に予約されていたtick）
    Inactive,
    /// キューが空。稼働状態は維持する
    Idle,
    Processed {
        target: TargetId,
        results: Vec<(Slot, ExpandOutcome)>,
    },
}

// ========================================
// 自動展開エンジン
// ========================================

/// 自動展開エンジン本体
///
/// 状態はInactive / Activeの2つ。Activeの間だけ
/// 停止ボタン表示・構造監視・tickタイマーが揃って存在する。
/// キューは停止しても消さないので、再開すると残りから続ける。
/// 終了は利用者が停止ボタンを押したときだけ（キューが空でも自動停止しない）。
pub struct ExpansionEngine<D: HostDocument> {
    config: ExpanderConfig,
    active: Rc<Cell<bool>>,
    queue: Rc<RefCell<TargetQueue>>,
    stats: Rc<RefCell<EngineStats>>,
    actuator: Actuator<D>,
    source: Box<dyn ChangeSource>,
    timer: Box<dyn TickTimer>,
    control: Box<dyn ControlSurface>,
}

impl<D: HostDocument> ExpansionEngine<D> {
    pub fn new(
        config: ExpanderConfig,
        document: D,
        source: Box<dyn ChangeSource>,
        timer: Box<dyn TickTimer>,
        control: Box<dyn ControlSurface>,
    ) -> Self {
        let active = Rc::new(Cell::new(false));
        let actuator = Actuator::new(document, config.selectors.clone(), Rc::clone(&active));
        Self {
            config,
            active,
            queue: Rc::new(RefCell::new(TargetQueue::new())),
            stats: Rc::new(RefCell::new(EngineStats::default())),
            actuator,
            source,
            timer,
            control,
        }
    }

    pub fn config(&self) -> &ExpanderConfig {
        &self.config
    }

    pub fn document(&self) -> &D {
        self.actuator.document()
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.borrow().len()
    }

    /// 取り出される順の待機中ターゲット
    pub fn pending(&self) -> Vec<TargetId> {
        self.queue.borrow().pending().cloned().collect()
    }

    pub fn stats(&self) -> EngineStats {
        self.stats.borrow().clone()
    }

    /// 稼働フラグ・タイマー・停止ボタン・監視の整合性
    pub fn lifecycle_consistent(&self) -> bool {
        let active = self.active.get();
        active == self.timer.is_scheduled()
            && active == self.control.is_visible()
            && (active || !self.source.is_watching())
    }

    /// 構造監視からの通知を受けてキューに積むコールバック
    ///
    /// 通知は予約時点から状態が変わっている可能性があるので、毎回稼働中か確認する。
    fn sink(&self) -> InsertSink {
        let active = Rc::clone(&self.active);
        let queue = Rc::clone(&self.queue);
        let stats = Rc::clone(&self.stats);

        Rc::new(move |id: TargetId| {
            if !active.get() {
                log::trace!("Ignoring {} reported while inactive", id);
                return;
            }
            let admitted = queue.borrow_mut().enqueue(id.clone());
            let mut stats = stats.borrow_mut();
            if admitted {
                stats.discovered += 1;
                log::debug!("Queued {}", id);
            } else {
                stats.duplicates += 1;
            }
        })
    }

    fn ensure_watching(&mut self) {
        if self.source.is_watching() {
            return;
        }
        let sink = self.sink();
        match self.source.watch(sink) {
            Ok(()) => log::debug!("Watching for inserted couples"),
            Err(e) => log::warn!("Change watcher setup failed, will retry on next tick: {}", e),
        }
    }

    /// Inactive → Active。既に稼働中なら何もしない
    pub fn start(&mut self) -> bool {
        if self.active.get() {
            log::debug!("Auto-expansion already running");
            return false;
        }
        self.active.set(true);

        if let Err(e) = self.control.show() {
            log::error!("Failed to show stop control: {}", e);
            self.tear_down();
            return false;
        }

        self.ensure_watching();

        if !self.timer.is_scheduled() {
            if let Err(e) = self.timer.schedule(self.config.tick_interval_ms) {
                log::error!("Failed to schedule expansion tick: {}", e);
                self.tear_down();
                return false;
            }
        }

        log::info!(
            "▶ Auto-expansion started ({}ms interval, {} pending)",
            self.config.tick_interval_ms,
            self.queue_len()
        );
        true
    }

    /// Active → Inactive。キューはそのまま残す
    pub fn stop(&mut self) -> bool {
        if !self.active.get() {
            return false;
        }
        self.tear_down();
        log::info!(
            "⏹ Auto-expansion stopped ({} pending) {}",
            self.queue_len(),
            self.stats.borrow()
        );
        true
    }

    fn tear_down(&mut self) {
        self.active.set(false);
        self.timer.cancel();
        self.control.hide();
        self.source.unwatch();
    }

    /// キューから1件取り出して、設定されたスロットを展開する
    pub fn tick(&mut self) -> TickOutcome {
        if !self.active.get() {
            return TickOutcome::Inactive;
        }
        self.ensure_watching();
        self.stats.borrow_mut().ticks += 1;

        let next = self.queue.borrow_mut().dequeue();
        let Some(target) = next else {
            self.stats.borrow_mut().idle_ticks += 1;
            return TickOutcome::Idle;
        };

        let mut results = Vec::with_capacity(self.config.auto_slots.len());
        for &slot in &self.config.auto_slots {
            let outcome = self.actuator.expand(&target, slot);
            self.stats.borrow_mut().record(outcome);
            results.push((slot, outcome));
        }

        TickOutcome::Processed { target, results }
    }

    /// 手動ボタンからの入口: アンカー配下の展開ボタンを1回押し、自動モードに入る
    ///
    /// 監視を先に始めておき、クリックで挿入されたコンテナを取りこぼさないようにする。
    pub fn manual_expand(&mut self, anchor: &D::Node) -> ExpandOutcome {
        self.start();
        let outcome = self.actuator.activate_within(anchor);
        if outcome == ExpandOutcome::Activated {
            log::info!("Manual expansion triggered");
        } else {
            log::info!("Manual expansion: nothing to expand under this node");
        }
        outcome
    }
}
