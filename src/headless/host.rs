//! ヘッドレス環境でのエンジン周辺部品
//!
//! タイマーは予約状態を記録するだけで、実際の発火はランナーが行う。
//! 停止ボタンはメモリ上DOMに描画され、クリックでエンジンを止める。

use super::tree::{NodeId, ObserverId, SimDocument};
use crate::config::{ExpanderConfig, Selectors};
use crate::engine::change_source::{collect_inserted_couples, ChangeSource, InsertSink};
use crate::engine::document::HostDocument;
use crate::engine::lifecycle::{ExpansionEngine, TickOutcome};
use crate::engine::scheduler::{ControlSurface, TickTimer};
use crate::error::{ExpanderError, Result};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub const STOP_CONTROL_SELECTOR: &str = "[data-role=\"ancestor-expander-stop\"]";

pub type SimEngine = ExpansionEngine<SimDocument>;

// ========================================
// タイマー
// ========================================

#[derive(Debug, Default)]
struct TimerState {
    interval_ms: Option<u32>,
    schedules: u32,
}

/// 予約状態だけを持つタイマー。クローンは状態を共有する
#[derive(Debug, Clone, Default)]
pub struct ManualTimer {
    state: Rc<RefCell<TimerState>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interval_ms(&self) -> Option<u32> {
        self.state.borrow().interval_ms
    }

    /// これまでに予約された回数
    pub fn schedule_count(&self) -> u32 {
        self.state.borrow().schedules
    }
}

impl TickTimer for ManualTimer {
    fn schedule(&mut self, interval_ms: u32) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.interval_ms = Some(interval_ms);
        state.schedules += 1;
        Ok(())
    }

    fn cancel(&mut self) {
        self.state.borrow_mut().interval_ms = None;
    }

    fn is_scheduled(&self) -> bool {
        self.state.borrow().interval_ms.is_some()
    }
}

// ========================================
// 構造監視
// ========================================

/// メモリ上DOMの挿入通知を購読する変更ソース
pub struct SimChangeSource {
    document: SimDocument,
    selectors: Selectors,
    observer: Option<ObserverId>,
    setup_failures: u32,
}

impl SimChangeSource {
    pub fn new(document: SimDocument, selectors: Selectors) -> Self {
        Self {
            document,
            selectors,
            observer: None,
            setup_failures: 0,
        }
    }

    /// 最初の`failures`回の監視開始を失敗させる（ページ読み込み途中の再現）
    pub fn with_setup_failures(mut self, failures: u32) -> Self {
        self.setup_failures = failures;
        self
    }
}

impl ChangeSource for SimChangeSource {
    fn watch(&mut self, sink: InsertSink) -> Result<()> {
        if self.observer.is_some() {
            return Ok(());
        }
        if self.setup_failures > 0 {
            self.setup_failures -= 1;
            return Err(ExpanderError::Host("document is not ready for observation".to_string()));
        }

        let document = self.document.clone();
        let selectors = self.selectors.clone();
        let callback = Rc::new(move |node: NodeId| {
            for id in collect_inserted_couples(&document, &node, &selectors) {
                sink(id);
            }
        });
        self.observer = Some(self.document.observe(callback));
        Ok(())
    }

    fn unwatch(&mut self) {
        if let Some(id) = self.observer.take() {
            self.document.disconnect(id);
        }
    }

    fn is_watching(&self) -> bool {
        self.observer.is_some()
    }
}

// ========================================
// 停止ボタン
// ========================================

/// 画面下中央に固定される停止ボタン（メモリ上DOM版）
pub struct SimStopControl {
    document: SimDocument,
    label: String,
    on_click: Rc<dyn Fn()>,
    button: Option<NodeId>,
}

impl SimStopControl {
    pub fn new(document: SimDocument, label: &str, on_click: Rc<dyn Fn()>) -> Self {
        Self {
            document,
            label: label.to_string(),
            on_click,
            button: None,
        }
    }
}

impl ControlSurface for SimStopControl {
    fn show(&mut self) -> Result<()> {
        let button = match self.button {
            Some(button) => button,
            None => {
                let button = self.document.create_element(
                    "button",
                    &[
                        ("data-role", "ancestor-expander-stop"),
                        ("style", "position:fixed;bottom:16px;left:50%;transform:translateX(-50%);z-index:2147483647"),
                    ],
                );
                self.document.set_text(button, &self.label);
                self.document.add_click_listener(button, Rc::clone(&self.on_click));
                self.button = Some(button);
                button
            }
        };
        if !self.document.is_connected(button) {
            self.document.append_child(self.document.body(), button);
        }
        Ok(())
    }

    fn hide(&mut self) {
        if let Some(button) = self.button {
            self.document.remove(button);
        }
    }

    fn is_visible(&self) -> bool {
        self.button.is_some_and(|b| self.document.is_connected(b))
    }
}

// ========================================
// 組み立て
// ========================================

/// エンジンとヘッドレス部品一式
pub struct HeadlessHost {
    pub engine: Rc<RefCell<SimEngine>>,
    pub timer: ManualTimer,
    pub document: SimDocument,
}

impl HeadlessHost {
    pub fn new(document: SimDocument, config: ExpanderConfig) -> Self {
        Self::with_watch_failures(document, config, 0)
    }

    pub fn with_watch_failures(document: SimDocument, config: ExpanderConfig, failures: u32) -> Self {
        let timer = ManualTimer::new();
        let engine_timer = timer.clone();
        let doc = document.clone();

        let engine = Rc::new_cyclic(move |weak: &Weak<RefCell<SimEngine>>| {
            let weak = weak.clone();
            let on_stop: Rc<dyn Fn()> = Rc::new(move || {
                let Some(engine) = weak.upgrade() else {
                    return;
                };
                match engine.try_borrow_mut() {
                    Ok(mut engine) => {
                        engine.stop();
                    }
                    Err(_) => log::warn!("Stop control clicked while the engine was busy"),
                };
            });

            let control = SimStopControl::new(doc.clone(), &config.stop_label, on_stop);
            let source = SimChangeSource::new(doc.clone(), config.selectors.clone()).with_setup_failures(failures);
            RefCell::new(ExpansionEngine::new(
                config,
                doc,
                Box::new(source),
                Box::new(engine_timer),
                Box::new(control),
            ))
        });

        Self {
            engine,
            timer,
            document,
        }
    }

    /// 表示中の停止ボタンを押す。ボタンが無ければ`false`
    pub fn press_stop(&self) -> bool {
        match self.document.query_selector(None, STOP_CONTROL_SELECTOR) {
            Some(button) => {
                self.document.click(&button);
                true
            }
            None => false,
        }
    }

    /// タイマーが予約されていればtickを1回発火する
    pub fn fire_tick(&self) -> Option<TickOutcome> {
        if !self.timer.is_scheduled() {
            return None;
        }
        Some(self.engine.borrow_mut().tick())
    }
}
