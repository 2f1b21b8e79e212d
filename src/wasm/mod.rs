//! ブラウザ（content script）上のホスト実装
//!
//! web-sysでDOM・MutationObserver・setIntervalをエンジンの各トレイトに繋ぐ。
//! コールバックはエンジンを`Weak`で持ち、借用中なら何もしない。

pub mod web_document;
pub mod mutation_source;
pub mod interval_timer;
pub mod stop_control;
pub mod inline_controls;

use crate::config::ExpanderConfig;
use crate::engine::lifecycle::ExpansionEngine;
use crate::error::ExpanderError;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::JsValue;
use web_sys::{HtmlElement, Window};

pub use inline_controls::install_manual_controls;
pub use interval_timer::IntervalTimer;
pub use mutation_source::MutationChangeSource;
pub use stop_control::StopControl;
pub use web_document::WebDocument;

pub type WebEngine = ExpansionEngine<WebDocument>;

pub(crate) fn js_error(value: JsValue) -> ExpanderError {
    ExpanderError::Host(format!("{:?}", value))
}

pub(crate) fn set_styles(element: &HtmlElement, styles: &[(&str, &str)]) {
    let style = element.style();
    for (name, value) in styles {
        let _ = style.set_property(name, value);
    }
}

/// エンジンに対して`f`を実行する。破棄済み・借用中なら何もしない
fn with_engine(weak: &Weak<RefCell<WebEngine>>, what: &str, f: impl FnOnce(&mut WebEngine)) {
    let Some(engine) = weak.upgrade() else {
        return;
    };
    match engine.try_borrow_mut() {
        Ok(mut engine) => f(&mut engine),
        Err(_) => log::debug!("Skipping {}: engine is busy", what),
    };
}

/// ブラウザ用の部品を揃えてエンジンを組み立てる
pub fn build_engine(window: Window, document: WebDocument, config: ExpanderConfig) -> Rc<RefCell<WebEngine>> {
    Rc::new_cyclic(move |weak: &Weak<RefCell<WebEngine>>| {
        let tick_ref = weak.clone();
        let on_tick: Rc<dyn Fn()> = Rc::new(move || {
            with_engine(&tick_ref, "tick", |engine| {
                engine.tick();
            })
        });

        let stop_ref = weak.clone();
        let on_stop: Rc<dyn Fn()> = Rc::new(move || {
            with_engine(&stop_ref, "stop", |engine| {
                engine.stop();
            })
        });

        let timer = IntervalTimer::new(window, on_tick);
        let control = StopControl::new(document.raw().clone(), &config.stop_label, on_stop);
        let source = MutationChangeSource::new(document.clone(), config.selectors.clone());

        RefCell::new(ExpansionEngine::new(
            config,
            document,
            Box::new(source),
            Box::new(timer),
            Box::new(control),
        ))
    })
}
