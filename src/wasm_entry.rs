// WASM専用のエントリーポイント（content scriptから読み込まれる）

use crate::config::ExpanderConfig;
use crate::wasm::{build_engine, install_manual_controls, WebDocument, WebEngine};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

thread_local! {
    // ページが閉じるまでエンジンを保持する（各コールバックはWeakしか持たない）
    static INSTALLED: RefCell<Option<Rc<RefCell<WebEngine>>>> = const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub fn main() {
    // パニック時のエラーメッセージをブラウザコンソールに表示
    console_error_panic_hook::set_once();

    // WebAssembly用のロガーを初期化（二重初期化は無視）
    let _ = console_log::init_with_level(log::Level::Info);

    log::info!("ancestor_expander loaded");
}

/// 手動ボタンを差し込み、エンジンを待機状態で用意する
///
/// `config_json`で設定の一部を上書きできる。2回目以降の呼び出しは何もしない。
#[wasm_bindgen]
pub fn install(config_json: Option<String>) -> Result<(), JsValue> {
    if INSTALLED.with(|slot| slot.borrow().is_some()) {
        log::debug!("ancestor_expander already installed");
        return Ok(());
    }

    let config = match config_json {
        Some(json) => ExpanderConfig::from_json(&json),
        None => Ok(ExpanderConfig::default()),
    }
    .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = WebDocument::from_window().ok_or_else(|| JsValue::from_str("no document"))?;

    let engine = build_engine(window, document.clone(), config.clone());
    let mounted = install_manual_controls(&engine, document.raw(), &config);
    log::info!("Mounted {} manual control(s)", mounted);

    INSTALLED.with(|slot| *slot.borrow_mut() = Some(engine));
    Ok(())
}

/// 稼働中の自動展開を止める（コンソールからの操作用）
#[wasm_bindgen]
pub fn stop_expansion() -> bool {
    INSTALLED.with(|slot| {
        slot.borrow()
            .as_ref()
            .and_then(|engine| engine.try_borrow_mut().ok().map(|mut engine| engine.stop()))
            .unwrap_or(false)
    })
}
