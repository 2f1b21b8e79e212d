use super::{set_styles, web_document::elements, WebEngine};
use crate::config::ExpanderConfig;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, MouseEvent};

const WRAPPER_STYLES: &[(&str, &str)] = &[("position", "absolute"), ("bottom", "0")];

const BUTTON_STYLES: &[(&str, &str)] = &[
    ("font-size", "12px"),
    ("line-height", "1"),
    ("padding", "6px 8px"),
    ("border-radius", "6px"),
    ("border", "1px solid rgba(0,0,0,0.15)"),
    ("background", "linear-gradient(#fff,#f6f6f6)"),
    ("color", "#222"),
    ("cursor", "pointer"),
    ("box-shadow", "0 1px 0 rgba(0,0,0,0.05)"),
];

const HIGHLIGHT_OUTLINE: &str = "2px solid #3b82f6";

/// 現在表示されている人物コンテナそれぞれに手動ボタンを差し込む
///
/// 後から描画されたコンテナには付かない。差し込んだ数を返す。
pub fn install_manual_controls(engine: &Rc<RefCell<WebEngine>>, document: &Document, config: &ExpanderConfig) -> usize {
    let anchors = match document.query_selector_all(&config.selectors.person_anchor) {
        Ok(list) => elements(&list),
        Err(e) => {
            log::warn!("Person anchor query failed: {:?}", e);
            return 0;
        }
    };

    let mut installed = 0;
    for anchor in anchors {
        match mount(engine, document, config, anchor) {
            Some(()) => installed += 1,
            None => log::debug!("Could not mount manual control"),
        }
    }
    installed
}

fn mount(engine: &Rc<RefCell<WebEngine>>, document: &Document, config: &ExpanderConfig, anchor: Element) -> Option<()> {
    let wrapper = document.create_element("div").ok()?.dyn_into::<HtmlElement>().ok()?;
    set_styles(&wrapper, WRAPPER_STYLES);

    let button = document.create_element("button").ok()?.dyn_into::<HtmlElement>().ok()?;
    button.set_attribute("type", "button").ok()?;
    button.set_text_content(Some(&config.manual_label));
    set_styles(&button, BUTTON_STYLES);
    wrapper.append_child(&button).ok()?;

    let weak = Rc::downgrade(engine);
    let highlight_ms = config.highlight_ms;
    let target = anchor.clone();
    let listener = Closure::wrap(Box::new(move |event: MouseEvent| {
        event.stop_propagation();
        event.prevent_default();
        highlight(&target, highlight_ms);

        let Some(engine) = weak.upgrade() else {
            return;
        };
        match engine.try_borrow_mut() {
            Ok(mut engine) => {
                engine.manual_expand(&target);
            }
            Err(_) => log::warn!("Manual control clicked while the engine was busy"),
        };
    }) as Box<dyn FnMut(MouseEvent)>);
    button
        .add_event_listener_with_callback("click", listener.as_ref().unchecked_ref())
        .ok()?;
    // ページが閉じるまで生かす
    listener.forget();

    anchor.insert_adjacent_element("afterbegin", &wrapper).ok()?;
    Some(())
}

/// コンテナを一定時間だけ青枠で囲む
fn highlight(anchor: &Element, duration_ms: u32) {
    let Some(element) = anchor.dyn_ref::<HtmlElement>() else {
        return;
    };
    let Some(window) = web_sys::window() else {
        return;
    };

    let style = element.style();
    let previous = style.get_property_value("outline").unwrap_or_default();
    let _ = style.set_property("outline", HIGHLIGHT_OUTLINE);

    let element = element.clone();
    let restore = Closure::once_into_js(move || {
        let _ = element.style().set_property("outline", &previous);
    });
    let timeout = i32::try_from(duration_ms).unwrap_or(i32::MAX);
    let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(restore.unchecked_ref(), timeout);
}
