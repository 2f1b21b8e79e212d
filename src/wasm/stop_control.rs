use super::{js_error, set_styles};
use crate::engine::scheduler::ControlSurface;
use crate::error::{ExpanderError, Result};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement, MouseEvent};

const STOP_STYLES: &[(&str, &str)] = &[
    ("position", "fixed"),
    ("bottom", "16px"),
    ("left", "50%"),
    ("transform", "translateX(-50%)"),
    ("z-index", "2147483647"),
    ("font-size", "13px"),
    ("padding", "8px 14px"),
    ("border-radius", "6px"),
    ("border", "1px solid rgba(0,0,0,0.2)"),
    ("background", "#dc2626"),
    ("color", "#fff"),
    ("cursor", "pointer"),
    ("box-shadow", "0 2px 6px rgba(0,0,0,0.25)"),
];

/// 画面下中央に固定表示する停止ボタン
///
/// 要素とクリックハンドラは初回表示時に一度だけ作り、以降は付け外しだけ行う。
pub struct StopControl {
    document: Document,
    label: String,
    on_click: Rc<dyn Fn()>,
    element: Option<HtmlElement>,
    _listener: Option<Closure<dyn FnMut(MouseEvent)>>,
}

impl StopControl {
    pub fn new(document: Document, label: &str, on_click: Rc<dyn Fn()>) -> Self {
        Self {
            document,
            label: label.to_string(),
            on_click,
            element: None,
            _listener: None,
        }
    }

    fn build(&mut self) -> Result<HtmlElement> {
        let element = self
            .document
            .create_element("button")
            .map_err(js_error)?
            .dyn_into::<HtmlElement>()
            .map_err(|_| ExpanderError::Host("created element is not an HtmlElement".to_string()))?;

        element.set_attribute("type", "button").map_err(js_error)?;
        element.set_attribute("data-role", "ancestor-expander-stop").map_err(js_error)?;
        element.set_text_content(Some(&self.label));
        set_styles(&element, STOP_STYLES);

        let on_click = Rc::clone(&self.on_click);
        let listener = Closure::wrap(Box::new(move |event: MouseEvent| {
            event.stop_propagation();
            event.prevent_default();
            on_click();
        }) as Box<dyn FnMut(MouseEvent)>);
        element
            .add_event_listener_with_callback("click", listener.as_ref().unchecked_ref())
            .map_err(js_error)?;

        self.element = Some(element.clone());
        self._listener = Some(listener);
        Ok(element)
    }
}

impl ControlSurface for StopControl {
    fn show(&mut self) -> Result<()> {
        let element = match &self.element {
            Some(element) => element.clone(),
            None => self.build()?,
        };
        if element.is_connected() {
            return Ok(());
        }
        let body = self
            .document
            .body()
            .ok_or_else(|| ExpanderError::Host("document has no body".to_string()))?;
        body.append_child(&element).map_err(js_error)?;
        Ok(())
    }

    fn hide(&mut self) {
        if let Some(element) = &self.element {
            element.remove();
        }
    }

    fn is_visible(&self) -> bool {
        self.element.as_ref().is_some_and(|e| e.is_connected())
    }
}
