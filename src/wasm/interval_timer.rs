use super::js_error;
use crate::engine::scheduler::TickTimer;
use crate::error::Result;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Window;

/// setIntervalによるtickタイマー
pub struct IntervalTimer {
    window: Window,
    on_tick: Rc<dyn Fn()>,
    handle: Option<i32>,
    // 解除後も最後のクロージャは次のscheduleまで保持する
    closure: Option<Closure<dyn FnMut()>>,
}

impl IntervalTimer {
    pub fn new(window: Window, on_tick: Rc<dyn Fn()>) -> Self {
        Self {
            window,
            on_tick,
            handle: None,
            closure: None,
        }
    }
}

impl TickTimer for IntervalTimer {
    fn schedule(&mut self, interval_ms: u32) -> Result<()> {
        if self.handle.is_some() {
            return Ok(());
        }

        let on_tick = Rc::clone(&self.on_tick);
        let closure = Closure::wrap(Box::new(move || on_tick()) as Box<dyn FnMut()>);
        let timeout = i32::try_from(interval_ms).unwrap_or(i32::MAX);
        let handle = self
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(closure.as_ref().unchecked_ref(), timeout)
            .map_err(js_error)?;

        self.handle = Some(handle);
        self.closure = Some(closure);
        log::debug!("⏰ Started expansion interval ({}ms)", interval_ms);
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.window.clear_interval_with_handle(handle);
            log::debug!("⏰ Stopped expansion interval");
        }
    }

    fn is_scheduled(&self) -> bool {
        self.handle.is_some()
    }
}
