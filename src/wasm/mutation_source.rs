use super::{js_error, WebDocument};
use crate::config::Selectors;
use crate::engine::change_source::{collect_inserted_couples, ChangeSource, InsertSink};
use crate::error::{ExpanderError, Result};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, MutationObserver, MutationObserverInit, MutationRecord};

type ObserverCallback = Closure<dyn FnMut(js_sys::Array, MutationObserver)>;

/// MutationObserverで挿入されたカップルコンテナを拾う変更ソース
pub struct MutationChangeSource {
    document: WebDocument,
    selectors: Selectors,
    observer: Option<(MutationObserver, ObserverCallback)>,
}

impl MutationChangeSource {
    pub fn new(document: WebDocument, selectors: Selectors) -> Self {
        Self {
            document,
            selectors,
            observer: None,
        }
    }
}

impl ChangeSource for MutationChangeSource {
    fn watch(&mut self, sink: InsertSink) -> Result<()> {
        if self.observer.is_some() {
            return Ok(());
        }

        // 読み込み途中だとdocumentElementがまだ無いことがある
        let target = self
            .document
            .raw()
            .document_element()
            .ok_or_else(|| ExpanderError::Host("document has no root element yet".to_string()))?;

        let document = self.document.clone();
        let selectors = self.selectors.clone();
        let callback: ObserverCallback = Closure::wrap(Box::new(move |records: js_sys::Array, _observer: MutationObserver| {
            for record in records.iter() {
                let Ok(record) = record.dyn_into::<MutationRecord>() else {
                    continue;
                };
                let added = record.added_nodes();
                for i in 0..added.length() {
                    let Some(node) = added.item(i) else {
                        continue;
                    };
                    let Ok(element) = node.dyn_into::<Element>() else {
                        continue;
                    };
                    for id in collect_inserted_couples(&document, &element, &selectors) {
                        sink(id);
                    }
                }
            }
        }) as Box<dyn FnMut(js_sys::Array, MutationObserver)>);

        let observer = MutationObserver::new(callback.as_ref().unchecked_ref()).map_err(js_error)?;
        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        observer.observe_with_options(&target, &init).map_err(js_error)?;

        self.observer = Some((observer, callback));
        Ok(())
    }

    fn unwatch(&mut self) {
        if let Some((observer, _callback)) = self.observer.take() {
            observer.disconnect();
        }
    }

    fn is_watching(&self) -> bool {
        self.observer.is_some()
    }
}
