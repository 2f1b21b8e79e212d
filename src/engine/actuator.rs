use super::document::HostDocument;
use super::target::{Slot, TargetId};
use crate::config::Selectors;
use std::cell::Cell;
use std::rc::Rc;

/// 展開操作の結果
///
/// `Activated`以外はすべて正常なno-op。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpandOutcome {
    /// エンジンが停止中
    Inactive,
    /// IDに対応するコンテナが無い（再描画で消えた等）
    ContainerMissing,
    /// コンテナ内に指定スロットが無い
    SlotMissing,
    /// 展開ボタンが無い（展開済み、またはまだ描画途中）
    AlreadyExpanded,
    /// 展開ボタンをクリックした
    Activated,
}

/// ターゲットIDから生きている要素を引き、「祖先を展開」ボタンを押す
pub struct Actuator<D: HostDocument> {
    document: D,
    selectors: Selectors,
    active: Rc<Cell<bool>>,
}

impl<D: HostDocument> Actuator<D> {
    pub fn new(document: D, selectors: Selectors, active: Rc<Cell<bool>>) -> Self {
        Self {
            document,
            selectors,
            active,
        }
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    /// ターゲットの指定スロットを展開する。要素は呼び出し時点のDOMから引き直す
    pub fn expand(&self, id: &TargetId, slot: Slot) -> ExpandOutcome {
        if !self.active.get() {
            return ExpandOutcome::Inactive;
        }

        let Some(container) = self
            .document
            .query_selector(None, &self.selectors.container_lookup(id))
        else {
            log::debug!("Container {} is gone, skipping", id);
            return ExpandOutcome::ContainerMissing;
        };

        let Some(slot_node) = self
            .document
            .query_selector(Some(&container), &self.selectors.slot_lookup(slot))
        else {
            log::debug!("Container {} has no slot {}", id, slot);
            return ExpandOutcome::SlotMissing;
        };

        match self.activate_within(&slot_node) {
            ExpandOutcome::Activated => {
                log::info!("Expanding ancestors of {} (slot {})", id, slot);
                ExpandOutcome::Activated
            }
            outcome => outcome,
        }
    }

    /// 任意のノード配下の最初の展開ボタンを押す（手動操作用、稼働状態は見ない）
    pub fn activate_within(&self, scope: &D::Node) -> ExpandOutcome {
        match self
            .document
            .query_selector(Some(scope), &self.selectors.expand_affordance)
        {
            Some(button) => {
                self.document.click(&button);
                ExpandOutcome::Activated
            }
            None => ExpandOutcome::AlreadyExpanded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::tree::SimDocument;

    fn setup() -> (SimDocument, Actuator<SimDocument>, Rc<Cell<bool>>) {
        let doc = SimDocument::new();
        let active = Rc::new(Cell::new(true));
        let actuator = Actuator::new(doc.clone(), Selectors::default(), Rc::clone(&active));
        (doc, actuator, active)
    }

    fn couple_with_button(doc: &SimDocument, id: &str, with_button: bool) -> usize {
        let couple = doc.create_element("div", &[("data-testid", id)]);
        let person = doc.create_element("div", &[("is-couple", ""), ("slot", "1")]);
        doc.append_child(couple, person);
        if with_button {
            let button = doc.create_element("button", &[("aria-label", "Expand Ancestors of someone")]);
            doc.append_child(person, button);
        }
        doc.append_child(doc.body(), couple);
        couple
    }

    #[test]
    fn test_missing_container_is_a_silent_noop() {
        let (doc, actuator, _) = setup();
        let outcome = actuator.expand(&TargetId::new("couple-X").unwrap(), Slot::One);
        assert_eq!(outcome, ExpandOutcome::ContainerMissing);
        assert!(doc.clicks().is_empty());
    }

    #[test]
    fn test_inactive_engine_never_clicks() {
        let (doc, actuator, active) = setup();
        couple_with_button(&doc, "couple-1", true);
        active.set(false);
        assert_eq!(
            actuator.expand(&TargetId::new("couple-1").unwrap(), Slot::One),
            ExpandOutcome::Inactive
        );
        assert!(doc.clicks().is_empty());
    }

    #[test]
    fn test_expand_clicks_affordance_in_requested_slot() {
        let (doc, actuator, _) = setup();
        couple_with_button(&doc, "couple-1", true);
        let id = TargetId::new("couple-1").unwrap();

        assert_eq!(actuator.expand(&id, Slot::Two), ExpandOutcome::SlotMissing);
        assert_eq!(actuator.expand(&id, Slot::One), ExpandOutcome::Activated);
        assert_eq!(doc.clicks().len(), 1);
    }

    #[test]
    fn test_expanded_slot_reports_already_expanded() {
        let (doc, actuator, _) = setup();
        couple_with_button(&doc, "couple-1", false);
        assert_eq!(
            actuator.expand(&TargetId::new("couple-1").unwrap(), Slot::One),
            ExpandOutcome::AlreadyExpanded
        );
        assert!(doc.clicks().is_empty());
    }

    #[test]
    fn test_manual_activation_ignores_engine_state() {
        let (doc, actuator, active) = setup();
        let couple = couple_with_button(&doc, "couple-1", true);
        active.set(false);
        assert_eq!(actuator.activate_within(&couple), ExpandOutcome::Activated);
        assert_eq!(doc.clicks().len(), 1);
    }
}
