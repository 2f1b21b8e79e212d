//! ヘッドレスDOM上に組み立てる家系図ページ
//!
//! 人物はアーネンタフェル番号で管理する（nの父が2n、母が2n+1）。
//! 人物nの「祖先を展開」ボタンを押すと、ページは次の`settle`で
//! 両親のカップル `couple-{2n}` を挿入し、ボタンを取り除く。
//! 世代が上限に達した人物にはボタンを付けない。

use super::tree::{NodeId, SimDocument};
use crate::engine::target::Slot;
use std::collections::HashSet;

const PERSON_ATTR: &str = "data-person";

/// 人物の世代（対象者1が0世代）
pub fn generation(person: u64) -> u32 {
    63 - person.max(1).leading_zeros()
}

pub struct PedigreePage {
    document: SimDocument,
    generations: u32,
    container: NodeId,
    rendered: HashSet<u64>,
    order: Vec<String>,
}

impl PedigreePage {
    /// 対象者の両親（人物2と3）のカップルだけが表示された状態で作る
    pub fn new(document: SimDocument, generations: u32) -> Self {
        let container = document.create_element("div", &[("id", "pedigree")]);
        document.append_child(document.body(), container);

        let mut page = Self {
            document,
            generations: generations.max(1),
            container,
            rendered: HashSet::new(),
            order: Vec::new(),
        };
        page.render_couple(2);
        page
    }

    pub fn document(&self) -> &SimDocument {
        &self.document
    }

    pub fn generations(&self) -> u32 {
        self.generations
    }

    /// 手動ボタンを差し込む対象になる人物コンテナ（初期表示分）
    pub fn person_anchors(&self, selector: &str) -> Vec<NodeId> {
        self.document.query_all_in_document(selector)
    }

    /// 指定人物の人物コンテナ
    pub fn person_node(&self, person: u64) -> Option<NodeId> {
        self.document
            .query_all_in_document(&format!("[{}=\"{}\"][slot]", PERSON_ATTR, person))
            .into_iter()
            .next()
    }

    /// 表示済みカップルのID（表示順）
    pub fn rendered_couples(&self) -> &[String] {
        &self.order
    }

    /// 未処理のクリックに反応して再描画し、挿入通知を配送する
    ///
    /// 新しく表示したカップル数を返す。
    pub fn settle(&mut self) -> usize {
        let mut inserted = 0;
        for clicked in self.document.take_pending_clicks() {
            let Some(person) = self
                .document
                .attribute_of(clicked, PERSON_ATTR)
                .and_then(|p| p.parse::<u64>().ok())
            else {
                continue;
            };
            if self.document.attribute_of(clicked, "aria-label").is_none() {
                continue;
            }

            self.document.remove(clicked);
            if self.render_couple(person * 2) {
                inserted += 1;
            }
        }
        self.document.flush_mutations();
        inserted
    }

    fn render_couple(&mut self, father: u64) -> bool {
        if !self.rendered.insert(father) {
            return false;
        }
        let id = format!("couple-{}", father);
        let couple = self.document.create_element("div", &[("data-testid", id.as_str())]);
        for (person, slot) in [(father, Slot::One), (father + 1, Slot::Two)] {
            let node = self.render_person(person, slot);
            self.document.append_child(couple, node);
        }
        self.document.append_child(self.container, couple);
        log::trace!("Page rendered {}", id);
        self.order.push(id);
        true
    }

    fn render_person(&self, person: u64, slot: Slot) -> NodeId {
        let person_str = person.to_string();
        let slot_str = slot.number().to_string();
        let node = self.document.create_element(
            "div",
            &[("is-couple", ""), ("slot", slot_str.as_str()), (PERSON_ATTR, person_str.as_str())],
        );
        self.document.set_text(node, &format!("Person {}", person));

        if generation(person) < self.generations {
            let label = format!("Expand Ancestors of Person {}", person);
            let button = self.document.create_element(
                "button",
                &[("aria-label", label.as_str()), (PERSON_ATTR, person_str.as_str())],
            );
            self.document.append_child(node, button);
        }
        node
    }
}
