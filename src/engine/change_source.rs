use super::document::HostDocument;
use super::target::TargetId;
use crate::config::Selectors;
use crate::error::Result;
use std::rc::Rc;

/// 新しく挿入されたカップルコンテナの通知先
pub type InsertSink = Rc<dyn Fn(TargetId)>;

/// ドキュメントの構造変化を監視して、挿入されたカップルコンテナを報告する
///
/// 通知は非同期（ホストのイベントループ上）で届く。重複の排除はしない。
pub trait ChangeSource {
    /// 監視を開始する。既に監視中なら何もしない
    fn watch(&mut self, sink: InsertSink) -> Result<()>;

    fn unwatch(&mut self);

    fn is_watching(&self) -> bool;
}

/// 挿入されたノードから報告すべきカップルコンテナのIDを集める
///
/// ノード自身が一致すればそれを、さらに子孫で一致するものをすべて返す。
/// 祖先は見ない。ID属性が無い・空のコンテナは無視する。
pub fn collect_inserted_couples<D: HostDocument>(
    document: &D,
    inserted: &D::Node,
    selectors: &Selectors,
) -> Vec<TargetId> {
    let mut found = Vec::new();
    if document.matches(inserted, &selectors.couple) {
        found.push(inserted.clone());
    }
    found.extend(document.query_selector_all(inserted, &selectors.couple));

    found
        .iter()
        .filter_map(|node| document.attribute(node, &selectors.id_attribute))
        .filter_map(TargetId::new)
        .collect()
}
