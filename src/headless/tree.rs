//! ヘッドレス環境用のメモリ上DOM
//!
//! ブラウザのDOMのうちエンジンが触る部分だけを再現する:
//! 要素の追加・削除、CSSセレクタでの検索、クリック、
//! そしてMutationObserverと同じく「非同期にまとめて届く」挿入通知。
//! 通知は`flush_mutations`を呼んだ時点で配送される（マイクロタスク相当）。
//!
//! セレクタの照合は、木をHTMLに書き出して`scraper`で読み直したものに対して行う。
//! 各要素には`data-sim-node`属性でノード番号を載せておき、結果を引き戻す。

use crate::engine::document::HostDocument;
use crate::selector;
use scraper::{Html, Selector};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub type NodeId = usize;
pub type ObserverId = u64;

const NODE_ATTR: &str = "data-sim-node";

type InsertCallback = Rc<dyn Fn(NodeId)>;
type ClickListener = Rc<dyn Fn()>;

#[derive(Debug)]
struct SimNode {
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

struct Observer {
    id: ObserverId,
    callback: InsertCallback,
    records: Vec<NodeId>,
}

#[derive(Default)]
struct SimTree {
    nodes: Vec<SimNode>,
    root: NodeId,
    body: NodeId,
    observers: Vec<Observer>,
    next_observer: ObserverId,
    listeners: HashMap<NodeId, Vec<ClickListener>>,
    clicks: Vec<NodeId>,
    pending_clicks: Vec<NodeId>,
    selector_cache: HashMap<String, Option<Selector>>,
    /// 構造が変わるたびに進む
    revision: u64,
    snapshot_revision: u64,
    /// 根ノードごとの照合用HTML
    snapshots: HashMap<NodeId, Html>,
}

impl SimTree {
    fn push_node(&mut self, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        self.nodes.push(SimNode {
            tag: tag.to_ascii_lowercase(),
            attrs: attrs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes
            .get(node)?
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn is_connected(&self, mut node: NodeId) -> bool {
        loop {
            if node == self.root {
                return true;
            }
            match self.nodes.get(node).and_then(|n| n.parent) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    fn root_of(&self, mut node: NodeId) -> NodeId {
        while let Some(parent) = self.nodes[node].parent {
            node = parent;
        }
        node
    }

    /// `node`が`scope`の真の子孫か
    fn is_descendant(&self, node: NodeId, scope: NodeId) -> bool {
        let mut current = self.nodes.get(node).and_then(|n| n.parent);
        while let Some(parent) = current {
            if parent == scope {
                return true;
            }
            current = self.nodes[parent].parent;
        }
        false
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node].parent.take() {
            self.nodes[parent].children.retain(|&c| c != node);
            self.revision += 1;
        }
    }

    // ========================================
    // セレクタ照合
    // ========================================

    fn selector(&mut self, source: &str) -> Option<Selector> {
        self.selector_cache
            .entry(source.to_string())
            .or_insert_with(|| selector::parse(source).ok())
            .clone()
    }

    fn serialize(&self, node: NodeId, out: &mut String) {
        let n = &self.nodes[node];
        out.push('<');
        out.push_str(&n.tag);
        out.push_str(&format!(" {}=\"{}\"", NODE_ATTR, node));
        for (name, value) in n.attrs.iter().filter(|(name, _)| name != NODE_ATTR) {
            out.push_str(&format!(" {}=\"{}\"", name, escape_html(value)));
        }
        out.push('>');
        out.push_str(&escape_html(&n.text));
        for &child in &n.children {
            self.serialize(child, out);
        }
        out.push_str(&format!("</{}>", n.tag));
    }

    /// `root`を根とする木の照合用HTML。構造が変わっていれば作り直す
    fn snapshot(&mut self, root: NodeId) -> &Html {
        if self.snapshot_revision != self.revision {
            self.snapshots.clear();
            self.snapshot_revision = self.revision;
        }
        if !self.snapshots.contains_key(&root) {
            let mut markup = String::new();
            self.serialize(root, &mut markup);
            let html = if root == self.root {
                Html::parse_document(&markup)
            } else {
                // 文書から外れた部分木
                Html::parse_fragment(&markup)
            };
            self.snapshots.insert(root, html);
        }
        &self.snapshots[&root]
    }

    /// `root`の木の中で一致する要素（文書順）
    fn select(&mut self, root: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.snapshot(root)
            .select(selector)
            .filter_map(|element| element.value().attr(NODE_ATTR))
            .filter_map(|id| id.parse().ok())
            .collect()
    }
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// 共有ハンドル。クローンしても同じ文書を指す
#[derive(Clone)]
pub struct SimDocument {
    inner: Rc<RefCell<SimTree>>,
}

impl Default for SimDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl SimDocument {
    /// `<html><body></body></html>` だけの文書
    pub fn new() -> Self {
        let mut tree = SimTree::default();
        let root = tree.push_node("html", &[]);
        let body = tree.push_node("body", &[]);
        tree.nodes[body].parent = Some(root);
        tree.nodes[root].children.push(body);
        tree.root = root;
        tree.body = body;
        Self {
            inner: Rc::new(RefCell::new(tree)),
        }
    }

    pub fn body(&self) -> NodeId {
        self.inner.borrow().body
    }

    pub fn create_element(&self, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        self.inner.borrow_mut().push_node(tag, attrs)
    }

    /// 子要素を末尾に追加。文書に接続されていれば監視者に記録を積む
    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        let mut tree = self.inner.borrow_mut();
        if parent >= tree.nodes.len() || child >= tree.nodes.len() || parent == child {
            return;
        }
        // 自分の子孫の下には入れられない
        if tree.is_descendant(parent, child) {
            return;
        }
        tree.detach(child);
        tree.nodes[child].parent = Some(parent);
        tree.nodes[parent].children.push(child);
        tree.revision += 1;

        if tree.is_connected(parent) {
            for observer in tree.observers.iter_mut() {
                observer.records.push(child);
            }
        }
    }

    pub fn remove(&self, node: NodeId) {
        let mut tree = self.inner.borrow_mut();
        if node < tree.nodes.len() {
            tree.detach(node);
        }
    }

    pub fn set_text(&self, node: NodeId, text: &str) {
        if let Some(n) = self.inner.borrow_mut().nodes.get_mut(node) {
            n.text = text.to_string();
        }
    }

    pub fn text(&self, node: NodeId) -> String {
        self.inner
            .borrow()
            .nodes
            .get(node)
            .map(|n| n.text.clone())
            .unwrap_or_default()
    }

    pub fn attribute_of(&self, node: NodeId, name: &str) -> Option<String> {
        self.inner.borrow().attr(node, name).map(str::to_string)
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        node < self.inner.borrow().nodes.len() && self.inner.borrow().is_connected(node)
    }

    /// 文書全体から一致する要素を列挙
    pub fn query_all_in_document(&self, selector: &str) -> Vec<NodeId> {
        let root = self.inner.borrow().root;
        self.query_selector_all(&root, selector)
    }

    pub fn add_click_listener(&self, node: NodeId, listener: Rc<dyn Fn()>) {
        self.inner
            .borrow_mut()
            .listeners
            .entry(node)
            .or_default()
            .push(listener);
    }

    /// これまでにクリックされた要素（古い順）
    pub fn clicks(&self) -> Vec<NodeId> {
        self.inner.borrow().clicks.clone()
    }

    /// ホストページ側がまだ処理していないクリックを取り出す
    pub fn take_pending_clicks(&self) -> Vec<NodeId> {
        std::mem::take(&mut self.inner.borrow_mut().pending_clicks)
    }

    // ========================================
    // 挿入監視（MutationObserver相当）
    // ========================================

    pub fn observe(&self, callback: Rc<dyn Fn(NodeId)>) -> ObserverId {
        let mut tree = self.inner.borrow_mut();
        tree.next_observer += 1;
        let id = tree.next_observer;
        tree.observers.push(Observer {
            id,
            callback,
            records: Vec::new(),
        });
        id
    }

    /// 監視を解除。未配送の記録も捨てる
    pub fn disconnect(&self, id: ObserverId) {
        self.inner.borrow_mut().observers.retain(|o| o.id != id);
    }

    pub fn observer_count(&self) -> usize {
        self.inner.borrow().observers.len()
    }

    /// 溜まった挿入記録を配送する。配送した記録数を返す
    pub fn flush_mutations(&self) -> usize {
        let batches: Vec<(InsertCallback, Vec<NodeId>)> = {
            let mut tree = self.inner.borrow_mut();
            tree.observers
                .iter_mut()
                .filter(|o| !o.records.is_empty())
                .map(|o| (Rc::clone(&o.callback), std::mem::take(&mut o.records)))
                .collect()
        };

        let mut delivered = 0;
        for (callback, records) in batches {
            for node in records {
                callback(node);
                delivered += 1;
            }
        }
        delivered
    }
}

impl HostDocument for SimDocument {
    type Node = NodeId;

    fn query_selector(&self, scope: Option<&NodeId>, selector: &str) -> Option<NodeId> {
        let mut tree = self.inner.borrow_mut();
        let parsed = tree.selector(selector)?;
        let scope = scope.copied().unwrap_or(tree.root);
        if scope >= tree.nodes.len() {
            return None;
        }
        // ブラウザと同じく、照合は木全体で行い、結果をscope配下に絞る
        let root = tree.root_of(scope);
        tree.select(root, &parsed)
            .into_iter()
            .find(|&node| tree.is_descendant(node, scope))
    }

    fn query_selector_all(&self, scope: &NodeId, selector: &str) -> Vec<NodeId> {
        let mut tree = self.inner.borrow_mut();
        let Some(parsed) = tree.selector(selector) else {
            return Vec::new();
        };
        if *scope >= tree.nodes.len() {
            return Vec::new();
        }
        let root = tree.root_of(*scope);
        tree.select(root, &parsed)
            .into_iter()
            .filter(|&node| tree.is_descendant(node, *scope))
            .collect()
    }

    fn matches(&self, node: &NodeId, selector: &str) -> bool {
        let mut tree = self.inner.borrow_mut();
        let Some(parsed) = tree.selector(selector) else {
            return false;
        };
        if *node >= tree.nodes.len() {
            return false;
        }
        let root = tree.root_of(*node);
        tree.select(root, &parsed).contains(node)
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.attribute_of(*node, name)
    }

    /// クリックを記録し、登録済みリスナーを同期的に呼ぶ
    fn click(&self, node: &NodeId) {
        let listeners = {
            let mut tree = self.inner.borrow_mut();
            if *node >= tree.nodes.len() {
                return;
            }
            tree.clicks.push(*node);
            tree.pending_clicks.push(*node);
            tree.listeners.get(node).cloned().unwrap_or_default()
        };
        for listener in listeners {
            listener();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_query_in_document_order() {
        let doc = SimDocument::new();
        let outer = doc.create_element("div", &[("data-testid", "couple-1")]);
        let inner = doc.create_element("div", &[("data-testid", "couple-2")]);
        let later = doc.create_element("div", &[("data-testid", "couple-3")]);
        doc.append_child(outer, inner);
        doc.append_child(doc.body(), outer);
        doc.append_child(doc.body(), later);

        let found = doc.query_all_in_document(r#"[data-testid^="couple-"]"#);
        assert_eq!(found, vec![outer, inner, later]);
        assert_eq!(doc.query_selector(Some(&outer), r#"[data-testid^="couple-"]"#), Some(inner));
        assert!(doc.matches(&later, "div"));
        assert!(doc.matches(&later, "body > div"));
        assert!(!doc.matches(&later, "div > div"));
    }

    #[test]
    fn test_full_css_selectors_match_like_the_browser() {
        let doc = SimDocument::new();
        let page = doc.create_element("div", &[("id", "pedigree")]);
        let a = doc.create_element("div", &[("class", "couple wide"), ("data-testid", "couple-1")]);
        let b = doc.create_element("div", &[("data-test-id", "couple-2")]);
        let outside = doc.create_element("div", &[("data-testid", "couple-3")]);
        doc.append_child(page, a);
        doc.append_child(page, b);
        doc.append_child(doc.body(), page);
        doc.append_child(doc.body(), outside);

        assert_eq!(doc.query_all_in_document(r#"#pedigree [data-testid^="couple-"]"#), vec![a]);
        assert_eq!(doc.query_all_in_document(r#"div.couple[data-testid^="couple-"]"#), vec![a]);
        assert_eq!(
            doc.query_all_in_document(r#"[data-testid^="couple-"], [data-test-id^="couple-"]"#),
            vec![a, b, outside]
        );
        assert_eq!(doc.query_all_in_document(r#"[data-testid|="couple"]"#), vec![a, outside]);
        assert!(doc.matches(&b, "#pedigree > div"));
        assert!(!doc.matches(&outside, "#pedigree > div"));

        // 祖先側の条件はscopeの外も見る（Element.querySelectorと同じ）
        assert_eq!(doc.query_selector(Some(&a), "#pedigree div"), None);
        let inner = doc.create_element("span", &[]);
        doc.append_child(a, inner);
        assert_eq!(doc.query_selector(Some(&a), "#pedigree span"), Some(inner));
    }

    #[test]
    fn test_detached_subtrees_are_matched_on_their_own() {
        let doc = SimDocument::new();
        let wrapper = doc.create_element("section", &[]);
        let couple = doc.create_element("div", &[("data-testid", "couple-9")]);
        doc.append_child(wrapper, couple);

        assert!(doc.matches(&couple, "section > [data-testid]"));
        assert_eq!(doc.query_selector_all(&wrapper, "[data-testid]"), vec![couple]);
        assert_eq!(doc.query_selector(None, "[data-testid]"), None);

        // 構造が変われば結果も変わる
        doc.append_child(doc.body(), wrapper);
        assert_eq!(doc.query_selector(None, "[data-testid]"), Some(couple));
        doc.remove(couple);
        assert_eq!(doc.query_selector(None, "[data-testid]"), None);
    }

    #[test]
    fn test_cannot_append_ancestor_under_descendant() {
        let doc = SimDocument::new();
        let outer = doc.create_element("div", &[]);
        let inner = doc.create_element("div", &[]);
        doc.append_child(outer, inner);
        doc.append_child(inner, outer);
        assert_eq!(doc.query_selector_all(&outer, "div"), vec![inner]);
    }

    #[test]
    fn test_mutations_are_delivered_on_flush_only() {
        let doc = SimDocument::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = doc.observe(Rc::new(move |node| sink.borrow_mut().push(node)));

        // 未接続の親への追加は記録されない
        let detached = doc.create_element("div", &[]);
        let child = doc.create_element("span", &[]);
        doc.append_child(detached, child);

        doc.append_child(doc.body(), detached);
        assert!(seen.borrow().is_empty());
        assert_eq!(doc.flush_mutations(), 1);
        assert_eq!(*seen.borrow(), vec![detached]);

        doc.append_child(doc.body(), doc.create_element("p", &[]));
        doc.disconnect(id);
        assert_eq!(doc.flush_mutations(), 0);
        assert_eq!(doc.observer_count(), 0);
    }

    #[test]
    fn test_removed_nodes_are_not_found() {
        let doc = SimDocument::new();
        let node = doc.create_element("div", &[("data-testid", "x")]);
        doc.append_child(doc.body(), node);
        assert!(doc.is_connected(node));
        doc.remove(node);
        assert!(!doc.is_connected(node));
        assert_eq!(doc.query_selector(None, r#"[data-testid="x"]"#), None);
    }

    #[test]
    fn test_click_runs_listeners_and_queues_for_page() {
        let doc = SimDocument::new();
        let button = doc.create_element("button", &[]);
        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        doc.add_click_listener(button, Rc::new(move || *counter.borrow_mut() += 1));

        doc.click(&button);
        assert_eq!(*hits.borrow(), 1);
        assert_eq!(doc.take_pending_clicks(), vec![button]);
        assert!(doc.take_pending_clicks().is_empty());
        assert_eq!(doc.clicks(), vec![button]);
    }
}
