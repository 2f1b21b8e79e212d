use super::target::TargetId;
use std::collections::HashSet;

/// 展開待ちターゲットのキュー
///
/// 重複を許さないスタック（LIFO）。新しく現れた祖先ほど先に処理されるので、
/// 一つの家系を上へ上へと辿ってから横に広がる。
/// `order`と`pending`は常に同じ集合を保持する。
#[derive(Debug, Default)]
pub struct TargetQueue {
    order: Vec<TargetId>,
    pending: HashSet<TargetId>,
}

impl TargetQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// ターゲットを追加。既に待機中なら何もしない
    pub fn enqueue(&mut self, id: TargetId) -> bool {
        if self.pending.contains(&id) {
            return false;
        }
        self.pending.insert(id.clone());
        self.order.push(id);
        true
    }

    /// 文字列から追加（空文字は無視）
    pub fn enqueue_str(&mut self, id: &str) -> bool {
        match TargetId::new(id) {
            Some(id) => self.enqueue(id),
            None => false,
        }
    }

    /// 最後に追加されたターゲットを取り出す
    pub fn dequeue(&mut self) -> Option<TargetId> {
        let id = self.order.pop()?;
        self.pending.remove(&id);
        Some(id)
    }

    pub fn contains(&self, id: &TargetId) -> bool {
        self.pending.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// 取り出される順（新しい順）に列挙
    pub fn pending(&self) -> impl Iterator<Item = &TargetId> {
        self.order.iter().rev()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> TargetId {
        TargetId::new(s).unwrap()
    }

    #[test]
    fn test_duplicates_collapse_to_first_position() {
        let mut queue = TargetQueue::new();
        assert!(queue.enqueue(id("a")));
        assert!(queue.enqueue(id("b")));
        assert!(!queue.enqueue(id("a")));
        assert!(queue.enqueue(id("c")));
        assert!(!queue.enqueue_str(""));

        assert_eq!(queue.len(), 3);
        let order: Vec<&str> = queue.pending().map(|t| t.as_str()).collect();
        assert_eq!(order, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_dequeue_is_lifo_and_empty_signal() {
        let mut queue = TargetQueue::new();
        assert_eq!(queue.dequeue(), None);

        queue.enqueue_str("couple-A");
        queue.enqueue_str("couple-B");
        assert_eq!(queue.dequeue(), Some(id("couple-B")));
        queue.enqueue_str("couple-C");
        assert_eq!(queue.dequeue(), Some(id("couple-C")));
        assert_eq!(queue.dequeue(), Some(id("couple-A")));
        assert_eq!(queue.dequeue(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_popped_id_can_be_readmitted() {
        let mut queue = TargetQueue::new();
        queue.enqueue_str("x");
        let popped = queue.dequeue().unwrap();
        assert!(!queue.contains(&popped));
        assert!(queue.enqueue(popped.clone()));
        assert!(queue.contains(&popped));
    }

    #[test]
    fn test_pending_set_matches_distinct_ids() {
        let input = ["d", "a", "", "d", "b", "a", "c", "b"];
        let mut queue = TargetQueue::new();
        for s in input {
            queue.enqueue_str(s);
        }

        let mut seen: Vec<&str> = queue.pending().map(|t| t.as_str()).collect();
        seen.sort();
        assert_eq!(seen, vec!["a", "b", "c", "d"]);

        let mut drained = Vec::new();
        while let Some(t) = queue.dequeue() {
            drained.push(t.as_str().to_string());
        }
        assert_eq!(drained, vec!["c", "b", "a", "d"]);
    }
}
