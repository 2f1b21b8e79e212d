/// ホストページのDOMへのアクセス
///
/// ブラウザでは`web_sys::Element`、ヘッドレス環境ではノード番号が`Node`になる。
/// どの操作も「見つからない」が正常系なので`Option`/空の`Vec`で返す。
pub trait HostDocument {
    type Node: Clone;

    /// `scope`（`None`ならドキュメント全体）の中で最初に一致する要素
    fn query_selector(&self, scope: Option<&Self::Node>, selector: &str) -> Option<Self::Node>;

    /// `scope`の子孫で一致する要素すべて（`scope`自身は含まない）
    fn query_selector_all(&self, scope: &Self::Node, selector: &str) -> Vec<Self::Node>;

    fn matches(&self, node: &Self::Node, selector: &str) -> bool;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    /// 要素をクリックする（ホストページ側のハンドラが動く）
    fn click(&self, node: &Self::Node);
}
