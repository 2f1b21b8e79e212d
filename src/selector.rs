//! CSSセレクタの解析と組み立て
//!
//! 解析は`scraper`に任せる。ブラウザでは文字列のまま`querySelector`に渡すので、
//! ここでの解析は設定の検証とヘッドレスDOMでのマッチングに使う。

use crate::error::{ExpanderError, Result};
use scraper::Selector;

/// セレクタ文字列を解析する（セレクタリスト・結合子・擬似クラスも可）
pub fn parse(source: &str) -> Result<Selector> {
    if source.trim().is_empty() {
        return Err(ExpanderError::invalid_selector(source, "empty selector"));
    }
    Selector::parse(source).map_err(|e| ExpanderError::invalid_selector(source, e.to_string()))
}

/// 属性名として使える文字列か
pub fn is_attribute_name(name: &str) -> bool {
    !name.trim().is_empty() && Selector::parse(&format!("[{}]", name)).is_ok()
}

/// `[name="value"]` 形式の完全一致セレクタを組み立てる
pub fn attribute_equals(name: &str, value: &str) -> String {
    format!("[{}=\"{}\"]", name, escape_string(value))
}

/// CSS文字列リテラル用のエスケープ
///
/// `"`と`\`はバックスラッシュ、制御文字は16進エスケープ（`\a `）、NULはU+FFFD。
fn escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\0' => out.push('\u{FFFD}'),
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\u{1}'..='\u{1F}' | '\u{7F}' => {
                out.push_str(&format!("\\{:x} ", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::document::HostDocument;
    use crate::headless::tree::SimDocument;

    #[test]
    fn test_accepts_browser_selectors() {
        for source in [
            r#"button[aria-label^="Expand Ancestors"]"#,
            "div[is-couple][slot]",
            r#"#pedigree [data-testid^="couple-"]"#,
            r#"div.couple[data-testid^="couple-"]"#,
            r#"[data-testid^="couple-"], [data-test-id^="couple-"]"#,
            r#"[data-testid|="couple"]"#,
            "div > span",
        ] {
            assert!(parse(source).is_ok(), "rejected {}", source);
        }
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse("").is_err());
        assert!(parse("   ").is_err());
        assert!(parse("[data-testid^=]").is_err());
        assert!(parse("div[unterminated").is_err());
        assert!(matches!(parse("div >"), Err(ExpanderError::InvalidSelector { .. })));
    }

    #[test]
    fn test_attribute_names() {
        assert!(is_attribute_name("data-testid"));
        assert!(is_attribute_name("slot"));
        assert!(!is_attribute_name("a b"));
        assert!(!is_attribute_name(""));
    }

    #[test]
    fn test_attribute_equals_escapes_quotes_and_controls() {
        assert_eq!(attribute_equals("slot", "1"), r#"[slot="1"]"#);
        assert_eq!(attribute_equals("id", "a\"b\\c"), r#"[id="a\"b\\c"]"#);
        assert_eq!(attribute_equals("id", "a\nb"), "[id=\"a\\a b\"]");

        // 組み立てたセレクタで元の値を持つ要素が見つかる
        let doc = SimDocument::new();
        for value in ["odd\"id\\x", "line\nbreak", "tab\there"] {
            let node = doc.create_element("div", &[("data-testid", value)]);
            doc.append_child(doc.body(), node);
            let selector = attribute_equals("data-testid", value);
            assert!(parse(&selector).is_ok(), "unparsable {}", selector);
            assert_eq!(doc.query_selector(None, &selector), Some(node), "no match for {:?}", value);
        }
    }
}
