use crate::engine::target::{Slot, TargetId};
use crate::error::{ExpanderError, Result};
use crate::selector::{self, attribute_equals};
use serde::{Deserialize, Serialize};

// ========================================
// ホストページのマークアップ定義
// ========================================

/// ホストページ上の要素を見つけるためのセレクタ群
///
/// ページ側のマークアップが変わった場合はここを差し替える。
/// 合わなくなっても何も見つからないだけで、落ちることはない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// カップルコンテナ
    pub couple: String,
    /// カップルコンテナのIDを持つ属性
    pub id_attribute: String,
    /// 人物スロットの番号を持つ属性
    pub slot_attribute: String,
    /// 「祖先を展開」ボタン
    pub expand_affordance: String,
    /// 手動ボタンを差し込む人物コンテナ
    pub person_anchor: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            couple: r#"[data-testid^="couple-"]"#.to_string(),
            id_attribute: "data-testid".to_string(),
            slot_attribute: "slot".to_string(),
            expand_affordance: r#"button[aria-label^="Expand Ancestors"]"#.to_string(),
            person_anchor: "div[is-couple][slot]".to_string(),
        }
    }
}

impl Selectors {
    /// IDからカップルコンテナを引くセレクタ
    pub fn container_lookup(&self, id: &TargetId) -> String {
        attribute_equals(&self.id_attribute, id.as_str())
    }

    /// コンテナ内のスロット要素を引くセレクタ
    pub fn slot_lookup(&self, slot: Slot) -> String {
        attribute_equals(&self.slot_attribute, &slot.number().to_string())
    }

    pub fn validate(&self) -> Result<()> {
        selector::parse(&self.couple)?;
        selector::parse(&self.expand_affordance)?;
        selector::parse(&self.person_anchor)?;

        for (field, name) in [("id_attribute", &self.id_attribute), ("slot_attribute", &self.slot_attribute)] {
            if !selector::is_attribute_name(name) {
                return Err(ExpanderError::InvalidConfig(format!(
                    "{} `{}` is not an attribute name",
                    field, name
                )));
            }
        }
        Ok(())
    }
}

// ========================================
// エンジン設定
// ========================================

/// エキスパンダーの設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpanderConfig {
    /// キューを1件処理する間隔（ミリ秒）
    pub tick_interval_ms: u32,
    /// 自動展開するスロット。既定はslot 1（片方の家系）のみ
    pub auto_slots: Vec<Slot>,
    pub selectors: Selectors,
    /// 手動ボタン押下時のハイライト表示時間（ミリ秒）
    pub highlight_ms: u32,
    pub manual_label: String,
    pub stop_label: String,
}

impl Default for ExpanderConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            auto_slots: vec![Slot::One],
            selectors: Selectors::default(),
            highlight_ms: 500,
            manual_label: "Expand All".to_string(),
            stop_label: "Stop expanding".to_string(),
        }
    }
}

impl ExpanderConfig {
    /// JSONから読み込む（省略したフィールドは既定値）
    pub fn from_json(source: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json(&source)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(ExpanderError::InvalidConfig("tick_interval_ms must be positive".to_string()));
        }
        if self.auto_slots.is_empty() {
            return Err(ExpanderError::InvalidConfig("auto_slots must not be empty".to_string()));
        }
        let distinct: std::collections::HashSet<Slot> = self.auto_slots.iter().copied().collect();
        if distinct.len() != self.auto_slots.len() {
            return Err(ExpanderError::InvalidConfig("auto_slots must not repeat a slot".to_string()));
        }
        self.selectors.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ExpanderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_interval_ms, 100);
        assert_eq!(config.auto_slots, vec![Slot::One]);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ExpanderConfig::from_json(r#"{ "auto_slots": [1, 2], "selectors": { "slot_attribute": "data-slot" } }"#)
            .unwrap();
        assert_eq!(config.auto_slots, vec![Slot::One, Slot::Two]);
        assert_eq!(config.tick_interval_ms, 100);
        assert_eq!(config.selectors.slot_attribute, "data-slot");
        assert_eq!(config.selectors.id_attribute, "data-testid");
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            ExpanderConfig::from_json(r#"{ "tick_interval_ms": 0 }"#),
            Err(ExpanderError::InvalidConfig(_))
        ));
        assert!(matches!(
            ExpanderConfig::from_json(r#"{ "auto_slots": [] }"#),
            Err(ExpanderError::InvalidConfig(_))
        ));
        assert!(matches!(
            ExpanderConfig::from_json(r#"{ "auto_slots": [2, 2] }"#),
            Err(ExpanderError::InvalidConfig(_))
        ));
        assert!(matches!(
            ExpanderConfig::from_json(r#"{ "selectors": { "couple": "div >" } }"#),
            Err(ExpanderError::InvalidSelector { .. })
        ));
        assert!(matches!(
            ExpanderConfig::from_json(r#"{ "selectors": { "id_attribute": "a b" } }"#),
            Err(ExpanderError::InvalidConfig(_))
        ));
        assert!(matches!(ExpanderConfig::from_json("{"), Err(ExpanderError::Json(_))));
    }

    #[test]
    fn test_accepts_any_selector_the_browser_accepts() {
        for couple in [
            r#"#pedigree [data-testid^="couple-"]"#,
            r#"div.couple[data-testid^="couple-"]"#,
            r#"[data-testid^="couple-"], [data-test-id^="couple-"]"#,
            r#"[data-testid|="couple"]"#,
        ] {
            let json = serde_json::json!({ "selectors": { "couple": couple } }).to_string();
            let config = ExpanderConfig::from_json(&json).unwrap();
            assert_eq!(config.selectors.couple, couple);
        }
    }

    #[test]
    fn test_lookup_selectors() {
        let selectors = Selectors::default();
        let id = TargetId::new("couple-7").unwrap();
        assert_eq!(selectors.container_lookup(&id), r#"[data-testid="couple-7"]"#);
        assert_eq!(selectors.slot_lookup(Slot::One), r#"[slot="1"]"#);
    }
}
