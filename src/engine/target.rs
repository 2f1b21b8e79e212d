use serde::{Deserialize, Serialize};
use std::fmt;

/// カップルコンテナを一意に識別するID（test-id属性の値）
///
/// 空文字列は作れない。比較は文字列の完全一致。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetId(String);

impl TargetId {
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() { None } else { Some(Self(id)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TargetId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// カップル内の祖先ポジション（slot="1" / slot="2"）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Slot {
    One,
    Two,
}

impl Slot {
    pub fn number(self) -> u8 {
        match self {
            Slot::One => 1,
            Slot::Two => 2,
        }
    }
}

impl TryFrom<u8> for Slot {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Slot::One),
            2 => Ok(Slot::Two),
            other => Err(format!("slot must be 1 or 2, got {}", other)),
        }
    }
}

impl From<Slot> for u8 {
    fn from(slot: Slot) -> u8 {
        slot.number()
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_target_id_is_rejected() {
        assert!(TargetId::new("").is_none());
        assert_eq!(TargetId::new("couple-1").unwrap().as_str(), "couple-1");
    }

    #[test]
    fn test_slot_serde_uses_numbers() {
        let slots: Vec<Slot> = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(slots, vec![Slot::One, Slot::Two]);
        assert_eq!(serde_json::to_string(&Slot::Two).unwrap(), "2");
        assert!(serde_json::from_str::<Slot>("3").is_err());
    }
}
