use thiserror::Error;

/// エキスパンダー全体で使うエラー型
///
/// DOM上の要素が見つからないケースはエラーではなく`ExpandOutcome`で表現する。
/// ここに来るのは設定の誤りとホスト環境の初期化失敗だけ。
#[derive(Error, Debug)]
pub enum ExpanderError {
    /// セレクタ文字列が解析できない
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// 設定値の検証エラー
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// 設定JSONの読み込みエラー
    #[error("config JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// 設定ファイルの読み込みエラー
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ホスト環境（ブラウザAPIなど）の呼び出し失敗
    #[error("host error: {0}")]
    Host(String),
}

impl ExpanderError {
    pub fn invalid_selector(selector: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExpanderError>;
