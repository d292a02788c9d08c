//! ユーザーへ通知するトーストのモデル。

/// トーストの表示種別。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// 通常の案内。
    Default,
    /// 失敗や入力不備（赤で強調）。
    Destructive,
}

/// 画面に一度だけ表示する通知。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    /// 見出し。
    pub title: String,
    /// 本文。
    pub message: String,
    /// 表示種別。
    pub severity: Severity,
}

impl Toast {
    /// 通常トーストを作る。
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity: Severity::Default,
        }
    }

    /// 強調トーストを作る。
    pub fn destructive(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity: Severity::Destructive,
        }
    }

    pub fn is_destructive(&self) -> bool {
        self.severity == Severity::Destructive
    }
}

impl std::fmt::Display for Toast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}
