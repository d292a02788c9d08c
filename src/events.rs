//! フォーム画面のUI状態とフォーカス対象。

use crate::notify::Toast;

/// ログとして保持する最大行数（古いものから捨てる）。
pub const LOG_CAPACITY: usize = 200;

/// 待機中のステータス文言。
pub const STATUS_READY: &str = "Pronto";

/// フォーカス可能なフォーム項目（表示順）。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormField {
    /// 場所。
    Location,
    /// カテゴリ。
    Category,
    /// 写真・動画。
    Attachments,
    /// 説明文。
    Description,
    /// 送信ボタン。
    Submit,
}

impl FormField {
    /// 表示順の一覧。
    pub const ORDER: [FormField; 5] = [
        FormField::Location,
        FormField::Category,
        FormField::Attachments,
        FormField::Description,
        FormField::Submit,
    ];

    /// 次の項目（末尾から先頭へ循環）。
    pub fn next(self) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(i + 1) % Self::ORDER.len()]
    }

    /// 前の項目（先頭から末尾へ循環）。
    pub fn prev(self) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(i + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

/// 描画側と共有するUI状態。
#[derive(Clone, Debug)]
pub struct UiState {
    /// フォーカス中の項目。
    pub focus: FormField,
    /// 添付一覧の選択行。
    pub selected_attachment: usize,
    /// 右側パネルに表示するログ。
    pub log: Vec<String>,
    /// 画面下部のステータス文言。
    pub status: String,
    /// 直近のトースト（ステータスバーに表示）。
    pub toast: Option<Toast>,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            focus: FormField::Location,
            selected_attachment: 0,
            log: vec![],
            status: STATUS_READY.into(),
            toast: None,
        }
    }

    /// ログに1行追加する。上限を超えた分は先頭から捨てる。
    pub fn push_log(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
        if self.log.len() > LOG_CAPACITY {
            let excess = self.log.len() - LOG_CAPACITY;
            self.log.drain(..excess);
        }
    }

    /// 添付件数の変化に合わせて選択行を範囲内へ戻す。
    pub fn clamp_attachment_selection(&mut self, len: usize) {
        if self.selected_attachment >= len {
            self.selected_attachment = len.saturating_sub(1);
        }
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_cycles_forward_and_back() {
        assert_eq!(FormField::Location.next(), FormField::Category);
        assert_eq!(FormField::Submit.next(), FormField::Location);
        assert_eq!(FormField::Location.prev(), FormField::Submit);
        assert_eq!(FormField::Description.prev(), FormField::Attachments);
    }

    #[test]
    fn test_log_keeps_latest_lines_only() {
        let mut ui = UiState::new();
        for i in 0..LOG_CAPACITY + 25 {
            ui.push_log(format!("line {i}"));
        }
        assert_eq!(ui.log.len(), LOG_CAPACITY);
        assert_eq!(ui.log[0], "line 25");
        assert_eq!(ui.log.last().map(String::as_str), Some("line 224"));
    }

    #[test]
    fn test_clamp_attachment_selection() {
        let mut ui = UiState::new();
        ui.selected_attachment = 2;
        ui.clamp_attachment_selection(2);
        assert_eq!(ui.selected_attachment, 1);
        ui.clamp_attachment_selection(0);
        assert_eq!(ui.selected_attachment, 0);
    }
}
