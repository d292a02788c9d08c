//! TUI内での文字列入力（InputBox）と選択リスト（SelectBox）。

use ratatui::{
    layout::Alignment,
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};

/// InputBox入力状態
#[derive(Clone, Debug)]
pub struct InputBoxState {
    /// プロンプトメッセージ
    pub prompt: String,
    /// 現在の入力値
    pub value: String,
    /// カーソル位置（文字単位）
    pub cursor: usize,
    /// 入力できる最大文字数（Noneなら無制限）
    pub max_chars: Option<usize>,
    /// 入力完了時のコールバック識別子
    pub callback_id: InputCallbackId,
}

/// 入力完了時のコールバック識別子
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputCallbackId {
    /// 場所（住所の手入力）
    Location,
    /// 添付ファイルのパス（複数可）
    AttachmentPaths,
    /// 問題の説明
    Description,
}

impl InputBoxState {
    /// 値の末尾にカーソルを置いた状態で開く。
    pub fn new(prompt: impl Into<String>, value: String, callback_id: InputCallbackId) -> Self {
        let cursor = value.chars().count();
        Self {
            prompt: prompt.into(),
            value,
            cursor,
            max_chars: None,
            callback_id,
        }
    }

    /// 最大文字数を設定する。
    pub fn with_max_chars(mut self, max: usize) -> Self {
        self.max_chars = Some(max);
        // 既存値が上限を超えていれば切り詰める。
        if self.value.chars().count() > max {
            self.value = self.value.chars().take(max).collect();
            self.cursor = max;
        }
        self
    }

    /// 上限に達しているか。
    fn is_full(&self) -> bool {
        self.max_chars
            .is_some_and(|max| self.value.chars().count() >= max)
    }

    /// 文字を挿入
    pub fn insert_char(&mut self, c: char) {
        // 上限に達していれば挿入しない。
        if self.is_full() {
            return;
        }
        // 文字列を一旦Vec<char>へ変換する。
        let mut chars: Vec<char> = self.value.chars().collect();
        // カーソル位置へ挿入する。
        chars.insert(self.cursor, c);
        // 文字列へ戻してカーソルを進める。
        self.value = chars.iter().collect();
        self.cursor += 1;
    }

    /// 貼り付けられた文字列を挿入（改行は空白に置き換える）
    pub fn insert_str(&mut self, s: &str) {
        for c in s.chars() {
            let c = if c == '\n' || c == '\r' { ' ' } else { c };
            self.insert_char(c);
        }
    }

    /// Backspace（カーソル前の文字を削除）
    pub fn backspace(&mut self) {
        // カーソルが先頭なら何もしない。
        if self.cursor > 0 {
            let mut chars: Vec<char> = self.value.chars().collect();
            // カーソル直前の文字を取り除く。
            chars.remove(self.cursor - 1);
            self.value = chars.iter().collect();
            self.cursor -= 1;
        }
    }

    /// Delete（カーソル位置の文字を削除）
    pub fn delete(&mut self) {
        let mut chars: Vec<char> = self.value.chars().collect();
        // カーソルが末尾なら何もしない。
        if self.cursor < chars.len() {
            chars.remove(self.cursor);
            self.value = chars.iter().collect();
        }
    }

    /// カーソルを左に移動
    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// カーソルを右に移動
    pub fn move_right(&mut self) {
        // 末尾を超えないようにする。
        if self.cursor < self.value.chars().count() {
            self.cursor += 1;
        }
    }

    /// カーソルを先頭に移動
    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    /// カーソルを末尾に移動
    pub fn move_end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    /// 行全体をクリア
    pub fn clear_line(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }
}

/// SelectBox選択状態
#[derive(Clone, Debug)]
pub struct SelectBoxState {
    /// プロンプトメッセージ
    pub prompt: String,
    /// 表示する選択肢
    pub options: Vec<String>,
    /// 選択中の位置
    pub selected: usize,
    /// 確定時のコールバック識別子
    pub callback_id: SelectCallbackId,
}

/// 確定時のコールバック識別子
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectCallbackId {
    /// 問題カテゴリ
    Category,
}

impl SelectBoxState {
    /// 前の選択肢へ（先頭で止まる）
    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// 次の選択肢へ（末尾で止まる）
    pub fn move_down(&mut self) {
        if self.selected + 1 < self.options.len() {
            self.selected += 1;
        }
    }
}

/// InputBoxをポップアップとして描画
pub fn render_input_box(f: &mut Frame, state: &InputBoxState) {
    // 中央に配置されたポップアップ領域を計算する。
    let popup_area = centered_popup(f.area(), 70, 7);

    // 既存の描画を消してポップアップ用の背景にする。
    f.render_widget(Clear, popup_area);

    // 上限があれば文字数をタイトルに出す。
    let title = match state.max_chars {
        Some(max) => format!("Entrada ({}/{})", state.value.chars().count(), max),
        None => "Entrada".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(Style::default().bg(Color::DarkGray));
    f.render_widget(block, popup_area);

    // 内部レイアウト（プロンプト + 入力フィールド + ヘルプ）を定義する。
    let inner_layout = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // プロンプト
            Constraint::Length(1), // 入力フィールド
            Constraint::Length(1), // 空行
            Constraint::Length(1), // ヘルプ
        ])
        .split(popup_area);

    // プロンプトメッセージを描画する。
    let prompt_widget = Paragraph::new(state.prompt.clone()).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    f.render_widget(prompt_widget, inner_layout[0]);

    // カーソル位置が表示幅を超えた場合は横スクロールする。
    let display_width = inner_layout[1].width as usize;
    let scroll_offset = state.cursor.saturating_sub(display_width.saturating_sub(2));

    // 可視範囲を切り出し、カーソル位置に | を挿入する。
    let visible: Vec<char> = state
        .value
        .chars()
        .skip(scroll_offset)
        .take(display_width.saturating_sub(1))
        .collect();
    let at = state.cursor.saturating_sub(scroll_offset).min(visible.len());
    let before: String = visible[..at].iter().collect();
    let after: String = visible[at..].iter().collect();

    let input_widget =
        Paragraph::new(format!("{}|{}", before, after)).style(Style::default().fg(Color::Green));
    f.render_widget(input_widget, inner_layout[1]);

    // ヘルプテキストを描画する。
    let help = Paragraph::new("Enter=confirmar | ESC=cancelar | Ctrl+U=limpar")
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center);
    f.render_widget(help, inner_layout[3]);
}

/// SelectBoxをポップアップとして描画
pub fn render_select_box(f: &mut Frame, state: &SelectBoxState) {
    // 選択肢の数に合わせて高さを決める。
    let height = state.options.len() as u16 + 2;
    let popup_area = centered_popup(f.area(), 50, height);
    f.render_widget(Clear, popup_area);

    let items: Vec<ListItem> = state
        .options
        .iter()
        .map(|o| ListItem::new(o.clone()))
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(state.prompt.clone())
                .style(Style::default().bg(Color::DarkGray)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Rgb(255, 140, 0))
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        );

    let mut list_state = ListState::default();
    list_state.select(Some(state.selected));
    f.render_stateful_widget(list, popup_area, &mut list_state);
}

/// 中央配置のポップアップ領域を計算
fn centered_popup(area: Rect, width_percent: u16, height: u16) -> Rect {
    // 縦方向の余白を作り、中央行を取り出す。
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height.saturating_sub(height)) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    // 横方向も中央に寄せてポップアップ領域を返す。
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100 - width_percent) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(value: &str) -> InputBoxState {
        InputBoxState::new("p", value.to_string(), InputCallbackId::Location)
    }

    #[test]
    fn test_insert_at_cursor() {
        let mut b = boxed("Rua A");
        b.move_home();
        b.insert_char('>');
        assert_eq!(b.value, ">Rua A");
        assert_eq!(b.cursor, 1);
    }

    #[test]
    fn test_max_chars_blocks_insert() {
        let mut b = InputBoxState::new("p", String::new(), InputCallbackId::Description)
            .with_max_chars(3);
        b.insert_str("abcdef");
        assert_eq!(b.value, "abc");
        assert_eq!(b.cursor, 3);
    }

    #[test]
    fn test_with_max_chars_truncates_existing_value() {
        let b = InputBoxState::new("p", "ãããããã".into(), InputCallbackId::Description)
            .with_max_chars(4);
        assert_eq!(b.value, "ãããã");
        assert_eq!(b.cursor, 4);
    }

    #[test]
    fn test_paste_replaces_newlines() {
        let mut b = boxed("");
        b.insert_str("a\nb\r\nc");
        assert_eq!(b.value, "a b  c");
    }

    #[test]
    fn test_backspace_and_delete_multibyte() {
        let mut b = boxed("Água");
        b.backspace();
        assert_eq!(b.value, "Águ");
        b.move_home();
        b.delete();
        assert_eq!(b.value, "gu");
        b.move_end();
        b.delete();
        assert_eq!(b.value, "gu");
    }

    #[test]
    fn test_select_box_bounds() {
        let mut s = SelectBoxState {
            prompt: "p".into(),
            options: vec!["a".into(), "b".into()],
            selected: 0,
            callback_id: SelectCallbackId::Category,
        };
        s.move_up();
        assert_eq!(s.selected, 0);
        s.move_down();
        s.move_down();
        assert_eq!(s.selected, 1);
    }
}
