//! ショートカット設定の管理。

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// ショートカット設定の全体。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shortcuts {
    pub form: FormShortcuts,
    pub input_box: InputBoxShortcuts,
    pub select_box: SelectBoxShortcuts,
}

/// フォーム画面のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormShortcuts {
    pub quit: Vec<String>,
    pub next_field: Vec<String>,
    pub prev_field: Vec<String>,
    pub edit: Vec<String>,
    pub locate: Vec<String>,
    pub attach: Vec<String>,
    pub remove_attachment: Vec<String>,
    pub prev_attachment: Vec<String>,
    pub next_attachment: Vec<String>,
    pub submit: Vec<String>,
}

/// InputBoxのショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputBoxShortcuts {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub backspace: Vec<String>,
    pub delete: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub home: Vec<String>,
    pub end: Vec<String>,
    pub clear_line: Vec<String>,
}

/// SelectBoxのショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectBoxShortcuts {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub up: Vec<String>,
    pub down: Vec<String>,
}

impl Shortcuts {
    /// TOMLから読み込み、無ければデフォルトを返す。
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            // 既存ファイルを読み込んでパースする。
            let content = std::fs::read_to_string(path)?;
            let shortcuts: Shortcuts = toml::from_str(&content)?;
            Ok(shortcuts)
        } else {
            // 未作成の場合は既定値を利用する。
            Ok(Self::default())
        }
    }
}

impl Default for Shortcuts {
    fn default() -> Self {
        Self {
            form: FormShortcuts {
                quit: vec!["q".into(), "Esc".into()],
                next_field: vec!["Tab".into(), "Down".into(), "j".into()],
                prev_field: vec!["Shift+BackTab".into(), "Up".into(), "k".into()],
                edit: vec!["Enter".into(), "e".into()],
                locate: vec!["g".into()],
                attach: vec!["a".into()],
                remove_attachment: vec!["x".into(), "Delete".into()],
                prev_attachment: vec!["Left".into(), "h".into()],
                next_attachment: vec!["Right".into(), "l".into()],
                submit: vec!["Ctrl+s".into()],
            },
            input_box: InputBoxShortcuts {
                confirm: vec!["Enter".into()],
                cancel: vec!["Esc".into()],
                backspace: vec!["Backspace".into()],
                delete: vec!["Delete".into()],
                left: vec!["Left".into()],
                right: vec!["Right".into()],
                home: vec!["Home".into()],
                end: vec!["End".into()],
                clear_line: vec!["Ctrl+u".into()],
            },
            select_box: SelectBoxShortcuts {
                confirm: vec!["Enter".into()],
                cancel: vec!["Esc".into()],
                up: vec!["Up".into(), "k".into()],
                down: vec!["Down".into(), "j".into()],
            },
        }
    }
}

/// KeyEventがいずれかのショートカット文字列と一致するか判定する。
pub fn matches_shortcut(key: &KeyEvent, shortcuts: &[String]) -> bool {
    shortcuts.iter().any(|s| matches_single_shortcut(key, s))
}

/// KeyEventが単一のショートカット文字列と一致するか判定する。
fn matches_single_shortcut(key: &KeyEvent, shortcut: &str) -> bool {
    // ショートカット文字列を分解する（例: "Ctrl+u", "a", "Enter"）。
    let parts: Vec<&str> = shortcut.split('+').collect();

    let (modifiers_str, key_str) = if parts.len() > 1 {
        // 修飾キー付きの形式（例: "Ctrl+u"）。
        (&parts[0..parts.len() - 1], parts[parts.len() - 1])
    } else {
        // 修飾キーなしの形式（例: "a", "Enter"）。
        (&[][..], parts[0])
    };

    // 修飾キーを解析して期待値を作る。
    let mut expected_modifiers = KeyModifiers::empty();
    for modifier in modifiers_str {
        match *modifier {
            "Ctrl" | "ctrl" => expected_modifiers |= KeyModifiers::CONTROL,
            "Alt" | "alt" => expected_modifiers |= KeyModifiers::ALT,
            "Shift" | "shift" => expected_modifiers |= KeyModifiers::SHIFT,
            _ => return false,
        }
    }

    // 修飾キーが一致しなければ即座に不一致とする。
    if key.modifiers != expected_modifiers {
        return false;
    }

    // キーコードの種別ごとに一致判定を行う。
    match key_str {
        "Enter" | "enter" => key.code == KeyCode::Enter,
        "Esc" | "esc" => key.code == KeyCode::Esc,
        "Tab" | "tab" => key.code == KeyCode::Tab,
        "BackTab" | "backtab" => key.code == KeyCode::BackTab,
        "Backspace" | "backspace" => key.code == KeyCode::Backspace,
        "Delete" | "delete" => key.code == KeyCode::Delete,
        "Up" | "up" => key.code == KeyCode::Up,
        "Down" | "down" => key.code == KeyCode::Down,
        "Left" | "left" => key.code == KeyCode::Left,
        "Right" | "right" => key.code == KeyCode::Right,
        "Home" | "home" => key.code == KeyCode::Home,
        "End" | "end" => key.code == KeyCode::End,
        // 単一文字は Char として比較する。
        s if s.chars().count() == 1 => s.chars().next().is_some_and(|c| key.code == KeyCode::Char(c)),
        _ => false,
    }
}

/// ヘルプ表示用にキー候補を連結する。
pub fn format_keys(keys: &[String]) -> String {
    keys.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_shortcut_simple_char() {
        // 単一文字の一致判定を検証する。
        let key = KeyEvent::new(KeyCode::Char('g'), KeyModifiers::empty());
        assert!(matches_shortcut(&key, &[String::from("g")]));
        assert!(!matches_shortcut(&key, &[String::from("a")]));
    }

    #[test]
    fn test_matches_shortcut_special_key() {
        let key = KeyEvent::new(KeyCode::Enter, KeyModifiers::empty());
        assert!(matches_shortcut(&key, &[String::from("Enter")]));
        assert!(!matches_shortcut(&key, &[String::from("Esc")]));
    }

    #[test]
    fn test_matches_shortcut_with_modifier() {
        // 修飾キー付きの一致判定を検証する。
        let key = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        assert!(matches_shortcut(&key, &[String::from("Ctrl+s")]));
        assert!(!matches_shortcut(&key, &[String::from("s")]));
    }

    #[test]
    fn test_matches_shortcut_backtab() {
        let key = KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT);
        assert!(matches_shortcut(&key, &Shortcuts::default().form.prev_field));
    }

    #[test]
    fn test_matches_shortcut_multiple_keys() {
        // 複数キーバインドの一致判定を検証する。
        let sc = Shortcuts::default();
        let key_x = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::empty());
        let key_del = KeyEvent::new(KeyCode::Delete, KeyModifiers::empty());
        let key_d = KeyEvent::new(KeyCode::Char('d'), KeyModifiers::empty());

        assert!(matches_shortcut(&key_x, &sc.form.remove_attachment));
        assert!(matches_shortcut(&key_del, &sc.form.remove_attachment));
        assert!(!matches_shortcut(&key_d, &sc.form.remove_attachment));
    }

    #[test]
    fn test_partial_shortcut_file_is_rejected() {
        // セクションが欠けたファイルは読み込みエラーになる。
        let res: Result<Shortcuts, _> = toml::from_str("[form]\nquit = [\"q\"]\n");
        assert!(res.is_err());
    }

    #[test]
    fn test_format_keys() {
        assert_eq!(format_keys(&["Tab".into(), "j".into()]), "Tab/j");
    }
}
