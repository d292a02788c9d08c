//! 送信前の添付ファイルを保持する上限付きバッファ。

use anyhow::{Result, anyhow};
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// 添付の既定上限数。
pub const DEFAULT_MAX_ATTACHMENTS: usize = 3;

/// 送信待ちの添付ファイル1件。
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Attachment {
    /// 追加時に払い出す安定ID。
    pub id: Uuid,
    /// 表示用のファイル名。
    pub name: String,
    /// ファイルサイズ（バイト）。
    pub size_bytes: u64,
    /// 元ファイルの場所。
    pub path: PathBuf,
}

impl Attachment {
    /// 名前とサイズから添付を作る。
    pub fn new(name: impl Into<String>, size_bytes: u64, path: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            size_bytes,
            path: path.into(),
        }
    }

    /// ファイルシステム上のパスから添付を作る（通常ファイルのみ）。
    pub fn from_path(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path)?;
        if !meta.is_file() {
            return Err(anyhow!("not a regular file: {}", path.display()));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, meta.len(), path))
    }

    /// 一覧表示用のサイズ表記（MB、小数1桁）。
    pub fn size_label(&self) -> String {
        format!("{:.1} MB", self.size_bytes as f64 / 1024.0 / 1024.0)
    }
}

/// 変更通知を受け取るオブザーバ。
pub type Observer = Box<dyn FnMut(&[Attachment])>;

/// 上限付きの添付ステージングリスト。
pub struct StagingBuffer {
    items: Vec<Attachment>,
    max_count: usize,
    observer: Option<Observer>,
}

impl StagingBuffer {
    /// 空のバッファを作る。上限は作成後に変更できない。
    pub fn new(max_count: usize) -> Self {
        Self {
            items: Vec::new(),
            max_count,
            observer: None,
        }
    }

    /// 変更のたびに最新リスト全体を受け取るオブザーバを登録する。
    pub fn with_observer(max_count: usize, observer: impl FnMut(&[Attachment]) + 'static) -> Self {
        Self {
            items: Vec::new(),
            max_count,
            observer: Some(Box::new(observer)),
        }
    }

    /// 末尾に追加し、上限を超えた分は後ろから黙って切り捨てる。
    pub fn add_batch(&mut self, incoming: Vec<Attachment>) -> &[Attachment] {
        let offered = incoming.len();
        self.items.extend(incoming);
        let dropped = self.items.len().saturating_sub(self.max_count);
        self.items.truncate(self.max_count);
        if dropped > 0 {
            tracing::info!(
                "attachment batch truncated: {offered} offered, {dropped} dropped (max {})",
                self.max_count
            );
        }
        self.notify();
        &self.items
    }

    /// 指定位置の要素を取り除く。範囲外なら何もしない（通知は行う）。
    pub fn remove_at(&mut self, index: usize) -> &[Attachment] {
        if index < self.items.len() {
            let removed = self.items.remove(index);
            tracing::info!("attachment removed: {} ({})", removed.name, removed.id);
        } else {
            tracing::debug!("remove ignored: index {index} out of bounds");
        }
        self.notify();
        &self.items
    }

    /// 全件クリアする。
    pub fn reset(&mut self) {
        self.items.clear();
        self.notify();
    }

    pub fn items(&self) -> &[Attachment] {
        &self.items
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// 上限に達しているか（選択入力の無効化に使う）。
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.max_count
    }

    fn notify(&mut self) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&self.items);
        }
    }
}

impl Default for StagingBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTACHMENTS)
    }
}

/// ペーストやドロップで届いた文字列をパスの並びに分解する。
///
/// 空白区切り、シングル/ダブルクォート、バックスラッシュでエスケープした空白、
/// `file://` URI（パーセントデコード）を扱う。
/// `C:\Users\...` のようなWindowsパスの区切り文字はそのまま残す。
pub fn split_dropped_paths(text: &str) -> Vec<PathBuf> {
    let mut tokens: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                in_token = true;
            }
            (None, '\\') => {
                // 空白・クォート・バックスラッシュの前だけエスケープとみなす。
                match chars.next_if(|n| is_escapable(*n)) {
                    Some(next) => current.push(next),
                    None => current.push('\\'),
                }
                in_token = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        tokens.push(current);
    }

    tokens
        .into_iter()
        .filter(|t| !t.is_empty())
        .map(|t| match t.strip_prefix("file://") {
            Some(rest) => {
                let decoded = match urlencoding::decode(rest) {
                    Ok(decoded) => decoded.into_owned(),
                    Err(_) => rest.to_string(),
                };
                PathBuf::from(strip_drive_slash(&decoded))
            }
            None => PathBuf::from(t),
        })
        .collect()
}

fn is_escapable(c: char) -> bool {
    c.is_whitespace() || matches!(c, '\'' | '"' | '\\')
}

/// `file:///C:/x` の先頭スラッシュを外す（ドライブレター付きの場合のみ）。
fn strip_drive_slash(path: &str) -> &str {
    let bytes = path.as_bytes();
    if bytes.len() >= 3 && bytes[0] == b'/' && bytes[1].is_ascii_alphabetic() && bytes[2] == b':' {
        &path[1..]
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::RefCell, rc::Rc};

    fn file(name: &str) -> Attachment {
        Attachment::new(name, 1024, format!("/tmp/{name}"))
    }

    fn names(items: &[Attachment]) -> Vec<&str> {
        items.iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn test_add_batch_over_capacity_keeps_first_items() {
        // 4件を空バッファへ追加すると先頭3件だけが順序どおり残る。
        let mut buf = StagingBuffer::new(3);
        let out = buf.add_batch(vec![file("a"), file("b"), file("c"), file("d")]);
        assert_eq!(names(out), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_add_batch_length_is_min_of_sum_and_cap() {
        let mut buf = StagingBuffer::new(3);
        buf.add_batch(vec![file("a")]);
        assert_eq!(buf.items().len(), 1);
        buf.add_batch(vec![file("b"), file("c"), file("d")]);
        // 既存要素が優先され、新しいバッチの末尾が落ちる。
        assert_eq!(names(buf.items()), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_add_to_full_buffer_is_noop() {
        let mut buf = StagingBuffer::new(2);
        buf.add_batch(vec![file("a"), file("b")]);
        assert!(buf.is_full());
        buf.add_batch(vec![file("c")]);
        assert_eq!(names(buf.items()), vec!["a", "b"]);
    }

    #[test]
    fn test_remove_at_preserves_order() {
        let mut buf = StagingBuffer::new(3);
        buf.add_batch(vec![file("a"), file("b"), file("c")]);
        let out = buf.remove_at(1);
        assert_eq!(names(out), vec!["a", "c"]);
    }

    #[test]
    fn test_remove_at_out_of_bounds_is_noop() {
        let mut buf = StagingBuffer::new(3);
        buf.add_batch(vec![file("a"), file("b")]);
        buf.remove_at(2);
        buf.remove_at(usize::MAX);
        assert_eq!(names(buf.items()), vec!["a", "b"]);
    }

    #[test]
    fn test_reset_empties_buffer() {
        let mut buf = StagingBuffer::new(3);
        buf.add_batch(vec![file("a"), file("b")]);
        buf.reset();
        assert!(buf.items().is_empty());
        buf.reset();
        assert!(buf.items().is_empty());
    }

    #[test]
    fn test_observer_receives_full_list_on_every_mutation() {
        // 変更のたびに最新のリスト全体が通知されることを確認する。
        let seen: Rc<RefCell<Vec<Vec<String>>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut buf = StagingBuffer::with_observer(3, move |items| {
            sink.borrow_mut()
                .push(items.iter().map(|a| a.name.clone()).collect());
        });

        buf.add_batch(vec![file("a"), file("b")]);
        buf.remove_at(0);
        buf.remove_at(9);
        buf.reset();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0], vec!["a", "b"]);
        assert_eq!(seen[1], vec!["b"]);
        assert_eq!(seen[2], vec!["b"]);
        assert!(seen[3].is_empty());
    }

    #[test]
    fn test_ids_are_assigned_per_insertion() {
        let a = file("same");
        let b = file("same");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_size_label_in_megabytes() {
        let a = Attachment::new("photo.jpg", 1_572_864, "/tmp/photo.jpg");
        assert_eq!(a.size_label(), "1.5 MB");
    }

    #[test]
    fn test_split_dropped_paths_plain_and_quoted() {
        let paths = split_dropped_paths("/tmp/a.jpg '/tmp/b c.png' \"/tmp/d.mp4\"");
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/tmp/a.jpg"),
                PathBuf::from("/tmp/b c.png"),
                PathBuf::from("/tmp/d.mp4"),
            ]
        );
    }

    #[test]
    fn test_split_dropped_paths_escaped_space_and_uri() {
        let paths = split_dropped_paths("/tmp/foto\\ 1.jpg\nfile:///tmp/v%C3%ADdeo.mp4 ");
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/tmp/foto 1.jpg"),
                PathBuf::from("/tmp/vídeo.mp4"),
            ]
        );
    }

    #[test]
    fn test_split_dropped_paths_keeps_windows_separators() {
        let paths = split_dropped_paths(r"C:\Users\me\foto.jpg");
        assert_eq!(paths, vec![PathBuf::from(r"C:\Users\me\foto.jpg")]);

        // クォート付き・複数指定でも区切り文字は残る。
        let paths = split_dropped_paths(r#""C:\Meus Arquivos\a.png" D:\b.mp4"#);
        assert_eq!(
            paths,
            vec![
                PathBuf::from(r"C:\Meus Arquivos\a.png"),
                PathBuf::from(r"D:\b.mp4"),
            ]
        );
    }

    #[test]
    fn test_split_dropped_paths_escaped_quote_and_backslash() {
        let paths = split_dropped_paths(r#"/tmp/it\'s.jpg /tmp/a\\b.jpg"#);
        assert_eq!(
            paths,
            vec![PathBuf::from("/tmp/it's.jpg"), PathBuf::from(r"/tmp/a\b.jpg")]
        );
    }

    #[test]
    fn test_split_dropped_paths_windows_file_uri() {
        let paths = split_dropped_paths("file:///C:/Users/me/foto%201.jpg");
        assert_eq!(paths, vec![PathBuf::from("C:/Users/me/foto 1.jpg")]);
    }

    #[test]
    fn test_split_dropped_paths_empty_input() {
        assert!(split_dropped_paths("   \n").is_empty());
    }

    #[test]
    fn test_from_path_reads_size() {
        let path = std::env::temp_dir().join(format!("attach-{}.bin", Uuid::new_v4()));
        std::fs::write(&path, vec![0u8; 2048]).unwrap();
        let a = Attachment::from_path(&path).unwrap();
        assert_eq!(a.size_bytes, 2048);
        assert!(a.name.starts_with("attach-"));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_from_path_rejects_missing_and_directories() {
        assert!(Attachment::from_path(Path::new("/definitely/not/here.jpg")).is_err());
        assert!(Attachment::from_path(&std::env::temp_dir()).is_err());
    }
}
