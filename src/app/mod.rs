//! TUIのイベントループ、入力処理、状態管理。

mod handlers;
mod render;

use anyhow::Result;
use crossterm::event::{self, Event};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::sync::mpsc;

use crate::{
    config::Config,
    events::{STATUS_READY, UiState},
    form::{FormController, FormSettings},
    geo,
    input::{InputBoxState, SelectBoxState},
    notify::Toast,
    shortcuts::Shortcuts,
    submission::SimulatedSubmitter,
    ui::Tui,
};

use handlers::{handle_key, handle_paste, is_ctrl_c};
use render::draw;

/// 入力処理と描画で共有するアプリ状態。
pub struct App {
    /// フォーカスやステータスなどUI固有の状態。
    pub ui: UiState,
    /// 通報フォーム本体。
    pub form: FormController,
    /// フォームからのトースト受信チャネル。
    pub toast_rx: mpsc::UnboundedReceiver<Toast>,

    /// 入力ボックスの状態（入力中はSome）。
    pub input_box: Option<InputBoxState>,
    /// 選択ボックスの状態（選択中はSome）。
    pub select_box: Option<SelectBoxState>,

    /// ショートカットキー設定。
    pub shortcuts: Shortcuts,
}

impl App {
    /// 設定からフォームと依存先を組み立てる。
    pub fn new(cfg: &Config, shortcuts: Shortcuts) -> Result<Self> {
        // 位置取得の提供元を決める（無効ならNone）。
        let locator = geo::locator_from_config(&cfg.geolocation)?;
        // 送信は固定遅延のシミュレーション。
        let submitter = Arc::new(SimulatedSubmitter::new(
            cfg.submission.delay(),
            cfg.submission.simulate_failure,
        ));
        let (toast_tx, toast_rx) = mpsc::unbounded_channel();
        let form = FormController::new(
            FormSettings::from_config(cfg),
            locator,
            submitter,
            toast_tx,
        );

        Ok(Self {
            ui: UiState::new(),
            form,
            toast_rx,
            input_box: None,
            select_box: None,
            shortcuts,
        })
    }

    /// 非同期処理の結果とトーストをUI状態へ反映する。
    pub fn pump(&mut self) {
        // 位置取得・送信の完了を先に適用する。
        let applied = self.form.poll_events();

        // 処理中の文言は完了したら待機表示へ戻す。
        if applied > 0 && !self.form.is_submitting() && !self.form.is_locating() {
            self.ui.status = STATUS_READY.into();
        }

        // トーストはログにも残す。
        while let Ok(toast) = self.toast_rx.try_recv() {
            let now = chrono::Local::now().format("%H:%M:%S");
            self.ui.push_log(format!("[{now}] {toast}"));
            self.ui.toast = Some(toast);
        }

        // 送信完了で添付が消えた場合に選択行を戻す。
        self.ui
            .clamp_attachment_selection(self.form.attachments().len());
    }
}

/// ユーザーが終了するまでメインTUIループを回す。
pub async fn run_app(terminal: &mut Tui) -> Result<()> {
    // 設定ファイルを読み込む（初回はデフォルトを生成）。
    let cfg_path = PathBuf::from("config.toml");
    let cfg = Config::load_or_default(&cfg_path)?;
    tracing::info!(
        "config loaded: provider={:?}, delay={}ms, max_attachments={}",
        cfg.geolocation.provider,
        cfg.submission.delay_ms,
        cfg.form.max_attachments
    );

    // ショートカット設定を読み込む（無ければデフォルト）。
    let shortcuts_path = PathBuf::from("shortcut.toml");
    let shortcuts = Shortcuts::load_or_default(&shortcuts_path)?;

    // アプリ状態を初期化する。
    let mut app = App::new(&cfg, shortcuts)?;

    loop {
        // 現在の状態を描画する。
        terminal.draw(|f| draw(f, &app))?;

        // 入力処理の前に非同期結果を消化する。
        app.pump();

        // UIの応答性確保のため短いタイムアウトで入力をポーリングする。
        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(k) => {
                    // どこからでもCtrl+Cで終了できるようにする。
                    if is_ctrl_c(&k) || handle_key(&mut app, k)? {
                        break;
                    }
                }
                // ドロップされたファイルはペーストとして届く。
                Event::Paste(text) => handle_paste(&mut app, &text),
                _ => {}
            }
        }
    }

    // 保留中の位置取得・送信を破棄してから終了する。
    app.form.teardown();
    Ok(())
}
