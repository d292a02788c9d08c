//! キー入力・ペーストのハンドラー関数。

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::{
    attachments::{Attachment, split_dropped_paths},
    category::Category,
    events::FormField,
    input::{InputBoxState, InputCallbackId, SelectBoxState, SelectCallbackId},
    shortcuts,
};

use super::App;

/// キー入力を1件処理し、終了すべきならtrueを返す。
pub fn handle_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    // ポップアップが開いていれば最優先で処理する。
    if app.select_box.is_some() {
        handle_select_box_key(app, k);
        return Ok(false);
    }
    if app.input_box.is_some() {
        handle_input_box_key(app, k);
        return Ok(false);
    }

    Ok(handle_form_key(app, k))
}

/// Ctrl+Cかどうかを判定する。
pub fn is_ctrl_c(k: &KeyEvent) -> bool {
    k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c')
}

/// ペースト（ドロップ）を処理する。
pub fn handle_paste(app: &mut App, text: &str) {
    if let Some(input_state) = app.input_box.as_mut() {
        // 入力中ならそのまま挿入する。
        input_state.insert_str(text);
    } else if app.select_box.is_none() {
        // それ以外はファイルのドロップとして扱う。
        stage_paths(app, text, "drop");
    }
}

/// フォーム画面のキー処理。
fn handle_form_key(app: &mut App, k: KeyEvent) -> bool {
    let sc = &app.shortcuts.form;

    if shortcuts::matches_shortcut(&k, &sc.quit) {
        return true;
    } else if shortcuts::matches_shortcut(&k, &sc.submit) {
        submit(app);
    } else if shortcuts::matches_shortcut(&k, &sc.locate) {
        locate(app);
    } else if shortcuts::matches_shortcut(&k, &sc.attach) {
        open_attachment_input(app);
    } else if shortcuts::matches_shortcut(&k, &sc.next_field) {
        // 次の項目へ移動する。
        app.ui.focus = app.ui.focus.next();
    } else if shortcuts::matches_shortcut(&k, &sc.prev_field) {
        // 前の項目へ移動する。
        app.ui.focus = app.ui.focus.prev();
    } else if shortcuts::matches_shortcut(&k, &sc.edit) {
        activate_focused(app);
    } else if app.ui.focus == FormField::Attachments {
        handle_attachment_list_key(app, &k);
    }

    false
}

/// 添付一覧にフォーカスがあるときのキー処理。
fn handle_attachment_list_key(app: &mut App, k: &KeyEvent) {
    let sc = &app.shortcuts.form;
    let len = app.form.attachments().len();

    if shortcuts::matches_shortcut(k, &sc.prev_attachment) {
        app.ui.selected_attachment = app.ui.selected_attachment.saturating_sub(1);
    } else if shortcuts::matches_shortcut(k, &sc.next_attachment) {
        if app.ui.selected_attachment + 1 < len {
            app.ui.selected_attachment += 1;
        }
    } else if shortcuts::matches_shortcut(k, &sc.remove_attachment) {
        // 選択中の添付を取り除き、選択位置を詰める。
        let remaining = app.form.remove_attachment(app.ui.selected_attachment).len();
        app.ui.clamp_attachment_selection(remaining);
        app.ui.status = format!("{} de {} arquivos", remaining, app.form.max_attachments());
    }
}

/// フォーカス中の項目を編集・実行する。
fn activate_focused(app: &mut App) {
    match app.ui.focus {
        FormField::Location => {
            // 位置取得中は入力欄を無効にする。
            if app.form.is_locating() {
                app.ui.status = "Aguarde a localização...".into();
                return;
            }
            app.input_box = Some(InputBoxState::new(
                "Localização (endereço):",
                app.form.draft().location.clone(),
                InputCallbackId::Location,
            ));
        }
        FormField::Category => {
            // 現在の選択を初期位置にして一覧を開く。
            let selected = app.form.draft().category.map(Category::index).unwrap_or(0);
            app.select_box = Some(SelectBoxState {
                prompt: "Tipo de Problema".into(),
                options: Category::ALL.iter().map(|c| c.label().to_string()).collect(),
                selected,
                callback_id: SelectCallbackId::Category,
            });
        }
        FormField::Attachments => open_attachment_input(app),
        FormField::Description => {
            let max = app.form.limits().description_max_chars;
            app.input_box = Some(
                InputBoxState::new(
                    "Descrição do problema:",
                    app.form.draft().description.clone(),
                    InputCallbackId::Description,
                )
                .with_max_chars(max),
            );
        }
        FormField::Submit => submit(app),
    }
}

/// 検証して送信を開始する。不備はトーストで通知される。
fn submit(app: &mut App) {
    if app.form.is_submitting() {
        return;
    }
    if app.form.submit().is_ok() && app.form.is_submitting() {
        app.ui.status = "Enviando...".into();
    }
}

/// 現在地の取得を開始する。
fn locate(app: &mut App) {
    if app.form.is_locating() {
        return;
    }
    app.form.capture_location();
    if app.form.is_locating() {
        app.ui.status = "Localizando...".into();
    }
}

/// ファイル選択用の入力ボックスを開く（上限到達時は無効）。
fn open_attachment_input(app: &mut App) {
    if app.form.attachments_full() {
        app.ui.status = format!(
            "Limite de {} arquivos atingido",
            app.form.max_attachments()
        );
        return;
    }
    app.input_box = Some(InputBoxState::new(
        "Caminho das fotos/vídeos (separe com espaço):",
        String::new(),
        InputCallbackId::AttachmentPaths,
    ));
}

/// テキスト中のパスを添付としてまとめて追加する。
fn stage_paths(app: &mut App, text: &str, origin: &str) {
    let mut batch = Vec::new();
    for path in split_dropped_paths(text) {
        match Attachment::from_path(&path) {
            Ok(a) => batch.push(a),
            Err(e) => {
                // 読めないパスは飛ばして続ける。
                tracing::warn!("skipping {}: {e}", path.display());
                app.ui.push_log(format!("ignorado: {}", path.display()));
            }
        }
    }
    if batch.is_empty() {
        app.ui.status = "Nenhum arquivo válido".into();
        return;
    }

    tracing::info!("{origin}: {} files offered", batch.len());
    let staged = app.form.add_attachments(batch).len();
    app.ui.status = format!(
        "{} de {} arquivos adicionados",
        staged,
        app.form.max_attachments()
    );
}

/// 選択ボックスのキー処理。
fn handle_select_box_key(app: &mut App, k: KeyEvent) {
    let Some(select_state) = app.select_box.as_mut() else {
        return;
    };
    let sc = &app.shortcuts.select_box;

    if shortcuts::matches_shortcut(&k, &sc.confirm) {
        // 閉じる前に選択位置と種別を保存する。
        let selected = select_state.selected;
        let callback_id = select_state.callback_id.clone();
        app.select_box = None;
        match callback_id {
            SelectCallbackId::Category => {
                app.form.set_category(Category::ALL.get(selected).copied());
            }
        }
    } else if shortcuts::matches_shortcut(&k, &sc.cancel) {
        app.select_box = None;
    } else if shortcuts::matches_shortcut(&k, &sc.up) {
        select_state.move_up();
    } else if shortcuts::matches_shortcut(&k, &sc.down) {
        select_state.move_down();
    }
}

/// 入力ボックスのキー処理。
fn handle_input_box_key(app: &mut App, k: KeyEvent) {
    // 入力ボックスが無ければ何もしない。
    let Some(input_state) = app.input_box.as_mut() else {
        return;
    };

    // 入力ボックス用ショートカットを参照する。
    let sc = &app.shortcuts.input_box;

    if shortcuts::matches_shortcut(&k, &sc.confirm) {
        // 入力ボックスを閉じる前に値とコールバック種別を保存する。
        let value = input_state.value.clone();
        let callback_id = input_state.callback_id.clone();
        app.input_box = None;

        // コールバック種別に応じて値を反映する。
        apply_input_callback(app, callback_id, value);
    } else if shortcuts::matches_shortcut(&k, &sc.cancel) {
        // 入力を破棄して入力ボックスを閉じる。
        app.input_box = None;
    } else if shortcuts::matches_shortcut(&k, &sc.backspace) {
        input_state.backspace();
    } else if shortcuts::matches_shortcut(&k, &sc.delete) {
        input_state.delete();
    } else if shortcuts::matches_shortcut(&k, &sc.left) {
        input_state.move_left();
    } else if shortcuts::matches_shortcut(&k, &sc.right) {
        input_state.move_right();
    } else if shortcuts::matches_shortcut(&k, &sc.home) {
        input_state.move_home();
    } else if shortcuts::matches_shortcut(&k, &sc.end) {
        input_state.move_end();
    } else if shortcuts::matches_shortcut(&k, &sc.clear_line) {
        input_state.clear_line();
    } else if let KeyCode::Char(c) = k.code
        && !k.modifiers.contains(KeyModifiers::CONTROL)
    {
        // コントロールキーでない場合のみ挿入する。
        input_state.insert_char(c);
    }
}

/// 入力ボックスのコールバックを適用する。
fn apply_input_callback(app: &mut App, callback_id: InputCallbackId, value: String) {
    match callback_id {
        InputCallbackId::Location => {
            // 入力中に位置取得が始まっていれば反映しない。
            if !app.form.set_location(value) {
                app.ui.status = "Aguarde a localização...".into();
            }
        }
        InputCallbackId::AttachmentPaths => stage_paths(app, &value, "selection"),
        InputCallbackId::Description => app.form.set_description(&value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{Config, GeoProvider},
        events::STATUS_READY,
        form::SubmissionState,
        shortcuts::Shortcuts,
    };
    use std::time::Duration;

    fn app() -> App {
        let mut cfg = Config::default();
        cfg.geolocation.provider = GeoProvider::Fixed;
        cfg.geolocation.latitude = -23.5505199;
        cfg.geolocation.longitude = -46.6333094;
        App::new(&cfg, Shortcuts::default()).unwrap()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_key(app, key(KeyCode::Char(c))).unwrap();
        }
    }

    fn temp_file(bytes: usize) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("drop-{}.jpg", uuid::Uuid::new_v4()));
        std::fs::write(&path, vec![0u8; bytes]).unwrap();
        path
    }

    #[test]
    fn test_edit_location_through_input_box() {
        let mut app = app();
        handle_key(&mut app, key(KeyCode::Enter)).unwrap();
        assert!(app.input_box.is_some());
        type_text(&mut app, "Rua A, 100");
        handle_key(&mut app, key(KeyCode::Enter)).unwrap();
        assert!(app.input_box.is_none());
        assert_eq!(app.form.draft().location, "Rua A, 100");
    }

    #[test]
    fn test_cancel_input_box_keeps_value() {
        let mut app = app();
        app.form.set_location("Rua B");
        handle_key(&mut app, key(KeyCode::Enter)).unwrap();
        type_text(&mut app, "xyz");
        handle_key(&mut app, key(KeyCode::Esc)).unwrap();
        assert_eq!(app.form.draft().location, "Rua B");
        // 入力ボックスを閉じた後のEscは終了を意味する。
        assert!(handle_key(&mut app, key(KeyCode::Esc)).unwrap());
    }

    #[test]
    fn test_select_category() {
        let mut app = app();
        handle_key(&mut app, key(KeyCode::Tab)).unwrap();
        assert_eq!(app.ui.focus, FormField::Category);
        handle_key(&mut app, key(KeyCode::Enter)).unwrap();
        handle_key(&mut app, key(KeyCode::Down)).unwrap();
        handle_key(&mut app, key(KeyCode::Enter)).unwrap();
        assert!(app.select_box.is_none());
        assert_eq!(app.form.draft().category, Some(Category::Buraco));
    }

    #[test]
    fn test_description_input_is_capped() {
        let mut app = app();
        app.ui.focus = FormField::Description;
        handle_key(&mut app, key(KeyCode::Enter)).unwrap();
        handle_paste(&mut app, &"a".repeat(600));
        handle_key(&mut app, key(KeyCode::Enter)).unwrap();
        assert_eq!(app.form.draft().description_chars(), 500);
    }

    #[test]
    fn test_drop_stages_first_files_up_to_cap() {
        let mut app = app();
        let paths: Vec<_> = (0..4).map(|_| temp_file(16)).collect();
        let text = paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(" ");

        handle_paste(&mut app, &text);
        let staged: Vec<_> = app.form.attachments().iter().map(|a| a.path.clone()).collect();
        assert_eq!(staged, paths[..3].to_vec());

        // 上限到達後はファイル選択を開かない。
        handle_key(&mut app, key(KeyCode::Char('a'))).unwrap();
        assert!(app.input_box.is_none());

        for p in paths {
            std::fs::remove_file(p).unwrap();
        }
    }

    #[test]
    fn test_remove_selected_attachment() {
        let mut app = app();
        let paths: Vec<_> = (0..2).map(|_| temp_file(8)).collect();
        handle_paste(
            &mut app,
            &format!("{} {}", paths[0].display(), paths[1].display()),
        );
        app.ui.focus = FormField::Attachments;
        handle_key(&mut app, key(KeyCode::Right)).unwrap();
        assert_eq!(app.ui.selected_attachment, 1);
        handle_key(&mut app, key(KeyCode::Char('x'))).unwrap();
        assert_eq!(app.form.attachments().len(), 1);
        assert_eq!(app.form.attachments()[0].path, paths[0]);
        assert_eq!(app.ui.selected_attachment, 0);

        for p in paths {
            std::fs::remove_file(p).unwrap();
        }
    }

    #[test]
    fn test_missing_paths_are_skipped() {
        let mut app = app();
        handle_paste(&mut app, "/no/such/file.jpg");
        assert!(app.form.attachments().is_empty());
        assert_eq!(app.ui.status, "Nenhum arquivo válido");
    }

    #[test]
    fn test_invalid_submit_shows_toast() {
        let mut app = app();
        handle_key(&mut app, KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)).unwrap();
        app.pump();
        assert_eq!(app.form.state(), SubmissionState::Idle);
        let toast = app.ui.toast.clone().unwrap();
        assert_eq!(toast.title, "Localização obrigatória");
        assert_eq!(app.ui.log.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gps_then_submit_round() {
        let mut app = app();
        handle_key(&mut app, key(KeyCode::Char('g'))).unwrap();
        assert!(app.form.is_locating());
        // 取得中は場所の入力欄を開かない。
        handle_key(&mut app, key(KeyCode::Enter)).unwrap();
        assert!(app.input_box.is_none());

        tokio::time::sleep(Duration::from_millis(10)).await;
        app.pump();
        assert_eq!(app.form.draft().location, "-23.550520, -46.633309");
        // 取得完了で「Localizando...」は消える。
        assert_eq!(app.ui.status, STATUS_READY);

        app.form.set_category(Some(Category::Iluminacao));
        app.form.set_description("Poste apagado há três dias");
        app.ui.focus = FormField::Submit;
        handle_key(&mut app, key(KeyCode::Enter)).unwrap();
        assert!(app.form.is_submitting());
        assert_eq!(app.ui.status, "Enviando...");

        tokio::time::sleep(Duration::from_millis(2100)).await;
        app.pump();
        assert!(!app.form.is_submitting());
        assert!(app.form.draft().location.is_empty());
        assert_eq!(app.ui.status, STATUS_READY);
        assert_eq!(
            app.ui.toast.as_ref().map(|t| t.title.as_str()),
            Some("Problema reportado com sucesso!")
        );
    }
}
