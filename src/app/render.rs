//! TUI描画関連の関数。

use ratatui::{
    Frame,
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::{
    events::FormField,
    form::SubmissionState,
    input, layout,
    shortcuts::{Shortcuts, format_keys},
};

use super::App;

/// 選択・フォーカス中の強調色。
const HIGHLIGHT: Color = Color::Rgb(255, 140, 0);

/// 画面全体のレイアウトを描画する。
pub fn draw(f: &mut Frame, app: &App) {
    // メインレイアウト（Body + HELP + STATUS）を作る。
    let main_layout = layout::create_main_layout(f.area());
    let body_layout = layout::create_body_layout(main_layout.body);

    // 左パネル：フォーム本体。
    let form_panel = Paragraph::new(build_form_lines(app))
        .block(Block::default().borders(Borders::ALL).title("REPORTAR PROBLEMA"))
        .wrap(Wrap { trim: false });
    f.render_widget(form_panel, body_layout.form_panel);

    // 右パネル：添付一覧とログ。
    let info_panel = Paragraph::new(build_info_lines(app))
        .block(Block::default().borders(Borders::ALL).title("INFO"))
        .wrap(Wrap { trim: true });
    f.render_widget(info_panel, body_layout.info_panel);

    // HELPバー（状況ごとのショートカット）を描画する。
    let help_bar = Paragraph::new(get_help_text(app, &app.shortcuts))
        .block(Block::default().borders(Borders::ALL).title("HELP"))
        .wrap(Wrap { trim: true });
    f.render_widget(help_bar, main_layout.help_bar);

    // STATUSバー（進行状況・トースト）を描画する。
    f.render_widget(build_status_bar(app), main_layout.status_bar);

    // ポップアップが開いていれば重ねて描画する。
    if let Some(input_state) = &app.input_box {
        input::render_input_box(f, input_state);
    }
    if let Some(select_state) = &app.select_box {
        input::render_select_box(f, select_state);
    }
}

/// 1項目分の行を作る。
fn field_line(focused: bool, label: &str, value: String, placeholder: bool) -> Line<'static> {
    let marker = if focused { "→ " } else { "  " };
    let value_style = if placeholder {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::raw(marker),
        Span::styled(
            format!("{label}: "),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(value, value_style),
    ])
}

/// フォームパネルの行を構築する。
fn build_form_lines(app: &App) -> Vec<Line<'static>> {
    let draft = app.form.draft();
    let focus = app.ui.focus;

    let mut lines = vec![
        Line::from("Ajude a melhorar nossa cidade reportando problemas urbanos").fg(Color::Gray),
        Line::default(),
    ];

    // 場所（取得中は入力不可の表示）。
    let (location, placeholder) = if app.form.is_locating() {
        ("Localizando...".to_string(), true)
    } else if draft.location.is_empty() {
        ("Digite o endereço ou use GPS".to_string(), true)
    } else {
        (draft.location.clone(), false)
    };
    lines.push(field_line(
        focus == FormField::Location,
        "Localização *",
        location,
        placeholder,
    ));
    lines.push(Line::default());

    // カテゴリ。
    let (category, placeholder) = match draft.category {
        Some(c) => (c.label().to_string(), false),
        None => ("Selecione a categoria do problema".to_string(), true),
    };
    lines.push(field_line(
        focus == FormField::Category,
        "Tipo de Problema *",
        category,
        placeholder,
    ));
    lines.push(Line::default());

    // 添付の件数。
    let count = app.form.attachments().len();
    let max = app.form.max_attachments();
    let (attachments, placeholder) = if count == 0 {
        (
            format!("Arraste arquivos ou pressione Enter para selecionar (máx. {max})"),
            true,
        )
    } else {
        (format!("{count} de {max} arquivos adicionados"), false)
    };
    lines.push(field_line(
        focus == FormField::Attachments,
        "Fotos e Vídeos (Opcional)",
        attachments,
        placeholder,
    ));
    lines.push(Line::default());

    // 説明文と文字数カウンタ。
    let (description, placeholder) = if draft.description.is_empty() {
        (
            "Ex: Poste de luz quebrado na esquina da Rua A com Rua B".to_string(),
            true,
        )
    } else {
        (draft.description.clone(), false)
    };
    lines.push(field_line(
        focus == FormField::Description,
        "Descrição do Problema *",
        description,
        placeholder,
    ));
    lines.push(
        Line::from(format!(
            "{}/{} caracteres",
            draft.description_chars(),
            app.form.limits().description_max_chars
        ))
        .fg(Color::Gray)
        .alignment(Alignment::Right),
    );
    lines.push(Line::default());

    // 送信ボタン。
    let label = if app.form.is_submitting() {
        "[ Enviando... ]"
    } else {
        "[ Enviar Solicitação ]"
    };
    let style = if focus == FormField::Submit {
        Style::default()
            .bg(HIGHLIGHT)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    lines.push(Line::from(Span::styled(label, style)).alignment(Alignment::Center));

    lines
}

/// INFOパネルの行を構築する（添付一覧 + 直近ログ）。
fn build_info_lines(app: &App) -> Vec<Line<'static>> {
    let attachments = app.form.attachments();
    let mut lines = vec![
        Line::from(format!(
            "Arquivos ({}/{}):",
            attachments.len(),
            app.form.max_attachments()
        ))
        .bold(),
    ];

    if attachments.is_empty() {
        lines.push(Line::from("  (nenhum)").fg(Color::DarkGray));
    }
    for (i, a) in attachments.iter().enumerate() {
        // 添付一覧にフォーカスがあるときだけ選択行を示す。
        let selected = app.ui.focus == FormField::Attachments && i == app.ui.selected_attachment;
        let text = format!(
            "{} {}. {}  {}",
            if selected { "→" } else { " " },
            i + 1,
            a.name,
            a.size_label()
        );
        if selected {
            lines.push(Line::from(text).fg(HIGHLIGHT));
        } else {
            lines.push(Line::from(text));
        }
    }

    // ログは末尾8件だけ表示する。
    lines.push(Line::default());
    lines.push(Line::from("Log:").bold());
    let skip = app.ui.log.len().saturating_sub(8);
    lines.extend(app.ui.log.iter().skip(skip).cloned().map(Line::from));

    lines
}

/// ステータスバーを構築する。
fn build_status_bar(app: &App) -> Paragraph<'static> {
    // 進行中の処理を先頭に示す。
    let activity = if app.form.state() == SubmissionState::Submitting {
        "Enviando"
    } else if app.form.is_locating() {
        "Localizando"
    } else {
        "Formulário"
    };

    // 直近のトーストがあれば優先して表示する。
    let (text, destructive) = match &app.ui.toast {
        Some(t) => (format!("[{}] {} | {}", activity, app.ui.status, t), t.is_destructive()),
        None => (format!("[{}] {}", activity, app.ui.status), false),
    };

    let mut status_bar = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("STATUS"))
        .wrap(Wrap { trim: true });

    // 失敗系のトーストは赤色で強調表示する。
    if destructive {
        status_bar = status_bar.style(Style::default().fg(Color::Red));
    }

    status_bar
}

/// 状況に応じたヘルプ文字列を返す。
fn get_help_text(app: &App, shortcuts: &Shortcuts) -> String {
    if app.select_box.is_some() {
        let sc = &shortcuts.select_box;
        return format!(
            "{}/{}: navigate | {}: select | {}: cancel",
            format_keys(&sc.up),
            format_keys(&sc.down),
            format_keys(&sc.confirm),
            format_keys(&sc.cancel)
        );
    }
    if app.input_box.is_some() {
        let sc = &shortcuts.input_box;
        return format!(
            "{}: confirm | {}: cancel | {}: clear",
            format_keys(&sc.confirm),
            format_keys(&sc.cancel),
            format_keys(&sc.clear_line)
        );
    }

    let sc = &shortcuts.form;
    let mut text = format!(
        "{}: next | {}: edit | {}: GPS | {}: attach | {}: submit | {}: quit",
        format_keys(&sc.next_field),
        format_keys(&sc.edit),
        format_keys(&sc.locate),
        format_keys(&sc.attach),
        format_keys(&sc.submit),
        format_keys(&sc.quit)
    );
    // 添付一覧にいるときは削除キーも案内する。
    if app.ui.focus == FormField::Attachments {
        text.push_str(&format!(
            " | {}/{}: choose file | {}: remove",
            format_keys(&sc.prev_attachment),
            format_keys(&sc.next_attachment),
            format_keys(&sc.remove_attachment)
        ));
    }
    text
}
