//! フォーム画面のレイアウト計算。

use ratatui::prelude::*;

/// フォーム欄と情報欄を左右に並べる最小幅。これ未満は上下に積む。
const SIDE_BY_SIDE_MIN_WIDTH: u16 = 80;
/// HELP・STATUSバーの高さ（枠線込み）。
const BAR_HEIGHT: u16 = 3;

/// 画面全体の領域（本体 + HELP + STATUS）。
pub struct MainLayout {
    pub body: Rect,
    pub help_bar: Rect,
    pub status_bar: Rect,
}

/// 本体の領域（入力フォーム + 添付・ログの情報欄）。
pub struct BodyLayout {
    pub form_panel: Rect,
    pub info_panel: Rect,
}

/// 下部に2本のバーを固定し、残りを本体にする。
pub fn create_main_layout(area: Rect) -> MainLayout {
    let [body, help_bar, status_bar] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(BAR_HEIGHT),
        Constraint::Length(BAR_HEIGHT),
    ])
    .areas(area);

    MainLayout {
        body,
        help_bar,
        status_bar,
    }
}

/// 本体を6:4で分ける。幅が足りない端末ではフォームを上、情報欄を下に置く。
pub fn create_body_layout(area: Rect) -> BodyLayout {
    let constraints = [Constraint::Percentage(60), Constraint::Percentage(40)];
    let [form_panel, info_panel] = if area.width >= SIDE_BY_SIDE_MIN_WIDTH {
        Layout::horizontal(constraints).areas(area)
    } else {
        Layout::vertical(constraints).areas(area)
    };

    BodyLayout {
        form_panel,
        info_panel,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bars_are_pinned_to_bottom() {
        let main = create_main_layout(Rect::new(0, 0, 100, 30));
        assert_eq!(main.body.height, 24);
        assert_eq!(main.help_bar.y, 24);
        assert_eq!(main.status_bar.y, 27);
        assert_eq!(main.status_bar.height, BAR_HEIGHT);
    }

    #[test]
    fn test_wide_terminal_places_panels_side_by_side() {
        let body = create_body_layout(Rect::new(0, 0, 100, 24));
        assert_eq!(body.form_panel.width, 60);
        assert_eq!(body.info_panel.x, 60);
        assert_eq!(body.info_panel.height, 24);
    }

    #[test]
    fn test_narrow_terminal_stacks_panels() {
        let body = create_body_layout(Rect::new(0, 0, 60, 20));
        assert_eq!(body.form_panel.width, 60);
        assert_eq!(body.info_panel.width, 60);
        assert_eq!(body.form_panel.height, 12);
        assert_eq!(body.info_panel.y, 12);
    }
}
