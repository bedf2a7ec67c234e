// Lovi - ui/panels/monitor_view.rs
//
// Central panel: a tab strip with one tab per monitored file and the
// current tab's lines below it.
//
// Lines are drawn with `ScrollArea::show_rows`, so only visible rows cost
// anything regardless of how full the view buffer is. The view sticks to
// the newest line while `follow_tail` is set.

use crate::app::state::AppState;
use crate::ui::theme;
use egui::RichText;

/// Render the tab strip and the current view.
pub fn render(ui: &mut egui::Ui, state: &mut AppState) {
    if state.tabs.is_empty() {
        ui.centered_and_justified(|ui| {
            ui.label("No files monitored.\nOpen one via File \u{2192} Open\u{2026}");
        });
        return;
    }

    render_tab_strip(ui, state);
    ui.separator();

    let font = theme::view_font(state.font, state.font_size);
    let row_height = ui.fonts(|f| f.row_height(&font));
    let dark_mode = ui.visuals().dark_mode;
    let follow = state.follow_tail;

    let Some(tab) = state.current_tab() else {
        return;
    };
    let rows = tab.lines.len();

    let output = egui::ScrollArea::both()
        .id_salt(("monitor_view", tab.id))
        .auto_shrink([false; 2])
        .stick_to_bottom(follow)
        .show_rows(ui, row_height, rows, |ui, row_range| {
            for line in tab.lines.range(row_range) {
                let mut text = RichText::new(line.text.as_str()).font(font.clone());
                if let Some(colour) = theme::class_colour(line.class, dark_mode) {
                    text = text.color(colour);
                }
                ui.add(egui::Label::new(text).extend());
            }
        });

    // Scrolling away from the bottom pauses following; scrolling back resumes it.
    let max_offset = (output.content_size.y - output.inner_rect.height()).max(0.0);
    state.follow_tail = output.state.offset.y >= max_offset - row_height;
}

fn render_tab_strip(ui: &mut egui::Ui, state: &mut AppState) {
    let mut select = None;
    let mut close = None;

    egui::ScrollArea::horizontal()
        .id_salt("tab_strip")
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                for (idx, tab) in state.tabs.iter().enumerate() {
                    let selected = state.current == Some(idx);
                    let response = ui
                        .selectable_label(selected, &tab.name)
                        .on_hover_text(tab.path.display().to_string());
                    if response.clicked() {
                        select = Some(idx);
                    }
                    if ui.small_button("\u{2715}").on_hover_text("Close").clicked() {
                        close = Some(tab.id);
                    }
                    ui.separator();
                }
            });
        });

    if let Some(idx) = select {
        state.select_tab(idx);
        state.follow_tail = true;
    }
    if close.is_some() {
        state.pending_close = close;
    }
}
