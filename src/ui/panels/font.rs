// Lovi - ui/panels/font.rs
//
// Font window: family and size of the log view. Changes apply immediately
// and are saved with the file list on exit.

use crate::app::state::AppState;
use crate::core::model::ViewFont;
use crate::ui::theme;
use crate::util::constants::{DEFAULT_FONT_SIZE, MAX_FONT_SIZE, MIN_FONT_SIZE};

/// Render the font window (if `state.show_font` is true).
pub fn render(ctx: &egui::Context, state: &mut AppState) {
    if !state.show_font {
        return;
    }

    let mut open = true;
    let mut close = false;

    egui::Window::new("Font")
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .min_width(theme::FONT_WINDOW_WIDTH)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                for font in [ViewFont::Fixed, ViewFont::Proportional] {
                    ui.radio_value(&mut state.font, font, font.label());
                }
            });
            ui.add_space(4.0);

            let mut size = state.font_size;
            ui.add(
                egui::Slider::new(&mut size, MIN_FONT_SIZE..=MAX_FONT_SIZE)
                    .step_by(1.0)
                    .text("Size"),
            );
            if size != state.font_size {
                state.set_font_size(size);
            }

            ui.add_space(6.0);
            ui.horizontal(|ui| {
                if ui.button("Default").clicked() {
                    state.font = ViewFont::default();
                    state.set_font_size(DEFAULT_FONT_SIZE);
                }
                close = ui.button("Close").clicked();
            });
        });

    if close || !open {
        state.show_font = false;
    }
}
