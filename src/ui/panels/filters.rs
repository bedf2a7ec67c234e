// Lovi - ui/panels/filters.rs
//
// Filters window: edit the error and warning markers as comma-separated
// lists. Apply hands a new marker snapshot to the App, which forwards it to
// the scheduler. Lines already on screen keep their colours.

use crate::app::state::AppState;
use crate::ui::theme;

/// Render the filters window (if `state.show_filters` is true).
pub fn render(ctx: &egui::Context, state: &mut AppState) {
    if !state.show_filters {
        return;
    }

    let mut open = true;
    let mut apply = false;
    let mut cancel = false;

    egui::Window::new("Filters")
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .min_width(theme::FILTERS_WINDOW_WIDTH)
        .show(ctx, |ui| {
            ui.label("Lines containing any of these words are highlighted.");
            ui.label(
                egui::RichText::new("Comma separated, case-insensitive. Errors win over warnings.")
                    .small()
                    .weak(),
            );
            ui.add_space(6.0);

            egui::Grid::new("filters_grid")
                .num_columns(2)
                .spacing([8.0, 6.0])
                .show(ui, |ui| {
                    ui.label("Errors:");
                    ui.add(
                        egui::TextEdit::singleline(&mut state.error_markers_input)
                            .desired_width(f32::INFINITY),
                    );
                    ui.end_row();

                    ui.label("Warnings:");
                    ui.add(
                        egui::TextEdit::singleline(&mut state.warning_markers_input)
                            .desired_width(f32::INFINITY),
                    );
                    ui.end_row();
                });

            ui.add_space(6.0);
            ui.horizontal(|ui| {
                apply = ui.button("Apply").clicked();
                cancel = ui.button("Cancel").clicked();
            });
        });

    if apply {
        state.pending_filters = Some(state.edited_markers());
        state.show_filters = false;
    } else if cancel || !open {
        state.revert_marker_inputs();
        state.show_filters = false;
    }
}
