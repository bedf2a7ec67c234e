// Lovi - gui.rs
//
// Top-level eframe::App implementation.
// Wires the panels to AppState and relays between the UI and the
// scheduler thread: requests from panels become MonitorManager commands,
// and MonitorProgress messages become tab and status-bar updates.

use crate::app::scheduler::MonitorManager;
use crate::app::state::AppState;
use crate::core::model::MonitorProgress;
use crate::ui;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// The Lovi application.
pub struct LoviApp {
    pub state: AppState,
    pub monitor: MonitorManager,
    /// Repaint cadence while files are monitored.
    repaint_interval: Duration,
    /// Caption last sent to the window, to avoid resending it every frame.
    caption: String,
}

impl LoviApp {
    pub fn new(state: AppState, monitor: MonitorManager, repaint_interval: Duration) -> Self {
        Self {
            state,
            monitor,
            repaint_interval,
            caption: String::new(),
        }
    }

    /// Start monitoring each file, reporting failures in the status bar.
    fn open_files(&mut self, files: Vec<PathBuf>) {
        if files.is_empty() {
            return;
        }
        let mut opened = false;
        for path in files {
            match self.monitor.open(&path) {
                Ok(id) => {
                    self.state
                        .set_status(format!("Monitoring {}", path.display()), false);
                    self.state.add_tab(id, path);
                    opened = true;
                }
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "Open failed");
                    self.state.set_status(e.to_string(), false);
                }
            }
        }
        if opened {
            self.state.save_session();
        }
    }

    fn handle_progress(&mut self) -> bool {
        let messages = self.monitor.poll_progress();
        let had_messages = !messages.is_empty();
        for msg in messages {
            match msg {
                MonitorProgress::Started => {
                    tracing::debug!("Scheduler reports started");
                }
                MonitorProgress::Lines { id, lines } => {
                    self.state.append_lines(id, lines);
                }
                MonitorProgress::ReadFailed { path, message, .. } => {
                    tracing::warn!(file = %path.display(), error = %message, "Read failed");
                    self.state.set_status(message, false);
                }
                MonitorProgress::Changed { names } => {
                    self.state.notify_changes(&names);
                }
                MonitorProgress::Closed { id } => {
                    if self.state.remove_tab(id).is_some() {
                        self.state.save_session();
                    }
                }
                MonitorProgress::Stopped => {
                    tracing::info!("Scheduler reports stopped");
                }
            }
        }
        had_messages
    }

    /// Apply requests set by panels during the previous frame.
    fn handle_requests(&mut self) {
        let files = std::mem::take(&mut self.state.pending_open);
        self.open_files(files);

        if let Some(id) = self.state.pending_close.take() {
            if let Err(e) = self.monitor.close(id) {
                self.state.set_status(e.to_string(), false);
            }
        }

        if let Some(markers) = self.state.pending_filters.take() {
            match self.monitor.set_filters(markers.clone()) {
                Ok(()) => {
                    self.state.apply_markers(markers);
                    self.state.set_status("Filters updated", false);
                }
                Err(e) => self.state.set_status(e.to_string(), false),
            }
        }
    }

    fn open_dialog(&mut self) {
        let dialog = rfd::FileDialog::new()
            .set_title("Open Log File")
            .set_directory(&self.state.last_dir);
        if let Some(files) = dialog.pick_files() {
            if let Some(first) = files.first() {
                self.state.remember_dir(first);
            }
            self.state.pending_open.extend(files);
        }
    }
}

impl eframe::App for LoviApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let had_messages = self.handle_progress();
        self.handle_requests();

        let now = Instant::now();
        self.state.expire_status(now);

        let caption = self.state.caption();
        if caption != self.caption {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(caption.clone()));
            self.caption = caption;
        }

        let has_tab = self.state.current_tab().is_some();

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open\u{2026}").clicked() {
                        ui.close_menu();
                        self.open_dialog();
                    }
                    ui.add_enabled_ui(has_tab, |ui| {
                        if ui.button("Close").clicked() {
                            self.state.pending_close = self.state.current_tab().map(|t| t.id);
                            ui.close_menu();
                        }
                    });
                    ui.separator();
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
                ui.menu_button("Edit", |ui| {
                    ui.add_enabled_ui(has_tab, |ui| {
                        if ui.button("Copy").clicked() {
                            if let Some(text) = self.state.current_text() {
                                ctx.copy_text(text);
                                self.state.set_status("Copied view to clipboard.", false);
                            }
                            ui.close_menu();
                        }
                        if ui.button("Clear").clicked() {
                            self.state.clear_current();
                            ui.close_menu();
                        }
                    });
                });
                ui.menu_button("Settings", |ui| {
                    if ui.button("Filters\u{2026}").clicked() {
                        self.state.show_filters = true;
                        ui.close_menu();
                    }
                    if ui.button("Font\u{2026}").clicked() {
                        self.state.show_font = true;
                        ui.close_menu();
                    }
                });
                ui.menu_button("Help", |ui| {
                    if ui.button("About").clicked() {
                        self.state.show_about = true;
                        ui.close_menu();
                    }
                });
            });
        });

        // Status bar
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(ref status) = self.state.status {
                    if status.bell {
                        ui.label(
                            egui::RichText::new("\u{1f514}").color(ui::theme::BELL_COLOUR),
                        );
                    }
                    ui.label(
                        egui::RichText::new(status.at.format("%H:%M:%S").to_string()).weak(),
                    );
                    ui.label(&status.text);
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if let Some(tab) = self.state.current_tab() {
                        ui.label(format!("{} lines", tab.lines.len()));
                    }
                    if self.state.debug_mode {
                        ui.label(egui::RichText::new("DEBUG").weak());
                    }
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui::panels::monitor_view::render(ui, &mut self.state);
        });

        ui::panels::filters::render(ctx, &mut self.state);
        ui::panels::font::render(ctx, &mut self.state);
        ui::panels::about::render(ctx, &mut self.state);

        if had_messages {
            ctx.request_repaint();
        }
        // Keep polling the scheduler while files are open; otherwise wake
        // only to clear the status message.
        if !self.state.tabs.is_empty() {
            ctx.request_repaint_after(self.repaint_interval);
        } else if let Some(remaining) = self.state.status_remaining(now) {
            ctx.request_repaint_after(remaining);
        }
    }

    /// Save the file list and stop the scheduler before the window closes.
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.state.save_session();
        self.monitor.stop();
    }
}
