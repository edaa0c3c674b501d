use super::ActionProgress;
use super::MigratorApp;
use crate::utils::format_size;
use eframe::egui::{self, Align, Color32, RichText};

const ACCENT: Color32 = Color32::from_rgb(33, 115, 70);
const ERROR_RED: Color32 = Color32::from_rgb(220, 50, 50);
const MUTED: Color32 = Color32::from_rgb(150, 150, 150);

impl MigratorApp {
    pub fn render(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let total_height = ui.available_height();
            let footer_height = 40.0;
            let footer_margin = 15.0;
            let content_height = total_height - footer_height - footer_margin;

            egui::ScrollArea::vertical()
                .max_height(content_height)
                .show(ui, |ui| {
                    ui.add_space(20.0);
                    ui.vertical_centered(|ui| {
                        ui.heading("Workbook Migrator");
                        ui.add_space(5.0);
                        ui.label(
                            RichText::new("Upload an old workbook to receive it in the new template")
                                .color(ui.visuals().text_color().gamma_multiply(0.7)),
                        );
                    });

                    ui.add_space(20.0);

                    ui.group(|ui| {
                        ui.horizontal(|ui| {
                            ui.label("Service");
                            ui.add_space(4.0);
                            ui.monospace(self.config.base_url());
                        });
                        ui.horizontal(|ui| {
                            ui.label("Saving to");
                            ui.add_space(4.0);
                            ui.monospace(
                                self.config
                                    .download_dir
                                    .join(&self.config.artifact_name)
                                    .display()
                                    .to_string(),
                            );
                        });
                    });

                    ui.add_space(20.0);

                    ui.vertical_centered(|ui| {
                        let button = egui::Button::new("📂 Select Workbook")
                            .min_size(egui::vec2(200.0, 40.0));
                        if ui.add(button).clicked() {
                            self.select_file();
                        }

                        if let (Some(name), Some(size)) =
                            (&self.state.file_name, self.state.file_size)
                        {
                            ui.add_space(5.0);
                            ui.label(format!("Selected: {} ({})", name, format_size(size)));
                        }
                    });

                    ui.add_space(20.0);

                    if !matches!(self.state.progress, ActionProgress::NotStarted) {
                        self.render_progress(ui);
                    }

                    ui.add_space(20.0);
                });

            ui.with_layout(egui::Layout::bottom_up(Align::Center), |ui| {
                ui.add_space(footer_margin);
                self.render_footer(ui);
            });
        });
    }

    fn render_progress(&mut self, ui: &mut egui::Ui) {
        let mut clear_clicked = false;

        ui.group(|ui| {
            let progress_bar = egui::ProgressBar::new(self.state.get_progress_fraction())
                .show_percentage()
                .animate(self.state.is_uploading())
                .fill(ACCENT);
            ui.add(progress_bar);

            let status = self.state.get_status_text();
            match &self.state.progress {
                ActionProgress::Failed { .. } => {
                    ui.colored_label(ERROR_RED, status);
                }
                _ => {
                    ui.label(status);
                }
            }

            if let Some(warning) = &self.state.poll_warning {
                ui.colored_label(MUTED, warning);
            }

            if let Some(upload_id) = &self.state.upload_id {
                ui.label(
                    RichText::new(format!("Upload ID: {}", upload_id))
                        .small()
                        .color(MUTED),
                );
            }

            if let ActionProgress::Completed { saved_to } = &self.state.progress {
                ui.add_space(5.0);
                ui.horizontal(|ui| {
                    ui.label(format!("Saved: {}", saved_to.display()));
                    if ui.button("📁 Open Folder").clicked() {
                        let folder = saved_to
                            .parent()
                            .map(|p| p.to_path_buf())
                            .unwrap_or_else(|| self.config.download_dir.clone());
                        if let Err(e) = open::that(&folder) {
                            tracing::warn!("Could not open {}: {}", folder.display(), e);
                        }
                    }
                });
            }

            if !self.state.is_uploading() {
                ui.add_space(5.0);
                if ui.button("🗑 Clear").clicked() {
                    clear_clicked = true;
                }
            }
        });

        if clear_clicked {
            self.reset_upload_state();
        }
    }

    fn render_footer(&self, ui: &mut egui::Ui) {
        if let Some(path) = &self.selected_path {
            ui.vertical_centered(|ui| {
                ui.label(RichText::new(path.display().to_string()).small().color(MUTED));
            });
        }
    }
}
