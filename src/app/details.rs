//! Right-hand details panel: selected node metadata, content preview,
//! AI explanation controls, and per-file commit history. Phase enums map
//! one-to-one onto what is shown; button handlers are collected as flags and
//! applied after drawing to keep the borrows simple.

use eframe::egui::{Color32, ComboBox, RichText, ScrollArea, TextEdit, Ui};
use tracing::warn;

use super::selection::{ContentPhase, ExplainPhase, HistoryPhase};
use super::{ViewModel, render_utils};
use crate::explain::{ExplainMode, Provider};
use crate::hierarchy::NodeKind;
use crate::util::format_bytes;

const ERROR_COLOR: Color32 = Color32::from_rgb(0xef, 0x44, 0x44);
const MUTED_COLOR: Color32 = Color32::from_rgb(0x9c, 0xa3, 0xaf);

impl ViewModel {
    pub(super) fn draw_details(&mut self, ui: &mut Ui) {
        let Some(selected) = self.selection.selected().cloned() else {
            ui.add_space(12.0);
            ui.label(RichText::new("Click a node to inspect it.").color(MUTED_COLOR));
            ui.add_space(4.0);
            ui.small("Right-click anywhere on the canvas to clear the selection.");
            return;
        };

        let mut clear = false;
        let mut retry_content = false;
        let mut save_binary = false;
        let mut request_explain = false;
        let mut request_explain_span = false;
        let mut retry_explain = false;
        let mut request_history = false;

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            ui.heading(selected.id.rsplit('/').next().unwrap_or(&selected.id));
            ui.with_layout(
                eframe::egui::Layout::right_to_left(eframe::egui::Align::Center),
                |ui| {
                    clear = ui.small_button("Clear").clicked();
                },
            );
        });
        ui.label(RichText::new(&selected.id).monospace().color(MUTED_COLOR));

        let kind_label = match selected.kind {
            NodeKind::Root => "repository root",
            NodeKind::Tree => "directory",
            NodeKind::Blob => "file",
        };
        ui.horizontal(|ui| {
            ui.label(kind_label);
            if let Some(sha) = &selected.sha {
                ui.label(
                    RichText::new(sha.get(..7).unwrap_or(sha))
                        .monospace()
                        .color(MUTED_COLOR),
                );
            }
        });
        ui.separator();

        if selected.kind == NodeKind::Blob {
            match &self.selection.content {
                ContentPhase::Idle => {}
                ContentPhase::Loading => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Loading content...");
                    });
                }
                ContentPhase::Failed(message) => {
                    ui.colored_label(ERROR_COLOR, message);
                    retry_content = ui.button("Retry").clicked();
                }
                ContentPhase::Ready(content) => {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(content.mime).monospace().color(MUTED_COLOR));
                        ui.label(format_bytes(content.size));
                    });
                    ui.add_space(4.0);

                    if let Some(text) = content.text() {
                        let mut span = None;
                        ScrollArea::vertical()
                            .id_salt("content_preview")
                            .max_height(320.0)
                            .show(ui, |ui| {
                                let mut preview: &str = text;
                                let output = TextEdit::multiline(&mut preview)
                                    .code_editor()
                                    .desired_width(f32::INFINITY)
                                    .show(ui);
                                span = output.state.cursor.char_range().and_then(|range| {
                                    let start = range.primary.index.min(range.secondary.index);
                                    let end = range.primary.index.max(range.secondary.index);
                                    (end > start).then(|| {
                                        text.chars().skip(start).take(end - start).collect()
                                    })
                                });
                            });
                        self.preview_span =
                            span.filter(|selected: &String| !selected.trim().is_empty());
                    } else {
                        ui.label(
                            RichText::new("Binary file, preview suppressed.").color(MUTED_COLOR),
                        );
                        save_binary = ui.button("Save bytes to disk").clicked();
                    }
                    if let Some(feedback) = &self.save_feedback {
                        ui.small(feedback);
                    }
                }
            }

            if !self.dep_refs.is_empty() {
                ui.add_space(6.0);
                ui.label(format!(
                    "{} relative reference(s) highlighted in the graph",
                    self.dep_refs.len()
                ));
            }

            ui.separator();
            ui.strong("AI explanation");
            ui.horizontal(|ui| {
                ComboBox::from_id_salt("explain_provider")
                    .selected_text(self.provider.label())
                    .show_ui(ui, |ui| {
                        for provider in Provider::ALL {
                            ui.selectable_value(&mut self.provider, provider, provider.label());
                        }
                    });
                ui.add(
                    TextEdit::singleline(&mut self.model_input)
                        .hint_text(self.provider.default_model())
                        .desired_width(140.0),
                );
            });
            ui.add(
                TextEdit::singleline(&mut self.api_key)
                    .hint_text("API key")
                    .password(true)
                    .desired_width(f32::INFINITY),
            );

            let can_explain = matches!(&self.selection.content, ContentPhase::Ready(content) if !content.is_binary())
                && !matches!(self.selection.explanation, ExplainPhase::Loading);
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(can_explain, eframe::egui::Button::new("Explain this file"))
                    .clicked()
                {
                    request_explain = true;
                }
                if self.preview_span.is_some()
                    && ui
                        .add_enabled(
                            can_explain,
                            eframe::egui::Button::new("Explain highlighted lines"),
                        )
                        .clicked()
                {
                    request_explain_span = true;
                }
            });

            match &self.selection.explanation {
                ExplainPhase::Idle => {}
                ExplainPhase::Loading => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Waiting for the model...");
                    });
                }
                ExplainPhase::Ready(text) => {
                    ScrollArea::vertical()
                        .id_salt("explanation")
                        .max_height(240.0)
                        .show(ui, |ui| {
                            ui.label(text);
                        });
                }
                ExplainPhase::Failed { message, retryable } => {
                    ui.colored_label(ERROR_COLOR, message);
                    if *retryable && ui.button("Retry").clicked() {
                        retry_explain = true;
                    }
                }
            }

            ui.separator();
            ui.strong("History");
            match &self.selection.history {
                HistoryPhase::Idle => {
                    request_history = ui.button("View file history").clicked();
                }
                HistoryPhase::Loading => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Loading commits...");
                    });
                }
                HistoryPhase::Failed(message) => {
                    ui.colored_label(ERROR_COLOR, message);
                    request_history = ui.button("Retry").clicked();
                }
                HistoryPhase::Ready(commits) => {
                    if commits.is_empty() {
                        ui.label(RichText::new("No history available.").color(MUTED_COLOR));
                    }
                    for commit in commits {
                        ui.add_space(4.0);
                        ui.horizontal(|ui| {
                            ui.label(
                                RichText::new(commit.id.get(..7).unwrap_or(&commit.id))
                                    .monospace()
                                    .color(MUTED_COLOR),
                            );
                            ui.strong(&commit.author);
                            ui.label(RichText::new(&commit.timestamp).color(MUTED_COLOR));
                        });
                        ui.label(commit.message.lines().next().unwrap_or(""));
                    }
                }
            }
        } else if let Some(node) = self.tree.get(&selected.id) {
            ui.label(format!("{} direct children", node.children.len()));
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.label("Legend:");
                ui.colored_label(render_utils::TREE_COLOR, "directory");
                ui.colored_label(render_utils::BLOB_COLOR, "file");
            });
        }

        if clear {
            self.clear_selection();
        }
        if retry_content
            && let Some(index) = self.tree.index_of(&selected.id)
        {
            self.select_node(index);
        }
        if save_binary {
            self.save_selected_binary(&selected.id);
        }
        if request_explain {
            self.explain_mode = ExplainMode::File;
        }
        if request_explain_span {
            self.explain_mode = ExplainMode::Selection;
        }
        if request_explain || request_explain_span || retry_explain {
            self.request_explanation();
        }
        if request_history {
            self.request_history();
        }
    }

    fn save_selected_binary(&mut self, path: &str) {
        let ContentPhase::Ready(content) = &self.selection.content else {
            return;
        };

        let file_name = path.rsplit('/').next().unwrap_or("download.bin");
        let target = std::env::temp_dir().join(file_name);
        let outcome = content
            .bytes()
            .map_err(|error| error.to_string())
            .and_then(|bytes| {
                std::fs::write(&target, bytes).map_err(|error| error.to_string())
            });

        self.save_feedback = Some(match outcome {
            Ok(()) => format!("Saved to {}", target.display()),
            Err(error) => {
                warn!(path, %error, "saving binary payload failed");
                format!("Save failed: {error}")
            }
        });
    }
}
