use std::sync::mpsc::{Receiver, TryRecvError};

use eframe::egui::{self, Context, Vec2};
use tracing::info;

use crate::explain::{ExplainMode, ExplainRequest, Provider};
use crate::github::{CommitSummary, FileContent, GithubClient, RepoLocator, parse_repo_url};
use crate::hierarchy::FileTree;
use crate::layout::ForceSimulation;

mod details;
mod fetch;
mod graph_view;
mod highlight;
mod render_utils;
mod selection;
mod tree_view;

use fetch::{
    RepoSnapshot, spawn_content_fetch, spawn_explain_fetch, spawn_history_fetch, spawn_repo_load,
};
use selection::{ContentPhase, ExplainFailure, Selection};

pub struct LaunchOptions {
    pub repo_url: Option<String>,
    pub token: Option<String>,
    pub branch: Option<String>,
}

pub struct RepoGraphApp {
    form: LaunchForm,
    state: AppState,
    /// Branch switches and reloads while a model is already on screen.
    reload_rx: Option<Receiver<Result<RepoSnapshot, String>>>,
}

#[derive(Default)]
struct LaunchForm {
    repo_url: String,
    token: String,
    branch: Option<String>,
    status: Option<String>,
}

enum AppState {
    Input,
    Loading {
        rx: Receiver<Result<RepoSnapshot, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum VisMode {
    Graph,
    Tree,
}

/// Requests the view model hands back to the app shell for transitions it
/// cannot perform itself.
#[derive(Default)]
struct ShellRequest {
    switch_branch: Option<String>,
    back_to_input: bool,
}

impl RepoGraphApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, options: LaunchOptions) -> Self {
        let mut form = LaunchForm {
            repo_url: options.repo_url.unwrap_or_default(),
            token: options.token.unwrap_or_default(),
            branch: options.branch,
            status: None,
        };

        let state = if form.repo_url.is_empty() {
            AppState::Input
        } else {
            match parse_repo_url(&form.repo_url) {
                Ok(_) => Self::start_load(&form),
                Err(error) => {
                    form.status = Some(error.to_string());
                    AppState::Input
                }
            }
        };

        Self {
            form,
            state,
            reload_rx: None,
        }
    }

    fn credential(form: &LaunchForm) -> Option<String> {
        let trimmed = form.token.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_owned())
        }
    }

    fn start_load(form: &LaunchForm) -> AppState {
        AppState::Loading {
            rx: spawn_repo_load(
                form.repo_url.trim().to_owned(),
                Self::credential(form),
                form.branch.clone(),
            ),
        }
    }

    fn draw_input(form: &mut LaunchForm, ctx: &Context) -> bool {
        let mut submitted = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(120.0);
                ui.heading("Repository Structure Visualizer");
                ui.label("Explore a GitHub repository as an interactive graph.");
                ui.add_space(16.0);

                ui.add(
                    egui::TextEdit::singleline(&mut form.repo_url)
                        .hint_text("https://github.com/owner/repo")
                        .desired_width(420.0),
                );
                ui.add_space(6.0);
                ui.add(
                    egui::TextEdit::singleline(&mut form.token)
                        .hint_text("Personal access token (optional)")
                        .password(true)
                        .desired_width(420.0),
                );
                ui.add_space(10.0);

                let enter_pressed = ui.input(|input| input.key_pressed(egui::Key::Enter));
                if ui.button("Visualize").clicked() || enter_pressed {
                    match parse_repo_url(&form.repo_url) {
                        Ok(_) => {
                            form.status = None;
                            submitted = true;
                        }
                        Err(error) => form.status = Some(error.to_string()),
                    }
                }

                if let Some(status) = &form.status {
                    ui.add_space(8.0);
                    ui.colored_label(egui::Color32::from_rgb(0xef, 0x44, 0x44), status);
                }
                ui.add_space(8.0);
                ui.small("Tokens are only forwarded to the GitHub API, never stored.");
            });
        });

        submitted
    }

    fn handle_snapshot(&mut self, result: Result<RepoSnapshot, String>) -> AppState {
        match result {
            Ok(snapshot) => {
                self.form.branch = Some(snapshot.branch.clone());
                AppState::Ready(Box::new(ViewModel::new(snapshot, Self::credential(&self.form))))
            }
            Err(error) => AppState::Error(error),
        }
    }
}

impl eframe::App for RepoGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Input => {
                if Self::draw_input(&mut self.form, ctx) {
                    self.form.branch = None;
                    transition = Some(Self::start_load(&self.form));
                }
            }
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(self.handle_snapshot(result));
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Fetching repository structure...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                let mut retry = false;
                let mut back = false;
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Failed to load repository");
                        ui.add_space(6.0);
                        ui.label(error.as_str());
                        ui.add_space(10.0);
                        ui.horizontal(|ui| {
                            retry = ui.button("Retry").clicked();
                            back = ui.button("Change repository").clicked();
                        });
                    });
                });

                if retry {
                    transition = Some(Self::start_load(&self.form));
                } else if back {
                    transition = Some(AppState::Input);
                }
            }
            AppState::Ready(model) => {
                let mut request = ShellRequest::default();
                model.show(ctx, self.reload_rx.is_some(), &mut request);

                if request.back_to_input {
                    transition = Some(AppState::Input);
                } else if let Some(branch) = request.switch_branch
                    && self.reload_rx.is_none()
                {
                    info!(%branch, "switching branch");
                    self.form.branch = Some(branch);
                    self.reload_rx = Some(spawn_repo_load(
                        self.form.repo_url.trim().to_owned(),
                        Self::credential(&self.form),
                        self.form.branch.clone(),
                    ));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => transition = Some(self.handle_snapshot(result)),
                        Err(TryRecvError::Empty) => self.reload_rx = Some(rx),
                        Err(TryRecvError::Disconnected) => {
                            transition = Some(AppState::Error(
                                "Background load worker disconnected".to_owned(),
                            ));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}

/// Live visualizer state for one loaded repository snapshot. The structural
/// tree is immutable; layout, selection, and view parameters live beside it.
struct ViewModel {
    locator: RepoLocator,
    branch: String,
    branches: Vec<String>,
    client: GithubClient,
    tree: FileTree,
    node_radii: Vec<f32>,

    vis: VisMode,
    force: ForceSimulation,
    /// Layered layout cache, keyed by the canvas width it was computed for.
    tree_frame: Option<(f32, Vec<Vec2>)>,

    selection: Selection,
    /// Raw quoted relative references from the selected file's text.
    dep_refs: Vec<String>,
    /// The same references resolved against the selected file's directory.
    resolved_deps: Vec<String>,

    search: String,
    pan: Vec2,
    zoom: f32,
    zoom_enabled: bool,
    dragged: Option<usize>,
    panel_open: bool,

    provider: Provider,
    model_input: String,
    api_key: String,
    /// Text currently highlighted in the content preview, if any.
    preview_span: Option<String>,
    explain_mode: ExplainMode,
    save_feedback: Option<String>,

    content_rx: Option<(u64, Receiver<(u64, Result<FileContent, String>)>)>,
    history_rx: Option<(u64, Receiver<(u64, Result<Vec<CommitSummary>, String>)>)>,
    explain_rx: Option<(u64, Receiver<(u64, Result<String, ExplainFailure>)>)>,
}

impl ViewModel {
    fn new(snapshot: RepoSnapshot, credential: Option<String>) -> Self {
        let tree = FileTree::from_entries(&snapshot.entries);
        let max_blob_size = tree.max_blob_size();
        let node_radii = tree
            .nodes
            .iter()
            .map(|node| render_utils::node_radius(node, max_blob_size))
            .collect();
        let force = ForceSimulation::new(&tree);

        info!(
            repo = %snapshot.locator.slug(),
            branch = %snapshot.branch,
            nodes = tree.node_count(),
            edges = tree.edge_count(),
            "view model built"
        );

        Self {
            locator: snapshot.locator,
            branch: snapshot.branch,
            branches: snapshot.branches,
            client: GithubClient::new(credential),
            tree,
            node_radii,
            vis: VisMode::Graph,
            force,
            tree_frame: None,
            selection: Selection::default(),
            dep_refs: Vec::new(),
            resolved_deps: Vec::new(),
            search: String::new(),
            pan: Vec2::ZERO,
            zoom: 1.0,
            zoom_enabled: true,
            dragged: None,
            panel_open: true,
            provider: Provider::Gemini,
            model_input: String::new(),
            api_key: String::new(),
            preview_span: None,
            explain_mode: ExplainMode::File,
            save_feedback: None,
            content_rx: None,
            history_rx: None,
            explain_rx: None,
        }
    }

    fn show(&mut self, ctx: &Context, is_reloading: bool, request: &mut ShellRequest) {
        self.poll_fetches();

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.vis, VisMode::Graph, "Graph View");
                ui.selectable_value(&mut self.vis, VisMode::Tree, "Tree View");
                ui.separator();

                ui.add(
                    egui::TextEdit::singleline(&mut self.search)
                        .hint_text("Search...")
                        .desired_width(180.0),
                );

                let lock_label = if self.zoom_enabled {
                    "Lock pan/zoom"
                } else {
                    "Unlock pan/zoom"
                };
                if ui.button(lock_label).clicked() {
                    self.zoom_enabled = !self.zoom_enabled;
                }
                ui.separator();

                if !self.branches.is_empty() {
                    let mut picked = self.branch.clone();
                    egui::ComboBox::from_id_salt("branch_picker")
                        .selected_text(picked.clone())
                        .show_ui(ui, |ui| {
                            for name in &self.branches {
                                ui.selectable_value(&mut picked, name.clone(), name);
                            }
                        });
                    if picked != self.branch {
                        request.switch_branch = Some(picked);
                    }
                }
                if is_reloading {
                    ui.spinner();
                }
                ui.separator();

                let panel_label = if self.panel_open { "⟩⟩" } else { "⟨⟨" };
                if ui.button(panel_label).clicked() {
                    self.panel_open = !self.panel_open;
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Change repository").clicked() {
                        request.back_to_input = true;
                    }
                    ui.label(format!(
                        "{} @ {}  ({} files, {} nodes, {} edges)",
                        self.locator.slug(),
                        self.branch,
                        self.tree.blob_count(),
                        self.tree.node_count(),
                        self.tree.edge_count(),
                    ));
                });
            });
        });

        if self.panel_open {
            egui::SidePanel::right("details_panel")
                .resizable(true)
                .default_width(360.0)
                .width_range(260.0..=800.0)
                .show(ctx, |ui| {
                    egui::ScrollArea::vertical()
                        .id_salt("details_scroll")
                        .show(ui, |ui| self.draw_details(ui));
                });
        }

        egui::CentralPanel::default().show(ctx, |ui| match self.vis {
            VisMode::Graph => self.draw_graph(ui),
            VisMode::Tree => self.draw_tree(ui),
        });
    }

    fn poll_fetches(&mut self) {
        if let Some((token, rx)) = self.content_rx.take() {
            match rx.try_recv() {
                Ok((msg_token, result)) => {
                    if self.selection.on_content(msg_token, result) {
                        self.refresh_dependency_refs();
                    }
                }
                Err(TryRecvError::Empty) => self.content_rx = Some((token, rx)),
                Err(TryRecvError::Disconnected) => {
                    self.selection
                        .on_content(token, Err("content fetch worker disconnected".to_owned()));
                }
            }
        }

        if let Some((token, rx)) = self.history_rx.take() {
            match rx.try_recv() {
                Ok((msg_token, result)) => {
                    self.selection.on_history(msg_token, result);
                }
                Err(TryRecvError::Empty) => self.history_rx = Some((token, rx)),
                Err(TryRecvError::Disconnected) => {
                    self.selection
                        .on_history(token, Err("history fetch worker disconnected".to_owned()));
                }
            }
        }

        if let Some((token, rx)) = self.explain_rx.take() {
            match rx.try_recv() {
                Ok((msg_token, result)) => {
                    self.selection.on_explanation(msg_token, result);
                }
                Err(TryRecvError::Empty) => self.explain_rx = Some((token, rx)),
                Err(TryRecvError::Disconnected) => {
                    self.selection.on_explanation(
                        token,
                        Err(ExplainFailure {
                            message: "explanation worker disconnected".to_owned(),
                            retryable: true,
                        }),
                    );
                }
            }
        }
    }

    /// Applies a node click coming out of either view.
    fn select_node(&mut self, index: usize) {
        let Some(node) = self.tree.nodes.get(index) else {
            return;
        };
        let node = node.clone();

        self.dep_refs.clear();
        self.resolved_deps.clear();
        self.preview_span = None;
        self.save_feedback = None;

        if let Some(fetch_token) = self.selection.select(&node)
            && let Some(sha) = node.sha.clone()
        {
            self.content_rx = Some((
                fetch_token,
                spawn_content_fetch(
                    self.client.clone(),
                    self.locator.clone(),
                    sha,
                    node.id.clone(),
                    fetch_token,
                ),
            ));
        }
        self.panel_open = true;
    }

    fn clear_selection(&mut self) {
        self.selection.clear();
        self.dep_refs.clear();
        self.resolved_deps.clear();
        self.preview_span = None;
        self.save_feedback = None;
    }

    fn refresh_dependency_refs(&mut self) {
        self.dep_refs.clear();
        self.resolved_deps.clear();

        let Some(selected_id) = self.selection.selected_id().map(str::to_owned) else {
            return;
        };
        if let ContentPhase::Ready(content) = &self.selection.content
            && let Some(text) = content.text()
        {
            self.dep_refs = highlight::collect_relative_refs(text);
            self.resolved_deps = highlight::resolve_dependencies(&selected_id, &self.dep_refs);
        }
    }

    fn request_explanation(&mut self) {
        let Some((fetch_token, file_text)) = self.selection.begin_explanation() else {
            return;
        };

        // Selection mode narrows the prompt to the highlighted span; with
        // nothing highlighted it degrades to the whole file.
        let code = match (self.explain_mode, &self.preview_span) {
            (ExplainMode::Selection, Some(span)) => span.clone(),
            _ => file_text,
        };

        let request = ExplainRequest {
            code,
            mode: self.explain_mode,
            provider: self.provider,
            model: self.model_input.clone(),
            api_key: self.api_key.clone(),
        };
        self.explain_rx = Some((fetch_token, spawn_explain_fetch(request, fetch_token)));
    }

    fn request_history(&mut self) {
        let Some((fetch_token, path)) = self.selection.begin_history() else {
            return;
        };

        self.history_rx = Some((
            fetch_token,
            spawn_history_fetch(
                self.client.clone(),
                self.locator.clone(),
                path,
                self.branch.clone(),
                fetch_token,
            ),
        ));
    }
}
