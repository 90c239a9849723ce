use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Align, Context, Layout, Vec2, vec2};
use similarity_graph::data::{DataSource, PendingGraph, spawn_load};
use similarity_graph::render::DrawListBuffer;
use similarity_graph::{
    ForceSimulation, GraphModel, InitialLayout, LoopState, NodeId, SimulationConfig,
    SimulationError, SimulationLoop, SimulationOptions,
};
use tracing::{info, warn};

mod controls;
mod render_utils;
mod view;

pub struct ViewerSettings {
    pub source: DataSource,
    pub layout: InitialLayout,
    pub options: SimulationOptions,
    pub energy_threshold: Option<f32>,
    pub unpin_on_release: bool,
}

pub struct GraphViewerApp {
    settings: ViewerSettings,
    state: AppState,
    reload: Option<PendingGraph>,
}

enum AppState {
    Loading { pending: PendingGraph },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    sim_loop: SimulationLoop<DrawListBuffer>,
    physics: SimulationConfig,
    viewport_draft: Vec2,
    pan: Vec2,
    zoom: f32,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    dragging: Option<NodeId>,
    unpin_on_release: bool,
    last_error: Option<String>,
}

struct SearchMatchCache {
    query: String,
    matches: Arc<HashSet<usize>>,
}

impl GraphViewerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, settings: ViewerSettings) -> Self {
        let state = AppState::Loading {
            pending: spawn_load(settings.source.clone(), settings.layout),
        };
        Self {
            settings,
            state,
            reload: None,
        }
    }

    fn ready_state(graph: GraphModel, settings: &ViewerSettings) -> AppState {
        match ViewModel::new(graph, settings) {
            Ok(model) => AppState::Ready(Box::new(model)),
            Err(error) => AppState::Error(format!("invalid simulation options: {error}")),
        }
    }
}

impl eframe::App for GraphViewerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { pending } => {
                if let Some(result) = pending.poll() {
                    transition = Some(match result {
                        Ok(graph) => Self::ready_state(graph, &self.settings),
                        Err(error) => AppState::Error(error),
                    });
                } else {
                    ctx.request_repaint();
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading(format!("Loading graph from {}...", self.settings.source));
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(AppState::Loading {
                            pending: spawn_load(self.settings.source.clone(), self.settings.layout),
                        });
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload.is_some();
                model.show(ctx, &self.settings.source, &mut reload_requested, is_reloading);

                if reload_requested && self.reload.is_none() {
                    info!(source = %self.settings.source, "reloading graph");
                    self.reload = Some(spawn_load(self.settings.source.clone(), self.settings.layout));
                }

                if let Some(pending) = self.reload.take() {
                    match pending.poll() {
                        Some(result) => {
                            if let Some(graph) = model.finish_reload(result) {
                                transition = Some(Self::ready_state(graph, &self.settings));
                            }
                        }
                        None => {
                            self.reload = Some(pending);
                            ctx.request_repaint();
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload = None;
            self.state = next_state;
        }
    }
}

impl ViewModel {
    fn new(graph: GraphModel, settings: &ViewerSettings) -> Result<Self, SimulationError> {
        let mut simulation = ForceSimulation::new(graph);
        simulation.configure(settings.options)?;
        let physics = simulation.config();

        let mut sim_loop = SimulationLoop::new(simulation, DrawListBuffer::default());
        sim_loop.set_energy_threshold(settings.energy_threshold);
        sim_loop.refresh();
        sim_loop.start();

        Ok(Self {
            sim_loop,
            physics,
            viewport_draft: physics.viewport_size.unwrap_or(vec2(1200.0, 800.0)),
            pan: Vec2::ZERO,
            zoom: 1.0,
            search: String::new(),
            search_match_cache: None,
            dragging: None,
            unpin_on_release: settings.unpin_on_release,
            last_error: None,
        })
    }

    fn show(
        &mut self,
        ctx: &Context,
        source: &DataSource,
        reload_requested: &mut bool,
        is_reloading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let graph = self.sim_loop.simulation().graph();
                    ui.heading("similarity graph");
                    ui.separator();
                    ui.label(format!("source: {source}"));
                    ui.label(format!("nodes: {}", graph.node_count()));
                    ui.label(format!("edges: {}", graph.edge_count()));
                    ui.label(format!("pinned: {}", graph.pinned_count()));
                    let reload_button =
                        ui.add_enabled(!is_reloading, egui::Button::new("Reload data"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.status_text());
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if is_reloading {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Reloading graph...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            } else {
                self.draw_graph(ui);
            }
        });
    }

    fn status_text(&self) -> String {
        let simulation = self.sim_loop.simulation();
        let state = match self.sim_loop.state() {
            LoopState::Idle => "idle",
            LoopState::Running => "running",
            LoopState::Stopped => "stopped",
        };
        format!(
            "{state} | tick {} | energy {:.3}",
            simulation.tick(),
            simulation.kinetic_energy()
        )
    }

    // A failed reload keeps the current graph running and only reports the
    // error. A successful one stops the current loop and hands back the new
    // graph.
    fn finish_reload(&mut self, result: Result<GraphModel, String>) -> Option<GraphModel> {
        match result {
            Ok(graph) => {
                self.sim_loop.stop();
                Some(graph)
            }
            Err(error) => {
                warn!(%error, "reload failed; keeping the current graph");
                self.last_error = Some(format!("reload failed: {error}"));
                None
            }
        }
    }

    fn apply_physics(&mut self) {
        let options = SimulationOptions::from_config(self.physics);
        match self.sim_loop.simulation_mut().configure(options) {
            Ok(()) => {
                self.last_error = None;
                self.sim_loop.start();
            }
            Err(error) => {
                warn!(%error, "rejected layout options");
                self.last_error = Some(error.to_string());
                self.physics = self.sim_loop.simulation().config();
            }
        }
    }
}
