use eframe::egui::{self, Color32, DragValue, Slider, Ui, Vec2};
use similarity_graph::{LoopState, SimulationConfig};

use super::ViewModel;

impl ViewModel {
    pub(super) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Layout");
        ui.separator();
        ui.add_space(4.0);

        let mut changed = false;

        changed |= ui
            .add(Slider::new(&mut self.physics.charge_strength, -5000.0..=0.0).text("charge"))
            .on_hover_text("Strength of the pairwise inverse-square force. Negative repels.")
            .changed();
        changed |= ui
            .add(
                Slider::new(&mut self.physics.charge_cutoff_distance, 50.0..=3000.0)
                    .logarithmic(true)
                    .text("charge cutoff"),
            )
            .on_hover_text("Pairs farther apart than this ignore each other's charge.")
            .changed();
        changed |= ui
            .add(Slider::new(&mut self.physics.distance_scale, 10.0..=300.0).text("distance scale"))
            .on_hover_text("Edge length at similarity 1; length grows as 1 / similarity.")
            .changed();
        changed |= ui
            .add(Slider::new(&mut self.physics.damping, 0.5..=0.99).text("damping"))
            .on_hover_text("Fraction of velocity kept every tick.")
            .changed();
        changed |= ui
            .add(Slider::new(&mut self.physics.spring_strength, 0.005..=0.3).text("spring"))
            .changed();
        changed |= ui
            .add(Slider::new(&mut self.physics.gravity, 0.0..=0.1).text("gravity"))
            .on_hover_text("Pull towards the center of the layout.")
            .changed();

        let mut contain = self.physics.viewport_size.is_some();
        if ui.checkbox(&mut contain, "Contain in viewport").changed() {
            self.physics.viewport_size = contain.then_some(self.viewport_draft);
            changed = true;
        }
        if contain {
            ui.horizontal(|ui| {
                let width = ui.add(
                    DragValue::new(&mut self.viewport_draft.x)
                        .range(50.0..=20_000.0)
                        .prefix("w "),
                );
                let height = ui.add(
                    DragValue::new(&mut self.viewport_draft.y)
                        .range(50.0..=20_000.0)
                        .prefix("h "),
                );
                if width.changed() || height.changed() {
                    self.physics.viewport_size = Some(self.viewport_draft);
                    changed = true;
                }
            });
        }

        if changed {
            self.apply_physics();
        }

        if ui.button("Reset layout constants").clicked() {
            self.physics = SimulationConfig::default();
            self.apply_physics();
        }

        ui.add_space(8.0);
        ui.heading("Simulation");
        ui.separator();

        ui.horizontal(|ui| match self.sim_loop.state() {
            LoopState::Running => {
                if ui.button("Stop").clicked() {
                    self.sim_loop.stop();
                }
            }
            LoopState::Idle | LoopState::Stopped => {
                if ui.button("Start").clicked() {
                    self.sim_loop.start();
                }
            }
        });

        let pinned = self.sim_loop.simulation().graph().pinned_count();
        let release = ui.add_enabled(
            pinned > 0,
            egui::Button::new(format!("Release pinned ({pinned})")),
        );
        if release
            .on_hover_text("Dragged nodes stay pinned until released.")
            .clicked()
        {
            self.sim_loop.simulation_mut().release_all();
            self.sim_loop.start();
        }
        ui.checkbox(&mut self.unpin_on_release, "Unpin when a drag ends");

        if ui.button("Reset view").clicked() {
            self.pan = Vec2::ZERO;
            self.zoom = 1.0;
        }

        ui.add_space(8.0);
        ui.heading("Search");
        ui.separator();
        ui.text_edit_singleline(&mut self.search)
            .on_hover_text("Highlight nodes whose id or name fuzzily matches.");

        if let Some(error) = &self.last_error {
            ui.add_space(8.0);
            ui.colored_label(Color32::from_rgb(240, 110, 90), error.as_str());
        }
    }
}
