use tracing::{debug, info};

use crate::physics::{ForceSimulation, Frame};

pub trait RenderAdapter {
    fn render(&mut self, frame: &Frame<'_>);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

/// The loop never schedules itself: the host calls [`tick`](Self::tick) from
/// its frame or timer callback, so `stop` only makes the next call a no-op.
pub struct SimulationLoop<R> {
    simulation: ForceSimulation,
    renderer: R,
    state: LoopState,
    energy_threshold: Option<f32>,
}

impl<R: RenderAdapter> SimulationLoop<R> {
    pub fn new(simulation: ForceSimulation, renderer: R) -> Self {
        Self {
            simulation,
            renderer,
            state: LoopState::Idle,
            energy_threshold: None,
        }
    }

    /// Stops the loop after any tick whose total kinetic energy ends below
    /// `threshold`.
    pub fn with_energy_threshold(mut self, threshold: f32) -> Self {
        self.energy_threshold = Some(threshold);
        self
    }

    pub fn set_energy_threshold(&mut self, threshold: Option<f32>) {
        self.energy_threshold = threshold;
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn start(&mut self) {
        if self.state == LoopState::Running {
            return;
        }

        info!(
            nodes = self.simulation.graph().node_count(),
            edges = self.simulation.graph().edge_count(),
            from = ?self.state,
            "simulation loop started"
        );
        self.state = LoopState::Running;
    }

    pub fn stop(&mut self) {
        if self.state != LoopState::Running {
            return;
        }

        info!(tick = self.simulation.tick(), "simulation loop stopped");
        self.state = LoopState::Stopped;
    }

    pub fn tick(&mut self) -> bool {
        if self.state != LoopState::Running {
            return false;
        }

        let frame = self.simulation.step();
        self.renderer.render(&frame);

        if let Some(threshold) = self.energy_threshold
            && frame.kinetic_energy < threshold
        {
            debug!(
                tick = frame.tick,
                kinetic_energy = frame.kinetic_energy,
                threshold,
                "layout settled"
            );
            self.state = LoopState::Stopped;
        }
        true
    }

    pub fn run_for(&mut self, max_ticks: usize) -> usize {
        let mut ran = 0usize;
        while ran < max_ticks && self.tick() {
            ran += 1;
        }
        ran
    }

    // Re-renders without stepping, e.g. after a drag while stopped.
    pub fn refresh(&mut self) {
        let frame = self.simulation.frame();
        self.renderer.render(&frame);
    }

    pub fn simulation(&self) -> &ForceSimulation {
        &self.simulation
    }

    pub fn simulation_mut(&mut self) -> &mut ForceSimulation {
        &mut self.simulation
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn into_parts(self) -> (ForceSimulation, R) {
        (self.simulation, self.renderer)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::graph::{EdgeSpec, GraphModel, NodeSpec};

    #[derive(Default)]
    struct Recorder {
        ticks: Vec<u64>,
        node_counts: Vec<usize>,
    }

    impl RenderAdapter for Recorder {
        fn render(&mut self, frame: &Frame<'_>) {
            self.ticks.push(frame.tick);
            self.node_counts.push(frame.graph.node_count());
        }
    }

    fn simulation() -> ForceSimulation {
        let graph = GraphModel::build(
            ["a", "b", "c"].map(NodeSpec::new),
            [EdgeSpec::new(0, 1, 0.5), EdgeSpec::new(0, 2, 0.2)],
            HashMap::new(),
        )
        .unwrap();
        ForceSimulation::new(graph)
    }

    #[test]
    fn idle_loop_does_not_tick() {
        let mut sim_loop = SimulationLoop::new(simulation(), Recorder::default());

        assert_eq!(sim_loop.state(), LoopState::Idle);
        assert!(!sim_loop.tick());
        assert!(sim_loop.renderer().ticks.is_empty());
    }

    #[test]
    fn every_tick_renders_the_whole_graph() {
        let mut sim_loop = SimulationLoop::new(simulation(), Recorder::default());
        sim_loop.start();

        assert_eq!(sim_loop.run_for(5), 5);
        assert_eq!(sim_loop.renderer().ticks, vec![1, 2, 3, 4, 5]);
        assert!(sim_loop.renderer().node_counts.iter().all(|&count| count == 3));
    }

    #[test]
    fn start_is_idempotent_and_stop_halts() {
        let mut sim_loop = SimulationLoop::new(simulation(), Recorder::default());
        sim_loop.start();
        sim_loop.start();
        assert!(sim_loop.tick());

        sim_loop.stop();
        assert_eq!(sim_loop.state(), LoopState::Stopped);
        assert!(!sim_loop.tick());

        sim_loop.start();
        assert!(sim_loop.is_running());
        assert!(sim_loop.tick());
        assert_eq!(sim_loop.renderer().ticks, vec![1, 2]);
    }

    #[test]
    fn stop_before_start_keeps_idle() {
        let mut sim_loop = SimulationLoop::new(simulation(), Recorder::default());
        sim_loop.stop();

        assert_eq!(sim_loop.state(), LoopState::Idle);
    }

    #[test]
    fn energy_threshold_pauses_a_settled_layout() {
        let mut sim_loop =
            SimulationLoop::new(simulation(), Recorder::default()).with_energy_threshold(0.01);
        sim_loop.start();

        let ran = sim_loop.run_for(5_000);

        assert!(ran < 5_000);
        assert_eq!(sim_loop.state(), LoopState::Stopped);
        assert!(sim_loop.simulation().kinetic_energy() < 0.01);
    }

    #[test]
    fn refresh_renders_without_stepping() {
        let mut sim_loop = SimulationLoop::new(simulation(), Recorder::default());
        sim_loop.refresh();

        assert_eq!(sim_loop.renderer().ticks, vec![0]);
        assert_eq!(sim_loop.simulation().tick(), 0);
    }
}
