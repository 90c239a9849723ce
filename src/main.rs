mod app;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use eframe::egui::{Vec2, vec2};
use similarity_graph::data::{DataSource, load_graph};
use similarity_graph::render::LayoutSnapshot;
use similarity_graph::{
    ForceSimulation, Frame, InitialLayout, RenderAdapter, SimulationLoop, SimulationOptions,
};
use tracing::{info, trace};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Graph payload with `nns`, `lls` and `id_names`; `-` reads stdin.
    #[arg(default_value = "graph.json")]
    data: PathBuf,

    #[arg(long, default_value_t = -1000.0, allow_hyphen_values = true)]
    charge_strength: f32,

    #[arg(long, default_value_t = 600.0)]
    charge_cutoff: f32,

    #[arg(long, default_value_t = 75.0)]
    distance_scale: f32,

    #[arg(long, default_value_t = 0.9)]
    damping: f32,

    #[arg(long, default_value_t = 0.01)]
    gravity: f32,

    /// Keep nodes inside a WIDTHxHEIGHT box centered on the origin.
    #[arg(long, value_parser = parse_viewport)]
    viewport: Option<Vec2>,

    /// Pause the loop once total kinetic energy drops below this.
    #[arg(long)]
    energy_threshold: Option<f32>,

    /// Unpin dragged nodes when the drag ends.
    #[arg(long)]
    unpin_on_release: bool,

    /// Run without a window and print final positions as JSON.
    #[arg(long)]
    headless: bool,

    #[arg(long, default_value_t = 300)]
    ticks: usize,
}

impl Args {
    fn simulation_options(&self) -> SimulationOptions {
        SimulationOptions {
            charge_strength: Some(self.charge_strength),
            charge_cutoff_distance: Some(self.charge_cutoff),
            distance_scale: Some(self.distance_scale),
            damping: Some(self.damping),
            viewport_size: Some(self.viewport),
            gravity: Some(self.gravity),
            ..SimulationOptions::default()
        }
    }

    fn initial_layout(&self) -> InitialLayout {
        InitialLayout::Scatter {
            spread: self.distance_scale,
        }
    }
}

fn parse_viewport(value: &str) -> Result<Vec2, String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{value}`"))?;
    let width = width
        .trim()
        .parse::<f32>()
        .map_err(|error| format!("bad width `{width}`: {error}"))?;
    let height = height
        .trim()
        .parse::<f32>()
        .map_err(|error| format!("bad height `{height}`: {error}"))?;
    Ok(vec2(width, height))
}

struct TraceRenderer;

impl RenderAdapter for TraceRenderer {
    fn render(&mut self, frame: &Frame<'_>) {
        trace!(
            tick = frame.tick,
            kinetic_energy = frame.kinetic_energy,
            "headless frame"
        );
    }
}

fn run_headless(args: &Args) -> Result<()> {
    let source = DataSource::from_path(&args.data);
    let graph = load_graph(&source, args.initial_layout())?;

    let mut simulation = ForceSimulation::new(graph);
    simulation
        .configure(args.simulation_options())
        .context("invalid simulation options")?;

    let mut sim_loop = SimulationLoop::new(simulation, TraceRenderer);
    sim_loop.set_energy_threshold(args.energy_threshold);
    sim_loop.start();
    let ran = sim_loop.run_for(args.ticks);
    sim_loop.stop();

    let snapshot = LayoutSnapshot::from_frame(&sim_loop.simulation().frame());
    info!(
        ticks = ran,
        kinetic_energy = snapshot.kinetic_energy,
        "headless layout finished"
    );
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("similarity_graph=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if args.headless {
        return run_headless(&args);
    }

    let settings = app::ViewerSettings {
        source: DataSource::from_path(&args.data),
        layout: args.initial_layout(),
        options: args.simulation_options(),
        energy_threshold: args.energy_threshold,
        unpin_on_release: args.unpin_on_release,
    };
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1280.0, 860.0]),
        ..Default::default()
    };

    eframe::run_native(
        "similarity graph",
        options,
        Box::new(move |cc| Ok(Box::new(app::GraphViewerApp::new(cc, settings)))),
    )
    .map_err(|error| anyhow!("viewer failed: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_flag_parses_width_and_height() {
        assert_eq!(parse_viewport("1200x800"), Ok(vec2(1200.0, 800.0)));
        assert_eq!(parse_viewport("640X480"), Ok(vec2(640.0, 480.0)));
        assert!(parse_viewport("1200").is_err());
        assert!(parse_viewport("wide x 3").is_err());
    }

    #[test]
    fn flags_map_onto_simulation_options() {
        let args = Args::parse_from([
            "similarity-graph",
            "data.json",
            "--charge-strength",
            "-300",
            "--viewport",
            "800x600",
        ]);
        let options = args.simulation_options();

        assert_eq!(options.charge_strength, Some(-300.0));
        assert_eq!(options.distance_scale, Some(75.0));
        assert_eq!(options.viewport_size, Some(Some(vec2(800.0, 600.0))));
        assert!(!args.headless);
    }
}
