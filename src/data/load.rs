use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use anyhow::{Context, Result};
use tracing::info;

use crate::graph::{GraphModel, InitialLayout};

use super::parse::parse_payload;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Stdin,
}

impl DataSource {
    /// `-` means standard input, anything else is a file path.
    pub fn from_path(path: &Path) -> Self {
        if path.as_os_str() == "-" {
            Self::Stdin
        } else {
            Self::File(path.to_path_buf())
        }
    }

    fn read(&self) -> Result<String> {
        match self {
            Self::File(path) => fs::read_to_string(path)
                .with_context(|| format!("failed to read graph data from {}", path.display())),
            Self::Stdin => {
                let mut raw = String::new();
                io::stdin()
                    .read_to_string(&mut raw)
                    .context("failed to read graph data from stdin")?;
                Ok(raw)
            }
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Stdin => f.write_str("<stdin>"),
        }
    }
}

pub fn load_graph(source: &DataSource, layout: InitialLayout) -> Result<GraphModel> {
    let raw = source.read()?;
    let payload =
        parse_payload(&raw).with_context(|| format!("failed to parse graph data from {source}"))?;
    let graph = payload
        .into_model(layout)
        .with_context(|| format!("graph data from {source} is inconsistent"))?;

    info!(
        %source,
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph loaded"
    );
    Ok(graph)
}

/// A graph being loaded on a worker thread. Polling it is the ready signal:
/// nothing can build a simulation before it yields a model.
pub struct PendingGraph {
    rx: Receiver<Result<GraphModel, String>>,
}

impl PendingGraph {
    /// `Some` once the load has finished, successfully or not.
    pub fn poll(&self) -> Option<Result<GraphModel, String>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                Some(Err("background load worker disconnected".to_owned()))
            }
        }
    }

    pub fn wait(self) -> Result<GraphModel, String> {
        self.rx
            .recv()
            .unwrap_or_else(|_| Err("background load worker disconnected".to_owned()))
    }
}

pub fn spawn_load(source: DataSource, layout: InitialLayout) -> PendingGraph {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let result = load_graph(&source, layout).map_err(|error| format!("{error:#}"));
        let _ = tx.send(result);
    });

    PendingGraph { rx }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_payload(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn dash_means_stdin() {
        assert_eq!(DataSource::from_path(Path::new("-")), DataSource::Stdin);
        assert_eq!(
            DataSource::from_path(Path::new("graph.json")),
            DataSource::File(PathBuf::from("graph.json"))
        );
    }

    #[test]
    fn loads_a_graph_file() {
        let file = write_payload(
            r#"{"nns": [{"id": "a"}, {"id": "b"}],
                "lls": [{"similarity": "0.5", "source": 0, "target": 1}],
                "id_names": {"b": "Beta"}}"#,
        );

        let graph = load_graph(
            &DataSource::File(file.path().to_path_buf()),
            InitialLayout::Origin,
        )
        .unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.lookup_name("b"), "Beta");
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let error = load_graph(
            &DataSource::File(PathBuf::from("/definitely/not/here.json")),
            InitialLayout::Origin,
        )
        .unwrap_err();

        assert!(format!("{error:#}").contains("failed to read graph data"));
    }

    #[test]
    fn inconsistent_graph_is_a_load_error() {
        let file = write_payload(
            r#"{"nns": [{"id": "a"}], "lls": [{"similarity": 1, "source": 0, "target": 5}]}"#,
        );

        let error = load_graph(
            &DataSource::File(file.path().to_path_buf()),
            InitialLayout::Origin,
        )
        .unwrap_err();

        let message = format!("{error:#}");
        assert!(message.contains("inconsistent"));
        assert!(message.contains("index 5"));
    }

    #[test]
    fn background_load_signals_readiness() {
        let file = write_payload(r#"{"nns": [{"id": "a"}], "lls": []}"#);

        let pending = spawn_load(
            DataSource::File(file.path().to_path_buf()),
            InitialLayout::Origin,
        );
        let graph = pending.wait().unwrap();

        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn background_load_reports_failures() {
        let pending = spawn_load(
            DataSource::File(PathBuf::from("/definitely/not/here.json")),
            InitialLayout::Origin,
        );

        let error = pending.wait().unwrap_err();
        assert!(error.contains("failed to read graph data"));
    }
}
