//! Projects dataset records onto a hub-and-spoke graph.
//!
//! Every dataset becomes a node. Its robot, environment and format become
//! attribute nodes keyed by value, so datasets sharing an attribute share the
//! node and the graph shows co-occurrence without any aggregation pass.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{DatasetRecord, stat};
use crate::images::ImageMap;

pub const DATASET_COLOR: &str = "#00C49F";
pub const ROBOT_COLOR: &str = "#FFBB28";
pub const ENVIRONMENT_COLOR: &str = "#FF8042";
pub const FORMAT_COLOR: &str = "#8884d8";
pub const IMAGE_BACKGROUND: &str = "#ffffff";
pub const HIGHLIGHT_COLOR: &str = "#F7A7A6";

const DATASET_SIZE: u32 = 35;
const ROBOT_IMAGE_SIZE: u32 = 42;
const ATTRIBUTE_SIZE: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Dataset,
    Robot,
    Environment,
    Format,
}

impl NodeKind {
    pub fn id_prefix(self) -> Option<&'static str> {
        match self {
            NodeKind::Dataset => None,
            NodeKind::Robot => Some("robot_"),
            NodeKind::Environment => Some("env_"),
            NodeKind::Format => Some("fmt_"),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NodeKind::Dataset => "Dataset",
            NodeKind::Robot => "Robot",
            NodeKind::Environment => "Environment",
            NodeKind::Format => "Format",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            NodeKind::Dataset => DATASET_COLOR,
            NodeKind::Robot => ROBOT_COLOR,
            NodeKind::Environment => ENVIRONMENT_COLOR,
            NodeKind::Format => FORMAT_COLOR,
        }
    }

    /// Node id for an attribute value, e.g. `robot_UR5`.
    pub fn attribute_id(self, value: &str) -> String {
        format!("{}{value}", self.id_prefix().unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum NodeVisual {
    Dot {
        color: String,
    },
    CircularImage {
        image: String,
        border: String,
        background: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    pub title: String,
    pub size: u32,
    #[serde(flatten)]
    pub visual: NodeVisual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub kind: NodeKind,
    pub color: String,
    pub title: String,
    pub arrows: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn nodes_of(&self, kind: NodeKind) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(move |node| node.kind == kind)
    }

    /// Edges touching `id`, in emission order.
    pub fn edges_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a GraphEdge> {
        self.edges
            .iter()
            .filter(move |edge| edge.source == id || edge.target == id)
    }
}

/// Renderer settings carried alongside the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderConfig {
    pub width: String,
    pub height: u32,
    pub directed: bool,
    pub physics: bool,
    pub hierarchy: bool,
    pub node_highlight_behavior: bool,
    pub highlight_color: String,
    pub collapsible: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: "100%".to_string(),
            height: 600,
            directed: true,
            physics: true,
            hierarchy: false,
            node_highlight_behavior: true,
            highlight_color: HIGHLIGHT_COLOR.to_string(),
            collapsible: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: String,
}

pub fn legend() -> Vec<LegendEntry> {
    [
        ("Dataset", DATASET_COLOR),
        ("Robot attribute", ROBOT_COLOR),
        ("Environment attribute", ENVIRONMENT_COLOR),
        ("Format attribute", FORMAT_COLOR),
    ]
    .into_iter()
    .map(|(label, color)| LegendEntry {
        label: label.to_string(),
        color: color.to_string(),
    })
    .collect()
}

/// Everything a graph renderer needs, serialized as one JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct GraphDocument {
    pub generated_at: DateTime<Utc>,
    pub config: RenderConfig,
    pub legend: Vec<LegendEntry>,
    #[serde(flatten)]
    pub graph: Graph,
}

impl GraphDocument {
    pub fn new(graph: Graph) -> Self {
        Self {
            generated_at: Utc::now(),
            config: RenderConfig::default(),
            legend: legend(),
            graph,
        }
    }
}

/// Accumulates nodes and edges for one projection run.
struct GraphBuilder {
    graph: Graph,
    emitted: HashSet<String>,
}

impl GraphBuilder {
    fn new() -> Self {
        Self {
            graph: Graph::default(),
            emitted: HashSet::new(),
        }
    }

    fn add_node(&mut self, node: GraphNode) {
        if self.emitted.insert(node.id.clone()) {
            self.graph.nodes.push(node);
        }
    }

    fn add_edge(&mut self, source: &str, target: &str, kind: NodeKind, title: String) {
        debug_assert!(self.emitted.contains(source) && self.emitted.contains(target));
        self.graph.edges.push(GraphEdge {
            source: source.to_string(),
            target: target.to_string(),
            kind,
            color: kind.color().to_string(),
            title,
            arrows: "to".to_string(),
        });
    }

    fn add_attribute(&mut self, dataset_id: &str, kind: NodeKind, value: &str) {
        let id = kind.attribute_id(value);
        let title = format!("{}: {value}", kind.label());
        self.add_node(GraphNode {
            id: id.clone(),
            kind,
            label: String::new(),
            title: title.clone(),
            size: ATTRIBUTE_SIZE,
            visual: NodeVisual::Dot {
                color: kind.color().to_string(),
            },
        });
        self.add_edge(dataset_id, &id, kind, title);
    }
}

/// Builds the graph for `records` in order. Node ids are emitted once per run.
pub fn project<'a, I>(records: I, images: &ImageMap) -> Graph
where
    I: IntoIterator<Item = &'a DatasetRecord>,
{
    let mut builder = GraphBuilder::new();

    for record in records {
        let robot = record.robot();

        builder.add_node(GraphNode {
            id: record.id.clone(),
            kind: NodeKind::Dataset,
            label: record.name.clone(),
            title: dataset_title(record),
            size: DATASET_SIZE,
            visual: NodeVisual::Dot {
                color: DATASET_COLOR.to_string(),
            },
        });

        let robot_id = NodeKind::Robot.attribute_id(robot);
        let robot_title = format!("Robot: {robot}");
        let robot_node = match images.get(robot) {
            Some(image) => GraphNode {
                id: robot_id.clone(),
                kind: NodeKind::Robot,
                label: String::new(),
                title: robot_title.clone(),
                size: ROBOT_IMAGE_SIZE,
                visual: NodeVisual::CircularImage {
                    image: image.data_uri.clone(),
                    border: ROBOT_COLOR.to_string(),
                    background: IMAGE_BACKGROUND.to_string(),
                },
            },
            None => GraphNode {
                id: robot_id.clone(),
                kind: NodeKind::Robot,
                label: robot.to_string(),
                title: robot_title.clone(),
                size: ATTRIBUTE_SIZE,
                visual: NodeVisual::Dot {
                    color: ROBOT_COLOR.to_string(),
                },
            },
        };
        builder.add_node(robot_node);
        builder.add_edge(&robot_id, &record.id, NodeKind::Robot, robot_title);

        builder.add_attribute(&record.id, NodeKind::Environment, record.environment());
        builder.add_attribute(&record.id, NodeKind::Format, record.format());
    }

    builder.graph
}

fn dataset_title(record: &DatasetRecord) -> String {
    let mut lines = vec![
        record.name.clone(),
        format!("Robot: {}", record.robot()),
        format!("Environment: {}", record.environment()),
        format!("Format: {}", record.format()),
    ];
    if let Some(episodes) = record.stat(stat::EPISODES) {
        lines.push(format!("Episodes: {episodes}"));
    }
    if let Some(version) = record.version.as_deref() {
        lines.push(format!("Version: {version}"));
    }
    lines.join("\n")
}

/// Looks up a clicked node among the unfiltered records. Attribute nodes never
/// match.
pub fn find_record<'a>(records: &'a [DatasetRecord], node_id: &str) -> Option<&'a DatasetRecord> {
    records.iter().find(|record| record.id == node_id)
}
