//! `forceplot` computes force-directed layouts of bipartite
//! graphs and renders them as SVG.

/// A module to read and partition bipartite graphs
/// from delimited input data.
pub mod bipartite;
pub use bipartite::BipartiteGraph;

/// Seeded spring (force-directed) layouts.
pub mod layout;
pub use layout::{spring_layout, LayoutOptions};

/// SVG rendering of a laid-out bipartite graph: nodes,
/// edges, labels, legends, and themes.
pub mod draw;
pub use draw::{
    draw_graph, draw_graph_filtered, DrawError, DrawOptions, Legend, LegendLoc, Stratum, Theme,
};

/// The margins for all the graph plots
/// used in this crate.
const MARGIN_LR: f64 = 20.0;
