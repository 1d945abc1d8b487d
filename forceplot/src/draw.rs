//! Render a laid-out bipartite graph as SVG.
//!
//! Nodes are drawn as circles with size-proportional radii, edges
//! as weight-proportional lines (optionally curved), with optional
//! labels, a legend, and a dark/light theme. The SVG document is
//! returned as a `String`; printing it is left to the caller.

use itertools::izip;
use petgraph::graph::NodeIndex;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use crate::{BipartiteGraph, MARGIN_LR};

/// Default label colours for the two strata.
pub const DEFAULT_FONT_COLORS: [&str; 2] = ["#CEECFF", "#FFD0FD"];

/// Default node fill colours for the two strata when no
/// per-node colour map is given.
const DEFAULT_NODE_COLORS: [&str; 2] = ["#1F77B4", "#FF7F0E"];

/// Fill for nodes missing from a supplied colour map.
const FALLBACK_NODE_COLOR: &str = "grey";

/// Curvature of curved edges, as a fraction of the chord length.
const CURVE_RAD: f64 = 0.1;

/// Errors produced while assembling a plot.
#[derive(Error, Debug)]
pub enum DrawError {
    #[error("No size entry for node \"{0}\".")]
    MissingSize(String),
    #[error("No layout position for node \"{0}\".")]
    MissingPosition(String),
}

/// Dark or light rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    /// Default edge stroke colour.
    pub fn edge_color(&self) -> &'static str {
        match self {
            Theme::Dark => "#A47FFF",
            Theme::Light => "black",
        }
    }

    /// Background colour of the plot.
    pub fn face_color(&self) -> &'static str {
        match self {
            Theme::Dark => "#13042B",
            Theme::Light => "white",
        }
    }

    /// Legend text colour.
    fn legend_color(&self) -> &'static str {
        match self {
            Theme::Dark => "white",
            Theme::Light => "black",
        }
    }
}

/// Where the legend sits. `Best` is the upper right corner;
/// SVG gives us no layout-aware placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LegendLoc {
    #[default]
    Best,
    UpperLeft,
    UpperRight,
    LowerLeft,
    LowerRight,
}

impl std::str::FromStr for LegendLoc {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "best" => Ok(LegendLoc::Best),
            "upper-left" => Ok(LegendLoc::UpperLeft),
            "upper-right" => Ok(LegendLoc::UpperRight),
            "lower-left" => Ok(LegendLoc::LowerLeft),
            "lower-right" => Ok(LegendLoc::LowerRight),
            other => Err(format!("unknown legend location: {}", other)),
        }
    }
}

/// A name -> colour legend drawn in a corner of the plot.
#[derive(Debug, Clone)]
pub struct Legend {
    /// Legend entries; a BTreeMap so rows render in a stable order.
    pub entries: BTreeMap<String, String>,
    /// Radius of the legend markers.
    pub marker_size: f64,
    pub loc: LegendLoc,
}

impl Legend {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self {
            entries,
            marker_size: 5.0,
            loc: LegendLoc::Best,
        }
    }
}

/// One of the two draw groups: which nodes to draw, how big
/// each is, what to write on them, and in what colour.
#[derive(Debug, Clone, Default)]
pub struct Stratum {
    /// The draw list.
    pub nodes: Vec<NodeIndex>,
    /// Node name -> size. Sizes are areas, as in scatter plots;
    /// the circle radius is the square root.
    pub sizes: HashMap<String, f64>,
    /// Node name -> label text. Nodes without an entry get none.
    pub labels: HashMap<String, String>,
    /// Label colour for this stratum.
    pub font_color: String,
}

/// All the cosmetic knobs for a plot.
#[derive(Debug, Clone)]
pub struct DrawOptions {
    pub width: i32,
    pub height: i32,
    pub theme: Theme,
    /// Draw node labels at all?
    pub add_labels: bool,
    pub font_size: f64,
    /// e.g. "italic". Applied to all labels.
    pub font_style: Option<String>,
    pub node_alpha: f64,
    pub edge_alpha: f64,
    /// Node sizes are divided by this before drawing.
    pub node_size_reduction_factor: f64,
    /// Edge weights are divided by this to give stroke widths.
    pub edge_linewidth_reduction_factor: f64,
    /// Bowed edges instead of straight lines.
    pub curved_edges: bool,
    /// Node name -> fill colour. Nodes absent from the map are grey.
    /// When `None`, each stratum gets a default palette colour.
    pub node_colors: Option<HashMap<String, String>>,
    pub legend: Option<Legend>,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            width: 700,
            height: 700,
            theme: Theme::Dark,
            add_labels: false,
            font_size: 10.0,
            font_style: None,
            node_alpha: 0.6,
            edge_alpha: 0.15,
            node_size_reduction_factor: 1.0,
            edge_linewidth_reduction_factor: 1.0,
            curved_edges: true,
            node_colors: None,
            legend: None,
        }
    }
}

/// Map a layout position in [-1, 1] x [-1, 1] onto the pixel
/// canvas, flipping y so positive layout y points up.
fn to_pixels(pos: (f64, f64), width: i32, height: i32) -> (f64, f64) {
    let span_x = width as f64 - 2.0 * MARGIN_LR;
    let span_y = height as f64 - 2.0 * MARGIN_LR;

    let x = MARGIN_LR + (pos.0 + 1.0) / 2.0 * span_x;
    let y = MARGIN_LR + (1.0 - (pos.1 + 1.0) / 2.0) * span_y;
    (x, y)
}

/// Render the full SVG document for a laid-out graph.
///
/// Edges are drawn first so nodes sit on top of them, and only
/// between node pairs that span the two strata. Node sizes and
/// edge widths come straight from the supplied maps, divided by
/// the respective reduction factors.
pub fn draw_graph(
    graph: &BipartiteGraph,
    pos: &HashMap<NodeIndex, (f64, f64)>,
    strata: &[Stratum; 2],
    opts: &DrawOptions,
) -> Result<String, DrawError> {
    let inner = &graph.0;

    let pixel_of = |node: NodeIndex| -> Result<(f64, f64), DrawError> {
        let p = pos
            .get(&node)
            .ok_or_else(|| DrawError::MissingPosition(inner[node].clone()))?;
        Ok(to_pixels(*p, opts.width, opts.height))
    };

    // edges between the strata, under the nodes.
    let mut edge_links = String::new();
    for &n1 in &strata[0].nodes {
        for &n2 in &strata[1].nodes {
            // edge direction in the input does not matter for drawing.
            let edge = inner.find_edge(n1, n2).or_else(|| inner.find_edge(n2, n1));
            let weight = match edge.and_then(|e| inner.edge_weight(e)) {
                Some(w) => *w,
                None => continue,
            };

            let linewidth = weight / opts.edge_linewidth_reduction_factor;

            let name1 = &inner[n1];
            let name2 = &inner[n2];

            // an edge takes the colour of a coloured endpoint,
            // left before right.
            let color = match &opts.node_colors {
                Some(colors) => colors
                    .get(name1)
                    .or_else(|| colors.get(name2))
                    .map(|c| c.as_str())
                    .unwrap_or_else(|| opts.theme.edge_color()),
                None => opts.theme.edge_color(),
            };

            let (x1, y1) = pixel_of(n1)?;
            let (x2, y2) = pixel_of(n2)?;
            let title = format!("{} - {}: {}", name1, name2, weight);

            if opts.curved_edges {
                // quadratic Bezier: a control point offset by
                // 2 * rad * chord gives an apex deviation of rad * chord.
                let dx = x2 - x1;
                let dy = y2 - y1;
                let chord = (dx * dx + dy * dy).sqrt();
                let (mx, my) = ((x1 + x2) / 2.0, (y1 + y2) / 2.0);
                let (cx, cy) = if chord > 0.0 {
                    let off = 2.0 * CURVE_RAD;
                    (mx - dy * off, my + dx * off)
                } else {
                    (mx, my)
                };

                edge_links += &format!(
                    "<path d=\"M {x1} {y1} Q {cx} {cy} {x2} {y2}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"{linewidth}\" stroke-opacity=\"{}\"><title>{title}</title></path>\n",
                    opts.edge_alpha
                );
            } else {
                edge_links += &format!(
                    "<line x1=\"{x1}\" y1=\"{y1}\" x2=\"{x2}\" y2=\"{y2}\" stroke=\"{color}\" stroke-width=\"{linewidth}\" stroke-opacity=\"{}\"><title>{title}</title></line>\n",
                    opts.edge_alpha
                );
            }
        }
    }

    // now the node circles, one pass per stratum.
    let mut node_circles = String::new();
    let mut node_labels = String::new();

    for (idx, stratum) in strata.iter().enumerate() {
        for &node in &stratum.nodes {
            let name = &inner[node];
            let size = stratum
                .sizes
                .get(name)
                .ok_or_else(|| DrawError::MissingSize(name.clone()))?;

            // sizes are areas; radius is the square root.
            let r = (size / opts.node_size_reduction_factor).max(0.0).sqrt();

            let fill = match &opts.node_colors {
                Some(colors) => colors
                    .get(name)
                    .map(|c| c.as_str())
                    .unwrap_or(FALLBACK_NODE_COLOR),
                None => DEFAULT_NODE_COLORS[idx],
            };

            let (x, y) = pixel_of(node)?;

            // no marker outline, like the original plots.
            node_circles += &format!(
                "<circle cx=\"{x}\" cy=\"{y}\" r=\"{r}\" fill=\"{fill}\" fill-opacity=\"{}\" stroke=\"none\"><title>{name}</title></circle>\n",
                opts.node_alpha
            );

            if opts.add_labels {
                if let Some(label) = stratum.labels.get(name) {
                    if label.is_empty() {
                        continue;
                    }
                    let style = match &opts.font_style {
                        Some(s) => format!(" font-style=\"{}\"", s),
                        None => String::new(),
                    };
                    node_labels += &format!(
                        "<text x=\"{x}\" y=\"{y}\" text-anchor=\"middle\" dominant-baseline=\"central\" font-size=\"{}\" fill=\"{}\"{style}>{label}</text>\n",
                        opts.font_size, stratum.font_color
                    );
                }
            }
        }
    }

    let legend = match &opts.legend {
        Some(legend) => make_legend(legend, opts),
        None => String::new(),
    };

    let face_color = opts.theme.face_color();
    let (width, height) = (opts.width, opts.height);

    let svg = format!(
        r#"<svg version="1.1"
    width="{width}" height="{height}"
    xmlns="http://www.w3.org/2000/svg">
    <rect width="{width}" height="{height}" fill="{face_color}"/>
    <g>
    {edge_links}
    </g>
    <g>
    {node_circles}
    </g>
    <g>
    {node_labels}
    </g>
    {legend}
</svg>
        "#
    );

    Ok(svg)
}

/// Build the legend fragment: one marker-plus-text row per entry,
/// anchored at the requested corner.
fn make_legend(legend: &Legend, opts: &DrawOptions) -> String {
    let marker = legend.marker_size;
    let row_height = marker * 2.0 + 6.0;
    let inset = MARGIN_LR + marker;

    let n_rows = legend.entries.len() as f64;
    let (anchor_right, from_bottom) = match legend.loc {
        LegendLoc::Best | LegendLoc::UpperRight => (true, false),
        LegendLoc::UpperLeft => (false, false),
        LegendLoc::LowerRight => (true, true),
        LegendLoc::LowerLeft => (false, true),
    };

    let x = if anchor_right {
        opts.width as f64 - inset
    } else {
        inset
    };
    let mut y = if from_bottom {
        opts.height as f64 - inset - (n_rows - 1.0) * row_height
    } else {
        inset
    };

    let text_color = opts.theme.legend_color();
    let mut rows = String::new();

    for (name, color) in &legend.entries {
        let (text_x, text_anchor) = if anchor_right {
            (x - marker - 4.0, "end")
        } else {
            (x + marker + 4.0, "start")
        };

        rows += &format!(
            "<circle cx=\"{x}\" cy=\"{y}\" r=\"{marker}\" fill=\"{color}\"/>\n<text x=\"{text_x}\" y=\"{y}\" text-anchor=\"{text_anchor}\" dominant-baseline=\"central\" font-size=\"{}\" fill=\"{text_color}\">{name}</text>\n",
            opts.font_size
        );
        y += row_height;
    }

    format!("<g>\n{rows}</g>")
}

/// Filter both strata by a minimum node size, then draw.
///
/// Nodes whose size falls below the per-stratum threshold are
/// dropped from the draw list entirely. When no explicit label
/// maps are given, each surviving node is labelled with its own
/// name iff its size reaches the per-stratum label threshold.
#[allow(clippy::too_many_arguments)]
pub fn draw_graph_filtered(
    graph: &BipartiteGraph,
    pos: &HashMap<NodeIndex, (f64, f64)>,
    nodes: [Vec<NodeIndex>; 2],
    sizes: [HashMap<String, f64>; 2],
    min_sizes: [f64; 2],
    min_size_labels: [f64; 2],
    labels: Option<[HashMap<String, String>; 2]>,
    opts: &DrawOptions,
) -> Result<String, DrawError> {
    let inner = &graph.0;
    let mut strata: [Stratum; 2] = Default::default();

    let supplied_labels = labels.map(|[a, b]| [Some(a), Some(b)]);
    let label_maps = supplied_labels.unwrap_or([None, None]);

    for (stratum, stratum_nodes, stratum_sizes, min_size, min_size_label, label_map, font_color) in izip!(
        strata.iter_mut(),
        nodes,
        sizes,
        min_sizes,
        min_size_labels,
        label_maps,
        DEFAULT_FONT_COLORS
    ) {
        let mut draw_list = Vec::new();
        for node in stratum_nodes {
            let name = &inner[node];
            let size = stratum_sizes
                .get(name)
                .ok_or_else(|| DrawError::MissingSize(name.clone()))?;
            if *size >= min_size {
                draw_list.push(node);
            }
        }

        let labels = match label_map {
            Some(map) => map,
            None => draw_list
                .iter()
                .map(|&n| &inner[n])
                .filter(|name| stratum_sizes[*name] >= min_size_label)
                .map(|name| (name.clone(), name.clone()))
                .collect(),
        };

        stratum.nodes = draw_list;
        stratum.sizes = stratum_sizes;
        stratum.labels = labels;
        stratum.font_color = font_color.to_string();
    }

    draw_graph(graph, pos, &strata, opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bipartite::{Label, Weight};
    use petgraph::Graph;

    /// Helper function: two left nodes, two right nodes,
    /// three weighted edges, and hand-placed positions.
    fn make_fixture() -> (
        BipartiteGraph,
        HashMap<NodeIndex, (f64, f64)>,
        [Vec<NodeIndex>; 2],
        [HashMap<String, f64>; 2],
    ) {
        let mut graph = Graph::<Label, Weight>::new();
        let a = graph.add_node("a".into());
        let b = graph.add_node("b".into());
        let x = graph.add_node("x".into());
        let y = graph.add_node("y".into());

        graph.add_edge(a, x, 2.0);
        graph.add_edge(a, y, 1.0);
        graph.add_edge(b, y, 3.0);

        let mut pos = HashMap::new();
        pos.insert(a, (-0.5, 0.5));
        pos.insert(b, (-0.5, -0.5));
        pos.insert(x, (0.5, 0.5));
        pos.insert(y, (0.5, -0.5));

        let left_sizes: HashMap<String, f64> =
            [("a".to_string(), 100.0), ("b".to_string(), 4.0)].into();
        let right_sizes: HashMap<String, f64> =
            [("x".to_string(), 25.0), ("y".to_string(), 64.0)].into();

        (
            BipartiteGraph(graph),
            pos,
            [vec![a, b], vec![x, y]],
            [left_sizes, right_sizes],
        )
    }

    fn full_strata(
        nodes: [Vec<NodeIndex>; 2],
        sizes: [HashMap<String, f64>; 2],
    ) -> [Stratum; 2] {
        let [left_nodes, right_nodes] = nodes;
        let [left_sizes, right_sizes] = sizes;
        [
            Stratum {
                nodes: left_nodes,
                sizes: left_sizes,
                labels: HashMap::new(),
                font_color: DEFAULT_FONT_COLORS[0].to_string(),
            },
            Stratum {
                nodes: right_nodes,
                sizes: right_sizes,
                labels: HashMap::new(),
                font_color: DEFAULT_FONT_COLORS[1].to_string(),
            },
        ]
    }

    #[test]
    fn test_draw_contains_all_nodes() {
        let (graph, pos, nodes, sizes) = make_fixture();
        let strata = full_strata(nodes, sizes);

        let svg = draw_graph(&graph, &pos, &strata, &DrawOptions::default()).unwrap();

        for name in ["a", "b", "x", "y"] {
            assert!(
                svg.contains(&format!("<title>{}</title>", name)),
                "node {} missing from the SVG",
                name
            );
        }
    }

    #[test]
    fn test_curved_and_straight_edges() {
        let (graph, pos, nodes, sizes) = make_fixture();
        let strata = full_strata(nodes, sizes);

        let curved = draw_graph(&graph, &pos, &strata, &DrawOptions::default()).unwrap();
        assert!(curved.contains("<path d=\"M "), "curved edges use paths");

        let opts = DrawOptions {
            curved_edges: false,
            ..Default::default()
        };
        let straight = draw_graph(&graph, &pos, &strata, &opts).unwrap();
        assert!(straight.contains("<line "), "straight edges use lines");
        assert!(!straight.contains("<path "));
    }

    #[test]
    fn test_edge_width_is_weight_proportional() {
        let (graph, pos, nodes, sizes) = make_fixture();
        let strata = full_strata(nodes, sizes);

        let opts = DrawOptions {
            edge_linewidth_reduction_factor: 2.0,
            ..Default::default()
        };
        let svg = draw_graph(&graph, &pos, &strata, &opts).unwrap();

        // b -> y has weight 3.0, so width 1.5 under a factor of 2.
        assert!(svg.contains("stroke-width=\"1.5\""));
    }

    #[test]
    fn test_theme_face_colors() {
        let (graph, pos, nodes, sizes) = make_fixture();
        let strata = full_strata(nodes, sizes);

        let dark = draw_graph(&graph, &pos, &strata, &DrawOptions::default()).unwrap();
        assert!(dark.contains("fill=\"#13042B\""));
        assert!(dark.contains("stroke=\"#A47FFF\""));

        let opts = DrawOptions {
            theme: Theme::Light,
            ..Default::default()
        };
        let light = draw_graph(&graph, &pos, &strata, &opts).unwrap();
        assert!(light.contains("fill=\"white\""));
        assert!(light.contains("stroke=\"black\""));
    }

    #[test]
    fn test_node_color_map_and_fallback() {
        let (graph, pos, nodes, sizes) = make_fixture();
        let strata = full_strata(nodes, sizes);

        let node_colors: HashMap<String, String> = [("a".to_string(), "#FF0000".to_string())].into();
        let opts = DrawOptions {
            node_colors: Some(node_colors),
            ..Default::default()
        };
        let svg = draw_graph(&graph, &pos, &strata, &opts).unwrap();

        assert!(svg.contains("fill=\"#FF0000\""), "coloured node");
        assert!(svg.contains("fill=\"grey\""), "uncoloured nodes fall back");
        // a's edges take a's colour too.
        assert!(svg.contains("stroke=\"#FF0000\""));
    }

    #[test]
    fn test_missing_size_is_an_error() {
        let (graph, pos, nodes, mut sizes) = make_fixture();
        sizes[0].remove("b");
        let strata = full_strata(nodes, sizes);

        let result = draw_graph(&graph, &pos, &strata, &DrawOptions::default());

        assert!(
            matches!(result, Err(DrawError::MissingSize(ref n)) if n == "b"),
            "expected a MissingSize error for b"
        );
    }

    #[test]
    fn test_missing_position_is_an_error() {
        let (graph, mut pos, nodes, sizes) = make_fixture();
        let b = nodes[0][1];
        pos.remove(&b);
        let strata = full_strata(nodes, sizes);

        let result = draw_graph(&graph, &pos, &strata, &DrawOptions::default());

        assert!(matches!(result, Err(DrawError::MissingPosition(_))));
    }

    #[test]
    fn test_filtered_drops_small_nodes() {
        let (graph, pos, nodes, sizes) = make_fixture();

        // b (size 4.0) falls below the left threshold of 10.
        let svg = draw_graph_filtered(
            &graph,
            &pos,
            nodes,
            sizes,
            [10.0, 0.0],
            [0.0, 0.0],
            None,
            &DrawOptions::default(),
        )
        .unwrap();

        assert!(!svg.contains("<title>b</title>"), "b should be filtered out");
        assert!(svg.contains("<title>a</title>"));
        assert!(svg.contains("<title>x</title>"));
    }

    #[test]
    fn test_filtered_default_labels_respect_label_threshold() {
        let (graph, pos, nodes, sizes) = make_fixture();

        let opts = DrawOptions {
            add_labels: true,
            ..Default::default()
        };
        // everything drawn; labels only for sizes >= 50.
        let svg = draw_graph_filtered(
            &graph,
            &pos,
            nodes,
            sizes,
            [0.0, 0.0],
            [50.0, 50.0],
            None,
            &opts,
        )
        .unwrap();

        assert!(svg.contains(">a</text>"), "a (size 100) gets a label");
        assert!(svg.contains(">y</text>"), "y (size 64) gets a label");
        assert!(!svg.contains(">b</text>"), "b (size 4) gets no label");
        assert!(!svg.contains(">x</text>"), "x (size 25) gets no label");
    }

    #[test]
    fn test_filtered_explicit_labels_win() {
        let (graph, pos, nodes, sizes) = make_fixture();

        let left_labels: HashMap<String, String> =
            [("a".to_string(), "Alpha".to_string())].into();
        let opts = DrawOptions {
            add_labels: true,
            ..Default::default()
        };
        let svg = draw_graph_filtered(
            &graph,
            &pos,
            nodes,
            sizes,
            [0.0, 0.0],
            [0.0, 0.0],
            Some([left_labels, HashMap::new()]),
            &opts,
        )
        .unwrap();

        assert!(svg.contains(">Alpha</text>"));
        assert!(
            !svg.contains(">x</text>"),
            "explicit empty map suppresses default labels"
        );
    }

    #[test]
    fn test_legend_rows() {
        let (graph, pos, nodes, sizes) = make_fixture();
        let strata = full_strata(nodes, sizes);

        let entries: BTreeMap<String, String> = [
            ("first".to_string(), "#FF0000".to_string()),
            ("second".to_string(), "#00FF00".to_string()),
        ]
        .into();
        let opts = DrawOptions {
            legend: Some(Legend::new(entries)),
            ..Default::default()
        };
        let svg = draw_graph(&graph, &pos, &strata, &opts).unwrap();

        assert!(svg.contains(">first</text>"));
        assert!(svg.contains(">second</text>"));
        assert!(svg.contains("fill=\"#00FF00\""));
    }

    #[test]
    fn test_no_labels_without_flag() {
        let (graph, pos, nodes, sizes) = make_fixture();

        let svg = draw_graph_filtered(
            &graph,
            &pos,
            nodes,
            sizes,
            [0.0, 0.0],
            [0.0, 0.0],
            None,
            &DrawOptions::default(),
        )
        .unwrap();

        assert!(!svg.contains("<text"), "labels are off by default");
    }
}
