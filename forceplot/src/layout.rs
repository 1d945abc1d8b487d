//! A seeded spring layout for bipartite graphs.
//!
//! This is the Fruchterman-Reingold force-directed algorithm:
//! nodes repel each other, edges pull their endpoints together
//! in proportion to their weight, and a falling temperature caps
//! how far a node may move each round. Positions are rescaled to
//! the [-1, 1] square at the end.

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

use crate::BipartiteGraph;

/// Knobs for the spring layout.
#[derive(Debug, Clone)]
pub struct LayoutOptions {
    /// Number of simulation rounds.
    pub iterations: usize,
    /// Seed for the initial node placement. The same seed
    /// always produces the same layout.
    pub seed: u64,
    /// Optimal distance between nodes. Defaults to
    /// `sqrt(1 / node_count)` when `None`.
    pub k: Option<f64>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            iterations: 50,
            seed: 42,
            k: None,
        }
    }
}

/// Initial temperature, as a fraction of the unit square.
const INITIAL_TEMPERATURE: f64 = 0.1;

/// Two coincident nodes still need a finite repulsion.
const MIN_DISTANCE_SQUARED: f64 = 1e-8;

/// Compute node positions for a bipartite graph.
///
/// Returns a map from node index to an (x, y) position in
/// [-1, 1] x [-1, 1]. An empty graph gives an empty map; a
/// single node sits at the origin.
pub fn spring_layout(
    graph: &BipartiteGraph,
    opts: &LayoutOptions,
) -> HashMap<NodeIndex, (f64, f64)> {
    let graph = &graph.0;
    let n = graph.node_count();

    if n == 0 {
        return HashMap::new();
    }

    let indices: Vec<NodeIndex> = graph.node_indices().collect();

    if n == 1 {
        let mut pos = HashMap::new();
        pos.insert(indices[0], (0.0, 0.0));
        return pos;
    }

    // seeded uniform placement in the unit square.
    let mut rng = StdRng::seed_from_u64(opts.seed);
    let mut pos: Vec<(f64, f64)> = (0..n)
        .map(|_| (rng.random_range(0.0..1.0), rng.random_range(0.0..1.0)))
        .collect();

    let dense_index: HashMap<NodeIndex, usize> = indices
        .iter()
        .enumerate()
        .map(|(i, node)| (*node, i))
        .collect();

    let edges: Vec<(usize, usize, f64)> = graph
        .edge_references()
        .map(|e| {
            (
                dense_index[&e.source()],
                dense_index[&e.target()],
                *e.weight(),
            )
        })
        .collect();

    let k = opts.k.unwrap_or_else(|| (1.0 / n as f64).sqrt());

    let mut temperature = INITIAL_TEMPERATURE;
    let cooling = temperature / (opts.iterations as f64 + 1.0);

    for _ in 0..opts.iterations {
        let mut disp = vec![(0.0f64, 0.0f64); n];

        // pairwise repulsion: k^2 / d along the separating vector.
        for i in 0..n {
            for j in (i + 1)..n {
                let dx = pos[i].0 - pos[j].0;
                let dy = pos[i].1 - pos[j].1;
                let d2 = (dx * dx + dy * dy).max(MIN_DISTANCE_SQUARED);
                let f = k * k / d2;

                disp[i].0 += dx * f;
                disp[i].1 += dy * f;
                disp[j].0 -= dx * f;
                disp[j].1 -= dy * f;
            }
        }

        // attraction along edges: d^2 / k, scaled by edge weight.
        for &(a, b, weight) in &edges {
            if a == b {
                continue;
            }
            let dx = pos[a].0 - pos[b].0;
            let dy = pos[a].1 - pos[b].1;
            let d = (dx * dx + dy * dy).max(MIN_DISTANCE_SQUARED).sqrt();
            let f = d / k * weight;

            disp[a].0 -= dx * f;
            disp[a].1 -= dy * f;
            disp[b].0 += dx * f;
            disp[b].1 += dy * f;
        }

        // move each node, capped by the current temperature.
        for i in 0..n {
            let (dx, dy) = disp[i];
            let length = (dx * dx + dy * dy).sqrt().max(f64::EPSILON);
            let step = length.min(temperature);

            pos[i].0 += dx / length * step;
            pos[i].1 += dy / length * step;
        }

        temperature -= cooling;
    }

    rescale(&mut pos);

    indices.into_iter().zip(pos).collect()
}

/// Recentre positions on the origin and scale so the largest
/// absolute coordinate is 1.
fn rescale(pos: &mut [(f64, f64)]) {
    let n = pos.len() as f64;
    let mean_x: f64 = pos.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y: f64 = pos.iter().map(|p| p.1).sum::<f64>() / n;

    let mut max_abs = 0.0f64;
    for p in pos.iter_mut() {
        p.0 -= mean_x;
        p.1 -= mean_y;
        max_abs = max_abs.max(p.0.abs()).max(p.1.abs());
    }

    if max_abs > 0.0 {
        for p in pos.iter_mut() {
            p.0 /= max_abs;
            p.1 /= max_abs;
        }
    }
}
