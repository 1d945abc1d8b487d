use csv::ReaderBuilder;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction::{Incoming, Outgoing};
use petgraph::Graph;
use serde_derive::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for reading in a DSV.
#[derive(Error, Debug)]
pub enum ReadDSVError {
    #[error("Problem reading from path.")]
    FromPath { source: csv::Error },
    #[error("Problem with StringRecord: {source}")]
    StringRecordParseError { source: csv::Error },
}

/// A row in the DSV should only be these three columns currently.
#[derive(Debug, Deserialize, PartialEq)]
pub struct Row {
    /// The node the edge leaves from.
    pub from: String,
    /// The node the edge points to.
    pub to: String,
    /// Edge weights can only be floats at the moment.
    pub weight: f64,
}

/// A node name is a String.
pub type Label = String;
/// An edge weight is currently an f64.
pub type Weight = f64;

/// A graph with two strata. Which nodes belong to which
/// stratum is decided by the caller at partition time, not
/// baked into the graph.
pub struct BipartiteGraph(pub Graph<Label, Weight>);

/// Counts of nodes per stratum and total edges, for
/// the default CLI output.
pub struct BipartiteStats {
    /// Number of nodes in the left stratum.
    pub no_left: usize,
    /// Number of nodes in the right stratum.
    pub no_right: usize,
    /// Total number of edges in the graph.
    pub no_edges: usize,
}

impl BipartiteGraph {
    /// Function to read into this graph struct from a DSV.
    ///
    /// Input must have three columns in the order:
    /// - from
    /// - to
    /// - weight
    ///
    /// Using lower case names. Any delimiter can be used.
    pub fn from_dsv(input: &PathBuf, delimiter: u8) -> Result<Self, ReadDSVError> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(delimiter)
            .from_path(input)
            .map_err(|s| ReadDSVError::FromPath { source: s })?;

        let mut edges = Vec::new();

        for result in rdr.deserialize() {
            let record: Row =
                result.map_err(|s| ReadDSVError::StringRecordParseError { source: s })?;
            edges.push(record);
        }
        Ok(Self::create_graph_from_dsv(edges))
    }

    /// Create a graph from a DSV, given the specific input criteria.
    fn create_graph_from_dsv(input: Vec<Row>) -> Self {
        // create a unique vector of nodes
        let froms: Vec<&String> = input.iter().map(|e| &e.from).collect();
        let tos: Vec<&String> = input.iter().map(|e| &e.to).collect();

        // collect into nodes, sort, dedup
        let mut nodes: Vec<&String> = froms.into_iter().chain(tos.into_iter()).collect();
        nodes.sort();
        nodes.dedup();

        // the graph has node names as node weights, and the
        // numeric weights on the edges.
        let mut graph: Graph<Label, Weight> = petgraph::Graph::new();
        // we also need to make a lookup of the nodes and their indices
        let mut node_index_map = HashMap::new();

        // add the nodes, and make the map
        for node in nodes {
            let node = node.clone();

            let node_index = graph.add_node(node.clone());

            node_index_map.insert(node, node_index);
        }

        // add the edges
        for Row { from, to, weight } in input {
            let from_node_index = node_index_map[&from];
            let to_node_index = node_index_map[&to];

            graph.add_edge(from_node_index, to_node_index, weight);
        }

        BipartiteGraph(graph)
    }

    /// Split the node set into two strata by membership in
    /// `left`. Nodes whose name appears in `left` form the first
    /// returned list, all other nodes the second. Order follows
    /// graph node order, so the split is deterministic.
    pub fn partition(
        &self,
        left: &[String],
    ) -> (Vec<(NodeIndex, &Label)>, Vec<(NodeIndex, &Label)>) {
        let graph = &self.0;
        let mut left_nodes = Vec::new();
        let mut right_nodes = Vec::new();

        for node in graph.node_indices() {
            let name = &graph[node];
            if left.iter().any(|l| l == name) {
                left_nodes.push((node, name));
            } else {
                right_nodes.push((node, name));
            }
        }
        (left_nodes, right_nodes)
    }

    /// The sum of incident edge weights for every node,
    /// keyed by node name. Used as the default node size
    /// mapping when the caller supplies none.
    pub fn weighted_degrees(&self) -> HashMap<Label, f64> {
        let graph = &self.0;
        let mut degrees: HashMap<Label, f64> = HashMap::new();

        for node in graph.node_indices() {
            let total: f64 = graph
                .edges_directed(node, Outgoing)
                .chain(graph.edges_directed(node, Incoming))
                .map(|e| *e.weight())
                .sum();
            degrees.insert(graph[node].clone(), total);
        }
        degrees
    }

    /// Node counts per stratum under the given partition,
    /// plus the total edge count.
    pub fn stats(&self, left: &[String]) -> BipartiteStats {
        let (left_nodes, right_nodes) = self.partition(left);

        BipartiteStats {
            no_left: left_nodes.len(),
            no_right: right_nodes.len(),
            no_edges: self.0.edge_count(),
        }
    }
}

/// Read a headerless two-column DSV of node name and numeric
/// value, e.g. a node size mapping.
pub fn read_value_map(
    input: &PathBuf,
    delimiter: u8,
) -> Result<HashMap<Label, f64>, ReadDSVError> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_path(input)
        .map_err(|s| ReadDSVError::FromPath { source: s })?;

    let mut map = HashMap::new();
    for result in rdr.deserialize() {
        let (name, value): (String, f64) =
            result.map_err(|s| ReadDSVError::StringRecordParseError { source: s })?;
        map.insert(name, value);
    }
    Ok(map)
}

/// Read a headerless two-column DSV of node name and string
/// value, e.g. a node colour mapping.
pub fn read_string_map(
    input: &PathBuf,
    delimiter: u8,
) -> Result<HashMap<Label, String>, ReadDSVError> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_path(input)
        .map_err(|s| ReadDSVError::FromPath { source: s })?;

    let mut map = HashMap::new();
    for result in rdr.deserialize() {
        let (name, value): (String, String) =
            result.map_err(|s| ReadDSVError::StringRecordParseError { source: s })?;
        map.insert(name, value);
    }
    Ok(map)
}
