use anyhow::Result;
use calm_io::stdoutln;
use clap::{arg, crate_version, value_parser, ArgMatches, Command};
use forceplot::{
    bipartite::{read_string_map, read_value_map, BipartiteStats},
    draw_graph_filtered, spring_layout, BipartiteGraph, DrawOptions, LayoutOptions, Legend,
    LegendLoc, Theme,
};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Create the CLI in clap.
pub fn cli() -> Command {
    Command::new("forceplotis")
        .bin_name("forceplotis")
        .arg_required_else_help(true)
        .version(crate_version!())
        .author("Max Brown <euphrasiamax@gmail.com>")
        .subcommand(
            Command::new("draw")
                .about("Lay out a bipartite graph with a spring layout and draw it as SVG.")
                .arg_required_else_help(true)
                // generic parameters
                .arg(
                    arg!(<INPUT_DSV> "An input DSV with three headers only: from, to, and weight.")
                        // File always required
                        .required(true)
                        // and we expect it to be a PathBuf
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    arg!([DELIMITER] "Specify the delimiter of the DSV; we assume tabs.")
                        .required(false),
                )
                .arg(
                    arg!(-g --groups <GROUPS> "File of node names forming the left stratum, one per line.")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--sizes [SIZES] "Two column DSV of node name and size. Defaults to weighted node degrees.")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--colors [COLORS] "Two column DSV of node name and fill colour.")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--legend [LEGEND] "Two column DSV of legend label and colour.")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--legendsize [LEGENDSIZE] "Radius of the legend markers.")
                        .default_value("5.0")
                        .value_parser(value_parser!(f64)),
                )
                .arg(
                    arg!(--legendloc [LEGENDLOC] "Corner to anchor the legend in.")
                        .default_value("best")
                        .value_parser(["best", "upper-left", "upper-right", "lower-left", "lower-right"]),
                )
                .arg(
                    arg!(-l --labels "Draw node labels.")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--light "Use the light theme; the default is dark.")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--straight "Draw straight edges instead of curved ones.")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--minsize [MINSIZE] "Nodes with a size below this are not drawn.")
                        .default_value("0.0")
                        .value_parser(value_parser!(f64)),
                )
                .arg(
                    arg!(--minlabelsize [MINLABELSIZE] "Nodes with a size below this get no default label.")
                        .default_value("0.0")
                        .value_parser(value_parser!(f64)),
                )
                .arg(
                    arg!(--nodescale [NODESCALE] "Node sizes are divided by this before drawing.")
                        .default_value("1.0")
                        .value_parser(value_parser!(f64)),
                )
                .arg(
                    arg!(--edgescale [EDGESCALE] "Edge weights are divided by this to give line widths.")
                        .default_value("1.0")
                        .value_parser(value_parser!(f64)),
                )
                .arg(
                    arg!(--nodealpha [NODEALPHA] "Opacity of the node fills.")
                        .default_value("0.6")
                        .value_parser(value_parser!(f64)),
                )
                .arg(
                    arg!(--edgealpha [EDGEALPHA] "Opacity of the edge strokes.")
                        .default_value("0.15")
                        .value_parser(value_parser!(f64)),
                )
                .arg(
                    arg!(--width [WIDTH] "Width of the SVG in pixels.")
                        .default_value("700")
                        .value_parser(value_parser!(i32)),
                )
                .arg(
                    arg!(--height [HEIGHT] "Height of the SVG in pixels.")
                        .default_value("700")
                        .value_parser(value_parser!(i32)),
                )
                .arg(
                    arg!(--seed [SEED] "Seed for the spring layout.")
                        .default_value("42")
                        .value_parser(value_parser!(u64)),
                )
                .arg(
                    arg!(--iterations [ITERATIONS] "Number of spring layout iterations.")
                        .default_value("50")
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    arg!(--stats "Print stratum and edge counts instead of plotting.")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
}

/// Read the left-stratum group file: one node name per line,
/// blank lines skipped.
fn read_groups(path: &PathBuf) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect())
}

/// Process all of the matches from the CLI.
pub fn process_matches(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("draw", sub_matches)) => {
            // parse all of the command line args here.
            let input = sub_matches
                .get_one::<PathBuf>("INPUT_DSV")
                .expect("required");
            let delimiter = match sub_matches.get_one::<String>("DELIMITER") {
                Some(d) => d.bytes().next().unwrap_or(b'\t'),
                None => b'\t',
            };
            let groups_path = sub_matches.get_one::<PathBuf>("groups").expect("required");

            let labels = *sub_matches
                .get_one::<bool>("labels")
                .expect("defaulted by clap.");
            let light = *sub_matches
                .get_one::<bool>("light")
                .expect("defaulted by clap.");
            let straight = *sub_matches
                .get_one::<bool>("straight")
                .expect("defaulted by clap.");
            let stats = *sub_matches
                .get_one::<bool>("stats")
                .expect("defaulted by clap.");

            let min_size = *sub_matches
                .get_one::<f64>("minsize")
                .expect("defaulted by clap.");
            let min_label_size = *sub_matches
                .get_one::<f64>("minlabelsize")
                .expect("defaulted by clap.");
            let node_scale = *sub_matches
                .get_one::<f64>("nodescale")
                .expect("defaulted by clap.");
            let edge_scale = *sub_matches
                .get_one::<f64>("edgescale")
                .expect("defaulted by clap.");
            let node_alpha = *sub_matches
                .get_one::<f64>("nodealpha")
                .expect("defaulted by clap.");
            let edge_alpha = *sub_matches
                .get_one::<f64>("edgealpha")
                .expect("defaulted by clap.");
            let width = *sub_matches
                .get_one::<i32>("width")
                .expect("defaulted by clap.");
            let height = *sub_matches
                .get_one::<i32>("height")
                .expect("defaulted by clap.");
            let seed = *sub_matches
                .get_one::<u64>("seed")
                .expect("defaulted by clap.");
            let iterations = *sub_matches
                .get_one::<usize>("iterations")
                .expect("defaulted by clap.");
            let legend_size = *sub_matches
                .get_one::<f64>("legendsize")
                .expect("defaulted by clap.");
            let legend_loc = sub_matches
                .get_one::<String>("legendloc")
                .expect("defaulted by clap.");

            // everything requires the bipartite graph
            // and must currently go through a DSV.
            let bpgraph = BipartiteGraph::from_dsv(input, delimiter)?;
            let groups = read_groups(groups_path)?;

            if stats {
                let BipartiteStats {
                    no_left,
                    no_right,
                    no_edges,
                } = bpgraph.stats(&groups);
                println!("#_left_nodes\t#_right_nodes\t#_total_edges");
                println!("{}\t{}\t{}", no_left, no_right, no_edges);
                return Ok(());
            }

            let (left, right) = bpgraph.partition(&groups);
            if left.is_empty() || right.is_empty() {
                eprintln!("Warning: one of the strata is empty; the plot will have no edges.");
            }

            let pos = spring_layout(
                &bpgraph,
                &LayoutOptions {
                    iterations,
                    seed,
                    k: None,
                },
            );

            let sizes = match sub_matches.get_one::<PathBuf>("sizes") {
                Some(p) => read_value_map(p, delimiter)?,
                None => bpgraph.weighted_degrees(),
            };

            let node_colors = match sub_matches.get_one::<PathBuf>("colors") {
                Some(p) => Some(read_string_map(p, delimiter)?),
                None => None,
            };

            let legend = match sub_matches.get_one::<PathBuf>("legend") {
                Some(p) => {
                    let entries: BTreeMap<String, String> =
                        read_string_map(p, delimiter)?.into_iter().collect();
                    let loc: LegendLoc = legend_loc.parse().map_err(anyhow::Error::msg)?;
                    Some(Legend {
                        entries,
                        marker_size: legend_size,
                        loc,
                    })
                }
                None => None,
            };

            let opts = DrawOptions {
                width,
                height,
                theme: if light { Theme::Light } else { Theme::Dark },
                add_labels: labels,
                node_alpha,
                edge_alpha,
                node_size_reduction_factor: node_scale,
                edge_linewidth_reduction_factor: edge_scale,
                curved_edges: !straight,
                node_colors,
                legend,
                ..Default::default()
            };

            let svg = draw_graph_filtered(
                &bpgraph,
                &pos,
                [
                    left.iter().map(|(n, _)| *n).collect(),
                    right.iter().map(|(n, _)| *n).collect(),
                ],
                [sizes.clone(), sizes],
                [min_size, min_size],
                [min_label_size, min_label_size],
                None,
                &opts,
            )?;

            stdoutln!("{}", svg)?;
        }
        _ => unreachable!("Should never reach here."),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        cli().debug_assert();
    }
}
