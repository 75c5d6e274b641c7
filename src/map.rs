use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use log::warn;

use crate::graph::{Cost, Graph};

/// Literal token that closes one adjacency list and starts the next.
pub const LIST_TERMINATOR: &str = "nullptr";

pub fn load(path: impl AsRef<Path>) -> io::Result<Graph> {
    let file = File::open(path)?;
    parse(BufReader::new(file))
}

/// Parses the adjacency-list map format. Each list opens with the line naming
/// its source location (the distance column on that line is parsed for
/// validity but otherwise ignored), the following lines are directed edges
/// out of it, and a `nullptr` line closes it. Lines that do not parse as
/// `<name> <distance>` are skipped, as are edges with negative or non-finite
/// distances. A trailing list without a terminator is still collected.
pub fn parse(reader: impl BufRead) -> io::Result<Graph> {
    let mut lists: Vec<(String, Vec<(String, Cost)>)> = Vec::new();
    let mut current: Option<(String, Vec<(String, Cost)>)> = None;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line == LIST_TERMINATOR {
            if let Some(list) = current.take() {
                lists.push(list);
            }
            continue;
        }
        match parse_entry(line) {
            Some((name, distance)) => match current.as_mut() {
                Some((_, edges)) => {
                    if distance.is_finite() && distance >= 0.0 {
                        edges.push((name.to_string(), distance));
                    } else {
                        warn!(
                            "line {}: ignoring edge to `{}` with invalid distance {}",
                            line_no + 1,
                            name,
                            distance
                        );
                    }
                }
                None => current = Some((name.to_string(), Vec::new())),
            },
            None => {
                if !line.is_empty() {
                    warn!("line {}: skipping malformed map line {:?}", line_no + 1, line);
                }
            }
        }
    }
    if let Some(list) = current.take() {
        lists.push(list);
    }

    let mut graph = Graph::new();
    for (source, edges) in lists {
        let src = match graph.add_location(&source) {
            Some(idx) => idx,
            None => {
                warn!(
                    "duplicate location `{}`; keeping the first definition",
                    source
                );
                continue;
            }
        };
        for (to, distance) in edges {
            graph.push_edge(src, to, distance);
        }
    }
    Ok(graph)
}

fn parse_entry(line: &str) -> Option<(&str, Cost)> {
    let mut tokens = line.split_whitespace();
    let name = tokens.next()?;
    let distance: Cost = tokens.next()?.parse().ok()?;
    // Extra trailing tokens are ignored.
    Some((name, distance))
}
