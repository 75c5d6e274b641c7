use std::cmp::Ordering;
use std::collections::BinaryHeap;

use fnv::FnvHashMap;
use thiserror::Error;

pub type Cost = f64;

/// Recoverable routing failures. Callers check the variant; nothing in this
/// module aborts the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("unknown location `{0}`")]
    UnknownLocation(String),
    #[error("no route from `{from}` to `{to}`")]
    Unreachable { from: String, to: String },
    #[error("no reachable `{category}` facility from `{from}`")]
    NoMatchingFacility { from: String, category: String },
    #[error("no connection found between `{from}` and `{to}`")]
    NoSuchEdge { from: String, to: String },
}

/// A directed edge out of a location. The target is held by name and resolved
/// against the location index at search time, so an edge pointing at a name
/// that never opens its own adjacency list is inert.
#[derive(Debug, Clone)]
pub struct Edge {
    pub to: String,
    pub weight: Cost,
}

#[derive(Debug, Clone)]
struct Location {
    name: String,
    role: Option<String>,
    edges: Vec<Edge>,
}

impl Location {
    fn matches(&self, category: &str) -> bool {
        // Substring match is the map-format convention; an explicit role
        // tag wins when one has been set.
        match &self.role {
            Some(role) => role == category,
            None => self.name.contains(category),
        }
    }
}

/// A shortest-path result: the total cost and every stop along the way,
/// endpoints included.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub cost: Cost,
    pub stops: Vec<String>,
}

/// Weighted directed road network. Adjacency lists are owned by the graph and
/// keyed through a name-to-index map built as locations are added, so every
/// lookup after construction is a single hash probe.
#[derive(Debug, Default)]
pub struct Graph {
    locations: Vec<Location>,
    index: FnvHashMap<String, usize>,
}

#[derive(Copy, Clone, PartialEq)]
struct State {
    cost: Cost,
    location: usize,
}

// Min-heap by cost
impl Eq for State {}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // reverse ordering for min-heap
        other.cost.partial_cmp(&self.cost).unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Registers a location and returns its index, or `None` when the name is
    /// already taken. The first definition of a name wins.
    pub fn add_location(&mut self, name: &str) -> Option<usize> {
        if self.index.contains_key(name) {
            return None;
        }
        let idx = self.locations.len();
        self.locations.push(Location {
            name: name.to_string(),
            role: None,
            edges: Vec::new(),
        });
        self.index.insert(name.to_string(), idx);
        Some(idx)
    }

    /// Attaches an explicit facility role to a location, overriding the
    /// name-substring convention for that location.
    pub fn set_role(&mut self, name: &str, role: &str) -> Result<(), RouteError> {
        let idx = self.index_of(name)?;
        self.locations[idx].role = Some(role.to_string());
        Ok(())
    }

    pub fn add_edge(&mut self, from: &str, to: &str, weight: Cost) -> Result<(), RouteError> {
        let src = self.index_of(from)?;
        self.push_edge(src, to.to_string(), weight);
        Ok(())
    }

    pub(crate) fn push_edge(&mut self, from: usize, to: String, weight: Cost) {
        self.locations[from].edges.push(Edge { to, weight });
    }

    pub fn edge_weight(&self, from: &str, to: &str) -> Option<Cost> {
        let src = *self.index.get(from)?;
        self.locations[src]
            .edges
            .iter()
            .find(|edge| edge.to == to)
            .map(|edge| edge.weight)
    }

    fn index_of(&self, name: &str) -> Result<usize, RouteError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| RouteError::UnknownLocation(name.to_string()))
    }

    /// Dijkstra from `start` to `end`. Returns the total cost and the full
    /// stop sequence, or the failure when either endpoint is unknown or no
    /// path connects them. Does not mutate the graph.
    pub fn shortest_path(&self, start: &str, end: &str) -> Result<Route, RouteError> {
        let src = self.index_of(start)?;
        let dst = self.index_of(end)?;

        let n = self.locations.len();
        let mut dist = vec![Cost::INFINITY; n];
        let mut prev: Vec<Option<usize>> = vec![None; n];
        let mut heap = BinaryHeap::new();

        dist[src] = 0.0;
        heap.push(State {
            cost: 0.0,
            location: src,
        });

        while let Some(State { cost, location }) = heap.pop() {
            if cost > dist[location] {
                continue;
            }
            if location == dst {
                break;
            }
            for edge in &self.locations[location].edges {
                let next = match self.index.get(&edge.to) {
                    Some(&idx) => idx,
                    None => continue,
                };
                let next_cost = cost + edge.weight;
                if next_cost < dist[next] {
                    dist[next] = next_cost;
                    prev[next] = Some(location);
                    heap.push(State {
                        cost: next_cost,
                        location: next,
                    });
                }
            }
        }

        if dist[dst].is_infinite() {
            return Err(RouteError::Unreachable {
                from: start.to_string(),
                to: end.to_string(),
            });
        }

        // Walk the predecessor links back from the target.
        let mut stops = Vec::new();
        let mut at = Some(dst);
        while let Some(idx) = at {
            stops.push(self.locations[idx].name.clone());
            at = prev[idx];
        }
        stops.reverse();

        Ok(Route {
            cost: dist[dst],
            stops,
        })
    }

    /// Finds the closest location matching `category` as seen from `from`,
    /// running one shortest-path query per candidate. Ties keep the candidate
    /// evaluated first. The starting location itself is a valid candidate at
    /// cost zero.
    pub fn nearest_facility(&self, from: &str, category: &str) -> Result<String, RouteError> {
        self.index_of(from)?;

        let mut best: Option<(String, Cost)> = None;
        for location in &self.locations {
            if !location.matches(category) {
                continue;
            }
            let route = match self.shortest_path(from, &location.name) {
                Ok(route) => route,
                Err(_) => continue,
            };
            let closer = match &best {
                Some((_, cost)) => route.cost < *cost,
                None => true,
            };
            if closer {
                best = Some((location.name.clone(), route.cost));
            }
        }

        match best {
            Some((name, _)) => Ok(name),
            None => Err(RouteError::NoMatchingFacility {
                from: from.to_string(),
                category: category.to_string(),
            }),
        }
    }

    /// Scales the weight of the exact directed edge `from -> to` and returns
    /// the new weight. A reverse edge or any other edge sharing an endpoint is
    /// untouched. Reports `NoSuchEdge` without mutating anything when the
    /// edge does not exist.
    pub fn apply_traffic_factor(
        &mut self,
        from: &str,
        to: &str,
        factor: f64,
    ) -> Result<Cost, RouteError> {
        debug_assert!(factor >= 1.0, "traffic factor {} must be >= 1.0", factor);

        let no_such_edge = || RouteError::NoSuchEdge {
            from: from.to_string(),
            to: to.to_string(),
        };

        let src = match self.index.get(from) {
            Some(&idx) => idx,
            None => return Err(no_such_edge()),
        };
        for edge in &mut self.locations[src].edges {
            if edge.to == to {
                edge.weight *= factor;
                return Ok(edge.weight);
            }
        }
        Err(no_such_edge())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_from(edges: &[(&str, &str, Cost)]) -> Graph {
        let mut graph = Graph::new();
        for &(from, to, _) in edges {
            graph.add_location(from);
            graph.add_location(to);
        }
        for &(from, to, weight) in edges {
            graph.add_edge(from, to, weight).unwrap();
        }
        graph
    }

    #[test]
    fn route_prefers_cheaper_detour() {
        let graph = graph_from(&[("A", "B", 1.0), ("B", "C", 1.0), ("A", "C", 5.0)]);
        let route = graph.shortest_path("A", "C").unwrap();
        assert_eq!(route.cost, 2.0);
        assert_eq!(route.stops, vec!["A", "B", "C"]);
    }

    #[test]
    fn route_to_self_is_free() {
        let graph = graph_from(&[("A", "B", 1.0)]);
        let route = graph.shortest_path("A", "A").unwrap();
        assert_eq!(route.cost, 0.0);
        assert_eq!(route.stops, vec!["A"]);
    }

    #[test]
    fn reverse_direction_is_not_implied() {
        let graph = graph_from(&[("A", "B", 1.0)]);
        assert_eq!(
            graph.shortest_path("B", "A"),
            Err(RouteError::Unreachable {
                from: "B".to_string(),
                to: "A".to_string(),
            })
        );
    }

    #[test]
    fn unknown_endpoints_are_reported() {
        let graph = graph_from(&[("A", "B", 1.0)]);
        assert_eq!(
            graph.shortest_path("nowhere", "B"),
            Err(RouteError::UnknownLocation("nowhere".to_string()))
        );
        assert_eq!(
            graph.shortest_path("A", "nowhere"),
            Err(RouteError::UnknownLocation("nowhere".to_string()))
        );
    }

    #[test]
    fn disconnected_components_are_unreachable() {
        let graph = graph_from(&[("A", "B", 1.0), ("C", "D", 1.0)]);
        assert!(matches!(
            graph.shortest_path("A", "D"),
            Err(RouteError::Unreachable { .. })
        ));
    }

    #[test]
    fn edge_to_undeclared_name_is_inert() {
        let mut graph = Graph::new();
        graph.add_location("A");
        graph.add_location("B");
        graph.add_edge("A", "ghost", 1.0).unwrap();
        graph.add_edge("A", "B", 2.0).unwrap();

        assert_eq!(
            graph.shortest_path("A", "ghost"),
            Err(RouteError::UnknownLocation("ghost".to_string()))
        );
        let route = graph.shortest_path("A", "B").unwrap();
        assert_eq!(route.cost, 2.0);
    }

    #[test]
    fn nearest_facility_picks_cheapest() {
        let graph = graph_from(&[
            ("X", "far-hospital", 4.0),
            ("X", "mid", 1.0),
            ("mid", "near-hospital", 1.0),
        ]);
        assert_eq!(
            graph.nearest_facility("X", "hospital").unwrap(),
            "near-hospital"
        );
    }

    #[test]
    fn nearest_facility_ties_keep_first_candidate() {
        let graph = graph_from(&[("X", "east-hospital", 2.0), ("X", "west-hospital", 2.0)]);
        assert_eq!(
            graph.nearest_facility("X", "hospital").unwrap(),
            "east-hospital"
        );
    }

    #[test]
    fn nearest_facility_honors_role_tag() {
        let mut graph = graph_from(&[("X", "trauma-center", 1.0), ("X", "far-hospital", 9.0)]);
        graph.set_role("trauma-center", "hospital").unwrap();
        assert_eq!(
            graph.nearest_facility("X", "hospital").unwrap(),
            "trauma-center"
        );
    }

    #[test]
    fn nearest_facility_without_match_is_reported() {
        let graph = graph_from(&[("X", "Y", 1.0)]);
        assert_eq!(
            graph.nearest_facility("X", "hospital"),
            Err(RouteError::NoMatchingFacility {
                from: "X".to_string(),
                category: "hospital".to_string(),
            })
        );
    }

    #[test]
    fn nearest_facility_requires_reachability() {
        // The hospital exists but no edge leads to it.
        let mut graph = Graph::new();
        graph.add_location("X");
        graph.add_location("island-hospital");
        assert!(matches!(
            graph.nearest_facility("X", "hospital"),
            Err(RouteError::NoMatchingFacility { .. })
        ));
    }

    #[test]
    fn traffic_factor_scales_a_single_edge() {
        let mut graph = graph_from(&[("A", "B", 2.0), ("B", "A", 2.0), ("A", "C", 3.0)]);
        let new_weight = graph.apply_traffic_factor("A", "B", 1.5).unwrap();
        assert_eq!(new_weight, 3.0);
        assert_eq!(graph.edge_weight("A", "B"), Some(3.0));
        // The reverse edge and unrelated edges keep their weights.
        assert_eq!(graph.edge_weight("B", "A"), Some(2.0));
        assert_eq!(graph.edge_weight("A", "C"), Some(3.0));
    }

    #[test]
    fn traffic_factor_on_missing_edge_is_a_no_op() {
        let mut graph = graph_from(&[("A", "B", 2.0)]);
        assert_eq!(
            graph.apply_traffic_factor("B", "A", 1.25),
            Err(RouteError::NoSuchEdge {
                from: "B".to_string(),
                to: "A".to_string(),
            })
        );
        assert_eq!(
            graph.apply_traffic_factor("nowhere", "B", 1.25),
            Err(RouteError::NoSuchEdge {
                from: "nowhere".to_string(),
                to: "B".to_string(),
            })
        );
        assert_eq!(graph.edge_weight("A", "B"), Some(2.0));
    }

    #[test]
    fn traffic_can_change_the_best_route() {
        let mut graph = graph_from(&[("A", "B", 1.0), ("B", "C", 1.0), ("A", "C", 5.0)]);
        assert_eq!(graph.shortest_path("A", "C").unwrap().cost, 2.0);

        graph.apply_traffic_factor("B", "C", 10.0).unwrap();
        let route = graph.shortest_path("A", "C").unwrap();
        assert_eq!(route.cost, 5.0);
        assert_eq!(route.stops, vec!["A", "C"]);
    }
}
