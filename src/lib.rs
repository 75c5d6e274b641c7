//! Emergency-dispatch simulation over a weighted road network: a road graph
//! with Dijkstra routing, nearest-facility search and traffic-factor edge
//! scaling, a severity-ordered task intake, and a parser for the
//! adjacency-list map format.

pub mod graph;
pub mod map;
pub mod triage;
