//! Bounded-degree neighbor graph over projected particle positions.

use neural_field_api::Point;

use super::policy::ConnectionPolicy;

/// A link from one particle to one of its nearest neighbors
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    /// Screen-space distance between the two particles
    pub distance: f32,
}

/// Rebuilt from scratch every tick. Buffers are kept between rebuilds.
#[derive(Debug, Default)]
pub struct ConnectionGraph {
    edges: Vec<Edge>,
    /// Index of each node's first edge; edges are grouped by `from`
    node_start: Vec<usize>,
    candidates: Vec<(usize, f32)>,
    reach: f32,
}

impl ConnectionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link every point to at most `max_per_node` of its closest neighbors
    /// strictly within `reach`.
    pub fn rebuild(
        &mut self,
        points: &[Point],
        reach: f32,
        max_per_node: usize,
        policy: ConnectionPolicy,
    ) {
        self.clear();
        self.reach = reach;
        if max_per_node == 0 || reach.is_nan() || reach <= 0.0 {
            return;
        }

        for (i, p1) in points.iter().enumerate() {
            self.node_start.push(self.edges.len());
            self.candidates.clear();

            let start = match policy {
                ConnectionPolicy::Forward => i + 1,
                ConnectionPolicy::Mutual => 0,
            };
            for (j, p2) in points.iter().enumerate().skip(start) {
                if j == i {
                    continue;
                }
                let dx = p1.x - p2.x;
                let dy = p1.y - p2.y;
                // Cheap box reject before the square root
                if dx.abs() > reach || dy.abs() > reach {
                    continue;
                }
                let dist = (dx * dx + dy * dy).sqrt();
                if dist < reach {
                    self.candidates.push((j, dist));
                }
            }

            // Stable sort keeps pool order among equal distances
            self.candidates.sort_by(|a, b| a.1.total_cmp(&b.1));

            let mut linked = 0;
            for &(j, dist) in &self.candidates {
                if linked == max_per_node {
                    break;
                }
                // Mutual: the pair was already linked from the other side
                if policy == ConnectionPolicy::Mutual && j < i && self.links(j, i) {
                    linked += 1;
                    continue;
                }
                self.edges.push(Edge {
                    from: i,
                    to: j,
                    distance: dist,
                });
                linked += 1;
            }
        }
        self.node_start.push(self.edges.len());
    }

    pub fn clear(&mut self) {
        self.edges.clear();
        self.node_start.clear();
    }

    /// Edges leaving `node`, empty for nodes the last rebuild did not visit
    fn edges_from(&self, node: usize) -> &[Edge] {
        match (self.node_start.get(node), self.node_start.get(node + 1)) {
            (Some(&start), Some(&end)) => &self.edges[start..end],
            _ => &[],
        }
    }

    fn links(&self, from: usize, to: usize) -> bool {
        self.edges_from(from).iter().any(|e| e.to == to)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Reach used by the last rebuild
    pub fn reach(&self) -> f32 {
        self.reach
    }

    /// Number of edges leaving `node`
    pub fn out_degree(&self, node: usize) -> usize {
        self.edges_from(node).len()
    }
}
