//! Arena-backed tree built from depth-annotated trace intervals.
//!
//! Nodes live in one flat vector; parent and child links are indices into
//! that vector, so no node owns another.

use crate::core::types::TraceInterval;
use crate::error::{ChartError, ChartResult};

#[derive(Debug, Clone, PartialEq)]
pub struct TraceNode {
    pub interval: TraceInterval,
    pub depth: usize,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceTree {
    nodes: Vec<TraceNode>,
    roots: Vec<usize>,
}

impl TraceTree {
    /// Builds the tree from intervals sorted by start time.
    ///
    /// An interval is a child of the closest preceding interval that is still
    /// open when it starts; the input order becomes the node index order.
    pub fn from_sorted(intervals: &[TraceInterval]) -> ChartResult<Self> {
        let mut tree = Self::default();
        let mut open: Vec<usize> = Vec::new();
        let mut previous_start = f64::NEG_INFINITY;

        for interval in intervals {
            if interval.x < previous_start {
                return Err(ChartError::InvalidData(
                    "trace intervals must be sorted by start time".to_owned(),
                ));
            }
            previous_start = interval.x;

            while let Some(&top) = open.last() {
                if tree.nodes[top].interval.end() <= interval.x {
                    open.pop();
                } else {
                    break;
                }
            }

            let index = tree.nodes.len();
            let parent = open.last().copied();
            tree.nodes.push(TraceNode {
                interval: interval.clone(),
                depth: open.len(),
                parent,
                children: Vec::new(),
            });
            match parent {
                Some(parent) => tree.nodes[parent].children.push(index),
                None => tree.roots.push(index),
            }
            open.push(index);
        }

        Ok(tree)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn node(&self, index: usize) -> Option<&TraceNode> {
        self.nodes.get(index)
    }

    #[must_use]
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Indices from the root down to `index`, inclusive.
    #[must_use]
    pub fn ancestor_path(&self, index: usize) -> Vec<usize> {
        let mut path = Vec::new();
        let mut cursor = self.nodes.get(index).map(|_| index);
        while let Some(current) = cursor {
            path.push(current);
            cursor = self.nodes[current].parent;
        }
        path.reverse();
        path
    }

    /// Node at `depth` whose interval covers `x`.
    #[must_use]
    pub fn find_at(&self, x: f64, depth: usize) -> Option<usize> {
        let mut candidates: &[usize] = &self.roots;
        loop {
            let hit = candidates.iter().copied().find(|index| {
                let interval = &self.nodes[*index].interval;
                interval.x <= x && x < interval.end()
            })?;
            if self.nodes[hit].depth == depth {
                return Some(hit);
            }
            candidates = &self.nodes[hit].children;
        }
    }

    /// Self time of a node: its duration minus the time covered by children.
    #[must_use]
    pub fn self_time(&self, index: usize) -> Option<f64> {
        let node = self.nodes.get(index)?;
        let children: f64 = node
            .children
            .iter()
            .map(|child| self.nodes[*child].interval.dx)
            .sum();
        Some((node.interval.dx - children).max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::TraceTree;
    use crate::core::types::TraceInterval;

    fn interval(x: f64, dx: f64, name: &str) -> TraceInterval {
        TraceInterval::new(x, dx, name).expect("valid interval")
    }

    #[test]
    fn children_link_to_enclosing_parent() {
        let tree = TraceTree::from_sorted(&[
            interval(0.0, 10.0, "main"),
            interval(0.0, 5.0, "parse"),
            interval(1.0, 2.0, "lex"),
            interval(5.0, 3.0, "eval"),
        ])
        .expect("tree");

        assert_eq!(tree.roots(), &[0]);
        assert_eq!(tree.node(0).expect("root").children, vec![1, 3]);
        assert_eq!(tree.ancestor_path(2), vec![0, 1, 2]);
        assert_eq!(tree.find_at(1.5, 2), Some(2));
        assert_eq!(tree.find_at(6.0, 1), Some(3));
        assert_eq!(tree.find_at(6.0, 2), None);
        assert_eq!(tree.self_time(0), Some(2.0));
    }

    #[test]
    fn unsorted_input_is_rejected() {
        let result = TraceTree::from_sorted(&[interval(5.0, 1.0, "a"), interval(1.0, 1.0, "b")]);
        assert!(result.is_err());
    }
}
