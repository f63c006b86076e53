//! Bounding Volume Hierarchy for rectangle queries
//!
//! Provides O(log n) region queries using a binary BVH over 2D rectangles.

use penumbra_math::{Rect, Vec2};

/// BVH node internal representation
#[derive(Clone, Debug)]
struct BvhNode {
    /// Bounding rectangle for this node
    bounds: Rect,
    /// Item payload (only for leaf nodes)
    item: Option<usize>,
    /// Left child index
    left: Option<usize>,
    /// Right child index
    right: Option<usize>,
}

/// Bounding Volume Hierarchy over `(item, bounds)` pairs
#[derive(Clone, Debug, Default)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    root: Option<usize>,
}

impl Bvh {
    /// Create a new empty BVH
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from items and their bounds
    pub fn build(&mut self, items: &[(usize, Rect)]) {
        self.nodes.clear();

        if items.is_empty() {
            self.root = None;
            return;
        }

        let mut items: Vec<_> = items
            .iter()
            .map(|(i, b)| (*i, *b, b.center()))
            .collect();

        self.root = Some(self.build_recursive(&mut items));
    }

    fn build_recursive(&mut self, items: &mut [(usize, Rect, Vec2)]) -> usize {
        let node_index = self.nodes.len();

        if items.len() == 1 {
            self.nodes.push(BvhNode {
                bounds: items[0].1,
                item: Some(items[0].0),
                left: None,
                right: None,
            });
            return node_index;
        }

        let bounds = items
            .iter()
            .fold(Rect::EMPTY, |acc, (_, b, _)| acc.union(b));

        // Split along the larger extent
        let split_x = bounds.width() > bounds.height();
        items.sort_by(|a, b| {
            let (ca, cb) = if split_x { (a.2.x, b.2.x) } else { (a.2.y, b.2.y) };
            ca.partial_cmp(&cb).unwrap_or(core::cmp::Ordering::Equal)
        });

        let mid = items.len() / 2;
        let (left_items, right_items) = items.split_at_mut(mid);

        // Reserve the slot, children are appended after it
        self.nodes.push(BvhNode {
            bounds,
            item: None,
            left: None,
            right: None,
        });

        let left = self.build_recursive(left_items);
        let right = self.build_recursive(right_items);

        self.nodes[node_index].left = Some(left);
        self.nodes[node_index].right = Some(right);

        node_index
    }

    /// Append items whose bounds intersect `query`
    pub fn query_rect(&self, query: &Rect, results: &mut Vec<usize>) {
        if let Some(root) = self.root {
            self.query_rect_recursive(root, query, results);
        }
    }

    fn query_rect_recursive(&self, node_idx: usize, query: &Rect, results: &mut Vec<usize>) {
        let node = &self.nodes[node_idx];

        if !node.bounds.intersects(query) {
            return;
        }

        if let Some(item) = node.item {
            results.push(item);
        }

        if let Some(left) = node.left {
            self.query_rect_recursive(left, query, results);
        }
        if let Some(right) = node.right {
            self.query_rect_recursive(right, query, results);
        }
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::from_position_size(Vec2::new(x, y), Vec2::new(w, h))
    }

    #[test]
    fn test_bvh_empty() {
        let mut bvh = Bvh::new();
        bvh.build(&[]);
        assert!(bvh.is_empty());
        let mut hits = Vec::new();
        bvh.query_rect(&rect(0.0, 0.0, 10.0, 10.0), &mut hits);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_bvh_query_rect() {
        let mut bvh = Bvh::new();
        bvh.build(&[
            (0, rect(0.0, 0.0, 10.0, 10.0)),
            (1, rect(100.0, 0.0, 10.0, 10.0)),
            (2, rect(0.0, 100.0, 10.0, 10.0)),
            (3, rect(105.0, 5.0, 10.0, 10.0)),
        ]);

        let mut hits = Vec::new();
        bvh.query_rect(&rect(95.0, -5.0, 30.0, 30.0), &mut hits);
        hits.sort_unstable();
        assert_eq!(hits, vec![1, 3]);
    }

    #[test]
    fn test_bvh_rebuild_replaces_items() {
        let mut bvh = Bvh::new();
        bvh.build(&[(0, rect(0.0, 0.0, 1.0, 1.0)), (1, rect(50.0, 0.0, 1.0, 1.0))]);
        assert_eq!(bvh.node_count(), 3);
        bvh.build(&[(7, rect(0.0, 0.0, 1.0, 1.0))]);
        assert_eq!(bvh.node_count(), 1);

        let mut hits = Vec::new();
        bvh.query_rect(&rect(-1.0, -1.0, 100.0, 3.0), &mut hits);
        assert_eq!(hits, vec![7]);
    }
}
