//! Attribute weight matrix and the maximum spanning tree grown over it.

use tracing::debug;

/// Weight stored on the diagonal. Self-pairs are never scanned as tree edges.
pub const SELF_WEIGHT: f64 = -1.0;

/// Square attribute-by-attribute matrix of edge weights.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightMatrix {
    size: usize,
    data: Vec<f64>,
}

impl WeightMatrix {
    pub fn from_fn<F: FnMut(usize, usize) -> f64>(size: usize, mut f: F) -> Self {
        let mut data = Vec::with_capacity(size * size);
        for i in 0..size {
            for j in 0..size {
                data.push(f(i, j));
            }
        }
        WeightMatrix { size, data }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.size + j]
    }

    /// Largest `|w(i, j) - w(j, i)|` over all off-diagonal pairs.
    pub fn asymmetry(&self) -> f64 {
        let mut worst: f64 = 0.0;
        for i in 0..self.size {
            for j in (i + 1)..self.size {
                worst = worst.max((self.get(i, j) - self.get(j, i)).abs());
            }
        }
        worst
    }
}

/// A directed tree edge; `child` hangs off `parent` with the given weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeEdge {
    pub parent: usize,
    pub child: usize,
    pub weight: f64,
}

/// Parent-pointer tree over attribute indices, rooted at attribute 0.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanningTree {
    parents: Vec<Option<usize>>,
    edges: Vec<TreeEdge>,
}

impl SpanningTree {
    /// Grows a maximum spanning tree with Prim's algorithm from vertex 0.
    ///
    /// Each step scans in-tree vertices in ascending order and, for each,
    /// out-of-tree candidates in ascending order, keeping the first pair
    /// with the strictly largest weight. The root is fixed, so the total
    /// weight is optimal but the edge directions depend on vertex 0.
    pub fn maximum(weights: &WeightMatrix) -> Self {
        let size = weights.len();
        let mut parents = vec![None; size];
        let mut edges = Vec::with_capacity(size.saturating_sub(1));
        if size == 0 {
            return SpanningTree { parents, edges };
        }

        let mut in_tree = vec![false; size];
        in_tree[0] = true;

        while edges.len() + 1 < size {
            let mut best: Option<TreeEdge> = None;
            for parent in (0..size).filter(|&v| in_tree[v]) {
                for child in (0..size).filter(|&v| !in_tree[v]) {
                    let weight = weights.get(parent, child);
                    if best.map_or(true, |edge| weight > edge.weight) {
                        best = Some(TreeEdge {
                            parent,
                            child,
                            weight,
                        });
                    }
                }
            }

            // Some vertex is still outside the tree, so a candidate exists.
            let Some(edge) = best else { break };
            debug!(parent = edge.parent, child = edge.child, weight = edge.weight, "tree edge");
            parents[edge.child] = Some(edge.parent);
            in_tree[edge.child] = true;
            edges.push(edge);
        }

        SpanningTree { parents, edges }
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn root(&self) -> Option<usize> {
        if self.parents.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    pub fn parent(&self, vertex: usize) -> Option<usize> {
        self.parents[vertex]
    }

    pub fn parents(&self) -> &[Option<usize>] {
        &self.parents
    }

    /// Edges in the order they were added.
    pub fn edges(&self) -> &[TreeEdge] {
        &self.edges
    }

    pub fn total_weight(&self) -> f64 {
        self.edges.iter().map(|edge| edge.weight).sum()
    }

    /// Number of parent hops from `vertex` up to the root, or `None` when
    /// the walk does not terminate at the root.
    ///
    /// Every vertex of a tree built by [`SpanningTree::maximum`] has a depth;
    /// callers holding a tree from elsewhere can use this to check that the
    /// parent array is acyclic and connected.
    pub fn depth(&self, vertex: usize) -> Option<usize> {
        let mut current = vertex;
        for hops in 0..self.parents.len() {
            match self.parents[current] {
                None if current == 0 => return Some(hops),
                None => return None,
                Some(parent) => current = parent,
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[&[f64]]) -> WeightMatrix {
        WeightMatrix::from_fn(rows.len(), |i, j| rows[i][j])
    }

    #[test]
    fn empty_and_single_vertex() {
        let empty = SpanningTree::maximum(&matrix(&[]));
        assert!(empty.is_empty());
        assert_eq!(empty.root(), None);

        let single = SpanningTree::maximum(&matrix(&[&[SELF_WEIGHT]]));
        assert_eq!(single.parents(), &[None]);
        assert!(single.edges().is_empty());
    }

    #[test]
    fn picks_heaviest_edges() {
        let weights = matrix(&[
            &[-1.0, 0.1, 0.9, 0.2],
            &[0.1, -1.0, 0.3, 0.8],
            &[0.9, 0.3, -1.0, 0.4],
            &[0.2, 0.8, 0.4, -1.0],
        ]);
        let tree = SpanningTree::maximum(&weights);
        assert_eq!(tree.parents(), &[None, Some(3), Some(0), Some(2)]);
        let order: Vec<usize> = tree.edges().iter().map(|e| e.child).collect();
        assert_eq!(order, vec![2, 3, 1]);
        assert!((tree.total_weight() - 2.1).abs() < 1e-12);
    }

    #[test]
    fn ties_keep_first_found_pair() {
        let weights = matrix(&[
            &[-1.0, 0.5, 0.5],
            &[0.5, -1.0, 0.5],
            &[0.5, 0.5, -1.0],
        ]);
        let tree = SpanningTree::maximum(&weights);
        assert_eq!(tree.parents(), &[None, Some(0), Some(0)]);
    }

    #[test]
    fn non_positive_weights_still_span() {
        let weights = matrix(&[
            &[-1.0, -0.2, 0.0],
            &[-0.2, -1.0, -0.1],
            &[0.0, -0.1, -1.0],
        ]);
        let tree = SpanningTree::maximum(&weights);
        assert_eq!(tree.parents(), &[None, Some(2), Some(0)]);
        for vertex in 0..3 {
            assert!(tree.depth(vertex).is_some());
        }
    }

    #[test]
    fn asymmetry_of_symmetric_matrix_is_zero() {
        let weights = matrix(&[&[-1.0, 0.3], &[0.3, -1.0]]);
        assert_eq!(weights.asymmetry(), 0.0);
        let skewed = matrix(&[&[-1.0, 0.3], &[0.1, -1.0]]);
        assert!((skewed.asymmetry() - 0.2).abs() < 1e-12);
    }
}
