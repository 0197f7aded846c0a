//! Construction of the Knuth-Yao DDG tree from a [`DdgMatrix`], including the
//! periodic back-edge needed whenever `l < k`.

use crate::matrix::{hamming_matrix, DdgMatrix};

/// A node of the Knuth-Yao DDG tree.
///
/// `Periodic` is never a literal self-reference: it names the index, among
/// the slots that enter column `l`, that this branch's walk rejoins. The
/// tree itself stays a plain acyclic owned structure; the repetition is
/// resolved to a real shared offset only when the tree is packed, in
/// `crate::packing`.
#[derive(Clone, Debug)]
pub enum DdgNode {
    /// A terminal outcome, by row index into the distribution.
    Leaf(usize),
    /// An internal node: its two children are visited on the next random bit.
    Internal(Box<DdgNode>, Box<DdgNode>),
    /// Rejoins the walk at the `idx`-th slot entering column `l`.
    Periodic(usize),
}

/// Build the DDG tree for matrix `p`, reduced to `(k, l)`.
///
/// `p` must already be the reduced matrix returned by
/// [`crate::matrix::make_ddg_matrix`] for this `(k, l)`; the matrix is
/// walked column by column from the last column back to the first, since a
/// node can only be built once both of its children exist.
pub fn make_ddg_tree(p: &DdgMatrix, l: u32) -> DdgNode {
    let k = p.k();
    debug_assert!(k >= 1, "a one-column matrix has nothing to branch on");
    let leaves_by_col = hamming_matrix(p);

    // open[j]: number of slots entering column j, i.e. still unresolved
    // after columns 0..j. open[0] = 2, the root's two children.
    let mut open = vec![2u32];
    for j in 0..k as usize {
        let h = leaves_by_col[j].len() as u32;
        open.push(2 * (open[j] - h));
    }

    let tail = open[k as usize];
    if l < k {
        debug_assert_eq!(
            tail, open[l as usize],
            "periodic tail must re-enter column l with the same slot count it left with"
        );
    } else {
        debug_assert_eq!(tail, 0, "a dyadic (l == k) matrix must fully resolve by the last column");
    }

    // The virtual "column k" is the periodic tail's target: `tail` slots
    // that, once paired into column k-1's internal nodes, rejoin column l.
    let mut next_column: Vec<DdgNode> = (0..tail as usize).map(DdgNode::Periodic).collect();
    for j in (0..k as usize).rev() {
        let continuing = pair_up(next_column);
        next_column = leaves_then(&leaves_by_col[j], continuing);
    }

    debug_assert_eq!(next_column.len(), 2, "column 0 must have exactly two entering slots");
    let mut it = next_column.into_iter();
    DdgNode::Internal(Box::new(it.next().unwrap()), Box::new(it.next().unwrap()))
}

/// The slots entering a column: leaves first (order doesn't affect the
/// resulting distribution, since every slot at a given column is
/// equiprobable), then whatever continues on to the next column.
fn leaves_then(rows: &[usize], continuing: Vec<DdgNode>) -> Vec<DdgNode> {
    rows.iter()
        .map(|&row| DdgNode::Leaf(row))
        .chain(continuing)
        .collect()
}

/// Groups consecutive pairs of slots into the internal nodes that will
/// receive them as children.
fn pair_up(nodes: Vec<DdgNode>) -> Vec<DdgNode> {
    let mut it = nodes.into_iter();
    let mut out = Vec::with_capacity(it.len() / 2);
    while let (Some(a), Some(b)) = (it.next(), it.next()) {
        out.push(DdgNode::Internal(Box::new(a), Box::new(b)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;

    use crate::matrix::make_ddg_matrix;

    fn outcome_of(node: &DdgNode, bits: &[u8]) -> usize {
        let DdgNode::Internal(left, right) = node else {
            panic!("root must be internal")
        };
        let mut cur = if bits[0] == 0 { left.as_ref() } else { right.as_ref() };
        let mut i = 1;
        loop {
            match cur {
                DdgNode::Leaf(row) => return *row,
                DdgNode::Internal(l, r) => {
                    cur = if bits[i] == 0 { l.as_ref() } else { r.as_ref() };
                    i += 1;
                }
                DdgNode::Periodic(_) => panic!("hit periodic node without resolving it"),
            }
        }
    }

    #[test]
    fn two_thirds_one_third_walks_terminate_on_short_bitstrings() {
        let ms = vec![BigUint::from(1u32), BigUint::from(2u32)];
        let (matrix, k, l) = make_ddg_matrix(&ms, 2, 0).unwrap();
        let tree = make_ddg_tree(&matrix, l);
        assert_eq!(k, 2);
        for a in [0u8, 1] {
            for b in [0u8, 1] {
                let row = outcome_of(&tree, &[a, b]);
                assert!(row == 0 || row == 1);
            }
        }
    }
}
