//! Flattening a [`DdgNode`] tree into the packed array encoding used by the
//! fast "encoding-form" Knuth-Yao sampler.

use crate::tree::DdgNode;

/// The packed encoding of a DDG tree: a flat array where a non-negative
/// entry is an offset to recurse into and a negative entry `-(row + 1)` is
/// a terminal outcome for `row`.
///
/// This checks the sign of the slot just fetched (`enc[c + b]`) directly,
/// rather than re-reading `enc` at the new index to test its sign: the
/// latter only works in languages where a negative index wraps around to
/// read from the end of the array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackedEncoding(Vec<isize>);

impl PackedEncoding {
    /// Sample a row index by walking the tree from the root, drawing bits
    /// from `next_bit` (each call must return `0` or `1`) as needed.
    pub fn sample(&self, mut next_bit: impl FnMut() -> u8) -> usize {
        if self.0.len() == 1 {
            // Degenerate single-outcome distribution: enc = [-1], no bits drawn.
            return (-self.0[0] - 1) as usize;
        }
        let mut c: isize = 0;
        loop {
            let b = next_bit();
            let slot = self.0[(c + b as isize) as usize];
            if slot < 0 {
                return (-slot - 1) as usize;
            }
            c = slot;
        }
    }

    /// The raw packed array, for serialization.
    pub fn as_slice(&self) -> &[isize] {
        &self.0
    }

    /// Rebuild a `PackedEncoding` from a previously serialized array.
    pub fn from_raw(raw: Vec<isize>) -> Self {
        Self(raw)
    }

    /// Number of entries in the packed array.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the packed array is empty (never true for a tree built by
    /// [`pack_tree`], but useful for callers round-tripping raw arrays).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Pack `root` into a flat encoding. `l` is the reduced pre-period length:
/// the two children of every node at depth `l` are exactly the slots a
/// `Periodic` node rejoins, so their offsets are recorded as they're
/// written, in the order a depth-first walk encounters them.
pub fn pack_tree(root: &DdgNode, l: u32) -> PackedEncoding {
    let mut enc: Vec<isize> = Vec::new();
    let mut column_l_offsets: Vec<isize> = Vec::new();
    let mut patches: Vec<(usize, usize)> = Vec::new();

    pack_internal(root, 0, l, &mut enc, &mut column_l_offsets, &mut patches);

    for (patch_offset, idx) in patches {
        enc[patch_offset] = column_l_offsets[idx];
    }

    PackedEncoding(enc)
}

/// Packs the two children of `node` (which must be [`DdgNode::Internal`]) at
/// `depth`, returning the offset at which they were written.
fn pack_internal(
    node: &DdgNode,
    depth: u32,
    l: u32,
    enc: &mut Vec<isize>,
    column_l_offsets: &mut Vec<isize>,
    patches: &mut Vec<(usize, usize)>,
) -> isize {
    let (left, right) = match node {
        DdgNode::Internal(left, right) => (left.as_ref(), right.as_ref()),
        _ => unreachable!("pack_internal called on a non-internal node"),
    };

    let base = enc.len();
    enc.push(0);
    enc.push(0);

    if depth == l {
        column_l_offsets.push(base as isize);
        column_l_offsets.push(base as isize + 1);
    }

    let left_slot = pack_child(left, depth + 1, l, enc, column_l_offsets, patches);
    enc[base] = left_slot;
    let right_slot = pack_child(right, depth + 1, l, enc, column_l_offsets, patches);
    enc[base + 1] = right_slot;

    base as isize
}

fn pack_child(
    node: &DdgNode,
    depth: u32,
    l: u32,
    enc: &mut Vec<isize>,
    column_l_offsets: &mut Vec<isize>,
    patches: &mut Vec<(usize, usize)>,
) -> isize {
    match node {
        DdgNode::Leaf(row) => -(*row as isize) - 1,
        DdgNode::Periodic(idx) => {
            let patch_offset = enc.len();
            enc.push(0);
            patches.push((patch_offset, *idx));
            patch_offset as isize
        }
        DdgNode::Internal(..) => pack_internal(node, depth, l, enc, column_l_offsets, patches),
    }
}
