//! Convex hull hash, the supporting structure used only during the
//! Delaunay stage: a circular doubly-linked list over hull vertices plus
//! a pseudoangle-bucket hash table for fast visible-edge lookup.
//!
//! Deletion from the hull is soft: a removed vertex `v` is marked by
//! setting `next[v] = v`, so stale hash entries are skipped rather than
//! eagerly cleaned up.

use crate::kernel::Kernel;

pub(crate) struct Hull {
    pub prev: Vec<usize>,
    pub next: Vec<usize>,
    /// Incident halfedge for each hull vertex.
    pub tri: Vec<usize>,
    /// Pseudoangle-bucket hash table; `-1` marks an empty bucket.
    pub hash: Vec<isize>,
    pub hash_size: usize,
    pub start: usize,
    pub size: usize,
    pub center: (f64, f64),
    /// Bounded fixed-size stack for legalize's flip recursion, capped at
    /// `min(3*maxTriangles, 512)`.
    pub edge_stack: Vec<usize>,
}

impl Hull {
    pub fn new(n: usize, center: (f64, f64), max_triangles: usize) -> Self {
        let hash_size = (n as f64).sqrt().ceil() as usize;
        let cap = (3 * max_triangles).min(512).max(1);
        Hull {
            prev: vec![0; n],
            next: vec![0; n],
            tri: vec![0; n],
            hash: vec![-1; hash_size.max(1)],
            hash_size: hash_size.max(1),
            start: 0,
            size: 0,
            center,
            edge_stack: vec![0; cap],
        }
    }

    pub fn hash_key<K: Kernel>(&self, p: K::Point) -> usize {
        K::hash_key(p, self.center, self.hash_size)
    }

    pub fn hash_insert<K: Kernel>(&mut self, p: K::Point, v: usize) {
        let key = self.hash_key::<K>(p);
        self.hash[key] = v as isize;
    }

    pub fn seed(&mut self, i0: usize, i1: usize, i2: usize) {
        self.next[i0] = i1;
        self.next[i1] = i2;
        self.next[i2] = i0;

        self.prev[i0] = i2;
        self.prev[i1] = i0;
        self.prev[i2] = i1;

        self.tri[i0] = 0;
        self.tri[i1] = 1;
        self.tri[i2] = 2;

        self.start = i0;
        self.size = 3;
    }

    /// Starting at bucket `hashkey(p)`, probe forward until a live hull
    /// vertex is found. A vertex is "live" if it has not been
    /// soft-deleted (`next[v] != v`).
    pub fn find_live_start(&self, key: usize) -> usize {
        for j in 0..self.hash_size {
            let idx = (key + j) % self.hash_size;
            let candidate = self.hash[idx];
            if candidate >= 0 {
                let candidate = candidate as usize;
                if self.next[candidate] != candidate {
                    return candidate;
                }
            }
        }
        // Degenerate: every hashed entry was soft-deleted. Fall back to
        // the current hull start, which is always live.
        self.start
    }
}
