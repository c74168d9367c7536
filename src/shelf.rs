use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::mem;

use crate::depth::Depth;
use crate::error::ShelfError;
use crate::flip::FlipLedger;
use crate::heap::{Reservation, ReserveHeap};

/// Shared nil sentinel. Slot 0 of the arena holds a black node with no
/// payload; every "no child" / "no parent" link points here.
const NIL: usize = 0;

/// One book record, owned exclusively by its tree node.
///
/// `available == true` implies `borrower` is `None`; a set `borrower`
/// implies `available == false`.
#[derive(Clone, Debug, Default)]
pub struct BookEntry {
    pub id: u32,
    pub title: String,
    pub author: String,
    pub available: bool,
    pub borrower: Option<u32>,
    pub reservations: ReserveHeap,
}

impl BookEntry {
    fn new(id: u32, title: String, author: String, available: bool) -> BookEntry {
        BookEntry {
            id,
            title,
            author,
            available,
            borrower: None,
            reservations: ReserveHeap::default(),
        }
    }
}

#[derive(Clone, Debug)]
struct Node {
    entry: BookEntry,
    black: bool, // store: black or red
    parent: usize,
    left: usize,
    right: usize,
}

impl Node {
    fn nil() -> Node {
        Node {
            entry: Default::default(),
            black: true,
            parent: NIL,
            left: NIL,
            right: NIL,
        }
    }
}

/// How a borrow request was honored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BorrowOutcome {
    /// Book was available and is now held by the patron.
    Borrowed,
    /// Book was held by someone else; a reservation was queued.
    Reserved,
}

/// How a return request was honored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReturnOutcome {
    /// Book came back; when the reservation queue was non-empty it was
    /// handed straight to `allotted` with no intermediate available
    /// state.
    Returned { allotted: Option<u32> },
    /// Caller is not the current borrower, nothing changed.
    NotBorrower,
}

/// Shelf manages a single instance of an in-memory book index using a
/// red-black tree keyed by book id.
///
/// Nodes live in a slot arena addressed by stable indices, with slot 0
/// acting as the shared nil sentinel; parent links are plain indices
/// used only for fixup traversal. Each entry carries its own bounded
/// reservation queue, and a [`FlipLedger`] owned by the shelf keeps
/// the running recoloring count across inserts and deletes.
#[derive(Clone)]
pub struct Shelf {
    name: String,
    nodes: Vec<Node>,
    free: Vec<usize>,
    root: usize,
    n_count: usize, // number of books in the tree.
    clock: u64,     // logical timestamp for reservations.
    ledger: FlipLedger,
}

/// Construction and maintenance API.
impl Shelf {
    /// Create an empty shelf, identified by `name`. Applications can
    /// choose unique names.
    pub fn new<S>(name: S) -> Shelf
    where
        S: AsRef<str>,
    {
        Shelf {
            name: name.as_ref().to_string(),
            nodes: vec![Node::nil()],
            free: Vec::new(),
            root: NIL,
            n_count: 0,
            clock: 0,
            ledger: FlipLedger::new(),
        }
    }

    /// Identify this instance.
    #[inline]
    pub fn id(&self) -> String {
        self.name.clone()
    }

    /// Return number of books in this instance.
    #[inline]
    pub fn len(&self) -> usize {
        self.n_count
    }

    /// Check whether this index is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n_count == 0
    }

    /// Accumulated recoloring count across all inserts and deletes.
    #[inline]
    pub fn flip_count(&self) -> u64 {
        self.ledger.total()
    }
}

/// Write operations on Shelf instance.
impl Shelf {
    /// Add a new book. A duplicate id is a complete no-op, reported as
    /// [`ShelfError::Duplicate`] with no flip accounting.
    pub fn insert(
        &mut self,
        id: u32,
        title: String,
        author: String,
        available: bool,
    ) -> Result<(), ShelfError> {
        let mut parent = NIL;
        let mut cur = self.root;
        while cur != NIL {
            parent = cur;
            cur = match id.cmp(&self.nodes[cur].entry.id) {
                Ordering::Less => self.nodes[cur].left,
                Ordering::Greater => self.nodes[cur].right,
                Ordering::Equal => return Err(ShelfError::Duplicate(id)),
            };
        }

        self.ledger.shift();
        let black = parent == NIL; // new node is red unless it roots the tree.
        self.ledger.seed(id, black);

        let n = self.alloc(BookEntry::new(id, title, author, available), black, parent);
        if parent == NIL {
            self.root = n;
        } else if id < self.nodes[parent].entry.id {
            self.nodes[parent].left = n;
        } else {
            self.nodes[parent].right = n;
        }
        self.fix_insert(n);
        self.n_count += 1;

        let snapshot = self.color_snapshot();
        self.ledger.observe(snapshot);
        Ok(())
    }

    /// Remove a book. Pending reservations are forfeited; their patron
    /// ids come back in queue pop order for the caller's transcript.
    pub fn delete(&mut self, id: u32) -> Result<Vec<u32>, ShelfError> {
        let z = self.lookup(id);
        if z == NIL {
            return Err(ShelfError::NotFound(id));
        }

        self.ledger.shift();
        self.ledger.forget(id);

        let mut y_black = self.nodes[z].black;
        let x;
        if self.nodes[z].left == NIL {
            x = self.nodes[z].right;
            self.transplant(z, x);
        } else if self.nodes[z].right == NIL {
            x = self.nodes[z].left;
            self.transplant(z, x);
        } else {
            // splice out the in-order successor instead.
            let y = self.minimum(self.nodes[z].right);
            y_black = self.nodes[y].black;
            x = self.nodes[y].right;
            if self.nodes[y].parent == z {
                self.nodes[x].parent = y;
            } else {
                self.transplant(y, x);
                let zr = self.nodes[z].right;
                self.nodes[y].right = zr;
                self.nodes[zr].parent = y;
            }
            self.transplant(z, y);
            let zl = self.nodes[z].left;
            self.nodes[y].left = zl;
            self.nodes[zl].parent = y;
            self.nodes[y].black = self.nodes[z].black;
        }
        if y_black {
            self.fix_delete(x);
        }

        let entry = self.release(z);
        self.n_count -= 1;

        let snapshot = self.color_snapshot();
        self.ledger.observe(snapshot);
        Ok(entry.reservations.ordered().iter().map(|r| r.patron).collect())
    }

    /// Borrow a book, or queue a reservation when it is out.
    pub fn borrow(
        &mut self,
        patron: u32,
        id: u32,
        priority: u32,
    ) -> Result<BorrowOutcome, ShelfError> {
        let n = self.lookup(id);
        if n == NIL {
            return Err(ShelfError::NotFound(id));
        }
        if self.nodes[n].entry.available {
            let entry = &mut self.nodes[n].entry;
            entry.available = false;
            entry.borrower = Some(patron);
            return Ok(BorrowOutcome::Borrowed);
        }
        if self.nodes[n].entry.reservations.contains(patron) {
            return Err(ShelfError::AlreadyReserved { patron, book: id });
        }
        let stamp = self.clock;
        self.nodes[n]
            .entry
            .reservations
            .push(Reservation::new(patron, priority, stamp))?;
        self.clock += 1; // ticks only for an accepted reservation.
        Ok(BorrowOutcome::Reserved)
    }

    /// Return a book. A no-op unless `patron` is the current borrower.
    /// With pending reservations the book goes straight to the top
    /// reservation; no intermediate available state is observable.
    pub fn return_book(&mut self, patron: u32, id: u32) -> Result<ReturnOutcome, ShelfError> {
        let n = self.lookup(id);
        if n == NIL {
            return Err(ShelfError::NotFound(id));
        }
        let entry = &mut self.nodes[n].entry;
        if entry.borrower != Some(patron) {
            return Ok(ReturnOutcome::NotBorrower);
        }
        entry.available = true;
        entry.borrower = None;
        match entry.reservations.pop_min() {
            Ok(next) => {
                entry.available = false;
                entry.borrower = Some(next.patron);
                Ok(ReturnOutcome::Returned {
                    allotted: Some(next.patron),
                })
            }
            Err(_) => Ok(ReturnOutcome::Returned { allotted: None }),
        }
    }
}

/// Read operations on Shelf instance.
impl Shelf {
    /// Get the book with exactly this id.
    pub fn find(&self, id: u32) -> Option<&BookEntry> {
        match self.lookup(id) {
            NIL => None,
            n => Some(&self.nodes[n].entry),
        }
    }

    /// All books with `lo <= id <= hi`, ascending by id.
    pub fn range(&self, lo: u32, hi: u32) -> Vec<&BookEntry> {
        let mut acc = Vec::new();
        self.range_walk(self.root, lo, hi, &mut acc);
        acc
    }

    /// All books minimizing `|id - target|`, ascending by id. Ties are
    /// possible and all reported.
    pub fn nearest(&self, target: u32) -> Result<Vec<&BookEntry>, ShelfError> {
        if self.root == NIL {
            return Err(ShelfError::IndexEmpty);
        }
        let mut all = Vec::with_capacity(self.n_count);
        self.range_walk(self.root, u32::MIN, u32::MAX, &mut all);
        let mut best = i64::MAX;
        for entry in &all {
            best = best.min(Self::distance(entry.id, target));
        }
        Ok(all
            .into_iter()
            .filter(|entry| Self::distance(entry.id, target) == best)
            .collect())
    }

    #[inline]
    fn distance(id: u32, target: u32) -> i64 {
        (i64::from(id) - i64::from(target)).abs()
    }

    fn range_walk<'a>(&'a self, n: usize, lo: u32, hi: u32, acc: &mut Vec<&'a BookEntry>) {
        if n == NIL {
            return;
        }
        let node = &self.nodes[n];
        if node.entry.id > lo {
            self.range_walk(node.left, lo, hi, acc);
        }
        if node.entry.id >= lo && node.entry.id <= hi {
            acc.push(&node.entry);
        }
        if node.entry.id < hi {
            self.range_walk(node.right, lo, hi, acc);
        }
    }
}

/// Validation API.
impl Shelf {
    /// Validate the tree with the red-black rules:
    ///
    /// * Root is black.
    /// * From root to any leaf, no consecutive reds in the path.
    /// * Number of blacks should be same under left and right child.
    /// * Keys are in sort order, child nodes point back at parents.
    ///
    /// Additionally return [`Stats`] with leaf-depth figures.
    pub fn validate(&self) -> Result<Stats, ShelfError> {
        if self.is_red(self.root) {
            return Err(ShelfError::ConsecutiveReds);
        }
        let mut stats = Stats {
            entries: self.n_count,
            blacks: None,
            depths: Depth::default(),
        };
        let blacks = self.validate_tree(self.root, false, 0, 0, &mut stats)?;
        stats.blacks = Some(blacks);
        Ok(stats)
    }

    fn validate_tree(
        &self,
        n: usize,
        fromred: bool,
        mut nb: usize,
        depth: usize,
        stats: &mut Stats,
    ) -> Result<usize, ShelfError> {
        if n == NIL {
            stats.depths.sample(depth);
            return Ok(nb);
        }

        let red = self.is_red(n);
        if fromred && red {
            return Err(ShelfError::ConsecutiveReds);
        }
        if !red {
            nb += 1;
        }
        let node = &self.nodes[n];
        if node.left != NIL {
            let left = &self.nodes[node.left];
            if left.entry.id >= node.entry.id {
                return Err(ShelfError::SortError(left.entry.id, node.entry.id));
            }
            if left.parent != n {
                return Err(ShelfError::BrokenParentLink(left.entry.id));
            }
        }
        if node.right != NIL {
            let right = &self.nodes[node.right];
            if right.entry.id <= node.entry.id {
                return Err(ShelfError::SortError(right.entry.id, node.entry.id));
            }
            if right.parent != n {
                return Err(ShelfError::BrokenParentLink(right.entry.id));
            }
        }
        let lblacks = self.validate_tree(node.left, red, nb, depth + 1, stats)?;
        let rblacks = self.validate_tree(node.right, red, nb, depth + 1, stats)?;
        if lblacks != rblacks {
            let err = format!("left: {} right: {}", lblacks, rblacks);
            return Err(ShelfError::UnbalancedBlacks(err));
        }
        Ok(lblacks)
    }
}

/// Arena and rebalancing internals.
impl Shelf {
    #[inline]
    fn is_red(&self, n: usize) -> bool {
        n != NIL && !self.nodes[n].black
    }

    fn lookup(&self, id: u32) -> usize {
        let mut n = self.root;
        while n != NIL {
            n = match id.cmp(&self.nodes[n].entry.id) {
                Ordering::Less => self.nodes[n].left,
                Ordering::Greater => self.nodes[n].right,
                Ordering::Equal => return n,
            };
        }
        NIL
    }

    fn minimum(&self, mut n: usize) -> usize {
        while self.nodes[n].left != NIL {
            n = self.nodes[n].left;
        }
        n
    }

    fn alloc(&mut self, entry: BookEntry, black: bool, parent: usize) -> usize {
        let node = Node {
            entry,
            black,
            parent,
            left: NIL,
            right: NIL,
        };
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, n: usize) -> BookEntry {
        let node = mem::replace(&mut self.nodes[n], Node::nil());
        self.free.push(n);
        node.entry
    }

    /// In-order `id -> color` map for the flip ledger.
    fn color_snapshot(&self) -> BTreeMap<u32, bool> {
        let mut snap = BTreeMap::new();
        self.snapshot_walk(self.root, &mut snap);
        snap
    }

    fn snapshot_walk(&self, n: usize, snap: &mut BTreeMap<u32, bool>) {
        if n == NIL {
            return;
        }
        self.snapshot_walk(self.nodes[n].left, snap);
        snap.insert(self.nodes[n].entry.id, self.nodes[n].black);
        self.snapshot_walk(self.nodes[n].right, snap);
    }

    /// Rewire `x` down-left, lifting its right child. Handles the root
    /// case through the sentinel parent check.
    fn rotate_left(&mut self, x: usize) {
        let y = self.nodes[x].right;
        let yl = self.nodes[y].left;
        self.nodes[x].right = yl;
        if yl != NIL {
            self.nodes[yl].parent = x;
        }
        let xp = self.nodes[x].parent;
        self.nodes[y].parent = xp;
        if xp == NIL {
            self.root = y;
        } else if self.nodes[xp].left == x {
            self.nodes[xp].left = y;
        } else {
            self.nodes[xp].right = y;
        }
        self.nodes[y].left = x;
        self.nodes[x].parent = y;
    }

    fn rotate_right(&mut self, x: usize) {
        let y = self.nodes[x].left;
        let yr = self.nodes[y].right;
        self.nodes[x].left = yr;
        if yr != NIL {
            self.nodes[yr].parent = x;
        }
        let xp = self.nodes[x].parent;
        self.nodes[y].parent = xp;
        if xp == NIL {
            self.root = y;
        } else if self.nodes[xp].left == x {
            self.nodes[xp].left = y;
        } else {
            self.nodes[xp].right = y;
        }
        self.nodes[y].right = x;
        self.nodes[x].parent = y;
    }

    /// Replace the subtree at `u` with the one at `v`. Writing the
    /// sentinel's parent when `v` is nil is intentional; fix_delete
    /// reads it back before anything else can touch it.
    fn transplant(&mut self, u: usize, v: usize) {
        let up = self.nodes[u].parent;
        if up == NIL {
            self.root = v;
        } else if self.nodes[up].left == u {
            self.nodes[up].left = v;
        } else {
            self.nodes[up].right = v;
        }
        self.nodes[v].parent = up;
    }

    fn fix_insert(&mut self, mut x: usize) {
        while self.is_red(self.nodes[x].parent) {
            let p = self.nodes[x].parent;
            let g = self.nodes[p].parent;
            if p == self.nodes[g].left {
                let u = self.nodes[g].right;
                if self.is_red(u) {
                    // red uncle: recolor and move up.
                    self.nodes[p].black = true;
                    self.nodes[u].black = true;
                    self.nodes[g].black = false;
                    x = g;
                } else {
                    let x_at = if x == self.nodes[p].right {
                        // inner child: rotate to outer first.
                        self.rotate_left(p);
                        p
                    } else {
                        x
                    };
                    let p = self.nodes[x_at].parent;
                    let g = self.nodes[p].parent;
                    self.nodes[p].black = true;
                    self.nodes[g].black = false;
                    self.rotate_right(g);
                    x = x_at;
                }
            } else {
                let u = self.nodes[g].left;
                if self.is_red(u) {
                    self.nodes[p].black = true;
                    self.nodes[u].black = true;
                    self.nodes[g].black = false;
                    x = g;
                } else {
                    let x_at = if x == self.nodes[p].left {
                        self.rotate_right(p);
                        p
                    } else {
                        x
                    };
                    let p = self.nodes[x_at].parent;
                    let g = self.nodes[p].parent;
                    self.nodes[p].black = true;
                    self.nodes[g].black = false;
                    self.rotate_left(g);
                    x = x_at;
                }
            }
        }
        let root = self.root;
        self.nodes[root].black = true;
    }

    fn fix_delete(&mut self, mut x: usize) {
        while x != self.root && !self.is_red(x) {
            let p = self.nodes[x].parent;
            if x == self.nodes[p].left {
                let mut w = self.nodes[p].right;
                if self.is_red(w) {
                    // red sibling: rotate into a black-sibling case.
                    self.nodes[w].black = true;
                    self.nodes[p].black = false;
                    self.rotate_left(p);
                    w = self.nodes[p].right;
                }
                if !self.is_red(self.nodes[w].left) && !self.is_red(self.nodes[w].right) {
                    // both nephews black: push the deficit upward.
                    self.nodes[w].black = false;
                    x = p;
                } else {
                    if !self.is_red(self.nodes[w].right) {
                        // near nephew red, far black.
                        let wl = self.nodes[w].left;
                        self.nodes[wl].black = true;
                        self.nodes[w].black = false;
                        self.rotate_right(w);
                        w = self.nodes[p].right;
                    }
                    self.nodes[w].black = self.nodes[p].black;
                    self.nodes[p].black = true;
                    let wr = self.nodes[w].right;
                    self.nodes[wr].black = true;
                    self.rotate_left(p);
                    x = self.root;
                }
            } else {
                let mut w = self.nodes[p].left;
                if self.is_red(w) {
                    self.nodes[w].black = true;
                    self.nodes[p].black = false;
                    self.rotate_right(p);
                    w = self.nodes[p].left;
                }
                if !self.is_red(self.nodes[w].right) && !self.is_red(self.nodes[w].left) {
                    self.nodes[w].black = false;
                    x = p;
                } else {
                    if !self.is_red(self.nodes[w].left) {
                        let wr = self.nodes[w].right;
                        self.nodes[wr].black = true;
                        self.nodes[w].black = false;
                        self.rotate_left(w);
                        w = self.nodes[p].left;
                    }
                    self.nodes[w].black = self.nodes[p].black;
                    self.nodes[p].black = true;
                    let wl = self.nodes[w].left;
                    self.nodes[wl].black = true;
                    self.rotate_right(p);
                    x = self.root;
                }
            }
        }
        self.nodes[x].black = true;
    }
}

/// Statistics returned by [`Shelf::validate`].
#[derive(Debug, Default)]
pub struct Stats {
    entries: usize,
    blacks: Option<usize>,
    depths: Depth,
}

impl Stats {
    /// Number of books in the index.
    #[inline]
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Black node count on every root-to-nil path.
    #[inline]
    pub fn blacks(&self) -> Option<usize> {
        self.blacks
    }

    /// Leaf-depth figures gathered during validation.
    pub fn depths(&self) -> &Depth {
        &self.depths
    }
}
