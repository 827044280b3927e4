//! Balanced edge coloring of the (group, prof) meeting multigraph.
//!
//! Every meeting is an edge between a group and a professor; a color is a
//! slot of the week. A proper coloring puts no entity twice in one slot,
//! and a balanced one puts at most `rooms` meetings in each slot.
//!
//! # Algorithm
//!
//! 1. Insert edges one by one (König). For edge (g, p) take a color `a`
//!    free at `g` and `b` free at `p`. If neither is free at both ends,
//!    swap `a`/`b` along the alternating path leaving `p`, which frees `a`
//!    at `p`.
//! 2. Balance (de Werra). While the largest color class exceeds `rooms`,
//!    find an alternating path of the largest and smallest class that
//!    starts and ends on the larger one, and swap it. Each swap moves one
//!    edge from the largest to the smallest class.
//!
//! Both steps succeed whenever every entity has at most 42 meetings and
//! the total is at most `42 · rooms`.
//!
//! # Complexity
//! O(E · V) for insertion and O(E · V²) worst case for balancing, where E
//! is the number of meetings and V the number of entities.
//!
//! # References
//! - König (1916), "Über Graphen und ihre Anwendung auf Determinantentheorie"
//! - de Werra (1971), "Equitable colorations of graphs"

use crate::models::{EntityId, SLOTS_PER_WEEK};

const COLORS: usize = SLOTS_PER_WEEK as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Group,
    Prof,
}

/// Color tables: `group[g][c]` is the professor `g` meets in color `c`,
/// `prof[p][c]` the group; 0 means free.
#[derive(Debug)]
struct Coloring {
    group: Vec<[EntityId; COLORS]>,
    prof: Vec<[EntityId; COLORS]>,
    sizes: [usize; COLORS],
}

impl Coloring {
    fn new(num_groups: u32, num_profs: u32) -> Self {
        Self {
            group: vec![[0; COLORS]; num_groups as usize + 1],
            prof: vec![[0; COLORS]; num_profs as usize + 1],
            sizes: [0; COLORS],
        }
    }

    fn neighbor(&self, side: Side, id: EntityId, color: usize) -> EntityId {
        match side {
            Side::Group => self.group[id as usize][color],
            Side::Prof => self.prof[id as usize][color],
        }
    }

    fn free_color(row: &[EntityId; COLORS]) -> Option<usize> {
        row.iter().position(|&other| other == 0)
    }

    fn set(&mut self, group: EntityId, prof: EntityId, color: usize) {
        self.group[group as usize][color] = prof;
        self.prof[prof as usize][color] = group;
        self.sizes[color] += 1;
    }

    fn unset(&mut self, group: EntityId, prof: EntityId, color: usize) {
        self.group[group as usize][color] = 0;
        self.prof[prof as usize][color] = 0;
        self.sizes[color] -= 1;
    }

    /// Maximal path leaving `id` alternating `first`, `second`, `first`...
    ///
    /// `id` must miss `second`, which makes the component a path.
    fn alternating_path(
        &self,
        side: Side,
        id: EntityId,
        first: usize,
        second: usize,
    ) -> Vec<(EntityId, EntityId, usize)> {
        let mut path = Vec::new();
        let (mut side, mut id, mut color) = (side, id, first);
        loop {
            let other = self.neighbor(side, id, color);
            if other == 0 {
                return path;
            }
            let (next, edge) = match side {
                Side::Group => (Side::Prof, (id, other, color)),
                Side::Prof => (Side::Group, (other, id, color)),
            };
            path.push(edge);
            side = next;
            id = other;
            color = if color == first { second } else { first };
        }
    }

    fn swap(&mut self, path: &[(EntityId, EntityId, usize)], a: usize, b: usize) {
        for &(g, p, color) in path {
            self.unset(g, p, color);
        }
        for &(g, p, color) in path {
            self.set(g, p, if color == a { b } else { a });
        }
    }

    fn insert(&mut self, group: EntityId, prof: EntityId) -> Option<()> {
        let a = Self::free_color(&self.group[group as usize])?;
        let b = Self::free_color(&self.prof[prof as usize])?;
        if self.group[group as usize][b] == 0 {
            self.set(group, prof, b);
            return Some(());
        }
        if self.prof[prof as usize][a] != 0 {
            // `prof` misses b, so its a/b component is a path that never
            // reaches `group` (which misses a).
            let path = self.alternating_path(Side::Prof, prof, a, b);
            self.swap(&path, a, b);
        }
        self.set(group, prof, a);
        Some(())
    }

    /// Moves one edge from `large` to `small`; `false` if no path qualifies.
    fn shift(&mut self, large: usize, small: usize) -> bool {
        let starts = (1..self.group.len())
            .map(|g| (Side::Group, g as EntityId))
            .chain((1..self.prof.len()).map(|p| (Side::Prof, p as EntityId)));
        for (side, id) in starts {
            if self.neighbor(side, id, large) == 0 || self.neighbor(side, id, small) != 0 {
                continue;
            }
            let path = self.alternating_path(side, id, large, small);
            if path.len() % 2 == 1 {
                self.swap(&path, large, small);
                return true;
            }
        }
        false
    }

    fn balance(&mut self, rooms: usize) -> Option<()> {
        loop {
            let (large, &max) = self.sizes.iter().enumerate().max_by_key(|&(_, &n)| n)?;
            if max <= rooms {
                return Some(());
            }
            let (small, _) = self.sizes.iter().enumerate().min_by_key(|&(_, &n)| n)?;
            if !self.shift(large, small) {
                return None;
            }
        }
    }

    fn into_classes(self) -> Vec<Vec<(EntityId, EntityId)>> {
        let mut classes = vec![Vec::new(); COLORS];
        for (g, row) in self.group.iter().enumerate().skip(1) {
            for (color, &p) in row.iter().enumerate() {
                if p != 0 {
                    classes[color].push((g as EntityId, p));
                }
            }
        }
        classes
    }
}

/// Splits `meetings` into one class per slot of the week, each holding at
/// most `rooms` meetings with no group or professor repeated.
///
/// Returns `None` if an entity has more meetings than the week has slots
/// or the total exceeds `rooms` per slot.
pub(crate) fn color_classes<I>(
    num_groups: u32,
    num_profs: u32,
    rooms: u32,
    meetings: I,
) -> Option<Vec<Vec<(EntityId, EntityId)>>>
where
    I: IntoIterator<Item = (EntityId, EntityId)>,
{
    let mut coloring = Coloring::new(num_groups, num_profs);
    for (group, prof) in meetings {
        coloring.insert(group, prof)?;
    }
    coloring.balance(rooms as usize)?;
    Some(coloring.into_classes())
}
