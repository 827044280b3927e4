//! Timetabling problem model.
//!
//! A problem fixes the number of groups, professors and rooms, and the
//! number of meetings each (group, professor) pair needs over the week.
//!
//! # Text format
//!
//! ```text
//! numGroups numProfs numRooms
//! c(1,1) c(1,2) ... c(1,numProfs)
//! ...
//! c(numGroups,1) ...  c(numGroups,numProfs)
//! ```

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::slot::{EntityId, SLOTS_PER_WEEK};
use crate::error::{Result, TimetableError};

/// Which side of the (group, professor) relation an entity is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Group,
    Professor,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Group => write!(f, "group"),
            EntityKind::Professor => write!(f, "professor"),
        }
    }
}

/// Immutable timetabling instance.
///
/// # Example
/// ```
/// use u_timetable::models::Problem;
///
/// let p = Problem::new(2, 3, 1).with_required(1, 2, 4);
/// assert_eq!(p.required(1, 2), 4);
/// assert_eq!(p.total_required(), 4);
/// assert_eq!(p.capacity(), 42);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    num_groups: u32,
    num_profs: u32,
    num_rooms: u32,
    /// Row-major `[group - 1][prof - 1]` meeting counts.
    required: Vec<u32>,
}

impl Problem {
    /// Creates a problem with no required classes.
    pub fn new(num_groups: u32, num_profs: u32, num_rooms: u32) -> Self {
        Self {
            num_groups,
            num_profs,
            num_rooms,
            required: vec![0; num_groups as usize * num_profs as usize],
        }
    }

    /// Builds a problem from a `[group][prof]` count matrix (0-based rows).
    ///
    /// # Panics
    /// If the rows are ragged.
    pub fn from_matrix(num_rooms: u32, rows: Vec<Vec<u32>>) -> Self {
        let num_groups = rows.len() as u32;
        let num_profs = rows.first().map_or(0, |r| r.len()) as u32;
        assert!(
            rows.iter().all(|r| r.len() as u32 == num_profs),
            "ragged requirement matrix"
        );
        Self {
            num_groups,
            num_profs,
            num_rooms,
            required: rows.into_iter().flatten().collect(),
        }
    }

    /// Sets a required count (builder style).
    pub fn with_required(mut self, group: EntityId, prof: EntityId, count: u32) -> Self {
        self.set_required(group, prof, count);
        self
    }

    /// Sets the required meetings for `(group, prof)`.
    pub fn set_required(&mut self, group: EntityId, prof: EntityId, count: u32) {
        let idx = self.index(group, prof);
        self.required[idx] = count;
    }

    /// Required meetings for `(group, prof)`.
    #[inline]
    pub fn required(&self, group: EntityId, prof: EntityId) -> u32 {
        self.required[self.index(group, prof)]
    }

    #[inline]
    fn index(&self, group: EntityId, prof: EntityId) -> usize {
        debug_assert!((1..=self.num_groups).contains(&group));
        debug_assert!((1..=self.num_profs).contains(&prof));
        (group - 1) as usize * self.num_profs as usize + (prof - 1) as usize
    }

    #[inline]
    pub fn num_groups(&self) -> u32 {
        self.num_groups
    }

    #[inline]
    pub fn num_profs(&self) -> u32 {
        self.num_profs
    }

    #[inline]
    pub fn num_rooms(&self) -> u32 {
        self.num_rooms
    }

    /// Group ids, `1..=num_groups`.
    pub fn groups(&self) -> RangeInclusive<EntityId> {
        1..=self.num_groups
    }

    /// Professor ids, `1..=num_profs`.
    pub fn profs(&self) -> RangeInclusive<EntityId> {
        1..=self.num_profs
    }

    /// All `(group, prof, count)` with a non-zero count.
    pub fn demands(&self) -> impl Iterator<Item = (EntityId, EntityId, u32)> + '_ {
        self.groups().flat_map(move |g| {
            self.profs().filter_map(move |p| {
                let count = self.required(g, p);
                (count > 0).then_some((g, p, count))
            })
        })
    }

    /// Total meetings over all pairs.
    pub fn total_required(&self) -> u64 {
        self.required.iter().map(|&c| c as u64).sum()
    }

    /// Room-slots available in a week.
    pub fn capacity(&self) -> u64 {
        self.num_rooms as u64 * SLOTS_PER_WEEK as u64
    }

    /// Weekly meetings of one group, saturating at `u32::MAX`.
    pub fn group_load(&self, group: EntityId) -> u32 {
        self.profs()
            .fold(0u32, |load, p| load.saturating_add(self.required(group, p)))
    }

    /// Weekly meetings of one professor, saturating at `u32::MAX`.
    pub fn prof_load(&self, prof: EntityId) -> u32 {
        self.groups()
            .fold(0u32, |load, g| load.saturating_add(self.required(g, prof)))
    }

    /// Fraction of room-slots the requirements consume.
    pub fn room_utilization(&self) -> f64 {
        let capacity = self.capacity();
        if capacity == 0 {
            return 0.0;
        }
        self.total_required() as f64 / capacity as f64
    }

    /// Parses the problem text format.
    pub fn parse(input: &str) -> Result<Self> {
        let mut tokens = Tokens::new(input);
        let num_groups = tokens.next_positive("numGroups")?;
        let num_profs = tokens.next_positive("numProfs")?;
        let num_rooms = tokens.next_positive("numRooms")?;
        let cells = (num_groups as usize)
            .checked_mul(num_profs as usize)
            .ok_or_else(|| TimetableError::Parse {
                line: 1,
                message: format!("{num_groups} × {num_profs} requirement matrix is too large"),
            })?;

        // grows with the input, so a huge header over a short body fails
        // on the first missing count rather than on allocation
        let mut required = Vec::with_capacity(cells.min(input.len()));
        for g in 1..=num_groups {
            for p in 1..=num_profs {
                required.push(tokens.next_u32(&format!("count for (group={g}, prof={p})"))?);
            }
        }
        Ok(Self {
            num_groups,
            num_profs,
            num_rooms,
            required,
        })
    }
}

impl FromStr for Problem {
    type Err = TimetableError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {} {}", self.num_groups, self.num_profs, self.num_rooms)?;
        for g in self.groups() {
            let row: Vec<String> = self
                .profs()
                .map(|p| self.required(g, p).to_string())
                .collect();
            writeln!(f, "{}", row.join(" "))?;
        }
        Ok(())
    }
}

/// Whitespace tokenizer that remembers line numbers for error reporting.
pub(crate) struct Tokens<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    current: Option<(usize, std::str::SplitWhitespace<'a>)>,
    last_line: usize,
}

impl<'a> Tokens<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self {
            lines: input.lines().enumerate(),
            current: None,
            last_line: 1,
        }
    }

    fn next_token(&mut self) -> Option<(usize, &'a str)> {
        loop {
            if let Some((line, words)) = self.current.as_mut() {
                if let Some(word) = words.next() {
                    return Some((*line, word));
                }
            }
            let (idx, text) = self.lines.next()?;
            self.last_line = idx + 1;
            self.current = Some((idx + 1, text.split_whitespace()));
        }
    }

    pub(crate) fn next_u32(&mut self, what: &str) -> Result<u32> {
        let (line, word) = self.next_token().ok_or_else(|| TimetableError::Parse {
            line: self.last_line,
            message: format!("unexpected end of input, expected {what}"),
        })?;
        word.parse::<u32>().map_err(|_| TimetableError::Parse {
            line,
            message: format!("expected {what}, found '{word}'"),
        })
    }

    fn next_positive(&mut self, what: &str) -> Result<u32> {
        let value = self.next_u32(what)?;
        if value == 0 {
            return Err(TimetableError::Parse {
                line: self.last_line,
                message: format!("{what} must be at least 1"),
            });
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_problem() {
        let p = Problem::parse("2 3 4\n1 0 2\n0 5 0\n").unwrap();
        assert_eq!(p.num_groups(), 2);
        assert_eq!(p.num_profs(), 3);
        assert_eq!(p.num_rooms(), 4);
        assert_eq!(p.required(1, 3), 2);
        assert_eq!(p.required(2, 2), 5);
        assert_eq!(p.total_required(), 8);
        assert_eq!(p.group_load(1), 3);
        assert_eq!(p.prof_load(2), 5);
    }

    #[test]
    fn test_display_round_trips_text_format() {
        let text = "2 3 4\n1 0 2\n0 5 0\n";
        let p: Problem = text.parse().unwrap();
        assert_eq!(p.to_string(), text);
    }

    #[test]
    fn test_parse_truncated() {
        let err = Problem::parse("2 2 1\n1 1\n1").unwrap_err();
        match err {
            TimetableError::Parse { line, message } => {
                assert_eq!(line, 3);
                assert!(message.contains("end of input"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_garbage_and_zero_header() {
        let err = Problem::parse("1 1 1\nx\n").unwrap_err();
        assert!(matches!(err, TimetableError::Parse { line: 2, .. }));

        let err = Problem::parse("0 1 1\n").unwrap_err();
        assert!(matches!(err, TimetableError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_parse_huge_header_fails_cleanly() {
        let err = Problem::parse("70000 70000 1\n1 2 3\n").unwrap_err();
        match err {
            TimetableError::Parse { line, message } => {
                assert_eq!(line, 2);
                assert!(message.starts_with("unexpected end of input"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_loads_saturate() {
        let problem = Problem::parse("1 2 1\n4000000000 4000000000\n").unwrap();
        assert_eq!(problem.group_load(1), u32::MAX);
        assert_eq!(problem.total_required(), 8_000_000_000);
    }

    #[test]
    fn test_demands_skip_zero() {
        let p = Problem::from_matrix(2, vec![vec![0, 3], vec![1, 0]]);
        let demands: Vec<_> = p.demands().collect();
        assert_eq!(demands, vec![(1, 2, 3), (2, 1, 1)]);
    }

    #[test]
    fn test_room_utilization() {
        let p = Problem::new(1, 1, 2).with_required(1, 1, 21);
        assert!((p.room_utilization() - 0.25).abs() < 1e-12);
    }
}
