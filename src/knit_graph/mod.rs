//! Knit Graph
//!
//! Arena of every loop made while simulating a program, with the stitch
//! edges between loops and the order in which each yarn segment made them.
//! Needles refer to loops only by [`LoopId`].

mod yarn;

pub use yarn::YarnId;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MachineError, Result};

/// Index of a loop in the knit graph arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LoopId(pub usize);

impl fmt::Display for LoopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Side from which a child loop is pulled through its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PullDirection {
    BackToFront,
    FrontToBack,
}

impl PullDirection {
    pub fn opposite(self) -> Self {
        match self {
            PullDirection::BackToFront => PullDirection::FrontToBack,
            PullDirection::FrontToBack => PullDirection::BackToFront,
        }
    }
}

impl fmt::Display for PullDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PullDirection::BackToFront => write!(f, "BtF"),
            PullDirection::FrontToBack => write!(f, "FtB"),
        }
    }
}

/// Parent to child stitch edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StitchEdge {
    pub parent: LoopId,
    pub child: LoopId,
    pub pull_direction: PullDirection,
}

/// A single loop (stitch) in the knit graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loop {
    pub id: LoopId,
    /// Yarn segment the loop was made from
    pub yarn: YarnId,
    /// Loop made just before this one on the same yarn segment
    pub prior_on_yarn: Option<LoopId>,
    /// Loops this loop was pulled through
    pub parents: Vec<StitchEdge>,
    /// Loops pulled through this loop
    pub children: Vec<StitchEdge>,
}

impl Loop {
    pub fn parent_ids(&self) -> impl Iterator<Item = LoopId> + '_ {
        self.parents.iter().map(|edge| edge.parent)
    }

    pub fn child_ids(&self) -> impl Iterator<Item = LoopId> + '_ {
        self.children.iter().map(|edge| edge.child)
    }
}

/// Stitch topology produced by machine operations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnitGraph {
    loops: Vec<Loop>,
    yarn_loops: BTreeMap<YarnId, Vec<LoopId>>,
}

impl KnitGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new loop at the end of `yarn`
    pub fn new_loop(&mut self, yarn: YarnId) -> LoopId {
        let id = LoopId(self.loops.len());
        let on_yarn = self.yarn_loops.entry(yarn).or_default();
        let prior_on_yarn = on_yarn.last().copied();
        on_yarn.push(id);
        self.loops.push(Loop {
            id,
            yarn,
            prior_on_yarn,
            parents: Vec::new(),
            children: Vec::new(),
        });
        id
    }

    /// Record that `child` was pulled through `parent`
    pub fn connect(
        &mut self,
        parent: LoopId,
        child: LoopId,
        pull_direction: PullDirection,
    ) -> Result<()> {
        self.check(parent)?;
        self.check(child)?;
        let edge = StitchEdge {
            parent,
            child,
            pull_direction,
        };
        self.loops[parent.0].children.push(edge);
        self.loops[child.0].parents.push(edge);
        Ok(())
    }

    fn check(&self, id: LoopId) -> Result<()> {
        if id.0 < self.loops.len() {
            Ok(())
        } else {
            Err(MachineError::UnknownLoop { loop_id: id })
        }
    }

    /// Look up a loop by id
    pub fn get(&self, id: LoopId) -> Option<&Loop> {
        self.loops.get(id.0)
    }

    pub fn contains(&self, id: LoopId) -> bool {
        id.0 < self.loops.len()
    }

    /// Number of loops ever made
    pub fn loop_count(&self) -> usize {
        self.loops.len()
    }

    /// Number of stitch edges
    pub fn stitch_count(&self) -> usize {
        self.loops.iter().map(|l| l.parents.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    /// Iterate over loops in creation order
    pub fn loops(&self) -> impl Iterator<Item = &Loop> {
        self.loops.iter()
    }

    /// Loops made from a yarn segment, in order
    pub fn yarn_loops(&self, yarn: YarnId) -> &[LoopId] {
        self.yarn_loops
            .get(&yarn)
            .map(|loops| loops.as_slice())
            .unwrap_or(&[])
    }

    /// Yarn segments that made at least one loop
    pub fn yarns(&self) -> impl Iterator<Item = YarnId> + '_ {
        self.yarn_loops.keys().copied()
    }
}
