// src/types.rs

//! Event types shared between the watcher, the batcher and the dispatcher.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::path::PathBuf;
use std::str::FromStr;

/// Filesystem operation bitmask carried by every raw event.
///
/// Single events normally carry exactly one bit, but masks can be combined
/// (e.g. `Op::CREATE | Op::RENAME` is the set of operations that may bring a
/// new directory into existence).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Op(u32);

impl Op {
    pub const CREATE: Op = Op(1);
    pub const WRITE: Op = Op(1 << 1);
    pub const REMOVE: Op = Op(1 << 2);
    pub const RENAME: Op = Op(1 << 3);
    pub const CHMOD: Op = Op(1 << 4);

    /// Every known operation.
    pub const ALL: Op = Op(0b1_1111);

    /// Operations that can make a new directory appear under a watched one.
    pub const DIR_OPS: Op = Op(Self::CREATE.0 | Self::RENAME.0);

    const NAMES: [(Op, &'static str); 5] = [
        (Op::CREATE, "CREATE"),
        (Op::WRITE, "WRITE"),
        (Op::REMOVE, "REMOVE"),
        (Op::RENAME, "RENAME"),
        (Op::CHMOD, "CHMOD"),
    ];

    pub const fn empty() -> Op {
        Op(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn from_bits(bits: u32) -> Op {
        Op(bits & Self::ALL.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when every bit of `other` is set in `self`.
    pub const fn contains(self, other: Op) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when `self` and `other` share at least one bit.
    pub const fn intersects(self, other: Op) -> bool {
        self.0 & other.0 != 0
    }

    /// True when `self` is non-empty and made only of create/rename bits.
    pub const fn is_dir_op(self) -> bool {
        !self.is_empty() && Self::DIR_OPS.contains(self)
    }
}

impl BitOr for Op {
    type Output = Op;

    fn bitor(self, rhs: Op) -> Op {
        Op(self.0 | rhs.0)
    }
}

impl BitOrAssign for Op {
    fn bitor_assign(&mut self, rhs: Op) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Op {
    type Output = Op;

    fn bitand(self, rhs: Op) -> Op {
        Op(self.0 & rhs.0)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let mut first = true;
        for (op, name) in Self::NAMES {
            if self.contains(op) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Op({self})")
    }
}

impl FromStr for Op {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "create" => Ok(Op::CREATE),
            "write" => Ok(Op::WRITE),
            "remove" => Ok(Op::REMOVE),
            "rename" => Ok(Op::RENAME),
            "chmod" => Ok(Op::CHMOD),
            "all" => Ok(Op::ALL),
            other => Err(format!(
                "invalid operation: {other} (expected create, write, remove, rename, chmod or all)"
            )),
        }
    }
}

/// A single filesystem notification as delivered by an event source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub path: PathBuf,
    pub op: Op,
}

impl RawEvent {
    pub fn new(path: impl Into<PathBuf>, op: Op) -> Self {
        Self {
            path: path.into(),
            op,
        }
    }
}

/// Events collected during one coalescing window, in arrival order.
pub type EventBatch = Vec<RawEvent>;
