use std::fmt;
use std::ops::{BitOr, BitOrAssign};

const FLAG_COUNT: usize = 6;

/// One independent fact about a method's place in its virtual scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VirtualFlag {
    /// First definition of the slot; no strict ancestor in the scope.
    TopDef,
    /// Redefines an ancestor definition of the same scope.
    Override,
    /// No strict descendant redefines the slot and the subtree below the owner is known.
    Final,
    /// Nearest concrete definition seen by at least one class implementing an interface
    /// that declares the signature.
    Impl,
    /// Serves as the implementation at the point where an interface enters the hierarchy.
    Miranda,
    /// Part of the hierarchy relevant to this definition is external or unknown.
    Escaped,
}

impl VirtualFlag {
    pub const ALL: [VirtualFlag; FLAG_COUNT] = [
        VirtualFlag::TopDef,
        VirtualFlag::Override,
        VirtualFlag::Final,
        VirtualFlag::Impl,
        VirtualFlag::Miranda,
        VirtualFlag::Escaped,
    ];

    fn index(self) -> usize {
        match self {
            VirtualFlag::TopDef => 0,
            VirtualFlag::Override => 1,
            VirtualFlag::Final => 2,
            VirtualFlag::Impl => 3,
            VirtualFlag::Miranda => 4,
            VirtualFlag::Escaped => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VirtualFlag::TopDef => "TOP_DEF",
            VirtualFlag::Override => "OVERRIDE",
            VirtualFlag::Final => "FINAL",
            VirtualFlag::Impl => "IMPL",
            VirtualFlag::Miranda => "MIRANDA",
            VirtualFlag::Escaped => "ESCAPED",
        }
    }
}

impl fmt::Display for VirtualFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of [`VirtualFlag`]s.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct VirtualFlags {
    present: [bool; FLAG_COUNT],
}

impl VirtualFlags {
    pub const fn empty() -> Self {
        Self {
            present: [false; FLAG_COUNT],
        }
    }

    pub fn contains(&self, flag: VirtualFlag) -> bool {
        self.present[flag.index()]
    }

    pub fn insert(&mut self, flag: VirtualFlag) {
        self.present[flag.index()] = true;
    }

    pub fn remove(&mut self, flag: VirtualFlag) {
        self.present[flag.index()] = false;
    }

    pub fn set(&mut self, flag: VirtualFlag, value: bool) {
        self.present[flag.index()] = value;
    }

    pub fn with(mut self, flag: VirtualFlag) -> Self {
        self.insert(flag);
        self
    }

    pub fn is_empty(&self) -> bool {
        !self.present.iter().any(|p| *p)
    }

    pub fn len(&self) -> usize {
        self.present.iter().filter(|p| **p).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = VirtualFlag> + '_ {
        VirtualFlag::ALL
            .into_iter()
            .filter(move |flag| self.contains(*flag))
    }
}

impl fmt::Debug for VirtualFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("(none)");
        }
        for (idx, flag) in self.iter().enumerate() {
            if idx > 0 {
                f.write_str(" | ")?;
            }
            f.write_str(flag.as_str())?;
        }
        Ok(())
    }
}

impl fmt::Display for VirtualFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<VirtualFlag> for VirtualFlags {
    fn from(flag: VirtualFlag) -> Self {
        Self::empty().with(flag)
    }
}

impl FromIterator<VirtualFlag> for VirtualFlags {
    fn from_iter<I: IntoIterator<Item = VirtualFlag>>(iter: I) -> Self {
        let mut flags = Self::empty();
        for flag in iter {
            flags.insert(flag);
        }
        flags
    }
}

impl BitOr for VirtualFlag {
    type Output = VirtualFlags;

    fn bitor(self, rhs: VirtualFlag) -> VirtualFlags {
        VirtualFlags::from(self).with(rhs)
    }
}

impl BitOr<VirtualFlag> for VirtualFlags {
    type Output = VirtualFlags;

    fn bitor(self, rhs: VirtualFlag) -> VirtualFlags {
        self.with(rhs)
    }
}

impl BitOr for VirtualFlags {
    type Output = VirtualFlags;

    fn bitor(self, rhs: VirtualFlags) -> VirtualFlags {
        self.iter().chain(rhs.iter()).collect()
    }
}

impl BitOrAssign<VirtualFlag> for VirtualFlags {
    fn bitor_assign(&mut self, rhs: VirtualFlag) {
        self.insert(rhs);
    }
}
