use std::fmt;

/// Locally assigned primary key of a proxy inside an `EntityManager`.
///
/// Taken once from the foreign object's reported entity id when the proxy
/// is built, or generated for staged entries. Never changes afterwards.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque, identity-only reference to one object owned by the foreign runtime.
///
/// Minted by the runtime binding. Two handles are equal only if they refer to
/// the same foreign object; the core never looks inside.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct ForeignHandle(u64);

impl ForeignHandle {
    pub fn from_u64(value: u64) -> Self {
        Self(value)
    }

    pub fn to_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ForeignHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:x}", self.0)
    }
}

/// Name of a foreign collection that can be snapshotted as a whole.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct Domain(&'static str);

impl Domain {
    /// Every live entity placed in the sector.
    pub const SECTOR_OBJECTS: Domain = Domain("SectorObjects");

    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}
