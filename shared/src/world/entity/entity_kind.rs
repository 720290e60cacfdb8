use crate::OperationId;

/// Closed tag selecting a proxy's concrete variant.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub enum EntityKind {
    CubeGrid,
    VoxelMap,
    FloatingObject,
    Meteor,
    Character,
    Unknown,
}

const COMMON_OPERATIONS: [OperationId; 3] = [
    OperationId::SET_POSITION,
    OperationId::BROADCAST_POSITION,
    OperationId::REMOVE,
];

const CUBE_GRID_OPERATIONS: [OperationId; 7] = [
    OperationId::SET_POSITION,
    OperationId::BROADCAST_POSITION,
    OperationId::REMOVE,
    OperationId::SET_IS_STATIC,
    OperationId::SET_DISPLAY_NAME,
    OperationId::SET_LINEAR_VELOCITY,
    OperationId::BROADCAST_LINEAR_VELOCITY,
];

const FLOATING_OBJECT_OPERATIONS: [OperationId; 5] = [
    OperationId::SET_POSITION,
    OperationId::BROADCAST_POSITION,
    OperationId::REMOVE,
    OperationId::SET_AMOUNT,
    OperationId::BROADCAST_AMOUNT,
];

const METEOR_OPERATIONS: [OperationId; 4] = [
    OperationId::SET_POSITION,
    OperationId::BROADCAST_POSITION,
    OperationId::REMOVE,
    OperationId::SET_INTEGRITY,
];

const CHARACTER_OPERATIONS: [OperationId; 5] = [
    OperationId::SET_POSITION,
    OperationId::BROADCAST_POSITION,
    OperationId::REMOVE,
    OperationId::SET_BATTERY_LEVEL,
    OperationId::BROADCAST_BATTERY_LEVEL,
];

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::CubeGrid,
        EntityKind::VoxelMap,
        EntityKind::FloatingObject,
        EntityKind::Meteor,
        EntityKind::Character,
        EntityKind::Unknown,
    ];

    /// Classifies a definition's reported type tag. Unrecognised tags fall
    /// back to `Unknown` rather than failing.
    pub fn from_type_id(type_id: &str) -> Self {
        match type_id {
            "CubeGrid" => EntityKind::CubeGrid,
            "VoxelMap" => EntityKind::VoxelMap,
            "FloatingObject" => EntityKind::FloatingObject,
            "Meteor" => EntityKind::Meteor,
            "Character" => EntityKind::Character,
            _ => EntityKind::Unknown,
        }
    }

    /// Type tag written into definitions created locally for this kind.
    pub fn type_id(&self) -> &'static str {
        match self {
            EntityKind::CubeGrid => "CubeGrid",
            EntityKind::VoxelMap => "VoxelMap",
            EntityKind::FloatingObject => "FloatingObject",
            EntityKind::Meteor => "Meteor",
            EntityKind::Character => "Character",
            EntityKind::Unknown => "Unknown",
        }
    }

    /// Every foreign operation a proxy of this kind may issue.
    pub fn operations(&self) -> &'static [OperationId] {
        match self {
            EntityKind::CubeGrid => &CUBE_GRID_OPERATIONS,
            EntityKind::FloatingObject => &FLOATING_OBJECT_OPERATIONS,
            EntityKind::Meteor => &METEOR_OPERATIONS,
            EntityKind::Character => &CHARACTER_OPERATIONS,
            EntityKind::VoxelMap | EntityKind::Unknown => &COMMON_OPERATIONS,
        }
    }
}

/// Which kinds an `EntityManager` accepts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KindFilter {
    Any,
    Only(Vec<EntityKind>),
    Except(Vec<EntityKind>),
}

impl KindFilter {
    pub fn only(kind: EntityKind) -> Self {
        KindFilter::Only(vec![kind])
    }

    pub fn accepts(&self, kind: EntityKind) -> bool {
        match self {
            KindFilter::Any => true,
            KindFilter::Only(kinds) => kinds.contains(&kind),
            KindFilter::Except(kinds) => !kinds.contains(&kind),
        }
    }
}
