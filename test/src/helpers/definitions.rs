use mirra_shared::{ObjectDefinition, Proxy, Vec3};

pub fn object(entity_id: u64, type_id: &str) -> ObjectDefinition {
    ObjectDefinition::new(entity_id, type_id)
        .with_subtype("Default")
        .with_property(Proxy::POSITION, Vec3::ZERO)
}

pub fn cube_grid(entity_id: u64) -> ObjectDefinition {
    object(entity_id, "CubeGrid")
        .with_property("IsStatic", false)
        .with_property("DisplayName", format!("Grid {}", entity_id))
}

pub fn voxel_map(entity_id: u64) -> ObjectDefinition {
    object(entity_id, "VoxelMap").with_property("StorageName", format!("Asteroid_{}", entity_id))
}

pub fn floating_object(entity_id: u64) -> ObjectDefinition {
    object(entity_id, "FloatingObject").with_property("Amount", 1.0f32)
}

pub fn meteor(entity_id: u64) -> ObjectDefinition {
    object(entity_id, "Meteor").with_property("Integrity", 1.0f32)
}

pub fn character(entity_id: u64) -> ObjectDefinition {
    object(entity_id, "Character").with_property("BatteryLevel", 1.0f32)
}
