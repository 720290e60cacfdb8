pub mod entity;
pub mod entity_manager;
pub mod error;
pub mod identity_map;
pub mod reconciler;
pub mod sector;

mod entity_index;
