pub mod entity_kind;
pub mod kinds;
pub mod proxy;

mod pending_writes;
