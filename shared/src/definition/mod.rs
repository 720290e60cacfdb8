pub mod definition_store;
pub mod error;
pub mod object_definition;
pub mod sector_definition;

cfg_if! {
    if #[cfg(feature = "json_store")] {
        pub mod json_store;
    }
}
