use std::path::Path;

use super::{error::DefinitionError, sector_definition::SectorDefinition};

/// Reads and writes the foreign runtime's own persisted sector format.
///
/// The codec itself lives outside the core; `Sector::load` and `Sector::save`
/// only adapt it.
pub trait DefinitionStore {
    fn load_definition(&self, path: &Path) -> Result<SectorDefinition, DefinitionError>;
    fn save_definition(
        &self,
        definition: &SectorDefinition,
        path: &Path,
    ) -> Result<(), DefinitionError>;
}
