use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use super::{
    definition_store::DefinitionStore, error::DefinitionError,
    sector_definition::SectorDefinition,
};

/// `DefinitionStore` writing sectors as pretty-printed JSON.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonDefinitionStore;

impl JsonDefinitionStore {
    pub fn new() -> Self {
        Self
    }
}

impl DefinitionStore for JsonDefinitionStore {
    fn load_definition(&self, path: &Path) -> Result<SectorDefinition, DefinitionError> {
        let file = File::open(path).map_err(|source| DefinitionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|error| {
            DefinitionError::Malformed {
                path: path.to_path_buf(),
                reason: error.to_string(),
            }
        })
    }

    fn save_definition(
        &self,
        definition: &SectorDefinition,
        path: &Path,
    ) -> Result<(), DefinitionError> {
        let io_error = |source| DefinitionError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(io_error)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, definition).map_err(|error| {
            DefinitionError::Malformed {
                path: path.to_path_buf(),
                reason: error.to_string(),
            }
        })?;
        writer.flush().map_err(io_error)
    }
}
