pub mod format;
pub mod normalize;
pub mod source;

pub use format::RawTextReader;
pub use normalize::{DefaultNormalizer, Normalizer};
pub use source::FileSource;

use std::path::Path;

use anyhow::Result;
use model::Document;

/// Loads raw resources from a location. Implementations return one string
/// per resource, as a list even when only a single resource was read.
pub trait SourceReader {
    fn load(&self, location: &Path) -> Result<Vec<String>>;
}

/// Parses a raw resource into a segmented document.
pub trait FormatReader {
    fn create_doc(&self, raw: &str) -> Result<Document>;

    fn read_resource(&self, raw: &[String]) -> Result<Vec<Document>> {
        raw.iter().map(|resource| self.create_doc(resource)).collect()
    }
}
