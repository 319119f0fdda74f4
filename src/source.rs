//! Garment metadata and drape blobs from external services.
//!
//! The query service and the file store live outside this crate. They are
//! reached through two small traits, [`GarmentCatalog`] and [`BlobStore`];
//! [`load_drape`] combines them to go from a garment identifier to a parsed
//! drape mesh without touching the file system.
//!
//! Both traits are implemented for `HashMap`, which is enough for tests and
//! for catalogues already loaded into memory.

use std::collections::HashMap;

use crate::error::{MeshError, Result};
use crate::mesh::Mesh;

/// Tag group holding the fabric softness.
pub const SOFTNESS_GROUP: &str = "softness";

/// Tag group holding the body shape.
pub const BODY_SHAPE_GROUP: &str = "body shape";

/// A tag attached to a garment scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Name of the group the tag belongs to.
    pub group: String,
    /// The tag value.
    pub name: String,
}

impl Tag {
    /// Create a tag.
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }
}

/// The properties used to find garments that drape alike.
///
/// Any of them may be missing from the catalogue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimilarityProperties {
    /// Fabric identifier.
    pub fabric_uuid: Option<String>,
    /// Style identifier.
    pub style_uuid: Option<String>,
    /// Softness tag.
    pub softness: Option<String>,
    /// Body-shape tag.
    pub body_shape: Option<String>,
}

impl SimilarityProperties {
    /// Collect properties from identifiers and scan tags. The first tag in
    /// each group wins.
    pub fn from_tags(fabric_uuid: Option<String>, style_uuid: Option<String>, tags: &[Tag]) -> Self {
        let by_group = |group: &str| {
            tags.iter()
                .find(|t| t.group == group)
                .map(|t| t.name.clone())
        };
        Self {
            fabric_uuid,
            style_uuid,
            softness: by_group(SOFTNESS_GROUP),
            body_shape: by_group(BODY_SHAPE_GROUP),
        }
    }
}

/// A catalogue entry for one garment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GarmentRecord {
    /// Similarity properties.
    pub properties: SimilarityProperties,
    /// Identifier of the stored drape file, if one was exported.
    pub drape_file: Option<String>,
}

/// Looks up garment metadata.
pub trait GarmentCatalog {
    /// The active record for `garment_id`, or `None` if there is none.
    fn similarity_properties(&self, garment_id: &str) -> Result<Option<GarmentRecord>>;
}

/// Fetches stored files.
pub trait BlobStore {
    /// Raw bytes of `file_id`, or `None` if the store does not have it.
    fn fetch(&self, file_id: &str) -> Result<Option<Vec<u8>>>;
}

impl GarmentCatalog for HashMap<String, GarmentRecord> {
    fn similarity_properties(&self, garment_id: &str) -> Result<Option<GarmentRecord>> {
        Ok(self.get(garment_id).cloned())
    }
}

impl BlobStore for HashMap<String, Vec<u8>> {
    fn fetch(&self, file_id: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.get(file_id).cloned())
    }
}

/// Load the drape mesh of a garment.
///
/// Returns `Ok(None)` if the garment is unknown or has no drape file.
///
/// # Errors
///
/// - [`MeshError::Source`] if the catalogue names a drape file the store
///   does not have.
/// - Any error from the collaborators or from parsing the blob.
pub fn load_drape<C, B>(catalog: &C, store: &B, garment_id: &str) -> Result<Option<Mesh>>
where
    C: GarmentCatalog + ?Sized,
    B: BlobStore + ?Sized,
{
    let Some(record) = catalog.similarity_properties(garment_id)? else {
        log::debug!("garment {} not in catalogue", garment_id);
        return Ok(None);
    };
    let Some(file_id) = record.drape_file else {
        log::debug!("garment {} has no drape file", garment_id);
        return Ok(None);
    };

    let bytes = store.fetch(&file_id)?.ok_or_else(|| {
        MeshError::Source(format!(
            "drape file {} of garment {} is missing from the store",
            file_id, garment_id
        ))
    })?;
    log::debug!("fetched drape {} ({} bytes)", file_id, bytes.len());

    Mesh::from_bytes(&bytes).map(Some)
}
