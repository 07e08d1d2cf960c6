use uuid::Uuid;

use crate::element::ObjectId;

/// Fresh identifier for a new visual object. Random rather than counted so
/// ids stay unique across scenes restored from different blobs.
pub fn generate_id() -> ObjectId {
    ObjectId(Uuid::new_v4())
}
