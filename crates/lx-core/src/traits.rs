//! Core traits shared by models and services

/// Identifier assigned by the persistence API (document ids are opaque strings)
pub type EntityId = String;

/// Trait for records that may or may not have been persisted yet
pub trait Identifiable {
    fn id(&self) -> Option<&str>;

    fn is_persisted(&self) -> bool {
        self.id().is_some()
    }

    fn is_new_record(&self) -> bool {
        !self.is_persisted()
    }
}
