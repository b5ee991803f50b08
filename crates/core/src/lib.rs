//! Core domain model, identifier generation, retention policy and the storage contract.
//! No IO within this crate.

pub mod errors;
pub mod id;
pub mod model;
pub mod retention;
pub mod traits;
pub mod validate;

pub use crate::errors::ValidationError;
pub use crate::id::{generate_id, is_well_formed, ID_LEN};
pub use crate::model::{RecordId, ValidationRecord};
pub use crate::retention::{
    embedded_retention, is_expired, managed_retention, sweep_cutoff, ttl_epoch_seconds,
};
pub use crate::traits::RecordStore;
pub use crate::validate::{validate_payload, MAX_PAYLOAD_BYTES};
