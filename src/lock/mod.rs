//! Per-device lock layer: handle, key selection and the entity state machine

pub mod entity;
pub mod handle;
pub mod selector;

pub use entity::{LockEntity, LockState};
pub use handle::LockHandle;
pub use selector::{select_key, select_key_preferring};
