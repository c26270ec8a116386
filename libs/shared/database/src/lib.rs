pub mod store;

pub use store::{ChangeEvent, ChangeOp, Collection, StoreError, Versioned};
