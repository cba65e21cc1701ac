// Core modules implementing the row model, table storage, registry, and error modeling.
pub mod error;
pub mod registry;
pub mod row;
pub mod store;
