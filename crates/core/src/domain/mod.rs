pub mod context;
pub mod inventory;
pub mod phase;
pub mod profile;
pub mod result;
pub mod task;
