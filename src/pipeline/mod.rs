// src/pipeline/mod.rs

pub mod event_bus;
pub mod replay;
pub mod sub_master;

pub use event_bus::{EventBus, UiEvent};
pub use replay::{ReplayLog, ReplayRecord};
pub use sub_master::SubMaster;
