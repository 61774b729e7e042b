//! Application lifecycle: startup, execution mode, shutdown

pub mod lifetime;
pub mod modes;
