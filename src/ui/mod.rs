// UI layer: bridges between the core and the external host process.

pub mod event_bridge;
