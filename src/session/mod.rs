//! Session orchestration, observable state and the expiry watchdog

pub mod manager;
pub mod state;
pub mod watchdog;

pub use manager::SessionManager;
pub use state::{SessionEvent, SessionState};
pub use watchdog::Watchdog;
