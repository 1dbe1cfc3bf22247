//! Sessions: snapshots, the phase machine, the reducer and the manager
//! that owns them.

pub mod manager;
pub mod model;
pub mod phase;
pub mod reducer;

pub use manager::{SessionManager, SharedSessionManager};
pub use model::{title_from_query, Factor, Message, Role, Session, DEFAULT_SESSION_TITLE};
pub use phase::{Phase, PhaseEvent};
pub use reducer::{accepts_submission, reduce, SessionEvent};
