pub mod guard;
pub mod password;
pub mod session;

pub use guard::{authorize, Action, Decision, Denial};
