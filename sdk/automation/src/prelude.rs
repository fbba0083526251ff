pub use crate::environment::{Environment, ProcessEnvironment};
pub use crate::module::{ModuleArgs, ModuleResult};
pub use crate::poll::{poll_until, PollPolicy};
