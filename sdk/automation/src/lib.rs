//! Runtime shared by the Azure automation modules.
//!
//! Ansible runs a compiled ("binary") module by passing it the path of a
//! JSON file holding the task parameters and reading a single JSON object
//! back from stdout. This crate covers that contract from the module side,
//! together with the two helpers both modules lean on: resolving settings
//! from an explicit [`Environment`](environment::Environment) and polling a
//! remote condition with [`poll_until`](poll::poll_until).

#[macro_use]
extern crate log;

pub mod environment;
pub mod lenient;
pub mod module;
pub mod poll;
pub mod prelude;

pub use module::run;
