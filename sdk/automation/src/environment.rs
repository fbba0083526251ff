//! Explicit environment lookup.
//!
//! Modules never read `std::env` directly for settings; they take an
//! [`Environment`] so the fallback from task parameters to environment
//! variables can be resolved (and tested) before any client is built.

use std::collections::HashMap;
use std::hash::BuildHasher;

pub trait Environment {
    /// The value of `key`, or `None` when it is unset or empty.
    fn var(&self, key: &str) -> Option<String>;

    /// `explicit` when given, else the value of `key`.
    fn or_var(&self, explicit: Option<String>, key: &str) -> Option<String> {
        explicit
            .filter(|value| !value.is_empty())
            .or_else(|| self.var(key))
    }
}

/// The environment of the running process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|value| !value.is_empty())
    }
}

impl<S: BuildHasher> Environment for HashMap<String, String, S> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).filter(|value| !value.is_empty()).cloned()
    }
}
