//! Common types shared across multiple modules.
//!
//! This module contains the pointer identity used by the marker sessions and the
//! best-effort helper used wherever a collaborator call may fail without that
//! failure being allowed to break the interaction flow.

use std::collections::HashSet;
use std::fmt::Display;
use std::sync::{Mutex, OnceLock};

use bevy::prelude::*;

/// Identifies the pointer that owns a session (mouse, or one touch contact).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerId(pub u64);

impl PointerId {
    /// The system mouse
    pub const MOUSE: PointerId = PointerId(0);
}

fn reported_sites() -> &'static Mutex<HashSet<&'static str>> {
    static SITES: OnceLock<Mutex<HashSet<&'static str>>> = OnceLock::new();
    SITES.get_or_init(|| Mutex::new(HashSet::new()))
}

/// Best-effort, non-fatal call wrapper.
///
/// Returns the value on success. On failure the error is logged (at `warn` the
/// first time a given `site` fails, at `debug` afterwards) and `None` is
/// returned so the caller can skip the dependent side effect and carry on.
pub fn non_fatal<T, E: Display>(site: &'static str, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            let first = reported_sites()
                .lock()
                .map(|mut sites| sites.insert(site))
                .unwrap_or(false);
            if first {
                warn!("{}: {}", site, e);
            } else {
                debug!("{}: {}", site, e);
            }
            None
        }
    }
}

/// Same as [`non_fatal`] for optional collaborators: `None` is reported as missing.
pub fn require<T>(site: &'static str, value: Option<T>) -> Option<T> {
    non_fatal(site, value.ok_or("collaborator not available"))
}
