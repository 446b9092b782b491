//! Duplicate-submission guard for create/update/delete forms
//!
//! Every (owner, form) pair is either idle or submitting. Starting a
//! submission while one is in flight fails; finishing or dropping the
//! [`Submission`] returns the pair to idle. Nothing is retried or queued.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::error::ApiError;

type FormKey = (String, &'static str);

/// Tracks in-flight form submissions
#[derive(Debug, Clone, Default)]
pub struct FormGuard {
    in_flight: Arc<Mutex<HashSet<FormKey>>>,
}

impl FormGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `(owner, form)` from idle to submitting
    pub fn begin(&self, owner: impl Into<String>, form: &'static str) -> Result<Submission, ApiError> {
        let key = (owner.into(), form);
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|p| p.into_inner());

        if !in_flight.insert(key.clone()) {
            warn!(owner = %key.0, form, "Rejected duplicate submission");
            return Err(ApiError::Conflict(
                "This form is already being submitted".to_string(),
            ));
        }

        debug!(owner = %key.0, form, "Form submitting");
        Ok(Submission {
            guard: self.clone(),
            key: Some(key),
        })
    }

    #[cfg(test)]
    pub fn is_submitting(&self, owner: &str, form: &'static str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains(&(owner.to_string(), form))
    }

    fn release(&self, key: &FormKey) {
        self.in_flight
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(key);
    }
}

/// An in-flight submission; returns its form to idle when dropped
#[derive(Debug)]
pub struct Submission {
    guard: FormGuard,
    key: Option<FormKey>,
}

impl Submission {
    /// The backend accepted the form; the form closes
    pub fn succeed(mut self) {
        if let Some(key) = self.key.take() {
            info!(owner = %key.0, form = key.1, "Form submitted");
            self.guard.release(&key);
        }
    }
}

impl Drop for Submission {
    fn drop(&mut self) {
        // Not marked successful: the form stays open with its error
        if let Some(key) = self.key.take() {
            warn!(owner = %key.0, form = key.1, "Form submission failed");
            self.guard.release(&key);
        }
    }
}
