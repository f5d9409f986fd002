// SPDX-License-Identifier: MIT

use crate::timer::TimerId;
use thiserror::Error;

/// Errors raised by [`crate::Catalyst`] operations.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum CatalystError {
    #[error("timer {0:?} is already running")]
    TimerAlreadyRunning(TimerId),
    #[error("timer {0:?} is not registered on this catalyst")]
    TimerNotFound(TimerId),
}
