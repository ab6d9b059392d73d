//! Emergency SOS sub-machine.
//!
//! ```text
//!   trigger           tick (remaining > 1)
//! Idle ───────▶ CountingDown(n) ─────┐
//!   ▲                │  ▲            │
//!   │ cancel         │  └────────────┘
//!   ├────────────────┘
//!   │                │ tick (remaining == 1)
//!   │ resolve        ▼
//!   └────────── Alerting
//! ```
//!
//! `Idle` is the absence of a machine: one is created on trigger and
//! dropped on cancel or resolve. The alert goes out exactly once, on the
//! tick that takes the countdown to zero.

use serde::{Deserialize, Serialize};

/// Where the SOS flow is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum SosPhase {
    /// Seconds left before the alert goes out. Can still be cancelled.
    CountingDown {
        /// Seconds left.
        remaining: u32,
    },
    /// Emergency contacts and authorities have been alerted.
    Alerting,
}

/// What a countdown tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SosTick {
    /// Countdown moved to the contained value.
    Counting(u32),
    /// Countdown hit zero; the alert went out on this tick.
    Alerted,
    /// Already alerting; nothing changed.
    Holding,
}

/// Read-only view of the SOS overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SosSnapshot {
    /// Seconds left, zero once alerting.
    pub countdown: u32,
    /// Whether the alert has gone out.
    pub is_alerting: bool,
}

/// The SOS countdown and alert state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SosMachine {
    phase: SosPhase,
}

impl SosMachine {
    /// Starts a countdown from `seconds` (at least 1).
    #[must_use]
    pub fn new(seconds: u32) -> Self {
        Self {
            phase: SosPhase::CountingDown {
                remaining: seconds.max(1),
            },
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> SosPhase {
        self.phase
    }

    /// Whether the alert has gone out.
    #[must_use]
    pub const fn is_alerting(&self) -> bool {
        matches!(self.phase, SosPhase::Alerting)
    }

    /// Read-only view for presentation.
    #[must_use]
    pub const fn snapshot(&self) -> SosSnapshot {
        match self.phase {
            SosPhase::CountingDown { remaining } => SosSnapshot {
                countdown: remaining,
                is_alerting: false,
            },
            SosPhase::Alerting => SosSnapshot {
                countdown: 0,
                is_alerting: true,
            },
        }
    }

    /// Advances the countdown by one second.
    pub fn tick(&mut self) -> SosTick {
        match self.phase {
            SosPhase::CountingDown { remaining } if remaining > 1 => {
                self.phase = SosPhase::CountingDown {
                    remaining: remaining - 1,
                };
                SosTick::Counting(remaining - 1)
            }
            SosPhase::CountingDown { .. } => {
                self.phase = SosPhase::Alerting;
                SosTick::Alerted
            }
            SosPhase::Alerting => SosTick::Holding,
        }
    }

    /// Whether the user may still cancel (countdown not finished).
    #[must_use]
    pub const fn can_cancel(&self) -> bool {
        matches!(self.phase, SosPhase::CountingDown { .. })
    }

    /// Whether the user may close the overlay as safe (alert sent).
    #[must_use]
    pub const fn can_resolve(&self) -> bool {
        self.is_alerting()
    }
}
