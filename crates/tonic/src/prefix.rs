// SPDX-License-Identifier: MIT

/// The five sparkle prefixes spec.md §6 fixes as stable, observable naming
/// convention: `<prefix>__<base>` / `<prefix>_<state>__<base>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Prefix {
    /// `ttse` — user-facing event notification.
    UserEvent,
    /// `ttsc` — user-facing command.
    UserCommand,
    /// `tts` — user-facing periodic tick.
    UserTick,
    /// `_tts` — framework-internal periodic tick.
    InternalTick,
    /// `_ttss` — framework-internal system sparkle (lifecycle hooks).
    InternalSystem,
}

impl Prefix {
    /// The original source's tag string, e.g. for diagnostics or for
    /// parsing a `"<prefix>__<base>"`-shaped name back into its parts.
    pub fn tag(self) -> &'static str {
        match self {
            Prefix::UserEvent => "ttse",
            Prefix::UserCommand => "ttsc",
            Prefix::UserTick => "tts",
            Prefix::InternalTick => "_tts",
            Prefix::InternalSystem => "_ttss",
        }
    }

    /// `true` for the two prefixes that keep running while a tonic is
    /// draining toward shutdown (spec.md §4.4 "switch the dispatcher to
    /// system-only mode": system sparkles and on-exit/on-finished continue,
    /// queued user handlers are dropped).
    pub fn survives_system_only_mode(self, base: &str) -> bool {
        matches!(self, Prefix::InternalSystem | Prefix::InternalTick)
            || (self == Prefix::UserEvent && matches!(base, "on_finished" | "on_exit"))
    }
}

impl std::fmt::Display for Prefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}
