// SPDX-License-Identifier: MIT

//! Scenario 1 from spec.md §8: a tonic whose `on_start` kicks off a
//! three-step chain of user-tick sparkles, each enqueuing the next, with
//! the last one finishing the tonic.

use parking_lot::Mutex;
use std::sync::Arc;
use tasktonic_catalyst::{Catalyst, Clock};
use tasktonic_ledger::Ledger;
use tasktonic_tonic::{reserved, Args, HandlerTableBuilder, Prefix, TonicError, TonicHandle, TonicSpec};

/// The order `tts__a`/`tts__b`/`tts__c` actually ran in, shared with the
/// caller so a test can assert on it after the tonic has finished and its
/// handle has gone away.
#[derive(Clone, Default)]
pub struct HelloChainLog(pub Arc<Mutex<Vec<&'static str>>>);

impl HelloChainLog {
    pub fn snapshot(&self) -> Vec<&'static str> {
        self.0.lock().clone()
    }
}

pub struct HelloChainBody {
    log: HelloChainLog,
}

/// Builds and attaches the hello-chain tonic to `catalyst`, returning its
/// handle and a clone of the log it appends to. Calling code is expected to
/// drive `catalyst` (directly via `run`/`loop_body_once`, or through a
/// [`tasktonic_runtime::Runtime`]) for the chain to actually execute.
pub fn spawn<C: Clock>(
    ledger: &'static Ledger,
    catalyst: Arc<Catalyst<C>>,
) -> Result<(TonicHandle<HelloChainBody, C>, HelloChainLog), TonicError> {
    let log = HelloChainLog::default();

    let handlers = HandlerTableBuilder::new()
        .on(Prefix::InternalSystem, reserved::ON_START, |_body, handle, _args| {
            handle.dispatch(Prefix::UserTick, "a", Args::none());
        })
        .on(Prefix::UserTick, "a", |body, handle, _args| {
            body.log.0.lock().push("a");
            handle.dispatch(Prefix::UserTick, "b", Args::none());
        })
        .on(Prefix::UserTick, "b", |body, handle, _args| {
            body.log.0.lock().push("b");
            handle.dispatch(Prefix::UserTick, "c", Args::none());
        })
        .on(Prefix::UserTick, "c", |body, handle, _args| {
            body.log.0.lock().push("c");
            handle.finish();
        })
        .build();

    let spec = TonicSpec::new("HelloChain", handlers, HelloChainBody { log: log.clone() });
    let handle = TonicHandle::new(ledger, catalyst, spec)?;
    Ok((handle, log))
}

#[cfg(test)]
#[path = "hello_chain_tests.rs"]
mod tests;
