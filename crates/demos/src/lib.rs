// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

//! tasktonic-demos: example tonics exercising the kernel crates end to end
//! (spec.md §8 scenarios 1 and 2). Not part of the runtime; referenced by
//! the root integration suite and useful as a worked example for anyone
//! writing their own tonic.

pub mod hello_chain;
pub mod traffic_light;
