// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub use self::actor_error::*;
pub use self::builtin::*;

pub mod abi;
pub mod builtin;
pub mod runtime;
pub mod sector;

mod actor_error;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
