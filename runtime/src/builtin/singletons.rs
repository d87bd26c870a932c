// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_shared::address::Address;
use fvm_shared::ActorID;

/// Singleton Actor IDs
pub const STORAGE_MARKET_ACTOR_ID: ActorID = 5;

/// Singleton Actor Addresses. Cross-actor calls resolve these through the
/// VM's address table on every send; actors hold no direct references to
/// each other.
pub const STORAGE_MARKET_ACTOR_ADDR: Address = Address::new_id(STORAGE_MARKET_ACTOR_ID);

/// Defines first available ID address after builtin actors
pub const FIRST_NON_SINGLETON_ADDR: ActorID = 100;
