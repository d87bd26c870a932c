// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_shared::clock::ChainEpoch;

/// Maximum size of a miner's public key, in bytes.
pub const MAX_PUBLIC_KEY_SIZE: usize = 100;

/// Number of blocks in a proving period: the window within which the miner
/// owes one PoSt for its committed sectors.
/// TODO: find a workable production value; currently set very high to avoid
/// race conditions in test.
pub const PROVING_PERIOD_BLOCKS: ChainEpoch = 20_000;

/// Gas units deducted at the top of every exported method, before any state
/// is observed.
pub const GAS_PER_METHOD: i64 = 100;

/// Height at which a proving period that started at `start` ends. A PoSt
/// arriving after this is late.
pub fn proving_period_end(start: ChainEpoch) -> ChainEpoch {
    start + PROVING_PERIOD_BLOCKS
}
