// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_ipld_encoding::strict_bytes;
use fvm_ipld_encoding::tuple::*;

/// Length in bytes of a single sector commitment.
pub const COMMITMENT_BYTES_LEN: usize = 32;

/// Length in bytes of a single proof-of-spacetime proof.
pub const POST_PROOF_BYTES_LEN: usize = 192;

/// A 32-byte cryptographic anchor produced by the sector sealing process.
/// The same wire shape serves CommD, CommR and CommRStar; which one a value
/// is follows from its position in a [`Commitments`] record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Commitment(#[serde(with = "strict_bytes")] pub [u8; COMMITMENT_BYTES_LEN]);

impl TryFrom<&[u8]> for Commitment {
    type Error = usize;

    /// Fails with the offending length when the slice is not exactly
    /// [`COMMITMENT_BYTES_LEN`] bytes.
    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        <[u8; COMMITMENT_BYTES_LEN]>::try_from(value).map(Commitment).map_err(|_| value.len())
    }
}

/// The commitment triple captured when a sector is committed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct Commitments {
    pub comm_d: Commitment,
    pub comm_r: Commitment,
    pub comm_r_star: Commitment,
}

/// A proof of spacetime, opaque to the actor layer.
#[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PoStProof(#[serde(with = "strict_bytes")] pub [u8; POST_PROOF_BYTES_LEN]);

impl TryFrom<&[u8]> for PoStProof {
    type Error = usize;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        <[u8; POST_PROOF_BYTES_LEN]>::try_from(value).map(PoStProof).map_err(|_| value.len())
    }
}

impl std::fmt::Debug for PoStProof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PoStProof({:02x}{:02x}..{:02x})", self.0[0], self.0[1], self.0[191])
    }
}

/// Entropy the verifier mixes into its challenges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PoStChallengeSeed(#[serde(with = "strict_bytes")] pub [u8; 32]);

/// Inputs to a proof-of-spacetime verification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct PoStVerifyInfo {
    pub challenge_seed: PoStChallengeSeed,
    /// CommRs of every sector covered by the proof.
    pub comm_rs: Vec<Commitment>,
    /// Sector ids the prover declares faulty and excluded from the proof.
    pub faults: Vec<u64>,
    pub proof: PoStProof,
}
