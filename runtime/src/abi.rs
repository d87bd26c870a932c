// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Signatures of exported actor methods, as advertised to the VM's codec
//! layer. The VM decodes positional call arguments and encodes return values
//! against these, keyed by exported method name.

use std::collections::BTreeMap;

use fvm_shared::MethodNum;

/// The closed set of types a method parameter or return value may take on
/// the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbiType {
    /// Currency minor unit, arbitrary precision, non-negative by convention.
    AttoFIL,
    /// Arbitrary-precision signed integer.
    Integer,
    /// Variable-length byte string.
    Bytes,
    /// On-chain actor address.
    Address,
    /// Unsigned 64-bit sector identifier.
    SectorID,
    /// Opaque libp2p peer identity.
    PeerID,
    /// Chain height.
    BlockHeight,
    /// Array of unsigned 64-bit integers.
    UintArray,
    /// Map from sector id to its commitment record.
    CommitmentsMap,
}

/// Positional parameter and return types of one exported method, plus the
/// method number dispatch resolves it to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionSignature {
    pub method_num: MethodNum,
    pub params: &'static [AbiType],
    pub ret: &'static [AbiType],
}

/// The exported methods of an actor, keyed by method name.
pub type Exports = BTreeMap<&'static str, FunctionSignature>;
