use fvm_ipld_encoding::strict_bytes;
use fvm_ipld_encoding::tuple::*;
use fvm_shared::address::Address;
use fvm_shared::bigint::{bigint_ser, BigInt};
use fvm_shared::econ::TokenAmount;
use fvm_shared::sector::SectorNumber;

#[derive(Clone, Debug, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct ConstructorParams {
    pub owner: Address,
    #[serde(with = "strict_bytes")]
    pub public_key: Vec<u8>,
    #[serde(with = "bigint_ser")]
    pub pledge_sectors: BigInt,
    #[serde(with = "strict_bytes")]
    pub peer_id: Vec<u8>,
    pub collateral: TokenAmount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct AddAskParams {
    pub price: TokenAmount,
    /// Lifetime of the ask in blocks, added to the current height. Must fit
    /// an unsigned 64-bit integer.
    #[serde(with = "bigint_ser")]
    pub expiry: BigInt,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct GetAskParams {
    #[serde(with = "bigint_ser")]
    pub id: BigInt,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct CommitSectorParams {
    pub sector_id: SectorNumber,
    #[serde(with = "strict_bytes")]
    pub comm_d: Vec<u8>,
    #[serde(with = "strict_bytes")]
    pub comm_r: Vec<u8>,
    #[serde(with = "strict_bytes")]
    pub comm_r_star: Vec<u8>,
    /// Seal proof for the sector. Carried with the commitment message but
    /// not verified by this actor.
    #[serde(with = "strict_bytes")]
    pub proof: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct UpdatePeerIDParams {
    #[serde(with = "strict_bytes")]
    pub peer_id: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct SubmitPoStParams {
    #[serde(with = "strict_bytes")]
    pub proof: Vec<u8>,
}
