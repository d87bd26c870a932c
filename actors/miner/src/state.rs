// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::collections::BTreeMap;

use fvm_ipld_encoding::strict_bytes;
use fvm_ipld_encoding::tuple::*;
use fvm_shared::address::Address;
use fvm_shared::bigint::{bigint_ser, BigInt};
use fvm_shared::clock::ChainEpoch;
use fvm_shared::econ::TokenAmount;
use fvm_shared::sector::SectorNumber;
use num_traits::Zero;

use fil_actors_runtime::sector::{Commitment, Commitments};
use fil_actors_runtime::{actor_error, ActorError};

/// A standing offer by this miner to store client data at a price, valid
/// until an absolute expiry height.
#[derive(Clone, Debug, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct Ask {
    pub price: TokenAmount,
    pub expiry: ChainEpoch,
    #[serde(with = "bigint_ser")]
    pub id: BigInt,
}

/// Miner actor state. The whole structure is persisted as one
/// content-addressed cell; serialization must be canonical so that equal
/// states produce equal roots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct State {
    pub owner: Address,

    /// The libp2p identity the miner is operating.
    #[serde(with = "strict_bytes")]
    pub peer_id: Vec<u8>,

    /// Used to validate blocks generated by the miner this actor represents.
    #[serde(with = "strict_bytes")]
    pub public_key: Vec<u8>,

    /// The amount of space being offered up by this miner, in sectors.
    #[serde(with = "bigint_ser")]
    pub pledge_sectors: BigInt,

    /// Total filecoin held as collateral for the miner's pledge.
    pub collateral: TokenAmount,

    /// The set of asks this miner has open. Insertion-ordered; expired
    /// entries are pruned only when a new ask is added.
    pub asks: Vec<Ask>,
    #[serde(with = "bigint_ser")]
    pub next_ask_id: BigInt,

    /// Commitments for every sector this miner has committed, keyed by the
    /// decimal string rendering of the sector id. The string keys are the
    /// wire format of existing persisted states and must be preserved.
    pub sector_commitments: BTreeMap<String, Commitments>,

    /// Sector id most recently passed to a commitment, not the maximum.
    pub last_used_sector_id: SectorNumber,

    /// Start of the open proving window; unset until the first sector is
    /// committed.
    pub proving_period_start: Option<ChainEpoch>,
    /// Height of the last accepted PoSt.
    pub last_post: Option<ChainEpoch>,

    /// Number of committed sectors counted towards consensus weight.
    #[serde(with = "bigint_ser")]
    pub power: BigInt,
}

impl State {
    pub fn new(
        owner: Address,
        public_key: Vec<u8>,
        pledge_sectors: BigInt,
        peer_id: Vec<u8>,
        collateral: TokenAmount,
    ) -> Self {
        Self {
            owner,
            peer_id,
            public_key,
            pledge_sectors,
            collateral,
            asks: Vec::new(),
            next_ask_id: BigInt::zero(),
            sector_commitments: BTreeMap::new(),
            last_used_sector_id: 0,
            proving_period_start: None,
            last_post: None,
            power: BigInt::zero(),
        }
    }

    /// Wire form of a sector id in the commitments map.
    pub fn sector_key(sector_id: SectorNumber) -> String {
        sector_id.to_string()
    }

    pub fn has_sector(&self, sector_id: SectorNumber) -> bool {
        self.sector_commitments.contains_key(&Self::sector_key(sector_id))
    }

    pub fn add_commitment(&mut self, sector_id: SectorNumber, commitments: Commitments) {
        self.sector_commitments.insert(Self::sector_key(sector_id), commitments);
    }

    /// CommRs of all committed sectors, ascending by sector id. A key that
    /// does not parse back to a sector id means the state is corrupt.
    pub fn commitment_comm_rs(&self) -> Result<Vec<Commitment>, ActorError> {
        let mut sectors: Vec<(SectorNumber, Commitment)> = self
            .sector_commitments
            .iter()
            .map(|(key, commitments)| {
                let id = key.parse::<SectorNumber>().map_err(
                    |_| actor_error!(illegal_state; "malformed sector key {} (bad invariant)", key),
                )?;
                Ok((id, commitments.comm_r))
            })
            .collect::<Result<_, ActorError>>()?;
        sectors.sort_by_key(|&(id, _)| id);
        Ok(sectors.into_iter().map(|(_, comm_r)| comm_r).collect())
    }
}
