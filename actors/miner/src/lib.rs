// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::collections::BTreeMap;

use fvm_ipld_encoding::{BytesSer, RawBytes};
use fvm_shared::address::Address;
use fvm_shared::bigint::bigint_ser::BigIntSer;
use fvm_shared::bigint::BigInt;
use fvm_shared::clock::ChainEpoch;
use fvm_shared::econ::TokenAmount;
use fvm_shared::error::ExitCode;
use fvm_shared::sector::SectorNumber;
use fvm_shared::{MethodNum, METHOD_CONSTRUCTOR};
use log::{info, warn};
use num_derive::FromPrimitive;
use num_traits::{FromPrimitive, ToPrimitive, Zero};

use fil_actors_runtime::abi::{AbiType, Exports, FunctionSignature};
use fil_actors_runtime::runtime::{ActorCode, Runtime};
use fil_actors_runtime::sector::{
    Commitment, Commitments, PoStChallengeSeed, PoStProof, PoStVerifyInfo,
};
use fil_actors_runtime::{actor_error, ActorError, STORAGE_MARKET_ACTOR_ADDR};

pub use self::policy::*;
pub use self::state::{Ask, State};
pub use self::types::*;

pub mod ext;
mod policy;
mod state;
pub mod testing;
mod types;

// Coded revert errors this actor may return, beyond the generic revert.

/// Indicates an invalid public key.
pub const ERR_PUBLIC_KEY_TOO_BIG: ExitCode = ExitCode::new(33);
/// Indicates an invalid sector id. Part of the declared error table; no path
/// in this actor currently produces it.
pub const ERR_INVALID_SECTOR: ExitCode = ExitCode::new(34);
/// Indicates the sector has already been committed.
pub const ERR_SECTOR_COMMITTED: ExitCode = ExitCode::new(35);
/// Indicates the call to record power with the storage market failed.
pub const ERR_STORAGEMARKET_CALL_FAILED: ExitCode = ExitCode::new(36);
/// Signals an unauthorized caller.
pub const ERR_CALLER_UNAUTHORIZED: ExitCode = ExitCode::new(37);
/// Signals insufficient pledge for what you are trying to do. Part of the
/// declared error table; no path in this actor currently produces it.
pub const ERR_INSUFFICIENT_PLEDGE: ExitCode = ExitCode::new(38);
/// Signals that the passed in PoSt was invalid.
pub const ERR_INVALID_POST: ExitCode = ExitCode::new(39);

/// Miner actor methods available
#[derive(FromPrimitive)]
#[repr(u64)]
pub enum Method {
    Constructor = METHOD_CONSTRUCTOR,
    AddAsk = 2,
    GetAsks = 3,
    GetAsk = 4,
    GetOwner = 5,
    GetLastUsedSectorID = 6,
    CommitSector = 7,
    GetKey = 8,
    GetPeerID = 9,
    UpdatePeerID = 10,
    GetPledge = 11,
    GetPower = 12,
    SubmitPoSt = 13,
    GetProvingPeriodStart = 14,
    GetSectorCommitments = 15,
}

/// Signatures of the exported methods, keyed by method name. The VM decodes
/// positional arguments and encodes return values against this table.
pub fn exports() -> Exports {
    use AbiType::*;
    const TABLE: &[(&str, MethodNum, &[AbiType], &[AbiType])] = &[
        ("addAsk", Method::AddAsk as MethodNum, &[AttoFIL, Integer], &[Integer]),
        ("getAsks", Method::GetAsks as MethodNum, &[], &[UintArray]),
        ("getAsk", Method::GetAsk as MethodNum, &[Integer], &[Bytes]),
        ("getOwner", Method::GetOwner as MethodNum, &[], &[Address]),
        ("getLastUsedSectorID", Method::GetLastUsedSectorID as MethodNum, &[], &[SectorID]),
        (
            "commitSector",
            Method::CommitSector as MethodNum,
            &[SectorID, Bytes, Bytes, Bytes, Bytes],
            &[],
        ),
        ("getKey", Method::GetKey as MethodNum, &[], &[Bytes]),
        ("getPeerID", Method::GetPeerID as MethodNum, &[], &[PeerID]),
        ("updatePeerID", Method::UpdatePeerID as MethodNum, &[PeerID], &[]),
        ("getPledge", Method::GetPledge as MethodNum, &[], &[Integer]),
        ("getPower", Method::GetPower as MethodNum, &[], &[Integer]),
        ("submitPoSt", Method::SubmitPoSt as MethodNum, &[Bytes], &[]),
        ("getProvingPeriodStart", Method::GetProvingPeriodStart as MethodNum, &[], &[BlockHeight]),
        (
            "getSectorCommitments",
            Method::GetSectorCommitments as MethodNum,
            &[],
            &[CommitmentsMap],
        ),
    ];
    TABLE
        .iter()
        .map(|&(name, method_num, params, ret)| {
            (name, FunctionSignature { method_num, params, ret })
        })
        .collect()
}

fn require_caller_is_owner(caller: &Address, st: &State) -> Result<(), ActorError> {
    if *caller != st.owner {
        return Err(ActorError::unchecked(
            ERR_CALLER_UNAUTHORIZED,
            "not authorized to call the method".to_string(),
        ));
    }
    Ok(())
}

/// Miner Actor
pub struct Actor;

impl Actor {
    /// Stores this miner's initial state. Invoked by the VM at actor genesis,
    /// before any user message; not part of the exported-method table, so no
    /// gas prelude applies.
    pub fn constructor(
        rt: &mut impl Runtime,
        params: ConstructorParams,
    ) -> Result<(), ActorError> {
        if params.public_key.len() > MAX_PUBLIC_KEY_SIZE {
            return Err(ActorError::unchecked(
                ERR_PUBLIC_KEY_TOO_BIG,
                format!("public key must be less than {} bytes", MAX_PUBLIC_KEY_SIZE),
            ));
        }
        let st = State::new(
            params.owner,
            params.public_key,
            params.pledge_sectors,
            params.peer_id,
            params.collateral,
        );
        rt.create(&st)?;
        Ok(())
    }

    /// Adds an ask to this miner's ask book and returns its id. Expired asks
    /// are pruned from the book on the way.
    pub fn add_ask(rt: &mut impl Runtime, params: AddAskParams) -> Result<BigInt, ActorError> {
        rt.charge_gas("addAsk", GAS_PER_METHOD)?;

        let caller = rt.message().caller();
        let curr = rt.curr_epoch();
        rt.transaction(|st: &mut State, _rt| {
            require_caller_is_owner(&caller, st)?;

            let id = st.next_ask_id.clone();
            st.next_ask_id += 1u64;

            // Asks expiring at exactly the current height are already dead.
            st.asks.retain(|a| a.expiry > curr);

            let lifetime = params
                .expiry
                .to_u64()
                .ok_or_else(|| actor_error!(revert; "expiry was invalid"))?;
            let expiry = curr
                .checked_add_unsigned(lifetime)
                .ok_or_else(|| actor_error!(revert; "expiry was invalid"))?;

            st.asks.push(Ask { price: params.price.clone(), expiry, id: id.clone() });
            Ok(id)
        })
    }

    /// Returns the ids of all stored asks, including any that have expired
    /// since the book was last pruned.
    pub fn get_asks(rt: &mut impl Runtime) -> Result<Vec<u64>, ActorError> {
        rt.charge_gas("getAsks", GAS_PER_METHOD)?;
        let st: State = rt.state()?;
        st.asks
            .iter()
            .map(|ask| {
                ask.id.to_u64().ok_or_else(
                    || actor_error!(illegal_state; "ask has invalid id (bad invariant)"),
                )
            })
            .collect()
    }

    /// Returns the serialized ask with the given id, or a serialized nil when
    /// there is no match.
    pub fn get_ask(rt: &mut impl Runtime, params: GetAskParams) -> Result<RawBytes, ActorError> {
        rt.charge_gas("getAsk", GAS_PER_METHOD)?;
        let st: State = rt.state()?;
        let ask = st.asks.iter().find(|a| a.id == params.id);
        Ok(RawBytes::serialize(&ask)?)
    }

    pub fn get_owner(rt: &mut impl Runtime) -> Result<Address, ActorError> {
        rt.charge_gas("getOwner", GAS_PER_METHOD)?;
        let st: State = rt.state()?;
        Ok(st.owner)
    }

    pub fn get_last_used_sector_id(rt: &mut impl Runtime) -> Result<SectorNumber, ActorError> {
        rt.charge_gas("getLastUsedSectorID", GAS_PER_METHOD)?;
        let st: State = rt.state()?;
        Ok(st.last_used_sector_id)
    }

    /// Records a commitment to a new sector, grows this miner's power by one
    /// and reports the change to the storage market. The seal proof is
    /// carried with the message but not verified here.
    pub fn commit_sector(
        rt: &mut impl Runtime,
        params: CommitSectorParams,
    ) -> Result<(), ActorError> {
        rt.charge_gas("commitSector", GAS_PER_METHOD)?;

        let comm_d = Commitment::try_from(params.comm_d.as_slice())
            .map_err(|_| actor_error!(revert; "invalid sized commD"))?;
        let comm_r = Commitment::try_from(params.comm_r.as_slice())
            .map_err(|_| actor_error!(revert; "invalid sized commR"))?;
        let comm_r_star = Commitment::try_from(params.comm_r_star.as_slice())
            .map_err(|_| actor_error!(revert; "invalid sized commRStar"))?;

        let caller = rt.message().caller();
        let curr = rt.curr_epoch();
        rt.transaction(|st: &mut State, _rt| {
            require_caller_is_owner(&caller, st)?;

            if st.has_sector(params.sector_id) {
                return Err(ActorError::unchecked(
                    ERR_SECTOR_COMMITTED,
                    "sector already committed".to_string(),
                ));
            }

            // The first commitment opens the miner's proving window.
            if st.power.is_zero() {
                st.proving_period_start = Some(curr);
            }
            st.power += 1u64;
            st.add_commitment(params.sector_id, Commitments { comm_d, comm_r, comm_r_star });
            st.last_used_sector_id = params.sector_id;
            Ok(())
        })?;

        info!("miner {} committed sector {}", rt.message().receiver(), params.sector_id);

        let delta = BigInt::from(1);
        let ret = rt.send(
            &STORAGE_MARKET_ACTOR_ADDR,
            ext::storage_market::UPDATE_POWER_METHOD,
            RawBytes::serialize(ext::storage_market::UpdatePowerParams { delta })?,
            TokenAmount::zero(),
        )?;
        if !ret.exit_code.is_success() {
            return Err(ActorError::unchecked(
                ERR_STORAGEMARKET_CALL_FAILED,
                format!("call to StorageMarket failed (code {})", ret.exit_code),
            ));
        }
        Ok(())
    }

    pub fn get_key(rt: &mut impl Runtime) -> Result<Vec<u8>, ActorError> {
        rt.charge_gas("getKey", GAS_PER_METHOD)?;
        let st: State = rt.state()?;
        Ok(st.public_key)
    }

    pub fn get_peer_id(rt: &mut impl Runtime) -> Result<Vec<u8>, ActorError> {
        rt.charge_gas("getPeerID", GAS_PER_METHOD)?;
        let st: State = rt.state()?;
        Ok(st.peer_id)
    }

    pub fn update_peer_id(
        rt: &mut impl Runtime,
        params: UpdatePeerIDParams,
    ) -> Result<(), ActorError> {
        rt.charge_gas("updatePeerID", GAS_PER_METHOD)?;
        let caller = rt.message().caller();
        rt.transaction(|st: &mut State, _rt| {
            require_caller_is_owner(&caller, st)?;
            st.peer_id = params.peer_id;
            Ok(())
        })
    }

    pub fn get_pledge(rt: &mut impl Runtime) -> Result<BigInt, ActorError> {
        rt.charge_gas("getPledge", GAS_PER_METHOD)?;
        let st: State = rt.state()?;
        Ok(st.pledge_sectors)
    }

    /// Returns the number of sectors counted towards this miner's consensus
    /// weight.
    pub fn get_power(rt: &mut impl Runtime) -> Result<BigInt, ActorError> {
        rt.charge_gas("getPower", GAS_PER_METHOD)?;
        let st: State = rt.state()?;
        Ok(st.power)
    }

    /// Verifies a proof of spacetime over all committed sectors and, when it
    /// arrives within the open proving window, slides the window forward by
    /// exactly one period. The cadence stays fixed no matter where inside
    /// the window the proof lands.
    pub fn submit_post(rt: &mut impl Runtime, params: SubmitPoStParams) -> Result<(), ActorError> {
        rt.charge_gas("submitPoSt", GAS_PER_METHOD)?;

        let proof = PoStProof::try_from(params.proof.as_slice())
            .map_err(|_| actor_error!(revert; "invalid sized proof"))?;

        let st: State = rt.state()?;
        require_caller_is_owner(&rt.message().caller(), &st)?;

        let comm_rs = st.commitment_comm_rs()?;
        // TODO: derive a real challenge seed from chain randomness.
        let valid = rt
            .verify_post(&PoStVerifyInfo {
                challenge_seed: PoStChallengeSeed::default(),
                comm_rs,
                faults: Vec::new(),
                proof,
            })
            .map_err(|e| ActorError::revert(format!("failed to verify PoSt: {}", e)))?;
        if !valid {
            return Err(ActorError::unchecked(
                ERR_INVALID_POST,
                "PoSt proof did not validate".to_string(),
            ));
        }

        let curr = rt.curr_epoch();
        rt.transaction(|st: &mut State, _rt| {
            let start = st
                .proving_period_start
                .ok_or_else(|| actor_error!(illegal_state; "proving period not started"))?;
            let deadline = proving_period_end(start);
            if curr > deadline {
                warn!("PoSt submitted at height {}, past deadline {}", curr, deadline);
                return Err(actor_error!(revert; "submitted PoSt late, need to pay a fee"));
            }
            st.proving_period_start = Some(deadline);
            st.last_post = Some(curr);
            Ok(())
        })
    }

    pub fn get_proving_period_start(
        rt: &mut impl Runtime,
    ) -> Result<Option<ChainEpoch>, ActorError> {
        rt.charge_gas("getProvingPeriodStart", GAS_PER_METHOD)?;
        let st: State = rt.state()?;
        Ok(st.proving_period_start)
    }

    pub fn get_sector_commitments(
        rt: &mut impl Runtime,
    ) -> Result<BTreeMap<String, Commitments>, ActorError> {
        rt.charge_gas("getSectorCommitments", GAS_PER_METHOD)?;
        let st: State = rt.state()?;
        Ok(st.sector_commitments)
    }
}

impl ActorCode for Actor {
    fn invoke_method<RT>(
        rt: &mut RT,
        method: MethodNum,
        params: &RawBytes,
    ) -> Result<RawBytes, ActorError>
    where
        RT: Runtime,
    {
        match FromPrimitive::from_u64(method) {
            Some(Method::Constructor) => {
                Self::constructor(rt, params.deserialize()?)?;
                Ok(RawBytes::default())
            }
            Some(Method::AddAsk) => {
                let id = Self::add_ask(rt, params.deserialize()?)?;
                Ok(RawBytes::serialize(BigIntSer(&id))?)
            }
            Some(Method::GetAsks) => {
                let ids = Self::get_asks(rt)?;
                Ok(RawBytes::serialize(ids)?)
            }
            Some(Method::GetAsk) => {
                let ask = Self::get_ask(rt, params.deserialize()?)?;
                Ok(RawBytes::serialize(BytesSer(ask.bytes()))?)
            }
            Some(Method::GetOwner) => {
                let owner = Self::get_owner(rt)?;
                Ok(RawBytes::serialize(owner)?)
            }
            Some(Method::GetLastUsedSectorID) => {
                let id = Self::get_last_used_sector_id(rt)?;
                Ok(RawBytes::serialize(id)?)
            }
            Some(Method::CommitSector) => {
                Self::commit_sector(rt, params.deserialize()?)?;
                Ok(RawBytes::default())
            }
            Some(Method::GetKey) => {
                let key = Self::get_key(rt)?;
                Ok(RawBytes::serialize(BytesSer(&key))?)
            }
            Some(Method::GetPeerID) => {
                let peer_id = Self::get_peer_id(rt)?;
                Ok(RawBytes::serialize(BytesSer(&peer_id))?)
            }
            Some(Method::UpdatePeerID) => {
                Self::update_peer_id(rt, params.deserialize()?)?;
                Ok(RawBytes::default())
            }
            Some(Method::GetPledge) => {
                let pledge = Self::get_pledge(rt)?;
                Ok(RawBytes::serialize(BigIntSer(&pledge))?)
            }
            Some(Method::GetPower) => {
                let power = Self::get_power(rt)?;
                Ok(RawBytes::serialize(BigIntSer(&power))?)
            }
            Some(Method::SubmitPoSt) => {
                Self::submit_post(rt, params.deserialize()?)?;
                Ok(RawBytes::default())
            }
            Some(Method::GetProvingPeriodStart) => {
                let start = Self::get_proving_period_start(rt)?;
                Ok(RawBytes::serialize(start)?)
            }
            Some(Method::GetSectorCommitments) => {
                let commitments = Self::get_sector_commitments(rt)?;
                Ok(RawBytes::serialize(commitments)?)
            }
            None => Err(actor_error!(unhandled_message; "invalid method: {}", method)),
        }
    }
}
