#![allow(dead_code)]

use fvm_ipld_encoding::RawBytes;
use fvm_shared::address::Address;
use fvm_shared::bigint::bigint_ser::BigIntDe;
use fvm_shared::bigint::BigInt;
use fvm_shared::econ::TokenAmount;
use fvm_shared::error::ExitCode;
use fvm_shared::sector::SectorNumber;
use fvm_shared::MethodNum;
use lazy_static::lazy_static;
use num_traits::Zero;

use fil_actor_miner::testing::check_state_invariants;
use fil_actor_miner::{
    ext, Actor, AddAskParams, CommitSectorParams, ConstructorParams, Method, State,
    SubmitPoStParams,
};
use fil_actors_runtime::sector::{
    Commitment, Commitments, PoStChallengeSeed, PoStProof, PoStVerifyInfo, POST_PROOF_BYTES_LEN,
};
use fil_actors_runtime::test_utils::MockRuntime;
use fil_actors_runtime::{ActorError, FIRST_NON_SINGLETON_ADDR, STORAGE_MARKET_ACTOR_ADDR};

pub const OWNER: Address = Address::new_id(FIRST_NON_SINGLETON_ADDR + 1);
pub const NON_OWNER: Address = Address::new_id(FIRST_NON_SINGLETON_ADDR + 2);
pub const RECEIVER: Address = Address::new_id(1000);

lazy_static! {
    pub static ref DEFAULT_PLEDGE: BigInt = BigInt::from(100);
    pub static ref DEFAULT_COLLATERAL: TokenAmount = TokenAmount::from_atto(1000);
}

pub struct ActorHarness {
    pub owner: Address,
    pub receiver: Address,
}

impl Default for ActorHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl ActorHarness {
    pub fn new() -> Self {
        Self { owner: OWNER, receiver: RECEIVER }
    }

    pub fn new_runtime(&self) -> MockRuntime {
        MockRuntime { receiver: self.receiver, caller: self.owner, ..Default::default() }
    }

    pub fn constructor_params(&self) -> ConstructorParams {
        ConstructorParams {
            owner: self.owner,
            public_key: b"miner-key".to_vec(),
            pledge_sectors: DEFAULT_PLEDGE.clone(),
            peer_id: b"miner-peer".to_vec(),
            collateral: DEFAULT_COLLATERAL.clone(),
        }
    }

    pub fn construct_and_verify(&self, rt: &mut MockRuntime) {
        let params = self.constructor_params();
        let ret = rt
            .call::<Actor>(
                Method::Constructor as MethodNum,
                &RawBytes::serialize(params).unwrap(),
            )
            .unwrap();
        assert_eq!(RawBytes::default(), ret);
        rt.verify();
    }

    pub fn get_state(&self, rt: &MockRuntime) -> State {
        rt.get_state()
    }

    pub fn check_state(&self, rt: &MockRuntime) {
        let violations = check_state_invariants(&self.get_state(rt));
        assert!(violations.is_empty(), "state invariants violated: {:?}", violations);
    }

    /// Adds an ask with the given lifetime, returning the assigned id.
    pub fn add_ask(
        &self,
        rt: &mut MockRuntime,
        price: TokenAmount,
        lifetime: u64,
    ) -> Result<BigInt, ActorError> {
        let params = AddAskParams { price, expiry: BigInt::from(lifetime) };
        let ret =
            rt.call::<Actor>(Method::AddAsk as MethodNum, &RawBytes::serialize(params).unwrap())?;
        let BigIntDe(id) = ret.deserialize().unwrap();
        Ok(id)
    }

    pub fn commit_params(&self, sector_id: SectorNumber, seed: u8) -> CommitSectorParams {
        CommitSectorParams {
            sector_id,
            comm_d: make_commitment(seed).0.to_vec(),
            comm_r: make_commitment(seed.wrapping_add(1)).0.to_vec(),
            comm_r_star: make_commitment(seed.wrapping_add(2)).0.to_vec(),
            proof: vec![0xde; 64],
        }
    }

    /// Declares the storage-market power update the next commit should issue.
    pub fn expect_update_power(&self, rt: &mut MockRuntime, exit_code: ExitCode) {
        rt.expect_send(
            STORAGE_MARKET_ACTOR_ADDR,
            ext::storage_market::UPDATE_POWER_METHOD,
            RawBytes::serialize(ext::storage_market::UpdatePowerParams {
                delta: BigInt::from(1),
            })
            .unwrap(),
            TokenAmount::zero(),
            RawBytes::default(),
            exit_code,
        );
    }

    pub fn commit_sector(
        &self,
        rt: &mut MockRuntime,
        params: CommitSectorParams,
    ) -> Result<RawBytes, ActorError> {
        rt.call::<Actor>(Method::CommitSector as MethodNum, &RawBytes::serialize(params).unwrap())
    }

    /// Commits a sector expecting full success, market call included.
    pub fn commit_sector_and_verify(
        &self,
        rt: &mut MockRuntime,
        sector_id: SectorNumber,
        seed: u8,
    ) {
        self.expect_update_power(rt, ExitCode::OK);
        let ret = self.commit_sector(rt, self.commit_params(sector_id, seed)).unwrap();
        assert_eq!(RawBytes::default(), ret);
        rt.verify();
    }

    /// The comm_r the harness committed for a sector via `commit_params`.
    pub fn committed_comm_r(&self, seed: u8) -> Commitment {
        make_commitment(seed.wrapping_add(1))
    }

    pub fn expect_verify_post(
        &self,
        rt: &mut MockRuntime,
        comm_rs: Vec<Commitment>,
        proof: &[u8],
        result: anyhow::Result<bool>,
    ) {
        rt.expect_verify_post(
            PoStVerifyInfo {
                challenge_seed: PoStChallengeSeed::default(),
                comm_rs,
                faults: Vec::new(),
                proof: PoStProof::try_from(proof).unwrap(),
            },
            result,
        );
    }

    pub fn submit_post(
        &self,
        rt: &mut MockRuntime,
        proof: &[u8],
    ) -> Result<RawBytes, ActorError> {
        let params = SubmitPoStParams { proof: proof.to_vec() };
        rt.call::<Actor>(Method::SubmitPoSt as MethodNum, &RawBytes::serialize(params).unwrap())
    }
}

pub fn make_commitment(seed: u8) -> Commitment {
    Commitment([seed; 32])
}

pub fn make_post_proof(seed: u8) -> Vec<u8> {
    vec![seed; POST_PROOF_BYTES_LEN]
}

pub fn all_commitments(st: &State) -> Vec<(String, Commitments)> {
    st.sector_commitments.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}
