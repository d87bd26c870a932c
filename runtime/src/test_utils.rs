// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;

use cid::Cid;
use fvm_ipld_blockstore::MemoryBlockstore;
use fvm_ipld_encoding::{CborStore, RawBytes};
use fvm_shared::address::Address;
use fvm_shared::clock::ChainEpoch;
use fvm_shared::econ::TokenAmount;
use fvm_shared::error::ExitCode;
use fvm_shared::MethodNum;
use multihash::Code;
use num_traits::Zero;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::runtime::{ActorCode, MessageInfo, Response, Runtime, Verifier};
use crate::sector::PoStVerifyInfo;
use crate::{actor_error, ActorError};

/// A mock VM runtime for unit-testing actor code.
///
/// Fixture fields are public and set directly by tests. Side effects the
/// actor is expected to perform (sends, proof verifications) are declared
/// up-front with the `expect_*` methods and checked off as the actor runs;
/// `verify` asserts that none were left unconsumed.
pub struct MockRuntime {
    pub epoch: ChainEpoch,
    pub receiver: Address,
    pub caller: Address,
    pub value_received: TokenAmount,
    /// Gas budget of the calling message. Charges past the limit abort with
    /// `SYS_OUT_OF_GAS`, like the real meter.
    pub gas_limit: i64,
    pub gas_used: i64,

    pub store: MemoryBlockstore,
    pub state: Option<Cid>,
    pub in_transaction: bool,

    pub expectations: RefCell<Expectations>,
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self {
            epoch: 0,
            receiver: Address::new_id(0),
            caller: Address::new_id(0),
            value_received: TokenAmount::zero(),
            gas_limit: i64::MAX,
            gas_used: 0,
            store: MemoryBlockstore::default(),
            state: None,
            in_transaction: false,
            expectations: Default::default(),
        }
    }
}

#[derive(Default)]
pub struct Expectations {
    pub expect_sends: VecDeque<ExpectedSend>,
    pub expect_verify_post: Option<ExpectedVerifyPoSt>,
}

#[derive(Debug)]
pub struct ExpectedSend {
    pub to: Address,
    pub method: MethodNum,
    pub params: RawBytes,
    pub value: TokenAmount,
    pub send_return: RawBytes,
    pub exit_code: ExitCode,
}

pub struct ExpectedVerifyPoSt {
    pub info: PoStVerifyInfo,
    pub result: anyhow::Result<bool>,
}

impl MockRuntime {
    /// Invokes an actor method the way the VM would: on failure all state
    /// mutations made by the method are discarded.
    pub fn call<A: ActorCode>(
        &mut self,
        method_num: MethodNum,
        params: &RawBytes,
    ) -> Result<RawBytes, ActorError> {
        let prior_root = self.state;
        let res = A::invoke_method(self, method_num, params);
        if res.is_err() {
            self.state = prior_root;
            self.in_transaction = false;
        }
        res
    }

    pub fn get_state<T: DeserializeOwned>(&self) -> T {
        let root = self.state.expect("no state root");
        self.store.get_cbor(&root).unwrap().expect("no state found at root")
    }

    /// Overwrites the actor's state cell, bypassing actor code. Used to set
    /// up states that no exported method can produce.
    pub fn replace_state<T: Serialize>(&mut self, st: &T) {
        self.state = Some(self.store.put_cbor(st, Code::Blake2b256).unwrap());
    }

    pub fn expect_send(
        &mut self,
        to: Address,
        method: MethodNum,
        params: RawBytes,
        value: TokenAmount,
        send_return: RawBytes,
        exit_code: ExitCode,
    ) {
        self.expectations.get_mut().expect_sends.push_back(ExpectedSend {
            to,
            method,
            params,
            value,
            send_return,
            exit_code,
        });
    }

    pub fn expect_verify_post(&mut self, info: PoStVerifyInfo, result: anyhow::Result<bool>) {
        let prev = self
            .expectations
            .get_mut()
            .expect_verify_post
            .replace(ExpectedVerifyPoSt { info, result });
        assert!(prev.is_none(), "expect_verify_post already set");
    }

    /// Asserts that all declared expectations were consumed, then resets.
    pub fn verify(&mut self) {
        let expectations = self.expectations.get_mut();
        assert!(
            expectations.expect_sends.is_empty(),
            "expected sends not performed: {:?}",
            expectations.expect_sends
        );
        assert!(
            expectations.expect_verify_post.is_none(),
            "expected verify_post not performed"
        );
        self.reset();
    }

    pub fn reset(&mut self) {
        self.expectations.replace(Default::default());
    }
}

impl MessageInfo for MockRuntime {
    fn caller(&self) -> Address {
        self.caller
    }
    fn receiver(&self) -> Address {
        self.receiver
    }
    fn value_received(&self) -> TokenAmount {
        self.value_received.clone()
    }
}

impl Verifier for MockRuntime {
    fn verify_post(&self, verify_info: &PoStVerifyInfo) -> anyhow::Result<bool> {
        let expected = self
            .expectations
            .borrow_mut()
            .expect_verify_post
            .take()
            .expect("unexpected call to verify_post");
        assert_eq!(expected.info, *verify_info, "unexpected verify_post info");
        expected.result
    }
}

impl Runtime for MockRuntime {
    type Blockstore = MemoryBlockstore;

    fn message(&self) -> &dyn MessageInfo {
        self
    }

    fn curr_epoch(&self) -> ChainEpoch {
        self.epoch
    }

    fn charge_gas(&mut self, _name: &'static str, compute: i64) -> Result<(), ActorError> {
        if self.gas_used.saturating_add(compute) > self.gas_limit {
            return Err(ActorError::unchecked(
                ExitCode::SYS_OUT_OF_GAS,
                "insufficient gas".to_string(),
            ));
        }
        self.gas_used += compute;
        Ok(())
    }

    fn get_state_root(&self) -> Result<Option<Cid>, ActorError> {
        Ok(self.state)
    }

    fn set_state_root(&mut self, root: &Cid) -> Result<(), ActorError> {
        self.state = Some(*root);
        Ok(())
    }

    fn store(&self) -> &Self::Blockstore {
        &self.store
    }

    fn send(
        &mut self,
        to: &Address,
        method: MethodNum,
        params: RawBytes,
        value: TokenAmount,
    ) -> Result<Response, ActorError> {
        if self.in_transaction {
            return Err(actor_error!(assertion_failed; "side-effect within transaction"));
        }
        let expected = self
            .expectations
            .get_mut()
            .expect_sends
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected send to {} method {}", to, method));
        assert_eq!(expected.to, *to, "unexpected send target");
        assert_eq!(expected.method, method, "unexpected send method");
        assert_eq!(expected.params, params, "unexpected send params");
        assert_eq!(expected.value, value, "unexpected send value");
        Ok(Response { exit_code: expected.exit_code, return_data: expected.send_return })
    }

    fn transaction<S, RT, F>(&mut self, f: F) -> Result<RT, ActorError>
    where
        S: Serialize + DeserializeOwned,
        F: FnOnce(&mut S, &mut Self) -> Result<RT, ActorError>,
    {
        if self.in_transaction {
            return Err(actor_error!(assertion_failed; "nested transaction"));
        }
        let mut st: S = self.state()?;
        self.in_transaction = true;
        let res = f(&mut st, self);
        self.in_transaction = false;
        let ret = res?;
        let root = self
            .store
            .put_cbor(&st, Code::Blake2b256)
            .map_err(|e| actor_error!(illegal_state; "failed to commit state: {}", e))?;
        self.state = Some(root);
        Ok(ret)
    }
}

/// Asserts that a method result aborted with the given exit code.
pub fn expect_abort<T: fmt::Debug>(exit_code: ExitCode, res: Result<T, ActorError>) {
    let err = res.expect_err("expected abort");
    assert_eq!(exit_code, err.exit_code(), "wrong exit code, message: {}", err.msg());
}

/// Like [`expect_abort`], additionally asserting on the error message.
pub fn expect_abort_contains_message<T: fmt::Debug>(
    exit_code: ExitCode,
    message: &str,
    res: Result<T, ActorError>,
) {
    let err = res.expect_err("expected abort");
    assert_eq!(exit_code, err.exit_code(), "wrong exit code, message: {}", err.msg());
    assert!(
        err.msg().contains(message),
        "expected message \"{}\" in \"{}\"",
        message,
        err.msg()
    );
}
