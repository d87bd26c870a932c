// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use multihash::Code;
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::{CborStore, RawBytes};
use fvm_shared::address::Address;
use fvm_shared::clock::ChainEpoch;
use fvm_shared::econ::TokenAmount;
use fvm_shared::error::ExitCode;
use fvm_shared::MethodNum;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::sector::PoStVerifyInfo;
use crate::{actor_error, ActorError};

/// Result of a cross-actor send. The callee's exit code is surfaced so the
/// caller can distinguish an aborted callee from a failure of the send
/// machinery itself (which is reported as an error instead).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub exit_code: ExitCode,
    pub return_data: RawBytes,
}

/// Runtime is the VM's internal runtime object.
/// This is everything that is accessible to actors, beyond parameters.
pub trait Runtime: Verifier {
    type Blockstore: Blockstore;

    /// Information related to the current message being executed.
    fn message(&self) -> &dyn MessageInfo;

    /// The current chain epoch number. The genesis block has epoch zero.
    fn curr_epoch(&self) -> ChainEpoch;

    /// Deducts `compute` gas units from the calling message's budget.
    /// `name` provides information about the gas charging point.
    /// A refused charge aborts with `ExitCode::SYS_OUT_OF_GAS` before any
    /// state has been observed.
    fn charge_gas(&mut self, name: &'static str, compute: i64) -> Result<(), ActorError>;

    /// Root of the receiver's state cell, or None before construction.
    fn get_state_root(&self) -> Result<Option<Cid>, ActorError>;

    /// Sets the state-root.
    fn set_state_root(&mut self, root: &Cid) -> Result<(), ActorError>;

    /// Returns reference to blockstore
    fn store(&self) -> &Self::Blockstore;

    /// Sends a message to another actor, returning the exit code and return
    /// value envelope. The target is resolved through the VM's address table;
    /// actors never hold references to each other. If the invoked method does
    /// not return successfully, its state changes (and those of any messages
    /// it sent in turn) will be rolled back.
    ///
    /// Must not be called while a `transaction` is open.
    fn send(
        &mut self,
        to: &Address,
        method: MethodNum,
        params: RawBytes,
        value: TokenAmount,
    ) -> Result<Response, ActorError>;

    /// Initializes the state object.
    /// This is only valid when the state has not yet been initialized.
    fn create<T: Serialize>(&mut self, obj: &T) -> Result<(), ActorError> {
        if self.get_state_root()?.is_some() {
            return Err(actor_error!(illegal_state; "state already constructed"));
        }
        let root = self.store().put_cbor(obj, Code::Blake2b256).map_err(|e| {
            actor_error!(illegal_argument; "failed to write actor state during creation: {}", e)
        })?;
        self.set_state_root(&root)
    }

    /// Loads a readonly copy of the state of the receiver into the argument.
    fn state<T: DeserializeOwned>(&self) -> Result<T, ActorError> {
        let root = self
            .get_state_root()?
            .ok_or_else(|| actor_error!(illegal_state; "actor state not constructed"))?;
        self.store()
            .get_cbor(&root)
            .map_err(|e| actor_error!(serialization; "failed to decode actor state: {}", e))?
            .ok_or_else(|| actor_error!(illegal_state; "no state at root {}", root))
    }

    /// Loads a mutable copy of the state of the receiver, passes it to `f`,
    /// and after `f` completes puts the state object back to the store and
    /// sets it as the receiver's state root. Either the full mutation is
    /// persisted or, when `f` fails, none of it is.
    ///
    /// During the call to `f`, execution is protected from side-effects,
    /// including message send.
    fn transaction<S, RT, F>(&mut self, f: F) -> Result<RT, ActorError>
    where
        S: Serialize + DeserializeOwned,
        F: FnOnce(&mut S, &mut Self) -> Result<RT, ActorError>;
}

/// Message information available to the actor about executing message.
pub trait MessageInfo {
    /// The address of the immediate calling actor.
    fn caller(&self) -> Address;

    /// The address of the actor receiving the message.
    fn receiver(&self) -> Address;

    /// The value attached to the message being processed.
    fn value_received(&self) -> TokenAmount;
}

/// Proof verification primitives provided by the runtime.
pub trait Verifier {
    /// Verifies a proof of spacetime against a set of sector commitments.
    /// `Ok(false)` means the proof did not validate; `Err` means the verifier
    /// itself failed to run.
    fn verify_post(&self, verify_info: &PoStVerifyInfo) -> anyhow::Result<bool>;
}

/// Interface for invoking methods on an actor
pub trait ActorCode {
    /// Invokes method with runtime on the actor's code. Method number will
    /// match one of the actor's exported methods.
    fn invoke_method<RT>(
        rt: &mut RT,
        method: MethodNum,
        params: &RawBytes,
    ) -> Result<RawBytes, ActorError>
    where
        RT: Runtime;
}
