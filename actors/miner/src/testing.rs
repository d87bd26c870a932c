use fvm_shared::bigint::BigInt;
use fvm_shared::sector::SectorNumber;
use num_traits::Zero;

use crate::{State, MAX_PUBLIC_KEY_SIZE};

/// Checks the structural invariants of a miner state, returning a message
/// per violation found. Test epilogues assert the result is empty.
pub fn check_state_invariants(st: &State) -> Vec<String> {
    let mut violations = Vec::new();
    let mut check = |ok: bool, msg: &str| {
        if !ok {
            violations.push(msg.to_string());
        }
    };

    check(st.public_key.len() <= MAX_PUBLIC_KEY_SIZE, "public key exceeds maximum size");

    for ask in &st.asks {
        check(ask.id < st.next_ask_id, "ask id not below next ask id");
        check(ask.id >= BigInt::zero(), "negative ask id");
    }

    for key in st.sector_commitments.keys() {
        let canonical = key.parse::<SectorNumber>().map(|id| id.to_string() == *key);
        check(canonical == Ok(true), "sector key is not a canonical decimal id");
    }

    check(
        st.power == BigInt::from(st.sector_commitments.len()),
        "power does not equal committed sector count",
    );

    let proving = st.power > BigInt::zero() || st.last_post.is_some();
    check(st.proving_period_start.is_some() == proving, "proving period start out of sync");

    violations
}
