use fvm_ipld_encoding::{from_slice, BytesDe, RawBytes};
use fvm_shared::bigint::BigInt;
use fvm_shared::econ::TokenAmount;
use fvm_shared::error::ExitCode;
use fvm_shared::MethodNum;

use fil_actor_miner::{
    Actor, AddAskParams, Ask, GetAskParams, Method, ERR_CALLER_UNAUTHORIZED, GAS_PER_METHOD,
};
use fil_actors_runtime::test_utils::{expect_abort, expect_abort_contains_message, MockRuntime};
use fil_actors_runtime::EXIT_REVERT;

mod util;
use util::*;

fn get_ask_ids(rt: &mut MockRuntime) -> Vec<u64> {
    rt.call::<Actor>(Method::GetAsks as MethodNum, &RawBytes::default())
        .unwrap()
        .deserialize()
        .unwrap()
}

#[test]
fn ask_lifecycle_follows_expiry() {
    let h = ActorHarness::new();
    let mut rt = h.new_runtime();
    h.construct_and_verify(&mut rt);

    rt.epoch = 10;
    let id = h.add_ask(&mut rt, TokenAmount::from_atto(5), 100).unwrap();
    assert_eq!(BigInt::from(0), id);
    let st = h.get_state(&rt);
    assert_eq!(1, st.asks.len());
    assert_eq!(110, st.asks[0].expiry);

    rt.epoch = 50;
    let id = h.add_ask(&mut rt, TokenAmount::from_atto(7), 50).unwrap();
    assert_eq!(BigInt::from(1), id);
    let st = h.get_state(&rt);
    assert_eq!(2, st.asks.len());
    assert_eq!(100, st.asks[1].expiry);

    // Both prior asks lapsed at heights 110 and 100; adding a third prunes
    // them from the book.
    rt.epoch = 200;
    let id = h.add_ask(&mut rt, TokenAmount::from_atto(9), 10).unwrap();
    assert_eq!(BigInt::from(2), id);
    let st = h.get_state(&rt);
    assert_eq!(1, st.asks.len());
    assert_eq!(BigInt::from(2), st.asks[0].id);
    assert_eq!(210, st.asks[0].expiry);
    assert_eq!(TokenAmount::from_atto(9), st.asks[0].price);
    assert_eq!(BigInt::from(3), st.next_ask_id);
    h.check_state(&rt);
}

#[test]
fn add_ask_rejects_non_owner() {
    let h = ActorHarness::new();
    let mut rt = h.new_runtime();
    h.construct_and_verify(&mut rt);

    rt.epoch = 10;
    rt.caller = NON_OWNER;
    let prior_root = rt.state;
    let params = AddAskParams { price: TokenAmount::from_atto(5), expiry: BigInt::from(100) };
    expect_abort(
        ERR_CALLER_UNAUTHORIZED,
        rt.call::<Actor>(Method::AddAsk as MethodNum, &RawBytes::serialize(params).unwrap()),
    );
    assert_eq!(prior_root, rt.state);

    let st = h.get_state(&rt);
    assert!(st.asks.is_empty());
    assert_eq!(BigInt::from(0), st.next_ask_id);
}

#[test]
fn ask_ids_are_assigned_monotonically() {
    let h = ActorHarness::new();
    let mut rt = h.new_runtime();
    h.construct_and_verify(&mut rt);

    rt.epoch = 1;
    for expected in 0u64..5 {
        let id = h.add_ask(&mut rt, TokenAmount::from_atto(1), 1000).unwrap();
        assert_eq!(BigInt::from(expected), id);
    }

    // A rejected call burns no id.
    rt.caller = NON_OWNER;
    let params = AddAskParams { price: TokenAmount::from_atto(1), expiry: BigInt::from(1000) };
    expect_abort(
        ERR_CALLER_UNAUTHORIZED,
        rt.call::<Actor>(Method::AddAsk as MethodNum, &RawBytes::serialize(params).unwrap()),
    );
    rt.caller = OWNER;
    let id = h.add_ask(&mut rt, TokenAmount::from_atto(1), 1000).unwrap();
    assert_eq!(BigInt::from(5), id);
    h.check_state(&rt);
}

#[test]
fn pruning_is_strict_at_the_current_height() {
    let h = ActorHarness::new();
    let mut rt = h.new_runtime();
    h.construct_and_verify(&mut rt);

    rt.epoch = 0;
    h.add_ask(&mut rt, TokenAmount::from_atto(1), 10).unwrap(); // expiry 10
    h.add_ask(&mut rt, TokenAmount::from_atto(2), 11).unwrap(); // expiry 11

    // At height 10 the first ask is exactly at expiry and is dropped; the
    // second still has a block to live.
    rt.epoch = 10;
    h.add_ask(&mut rt, TokenAmount::from_atto(3), 5).unwrap();
    let st = h.get_state(&rt);
    let ids: Vec<BigInt> = st.asks.iter().map(|a| a.id.clone()).collect();
    assert_eq!(vec![BigInt::from(1), BigInt::from(2)], ids);
    h.check_state(&rt);
}

#[test]
fn ask_lifetime_must_fit_u64() {
    let h = ActorHarness::new();
    let mut rt = h.new_runtime();
    h.construct_and_verify(&mut rt);

    let prior_root = rt.state;
    let params = AddAskParams {
        price: TokenAmount::from_atto(5),
        expiry: BigInt::from(u64::MAX) + 1u64,
    };
    expect_abort_contains_message(
        EXIT_REVERT,
        "expiry was invalid",
        rt.call::<Actor>(Method::AddAsk as MethodNum, &RawBytes::serialize(params).unwrap()),
    );

    let params = AddAskParams { price: TokenAmount::from_atto(5), expiry: BigInt::from(-1) };
    expect_abort_contains_message(
        EXIT_REVERT,
        "expiry was invalid",
        rt.call::<Actor>(Method::AddAsk as MethodNum, &RawBytes::serialize(params).unwrap()),
    );
    assert_eq!(prior_root, rt.state);
}

#[test]
fn get_asks_returns_expired_ids_untouched() {
    let h = ActorHarness::new();
    let mut rt = h.new_runtime();
    h.construct_and_verify(&mut rt);

    rt.epoch = 10;
    h.add_ask(&mut rt, TokenAmount::from_atto(5), 100).unwrap();
    rt.epoch = 50;
    h.add_ask(&mut rt, TokenAmount::from_atto(7), 50).unwrap();

    // Well past both expiries: reading does not garbage-collect.
    rt.epoch = 200;
    assert_eq!(vec![0u64, 1], get_ask_ids(&mut rt));
    let st = h.get_state(&rt);
    assert_eq!(2, st.asks.len());
}

#[test]
fn get_ask_returns_ask_or_nil() {
    let h = ActorHarness::new();
    let mut rt = h.new_runtime();
    h.construct_and_verify(&mut rt);

    rt.epoch = 10;
    h.add_ask(&mut rt, TokenAmount::from_atto(5), 100).unwrap();

    let params = GetAskParams { id: BigInt::from(0) };
    let BytesDe(bytes) = rt
        .call::<Actor>(Method::GetAsk as MethodNum, &RawBytes::serialize(params).unwrap())
        .unwrap()
        .deserialize()
        .unwrap();
    let ask: Option<Ask> = from_slice(&bytes).unwrap();
    let ask = ask.unwrap();
    assert_eq!(BigInt::from(0), ask.id);
    assert_eq!(110, ask.expiry);
    assert_eq!(TokenAmount::from_atto(5), ask.price);

    let params = GetAskParams { id: BigInt::from(99) };
    let BytesDe(bytes) = rt
        .call::<Actor>(Method::GetAsk as MethodNum, &RawBytes::serialize(params).unwrap())
        .unwrap()
        .deserialize()
        .unwrap();
    let ask: Option<Ask> = from_slice(&bytes).unwrap();
    assert_eq!(None, ask);
}

#[test]
fn get_asks_faults_on_oversized_id() {
    let h = ActorHarness::new();
    let mut rt = h.new_runtime();
    h.construct_and_verify(&mut rt);

    // No exported method can produce an id beyond 64 bits; plant one to
    // check the fault path.
    let mut st = h.get_state(&rt);
    let giant = BigInt::from(u64::MAX) + 2u64;
    st.asks.push(Ask { price: TokenAmount::from_atto(1), expiry: 100, id: giant.clone() });
    st.next_ask_id = giant + 1u64;
    rt.replace_state(&st);

    expect_abort(
        ExitCode::USR_ILLEGAL_STATE,
        rt.call::<Actor>(Method::GetAsks as MethodNum, &RawBytes::default()),
    );
}

#[test]
fn refused_gas_charge_leaves_ask_book_untouched() {
    let h = ActorHarness::new();
    let mut rt = h.new_runtime();
    h.construct_and_verify(&mut rt);

    rt.gas_limit = GAS_PER_METHOD - 1;
    let prior_root = rt.state;
    let params = AddAskParams { price: TokenAmount::from_atto(5), expiry: BigInt::from(100) };
    expect_abort(
        ExitCode::SYS_OUT_OF_GAS,
        rt.call::<Actor>(Method::AddAsk as MethodNum, &RawBytes::serialize(params).unwrap()),
    );
    assert_eq!(prior_root, rt.state);
}
