//! End-to-end tests across the engine, commitments, tree and circuits.

use ark_bn254::{Bn254, Fr};
use ark_ff::Zero;
use ark_groth16::Groth16;
use ark_snark::SNARK;
use ark_std::rand::{rngs::StdRng, SeedableRng};
use num_bigint::BigUint;

use crate::commitment::compute_commitment;
use crate::error::WalletError;
use crate::field::field_to_decimal;
use crate::inputs::InputLayout;
use crate::keys::WalletKeys;
use crate::merkle::CommitmentTree;
use crate::poseidon::PoseidonHasher;
use crate::state::{Side, WalletParams, WalletState};
use crate::transition::{Action, OrderAction, OrderData, StateTransitionEngine, Transfer};
use crate::update::{prepare_update_with_rng, UpdateRequest};
use crate::wallet_init::{initial_commitment, WalletInitCircuit};

fn big(v: u64) -> BigUint {
    BigUint::from(v)
}

fn scenario_b_order() -> OrderData {
    OrderData {
        price: big(10),
        qty: big(5),
        side: Side::Buy.code().into(),
        token_in: 1,
        token_out: 0,
    }
}

/// Scenario A: deposit 100 of token 0 into an empty wallet
#[test]
fn test_scenario_a_deposit() {
    let engine = StateTransitionEngine::default();
    let old = WalletState::empty(WalletParams::default());

    let (new, ops) = engine
        .apply_action(&old, &Action::Transfer(Transfer::deposit(0, 100u32)))
        .unwrap();

    let mut expected = vec![big(0); 10];
    expected[0] = big(100);
    assert_eq!(new.available_balances, expected);
    assert_eq!(new.nonce, 0);

    let json = serde_json::to_value(&ops).unwrap();
    assert_eq!(json["transfer"]["direction"], 0);
    assert_eq!(json["transfer"]["token_index"], 0);
    assert_eq!(json["transfer"]["amount"], "100");
    assert_eq!(json["operation_type"], 0);
}

/// Scenarios B and C: create a buy order, then cancel it
#[test]
fn test_scenarios_b_and_c_create_then_cancel() {
    let engine = StateTransitionEngine::default();
    let mut old = WalletState::empty(WalletParams::default());
    old.available_balances[1] = big(1000);

    let (after_create, _) = engine
        .apply_action(&old, &Action::Order(OrderAction::create(0, scenario_b_order())))
        .unwrap();
    assert_eq!(after_create.available_balances[1], big(950));
    assert_eq!(after_create.reserved_balances[1], big(50));
    let stored = after_create.orders_list[0].as_ref().unwrap();
    assert_eq!(stored.side, Side::Buy);
    assert_eq!(stored.price, big(10));

    let (after_cancel, _) = engine
        .apply_action(&after_create, &Action::Order(OrderAction::cancel(0)))
        .unwrap();
    assert_eq!(after_cancel.available_balances[1], big(1000));
    assert_eq!(after_cancel.reserved_balances[1], big(0));
    assert!(after_cancel.orders_list[0].is_none());
    assert_eq!(after_cancel, old);
}

/// Scenario D: the empty wallet under pk_root = 1, pk_match = 2, blinder = 3
/// commits to a fixed value. Any change to the hash parameters moves it.
#[test]
fn test_scenario_d_empty_commitment_vector() {
    let hasher = PoseidonHasher::new();
    let state = WalletState::empty(WalletParams::default());
    let commitment = compute_commitment(
        &hasher,
        &state,
        Fr::from(1u64),
        Fr::from(2u64),
        Fr::from(3u64),
    )
    .unwrap();

    assert_eq!(
        field_to_decimal(&commitment),
        "7202670868082781018277338307849786011937841297257750116199605462285928708161"
    );
}

/// Balances stay consistent over a long sequence of accepted and rejected actions.
#[test]
fn test_reservations_hold_over_action_sequence() {
    let engine = StateTransitionEngine::default();
    let mut rng = StdRng::seed_from_u64(7);
    let mut state = WalletState::empty(WalletParams::default());

    let sell = |slot: usize, qty: u64| {
        Action::Order(OrderAction::create(
            slot,
            OrderData {
                price: big(3),
                qty: big(qty),
                side: Side::Sell.code().into(),
                token_in: 2,
                token_out: 1,
            },
        ))
    };
    let actions = vec![
        Action::Transfer(Transfer::deposit(1, 500u32)),
        Action::Combined {
            transfer: Transfer::deposit(1, 20u32),
            order: OrderAction::create(1, scenario_b_order()),
        },
        sell(2, 100),
        sell(3, 10_000),
        Action::Transfer(Transfer::withdraw(1, 1_000u32)),
        Action::Order(OrderAction::cancel(1)),
        Action::Transfer(Transfer::withdraw(1, 420u32)),
        Action::Order(OrderAction::cancel(2)),
    ];

    let mut accepted = 0;
    for action in &actions {
        if let Ok((next, _)) = engine.apply_action_with_rng(&state, action, &mut rng) {
            next.check_reservations().unwrap();
            state = next;
            accepted += 1;
        }
    }
    assert_eq!(accepted, 6);
    assert_eq!(state.available_balances[1], big(100));
    assert!(state.reserved_balances.iter().all(|r| r.is_zero()));
    assert_eq!(state.open_orders(), 0);
}

fn update_fixture() -> (PoseidonHasher, WalletKeys, UpdateRequest, CommitmentTree<PoseidonHasher>) {
    let hasher = PoseidonHasher::new();
    let keys = WalletKeys::from_sk_root(&hasher, Fr::from(424242u64), 1);

    let mut old_state = WalletState::empty(WalletParams::default());
    old_state.available_balances[1] = big(1000);
    old_state.nonce = 2;
    let old_commitment = compute_commitment(
        &hasher,
        &old_state,
        keys.pk_root,
        keys.pk_match,
        keys.blinder(&hasher, 2),
    )
    .unwrap();

    let mut tree = CommitmentTree::new(hasher.clone());
    tree.insert(3, Fr::from(999u64)).unwrap();
    tree.insert(6, old_commitment).unwrap();

    let request = UpdateRequest {
        user_secret: "hunter2".to_string(),
        pk_root: keys.pk_root,
        pk_match: keys.pk_match,
        blinder_seed: keys.blinder_seed,
        old_state,
        action: Action::Combined {
            transfer: Transfer::deposit(0, 5u32),
            order: OrderAction::create(2, scenario_b_order()),
        },
        old_root: tree.root(),
        path: tree.path(6).unwrap(),
    };
    (hasher, keys, request, tree)
}

#[test]
fn test_prepare_update_end_to_end() {
    let (hasher, keys, request, _) = update_fixture();
    let engine = StateTransitionEngine::default();
    let mut rng = StdRng::seed_from_u64(1);

    let prepared = prepare_update_with_rng(&hasher, &engine, &request, &mut rng).unwrap();

    assert_eq!(prepared.new_state.nonce, 3);
    assert_eq!(request.old_state.nonce, 2);
    assert_eq!(prepared.new_state.available_balances[0], big(5));
    assert_eq!(prepared.new_state.reserved_balances[1], big(50));

    let expected_new = compute_commitment(
        &hasher,
        &prepared.new_state,
        keys.pk_root,
        keys.pk_match,
        keys.blinder(&hasher, 3),
    )
    .unwrap();
    assert_eq!(prepared.new_commitment, expected_new);
    assert_eq!(prepared.old_root, request.old_root);
    assert!(prepared.signing_payload.starts_with("0x"));
    assert_eq!(prepared.signing_payload.len(), 66);

    let inputs = &prepared.inputs;
    inputs
        .validate(&InputLayout::wallet_update(&WalletParams::default()))
        .unwrap();
    assert_eq!(inputs.scalar("operation_type").unwrap(), "2");
    assert_eq!(inputs.scalar("transfer_amount").unwrap(), "5");
    assert_eq!(inputs.scalar("transfer_mint").unwrap(), "0");
    assert_eq!(inputs.scalar("order_price").unwrap(), "10");
    assert_eq!(inputs.scalar("order_direction").unwrap(), "0");
    assert_eq!(inputs.scalar("nonce").unwrap(), "2");
    assert_eq!(inputs.scalar("old_index").unwrap(), "6");
    assert_eq!(inputs.field("nullifier").unwrap(), prepared.nullifier);
    assert_eq!(inputs.field("new_wallet_commitment").unwrap(), expected_new);
}

#[test]
fn test_prepare_update_transfer_only_zero_fills_order_inputs() {
    let (hasher, _, mut request, _) = update_fixture();
    request.action = Action::Transfer(Transfer::withdraw(1, 10u32));

    let prepared =
        prepare_update_with_rng(&hasher, &StateTransitionEngine::default(), &request, &mut StdRng::seed_from_u64(2))
            .unwrap();
    for name in ["order_index", "order_price", "order_quantity", "order_operation_type"] {
        assert_eq!(prepared.inputs.scalar(name).unwrap(), "0", "{}", name);
    }
    assert_eq!(prepared.inputs.scalar("transfer_direction").unwrap(), "1");
}

#[test]
fn test_prepare_update_rejects_wrong_root() {
    let (hasher, _, mut request, _) = update_fixture();
    request.old_root += Fr::from(1u64);

    let err = prepare_update_with_rng(
        &hasher,
        &StateTransitionEngine::default(),
        &request,
        &mut StdRng::seed_from_u64(3),
    )
    .unwrap_err();
    assert!(matches!(err, WalletError::MerkleVerificationFailed { .. }));
}

#[test]
fn test_prepare_update_rejects_tampered_state() {
    let (hasher, _, mut request, _) = update_fixture();
    request.old_state.available_balances[1] = big(1_000_000);

    let err = prepare_update_with_rng(
        &hasher,
        &StateTransitionEngine::default(),
        &request,
        &mut StdRng::seed_from_u64(4),
    )
    .unwrap_err();
    assert!(matches!(err, WalletError::MerkleVerificationFailed { .. }));
}

#[test]
fn test_update_request_json_round_trip() {
    let (_, _, request, _) = update_fixture();
    let json = serde_json::to_string(&request).unwrap();
    let back: UpdateRequest = serde_json::from_str(&json).unwrap();
    assert_eq!(back, request);
}

/// Full Groth16 proof generation and verification for WalletInitCircuit
#[test]
fn test_wallet_init_full_proof() {
    let mut rng = StdRng::seed_from_u64(42);
    let hasher = PoseidonHasher::new();
    let params = WalletParams::default();

    // Setup
    let empty_circuit = WalletInitCircuit::empty(hasher.clone(), params);
    let (pk, vk) = Groth16::<Bn254>::circuit_specific_setup(empty_circuit, &mut rng).unwrap();

    let keys = WalletKeys::from_sk_root(&hasher, Fr::from(77u64), 1);
    let circuit = WalletInitCircuit::new(hasher.clone(), params, &keys).unwrap();
    let public_inputs = circuit.public_inputs();
    assert_eq!(public_inputs, vec![initial_commitment(&hasher, params, &keys).unwrap()]);

    let proof = Groth16::<Bn254>::prove(&pk, circuit, &mut rng).unwrap();
    assert!(Groth16::<Bn254>::verify(&vk, &public_inputs, &proof).unwrap());

    let wrong = vec![public_inputs[0] + Fr::from(1u64)];
    assert!(!Groth16::<Bn254>::verify(&vk, &wrong, &proof).unwrap());
}
