//! Wallet state transitions: deposits, withdrawals, order creation and
//! cancellation.
//!
//! [`StateTransitionEngine::apply_action`] validates an [`Action`] against a
//! wallet, applies it to a clone and returns the clone with an
//! [`Operations`] record. The input wallet is never touched and the nonce is
//! left for the caller to advance.

use num_bigint::BigUint;
use num_traits::Zero;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WalletError};
use crate::field::{decimal, decimal_u64};
use crate::state::{Order, Side, WalletParams, WalletState};

/// Transfer direction code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Deposit = 0,
    Withdraw = 1,
}

impl TryFrom<u64> for Direction {
    type Error = WalletError;

    fn try_from(code: u64) -> Result<Self> {
        match code {
            0 => Ok(Direction::Deposit),
            1 => Ok(Direction::Withdraw),
            other => Err(WalletError::InvalidDirection(other)),
        }
    }
}

/// Order operation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderOperation {
    Create = 0,
    Cancel = 1,
}

impl TryFrom<u64> for OrderOperation {
    type Error = WalletError;

    fn try_from(code: u64) -> Result<Self> {
        match code {
            0 => Ok(OrderOperation::Create),
            1 => Ok(OrderOperation::Cancel),
            other => Err(WalletError::InvalidOperationType(other)),
        }
    }
}

/// Permit2 authorisation attached to a deposit. Carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permit2 {
    #[serde(with = "decimal")]
    pub nonce: BigUint,
    #[serde(with = "decimal")]
    pub deadline: BigUint,
    pub signature: String,
}

/// Move funds between the public chain and the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// 0 = deposit, 1 = withdraw
    #[serde(deserialize_with = "decimal_u64::deserialize")]
    pub direction: u64,
    pub token_index: usize,
    #[serde(with = "decimal")]
    pub amount: BigUint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permit2: Option<Permit2>,
}

impl Transfer {
    pub fn deposit(token_index: usize, amount: impl Into<BigUint>) -> Self {
        Self {
            direction: Direction::Deposit as u64,
            token_index,
            amount: amount.into(),
            permit2: None,
        }
    }

    pub fn withdraw(token_index: usize, amount: impl Into<BigUint>) -> Self {
        Self {
            direction: Direction::Withdraw as u64,
            token_index,
            amount: amount.into(),
            permit2: None,
        }
    }

    pub fn with_permit2(mut self, permit2: Permit2) -> Self {
        self.permit2 = Some(permit2);
        self
    }
}

/// Parameters of an order to create, with the side as a raw code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderData {
    #[serde(with = "decimal")]
    pub price: BigUint,
    #[serde(with = "decimal")]
    pub qty: BigUint,
    /// 0 = buy, 1 = sell
    #[serde(deserialize_with = "decimal_u64::deserialize")]
    pub side: u64,
    pub token_in: usize,
    pub token_out: usize,
}

/// Create or cancel the order in one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAction {
    /// 0 = create, 1 = cancel
    #[serde(deserialize_with = "decimal_u64::deserialize")]
    pub operation: u64,
    pub order_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_data: Option<OrderData>,
}

impl OrderAction {
    pub fn create(order_index: usize, order_data: OrderData) -> Self {
        Self {
            operation: OrderOperation::Create as u64,
            order_index,
            order_data: Some(order_data),
        }
    }

    pub fn cancel(order_index: usize) -> Self {
        Self {
            operation: OrderOperation::Cancel as u64,
            order_index,
            order_data: None,
        }
    }
}

/// A user request against a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Transfer(Transfer),
    Order(OrderAction),
    /// Transfer first, then the order action, on the same working copy
    Combined {
        transfer: Transfer,
        order: OrderAction,
    },
}

impl Action {
    /// 0 = transfer only, 1 = order only, 2 = both.
    pub fn operation_type(&self) -> u8 {
        match self {
            Action::Transfer(_) => 0,
            Action::Order(_) => 1,
            Action::Combined { .. } => 2,
        }
    }
}

/// Transfer half of an [`Operations`] record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub direction: u8,
    pub token_index: usize,
    #[serde(with = "decimal")]
    pub amount: BigUint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permit2_nonce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permit2_deadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permit2_signature: Option<String>,
}

/// An order as reported to the backend, with its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Decimal id; `"0"` on cancellation
    pub id: String,
    #[serde(with = "decimal")]
    pub price: BigUint,
    #[serde(with = "decimal")]
    pub qty: BigUint,
    pub side: Side,
    pub token_in: usize,
    pub token_out: usize,
}

/// Order half of an [`Operations`] record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderOperationRecord {
    pub operation_type: u8,
    pub order_index: usize,
    pub order_data: OrderRecord,
}

/// What an applied action did, for persistence and circuit inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer: Option<TransferRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderOperationRecord>,
    /// 0 = transfer only, 1 = order only, 2 = both
    pub operation_type: u8,
}

/// Validates and applies actions to wallets of one shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateTransitionEngine {
    params: WalletParams,
}

impl StateTransitionEngine {
    pub fn new(params: WalletParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &WalletParams {
        &self.params
    }

    /// Apply `action` to a copy of `old`, drawing order ids from the thread RNG.
    pub fn apply_action(
        &self,
        old: &WalletState,
        action: &Action,
    ) -> Result<(WalletState, Operations)> {
        self.apply_action_with_rng(old, action, &mut rand::thread_rng())
    }

    /// Apply `action` to a copy of `old`, drawing order ids from `rng`.
    pub fn apply_action_with_rng<R: Rng>(
        &self,
        old: &WalletState,
        action: &Action,
        rng: &mut R,
    ) -> Result<(WalletState, Operations)> {
        old.validate_shape(&self.params)?;

        let mut state = old.clone();
        let operations = match action {
            Action::Transfer(transfer) => Operations {
                transfer: Some(self.process_transfer(&mut state, transfer)?),
                order: None,
                operation_type: action.operation_type(),
            },
            Action::Order(order) => Operations {
                transfer: None,
                order: Some(self.process_order(&mut state, order, rng)?),
                operation_type: action.operation_type(),
            },
            Action::Combined { transfer, order } => {
                let transfer = self.process_transfer(&mut state, transfer)?;
                let order = self.process_order(&mut state, order, rng)?;
                Operations {
                    transfer: Some(transfer),
                    order: Some(order),
                    operation_type: action.operation_type(),
                }
            }
        };
        Ok((state, operations))
    }

    fn check_token(&self, index: usize) -> Result<()> {
        if index >= self.params.total_tokens {
            return Err(WalletError::InvalidTokenIndex {
                index,
                total: self.params.total_tokens,
            });
        }
        Ok(())
    }

    fn process_transfer(
        &self,
        state: &mut WalletState,
        transfer: &Transfer,
    ) -> Result<TransferRecord> {
        self.check_token(transfer.token_index)?;
        let direction = Direction::try_from(transfer.direction)?;
        if transfer.amount.is_zero() {
            return Err(WalletError::InvalidAmount);
        }

        let balance = &mut state.available_balances[transfer.token_index];
        match direction {
            Direction::Deposit => *balance += &transfer.amount,
            Direction::Withdraw => {
                if !state.fees.is_zero() {
                    return Err(WalletError::FeesMustBeZeroForWithdraw);
                }
                if *balance < transfer.amount {
                    return Err(WalletError::InsufficientBalance {
                        token_index: transfer.token_index,
                        required: transfer.amount.clone(),
                        available: balance.clone(),
                    });
                }
                *balance -= &transfer.amount;
            }
        }

        let permit2 = transfer.permit2.as_ref();
        Ok(TransferRecord {
            direction: direction as u8,
            token_index: transfer.token_index,
            amount: transfer.amount.clone(),
            permit2_nonce: permit2.map(|p| p.nonce.to_string()),
            permit2_deadline: permit2.map(|p| p.deadline.to_string()),
            permit2_signature: permit2.map(|p| p.signature.clone()),
        })
    }

    fn process_order<R: Rng>(
        &self,
        state: &mut WalletState,
        action: &OrderAction,
        rng: &mut R,
    ) -> Result<OrderOperationRecord> {
        if action.order_index >= self.params.max_pending_orders {
            return Err(WalletError::InvalidOrderIndex {
                index: action.order_index,
                max: self.params.max_pending_orders,
            });
        }
        let operation = OrderOperation::try_from(action.operation)?;

        let (order, id) = match operation {
            OrderOperation::Create => {
                let order = self.create_order(state, action)?;
                let id: u64 = rng.gen_range(1..=u64::MAX);
                (order, id.to_string())
            }
            OrderOperation::Cancel => (self.cancel_order(state, action.order_index)?, "0".to_string()),
        };

        Ok(OrderOperationRecord {
            operation_type: operation as u8,
            order_index: action.order_index,
            order_data: OrderRecord {
                id,
                price: order.price,
                qty: order.qty,
                side: order.side,
                token_in: order.token_in,
                token_out: order.token_out,
            },
        })
    }

    fn create_order(&self, state: &mut WalletState, action: &OrderAction) -> Result<Order> {
        let data = action
            .order_data
            .as_ref()
            .ok_or(WalletError::MissingOrderData)?;
        if state.orders_list[action.order_index].is_some() {
            return Err(WalletError::OrderSlotOccupied(action.order_index));
        }
        if data.price.is_zero() {
            return Err(WalletError::InvalidPrice);
        }
        if data.qty.is_zero() {
            return Err(WalletError::InvalidQty);
        }
        self.check_token(data.token_in)?;
        self.check_token(data.token_out)?;
        if data.token_in == data.token_out {
            return Err(WalletError::InvalidTokenPair(data.token_in));
        }
        let side = Side::try_from(data.side)?;

        let order = Order {
            price: data.price.clone(),
            qty: data.qty.clone(),
            side,
            token_in: data.token_in,
            token_out: data.token_out,
        };

        let (token_index, amount) = order.reservation();
        let available = &mut state.available_balances[token_index];
        if *available < amount {
            return Err(WalletError::InsufficientBalance {
                token_index,
                required: amount,
                available: available.clone(),
            });
        }
        *available -= &amount;
        state.reserved_balances[token_index] += amount;
        state.orders_list[action.order_index] = Some(order.clone());

        Ok(order)
    }

    fn cancel_order(&self, state: &mut WalletState, order_index: usize) -> Result<Order> {
        let order = state.orders_list[order_index]
            .clone()
            .ok_or(WalletError::NoOrderAtIndex(order_index))?;

        let (token_index, amount) = order.reservation();
        let reserved = &mut state.reserved_balances[token_index];
        if *reserved < amount {
            return Err(WalletError::InsufficientReserved {
                token_index,
                required: amount,
                reserved: reserved.clone(),
            });
        }
        *reserved -= &amount;
        state.available_balances[token_index] += amount;
        state.orders_list[order_index] = None;

        Ok(order)
    }
}

/// Apply an action with the default wallet shape.
pub fn apply_action(old: &WalletState, action: &Action) -> Result<(WalletState, Operations)> {
    StateTransitionEngine::default().apply_action(old, action)
}
