//! The shielded wallet data model.
//!
//! A [`WalletState`] is a plain value. It is never shared mutably: the
//! transition engine clones it, mutates the clone and hands the clone back.

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{MAX_PENDING_ORDER, TOTAL_TOKEN};
use crate::error::{Result, WalletError};
use crate::field::{decimal, decimal_u64, decimal_vec};

/// Wallet dimensions. Every state handled by one engine has this shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletParams {
    pub total_tokens: usize,
    pub max_pending_orders: usize,
}

impl Default for WalletParams {
    fn default() -> Self {
        Self {
            total_tokens: TOTAL_TOKEN,
            max_pending_orders: MAX_PENDING_ORDER,
        }
    }
}

/// Order side. Encoded as `0` (buy) or `1` (sell) everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy = 0,
    Sell = 1,
}

impl Side {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u64> for Side {
    type Error = WalletError;

    fn try_from(code: u64) -> Result<Self> {
        match code {
            0 => Ok(Side::Buy),
            1 => Ok(Side::Sell),
            other => Err(WalletError::InvalidSide(other)),
        }
    }
}

impl Serialize for Side {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for Side {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let code = decimal_u64::deserialize(d)?;
        Side::try_from(code).map_err(D::Error::custom)
    }
}

/// A pending limit order occupying one wallet slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(with = "decimal")]
    pub price: BigUint,
    #[serde(with = "decimal")]
    pub qty: BigUint,
    pub side: Side,
    pub token_in: usize,
    pub token_out: usize,
}

impl Order {
    /// The token and amount this order keeps reserved.
    ///
    /// A buy locks `price * qty` of `token_in`; a sell locks `qty` of
    /// `token_out`.
    pub fn reservation(&self) -> (usize, BigUint) {
        match self.side {
            Side::Buy => (self.token_in, &self.price * &self.qty),
            Side::Sell => (self.token_out, self.qty.clone()),
        }
    }
}

/// Balances, reservations, pending orders, fees and nonce of one wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletState {
    #[serde(with = "decimal_vec")]
    pub available_balances: Vec<BigUint>,
    #[serde(with = "decimal_vec")]
    pub reserved_balances: Vec<BigUint>,
    /// `None` marks an empty slot (serialised as `null`)
    pub orders_list: Vec<Option<Order>>,
    #[serde(with = "decimal")]
    pub fees: BigUint,
    #[serde(with = "decimal_u64")]
    pub nonce: u64,
}

impl WalletState {
    /// All-zero wallet with no orders at nonce 0.
    pub fn empty(params: WalletParams) -> Self {
        Self {
            available_balances: vec![BigUint::zero(); params.total_tokens],
            reserved_balances: vec![BigUint::zero(); params.total_tokens],
            orders_list: vec![None; params.max_pending_orders],
            fees: BigUint::zero(),
            nonce: 0,
        }
    }

    /// Check vector lengths and that every stored order is well formed.
    pub fn validate_shape(&self, params: &WalletParams) -> Result<()> {
        let expect_len = |name: &str, actual: usize, expected: usize| {
            if actual == expected {
                Ok(())
            } else {
                Err(WalletError::InvalidStateShape(format!(
                    "{} has {} entries, expected {}",
                    name, actual, expected
                )))
            }
        };
        expect_len(
            "available_balances",
            self.available_balances.len(),
            params.total_tokens,
        )?;
        expect_len(
            "reserved_balances",
            self.reserved_balances.len(),
            params.total_tokens,
        )?;
        expect_len(
            "orders_list",
            self.orders_list.len(),
            params.max_pending_orders,
        )?;

        for (slot, order) in self.orders_list.iter().enumerate() {
            let Some(order) = order else { continue };
            if order.token_in >= params.total_tokens || order.token_out >= params.total_tokens {
                return Err(WalletError::InvalidStateShape(format!(
                    "order {} references a token outside 0..{}",
                    slot, params.total_tokens
                )));
            }
            if order.token_in == order.token_out {
                return Err(WalletError::InvalidStateShape(format!(
                    "order {} trades token {} against itself",
                    slot, order.token_in
                )));
            }
        }
        Ok(())
    }

    /// Check that reserved balances cover every pending order.
    ///
    /// Holds for any state produced by the transition engine.
    pub fn check_reservations(&self) -> Result<()> {
        let mut locked = vec![BigUint::zero(); self.reserved_balances.len()];
        for order in self.orders_list.iter().flatten() {
            let (token, amount) = order.reservation();
            if let Some(slot) = locked.get_mut(token) {
                *slot += amount;
            }
        }
        for (token_index, (required, reserved)) in
            locked.into_iter().zip(&self.reserved_balances).enumerate()
        {
            if &required > reserved {
                return Err(WalletError::InsufficientReserved {
                    token_index,
                    required,
                    reserved: reserved.clone(),
                });
            }
        }
        Ok(())
    }

    /// Number of occupied order slots.
    pub fn open_orders(&self) -> usize {
        self.orders_list.iter().filter(|o| o.is_some()).count()
    }
}
