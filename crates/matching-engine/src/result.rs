//! Result types for matching operations

use common::Price;

use crate::book::BookOrder;

/// One crossing of a buy and a sell order, before pricing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fill {
    /// Buy order as it rested before this fill
    pub buy: BookOrder,
    /// Sell order as it rested before this fill
    pub sell: BookOrder,
    /// Matched quantity
    pub quantity: u32,
}

impl Fill {
    /// The order that reached the book first
    pub fn earlier(&self) -> &BookOrder {
        if self.buy.priority() <= self.sell.priority() {
            &self.buy
        } else {
            &self.sell
        }
    }
}

/// Result of one clear: priced fills plus the uniform price, if any
#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    /// Fills with their execution price, in matching order
    pub fills: Vec<(Fill, Price)>,
    /// Single clearing price when the policy prices uniformly
    pub uniform_price: Option<Price>,
}

impl MatchResult {
    /// No crossing orders
    pub fn no_match() -> Self {
        Self::default()
    }

    /// Check if any trades were generated
    pub fn has_trades(&self) -> bool {
        !self.fills.is_empty()
    }

    /// Total quantity filled
    pub fn filled_quantity(&self) -> u32 {
        self.fills.iter().map(|(f, _)| f.quantity).sum()
    }
}
