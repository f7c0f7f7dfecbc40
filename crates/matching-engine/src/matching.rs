//! Crossing and pricing
//!
//! Both market types find crossings the same way: repeatedly pair the front
//! of the best bid level with the front of the best ask level while the bid
//! is at least the ask. Greedy pairing from the top of both sides yields the
//! maximal tradable quantity. They differ only in how each fill is priced.

use common::{Price, Side};
use tracing::debug;

use crate::book::OrderBook;
use crate::result::Fill;

/// Remove every crossing pair from the book, in price-time priority
pub fn cross(book: &mut OrderBook) -> Vec<Fill> {
    let mut fills = Vec::new();

    loop {
        let (Some(bid), Some(ask)) = (book.front(Side::Buy), book.front(Side::Sell)) else {
            break;
        };
        if bid.price < ask.price {
            break;
        }

        let quantity = bid.quantity.min(ask.quantity);
        let fill = Fill {
            buy: bid.clone(),
            sell: ask.clone(),
            quantity,
        };

        book.fill_front(Side::Buy, quantity);
        book.fill_front(Side::Sell, quantity);

        debug!(
            buy = %fill.buy.order_id,
            sell = %fill.sell.order_id,
            quantity,
            "Orders crossed"
        );
        fills.push(fill);
    }

    fills
}

/// Continuous pricing: each fill trades at the price of whichever order
/// reached the book first.
pub fn resting_price(fill: &Fill) -> Price {
    fill.earlier().price
}

/// Uniform pricing: `sellLimit + pricing × (buyLimit − sellLimit)` where
/// `sellLimit` is the highest matched ask and `buyLimit` the lowest matched
/// bid, rounded and quantized to `tick`. `None` without fills.
pub fn uniform_price(fills: &[Fill], pricing: f64, tick: u64) -> common::Result<Option<Price>> {
    let (Some(sell_limit), Some(buy_limit)) = (
        fills.iter().map(|f| f.sell.price).max(),
        fills.iter().map(|f| f.buy.price).min(),
    ) else {
        return Ok(None);
    };

    let range = buy_limit.checked_sub(sell_limit)?;
    let offset = Price::new((pricing * range.ticks() as f64).round() as i64);
    Ok(Some(sell_limit.checked_add(offset)?.quantize(tick)?))
}
