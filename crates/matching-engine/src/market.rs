//! Market
//!
//! A market owns one order book and one clearing policy. It never schedules
//! anything itself: each operation returns the [`MarketEffect`]s the caller
//! must carry out (run a clear, publish an update).

use common::{
    MarketClock, MarketId, MarketTime, MarketUpdate, Order, OrderId, Quote, TimeStamp, Transaction,
    TransactionId,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::book::{BookOrder, OrderBook};
use crate::error::MatchingError;
use crate::event::MarketEvent;
use crate::log::EventLog;
use crate::matching;
use crate::policy::{ClearingPolicy, Policy};
use crate::Result;

/// Work a market asks its caller to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketEffect {
    /// Run [`Market::clear`] at this time (`IMMEDIATE` means within the
    /// current cascade)
    Clear {
        /// When to clear
        at: TimeStamp,
    },
    /// Deliver this update to every subscriber
    Publish(Arc<MarketUpdate>),
}

/// Single-book market
#[derive(Debug, Clone)]
pub struct Market {
    id: MarketId,
    name: String,
    tick_size: u64,
    policy: Policy,
    book: OrderBook,
    clock: MarketClock,
    /// Last published quote
    quote: Quote,
    transactions: Vec<Transaction>,
    next_transaction: u64,
    next_arrival: u64,
    /// A future clear is already scheduled
    clear_pending: bool,
    log: EventLog,
}

impl Market {
    /// Create a market. `tick_size` must be positive.
    pub fn new(id: MarketId, name: impl Into<String>, tick_size: u64, policy: Policy) -> Result<Self> {
        if tick_size == 0 {
            return Err(MatchingError::InvalidConfiguration(
                "tick size must be positive".to_string(),
            ));
        }
        let name = name.into();
        info!(market = %id, name = %name, policy = policy.name(), tick_size, "Market created");
        Ok(Self {
            id,
            name,
            tick_size,
            policy,
            book: OrderBook::new(),
            clock: MarketClock::new(),
            quote: Quote::empty(id),
            transactions: Vec::new(),
            next_transaction: 0,
            next_arrival: 0,
            clear_pending: false,
            log: EventLog::new(),
        })
    }

    /// Market ID
    pub fn id(&self) -> MarketId {
        self.id
    }

    /// Configured name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Minimum price increment
    pub fn tick_size(&self) -> u64 {
        self.tick_size
    }

    /// Clearing policy
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Live order book
    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    /// Quote as of the last publication
    pub fn current_quote(&self) -> &Quote {
        &self.quote
    }

    /// Every transaction this market has executed, in execution order
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Market time of the latest mutation
    pub fn market_time(&self) -> Option<MarketTime> {
        self.clock.last()
    }

    /// Audit log
    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Accept an order into the book at its quantized price
    pub fn submit(&mut self, order: &Order, now: TimeStamp) -> Result<Vec<MarketEffect>> {
        if order.market != self.id {
            return Err(MatchingError::InvalidOrder(format!(
                "{} is addressed to {}, not {}",
                order.id, order.market, self.id
            )));
        }
        order.validate()?;
        if self.book.contains(order.id) {
            return Err(MatchingError::InvalidOrder(format!(
                "{} is already resting in {}",
                order.id, self.id
            )));
        }

        let price = order.price.quantize(self.tick_size)?;
        self.next_arrival += 1;
        self.book.insert(BookOrder {
            order_id: order.id,
            agent: order.agent,
            side: order.side,
            price,
            quantity: order.quantity,
            submitted_at: now,
            sequence: self.next_arrival,
        });

        let market_time = self.clock.advance(now);
        self.log.append(MarketEvent::OrderAccepted {
            order_id: order.id,
            agent: order.agent,
            side: order.side,
            price,
            quantity: order.quantity,
            market_time,
            sequence: self.log.next_sequence(),
        });

        debug!(
            market = %self.id,
            order_id = %order.id,
            side = %order.side,
            %price,
            quantity = order.quantity,
            %market_time,
            "Order accepted"
        );

        self.request_clear(now)
    }

    /// Withdraw `quantity` of a resting order, or all of it when `None`.
    /// Requests larger than the remainder withdraw the remainder.
    ///
    /// Returns the withdrawn part alongside the effects.
    pub fn withdraw(
        &mut self,
        order_id: OrderId,
        quantity: Option<u32>,
        now: TimeStamp,
    ) -> Result<(BookOrder, Vec<MarketEffect>)> {
        if quantity == Some(0) {
            return Err(MatchingError::InvalidOrder(format!(
                "withdrawal of zero from {}",
                order_id
            )));
        }
        let removed = self
            .book
            .remove(order_id, quantity)
            .ok_or(MatchingError::OrderNotFound {
                market: self.id,
                order_id,
            })?;

        let market_time = self.clock.advance(now);
        self.log.append(MarketEvent::OrderWithdrawn {
            order_id,
            quantity: removed.quantity,
            market_time,
            sequence: self.log.next_sequence(),
        });

        debug!(
            market = %self.id,
            %order_id,
            quantity = removed.quantity,
            %market_time,
            "Order withdrawn"
        );

        let effects = if self.policy.publishes_between_clears() {
            vec![MarketEffect::Publish(self.publish(market_time, now, Vec::new()))]
        } else {
            self.request_clear(now)?
        };
        Ok((removed, effects))
    }

    /// Match everything that crosses, price it, and publish the result
    pub fn clear(&mut self, now: TimeStamp) -> Result<Vec<MarketEffect>> {
        if !self.policy.next_clear(now)?.is_immediate() {
            self.clear_pending = false;
        }

        let fills = matching::cross(&mut self.book);
        let result = self.policy.price(fills, self.tick_size)?;
        let market_time = self.clock.advance(now);

        let mut transactions = Vec::with_capacity(result.fills.len());
        for (fill, price) in result.fills.iter() {
            self.next_transaction += 1;
            let transaction = Transaction {
                id: TransactionId {
                    market: self.id,
                    sequence: self.next_transaction,
                },
                market: self.id,
                buyer: fill.buy.agent,
                seller: fill.sell.agent,
                buy_order: fill.buy.order_id,
                sell_order: fill.sell.order_id,
                price: *price,
                quantity: fill.quantity,
                executed_at: now,
                buy_submitted_at: fill.buy.submitted_at,
                sell_submitted_at: fill.sell.submitted_at,
            };
            self.log.append(MarketEvent::TradeExecuted {
                transaction: transaction.clone(),
                sequence: self.log.next_sequence(),
            });
            transactions.push(transaction);
        }

        let volume: u64 = transactions.iter().map(|t| u64::from(t.quantity)).sum();
        self.log.append(MarketEvent::Cleared {
            market_time,
            price: result.uniform_price,
            volume,
            sequence: self.log.next_sequence(),
        });

        if !transactions.is_empty() {
            info!(
                market = %self.id,
                trades = transactions.len(),
                volume,
                uniform_price = ?result.uniform_price,
                %market_time,
                "Market cleared"
            );
        }

        self.transactions.extend(transactions.iter().cloned());
        Ok(vec![MarketEffect::Publish(self.publish(market_time, now, transactions))])
    }

    /// Ask for a clear according to the policy; at most one future clear is
    /// outstanding at a time.
    fn request_clear(&mut self, now: TimeStamp) -> Result<Vec<MarketEffect>> {
        let at = self.policy.next_clear(now)?;
        if at.is_immediate() {
            return Ok(vec![MarketEffect::Clear { at }]);
        }
        if self.clear_pending {
            return Ok(Vec::new());
        }
        self.clear_pending = true;
        debug!(market = %self.id, %at, "Clear scheduled");
        Ok(vec![MarketEffect::Clear { at }])
    }

    fn publish(
        &mut self,
        market_time: MarketTime,
        now: TimeStamp,
        transactions: Vec<Transaction>,
    ) -> Arc<MarketUpdate> {
        self.quote = self.book.quote(self.id, market_time, now);
        Arc::new(MarketUpdate {
            market: self.id,
            market_time,
            quote: self.quote.clone(),
            transactions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use common::{AgentId, Price, Side};
    use proptest::prelude::*;

    fn order(id: u64, side: Side, price: i64, quantity: u32) -> Order {
        Order {
            id: OrderId(id),
            agent: AgentId(id as u32),
            market: MarketId(0),
            side,
            price: Price::new(price),
            quantity,
            created_at: TimeStamp::ZERO,
        }
    }

    fn cda() -> Market {
        Market::new(MarketId(0), "cda", 1, Policy::continuous()).unwrap()
    }

    fn call(interval: u64, pricing: f64) -> Market {
        Market::new(MarketId(0), "call", 1, Policy::call(interval, pricing).unwrap()).unwrap()
    }

    /// Submit and run any immediate clear, as the simulation would
    fn submit_and_clear(market: &mut Market, order: &Order, now: TimeStamp) -> Vec<Transaction> {
        let mut trades = Vec::new();
        for effect in market.submit(order, now).unwrap() {
            if let MarketEffect::Clear { at } = effect {
                if at.is_immediate() {
                    trades.extend(cleared(market.clear(now).unwrap()));
                }
            }
        }
        trades
    }

    fn cleared(effects: Vec<MarketEffect>) -> Vec<Transaction> {
        effects
            .into_iter()
            .filter_map(|e| match e {
                MarketEffect::Publish(update) => Some(update.transactions.clone()),
                MarketEffect::Clear { .. } => None,
            })
            .flatten()
            .collect()
    }

    #[test]
    fn test_basic_match() {
        let mut market = cda();
        assert!(submit_and_clear(&mut market, &order(1, Side::Sell, 100, 10), TimeStamp::of(1)).is_empty());
        let trades = submit_and_clear(&mut market, &order(2, Side::Buy, 100, 10), TimeStamp::of(2));

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, Price::new(100));
        assert_eq!(trades[0].quantity, 10);
        assert_eq!(trades[0].buy_order, OrderId(2));
        assert_eq!(trades[0].sell_order, OrderId(1));
        assert!(market.book().is_empty());
    }

    #[test]
    fn test_partial_fill() {
        let mut market = cda();
        submit_and_clear(&mut market, &order(1, Side::Sell, 100, 5), TimeStamp::of(1));
        let trades = submit_and_clear(&mut market, &order(2, Side::Buy, 101, 10), TimeStamp::of(2));

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].quantity, 5);
        assert_eq!(market.current_quote().bid, Some(Price::new(101)));
        assert_eq!(market.current_quote().bid_quantity, 5);
        assert_eq!(market.current_quote().ask, None);
    }

    #[test]
    fn test_price_time_priority_uses_resting_price() {
        let mut market = cda();
        submit_and_clear(&mut market, &order(1, Side::Sell, 100, 1), TimeStamp::of(0));
        submit_and_clear(&mut market, &order(2, Side::Sell, 100, 1), TimeStamp::of(1));
        let trades = submit_and_clear(&mut market, &order(3, Side::Buy, 150, 1), TimeStamp::of(1));

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].sell_order, OrderId(1));
        assert_eq!(trades[0].buy_order, OrderId(3));
        assert_eq!(trades[0].price, Price::new(100));
        assert!(market.book().contains(OrderId(2)));
    }

    #[test]
    fn test_prices_quantized_on_submit() {
        let mut market = Market::new(MarketId(0), "coarse", 5, Policy::continuous()).unwrap();
        submit_and_clear(&mut market, &order(1, Side::Buy, 102, 1), TimeStamp::of(0));
        submit_and_clear(&mut market, &order(2, Side::Sell, 108, 1), TimeStamp::of(0));

        assert_eq!(market.current_quote().bid, Some(Price::new(100)));
        assert_eq!(market.current_quote().ask, Some(Price::new(110)));
    }

    #[test]
    fn test_extreme_prices_are_rejected_without_panic() {
        let mut market = Market::new(MarketId(0), "coarse", 4, Policy::continuous()).unwrap();
        let mut sell = order(1, Side::Sell, 0, 1);
        sell.price = Price::new(i64::MAX - 1);
        assert_matches!(
            market.submit(&sell, TimeStamp::of(0)),
            Err(MatchingError::Primitive(common::Error::InvalidInput(_)))
        );
        assert!(market.book().is_empty());

        let mut batch = call(10, 0.5);
        let mut buy = order(2, Side::Buy, 0, 1);
        buy.price = Price::MAX_LIMIT;
        let mut sell = order(3, Side::Sell, 0, 1);
        sell.price = Price::MIN_LIMIT;
        batch.submit(&sell, TimeStamp::of(1)).unwrap();
        batch.submit(&buy, TimeStamp::of(1)).unwrap();
        let trades = cleared(batch.clear(TimeStamp::of(10)).unwrap());
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, Price::ZERO);
    }

    #[test]
    fn test_call_clears_at_next_interval_once() {
        let mut market = call(10, 0.5);
        let effects = market.submit(&order(1, Side::Sell, 100, 5), TimeStamp::of(3)).unwrap();
        assert_eq!(effects, vec![MarketEffect::Clear { at: TimeStamp::of(10) }]);

        let effects = market.submit(&order(2, Side::Buy, 110, 5), TimeStamp::of(4)).unwrap();
        assert!(effects.is_empty());
        // nothing published before the clear
        assert_eq!(market.current_quote().bid, None);

        let trades = cleared(market.clear(TimeStamp::of(10)).unwrap());
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, Price::new(105));
        assert_eq!(trades[0].executed_at, TimeStamp::of(10));

        let effects = market.submit(&order(3, Side::Buy, 90, 1), TimeStamp::of(10)).unwrap();
        assert_eq!(effects, vec![MarketEffect::Clear { at: TimeStamp::of(20) }]);
    }

    #[test]
    fn test_call_uniform_price_for_all_fills() {
        let mut market = call(5, 1.0);
        market.submit(&order(1, Side::Sell, 100, 2), TimeStamp::of(0)).unwrap();
        market.submit(&order(2, Side::Sell, 103, 2), TimeStamp::of(0)).unwrap();
        market.submit(&order(3, Side::Buy, 110, 2), TimeStamp::of(1)).unwrap();
        market.submit(&order(4, Side::Buy, 106, 2), TimeStamp::of(1)).unwrap();

        let trades = cleared(market.clear(TimeStamp::of(5)).unwrap());
        assert_eq!(trades.len(), 2);
        // pricing 1.0 selects the lowest matched buy
        assert!(trades.iter().all(|t| t.price == Price::new(106)));
        assert_matches!(
            market.log().events().last(),
            Some(MarketEvent::Cleared { price: Some(p), volume: 4, .. }) if *p == Price::new(106)
        );
    }

    #[test]
    fn test_call_zero_interval_matches_continuous() {
        let orders = [
            order(1, Side::Sell, 101, 3),
            order(2, Side::Buy, 99, 2),
            order(3, Side::Buy, 103, 5),
            order(4, Side::Sell, 98, 4),
            order(5, Side::Sell, 102, 1),
        ];
        let run = |mut market: Market| {
            let mut trades = Vec::new();
            for (t, o) in orders.iter().enumerate() {
                trades.extend(submit_and_clear(&mut market, o, TimeStamp::of(t as u64)));
            }
            trades
        };
        assert_eq!(run(cda()), run(call(0, 0.3)));
    }

    #[test]
    fn test_partial_withdraw() {
        let mut market = cda();
        submit_and_clear(&mut market, &order(1, Side::Buy, 100, 10), TimeStamp::of(0));

        let (removed, effects) = market.withdraw(OrderId(1), Some(4), TimeStamp::of(1)).unwrap();
        assert_eq!(removed.quantity, 4);
        assert_matches!(effects.as_slice(), [MarketEffect::Publish(update)] if update.quote.bid_quantity == 6);

        let (removed, _) = market.withdraw(OrderId(1), Some(100), TimeStamp::of(2)).unwrap();
        assert_eq!(removed.quantity, 6);
        assert!(market.book().is_empty());
    }

    #[test]
    fn test_call_withdraw_schedules_clear() {
        let mut market = call(10, 0.5);
        market.submit(&order(1, Side::Buy, 100, 1), TimeStamp::of(0)).unwrap();
        market.clear(TimeStamp::of(10)).unwrap();

        let (_, effects) = market.withdraw(OrderId(1), None, TimeStamp::of(12)).unwrap();
        assert_eq!(effects, vec![MarketEffect::Clear { at: TimeStamp::of(20) }]);
    }

    #[test]
    fn test_withdraw_errors() {
        let mut market = cda();
        assert_matches!(
            market.withdraw(OrderId(9), None, TimeStamp::of(0)),
            Err(MatchingError::OrderNotFound { order_id: OrderId(9), .. })
        );

        submit_and_clear(&mut market, &order(1, Side::Buy, 100, 1), TimeStamp::of(0));
        assert_matches!(
            market.withdraw(OrderId(1), Some(0), TimeStamp::of(0)),
            Err(MatchingError::InvalidOrder(_))
        );
    }

    #[test]
    fn test_invalid_submissions() {
        let mut market = cda();
        assert_matches!(
            market.submit(&order(1, Side::Buy, 100, 0), TimeStamp::of(0)),
            Err(MatchingError::Primitive(_))
        );

        let mut elsewhere = order(2, Side::Buy, 100, 1);
        elsewhere.market = MarketId(7);
        assert_matches!(market.submit(&elsewhere, TimeStamp::of(0)), Err(MatchingError::InvalidOrder(_)));

        assert_matches!(
            Market::new(MarketId(0), "bad", 0, Policy::continuous()),
            Err(MatchingError::InvalidConfiguration(_))
        );
    }

    #[test]
    fn test_market_time_advances_per_mutation() {
        let mut market = cda();
        submit_and_clear(&mut market, &order(1, Side::Buy, 100, 1), TimeStamp::of(0));
        let first = market.market_time().unwrap();
        submit_and_clear(&mut market, &order(2, Side::Buy, 100, 1), TimeStamp::of(0));
        let second = market.market_time().unwrap();

        assert!(second > first);
        // submit plus clear for each order
        assert_eq!(second.sequence, 4);
    }

    proptest! {
        #[test]
        fn prop_quantity_is_conserved(
            orders in prop::collection::vec((any::<bool>(), 90i64..110, 1u32..20), 1..40),
            interval in 0u64..4,
        ) {
            let mut market = if interval == 0 { cda() } else { call(interval, 0.5) };
            let mut submitted = 0u64;
            let mut traded = 0u64;

            for (i, (buy, price, quantity)) in orders.iter().enumerate() {
                let side = if *buy { Side::Buy } else { Side::Sell };
                let now = TimeStamp::of(i as u64);
                submitted += u64::from(*quantity);
                traded += 2 * submit_and_clear(&mut market, &order(i as u64, side, *price, *quantity), now)
                    .iter()
                    .map(|t| u64::from(t.quantity))
                    .sum::<u64>();
            }
            let final_clear = TimeStamp::of(orders.len() as u64 + 10);
            traded += 2 * cleared(market.clear(final_clear).unwrap())
                .iter()
                .map(|t| u64::from(t.quantity))
                .sum::<u64>();

            let resting = market.book().total_quantity(Side::Buy) + market.book().total_quantity(Side::Sell);
            prop_assert_eq!(submitted, resting + traded);
            prop_assert!(!market.current_quote().is_crossed());
        }
    }
}
