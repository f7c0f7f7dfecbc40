//! Market behaviour through the full simulation loop
//!
//! - Price-time priority in a continuous market
//! - Uniform pricing and publication timing in a call market
//! - A call market with a zero interval behaves like a continuous one
//! - Quantity is conserved between submissions, trades and books

use common::{AgentId, MarketId, OrderId, Price, Side, TimeStamp, Transaction};
use matching_engine::Policy;
use proptest::prelude::*;
use simulation::{OrderRequest, Simulation};

fn limit(agent: u32, market: MarketId, side: Side, price: i64, quantity: u32) -> OrderRequest {
    OrderRequest::limit(AgentId(agent), market, side, Price::new(price), quantity)
}

fn trades(sim: &Simulation, market: MarketId) -> Vec<(OrderId, OrderId, i64, u32)> {
    sim.market(market)
        .unwrap()
        .transactions()
        .iter()
        .map(|t| (t.buy_order, t.sell_order, t.price.ticks(), t.quantity))
        .collect()
}

#[test]
fn test_price_time_priority() {
    let mut sim = Simulation::new(1);
    let nyse = sim.add_market("nyse", 1, Policy::continuous()).unwrap();

    let a = sim.submit_order(limit(1, nyse, Side::Sell, 100, 10), TimeStamp::of(1)).unwrap();
    let b = sim.submit_order(limit(2, nyse, Side::Sell, 100, 10), TimeStamp::of(2)).unwrap();
    let c = sim.submit_order(limit(3, nyse, Side::Buy, 101, 15), TimeStamp::of(3)).unwrap();
    sim.run_until(TimeStamp::of(3)).unwrap();

    assert_eq!(
        trades(&sim, nyse),
        vec![(c.order_id, a.order_id, 100, 10), (c.order_id, b.order_id, 100, 5)]
    );
    assert!(sim.order(a.order_id).is_none());
    assert!(sim.order(c.order_id).is_none());
    assert_eq!(sim.order(b.order_id).map(|r| r.remaining), Some(5));

    let quote = sim.market(nyse).unwrap().current_quote();
    assert_eq!(quote.ask, Some(Price::new(100)));
    assert_eq!(quote.ask_quantity, 5);
    assert_eq!(quote.bid, None);
}

#[test]
fn test_earlier_order_wins_whatever_the_same_tick_ordering() {
    for seed in 0..16 {
        let mut sim = Simulation::new(seed);
        let nyse = sim.add_market("nyse", 1, Policy::continuous()).unwrap();

        let a = sim.submit_order(limit(1, nyse, Side::Sell, 100, 1), TimeStamp::of(0)).unwrap();
        sim.submit_order(limit(2, nyse, Side::Sell, 100, 1), TimeStamp::of(1)).unwrap();
        let c = sim.submit_order(limit(3, nyse, Side::Buy, 150, 1), TimeStamp::of(1)).unwrap();
        sim.run_until(TimeStamp::of(1)).unwrap();

        assert_eq!(trades(&sim, nyse), vec![(c.order_id, a.order_id, 100, 1)], "seed {seed}");
    }
}

#[test]
fn test_call_market_trades_only_at_clear() {
    let mut sim = Simulation::new(1);
    let batch = sim.add_market("batch", 1, Policy::call(10, 0.5).unwrap()).unwrap();
    sim.attach_sip(TimeStamp::ZERO).unwrap();

    sim.submit_order(limit(1, batch, Side::Sell, 100, 5), TimeStamp::of(2)).unwrap();
    sim.submit_order(limit(2, batch, Side::Buy, 110, 5), TimeStamp::of(3)).unwrap();

    sim.run_until(TimeStamp::of(9)).unwrap();
    assert!(sim.market(batch).unwrap().transactions().is_empty());
    // nothing published between clears
    assert_eq!(sim.market(batch).unwrap().current_quote().market_time, None);
    assert_eq!(sim.nbbo().ask, None);

    sim.run_until(TimeStamp::of(10)).unwrap();
    let transactions = sim.market(batch).unwrap().transactions();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].price, Price::new(105));
    assert_eq!(transactions[0].executed_at, TimeStamp::of(10));
    assert!(sim.orders().is_empty());
}

#[test]
fn test_call_market_uniform_price_across_fills() {
    let mut sim = Simulation::new(5);
    let batch = sim.add_market("batch", 1, Policy::call(5, 0.0).unwrap()).unwrap();

    for (agent, side, price, quantity) in [
        (1, Side::Sell, 98, 3),
        (2, Side::Sell, 100, 3),
        (3, Side::Buy, 104, 3),
        (4, Side::Buy, 102, 3),
    ] {
        sim.submit_order(limit(agent, batch, side, price, quantity), TimeStamp::of(1)).unwrap();
    }
    sim.run_until(TimeStamp::of(5)).unwrap();

    let transactions = sim.market(batch).unwrap().transactions();
    assert_eq!(transactions.len(), 2);
    // pricing 0 selects the highest matched sell
    assert!(transactions.iter().all(|t| t.price == Price::new(100)));
    assert_eq!(transactions.iter().map(|t| t.quantity).sum::<u32>(), 6);
}

fn run_book(policy: Policy, orders: &[(Side, i64, u32, u64)]) -> Simulation {
    let mut sim = Simulation::new(9);
    let market = sim.add_market("m", 1, policy).unwrap();
    for (i, (side, price, quantity, at)) in orders.iter().enumerate() {
        sim.submit_order(limit(i as u32, market, *side, *price, *quantity), TimeStamp::of(*at))
            .unwrap();
    }
    sim.run_until(TimeStamp::of(50)).unwrap();
    sim
}

#[test]
fn test_zero_interval_call_matches_continuous() {
    let orders = [
        (Side::Sell, 101, 4, 1),
        (Side::Sell, 100, 2, 2),
        (Side::Buy, 99, 5, 2),
        (Side::Buy, 101, 5, 3),
        (Side::Sell, 98, 10, 4),
        (Side::Buy, 102, 1, 6),
    ];
    let continuous = run_book(Policy::continuous(), &orders);
    let call = run_book(Policy::call(0, 0.5).unwrap(), &orders);

    let continuous_market = &continuous.markets()[0];
    let call_market = &call.markets()[0];
    assert!(!continuous_market.transactions().is_empty());
    assert_eq!(continuous_market.transactions(), call_market.transactions());
    assert_eq!(continuous_market.current_quote(), call_market.current_quote());
}

fn side() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Buy), Just(Side::Sell)]
}

fn policy() -> impl Strategy<Value = Policy> {
    prop_oneof![
        Just(Policy::continuous()),
        (1u64..6, 0.0f64..=1.0).prop_map(|(interval, pricing)| Policy::call(interval, pricing).unwrap()),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_quantity_is_conserved(
        policy in policy(),
        orders in prop::collection::vec((side(), 95i64..=105, 1u32..=20, 0u64..=10), 1..40),
    ) {
        let sim = run_book(policy, &orders);
        let market = &sim.markets()[0];

        let submitted = |s: Side| -> u64 {
            orders.iter().filter(|o| o.0 == s).map(|o| u64::from(o.2)).sum()
        };
        let traded: u64 = market.transactions().iter().map(|t: &Transaction| u64::from(t.quantity)).sum();

        prop_assert_eq!(submitted(Side::Buy), traded + market.book().total_quantity(Side::Buy));
        prop_assert_eq!(submitted(Side::Sell), traded + market.book().total_quantity(Side::Sell));
        if let (Some(bid), Some(ask)) = (market.book().best_bid(), market.book().best_ask()) {
            prop_assert!(bid < ask);
        }
    }
}
