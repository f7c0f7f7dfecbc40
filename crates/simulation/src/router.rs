//! Order routing
//!
//! An order addressed to a primary market is redirected when the
//! consolidated quote shows a strictly better price elsewhere that the
//! order would trade against. Only the quantity shown at that price moves;
//! the rest goes to the primary market. The consolidated quote may be stale,
//! so an order can be sent to a price that is already gone.

use common::{BestBidAsk, MarketId, Order, Price, Quote, Side};

/// Where the parts of an order go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingDecision {
    /// Market and quantity redirected away from the primary market
    pub routed: Option<(MarketId, u32)>,
    /// Quantity submitted to the primary market
    pub remainder: u32,
}

impl RoutingDecision {
    fn stay(order: &Order) -> Self {
        Self {
            routed: None,
            remainder: order.quantity,
        }
    }
}

/// Decide how to split `order` given the consolidated quote and the primary
/// market's own quote
pub fn route(order: &Order, nbbo: &BestBidAsk, primary: &Quote) -> RoutingDecision {
    // the side the order would trade against
    let contra = order.side.opposite();

    let (Some(best), Some(market)) = (nbbo.price(contra), nbbo.market(contra)) else {
        return RoutingDecision::stay(order);
    };
    if market == order.market {
        return RoutingDecision::stay(order);
    }

    // an empty primary side is infinitely bad
    let local = primary.price(contra).unwrap_or(match order.side {
        Side::Buy => Price::INF,
        Side::Sell => Price::NEG_INF,
    });
    let (better, marketable) = match order.side {
        Side::Buy => (best < local, order.price >= best),
        Side::Sell => (best > local, order.price <= best),
    };
    let quantity = order.quantity.min(nbbo.quantity(contra));
    if !better || !marketable || quantity == 0 {
        return RoutingDecision::stay(order);
    }

    tracing::info!(
        order_id = %order.id,
        side = %order.side,
        from = %order.market,
        to = %market,
        nbbo = %best,
        local = %local,
        quantity,
        "Order routed"
    );
    RoutingDecision {
        routed: Some((market, quantity)),
        remainder: order.quantity - quantity,
    }
}
