mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use common::{PAIR, TRADING_PAIR, rig, rig_with, scenario_config};
use xemm_bot::{Config, OrderType, TradeType, Venue};

#[test]
fn maker_buy_fill_is_hedged_with_taker_sell() {
    let mut rig = rig();
    rig.step(1000.0);
    let bid = rig.active_bid().expect("bid placed");

    rig.maker.fill_limit_order(&bid.id, None);
    rig.step(1001.0);

    // The fill was hedged in full: 1.0 base sold into the taker bids.
    assert_eq!(rig.taker.balance("ETH"), dec!(99));
    assert_eq!(rig.taker.balance("USDT"), dec!(100000) + dec!(99.5));
    assert_eq!(
        rig.strategy.pending_fill_totals(PAIR),
        (Decimal::ZERO, Decimal::ZERO)
    );

    // The completed bid is gone and a replacement was quoted.
    rig.step(1002.0);
    assert!(rig.active_bid().is_some());
    assert_ne!(rig.active_bid().unwrap().id, bid.id);
}

#[test]
fn maker_sell_fill_is_hedged_with_taker_buy() {
    let mut rig = rig();
    rig.step(1000.0);
    let ask = rig.active_ask().expect("ask placed");

    rig.maker.fill_limit_order(&ask.id, None);
    rig.step(1001.0);

    // 1.0 base bought back against the taker asks at 100.5.
    assert_eq!(rig.taker.balance("ETH"), dec!(101));
    assert_eq!(rig.taker.balance("USDT"), dec!(100000) - dec!(100.5));
    assert_eq!(
        rig.strategy.pending_fill_totals(PAIR),
        (Decimal::ZERO, Decimal::ZERO)
    );
}

#[test]
fn hedge_is_capped_by_taker_balance_and_bucket_still_clears() {
    let cfg = Config {
        order_amount: dec!(5),
        ..scenario_config()
    };
    let mut rig = rig_with(cfg);
    // Deep taker book so the liquidity cap clears the 5.0 order.
    rig.taker.set_book(
        TRADING_PAIR,
        xemm_bot::Book::new(
            common::levels(&[(dec!(99.5), dec!(40))]),
            common::levels(&[(dec!(100.5), dec!(40))]),
        ),
    );
    rig.step(1000.0);
    let bid = rig.active_bid().expect("bid placed");
    assert_eq!(bid.quantity, dec!(5));

    // The taker base balance drains to 2.0 before the maker fill lands.
    rig.taker.set_balance("ETH", dec!(2));
    rig.maker.fill_limit_order(&bid.id, None);
    rig.step(1001.0);

    // hedge = quantize(min(5.0, 2.0 * 0.995)) = 1.99; the shortfall is an
    // accepted limitation and the bucket clears anyway.
    assert_eq!(rig.taker.balance("ETH"), dec!(2) - dec!(1.99));
    assert_eq!(
        rig.strategy.pending_fill_totals(PAIR),
        (Decimal::ZERO, Decimal::ZERO)
    );
}

#[test]
fn rejected_hedge_keeps_fills_queued_for_retry() {
    let mut rig = rig();
    rig.step(1000.0);
    let bid = rig.active_bid().expect("bid placed");

    // No taker book: the market sell cannot fill, the venue rejects it.
    rig.taker.remove_book(TRADING_PAIR);
    rig.maker.fill_limit_order(&bid.id, None);
    rig.step(1001.0);
    assert_eq!(rig.strategy.pending_fill_totals(PAIR).0, dec!(1));
    assert_eq!(rig.taker.balance("ETH"), dec!(100));

    // Liquidity returns; the next tick drains the bucket.
    common::set_taker_top(&rig, dec!(99.5), dec!(100.5));
    rig.step(1002.0);
    assert_eq!(rig.strategy.pending_fill_totals(PAIR).0, Decimal::ZERO);
    assert_eq!(rig.taker.balance("ETH"), dec!(99));
}

#[test]
fn partial_fills_aggregate_into_one_hedge() {
    let mut rig = rig();
    rig.step(1000.0);
    let bid = rig.active_bid().expect("bid placed");

    // Two partial fills arrive while the taker book is away; both buffer.
    rig.taker.remove_book(TRADING_PAIR);
    rig.maker.fill_limit_order(&bid.id, Some(dec!(0.4)));
    rig.maker.fill_limit_order(&bid.id, Some(dec!(0.6)));
    rig.step(1001.0);
    assert_eq!(rig.strategy.pending_fill_totals(PAIR).0, dec!(1));

    // One aggregate taker order drains the whole bucket.
    common::set_taker_top(&rig, dec!(99.5), dec!(100.5));
    rig.step(1002.0);
    assert_eq!(rig.strategy.pending_fill_totals(PAIR).0, Decimal::ZERO);
    assert_eq!(rig.taker.balance("ETH"), dec!(99));
}

#[test]
fn pending_taker_order_blocks_new_maker_orders() {
    let mut rig = rig();
    rig.step(1000.0);
    let bid = rig.active_bid().expect("bid placed");

    // Hedge orders rest on the venue until settled.
    rig.taker.set_defer_market_fills(true);
    rig.maker.fill_limit_order(&bid.id, None);
    rig.step(1001.0);

    // The hedge is in flight: no fresh bid may be quoted yet.
    assert_eq!(rig.strategy.order_tracker().taker_order_count(PAIR), 1);
    rig.step(1002.0);
    assert!(rig.active_bid().is_none());
    assert!(rig.active_ask().is_some());

    // Settlement releases the gate.
    rig.taker.settle_market_orders();
    rig.step(1003.0);
    rig.step(1004.0);
    assert!(rig.active_bid().is_some());
    assert_eq!(rig.strategy.order_tracker().taker_order_count(PAIR), 0);
}

#[test]
fn fills_for_unknown_orders_are_dropped() {
    let mut rig = rig();
    rig.step(1000.0);

    let foreign = xemm_bot::ClientOrderId::new(TradeType::Buy);
    rig.strategy.did_fill_order(&xemm_bot::types::OrderFilledEvent {
        order_id: foreign,
        trade_type: TradeType::Buy,
        order_type: OrderType::Limit,
        amount: dec!(1),
        price: dec!(100),
        timestamp: 1000.5,
    });

    assert_eq!(
        rig.strategy.pending_fill_totals(PAIR),
        (Decimal::ZERO, Decimal::ZERO)
    );
    assert_eq!(rig.taker.balance("ETH"), dec!(100));
}

#[test]
fn taker_market_fills_do_not_feed_the_hedger() {
    let mut rig = rig();
    rig.step(1000.0);
    let bid = rig.active_bid().expect("bid placed");

    rig.maker.fill_limit_order(&bid.id, None);
    // The hedge's own market fill comes back as a MARKET-type event; it
    // must not be buffered as new maker exposure.
    rig.step(1001.0);
    rig.step(1002.0);
    assert_eq!(
        rig.strategy.pending_fill_totals(PAIR),
        (Decimal::ZERO, Decimal::ZERO)
    );
    // Exactly one hedge happened.
    assert_eq!(rig.taker.balance("ETH"), dec!(99));
}
