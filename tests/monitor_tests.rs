use std::{cell::RefCell, rc::Rc};

use pricer::{
    errors::BookError,
    monitor::{Monitor, Signal},
    orders::{Notional, Order, Side, Timestamp},
};

type Changes = Rc<RefCell<Vec<(Signal, Timestamp, Option<Notional>)>>>;

fn monitor(target: u64) -> (Monitor, Changes) {
    let mut m = Monitor::new(target).unwrap();
    let changes: Changes = Rc::default();

    let sink = Rc::clone(&changes);
    m.on_buying_price_changed(move |ts, total| sink.borrow_mut().push((Signal::Buying, ts, total)));
    let sink = Rc::clone(&changes);
    m.on_selling_price_changed(move |ts, total| sink.borrow_mut().push((Signal::Selling, ts, total)));
    (m, changes)
}

/// Adding the only ask, large enough to cover the target, prices the buy side.
#[test]
fn scenario_single_ask_prices_buying() {
    let (mut m, changes) = monitor(200);
    assert!(m.add(1, Order::sell("ask", 10050, 300)).is_ok());

    assert_eq!(*changes.borrow(), vec![(Signal::Buying, 1, Some(2_010_000))]);
}

/// A small bid touches only the selling signal, which stays unavailable.
#[test]
fn scenario_small_bid_leaves_buying_alone() {
    let (mut m, changes) = monitor(200);
    m.add(1, Order::sell("ask", 10050, 300)).unwrap();
    m.add(2, Order::buy("bid", 9900, 50)).unwrap();

    // the selling signal starts out unavailable, so 50 < 200 is not a change
    assert_eq!(*changes.borrow(), vec![(Signal::Buying, 1, Some(2_010_000))]);
    assert_eq!(m.buying_price(), Some(2_010_000));
    assert_eq!(m.selling_price(), None);
}

/// Removing the only ask flips the buying signal to unavailable exactly once.
#[test]
fn scenario_full_removal_goes_unavailable() {
    let (mut m, changes) = monitor(200);
    m.add(1, Order::sell("ask", 10050, 300)).unwrap();
    m.add(2, Order::buy("bid", 9900, 50)).unwrap();
    m.reduce(3, "ask", 300).unwrap();

    assert_eq!(
        *changes.borrow(),
        vec![
            (Signal::Buying, 1, Some(2_010_000)),
            (Signal::Buying, 3, None),
        ]
    );
    assert!(m.book().locate("ask").is_none());
}

#[test]
fn selling_signal_fires_when_bids_cover_target() {
    let (mut m, changes) = monitor(200);
    m.add(1, Order::buy("a", 9900, 150)).unwrap();
    m.add(2, Order::buy("b", 9800, 100)).unwrap();

    assert_eq!(
        *changes.borrow(),
        vec![(Signal::Selling, 2, Some(150 * 9900 + 50 * 9800))]
    );
}

#[test]
fn unknown_reduce_fails_without_side_effects() {
    let (mut m, changes) = monitor(10);
    m.add(1, Order::sell("a", 100, 20)).unwrap();
    changes.borrow_mut().clear();

    assert_eq!(m.reduce(2, "ghost", 5), Err(BookError::UnknownOrder("ghost".into())));
    assert!(changes.borrow().is_empty());
    assert_eq!(m.book().len(), 1);
    assert_eq!(m.book().locate("a").unwrap().quantity, 20);
}

#[test]
fn reduce_to_exactly_zero_removes_from_both_structures() {
    let (mut m, _) = monitor(10);
    m.add(1, Order::buy("a", 100, 20)).unwrap();
    m.reduce(2, "a", 20).unwrap();

    assert!(m.book().locate("a").is_none());
    assert!(m.book().locate_in_side(Side::Buy, 100, "a").is_none());
    assert!(m.book().best(Side::Buy).is_none());
    m.book().check_invariants().unwrap();
}

#[test]
fn unchanged_total_does_not_refire() {
    let (mut m, changes) = monitor(10);
    m.add(1, Order::sell("a", 100, 20)).unwrap();
    // a worse ask beyond what the target consumes leaves the total alone
    m.add(2, Order::sell("b", 200, 20)).unwrap();
    // shrinking the first ask while it still covers the target, too
    m.reduce(3, "a", 5).unwrap();
    m.reduce(4, "b", 20).unwrap();

    assert_eq!(*changes.borrow(), vec![(Signal::Buying, 1, Some(1_000))]);
}

#[test]
fn identifier_can_be_reused_after_removal() {
    let (mut m, changes) = monitor(5);
    m.add(1, Order::sell("x", 100, 5)).unwrap();
    m.reduce(2, "x", 5).unwrap();
    m.add(3, Order::buy("x", 90, 5)).unwrap();

    assert_eq!(m.book().locate("x").unwrap().side, Side::Buy);
    assert_eq!(
        *changes.borrow(),
        vec![
            (Signal::Buying, 1, Some(500)),
            (Signal::Buying, 2, None),
            (Signal::Selling, 3, Some(450)),
        ]
    );
}

#[test]
fn reduce_keeps_queue_position_of_neighbours() {
    let (mut m, _) = monitor(1);
    for id in ["p", "q", "r"] {
        m.add(1, Order::buy(id, 100, 10)).unwrap();
    }
    m.reduce(2, "q", 4).unwrap();

    let book = m.book();
    assert_eq!(book.locate_in_side(Side::Buy, 100, "p"), Some(0));
    assert_eq!(book.locate_in_side(Side::Buy, 100, "q"), Some(1));
    assert_eq!(book.locate_in_side(Side::Buy, 100, "r"), Some(2));
    assert_eq!(book.best(Side::Buy).unwrap().quantity, 26);
}
