#![allow(non_snake_case)]
use minicasino::{
    BettingWindowTimer,
    window::WindowEvent,
};
use proptest::prelude::*;

#[test]
fn tick__counts_down_then_opens_once() {
    // given
    let mut timer = BettingWindowTimer::new(3);
    assert!(!timer.is_open());
    assert_eq!(timer.remaining(), Some(3));

    // when / then
    assert_eq!(timer.tick(), Some(WindowEvent::Counting(2)));
    assert_eq!(timer.tick(), Some(WindowEvent::Counting(1)));
    assert_eq!(timer.tick(), Some(WindowEvent::Opened));
    assert!(timer.is_open());

    // once open, further ticks are silent
    assert_eq!(timer.tick(), None);
    assert_eq!(timer.tick(), None);
}

#[test]
fn start__with_zero_duration_opens_immediately() {
    let timer = BettingWindowTimer::new(0);
    assert!(timer.is_open());
    assert_eq!(timer.remaining(), None);
}

#[test]
fn close__stops_the_countdown() {
    // given
    let mut timer = BettingWindowTimer::new(5);
    timer.tick();

    // when
    timer.close();

    // then: no countdown, no events, not open
    assert!(!timer.is_open());
    assert_eq!(timer.remaining(), None);
    assert_eq!(timer.tick(), None);
}

#[test]
fn start__restarts_a_countdown_in_progress() {
    // given
    let mut timer = BettingWindowTimer::new(4);
    timer.tick();
    timer.tick();

    // when
    timer.start(4);

    // then
    assert_eq!(timer.remaining(), Some(4));
    assert_eq!(timer.tick(), Some(WindowEvent::Counting(3)));
}

proptest! {
    /// For any countdown length, exactly `duration` ticks elapse before
    /// the window opens, and `Opened` fires exactly once.
    #[test]
    fn tick__opens_after_exactly_duration_ticks(duration in 1u32..120) {
        let mut timer = BettingWindowTimer::new(duration);
        let mut opened = 0usize;
        let mut ticks = 0usize;
        while !timer.is_open() {
            match timer.tick() {
                Some(WindowEvent::Opened) => opened += 1,
                Some(WindowEvent::Counting(_)) => {}
                None => prop_assert!(false, "countdown stalled"),
            }
            ticks += 1;
            prop_assert!(ticks <= duration as usize, "countdown overran");
        }
        prop_assert_eq!(ticks, duration as usize);
        prop_assert_eq!(opened, 1);
        // and it never fires again
        for _ in 0..3 {
            prop_assert_eq!(timer.tick(), None);
        }
    }
}
