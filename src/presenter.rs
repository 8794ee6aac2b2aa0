use crate::{
    crash::CrashSnapshot,
    mines::MinesSnapshot,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NoticeKind {
    Info,
    Success,
    Failure,
}

/// A state snapshot handed to the presentation layer after every engine
/// transition. Snapshots carry only player-visible data; in particular a
/// Crash round's crash point is never part of one.
#[derive(Clone, Debug)]
pub enum GameView<'a> {
    Crash(&'a CrashSnapshot),
    Mines(&'a MinesSnapshot),
}

/// The host presentation layer as the engines see it: redraw, toast,
/// loading indicator. Implementations must treat `render` as idempotent.
pub trait Presenter {
    fn render(&mut self, view: GameView<'_>);
    fn notify(&mut self, message: &str, kind: NoticeKind);
    fn set_busy(&mut self, busy: bool, label: &str);
}

/// Presenter that drops everything; handy for headless use.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopPresenter;

impl Presenter for NoopPresenter {
    fn render(&mut self, _view: GameView<'_>) {}
    fn notify(&mut self, _message: &str, _kind: NoticeKind) {}
    fn set_busy(&mut self, _busy: bool, _label: &str) {}
}

pub fn format_money(amount: f64) -> String {
    format!("${:.2}", amount)
}

pub fn format_multiplier(multiplier: f64) -> String {
    format!("{:.2}x", multiplier)
}
