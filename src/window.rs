/// Signals produced by the betting window countdown, one per second.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WindowEvent {
    /// Still counting down; carries the remaining whole seconds.
    Counting(u32),
    /// The countdown just elapsed; bets are now accepted. Emitted exactly
    /// once per countdown.
    Opened,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum WindowState {
    /// Closed and counting down toward open.
    Counting { remaining: u32 },
    /// Countdown elapsed; bets accepted.
    Open,
    /// Closed with no countdown running (a round is in progress).
    Idle,
}

/// Gates when a Crash bet may be placed, giving players a predictable
/// window between rounds.
#[derive(Clone, Debug)]
pub struct BettingWindowTimer {
    state: WindowState,
}

impl BettingWindowTimer {
    /// Starts closed with a countdown already running.
    pub fn new(duration_secs: u32) -> Self {
        let mut timer = Self {
            state: WindowState::Idle,
        };
        timer.start(duration_secs);
        timer
    }

    /// Begin (or restart) the countdown. A re-entrant call replaces any
    /// countdown in progress, so there is never more than one live.
    pub fn start(&mut self, duration_secs: u32) {
        self.state = if duration_secs == 0 {
            WindowState::Open
        } else {
            WindowState::Counting {
                remaining: duration_secs,
            }
        };
    }

    /// Close the window without starting a countdown; used when a round
    /// begins.
    pub fn close(&mut self) {
        self.state = WindowState::Idle;
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> Option<WindowEvent> {
        match self.state {
            WindowState::Counting { remaining } => {
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.state = WindowState::Open;
                    Some(WindowEvent::Opened)
                } else {
                    self.state = WindowState::Counting { remaining };
                    Some(WindowEvent::Counting(remaining))
                }
            }
            WindowState::Open | WindowState::Idle => None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == WindowState::Open
    }

    /// Remaining seconds while counting down, `None` otherwise.
    pub fn remaining(&self) -> Option<u32> {
        match self.state {
            WindowState::Counting { remaining } => Some(remaining),
            _ => None,
        }
    }
}
