//! Deferred actions on the host clock.
//!
//! Nothing runs on its own: the owner drains due actions at the start of
//! every tick. Cancelling a token guarantees its action is never returned.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

#[derive(Debug)]
struct Pending<A> {
    token: TimerToken,
    due_ms: f64,
    action: A,
}

#[derive(Debug)]
pub struct Scheduler<A> {
    next: u64,
    pending: Vec<Pending<A>>,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Scheduler<A> {
    pub fn new() -> Self {
        Self {
            next: 0,
            pending: Vec::new(),
        }
    }

    pub fn schedule(&mut self, due_ms: f64, action: A) -> TimerToken {
        let token = TimerToken(self.next);
        self.next += 1;
        self.pending.push(Pending {
            token,
            due_ms,
            action,
        });
        token
    }

    /// Returns false if the token already fired or was cancelled.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.token != token);
        self.pending.len() != before
    }

    /// Remove and return every action due at `now_ms`, earliest first;
    /// equal deadlines keep scheduling order.
    pub fn take_due(&mut self, now_ms: f64) -> Vec<(TimerToken, A)> {
        let (mut due, rest): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|p| p.due_ms <= now_ms);
        self.pending = rest;
        due.sort_by(|a, b| {
            a.due_ms
                .total_cmp(&b.due_ms)
                .then(a.token.0.cmp(&b.token.0))
        });
        due.into_iter().map(|p| (p.token, p.action)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_deadline_order() {
        let mut s = Scheduler::new();
        s.schedule(30.0, "c");
        s.schedule(10.0, "a");
        s.schedule(10.0, "b");
        assert!(s.take_due(5.0).is_empty());
        let fired: Vec<_> = s.take_due(30.0).into_iter().map(|(_, a)| a).collect();
        assert_eq!(fired, vec!["a", "b", "c"]);
        assert!(s.take_due(1000.0).is_empty());
    }

    #[test]
    fn test_cancel_prevents_firing() {
        let mut s = Scheduler::new();
        let t = s.schedule(10.0, 1);
        s.schedule(20.0, 2);
        assert!(s.cancel(t));
        assert!(!s.cancel(t));
        let fired: Vec<_> = s.take_due(100.0).into_iter().map(|(_, a)| a).collect();
        assert_eq!(fired, vec![2]);
    }

    #[test]
    fn test_fired_token_no_longer_pending() {
        let mut s = Scheduler::new();
        let t = s.schedule(0.0, ());
        assert_eq!(s.take_due(0.0).len(), 1);
        assert!(!s.cancel(t));
        assert!(s.take_due(10.0).is_empty());
    }
}
