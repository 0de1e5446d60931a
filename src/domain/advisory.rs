use std::time::{Duration, Instant};

pub const DEFAULT_ADVISORY_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisoryKind {
    Success,
    Info,
    Error,
}

/// Transient, non-blocking notice for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advisory {
    pub kind: AdvisoryKind,
    pub text: String,
}

impl Advisory {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: AdvisoryKind::Success,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: AdvisoryKind::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: AdvisoryKind::Error,
            text: text.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == AdvisoryKind::Error
    }
}

/// Holds at most one advisory and drops it once its delay has elapsed.
/// Posting replaces the current message and restarts the delay.
#[derive(Debug, Clone)]
pub struct AdvisoryBoard {
    ttl: Duration,
    current: Option<(Advisory, Instant)>,
}

impl Default for AdvisoryBoard {
    fn default() -> Self {
        Self::new(DEFAULT_ADVISORY_TTL)
    }
}

impl AdvisoryBoard {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, current: None }
    }

    pub fn post(&mut self, advisory: Advisory) {
        self.post_at(advisory, Instant::now());
    }

    pub fn post_at(&mut self, advisory: Advisory, now: Instant) {
        match advisory.kind {
            AdvisoryKind::Error => log::warn!("{}", advisory.text),
            _ => log::info!("{}", advisory.text),
        }
        self.current = Some((advisory, now));
    }

    pub fn current(&self) -> Option<&Advisory> {
        self.current_at(Instant::now())
    }

    pub fn current_at(&self, now: Instant) -> Option<&Advisory> {
        match &self.current {
            Some((advisory, posted)) if now.saturating_duration_since(*posted) < self.ttl => {
                Some(advisory)
            }
            _ => None,
        }
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advisory_expires_after_ttl() {
        let mut board = AdvisoryBoard::new(Duration::from_secs(5));
        let start = Instant::now();
        board.post_at(Advisory::info("Quantity updated"), start);

        assert!(board.current_at(start + Duration::from_secs(4)).is_some());
        assert!(board.current_at(start + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn posting_replaces_and_restarts_delay() {
        let mut board = AdvisoryBoard::new(Duration::from_secs(3));
        let start = Instant::now();
        board.post_at(Advisory::info("first"), start);
        board.post_at(Advisory::error("second"), start + Duration::from_secs(2));

        let shown = board
            .current_at(start + Duration::from_secs(4))
            .expect("second advisory still visible");
        assert_eq!(shown.text, "second");
        assert!(shown.is_error());
    }

    #[test]
    fn dismiss_clears_immediately() {
        let mut board = AdvisoryBoard::default();
        board.post(Advisory::success("Saved"));
        board.dismiss();
        assert!(board.current().is_none());
    }
}
