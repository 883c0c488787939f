use std::collections::HashMap;

use indexmap::IndexMap;

use crate::github::Review;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Authored,
    Approved,
    Commented,
    ChangesRequested,
    Dismissed,
}

/// Per-user counters; every field only ever goes up.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UserStat {
    pub authored: u64,
    pub approved: u64,
    pub commented: u64,
    pub changes_requested: u64,
    pub dismissed: u64,
}

impl UserStat {
    #[cfg(test)]
    pub(crate) fn count(&self, kind: EventKind) -> u64 {
        match kind {
            EventKind::Authored => self.authored,
            EventKind::Approved => self.approved,
            EventKind::Commented => self.commented,
            EventKind::ChangesRequested => self.changes_requested,
            EventKind::Dismissed => self.dismissed,
        }
    }

    fn counter_mut(&mut self, kind: EventKind) -> &mut u64 {
        match kind {
            EventKind::Authored => &mut self.authored,
            EventKind::Approved => &mut self.approved,
            EventKind::Commented => &mut self.commented,
            EventKind::ChangesRequested => &mut self.changes_requested,
            EventKind::Dismissed => &mut self.dismissed,
        }
    }
}

/// Review activity over a range of pull requests.
///
/// `blocked` is keyed by (PR author, reviewer who requested changes) and
/// keeps first-seen order, which the report relies on for ties.
#[derive(Debug, Default)]
pub struct Activity {
    users: HashMap<String, UserStat>,
    blocked: IndexMap<(String, String), u64>,
}

impl Activity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_user_event(&mut self, handle: &str, kind: EventKind) {
        let stat = self.users.entry(handle.to_string()).or_default();
        *stat.counter_mut(kind) += 1;
    }

    pub fn record_blocked_event(&mut self, blocked: &str, blocking: &str) {
        *self
            .blocked
            .entry((blocked.to_string(), blocking.to_string()))
            .or_insert(0) += 1;
    }

    /// Tally one pull request: its author and every review it received.
    pub fn record_pull(&mut self, author: &str, reviews: &[Review]) {
        self.record_user_event(author, EventKind::Authored);
        for review in reviews {
            let Some(kind) = review.state.event_kind() else {
                log::debug!("ignoring review in state {:?}", review.state);
                continue;
            };
            let Some(user) = &review.user else {
                log::debug!("skipping {kind:?} review from a deleted account");
                continue;
            };
            self.record_user_event(&user.login, kind);
            if kind == EventKind::ChangesRequested {
                self.record_blocked_event(author, &user.login);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn user(&self, handle: &str) -> Option<&UserStat> {
        self.users.get(handle)
    }

    #[cfg(test)]
    pub(crate) fn blocked_count(&self, blocked: &str, blocking: &str) -> Option<u64> {
        self.blocked
            .get(&(blocked.to_string(), blocking.to_string()))
            .copied()
    }

    /// Users in arbitrary order.
    pub fn users(&self) -> impl Iterator<Item = (&str, &UserStat)> {
        self.users.iter().map(|(handle, stat)| (handle.as_str(), stat))
    }

    /// (blocked, blocking, count) in first-seen order.
    pub fn blocked(&self) -> impl Iterator<Item = (&str, &str, u64)> {
        self.blocked
            .iter()
            .map(|((blocked, blocking), count)| (blocked.as_str(), blocking.as_str(), *count))
    }
}
