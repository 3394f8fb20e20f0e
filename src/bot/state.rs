//! Global gating state
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;

use crate::core::config::{Config, Identities, DEFAULT_PREFIX};
use crate::transport::{Author, UserId};

/// State read by the gate on every event and changed by admin commands
#[derive(Debug, Clone)]
pub struct BotState {
    pub enabled: bool,
    /// Non-owners are ignored until this instant; a past instant means not suspended
    pub suspended_until: DateTime<Utc>,
    /// Cleared to stop the bot; checked before anything else
    pub running: bool,
    pub owner_ids: HashSet<UserId>,
    pub privileged_user_ids: HashSet<UserId>,
    pub prefix: String,
    pub owner_name: String,
    pub chatbot_name: String,
    pub source_url: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl Default for BotState {
    fn default() -> Self {
        Self {
            enabled: true,
            suspended_until: DateTime::<Utc>::UNIX_EPOCH,
            running: true,
            owner_ids: HashSet::new(),
            privileged_user_ids: HashSet::new(),
            prefix: DEFAULT_PREFIX.to_string(),
            owner_name: String::new(),
            chatbot_name: String::new(),
            source_url: None,
            started_at: Utc::now(),
        }
    }
}

impl BotState {
    pub fn from_config(config: &Config, identities: Identities) -> Self {
        Self {
            owner_ids: identities.owners,
            privileged_user_ids: identities.privileged_users,
            prefix: config.prefix.clone(),
            owner_name: config.general.owner_name.clone().unwrap_or_default(),
            chatbot_name: config.general.chatbot_name.clone().unwrap_or_default(),
            source_url: config.general.source_url.clone(),
            ..Self::default()
        }
    }

    /// The console is always an owner
    pub fn is_owner(&self, author: Author) -> bool {
        match author {
            Author::Console => true,
            Author::User(id) => self.owner_ids.contains(&id),
        }
    }

    /// Owners and configured privileged users
    pub fn is_privileged(&self, author: Author) -> bool {
        match author {
            Author::Console => true,
            Author::User(id) => {
                self.owner_ids.contains(&id) || self.privileged_user_ids.contains(&id)
            }
        }
    }

    pub fn is_suspended_at(&self, now: DateTime<Utc>) -> bool {
        self.suspended_until > now
    }

    pub fn suspend_for(&mut self, now: DateTime<Utc>, duration: Duration) {
        self.suspended_until = now + duration;
    }

    pub fn unsuspend(&mut self) {
        self.suspended_until = DateTime::<Utc>::UNIX_EPOCH;
    }

    /// Gate check: stopped admits nobody; disabled or suspended admits owners only
    pub fn admits(&self, author: Author, now: DateTime<Utc>) -> bool {
        if !self.running {
            return false;
        }
        if (!self.enabled || self.is_suspended_at(now)) && !self.is_owner(author) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: UserId = UserId(1);
    const USER: UserId = UserId(2);

    fn state() -> BotState {
        BotState {
            owner_ids: HashSet::from([OWNER]),
            privileged_user_ids: HashSet::from([UserId(3)]),
            ..BotState::default()
        }
    }

    #[test]
    fn test_default_admits_everyone() {
        let state = state();
        let now = Utc::now();
        assert!(state.admits(Author::User(USER), now));
        assert!(state.admits(Author::User(OWNER), now));
    }

    #[test]
    fn test_disabled_admits_owners_only() {
        let mut state = state();
        state.enabled = false;
        let now = Utc::now();
        assert!(!state.admits(Author::User(USER), now));
        assert!(state.admits(Author::User(OWNER), now));
        assert!(state.admits(Author::Console, now));
    }

    #[test]
    fn test_suspension_expires() {
        let mut state = state();
        let now = Utc::now();
        state.suspend_for(now, Duration::minutes(5));
        assert!(!state.admits(Author::User(USER), now));
        assert!(state.admits(Author::User(USER), now + Duration::minutes(6)));

        state.unsuspend();
        assert!(state.admits(Author::User(USER), now));
    }

    #[test]
    fn test_stopped_admits_nobody() {
        let mut state = state();
        state.running = false;
        let now = Utc::now();
        assert!(!state.admits(Author::User(OWNER), now));
        assert!(!state.admits(Author::Console, now));
    }

    #[test]
    fn test_privileged_users() {
        let state = state();
        assert!(state.is_privileged(Author::User(UserId(3))));
        assert!(state.is_privileged(Author::User(OWNER)));
        assert!(!state.is_privileged(Author::User(USER)));
        assert!(!state.is_owner(Author::User(UserId(3))));
    }
}
