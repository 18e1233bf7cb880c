//! Observable state owned by the controller.

use crate::types::TodoItem;

/// What the UI renders. Only `TodoResourceClient` mutates it; readers get
/// snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientState {
    pub initialized: bool,
    pub loading: bool,
    pub transaction_pending: bool,
    pub last_item_index: u8,
    pub items: Vec<TodoItem>,
    pub pending_input: String,
    notifications: Vec<Notification>,
    load_generation: u64,
}

impl ClientState {
    pub fn incomplete_items(&self) -> Vec<&TodoItem> {
        self.items.iter().filter(|item| !item.marked).collect()
    }

    pub fn completed_items(&self) -> Vec<&TodoItem> {
        self.items.iter().filter(|item| item.marked).collect()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub(crate) fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    pub(crate) fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Start a load and return its generation. Only the load holding the
    /// latest generation may write its result.
    pub(crate) fn begin_load(&mut self) -> u64 {
        self.load_generation += 1;
        self.loading = true;
        self.load_generation
    }

    /// Invalidate any load in flight. Called when a transaction starts, since
    /// whatever it fetched may predate that transaction.
    pub(crate) fn invalidate_loads(&mut self) {
        self.load_generation += 1;
        self.loading = false;
    }

    pub(crate) fn is_current_load(&self, generation: u64) -> bool {
        self.load_generation == generation
    }

    /// Forget everything tied to the previous owner. The pending input and
    /// undelivered notifications survive.
    pub(crate) fn reset_owner(&mut self) {
        self.initialized = false;
        self.last_item_index = 0;
        self.items.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// A toast for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{Address, Identity};

    fn item(index: u8, marked: bool) -> TodoItem {
        TodoItem {
            address: Address::new([index; 32]),
            index,
            content: format!("item {index}"),
            marked,
            owner: Identity::new([1; 32]),
        }
    }

    #[test]
    fn views_partition_items() {
        // Every marked/unmarked pattern over four items.
        for mask in 0u8..16 {
            let state = ClientState {
                items: (0..4).map(|i| item(i, mask & (1 << i) != 0)).collect(),
                ..Default::default()
            };
            let incomplete = state.incomplete_items();
            let completed = state.completed_items();
            assert_eq!(incomplete.len() + completed.len(), state.items.len());
            assert!(incomplete.iter().all(|i| !completed.contains(i)));
            assert!(state
                .items
                .iter()
                .all(|i| incomplete.contains(&i) || completed.contains(&i)));
        }
    }

    #[test]
    fn views_follow_item_changes() {
        let mut state = ClientState {
            items: vec![item(0, false)],
            ..Default::default()
        };
        assert_eq!(state.incomplete_items().len(), 1);
        state.items[0].marked = true;
        assert!(state.incomplete_items().is_empty());
        assert_eq!(state.completed_items()[0].index, 0);
    }

    #[test]
    fn reset_owner_keeps_input() {
        let mut state = ClientState {
            initialized: true,
            last_item_index: 3,
            items: vec![item(0, false)],
            pending_input: "draft".to_string(),
            ..Default::default()
        };
        state.reset_owner();
        assert!(!state.initialized);
        assert!(state.items.is_empty());
        assert_eq!(state.last_item_index, 0);
        assert_eq!(state.pending_input, "draft");
    }

    #[test]
    fn newer_load_supersedes_older() {
        let mut state = ClientState::default();
        let first = state.begin_load();
        let second = state.begin_load();
        assert!(!state.is_current_load(first));
        assert!(state.is_current_load(second));

        state.invalidate_loads();
        assert!(!state.is_current_load(second));
        assert!(!state.loading);
    }

    #[test]
    fn notifications_drain_once() {
        let mut state = ClientState::default();
        state.notify(Notification::success("done"));
        assert_eq!(state.notifications().len(), 1);
        assert_eq!(state.take_notifications(), vec![Notification::success("done")]);
        assert!(state.notifications().is_empty());
    }
}
