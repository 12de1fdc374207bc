#![forbid(unsafe_code)]

//! The user list screen: a list observable rendered into labels.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rxbind_runtime::{Observable, PropertyCell, Sink, SubscriptionSet, bind, bind_weak};
use tracing::{info, trace};

use crate::user::{User, default_users};

/// Number given to the first user added with [`UsersScreen::press_add`].
pub const FIRST_NEW_USER: u32 = 7;
/// Age given to users added with [`UsersScreen::press_add`].
pub const NEW_USER_AGE: u32 = 32;

/// A vertical stack of name labels.
///
/// Renders one label per distinct name, so re-emitting a list that was
/// already shown adds nothing.
#[derive(Debug, Default)]
pub struct LabelList {
    labels: RefCell<Vec<String>>,
}

impl LabelList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.labels.borrow().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.borrow().is_empty()
    }
}

impl Sink<Vec<User>> for LabelList {
    fn set_property(&self, users: Vec<User>) {
        let mut labels = self.labels.borrow_mut();
        for user in users {
            if labels.contains(&user.name) {
                continue;
            }
            trace!(name = %user.name, "label added");
            labels.push(user.name);
        }
    }
}

pub struct UsersScreen {
    users: Observable<Vec<User>>,
    labels: Rc<LabelList>,
    count_label: PropertyCell<String>,
    next_number: Cell<u32>,
    new_user_age: u32,
    _subscriptions: SubscriptionSet,
}

impl UsersScreen {
    /// Screen seeded with the default users.
    #[must_use]
    pub fn new() -> Self {
        Self::with_users(default_users())
    }

    #[must_use]
    pub fn with_users(users: Vec<User>) -> Self {
        let users = Observable::new(users);
        let labels = Rc::new(LabelList::new());
        let count_label = PropertyCell::new();

        let mut subscriptions = SubscriptionSet::new();
        subscriptions.insert(bind_weak(&users, &labels));
        let count_sink = count_label.clone();
        subscriptions.insert(bind(&users, move |list: Vec<User>| {
            count_sink.set_property(format!("{} users", list.len()));
        }));

        Self {
            users,
            labels,
            count_label,
            next_number: Cell::new(FIRST_NEW_USER),
            new_user_age: NEW_USER_AGE,
            _subscriptions: subscriptions,
        }
    }

    /// Start `press_add` numbering at `first` and give new users `age`.
    #[must_use]
    pub fn with_numbering(self, first: u32, age: u32) -> Self {
        self.next_number.set(first);
        Self {
            new_user_age: age,
            ..self
        }
    }

    /// The list observable, for binding elsewhere.
    #[must_use]
    pub fn users(&self) -> &Observable<Vec<User>> {
        &self.users
    }

    pub fn append_user(&self, user: User) {
        info!(name = %user.name, age = user.age, "user appended");
        self.users.update(|list| list.push(user));
    }

    /// The "add" button: append `New User {n}` and advance `n`.
    pub fn press_add(&self) -> User {
        let number = self.next_number.get();
        self.next_number.set(number + 1);
        let user = User::new(format!("New User {number}"), self.new_user_age);
        self.append_user(user.clone());
        user
    }

    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.labels.labels()
    }

    /// Text of the "N users" label.
    #[must_use]
    pub fn count_text(&self) -> Option<String> {
        self.count_label.value()
    }
}

impl Default for UsersScreen {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_render_seed_list() {
        let screen = UsersScreen::new();
        assert_eq!(screen.labels(), vec!["Anton", "Max", "Alex"]);
        assert_eq!(screen.count_text().as_deref(), Some("3 users"));
    }

    #[test]
    fn press_add_appends_numbered_user() {
        let screen = UsersScreen::new();
        let added = screen.press_add();
        assert_eq!(added, User::new("New User 7", 32));
        assert_eq!(screen.users().with(Vec::len), 4);
        assert_eq!(
            screen.labels(),
            vec!["Anton", "Max", "Alex", "New User 7"]
        );
        assert_eq!(screen.count_text().as_deref(), Some("4 users"));
    }

    #[test]
    fn repeated_emission_adds_no_duplicate_labels() {
        let screen = UsersScreen::new();
        screen.press_add();
        let same = screen.users().get();
        screen.users().set(same.clone());
        screen.users().set(same);
        assert_eq!(screen.labels().len(), 4);
    }

    #[test]
    fn numbering_is_configurable() {
        let screen = UsersScreen::new().with_numbering(100, 40);
        assert_eq!(screen.press_add(), User::new("New User 100", 40));
        assert_eq!(screen.press_add(), User::new("New User 101", 40));
    }

    #[test]
    fn dropping_screen_releases_bindings() {
        let screen = UsersScreen::new();
        let users = screen.users().clone();
        assert_eq!(users.subscriber_count(), 2);
        drop(screen);
        assert_eq!(users.subscriber_count(), 0);
    }

    #[test]
    fn label_list_ignores_known_names() {
        let list = LabelList::new();
        list.set_property(vec![User::new("A", 1), User::new("A", 2)]);
        list.set_property(vec![User::new("B", 1)]);
        assert_eq!(list.labels(), vec!["A", "B"]);
    }
}
