//! Reminder and session persistence against an on-disk database.

use chime_core::{Database, Reminder, ReminderStore, SessionStore};
use tempfile::TempDir;

#[test]
fn reminders_survive_reopen_in_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("chime.db");
    let reminders = vec![
        Reminder::new("Call mom", "2030-05-01 18:00:00"),
        Reminder::new("Dentist", "2030-05-02T09:30:00+02:00"),
        Reminder::new("Call mom", "2030-05-01 18:00:00"),
    ];

    {
        let mut store = ReminderStore::new(Database::open_at(&path).unwrap());
        for reminder in &reminders {
            store.append(reminder.clone()).unwrap();
        }
    }

    let mut store = ReminderStore::new(Database::open_at(&path).unwrap());
    assert_eq!(store.read_all(), reminders);

    // Duplicates are independent entries; removal takes every exact match.
    assert_eq!(store.remove("Call mom", "2030-05-01 18:00:00").unwrap(), 2);
    assert_eq!(store.read_all(), vec![reminders[1].clone()]);

    store.clear().unwrap();
    assert!(store.read_all().is_empty());
}

#[test]
fn session_state_persists() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("chime.db");

    let id = {
        let mut session = SessionStore::new(Database::open_at(&path).unwrap());
        session.set_muted("weather", true).unwrap();
        session.session_id().unwrap()
    };

    let mut session = SessionStore::new(Database::open_at(&path).unwrap());
    assert!(session.is_muted("weather"));
    assert!(!session.is_muted("jokes"));
    assert_eq!(session.session_id().unwrap(), id);
}

#[test]
fn reminder_store_and_session_share_one_database() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("chime.db");

    let mut store = ReminderStore::new(Database::open_at(&path).unwrap());
    store.append(Reminder::new("Stretch", "2030-01-01 10:00")).unwrap();
    let db = store.into_inner();

    let mut session = SessionStore::new(db);
    session.toggle_muted("news").unwrap();
    assert!(session.is_muted("news"));
}
