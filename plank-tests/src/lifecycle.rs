use crate::{EventRecorder, User};
use plank::{Connection, EventKind, Flow, InsertEvent, Listener, Outcome, Transport, Value};
use std::mem;

/// Uppercases the email before it is written.
struct NormalizeEmail;

impl Listener for NormalizeEmail {
    fn insert(&self, event: &mut InsertEvent<'_>) -> Flow {
        if let Some(Value::Varchar(email)) = event.values_mut().get_mut("email") {
            *email = email.to_uppercase();
        }
        Flow::Continue
    }
}

/// Event sequencing and cancellation, on a connection whose `users` table is empty.
pub async fn lifecycle<T: Transport>(connection: &mut Connection<T>) {
    let previous = mem::take(connection.events_mut());
    let recorder = EventRecorder::new("r");
    connection
        .events_mut()
        .add_listener(0, recorder.clone())
        .add_listener(10, NormalizeEmail);

    let mut carl = User::new("Carl", "carl@example.com");
    assert_eq!(
        connection.save(&mut carl).await.expect("Failed to insert Carl"),
        Outcome::Inserted
    );
    let expected = [
        "r orm.pre_insert",
        "r orm.insert name,email",
        "r orm.query",
        "r orm.post_insert",
    ];
    assert_eq!(
        recorder
            .events()
            .into_iter()
            .skip_while(|e| e == "r orm.query")
            .collect::<Vec<_>>(),
        expected
    );
    let stored = connection
        .find::<User>(carl.id())
        .await
        .expect("Failed to query Carl")
        .expect("Carl was not found");
    assert_eq!(stored.email, "CARL@EXAMPLE.COM");

    recorder.clear();
    carl.email = "CARL@EXAMPLE.COM".into();
    carl.name = "Carlo".into();
    assert_eq!(
        connection.save(&mut carl).await.expect("Failed to update Carl"),
        Outcome::Updated
    );
    assert!(recorder.events().contains(&"r orm.update name".to_string()));

    recorder.clear();
    assert_eq!(
        connection.remove(&mut carl).await.expect("Failed to remove Carl"),
        Outcome::Deleted
    );
    let kinds = recorder.kinds();
    assert_eq!(kinds.first().map(String::as_str), Some("orm.pre_delete"));
    assert_eq!(kinds.last().map(String::as_str), Some("orm.post_delete"));
    connection.flush().await.expect("Failed to flush");

    // Aborting listeners cancel without touching the database
    *connection.events_mut() = Default::default();
    let vetoes = EventRecorder::new("v").abort_on([EventKind::PreInsert, EventKind::PreDelete]);
    let late = EventRecorder::sharing("late", &vetoes);
    connection
        .events_mut()
        .add_listener(5, vetoes.clone())
        .add_listener(0, late);
    let mut dora = User::new("Dora", "dora@example.com");
    assert_eq!(
        connection.save(&mut dora).await.expect("Failed to save Dora"),
        Outcome::Cancelled
    );
    assert_eq!(dora.id(), 0);
    assert_eq!(vetoes.events(), ["v orm.pre_insert"]);
    assert!(
        connection
            .find_all::<User, _, _, _>([("name", "Dora")])
            .await
            .expect("Failed to query Dora")
            .is_empty()
    );
    connection.rollback().await.expect("Failed to roll back");

    *connection.events_mut() = previous;
}
