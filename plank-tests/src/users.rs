use plank::{Connection, Found, Model, Outcome, TableDescriptor, Transport};

#[derive(Model, Default, Debug, Clone, PartialEq)]
#[plank(table = "users")]
pub struct User {
    id: i64,
    pub name: String,
    pub email: String,
}

impl User {
    pub fn new(name: &str, email: &str) -> Self {
        Self {
            id: 0,
            name: name.into(),
            email: email.into(),
        }
    }
    pub fn id(&self) -> i64 {
        self.id
    }
}

/// Shape of the `users` table the scenarios expect.
pub fn users_table() -> TableDescriptor {
    TableDescriptor::new("users")
        .column("id")
        .column("name")
        .column("email")
        .primary_key("id", true)
}

/// Insert, reload, update and delete through a connection whose `users` table is empty.
pub async fn users<T: Transport>(connection: &mut Connection<T>) {
    let mut ann = User::new("Ann", "ann@example.com");
    let mut bob = User::new("Bob", "bob@example.com");
    assert_eq!(
        connection.save(&mut ann).await.expect("Failed to insert Ann"),
        Outcome::Inserted
    );
    assert_eq!(
        connection.save(&mut bob).await.expect("Failed to insert Bob"),
        Outcome::Inserted
    );
    assert!(ann.id() > 0);
    assert!(bob.id() > ann.id());
    connection.flush().await.expect("Failed to flush the inserts");

    let found = connection
        .find::<User>(ann.id())
        .await
        .expect("Failed to query Ann")
        .expect("Ann was not found");
    assert_eq!(found, ann);

    ann.name = "Annie".into();
    assert_eq!(
        connection.save(&mut ann).await.expect("Failed to update Ann"),
        Outcome::Updated
    );
    assert_eq!(
        connection.save(&mut ann).await.expect("Failed to save Ann again"),
        Outcome::Unchanged
    );
    connection.flush().await.expect("Failed to flush the update");

    let found = connection
        .repository::<User>()
        .find_by([("email", "ann@example.com")])
        .await
        .expect("Failed to query by email")
        .expect("Ann was not found by email");
    assert_eq!(found.name, "Annie");
    let found = connection
        .repository::<User>()
        .find_by([("name", "Annie"), ("email", "bob@example.com")])
        .await
        .expect("Failed to query by name and email");
    assert_eq!(found, None);

    let Found::One(found) = connection
        .repository::<User>()
        .find_by_property("findByName", "Bob")
        .await
        .expect("Failed to call findByName")
    else {
        panic!("findByName is expected to return one object");
    };
    assert_eq!(found, Some(bob.clone()));

    let mut query = connection.create_query_builder::<User>("");
    query.order_by("`id`", "");
    let all = query
        .fetch_all(connection)
        .await
        .expect("Failed to load every user");
    assert_eq!(all, [ann.clone(), bob.clone()]);

    assert_eq!(
        connection.remove(&mut bob).await.expect("Failed to remove Bob"),
        Outcome::Deleted
    );
    connection.flush().await.expect("Failed to flush the delete");
    assert_eq!(
        connection
            .find::<User>(bob.id())
            .await
            .expect("Failed to query Bob"),
        None
    );
    let remaining = connection
        .find_all::<User, _, _, _>([("email", "ann@example.com")])
        .await
        .expect("Failed to query the remaining users");
    assert_eq!(remaining, [ann]);
}
