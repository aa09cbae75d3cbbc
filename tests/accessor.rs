#[cfg(test)]
mod tests {
    use plank::{Accessors, AsValue, Config, Model, RowLabeled, TableDescriptor, Value};
    use plank_tests::{MemoryDatabase, init_logs};
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use time::macros::date;
    use uuid::Uuid;

    #[derive(Model, Default, Debug, PartialEq)]
    #[plank(table = "people", accessors = person_accessors)]
    struct Person {
        id: i64,
        pub first_name: String,
        last_name: String,
        #[plank(column = "mail")]
        pub email: String,
        #[plank(visible)]
        age: u32,
        #[plank(skip)]
        pub loaded: bool,
    }

    fn person_accessors(accessors: Accessors<Person>) -> Accessors<Person> {
        accessors
            .method("getFullName", |p| {
                Value::Varchar(format!("{} {}", p.first_name, p.last_name))
            })
            .method("getLastName", |p| p.last_name.to_uppercase().as_value())
            .setter("setLastName", |p, v| {
                p.last_name = String::try_from_value(v)?.to_lowercase();
                p.loaded = true;
                Ok(())
            })
    }

    fn person() -> Person {
        Person {
            id: 3,
            first_name: "Ada".into(),
            last_name: "lovelace".into(),
            email: "ada@example.com".into(),
            age: 36,
            loaded: false,
        }
    }

    fn people_table() -> TableDescriptor {
        TableDescriptor::new("people")
            .column("id")
            .column("first_name")
            .column("last_name")
            .column("mail")
            .column("age")
            .primary_key("id", true)
    }

    #[test]
    fn table_names() {
        #[derive(Model, Default)]
        struct OrderLine {}
        #[derive(Model, Default)]
        struct _Draft {}

        assert_eq!(Person::table_name(), "people");
        assert_eq!(OrderLine::table_name(), "order_line");
        assert_eq!(_Draft::table_name(), "draft");
    }

    #[test]
    fn reading() {
        let accessors = Person::accessors();
        let ada = person();
        assert_eq!(
            accessors.get(&ada, "first_name"),
            Some(Value::Varchar("Ada".into()))
        );
        assert_eq!(
            accessors.get(&ada, "mail"),
            Some(Value::Varchar("ada@example.com".into()))
        );
        assert_eq!(accessors.get(&ada, "email"), None);
        assert_eq!(accessors.get(&ada, "age"), Some(Value::UInt64(36)));
        assert_eq!(
            accessors.get(&ada, "full_name"),
            Some(Value::Varchar("Ada lovelace".into()))
        );
        // The getter wins over the hidden field
        assert_eq!(
            accessors.get(&ada, "last_name"),
            Some(Value::Varchar("LOVELACE".into()))
        );
        assert_eq!(accessors.get(&ada, "loaded"), None);
        assert_eq!(accessors.get(&ada, "id"), None);
        assert_eq!(accessors.read(&ada, "id"), Some(Value::Int64(3)));
        assert_eq!(
            accessors.primary_key(&ada, &people_table()),
            Some(Value::Int64(3))
        );
        let values = accessors.values(&ada, &people_table());
        assert_eq!(
            values.keys().collect::<Vec<_>>(),
            ["first_name", "last_name", "mail", "age"]
        );
    }

    #[test]
    fn writing() {
        let accessors = Person::accessors();
        let mut ada = Person::default();
        assert!(
            accessors
                .set(&mut ada, "last_name", Value::Varchar("LOVELACE".into()))
                .unwrap()
        );
        assert_eq!(ada.last_name, "lovelace");
        assert!(ada.loaded);
        assert!(accessors.set(&mut ada, "id", Value::UInt64(9)).unwrap());
        assert_eq!(ada.id, 9);
        assert!(!accessors.set(&mut ada, "nickname", Value::Null).unwrap());
        assert!(
            accessors
                .set(&mut ada, "age", Value::Varchar("old".into()))
                .is_err()
        );

        let table = people_table();
        assert!(
            accessors
                .set_primary_key(&mut ada, &table, Value::UInt64(10))
                .unwrap()
        );
        assert_eq!(ada.id, 10);
        let manual = TableDescriptor::new("people")
            .column("id")
            .primary_key("id", false);
        assert!(
            !accessors
                .set_primary_key(&mut ada, &manual, Value::UInt64(11))
                .unwrap()
        );
        assert_eq!(ada.id, 10);
    }

    #[test]
    fn hydrate() {
        let row = RowLabeled::new(
            Arc::from(
                ["id", "first_name", "last_name", "mail", "age", "extra"]
                    .map(String::from)
                    .to_vec(),
            ),
            [
                Value::Int64(3),
                Value::Varchar("Ada".into()),
                Value::Varchar("Lovelace".into()),
                Value::Varchar("ada@example.com".into()),
                Value::Int64(36),
                Value::Boolean(true),
            ]
            .into(),
        );
        let ada = Person::accessors().hydrate(&row).unwrap();
        assert_eq!(ada, Person { loaded: true, ..person() });
    }

    #[tokio::test]
    async fn stored_through_the_accessors() {
        init_logs();
        let database = MemoryDatabase::new();
        database.create_table(people_table());
        let mut connection = database
            .connect(Config::new("mysql").dbname("people"))
            .expect("Could not connect");
        let mut ada = Person { id: 0, ..person() };
        connection.save(&mut ada).await.expect("Failed to insert");
        assert_eq!(ada.id, 1);
        let row = &database.rows("people")[0];
        assert_eq!(row["last_name"], Value::Varchar("LOVELACE".into()));
        assert_eq!(row["age"], Value::UInt64(36));

        let loaded = connection
            .find::<Person>(1)
            .await
            .expect("Failed to query")
            .expect("Ada was not found");
        assert_eq!(loaded, Person { loaded: true, ..ada });
    }

    #[derive(Model, Debug, Clone, PartialEq)]
    #[plank(table = "readings")]
    struct Reading {
        id: i64,
        pub sensor: Uuid,
        pub taken: time::Date,
        pub amount: Decimal,
        pub ratio: f64,
        pub note: Option<String>,
        pub valid: bool,
        pub raw: Vec<u8>,
    }

    impl Default for Reading {
        fn default() -> Self {
            Self {
                id: 0,
                sensor: Uuid::nil(),
                taken: date!(1970 - 01 - 01),
                amount: Decimal::ZERO,
                ratio: 0.0,
                note: None,
                valid: false,
                raw: Vec::new(),
            }
        }
    }

    #[tokio::test]
    async fn typed_fields() {
        init_logs();
        let database = MemoryDatabase::new();
        database.create_table(
            TableDescriptor::new("readings")
                .column("id")
                .column("sensor")
                .column("taken")
                .column("amount")
                .column("ratio")
                .column("note")
                .column("valid")
                .column("raw")
                .primary_key("id", true),
        );
        let mut connection = database
            .connect(Config::new("mysql").dbname("readings"))
            .expect("Could not connect");
        let mut reading = Reading {
            id: 0,
            sensor: Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap(),
            taken: date!(2024 - 02 - 29),
            amount: Decimal::new(12345, 2),
            ratio: 0.25,
            note: None,
            valid: true,
            raw: vec![0xde, 0xad],
        };
        connection.save(&mut reading).await.expect("Failed to insert");
        assert_eq!(database.rows("readings")[0]["note"], Value::Null);
        let loaded = connection
            .find::<Reading>(reading.id)
            .await
            .expect("Failed to query")
            .expect("The reading was not found");
        assert_eq!(loaded, reading);

        reading.note = Some("checked".into());
        connection.save(&mut reading).await.expect("Failed to update");
        connection.flush().await.expect("Failed to flush");
        let row = &database.rows("readings")[0];
        assert_eq!(row["note"], Value::Varchar("checked".into()));
        assert_eq!(row["amount"], Value::Decimal(Decimal::new(12345, 2)));
    }
}
