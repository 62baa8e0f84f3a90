//! Row persistence against a live in-memory database.

use chrono::NaiveDate;
use rusqlite::Connection;
use tabula_orm::{Database, Execute, Field, OrmError, Schema, ToValue, Value};

fn artist() -> Schema {
    Schema::builder("Artist")
        .field("first_name", Field::text().default("NA"))
        .field("last_name", Field::text().default("NA"))
        .field(
            "birthday",
            Field::date()
                .default(NaiveDate::from_ymd_opt(1000, 1, 1).unwrap())
                .not_null(),
        )
        .build()
}

fn database(schemas: &[Schema]) -> Database {
    let db = Database::new(Connection::open_in_memory().unwrap())
        .with_schemas(schemas.iter().cloned());
    for schema in schemas {
        db.execute(&schema.create_ddl(), &[]).unwrap();
    }
    db
}

#[test]
fn save_then_fetch_round_trips_field_for_field() {
    let schema = artist();
    let db = database(&[schema.clone()]);

    let mut saved = schema.row_from(["Mike", "Goldblum"]);
    saved.save(&db).unwrap();

    let fetched = schema
        .query()
        .filter(schema.col("id").eq(saved.id().unwrap()))
        .get(&db)
        .unwrap();
    assert_eq!(fetched, saved);
    assert_eq!(fetched.get("birthday"), &Value::Text(String::from("1000-01-01")));
}

#[test]
fn save_assigns_and_keeps_ids() {
    let schema = artist();
    let db = database(&[schema.clone()]);

    let mut row = schema.row_from(["Mike", "Goldblum"]);
    assert_eq!(row.id(), None);
    row.save(&db).unwrap();
    assert_eq!(row.id(), Some(1));

    // Updating through the same upsert keeps the id and the row count.
    row.set("first_name", "Jeff");
    row.save(&db).unwrap();
    assert_eq!(row.id(), Some(1));
    assert_eq!(schema.query().count(&db).unwrap(), 1);
    assert_eq!(
        schema.query().first(&db).unwrap().get("first_name"),
        &Value::Text(String::from("Jeff"))
    );

    let mut second = schema.row_from(["Do", "Little"]);
    second.save(&db).unwrap();
    assert_eq!(second.id(), Some(2));
}

#[test]
fn delete_detaches_the_row() {
    let schema = artist();
    let db = database(&[schema.clone()]);

    let mut row = schema.row_from(["Do", "Little"]);
    row.save(&db).unwrap();
    assert!(row.delete(&db).unwrap());
    assert_eq!(row.id(), None);
    assert_eq!(schema.query().count(&db).unwrap(), 0);

    // A detached row has nothing left to delete.
    assert!(!row.delete(&db).unwrap());
}

#[test]
fn unset_fields_take_declared_defaults_in_the_database() {
    let schema = artist();
    let db = database(&[schema.clone()]);

    db.execute("INSERT INTO artist(last_name) VALUES ('Ni')", &[])
        .unwrap();
    let row = schema
        .query()
        .filter(schema.col("last_name").eq("Ni"))
        .get(&db)
        .unwrap();
    assert_eq!(row.get("first_name"), &Value::Text(String::from("NA")));
}

#[test]
fn foreign_key_resolves_lazily_and_caches() {
    let schema = artist();
    let album = Schema::builder("Album")
        .field("artist", Field::references("artist").not_null())
        .field("title", Field::text().not_null())
        .build();
    let db = database(&[schema.clone(), album.clone()]);

    let mut doja = schema.row_from(["Doja", "Cat"]);
    doja.save(&db).unwrap();

    let mut hot_pink = album.row();
    hot_pink.set("artist", &doja);
    hot_pink.set("title", "Hot Pink");
    hot_pink.save(&db).unwrap();

    // The stored value is the referenced row's id; resolution fetches
    // the full row on first access.
    let mut fetched = album.query().first(&db).unwrap();
    assert_eq!(fetched.get("artist"), &Value::Int(doja.id().unwrap()));
    let resolved = fetched.related("artist", &db).unwrap();
    assert_eq!(resolved.get("first_name"), &Value::Text(String::from("Doja")));
    assert!(*resolved == doja.id().unwrap());
}

#[test]
fn subquery_filters_through_related_tables() {
    let schema = artist();
    let album = Schema::builder("Album")
        .field("artist", Field::references("artist").not_null())
        .field("title", Field::text().not_null())
        .build();
    let db = database(&[schema.clone(), album.clone()]);

    let mut doja = schema.row_from(["Doja", "Cat"]);
    doja.save(&db).unwrap();
    let bd = NaiveDate::from_ymd_opt(1995, 10, 21).unwrap();
    let mut mushroom = schema.row_from([
        Value::Text(String::from("Infected")),
        Value::Text(String::from("Mushroom")),
        bd.to_value(),
    ]);
    mushroom.save(&db).unwrap();

    for (owner, title) in [
        (&doja, "Hot Pink"),
        (&mushroom, "Head of NASA and the two Amish boys"),
        (&mushroom, "The Legend of the Black Shawarma"),
    ] {
        let mut row = album.row();
        row.set("artist", owner);
        row.set("title", title);
        row.save(&db).unwrap();
    }

    // Albums by artists whose birthday differs from bd.
    let others = schema
        .query()
        .project(["id"])
        .filter(schema.col("birthday").ne(bd));
    let rows = album
        .query()
        .filter(album.col("artist").in_query(others))
        .all(&db)
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("title"), &Value::Text(String::from("Hot Pink")));

    // And directly by owning row.
    let by_mushroom = album
        .query()
        .filter(album.col("artist").eq(&mushroom))
        .count(&db)
        .unwrap();
    assert_eq!(by_mushroom, 2);
}

#[test]
fn get_or_create_is_idempotent() {
    let schema = artist();
    let db = database(&[schema.clone()]);

    let pairs = [
        ("first_name", Value::Text(String::from("Doja"))),
        ("last_name", Value::Text(String::from("Cat"))),
    ];
    let created = schema.get_or_create(&db, &pairs).unwrap();
    let found = schema.get_or_create(&db, &pairs).unwrap();
    assert_eq!(created.id(), found.id());
    assert_eq!(schema.query().count(&db).unwrap(), 1);
}

#[test]
fn missing_reference_surfaces_does_not_exist() {
    let album = Schema::builder("Album")
        .field("artist", Field::references("artist").not_null())
        .field("title", Field::text().not_null())
        .build();
    let artist = artist();
    let db = database(&[artist, album.clone()]);

    db.execute(
        "INSERT INTO album(artist, title) VALUES (99, 'Orphan')",
        &[],
    )
    .unwrap();
    let mut row = album.query().first(&db).unwrap();
    assert!(matches!(
        row.related("artist", &db),
        Err(OrmError::DoesNotExist)
    ));
}
