//! Constraint builder behavior: operators, ordering, limits, clone
//! independence, counts, and direct builder writes

use crate::common::client;
use loamdb::prelude::*;
use serde_json::json;

async fn seeded() -> (Client, CollectionRef) {
    let client = client();
    let coll = client.collection("people").unwrap();
    let rows = [
        ("a", json!({"name": "Ann",  "age": 30, "tags": ["admin", "ops"], "city": "Oslo"})),
        ("b", json!({"name": "Bo",   "age": 20, "tags": ["user"],         "city": "Riga"})),
        ("c", json!({"name": "Cleo", "age": 40, "tags": ["admin"],        "city": "Oslo"})),
        ("d", json!({"name": "Dee",  "age": 25, "tags": [],               "city": "Bern"})),
    ];
    for (id, data) in rows {
        coll.create(data, Some(DocId::from(id))).await.unwrap();
    }
    (client, coll)
}

#[tokio::test]
async fn all_ten_operators_filter_correctly() {
    let (_c, coll) = seeded().await;

    let ids = |rows: Vec<serde_json::Value>| -> Vec<String> {
        rows.into_iter()
            .map(|r| r["id"].as_str().unwrap().to_string())
            .collect()
    };

    let eq = coll.where_field("city", FilterOp::Eq, json!("Oslo")).get().await.unwrap();
    assert_eq!(ids(eq), ["a", "c"]);

    let neq = coll.where_field("city", FilterOp::Neq, json!("Oslo")).get().await.unwrap();
    assert_eq!(ids(neq), ["b", "d"]);

    let gt = coll.where_field("age", FilterOp::Gt, json!(25)).get().await.unwrap();
    assert_eq!(ids(gt), ["a", "c"]);

    let lt = coll.where_field("age", FilterOp::Lt, json!(25)).get().await.unwrap();
    assert_eq!(ids(lt), ["b"]);

    let gte = coll.where_field("age", FilterOp::Gte, json!(25)).get().await.unwrap();
    assert_eq!(ids(gte), ["a", "c", "d"]);

    let lte = coll.where_field("age", FilterOp::Lte, json!(25)).get().await.unwrap();
    assert_eq!(ids(lte), ["b", "d"]);

    let in_ = coll.where_in("city", [json!("Riga"), json!("Bern")]).get().await.unwrap();
    assert_eq!(ids(in_), ["b", "d"]);

    let not_in = coll.where_not_in("city", [json!("Riga"), json!("Bern")]).get().await.unwrap();
    assert_eq!(ids(not_in), ["a", "c"]);

    let contains = coll
        .where_field("tags", FilterOp::ArrayContains, json!("admin"))
        .get()
        .await
        .unwrap();
    assert_eq!(ids(contains), ["a", "c"]);

    let contains_any = coll
        .where_field("tags", FilterOp::ArrayContainsAny, json!(["user", "ops"]))
        .get()
        .await
        .unwrap();
    assert_eq!(ids(contains_any), ["a", "b"]);
}

#[tokio::test]
async fn operator_spellings_parse() {
    for s in [
        "==", "!=", ">", "<", ">=", "<=", "in", "not-in", "array-contains", "array-contains-any",
    ] {
        let op: FilterOp = s.parse().unwrap();
        assert_eq!(op.as_str(), s);
    }
    assert!("like".parse::<FilterOp>().is_err());
}

#[tokio::test]
async fn filters_are_conjunctive() {
    let (_c, coll) = seeded().await;
    let rows = coll
        .where_field("city", FilterOp::Eq, json!("Oslo"))
        .where_field("age", FilterOp::Gte, json!(35))
        .get()
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], json!("Cleo"));
}

#[tokio::test]
async fn order_and_limit_shape_the_result() {
    let (_c, coll) = seeded().await;
    let rows = coll
        .order_by("age", Direction::Desc)
        .limit(2)
        .get()
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], json!("Cleo"));
    assert_eq!(rows[1]["name"], json!("Ann"));
}

#[tokio::test]
async fn builder_clones_never_share_constraints() {
    let (_c, coll) = seeded().await;
    let base = coll.where_field("city", FilterOp::Eq, json!("Oslo"));
    let narrowed = base.clone().where_field("age", FilterOp::Gt, json!(35));

    assert_eq!(base.count().await.unwrap(), 2);
    assert_eq!(narrowed.count().await.unwrap(), 1);
    assert_eq!(base.count().await.unwrap(), 2);
}

#[tokio::test]
async fn builder_find_ignores_filters() {
    let (_c, coll) = seeded().await;
    let q = coll.where_field("city", FilterOp::Eq, json!("Nowhere"));
    assert_eq!(q.get().await.unwrap().len(), 0);
    assert!(q.find("a").await.unwrap().is_some());
}

#[tokio::test]
async fn first_and_first_or_fail() {
    let (_c, coll) = seeded().await;
    let first = coll
        .order_by("age", Direction::Asc)
        .first()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first["name"], json!("Bo"));

    let err = coll
        .where_field("age", FilterOp::Gt, json!(100))
        .first_or_fail()
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn count_and_exists_are_native_and_consistent() {
    let (_c, coll) = seeded().await;
    let q = coll.where_field("city", FilterOp::Eq, json!("Oslo"));
    assert_eq!(q.count().await.unwrap(), 2);
    assert!(q.exists().await.unwrap());

    // Count matches paginate's total for the same filtered set
    let page = q.paginate(PageRequest { per_page: 1, page: 1 }).await.unwrap();
    assert_eq!(page.meta.total, 2);

    let empty = coll.where_field("city", FilterOp::Eq, json!("Nowhere"));
    assert_eq!(empty.count().await.unwrap(), 0);
    assert!(!empty.exists().await.unwrap());
}

#[tokio::test]
async fn delete_all_chunks_and_counts() {
    let client = client();
    let coll = client.collection("bulk").unwrap();
    // 1200 documents: three rounds of at most 500 deletes each
    for i in 0..1200 {
        coll.create(json!({"n": i}), Some(DocId::from(format!("d{i:04}"))))
            .await
            .unwrap();
    }
    let deleted = coll.query().delete_all().await.unwrap();
    assert_eq!(deleted, 1200);
    assert_eq!(coll.query().count().await.unwrap(), 0);
}

#[tokio::test]
async fn delete_all_on_zero_matches_returns_zero() {
    let (_c, coll) = seeded().await;
    let deleted = coll
        .where_field("city", FilterOp::Eq, json!("Nowhere"))
        .delete_all()
        .await
        .unwrap();
    assert_eq!(deleted, 0);
    assert_eq!(coll.query().count().await.unwrap(), 4);
}

#[tokio::test]
async fn delete_all_respects_filters() {
    let (_c, coll) = seeded().await;
    let deleted = coll
        .where_field("city", FilterOp::Eq, json!("Oslo"))
        .delete_all()
        .await
        .unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(coll.query().count().await.unwrap(), 2);
}

#[tokio::test]
async fn typed_reads_deserialize_rows() {
    #[derive(serde::Deserialize)]
    struct Person {
        id: String,
        name: String,
        age: i64,
    }

    let (_c, coll) = seeded().await;
    let people: Vec<Person> = coll
        .order_by("age", Direction::Asc)
        .get_as()
        .await
        .unwrap();
    assert_eq!(people.len(), 4);
    assert_eq!(people[0].id, "b");
    assert_eq!(people[0].name, "Bo");
    assert_eq!(people[0].age, 20);
}

#[tokio::test]
async fn records_from_queries_are_updatable() {
    let (_c, coll) = seeded().await;
    let mut records = coll
        .where_field("city", FilterOp::Eq, json!("Oslo"))
        .get_records()
        .await
        .unwrap();
    for record in &mut records {
        record.update(json!({"city": "Moved"})).await.unwrap();
    }
    assert_eq!(
        coll.where_field("city", FilterOp::Eq, json!("Moved"))
            .count()
            .await
            .unwrap(),
        2
    );
}
