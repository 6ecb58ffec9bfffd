//! Transaction and batch replay semantics

use crate::common::client;
use loamdb::prelude::*;
use loamdb::MAX_BATCH_OPS;
use serde_json::json;

#[tokio::test]
async fn transaction_returns_the_closure_value() {
    let client = client();
    let users = client.collection("users").unwrap();
    let value = client
        .transaction(|ctx| {
            let users = users.clone();
            async move {
                let id = ctx.create_in(&users, json!({"n": 1}), None)?;
                Ok(id)
            }
        })
        .await
        .unwrap();
    assert!(users.find(value).await.unwrap().is_some());
}

#[tokio::test]
async fn throwing_after_queuing_two_updates_commits_neither() {
    let client = client();
    let t = client.collection("t").unwrap();
    t.create(json!({"x": 0}), Some(DocId::from("a"))).await.unwrap();
    t.create(json!({"x": 0}), Some(DocId::from("b"))).await.unwrap();

    let result: Result<()> = client
        .transaction(|ctx| {
            let t = t.clone();
            async move {
                ctx.update_by_id(&t, "a", json!({"x": 1}))?;
                ctx.update_by_id(&t, "b", json!({"x": 1}))?;
                Err(Error::backend("boom"))
            }
        })
        .await;
    assert!(result.is_err());

    assert_eq!(t.find("a").await.unwrap().unwrap()["x"], json!(0));
    assert_eq!(t.find("b").await.unwrap().unwrap()["x"], json!(0));
}

#[tokio::test]
async fn replay_executes_in_enqueue_order() {
    let client = client();
    let t = client.collection("t").unwrap();
    client
        .transaction(|ctx| {
            let t = t.clone();
            async move {
                ctx.create_in(&t, json!({"n": 1}), Some(DocId::from("a")))?;
                ctx.update_by_id(&t, "a", json!({"n": 2}))?;
                ctx.delete_by_id(&t, "a")?;
                ctx.create_in(&t, json!({"n": 3}), Some(DocId::from("a")))?;
                Ok(())
            }
        })
        .await
        .unwrap();
    // Last op wins because replay order equals queue order
    assert_eq!(t.find("a").await.unwrap().unwrap()["n"], json!(3));
}

#[tokio::test]
async fn reads_inside_the_closure_happen_before_the_atomic_region() {
    let client = client();
    let t = client.collection("t").unwrap();
    t.create(json!({"n": 1}), Some(DocId::from("a"))).await.unwrap();

    client
        .transaction(|ctx| {
            let t = t.clone();
            async move {
                // Load, decide, queue: the documented pattern
                let loaded = t.find_or_fail("a").await?;
                let next = loaded["n"].as_i64().unwrap_or(0) + 1;
                ctx.update_by_id(&t, "a", json!({"n": next}))?;
                Ok(())
            }
        })
        .await
        .unwrap();
    assert_eq!(t.find("a").await.unwrap().unwrap()["n"], json!(2));
}

#[tokio::test]
async fn batch_applies_everything_on_success() {
    let client = client();
    let t = client.collection("t").unwrap();
    client
        .batch(|ctx| {
            let t = t.clone();
            async move {
                for i in 0..5 {
                    ctx.create_in(&t, json!({"n": i}), Some(DocId::from(format!("d{i}"))))?;
                }
                Ok(())
            }
        })
        .await
        .unwrap();
    assert_eq!(t.query().count().await.unwrap(), 5);
}

#[tokio::test]
async fn batch_failure_keeps_earlier_writes() {
    let client = client();
    let t = client.collection("t").unwrap();
    let err = client
        .batch(|ctx| {
            let t = t.clone();
            async move {
                ctx.create_in(&t, json!({"n": 1}), Some(DocId::from("a")))?;
                ctx.update_by_id(&t, "ghost", json!({"n": 2}))?;
                ctx.create_in(&t, json!({"n": 3}), Some(DocId::from("c")))?;
                Ok(())
            }
        })
        .await
        .unwrap_err();
    assert!(err.is_precondition_failed());

    // Not atomic: the first write survives, the third was never attempted
    assert!(t.find("a").await.unwrap().is_some());
    assert!(t.find("c").await.unwrap().is_none());
}

#[tokio::test]
async fn in_transaction_create_transitions_the_record() {
    let client = client();
    let users = client.collection("users").unwrap();
    let mut record = users.record(json!({"name": "A"}));
    assert!(!record.exists());

    client
        .transaction(|ctx| {
            let record = &mut record;
            async move {
                ctx.create(record)?;
                assert!(record.exists());
                Ok(())
            }
        })
        .await
        .unwrap();

    let id = record.id().unwrap().clone();
    assert!(users.find(id).await.unwrap().is_some());
}

#[tokio::test]
async fn update_by_instance_uses_current_fields() {
    let client = client();
    let users = client.collection("users").unwrap();
    let mut record = users.create(json!({"n": 1}), Some(DocId::from("a"))).await.unwrap();
    record.set("n", 5);

    client
        .transaction(|ctx| {
            let record = record.clone();
            async move {
                ctx.update(&record)?;
                Ok(())
            }
        })
        .await
        .unwrap();
    assert_eq!(users.find("a").await.unwrap().unwrap()["n"], json!(5));
}

#[tokio::test]
async fn delete_subcollection_snapshot_excludes_late_children() {
    let client = client();
    let users = client.collection("users").unwrap();
    let parent = users.create(json!({}), Some(DocId::from("u1"))).await.unwrap();
    let orders = parent.subcollection("orders").unwrap();
    orders.create(json!({}), Some(DocId::from("o1"))).await.unwrap();
    orders.create(json!({}), Some(DocId::from("o2"))).await.unwrap();

    client
        .transaction(|ctx| {
            let parent = parent.clone();
            let orders = orders.clone();
            async move {
                let queued = ctx.delete_subcollection(&parent, "orders").await?;
                assert_eq!(queued, 2);
                // Added after the queue-time snapshot: stale-read risk,
                // faithfully preserved
                orders.create(json!({}), Some(DocId::from("o3"))).await?;
                Ok(())
            }
        })
        .await
        .unwrap();

    assert!(orders.find("o1").await.unwrap().is_none());
    assert!(orders.find("o2").await.unwrap().is_none());
    assert!(orders.find("o3").await.unwrap().is_some());
}

#[tokio::test]
async fn delete_cascade_removes_children_then_parent() {
    let client = client();
    let users = client.collection("users").unwrap();
    let parent = users.create(json!({}), Some(DocId::from("u1"))).await.unwrap();
    let orders = parent.subcollection("orders").unwrap();
    let notes = parent.subcollection("notes").unwrap();
    orders.create(json!({}), Some(DocId::from("o1"))).await.unwrap();
    notes.create(json!({}), Some(DocId::from("n1"))).await.unwrap();

    client
        .transaction(|ctx| {
            let parent = parent.clone();
            async move { ctx.delete_cascade(&parent, &["orders", "notes"]).await }
        })
        .await
        .unwrap();

    assert!(users.find("u1").await.unwrap().is_none());
    assert!(orders.all().await.unwrap().is_empty());
    assert!(notes.all().await.unwrap().is_empty());
}

#[tokio::test]
async fn oversized_transactions_hit_the_operation_ceiling() {
    let client = client();
    let t = client.collection("t").unwrap();
    let err = client
        .transaction(|ctx| {
            let t = t.clone();
            async move {
                for i in 0..=MAX_BATCH_OPS {
                    ctx.create_in(&t, json!({}), Some(DocId::from(format!("d{i}"))))?;
                }
                Ok(())
            }
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    // Atomicity held: the refused commit applied nothing
    assert_eq!(t.query().count().await.unwrap(), 0);
}

#[tokio::test]
async fn empty_contexts_commit_nothing_and_succeed() {
    let client = client();
    client.transaction(|_ctx| async move { Ok(()) }).await.unwrap();
    client.batch(|_ctx| async move { Ok(()) }).await.unwrap();
}
