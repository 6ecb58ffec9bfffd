//! The three pagination shapes against seeded collections

use crate::common::{client, numbers, seed_numbered};
use loamdb::prelude::*;
use serde_json::json;

async fn numbered(count: usize) -> QueryBuilder {
    let coll = client().collection("items").unwrap();
    seed_numbered(&coll, count).await;
    coll.order_by("n", Direction::Asc)
}

#[tokio::test]
async fn paginate_serves_the_partial_last_page() {
    let q = numbered(25).await;
    let page = q
        .paginate(PageRequest {
            per_page: 10,
            page: 3,
        })
        .await
        .unwrap();
    assert_eq!(page.data.len(), 5);
    assert_eq!(page.meta.current_page, 3);
    assert!(!page.meta.has_more_pages);
    assert_eq!(numbers(&page.data), (20..25).collect::<Vec<_>>());
}

#[tokio::test]
async fn paginate_meta_is_consistent_for_every_page() {
    let q = numbered(25).await;
    for k in 1..=3usize {
        let page = q
            .paginate(PageRequest {
                per_page: 10,
                page: k,
            })
            .await
            .unwrap();
        assert_eq!(page.meta.total, 25);
        assert_eq!(page.meta.last_page, 3);
        assert_eq!(page.meta.per_page, 10);
        assert_eq!(page.meta.has_more_pages, k < 3);
    }
}

#[tokio::test]
async fn paginate_defaults_are_ten_per_page_page_one() {
    let q = numbered(15).await;
    let page = q.paginate(PageRequest::default()).await.unwrap();
    assert_eq!(page.data.len(), 10);
    assert_eq!(page.meta.current_page, 1);
    assert_eq!(numbers(&page.data), (0..10).collect::<Vec<_>>());
}

#[tokio::test]
async fn paginate_exposes_boundary_documents() {
    let q = numbered(12).await;
    let page = q
        .paginate(PageRequest {
            per_page: 5,
            page: 2,
        })
        .await
        .unwrap();
    assert_eq!(page.first_doc.as_ref().unwrap().id, "d005");
    assert_eq!(page.last_doc.as_ref().unwrap().id, "d009");
    assert_eq!(page.meta.from, Some(6));
    assert_eq!(page.meta.to, Some(10));
}

#[tokio::test]
async fn paginate_respects_filters() {
    let coll = client().collection("items").unwrap();
    for i in 0..20 {
        let parity = if i % 2 == 0 { "even" } else { "odd" };
        coll.create(
            json!({"n": i, "parity": parity}),
            Some(DocId::from(format!("d{i:03}"))),
        )
        .await
        .unwrap();
    }
    let page = coll
        .where_field("parity", FilterOp::Eq, json!("even"))
        .order_by("n", Direction::Asc)
        .paginate(PageRequest {
            per_page: 4,
            page: 2,
        })
        .await
        .unwrap();
    assert_eq!(page.meta.total, 10);
    assert_eq!(page.meta.last_page, 3);
    assert_eq!(numbers(&page.data), vec![8, 10, 12, 14]);
}

#[tokio::test]
async fn simple_paginate_chain_covers_the_set_exactly_once() {
    let q = numbered(23).await;
    let mut seen = Vec::new();
    let mut cursor: Option<DocId> = None;
    let mut rounds = 0;
    loop {
        let page = q
            .simple_paginate(SimplePageRequest {
                per_page: 10,
                cursor: cursor.clone(),
            })
            .await
            .unwrap();
        seen.extend(numbers(&page.data));
        rounds += 1;
        if !page.has_more_pages {
            break;
        }
        cursor = page.next_cursor.clone().map(DocId::from);
    }
    // No duplicates, no omissions
    assert_eq!(seen, (0..23).collect::<Vec<_>>());
    assert_eq!(rounds, 3);
}

#[tokio::test]
async fn simple_paginate_exact_multiple_needs_one_extra_probe() {
    let q = numbered(20).await;
    let first = q
        .simple_paginate(SimplePageRequest {
            per_page: 10,
            cursor: None,
        })
        .await
        .unwrap();
    assert!(first.has_more_pages);

    let second = q
        .simple_paginate(SimplePageRequest {
            per_page: 10,
            cursor: first.next_cursor.map(DocId::from),
        })
        .await
        .unwrap();
    assert_eq!(second.data.len(), 10);
    // The set is exhausted; the over-fetch found nothing beyond it
    assert!(!second.has_more_pages);
}

#[tokio::test]
async fn cursor_paginate_forward_walk() {
    let q = numbered(15).await;
    let first = q
        .cursor_paginate(CursorPageRequest {
            per_page: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(first.data.len(), 10);
    assert!(first.has_next_page);
    assert!(!first.has_prev_page);

    let second = q
        .cursor_paginate(CursorPageRequest {
            per_page: 10,
            after: first.end_cursor.map(DocId::from),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(numbers(&second.data), (10..15).collect::<Vec<_>>());
    assert!(!second.has_next_page);
    assert!(second.has_prev_page);
}

#[tokio::test]
async fn cursor_paginate_backward_window() {
    let q = numbered(30).await;
    let back = q
        .cursor_paginate(CursorPageRequest {
            per_page: 10,
            before: Some(DocId::from("d020")),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(numbers(&back.data), (10..20).collect::<Vec<_>>());
    assert!(back.has_prev_page);
    assert!(back.has_next_page);
}

#[tokio::test]
async fn cursor_paginate_descending_order() {
    let q = client().collection("items").unwrap();
    seed_numbered(&q, 15).await;
    let q = q.order_by("n", Direction::Desc);

    let first = q
        .cursor_paginate(CursorPageRequest {
            per_page: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(numbers(&first.data), (5..15).rev().collect::<Vec<_>>());

    let second = q
        .cursor_paginate(CursorPageRequest {
            per_page: 10,
            after: first.end_cursor.map(DocId::from),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(numbers(&second.data), (0..5).rev().collect::<Vec<_>>());
}

#[tokio::test]
async fn pagination_against_concurrent_writes_uses_cursors_not_offsets() {
    let coll = client().collection("items").unwrap();
    seed_numbered(&coll, 10).await;
    let q = coll.order_by("n", Direction::Asc);

    let first = q
        .simple_paginate(SimplePageRequest {
            per_page: 5,
            cursor: None,
        })
        .await
        .unwrap();
    assert_eq!(numbers(&first.data), vec![0, 1, 2, 3, 4]);

    // A row inserted before the cursor does not shift the next window
    coll.create(json!({"n": -1}), Some(DocId::from("early"))).await.unwrap();

    let second = q
        .simple_paginate(SimplePageRequest {
            per_page: 5,
            cursor: first.next_cursor.map(DocId::from),
        })
        .await
        .unwrap();
    assert_eq!(numbers(&second.data), vec![5, 6, 7, 8, 9]);
}
