//! Backend-agnostic store scenarios
//!
//! Every scenario runs against a `&dyn ThreadStore` so the memory and
//! PostgreSQL backends are held to the same observable behaviour. IDs are
//! always taken from what the store hands back.
#![allow(dead_code)]

use comment_service::{
    Comment, NewComment, NewPost, NewUser, PageRequest, Post, StoreError, ThreadStore, User,
    MAX_REPLY_DEPTH,
};

pub async fn user(store: &dyn ThreadStore, username: &str) -> User {
    store
        .create_user(NewUser {
            username: username.to_string(),
        })
        .await
        .expect("create user")
}

pub async fn post(store: &dyn ThreadStore, user_id: i64, comments_enabled: bool) -> Post {
    store
        .create_post(NewPost {
            title: "TestTitle".to_string(),
            content: "TestContent".to_string(),
            user_id,
            comments_enabled,
        })
        .await
        .expect("create post")
}

pub fn new_comment(post_id: i64, user_id: i64, parent_id: Option<i64>, content: &str) -> NewComment {
    NewComment {
        post_id,
        user_id,
        content: content.to_string(),
        parent_id,
    }
}

pub async fn comment(
    store: &dyn ThreadStore,
    post_id: i64,
    user_id: i64,
    parent_id: Option<i64>,
    content: &str,
) -> Comment {
    store
        .create_comment(new_comment(post_id, user_id, parent_id, content))
        .await
        .expect("create comment")
}

fn ids(comments: &[Comment]) -> Vec<i64> {
    comments.iter().map(|c| c.id).collect()
}

pub async fn create_comment_rejects_unknown_user(store: &dyn ThreadStore) {
    let author = user(store, "qwerty").await;
    let target = post(store, author.id, true).await;
    let missing = author.id + 1000;

    let err = store
        .create_comment(new_comment(target.id, missing, None, "Test Content"))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::UserNotFound(id) if id == missing));
    assert_eq!(err.to_string(), format!("author with id = {} not found", missing));
}

pub async fn create_comment_rejects_unknown_post(store: &dyn ThreadStore) {
    let author = user(store, "qwerty").await;
    let target = post(store, author.id, true).await;
    let missing = target.id + 1000;

    let err = store
        .create_comment(new_comment(missing, author.id, None, "Test Content"))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::PostNotFound(id) if id == missing));
}

pub async fn create_comment_rejects_disabled_post(store: &dyn ThreadStore) {
    let author = user(store, "qwerty").await;
    let closed = post(store, author.id, false).await;

    let err = store
        .create_comment(new_comment(closed.id, author.id, None, "Test Content"))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::CommentsDisabled(id) if id == closed.id));

    let reloaded = store
        .get_post(closed.id, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(reloaded.comments.total_count, 0);
}

pub async fn create_reply_rejects_unknown_parent(store: &dyn ThreadStore) {
    let author = user(store, "qwerty").await;
    let target = post(store, author.id, true).await;
    let root = comment(store, target.id, author.id, None, "root").await;
    let missing = root.id + 1000;

    let err = store
        .create_comment(new_comment(target.id, author.id, Some(missing), "reply"))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::ParentNotFound(id) if id == missing));
    assert_eq!(
        err.to_string(),
        format!("comment with id = {} for reply not found", missing)
    );
}

pub async fn create_reply_rejects_post_mismatch(store: &dyn ThreadStore) {
    let author = user(store, "qwerty").await;
    let first = post(store, author.id, true).await;
    let second = post(store, author.id, true).await;
    let root = comment(store, first.id, author.id, None, "root").await;

    let err = store
        .create_comment(new_comment(second.id, author.id, Some(root.id), "reply"))
        .await
        .unwrap_err();

    match err {
        StoreError::PostMismatch {
            reply_post_id,
            parent_post_id,
        } => {
            assert_eq!(reply_post_id, second.id);
            assert_eq!(parent_post_id, first.id);
        }
        other => panic!("expected post mismatch, got {other:?}"),
    }

    let second_view = store
        .get_post(second.id, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(second_view.comments.total_count, 0);
}

/// Several rules are broken at once; the first check in order wins.
pub async fn validation_order_is_fixed(store: &dyn ThreadStore) {
    let author = user(store, "qwerty").await;
    let closed = post(store, author.id, false).await;
    let missing_user = author.id + 1000;
    let missing_parent = 1_000_000;

    // Unknown user beats unknown post
    let err = store
        .create_comment(new_comment(closed.id + 1000, missing_user, None, "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::UserNotFound(_)));

    // Disabled comments beat unknown parent
    let err = store
        .create_comment(new_comment(closed.id, author.id, Some(missing_parent), "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::CommentsDisabled(_)));
}

pub async fn create_post_rejects_unknown_user(store: &dyn ThreadStore) {
    let author = user(store, "qwerty").await;
    let missing = author.id + 1000;

    let err = store
        .create_post(NewPost {
            title: "TestTitle".to_string(),
            content: "TestContent".to_string(),
            user_id: missing,
            comments_enabled: true,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::UserNotFound(id) if id == missing));
}

pub async fn reads_of_unknown_ids_fail(store: &dyn ThreadStore) {
    let author = user(store, "qwerty").await;
    let target = post(store, author.id, true).await;
    let root = comment(store, target.id, author.id, None, "root").await;

    let err = store
        .get_post(target.id + 1000, PageRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::PostNotFound(_)));

    let err = store
        .get_comment(root.id + 1000, PageRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::CommentNotFound(_)));
    assert_eq!(
        err.to_string(),
        format!("comment with id = {} not found", root.id + 1000)
    );

    let err = store.get_user(author.id + 1000).await.unwrap_err();
    assert!(matches!(err, StoreError::UserNotFound(_)));
}

pub async fn created_records_echo_input(store: &dyn ThreadStore) {
    let author = user(store, "qwerty").await;
    let target = post(store, author.id, true).await;
    let root = comment(store, target.id, author.id, None, "Test Content").await;
    let reply = comment(store, target.id, author.id, Some(root.id), "Reply").await;

    assert_eq!(author.username, "qwerty");
    assert_eq!(store.get_user(author.id).await.unwrap(), author);
    assert_eq!(target.title, "TestTitle");
    assert_eq!(target.content, "TestContent");
    assert_eq!(target.user_id, author.id);
    assert!(target.comments_enabled);
    assert!(target.comments.is_empty());
    assert_eq!(root.parent_id, None);
    assert_eq!(root.post_id, target.id);
    assert_eq!(reply.parent_id, Some(root.id));
    assert_eq!(reply.content, "Reply");
    assert!(reply.replies.is_empty());
}

pub async fn get_post_is_idempotent(store: &dyn ThreadStore) {
    let author = user(store, "qwerty").await;
    let target = post(store, author.id, true).await;
    let root = comment(store, target.id, author.id, None, "root").await;
    comment(store, target.id, author.id, Some(root.id), "reply").await;

    let page = PageRequest::new(5, 0);
    let first = store.get_post(target.id, page).await.unwrap();
    let second = store.get_post(target.id, page).await.unwrap();

    assert_eq!(first, second);
}

/// A single reply chain deeper than the cap; the level past it is an empty page.
pub async fn reply_depth_is_bounded(store: &dyn ThreadStore) {
    let author = user(store, "qwerty").await;
    let target = post(store, author.id, true).await;

    let mut chain = Vec::new();
    let mut parent = None;
    for level in 0..6 {
        let created = comment(store, target.id, author.id, parent, &format!("level {level}")).await;
        parent = Some(created.id);
        chain.push(created.id);
    }

    let page = PageRequest::new(10, 0);

    // From a comment: its replies are depth 1, so MAX_REPLY_DEPTH levels follow
    let anchor = store.get_comment(chain[0], page).await.unwrap();
    let mut node = &anchor;
    for expected in chain.iter().skip(1).take(MAX_REPLY_DEPTH as usize) {
        assert_eq!(node.replies.total_count, 1);
        node = &node.replies.items[0];
        assert_eq!(node.id, *expected);
    }
    assert!(node.replies.items.is_empty());
    assert_eq!(node.replies.total_count, 0);

    // From the post: roots are depth 0, the rest of the walk is identical
    let view = store.get_post(target.id, page).await.unwrap();
    assert_eq!(view.comments.total_count, 1);
    let mut node = &view.comments.items[0];
    assert_eq!(node.id, chain[0]);
    for expected in chain.iter().skip(1).take(MAX_REPLY_DEPTH as usize) {
        node = &node.replies.items[0];
        assert_eq!(node.id, *expected);
    }
    assert!(node.replies.items.is_empty());
    assert_eq!(node.replies.total_count, 0);
}

pub async fn root_comments_page_in_creation_order(store: &dyn ThreadStore) {
    let author = user(store, "qwerty").await;
    let target = post(store, author.id, true).await;

    let mut roots = Vec::new();
    for rank in 1..=10 {
        roots.push(comment(store, target.id, author.id, None, &format!("root {rank}")).await);
    }

    let view = store
        .get_post(target.id, PageRequest::new(3, 3))
        .await
        .unwrap();

    assert_eq!(view.comments.total_count, 10);
    assert_eq!(ids(&view.comments.items), ids(&roots[3..6]));
    assert_eq!(view.comments.items[0].content, "root 4");
}

pub async fn offset_past_end_keeps_total(store: &dyn ThreadStore) {
    let author = user(store, "qwerty").await;
    let target = post(store, author.id, true).await;
    for rank in 0..3 {
        comment(store, target.id, author.id, None, &format!("root {rank}")).await;
    }

    let view = store
        .get_post(target.id, PageRequest::new(10, 50))
        .await
        .unwrap();

    assert!(view.comments.items.is_empty());
    assert_eq!(view.comments.total_count, 3);
}

/// The same window is applied to every level of the tree.
pub async fn window_applies_at_every_level(store: &dyn ThreadStore) {
    let author = user(store, "qwerty").await;
    let target = post(store, author.id, true).await;
    let root = comment(store, target.id, author.id, None, "root").await;

    let mut replies = Vec::new();
    for rank in 0..5 {
        replies.push(comment(store, target.id, author.id, Some(root.id), &format!("reply {rank}")).await);
    }

    let view = store
        .get_post(target.id, PageRequest::new(2, 0))
        .await
        .unwrap();
    let root_view = &view.comments.items[0];
    assert_eq!(root_view.replies.total_count, 5);
    assert_eq!(ids(&root_view.replies.items), ids(&replies[..2]));

    let anchored = store
        .get_comment(root.id, PageRequest::new(2, 2))
        .await
        .unwrap();
    assert_eq!(anchored.replies.total_count, 5);
    assert_eq!(ids(&anchored.replies.items), ids(&replies[2..4]));
}

pub async fn replies_stay_off_the_root_list(store: &dyn ThreadStore) {
    let author = user(store, "qwerty").await;
    let target = post(store, author.id, true).await;
    let root = comment(store, target.id, author.id, None, "root").await;
    let reply = comment(store, target.id, author.id, Some(root.id), "reply").await;
    let nested = comment(store, target.id, author.id, Some(reply.id), "nested").await;

    let view = store
        .get_post(target.id, PageRequest::default())
        .await
        .unwrap();

    assert_eq!(view.comments.total_count, 1);
    let root_view = &view.comments.items[0];
    assert_eq!(root_view.id, root.id);
    assert_eq!(ids(&root_view.replies.items), vec![reply.id]);
    assert_eq!(ids(&root_view.replies.items[0].replies.items), vec![nested.id]);
}

pub async fn comments_do_not_leak_across_posts(store: &dyn ThreadStore) {
    let author = user(store, "qwerty").await;
    let first = post(store, author.id, true).await;
    let second = post(store, author.id, true).await;
    let on_first = comment(store, first.id, author.id, None, "first").await;
    let on_second = comment(store, second.id, author.id, None, "second").await;

    let first_view = store
        .get_post(first.id, PageRequest::default())
        .await
        .unwrap();
    let second_view = store
        .get_post(second.id, PageRequest::default())
        .await
        .unwrap();

    assert_eq!(ids(&first_view.comments.items), vec![on_first.id]);
    assert_eq!(ids(&second_view.comments.items), vec![on_second.id]);
}

pub async fn list_posts_pages_by_id(store: &dyn ThreadStore) {
    let author = user(store, "qwerty").await;
    let before = store.list_posts(PageRequest::new(1, 0)).await.unwrap();

    let mut created = Vec::new();
    for _ in 0..4 {
        created.push(post(store, author.id, true).await);
    }
    let root = comment(store, created[0].id, author.id, None, "root").await;

    let total = before.total_count + 4;
    let listed = store
        .list_posts(PageRequest::new(2, before.total_count as u32 + 1))
        .await
        .unwrap();

    assert_eq!(listed.total_count, total);
    let listed_ids: Vec<i64> = listed.items.iter().map(|p| p.id).collect();
    assert_eq!(listed_ids, vec![created[1].id, created[2].id]);
    assert!(listed.items.iter().all(|p| p.comments.is_empty()));

    // Listing never expands comments, even on a post that has some
    let first_page = store
        .list_posts(PageRequest::new(1, before.total_count as u32))
        .await
        .unwrap();
    assert_eq!(first_page.items[0].id, created[0].id);
    assert!(first_page.items[0].comments.is_empty());
    assert_eq!(root.post_id, created[0].id);
}

pub async fn authors_are_embedded_in_views(store: &dyn ThreadStore) {
    let alice = user(store, "alice").await;
    let bob = user(store, "bob").await;
    let target = post(store, alice.id, true).await;
    let root = comment(store, target.id, bob.id, None, "root").await;
    let reply = comment(store, target.id, alice.id, Some(root.id), "reply").await;

    assert_eq!(target.author, alice);
    assert_eq!(root.author, bob);
    assert_eq!(reply.author, alice);

    let view = store
        .get_post(target.id, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(view.author, alice);
    let root_view = &view.comments.items[0];
    assert_eq!(root_view.author, bob);
    assert_eq!(root_view.replies.items[0].author, alice);

    let anchored = store
        .get_comment(root.id, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(anchored.author, bob);
    assert_eq!(anchored.replies.items[0].author, alice);

    let listed = store
        .list_posts(PageRequest::new(100, 0))
        .await
        .unwrap();
    let listed_post = listed
        .items
        .iter()
        .find(|p| p.id == target.id)
        .expect("created post is listed");
    assert_eq!(listed_post.author, alice);
}

/// Builds the small thread used throughout the docs and walks it from both ends.
pub async fn sample_thread_walkthrough(store: &dyn ThreadStore) {
    let author = user(store, "qwerty").await;
    let target = post(store, author.id, true).await;
    let root = comment(store, target.id, author.id, None, "Test Content").await;
    let reply = comment(store, target.id, author.id, Some(root.id), "Test Reply").await;
    let second_root = comment(store, target.id, author.id, None, "Another").await;

    let view = store
        .get_post(target.id, PageRequest::new(10, 0))
        .await
        .unwrap();
    assert_eq!(view.comments.total_count, 2);
    assert_eq!(ids(&view.comments.items), vec![root.id, second_root.id]);
    assert_eq!(view.comments.items[0].replies.total_count, 1);
    assert_eq!(view.comments.items[0].replies.items[0].id, reply.id);
    assert_eq!(view.comments.items[1].replies.total_count, 0);

    let anchored = store
        .get_comment(reply.id, PageRequest::new(10, 0))
        .await
        .unwrap();
    assert_eq!(anchored.parent_id, Some(root.id));
    assert!(anchored.replies.is_empty());
    assert_eq!(anchored.replies.total_count, 0);
}

/// Everything the two backends must agree on.
pub async fn run_all(store: &dyn ThreadStore) {
    create_comment_rejects_unknown_user(store).await;
    create_comment_rejects_unknown_post(store).await;
    create_comment_rejects_disabled_post(store).await;
    create_reply_rejects_unknown_parent(store).await;
    create_reply_rejects_post_mismatch(store).await;
    validation_order_is_fixed(store).await;
    create_post_rejects_unknown_user(store).await;
    reads_of_unknown_ids_fail(store).await;
    created_records_echo_input(store).await;
    get_post_is_idempotent(store).await;
    reply_depth_is_bounded(store).await;
    root_comments_page_in_creation_order(store).await;
    offset_past_end_keeps_total(store).await;
    window_applies_at_every_level(store).await;
    replies_stay_off_the_root_list(store).await;
    comments_do_not_leak_across_posts(store).await;
    list_posts_pages_by_id(store).await;
    authors_are_embedded_in_views(store).await;
    sample_thread_walkthrough(store).await;
}
