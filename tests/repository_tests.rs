mod common;

use blogicum::{
    RepoError,
    models::{CommentForm, LocationForm, PostForm, ProfileForm},
    repository::{PostFilter, Repository},
};
use chrono::Utc;
use common::{Fixture, draft_form, hours_ago, hours_ahead, published_form};
use tokio::test;

#[test]
async fn test_published_posts_applies_visibility_rule() {
    let fx = Fixture::new().await;
    let shown = fx.category("travel", true).await;
    let hidden = fx.category("secret", false).await;

    let plain = fx.post(&fx.alice, published_form("plain")).await;
    let in_shown = fx
        .post(
            &fx.alice,
            PostForm {
                category_id: Some(shown.id),
                ..published_form("in shown")
            },
        )
        .await;
    let in_hidden = fx
        .post(
            &fx.alice,
            PostForm {
                category_id: Some(hidden.id),
                ..published_form("in hidden")
            },
        )
        .await;
    let draft = fx.post(&fx.alice, draft_form("draft")).await;
    let scheduled = fx
        .post(
            &fx.alice,
            PostForm {
                pub_date: hours_ahead(3),
                ..published_form("scheduled")
            },
        )
        .await;

    let ids: Vec<i64> = fx
        .repo
        .published_posts(PostFilter::default(), Utc::now())
        .await
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();

    assert!(ids.contains(&plain.id));
    assert!(ids.contains(&in_shown.id));
    assert!(!ids.contains(&in_hidden.id), "hidden category must hide its posts");
    assert!(!ids.contains(&draft.id));
    assert!(!ids.contains(&scheduled.id));
}

#[test]
async fn test_scheduled_post_appears_once_due() {
    let fx = Fixture::new().await;
    let scheduled = fx
        .post(
            &fx.bob,
            PostForm {
                pub_date: hours_ahead(2),
                ..published_form("later")
            },
        )
        .await;

    let now = fx
        .repo
        .published_posts(PostFilter::default(), Utc::now())
        .await
        .unwrap();
    assert!(now.iter().all(|p| p.id != scheduled.id));

    let later = fx
        .repo
        .published_posts(PostFilter::default(), hours_ahead(3))
        .await
        .unwrap();
    assert!(later.iter().any(|p| p.id == scheduled.id));
}

#[test]
async fn test_listings_are_newest_first() {
    let fx = Fixture::new().await;
    let old = fx
        .post(
            &fx.alice,
            PostForm {
                pub_date: hours_ago(48),
                ..published_form("old")
            },
        )
        .await;
    let new = fx
        .post(
            &fx.alice,
            PostForm {
                pub_date: hours_ago(1),
                ..published_form("new")
            },
        )
        .await;
    let middle = fx
        .post(
            &fx.alice,
            PostForm {
                pub_date: hours_ago(24),
                ..draft_form("middle")
            },
        )
        .await;

    let published: Vec<i64> = fx
        .repo
        .published_posts(PostFilter::default(), Utc::now())
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(published, vec![new.id, old.id]);

    let all: Vec<i64> = fx
        .repo
        .all_posts(PostFilter::by_author(fx.alice.id))
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(all, vec![new.id, middle.id, old.id]);
}

#[test]
async fn test_filters_narrow_by_category_and_author() {
    let fx = Fixture::new().await;
    let travel = fx.category("travel", true).await;

    let alice_travel = fx
        .post(
            &fx.alice,
            PostForm {
                category_id: Some(travel.id),
                ..published_form("a")
            },
        )
        .await;
    let bob_travel = fx
        .post(
            &fx.bob,
            PostForm {
                category_id: Some(travel.id),
                ..published_form("b")
            },
        )
        .await;
    fx.post(&fx.bob, published_form("c")).await;

    let by_category = fx
        .repo
        .published_posts(PostFilter::by_category(travel.id), Utc::now())
        .await
        .unwrap();
    assert_eq!(by_category.len(), 2);

    let by_both = fx
        .repo
        .published_posts(
            PostFilter {
                category_id: Some(travel.id),
                author_id: Some(fx.bob.id),
            },
            Utc::now(),
        )
        .await
        .unwrap();
    assert_eq!(by_both.len(), 1);
    assert_eq!(by_both[0].id, bob_travel.id);
    assert_ne!(by_both[0].id, alice_travel.id);
}

#[test]
async fn test_post_carries_joined_fields() {
    let fx = Fixture::new().await;
    let travel = fx.category("travel", true).await;
    let place = fx
        .repo
        .create_location(LocationForm {
            name: "Lisbon".to_string(),
            is_published: true,
        })
        .await
        .unwrap();

    let post = fx
        .post(
            &fx.alice,
            PostForm {
                category_id: Some(travel.id),
                location_id: Some(place.id),
                ..published_form("trip")
            },
        )
        .await;
    fx.repo
        .create_comment(post.id, fx.bob.id, CommentForm { text: "wow".to_string() })
        .await
        .unwrap();

    let post = fx.refetch(post.id).await.unwrap();
    assert_eq!(post.author_username, "alice");
    assert_eq!(post.category_slug.as_deref(), Some("travel"));
    assert_eq!(post.category_is_published, Some(true));
    assert_eq!(post.location_name.as_deref(), Some("Lisbon"));
    assert_eq!(post.comment_count, 1);
}

#[test]
async fn test_deleting_category_keeps_posts() {
    let fx = Fixture::new().await;
    let hidden = fx.category("hidden", false).await;
    let post = fx
        .post(
            &fx.alice,
            PostForm {
                category_id: Some(hidden.id),
                ..published_form("orphan")
            },
        )
        .await;

    assert!(fx.repo.delete_category(hidden.id).await.unwrap());

    let post = fx.refetch(post.id).await.expect("post survives");
    assert_eq!(post.category_id, None);
    assert_eq!(post.category_is_published, None);

    // No category left to hide it.
    let published = fx
        .repo
        .published_posts(PostFilter::default(), Utc::now())
        .await
        .unwrap();
    assert!(published.iter().any(|p| p.id == post.id));
}

#[test]
async fn test_deleting_location_keeps_posts() {
    let fx = Fixture::new().await;
    let place = fx
        .repo
        .create_location(LocationForm {
            name: "Porto".to_string(),
            is_published: true,
        })
        .await
        .unwrap();
    let post = fx
        .post(
            &fx.alice,
            PostForm {
                location_id: Some(place.id),
                ..published_form("trip")
            },
        )
        .await;

    assert!(fx.repo.delete_location(place.id).await.unwrap());
    let post = fx.refetch(post.id).await.unwrap();
    assert_eq!(post.location_id, None);
}

#[test]
async fn test_deleting_post_cascades_to_comments() {
    let fx = Fixture::new().await;
    let post = fx.post(&fx.alice, published_form("doomed")).await;
    let comment = fx
        .repo
        .create_comment(post.id, fx.bob.id, CommentForm { text: "first".to_string() })
        .await
        .unwrap();

    assert!(fx.repo.delete_post(post.id).await.unwrap());
    assert!(fx.repo.get_comment(comment.id).await.unwrap().is_none());
    assert!(!fx.repo.delete_post(post.id).await.unwrap());
}

#[test]
async fn test_comments_listed_oldest_first() {
    let fx = Fixture::new().await;
    let post = fx.post(&fx.alice, published_form("chatty")).await;

    for text in ["one", "two", "three"] {
        fx.repo
            .create_comment(post.id, fx.bob.id, CommentForm { text: text.to_string() })
            .await
            .unwrap();
    }

    let texts: Vec<String> = fx
        .repo
        .list_comments(post.id)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.text)
        .collect();
    assert_eq!(texts, vec!["one", "two", "three"]);
}

#[test]
async fn test_update_post_keeps_author() {
    let fx = Fixture::new().await;
    let post = fx.post(&fx.alice, published_form("mine")).await;

    let updated = fx
        .repo
        .update_post(post.id, published_form("renamed"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.title, "renamed");
    assert_eq!(updated.author_id, fx.alice.id);
}

#[test]
async fn test_username_conflicts() {
    let fx = Fixture::new().await;

    let result = fx
        .repo
        .update_profile(
            fx.alice.id,
            ProfileForm {
                username: "bob".to_string(),
                ..ProfileForm::default()
            },
        )
        .await;
    assert!(matches!(result, Err(RepoError::Conflict(_))));

    // Keeping one's own username is not a conflict.
    let same = fx
        .repo
        .update_profile(
            fx.alice.id,
            ProfileForm {
                username: "alice".to_string(),
                first_name: "Alice".to_string(),
                ..ProfileForm::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(same.first_name, "Alice");
}

#[test]
async fn test_category_slug_conflicts() {
    let fx = Fixture::new().await;
    fx.category("travel", true).await;

    let duplicate = fx
        .repo
        .create_category(blogicum::models::CategoryForm {
            title: "Again".to_string(),
            description: String::new(),
            slug: "travel".to_string(),
            is_published: true,
        })
        .await;
    assert!(matches!(duplicate, Err(RepoError::Conflict(_))));
}
