use blogicum::{
    auth::{AuthUser, Viewer},
    models::{Comment, Post},
    policy::{self, Authorization, ListingScope},
};
use chrono::{Duration, Utc};
use uuid::Uuid;

const AUTHOR_ID: Uuid = Uuid::from_u128(10);
const OTHER_ID: Uuid = Uuid::from_u128(20);
const ADMIN_ID: Uuid = Uuid::from_u128(30);

fn user(id: Uuid, username: &str, is_superuser: bool) -> Viewer {
    Viewer::User(AuthUser {
        id,
        username: username.to_string(),
        is_superuser,
    })
}

fn author() -> Viewer {
    user(AUTHOR_ID, "author", false)
}

fn other() -> Viewer {
    user(OTHER_ID, "other", false)
}

fn admin() -> Viewer {
    user(ADMIN_ID, "admin", true)
}

fn post(is_published: bool, hours_offset: i64, category_is_published: Option<bool>) -> Post {
    Post {
        id: 7,
        title: "Title".to_string(),
        text: "Text".to_string(),
        pub_date: Utc::now() + Duration::hours(hours_offset),
        is_published,
        author_id: AUTHOR_ID,
        author_username: "author".to_string(),
        category_id: category_is_published.map(|_| 1),
        category_is_published,
        ..Post::default()
    }
}

#[test]
fn test_public_visibility_truth_table() {
    let now = Utc::now();
    // (is_published, pub_date offset in hours, category flag, expected)
    let cases = [
        (true, -1, None, true),
        (true, -1, Some(true), true),
        (true, -1, Some(false), false),
        (false, -1, None, false),
        (false, -1, Some(true), false),
        (true, 2, None, false),
        (true, 2, Some(true), false),
        (false, 2, Some(false), false),
    ];

    for (is_published, offset, category, expected) in cases {
        let p = post(is_published, offset, category);
        assert_eq!(
            policy::is_publicly_visible(&p, now),
            expected,
            "is_published={is_published} offset={offset} category={category:?}"
        );
    }
}

#[test]
fn test_pub_date_equal_to_now_is_visible() {
    let mut p = post(true, 0, None);
    let now = Utc::now();
    p.pub_date = now;
    assert!(policy::is_publicly_visible(&p, now));
}

#[test]
fn test_can_modify_author_or_superuser_only() {
    let p = post(true, -1, None);

    assert!(policy::can_modify(&author(), &p));
    assert!(policy::can_modify(&admin(), &p));
    assert!(!policy::can_modify(&other(), &p));
    assert!(!policy::can_modify(&Viewer::Anonymous, &p));
}

#[test]
fn test_can_modify_applies_to_comments() {
    let comment = Comment {
        id: 1,
        post_id: 7,
        author_id: OTHER_ID,
        text: "nice".to_string(),
        ..Comment::default()
    };

    assert!(policy::can_modify(&other(), &comment));
    assert!(policy::can_modify(&admin(), &comment));
    // The post's author has no say over someone else's comment.
    assert!(!policy::can_modify(&author(), &comment));
}

#[test]
fn test_hidden_post_visible_to_author_and_superuser() {
    let now = Utc::now();
    let hidden = [
        post(false, -1, None),
        post(true, 5, None),
        post(true, -1, Some(false)),
    ];

    for p in &hidden {
        assert!(policy::can_view_post(&author(), p, now));
        assert!(policy::can_view_post(&admin(), p, now));
        assert!(!policy::can_view_post(&other(), p, now));
        assert!(!policy::can_view_post(&Viewer::Anonymous, p, now));
    }
}

#[test]
fn test_comment_eligibility() {
    let now = Utc::now();
    let public = post(true, -1, None);
    let draft = post(false, -1, None);

    assert!(policy::can_comment(&other(), &public, now));
    assert!(policy::can_comment(&author(), &draft, now));
    assert!(!policy::can_comment(&other(), &draft, now));
    // Superusers may view a draft but the eligibility rule does not include them.
    assert!(!policy::can_comment(&admin(), &draft, now));
    assert!(!policy::can_comment(&Viewer::Anonymous, &public, now));
}

#[test]
fn test_authorize_mutation_outcomes() {
    let p = post(true, -1, None);

    assert_eq!(
        policy::authorize_mutation(&author(), &p, Some(p.id)),
        Authorization::Allowed
    );
    assert_eq!(
        policy::authorize_mutation(&other(), &p, Some(p.id)),
        Authorization::DeniedRedirect { post_id: 7 }
    );
    assert_eq!(
        policy::authorize_mutation(&other(), &p, None),
        Authorization::DeniedFatal
    );
    assert_eq!(
        policy::authorize_mutation(&Viewer::Anonymous, &p, Some(p.id)),
        Authorization::DeniedRedirect { post_id: 7 }
    );
}

#[test]
fn test_authorization_into_result() {
    use blogicum::AppError;

    assert!(Authorization::Allowed.into_result().is_ok());
    assert!(matches!(
        Authorization::DeniedRedirect { post_id: 3 }.into_result(),
        Err(AppError::RedirectOnDenial { post_id: 3 })
    ));
    assert!(matches!(
        Authorization::DeniedFatal.into_result(),
        Err(AppError::PermissionDenied)
    ));
}

#[test]
fn test_profile_scope() {
    assert_eq!(policy::profile_scope(&author(), "author"), ListingScope::AllPosts);
    assert_eq!(
        policy::profile_scope(&other(), "author"),
        ListingScope::PublishedOnly
    );
    // Superusers browse other profiles like everyone else.
    assert_eq!(
        policy::profile_scope(&admin(), "author"),
        ListingScope::PublishedOnly
    );
    assert_eq!(
        policy::profile_scope(&Viewer::Anonymous, "author"),
        ListingScope::PublishedOnly
    );
}
