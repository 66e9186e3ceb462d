use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

// --- Core Records (Mapped to Database) ---

/// User
///
/// Account record from the `users` table. Authentication itself is handled
/// upstream; this row only supplies identity and the superuser flag.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_superuser: bool,
    #[ts(type = "string")]
    pub date_joined: DateTime<Utc>,
}

/// Category
///
/// Admin-managed grouping. An unpublished category hides every post filed under it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Location
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub is_published: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Post
///
/// A post row joined with its author, category and location. The joined
/// columns are `None` when the reference is null; `category_is_published`
/// is what the visibility rule reads.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub text: String,
    /// May lie in the future: the post is then scheduled.
    #[ts(type = "string")]
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,

    pub author_id: Uuid,
    pub author_username: String,

    pub category_id: Option<i64>,
    pub category_slug: Option<String>,
    pub category_title: Option<String>,
    pub category_is_published: Option<bool>,

    pub location_id: Option<i64>,
    pub location_name: Option<String>,
    pub location_is_published: Option<bool>,

    // Storage key of the attached picture; serving it is someone else's job.
    pub image: Option<String>,

    pub comment_count: i64,
}

/// Comment
///
/// A comment row augmented with the author's username (JOIN on `users`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub post_id: i64,
    pub author_id: Uuid,
    #[sqlx(default)]
    pub author_username: String,
    pub is_published: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// NewUser
///
/// Seed payload for provisioning an account row. Registration is not exposed over HTTP.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_superuser: bool,
}

// --- Form Payloads (Input Schemas) ---

/// PostForm
///
/// Body of `POST /posts/create/` and `POST /posts/{post_id}/edit/`.
/// The author is never part of the form: it is the authenticated caller.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PostForm {
    pub title: String,
    pub text: String,
    #[ts(type = "string")]
    pub pub_date: DateTime<Utc>,
    /// Unchecked checkboxes are not submitted, hence the `false` default.
    #[serde(default, deserialize_with = "field::checkbox")]
    pub is_published: bool,
    /// An empty `<select>` choice (`category_id=`) means no category.
    #[serde(
        default,
        deserialize_with = "field::optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub category_id: Option<i64>,
    #[serde(
        default,
        deserialize_with = "field::optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub location_id: Option<i64>,
    #[serde(
        default,
        deserialize_with = "field::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub image: Option<String>,
}

const MAX_TITLE_LEN: usize = 256;
const MAX_USERNAME_LEN: usize = 150;

fn check_len(field: &str, value: &str, max: usize) -> Result<(), AppError> {
    let len = value.trim().chars().count();
    if len == 0 {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if len > max {
        return Err(AppError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

impl PostForm {
    /// Initial values offered by the create form: publish now.
    pub fn initial(now: DateTime<Utc>) -> Self {
        Self {
            pub_date: now,
            is_published: true,
            ..Self::default()
        }
    }

    /// Shape checks only; whether the referenced category/location exist is
    /// checked by the handler against the repository.
    pub fn validate(&self) -> Result<(), AppError> {
        check_len("title", &self.title, MAX_TITLE_LEN)?;
        if self.text.trim().is_empty() {
            return Err(AppError::validation("text must not be empty"));
        }
        Ok(())
    }
}

impl From<&Post> for PostForm {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: post.pub_date,
            is_published: post.is_published,
            category_id: post.category_id,
            location_id: post.location_id,
            image: post.image.clone(),
        }
    }
}

/// CommentForm
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CommentForm {
    pub text: String,
}

impl CommentForm {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.text.trim().is_empty() {
            return Err(AppError::validation("comment text must not be empty"));
        }
        Ok(())
    }
}

/// ProfileForm
///
/// Body of `POST /profile/edit/`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ProfileForm {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

impl ProfileForm {
    /// Usernames follow the classic `[A-Za-z0-9@.+-_]` rule.
    pub fn validate(&self) -> Result<(), AppError> {
        check_len("username", &self.username, MAX_USERNAME_LEN)?;
        let allowed = |c: char| c.is_ascii_alphanumeric() || "@.+-_".contains(c);
        if !self.username.chars().all(allowed) {
            return Err(AppError::validation(
                "username may only contain letters, digits and @/./+/-/_",
            ));
        }
        if !self.email.is_empty() && !self.email.contains('@') {
            return Err(AppError::validation("email address is not valid"));
        }
        Ok(())
    }
}

impl From<&User> for ProfileForm {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        }
    }
}

/// CategoryForm
///
/// Admin-only payload for creating or replacing a category.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CategoryForm {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub slug: String,
    #[serde(default, deserialize_with = "field::checkbox")]
    pub is_published: bool,
}

impl CategoryForm {
    pub fn validate(&self) -> Result<(), AppError> {
        check_len("title", &self.title, MAX_TITLE_LEN)?;
        let allowed = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';
        if self.slug.is_empty() || !self.slug.chars().all(allowed) {
            return Err(AppError::validation(
                "slug may only contain latin letters, digits, hyphen and underscore",
            ));
        }
        Ok(())
    }
}

/// LocationForm
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LocationForm {
    pub name: String,
    #[serde(default, deserialize_with = "field::checkbox")]
    pub is_published: bool,
}

impl LocationForm {
    pub fn validate(&self) -> Result<(), AppError> {
        check_len("name", &self.name, MAX_TITLE_LEN)
    }
}

// --- Page View-Models (Output) ---

/// UserProfile
///
/// Public face of a `User`: no superuser flag.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[ts(type = "string")]
    pub date_joined: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            date_joined: user.date_joined,
        }
    }
}

/// PostDetail
///
/// Everything the detail page shows: the post, its comments (oldest first)
/// and which affordances the current viewer gets.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PostDetail {
    pub post: Post,
    pub comments: Vec<Comment>,
    pub can_edit: bool,
    pub can_comment: bool,
}

/// ProfilePage
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ProfilePage {
    pub profile: UserProfile,
    pub posts: Vec<Post>,
}

/// CategoryPage
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CategoryPage {
    pub category: Category,
    pub posts: Vec<Post>,
}

// --- Form Field Decoding ---

/// Field decoders shared by the urlencoded forms and the JSON admin payloads.
/// Browsers send every value as text: `on` for a ticked checkbox and an empty
/// string for a blank `<select>` option.
mod field {
    use serde::{
        Deserializer,
        de::{self, Visitor},
    };
    use std::fmt;

    pub fn checkbox<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        struct CheckboxVisitor;

        impl Visitor<'_> for CheckboxVisitor {
            type Value = bool;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a boolean or one of on/off/true/false/1/0")
            }

            fn visit_bool<E: de::Error>(self, value: bool) -> Result<bool, E> {
                Ok(value)
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<bool, E> {
                match value.trim().to_ascii_lowercase().as_str() {
                    "on" | "true" | "1" | "yes" => Ok(true),
                    "off" | "false" | "0" | "no" | "" => Ok(false),
                    other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
                }
            }
        }

        deserializer.deserialize_any(CheckboxVisitor)
    }

    pub fn optional_id<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<i64>, D::Error> {
        struct IdVisitor;

        impl<'de> Visitor<'de> for IdVisitor {
            type Value = Option<i64>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an integer id, an empty string or null")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
                d.deserialize_any(self)
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                Ok(Some(value))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                i64::try_from(value)
                    .map(Some)
                    .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(value), &self))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                let value = value.trim();
                if value.is_empty() {
                    return Ok(None);
                }
                value
                    .parse()
                    .map(Some)
                    .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }

    pub fn optional_text<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        let value: Option<String> = serde::Deserialize::deserialize(deserializer)?;
        Ok(value.filter(|text| !text.trim().is_empty()))
    }
}
