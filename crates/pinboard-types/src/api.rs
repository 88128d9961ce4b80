use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::{Board, Card, CardList, Membership};

// -- JWT Claims --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Boards --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewBoard {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update: `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoardPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub archived: Option<bool>,
}

/// A board with its lists (each carrying its cards) and memberships, all
/// in display order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardDetail {
    #[serde(flatten)]
    pub board: Board,
    pub card_lists: Vec<CardListDetail>,
    pub members: Vec<Membership>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardListDetail {
    #[serde(flatten)]
    pub list: CardList,
    pub cards: Vec<Card>,
}

// -- Members --

/// `role` is kept as text so an unknown value surfaces as a validation
/// error rather than a body rejection.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddMember {
    pub user_id: Uuid,
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemberRolePatch {
    pub role: String,
}

// -- Card lists --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewCardList {
    pub board_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CardListPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub order: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReorderItem {
    pub id: Uuid,
    pub order: i32,
}

// -- Cards --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewCard {
    pub card_list_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Raw points; validated against the difficulty scale by the core.
    pub difficulty: i64,
    #[serde(default)]
    pub assigned_to: Option<Uuid>,
    #[serde(default)]
    pub estimated_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estimated_end: Option<DateTime<Utc>>,
}

/// Partial card update. Nullable fields are tri-state: absent keeps the
/// current value, `null` clears it, a value replaces it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CardPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub estimated_start: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub estimated_end: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub actual_start: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub actual_end: Option<Option<DateTime<Utc>>>,
    pub order: Option<i32>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MoveCard {
    pub card_list_id: Uuid,
}

// -- Route catalog --

#[derive(Debug, Clone, Copy, Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub route: &'static str,
    /// Requires a bearer token.
    pub protected: bool,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct EndpointCatalog {
    pub total: usize,
    pub endpoints: Vec<EndpointInfo>,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}
