/// Database row types for the identity tables. Board content maps straight
/// onto `pinboard-types` models in `store.rs`.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub full_name: String,
    /// Argon2 PHC string.
    pub password: String,
    pub is_active: bool,
    pub created_at: String,
}
