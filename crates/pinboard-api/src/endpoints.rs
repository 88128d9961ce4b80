use axum::Json;

use pinboard_types::api::{EndpointCatalog, EndpointInfo};

const fn public(
    method: &'static str,
    route: &'static str,
    description: &'static str,
) -> EndpointInfo {
    EndpointInfo {
        method,
        route,
        protected: false,
        description,
    }
}

const fn protected(
    method: &'static str,
    route: &'static str,
    description: &'static str,
) -> EndpointInfo {
    EndpointInfo {
        method,
        route,
        protected: true,
        description,
    }
}

/// Every route mounted by [`crate::router`].
pub const ENDPOINTS: &[EndpointInfo] = &[
    public("POST", "/auth/register", "Create an account and receive a token"),
    public("POST", "/auth/login", "Exchange credentials for a token"),
    public("GET", "/health", "Liveness check"),
    public("GET", "/endpoints", "List every route"),
    public("GET", "/endpoints/public", "List routes that need no token"),
    public("GET", "/endpoints/protected", "List routes that need a token"),
    protected("GET", "/boards", "Boards the caller owns or belongs to"),
    protected("POST", "/boards", "Create a board owned by the caller"),
    protected("GET", "/boards/{id}", "Board with its lists and cards"),
    protected("PUT", "/boards/{id}", "Update title, description or archived flag"),
    protected("DELETE", "/boards/{id}", "Delete a board and its content"),
    protected("GET", "/boards/{id}/members", "List memberships"),
    protected("POST", "/boards/{id}/members", "Add a member"),
    protected("PUT", "/boards/{id}/members/{user_id}", "Change a member's role"),
    protected("DELETE", "/boards/{id}/members/{user_id}", "Remove a member"),
    protected("POST", "/cardlists", "Append a card list to a board"),
    protected("POST", "/cardlists/reorder", "Reorder card lists"),
    protected("GET", "/cardlists/board/{board_id}", "Card lists of a board"),
    protected("GET", "/cardlists/{id}", "One card list"),
    protected("PUT", "/cardlists/{id}", "Update a card list"),
    protected("DELETE", "/cardlists/{id}", "Delete a card list and its cards"),
    protected("POST", "/cards", "Append a card to a list"),
    protected("POST", "/cards/reorder", "Reorder cards"),
    protected("GET", "/cards/cardlist/{list_id}", "Cards of a list"),
    protected("GET", "/cards/{id}", "One card"),
    protected("PUT", "/cards/{id}", "Partially update a card"),
    protected("DELETE", "/cards/{id}", "Delete a card"),
    protected("POST", "/cards/{id}/move", "Move a card to another list"),
];

fn catalog(filter: impl Fn(&EndpointInfo) -> bool) -> Json<EndpointCatalog> {
    let endpoints: Vec<EndpointInfo> = ENDPOINTS.iter().copied().filter(|e| filter(e)).collect();
    Json(EndpointCatalog {
        total: endpoints.len(),
        endpoints,
    })
}

pub async fn all_endpoints() -> Json<EndpointCatalog> {
    catalog(|_| true)
}

pub async fn public_endpoints() -> Json<EndpointCatalog> {
    catalog(|e| !e.protected)
}

pub async fn protected_endpoints() -> Json<EndpointCatalog> {
    catalog(|e| e.protected)
}
