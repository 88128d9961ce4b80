pub mod auth;
pub mod boards;
pub mod card_lists;
pub mod cards;
pub mod endpoints;
pub mod error;
pub mod extract;
pub mod members;
pub mod middleware;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};

use crate::auth::AppState;
use crate::middleware::require_auth;

/// Every route the server exposes, as listed in [`endpoints::ENDPOINTS`].
/// Everything except auth, health and the route catalog sits behind
/// [`require_auth`].
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/health", get(health))
        .route("/endpoints", get(endpoints::all_endpoints))
        .route("/endpoints/public", get(endpoints::public_endpoints))
        .route("/endpoints/protected", get(endpoints::protected_endpoints));

    let protected_routes = Router::new()
        // -- Boards --
        .route("/boards", get(boards::list_boards).post(boards::create_board))
        .route(
            "/boards/{id}",
            get(boards::get_board)
                .put(boards::update_board)
                .delete(boards::delete_board),
        )
        // -- Members --
        .route(
            "/boards/{id}/members",
            get(members::list_members).post(members::add_member),
        )
        .route(
            "/boards/{id}/members/{user_id}",
            put(members::update_member_role).delete(members::remove_member),
        )
        // -- Card lists --
        .route("/cardlists", post(card_lists::create_card_list))
        .route("/cardlists/reorder", post(card_lists::reorder_card_lists))
        .route("/cardlists/board/{board_id}", get(card_lists::list_card_lists))
        .route(
            "/cardlists/{id}",
            get(card_lists::get_card_list)
                .put(card_lists::update_card_list)
                .delete(card_lists::delete_card_list),
        )
        // -- Cards --
        .route("/cards", post(cards::create_card))
        .route("/cards/reorder", post(cards::reorder_cards))
        .route("/cards/cardlist/{list_id}", get(cards::list_cards))
        .route(
            "/cards/{id}",
            get(cards::get_card)
                .put(cards::update_card)
                .delete(cards::delete_card),
        )
        .route("/cards/{id}/move", post(cards::move_card))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
