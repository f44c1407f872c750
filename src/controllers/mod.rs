pub mod carts;
pub mod movies;
pub mod query;
pub mod reservations;
pub mod rooms;
pub mod showtimes;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    let admin = Router::new()
        .merge(movies::admin_routes())
        .merge(rooms::admin_routes())
        .merge(showtimes::admin_routes());

    Router::new()
        .merge(movies::public_routes())
        .merge(showtimes::routes())
        .merge(carts::routes())
        .merge(reservations::routes())
        .nest("/admin", admin)
}
