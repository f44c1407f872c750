pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod services;

use std::sync::Arc;

use services::{CartService, CatalogService, ReservationService, RoomService, ShowtimeService};

// Shared state for every handler
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
    pub config: config::Config,
    pub catalog: CatalogService,
    pub rooms: RoomService,
    pub showtimes: ShowtimeService,
    pub carts: CartService,
    pub reservations: ReservationService,
}

impl AppState {
    pub fn new(db: database::Database, config: config::Config) -> Arc<Self> {
        Arc::new(Self {
            catalog: CatalogService::new(db.clone()),
            rooms: RoomService::new(db.clone()),
            showtimes: ShowtimeService::new(db.clone()),
            carts: CartService::new(db.clone()),
            reservations: ReservationService::new(db.clone()),
            db,
            config,
        })
    }
}
