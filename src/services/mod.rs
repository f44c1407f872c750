pub mod cart;
pub mod catalog;
pub mod reaper;
pub mod reservation;
pub mod room;
pub mod roster;
pub mod showtime;

pub use cart::CartService;
pub use catalog::CatalogService;
pub use reaper::HoldReaper;
pub use reservation::ReservationService;
pub use room::RoomService;
pub use showtime::ShowtimeService;
