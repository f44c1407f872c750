pub mod availability;
pub mod cart;
pub mod movie;
pub mod pagination;
pub mod reservation;
pub mod room;
pub mod showtime;

pub use cart::{Cart, CartFilter, CartInput};
pub use movie::{Genre, GenreFilter, GenreInput, Movie, MovieFilter, MovieInput};
pub use pagination::{PageInput, PageQuery, Paginate};
pub use reservation::{Reservation, ReservationFilter, ReservationInput, ReservationItem, ReservationStatus};
pub use room::{Room, RoomFilter, RoomInput, Seat, SeatInput, ShowtimeSeat};
pub use showtime::{Showtime, ShowtimeFilter, ShowtimeInput, TimeWindow};
