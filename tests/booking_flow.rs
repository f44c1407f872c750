//! Store-backed booking scenarios. They need a PostgreSQL server reachable
//! through `DATABASE_URL`; run them with `cargo test -- --ignored`.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use sqlx::PgPool;

use cinema_booking::database::Database;
use cinema_booking::error::AppError;
use cinema_booking::models::{
    CartFilter, CartInput, GenreInput, MovieInput, PageInput, ReservationInput, ReservationStatus,
    RoomInput, SeatInput, ShowtimeInput,
};
use cinema_booking::services::{
    CartService, CatalogService, HoldReaper, ReservationService, RoomService, ShowtimeService,
};

struct Fixture {
    pool: PgPool,
    catalog: CatalogService,
    rooms: RoomService,
    showtimes: ShowtimeService,
    carts: CartService,
    reservations: ReservationService,
}

impl Fixture {
    fn new(pool: PgPool) -> Self {
        let db = Database::from_pool(pool.clone());
        Fixture {
            pool,
            catalog: CatalogService::new(db.clone()),
            rooms: RoomService::new(db.clone()),
            showtimes: ShowtimeService::new(db.clone()),
            carts: CartService::new(db.clone()),
            reservations: ReservationService::new(db),
        }
    }

    async fn movie(&self, duration: i32) -> i64 {
        let genre = self
            .catalog
            .create_genre(GenreInput { name: "Drama".into() })
            .await
            .unwrap();
        let movie = self
            .catalog
            .create_movie(MovieInput {
                title: "Short Film".into(),
                release_date: Utc::now(),
                director: "Someone".into(),
                duration,
                poster_url: "https://posters.example/short.png".into(),
                description: "A short one".into(),
                genre_ids: vec![genre.id],
            })
            .await
            .unwrap();
        assert_eq!(movie.genres, vec!["drama".to_string()]);
        movie.id
    }

    async fn room(&self, name: &str, seats: &[(&str, i64)]) -> (i64, Vec<i64>) {
        let room = self.rooms.create(RoomInput { name: name.into() }).await.unwrap();
        let roster = seats.iter().map(|(n, p)| SeatInput::new(*n, *p)).collect();
        let seats = self.rooms.set_seats(room.id, roster).await.unwrap();
        (room.id, seats.into_iter().map(|s| s.id).collect())
    }

    async fn showtime(&self, movie_id: i64, room_id: i64, start: DateTime<Utc>, price: i64) -> i64 {
        self.showtimes
            .create(ShowtimeInput {
                movie_id,
                room_id,
                start_at: start,
                end_at: start + Duration::hours(2),
                price,
            })
            .await
            .unwrap()
            .id
    }

    async fn seat_available(&self, showtime_id: i64, seat_id: i64) -> bool {
        self.showtimes
            .get_showtime_seats(showtime_id)
            .await
            .unwrap()
            .into_iter()
            .find(|s| s.seat.id == seat_id)
            .map(|s| s.is_available)
            .unwrap()
    }

    async fn cart(&self, user_id: i64, showtime_id: i64, seat_id: i64) -> i64 {
        self.carts
            .create(user_id, CartInput { user_id: 0, showtime_id, seat_id })
            .await
            .unwrap()
            .id
    }
}

const USER: i64 = 7;

/// Room with seat S (no surcharge), a 33 minute movie and a showtime three
/// days out priced 50000.
async fn basic_setup(fx: &Fixture) -> (i64, i64) {
    let movie_id = fx.movie(33).await;
    let (room_id, seats) = fx.room("Hall A", &[("S", 0)]).await;
    let showtime_id = fx.showtime(movie_id, room_id, Utc::now() + Duration::days(3), 50_000).await;
    (showtime_id, seats[0])
}

#[sqlx::test(migrations = "src/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn paid_reservation_blocks_the_seat(pool: PgPool) {
    let fx = Fixture::new(pool);
    let (showtime_id, seat_id) = basic_setup(&fx).await;

    let cart_id = fx.cart(USER, showtime_id, seat_id).await;
    let cart = fx.carts.get_by_id(USER, cart_id).await.unwrap();
    assert_eq!(cart.price, 50_000);
    assert!(fx.seat_available(showtime_id, seat_id).await, "carts never block seats");

    let reservation = fx
        .reservations
        .create(USER, ReservationInput { cart_ids: vec![cart_id] })
        .await
        .unwrap();
    assert_eq!(reservation.status, ReservationStatus::Unpaid);
    assert_eq!(reservation.total_price, 50_000);
    assert_eq!(reservation.items.as_ref().map(Vec::len), Some(1));

    let carts = fx.carts.pagination(CartFilter::owned(USER, vec![]), PageInput::default()).await.unwrap();
    assert_eq!(carts.total_items, 0, "carts are consumed");

    let paid = fx.reservations.pay(USER, reservation.id).await.unwrap();
    assert_eq!(paid.status, ReservationStatus::Paid);
    assert_eq!(paid.total_price, 50_000);
    assert!(!fx.seat_available(showtime_id, seat_id).await);

    let showtime = fx.showtimes.get_by_id(showtime_id).await.unwrap();
    assert_eq!((showtime.total_seats, showtime.available_seats), (1, 0));
}

#[sqlx::test(migrations = "src/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn cancelled_reservation_frees_the_seat(pool: PgPool) {
    let fx = Fixture::new(pool);
    let (showtime_id, seat_id) = basic_setup(&fx).await;

    let cart_id = fx.cart(USER, showtime_id, seat_id).await;
    let reservation = fx
        .reservations
        .create(USER, ReservationInput { cart_ids: vec![cart_id] })
        .await
        .unwrap();
    assert!(!fx.seat_available(showtime_id, seat_id).await, "fresh unpaid hold blocks");

    let cancelled = fx.reservations.cancel(USER, reservation.id).await.unwrap();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);
    assert_eq!(cancelled.total_price, 50_000);
    assert_eq!(cancelled.items.as_ref().map(Vec::len), Some(1));
    assert!(fx.seat_available(showtime_id, seat_id).await);
}

#[sqlx::test(migrations = "src/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn reservation_price_is_frozen(pool: PgPool) {
    let fx = Fixture::new(pool);
    let movie_id = fx.movie(90).await;
    let (room_id, seats) = fx.room("Hall B", &[("A1", 0), ("A2", 3_000)]).await;
    let start = Utc::now() + Duration::days(2);
    let showtime_id = fx.showtime(movie_id, room_id, start, 40_000).await;

    let c1 = fx.cart(USER, showtime_id, seats[0]).await;
    let c2 = fx.cart(USER, showtime_id, seats[1]).await;
    let reservation = fx
        .reservations
        .create(USER, ReservationInput { cart_ids: vec![c1, c2] })
        .await
        .unwrap();
    assert_eq!(reservation.total_price, 83_000);

    fx.showtimes
        .update_by_id(
            showtime_id,
            ShowtimeInput {
                movie_id,
                room_id,
                start_at: start,
                end_at: start + Duration::hours(2),
                price: 99_000,
            },
        )
        .await
        .unwrap();
    fx.rooms
        .set_seats(room_id, vec![SeatInput::new("A1", 10_000), SeatInput::new("A2", 10_000)])
        .await
        .unwrap();

    let reloaded = fx.reservations.get_by_id(USER, reservation.id).await.unwrap();
    assert_eq!(reloaded.total_price, 83_000);
    let prices: Vec<i64> = reloaded.items.unwrap().iter().map(|i| i.price).collect();
    assert_eq!(prices, vec![40_000, 43_000]);
}

#[sqlx::test(migrations = "src/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn carts_from_two_showtimes_create_nothing(pool: PgPool) {
    let fx = Fixture::new(pool.clone());
    let movie_id = fx.movie(60).await;
    let (room_id, seats) = fx.room("Hall C", &[("A1", 0)]).await;
    let start = Utc::now() + Duration::days(1);
    let first = fx.showtime(movie_id, room_id, start, 30_000).await;
    let second = fx.showtime(movie_id, room_id, start + Duration::hours(3), 30_000).await;

    let c1 = fx.cart(USER, first, seats[0]).await;
    let c2 = fx.cart(USER, second, seats[0]).await;

    let err = fx
        .reservations
        .create(USER, ReservationInput { cart_ids: vec![c1, c2] })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Input(_)));

    let reservations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reservations")
        .fetch_one(&fx.pool)
        .await
        .unwrap();
    let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reservation_items")
        .fetch_one(&pool)
        .await
        .unwrap();
    let carts = fx.carts.pagination(CartFilter::owned(USER, vec![]), PageInput::default()).await.unwrap();
    assert_eq!((reservations, items, carts.total_items), (0, 0, 2));
}

#[sqlx::test(migrations = "src/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn terminal_reservations_refuse_transitions(pool: PgPool) {
    let fx = Fixture::new(pool);
    let movie_id = fx.movie(60).await;
    let (room_id, seats) = fx.room("Hall D", &[("A1", 0), ("A2", 0)]).await;
    let showtime_id = fx.showtime(movie_id, room_id, Utc::now() + Duration::days(5), 20_000).await;

    let paid = {
        let cart_id = fx.cart(USER, showtime_id, seats[0]).await;
        let r = fx.reservations.create(USER, ReservationInput { cart_ids: vec![cart_id] }).await.unwrap();
        fx.reservations.pay(USER, r.id).await.unwrap()
    };
    let cancelled = {
        let cart_id = fx.cart(USER, showtime_id, seats[1]).await;
        let r = fx.reservations.create(USER, ReservationInput { cart_ids: vec![cart_id] }).await.unwrap();
        fx.reservations.cancel(USER, r.id).await.unwrap()
    };

    for id in [paid.id, cancelled.id] {
        assert!(matches!(fx.reservations.pay(USER, id).await, Err(AppError::Input(_))));
        assert!(matches!(fx.reservations.cancel(USER, id).await, Err(AppError::Input(_))));
    }
    // another user cannot see the reservation at all
    assert!(matches!(fx.reservations.pay(USER + 1, paid.id).await, Err(AppError::Input(_))));

    let paid_again = fx.reservations.get_by_id(USER, paid.id).await.unwrap();
    assert_eq!(paid_again.status, ReservationStatus::Paid);
}

#[sqlx::test(migrations = "src/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn cancel_inside_cutoff_is_rejected(pool: PgPool) {
    let fx = Fixture::new(pool);
    let movie_id = fx.movie(60).await;
    let (room_id, seats) = fx.room("Hall E", &[("A1", 0)]).await;
    let showtime_id = fx.showtime(movie_id, room_id, Utc::now() + Duration::hours(5), 20_000).await;

    let cart_id = fx.cart(USER, showtime_id, seats[0]).await;
    let r = fx.reservations.create(USER, ReservationInput { cart_ids: vec![cart_id] }).await.unwrap();

    assert!(matches!(fx.reservations.cancel(USER, r.id).await, Err(AppError::Input(_))));
    let unchanged = fx.reservations.get_by_id(USER, r.id).await.unwrap();
    assert_eq!(unchanged.status, ReservationStatus::Unpaid);
}

#[sqlx::test(migrations = "src/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn unpaid_hold_expires_after_thirty_minutes(pool: PgPool) {
    let fx = Fixture::new(pool.clone());
    let (showtime_id, seat_id) = basic_setup(&fx).await;

    let cart_id = fx.cart(USER, showtime_id, seat_id).await;
    let r = fx.reservations.create(USER, ReservationInput { cart_ids: vec![cart_id] }).await.unwrap();

    sqlx::query("UPDATE reservations SET created_at = NOW() - interval '29 minutes' WHERE id = $1")
        .bind(r.id)
        .execute(&pool)
        .await
        .unwrap();
    assert!(!fx.seat_available(showtime_id, seat_id).await);

    sqlx::query("UPDATE reservations SET created_at = NOW() - interval '31 minutes' WHERE id = $1")
        .bind(r.id)
        .execute(&pool)
        .await
        .unwrap();
    assert!(fx.seat_available(showtime_id, seat_id).await);

    // the reaper only tidies the status, availability is unchanged
    let stats = HoldReaper::new(Database::from_pool(pool)).sweep(Utc::now()).await.unwrap();
    assert_eq!(stats.cancelled, vec![r.id]);
    assert!(fx.seat_available(showtime_id, seat_id).await);
}

#[sqlx::test(migrations = "src/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn paid_seat_stays_blocked_regardless_of_age(pool: PgPool) {
    let fx = Fixture::new(pool.clone());
    let (showtime_id, seat_id) = basic_setup(&fx).await;

    let cart_id = fx.cart(USER, showtime_id, seat_id).await;
    let r = fx.reservations.create(USER, ReservationInput { cart_ids: vec![cart_id] }).await.unwrap();
    fx.reservations.pay(USER, r.id).await.unwrap();

    sqlx::query("UPDATE reservations SET created_at = NOW() - interval '30 days' WHERE id = $1")
        .bind(r.id)
        .execute(&pool)
        .await
        .unwrap();
    assert!(!fx.seat_available(showtime_id, seat_id).await);
}

#[sqlx::test(migrations = "src/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn roster_resubmission_keeps_seat_ids(pool: PgPool) {
    let fx = Fixture::new(pool);
    let room = fx.rooms.create(RoomInput { name: "Hall F".into() }).await.unwrap();
    let roster = || vec![SeatInput::new("A1", 0), SeatInput::new("A2", 500)];

    let first = fx.rooms.set_seats(room.id, roster()).await.unwrap();
    let second = fx.rooms.set_seats(room.id, roster()).await.unwrap();
    assert_eq!(first, second, "ids, prices and timestamps are untouched");

    let changed = fx
        .rooms
        .set_seats(room.id, vec![SeatInput::new("A2", 900), SeatInput::new("B1", 0)])
        .await
        .unwrap();
    let a2_before = first.iter().find(|s| s.name == "A2").unwrap();
    let a2_after = changed.iter().find(|s| s.name == "A2").unwrap();
    assert_eq!(a2_before.id, a2_after.id);
    assert_eq!(a2_after.additional_price, 900);
    assert!(changed.iter().all(|s| s.name != "A1"));

    let capacity = fx.rooms.get_by_id(room.id).await.unwrap().capacity;
    assert_eq!(capacity, 2);

    let missing = fx.rooms.set_seats(room.id + 1000, roster()).await.unwrap_err();
    assert!(matches!(missing, AppError::NotFound(_)));
}

#[sqlx::test(migrations = "src/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn reserved_seat_cannot_be_removed_from_roster(pool: PgPool) {
    let fx = Fixture::new(pool);
    let (showtime_id, seat_id) = basic_setup(&fx).await;
    let room_id = fx.showtimes.get_by_id(showtime_id).await.unwrap().room_id;

    let cart_id = fx.cart(USER, showtime_id, seat_id).await;
    fx.reservations.create(USER, ReservationInput { cart_ids: vec![cart_id] }).await.unwrap();

    let err = fx.rooms.set_seats(room_id, vec![SeatInput::new("T", 0)]).await.unwrap_err();
    assert!(matches!(&err, AppError::Input(m) if m.contains("reserved seats")), "{:?}", err);
    assert_eq!(fx.rooms.list_seats(room_id).await.unwrap().len(), 1, "rolled back");
}

#[sqlx::test(migrations = "src/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn reservation_history_blocks_room_and_showtime_deletion(pool: PgPool) {
    let fx = Fixture::new(pool.clone());
    let (showtime_id, seat_id) = basic_setup(&fx).await;
    let booked = fx.showtimes.get_by_id(showtime_id).await.unwrap();
    let (room_id, movie_id) = (booked.room_id, booked.movie_id);

    let cart_id = fx.cart(USER, showtime_id, seat_id).await;
    fx.reservations.create(USER, ReservationInput { cart_ids: vec![cart_id] }).await.unwrap();

    let err = fx.showtimes.delete_by_id(showtime_id).await.unwrap_err();
    assert!(matches!(&err, AppError::Input(m) if m.starts_with("showtime has reservations")), "{:?}", err);
    let err = fx.rooms.delete_by_id(room_id).await.unwrap_err();
    assert!(matches!(&err, AppError::Input(m) if m.starts_with("room has reservations")), "{:?}", err);
    assert!(fx.showtimes.get_by_id(showtime_id).await.is_ok());

    // without reservations the room takes its seats, showtimes and carts along
    let (empty_room, seats) = fx.room("Hall M", &[("A1", 0)]).await;
    let unbooked = fx.showtime(movie_id, empty_room, Utc::now() + Duration::days(6), 15_000).await;
    fx.cart(USER, unbooked, seats[0]).await;

    fx.rooms.delete_by_id(empty_room).await.unwrap();
    assert!(matches!(fx.showtimes.get_by_id(unbooked).await, Err(AppError::NotFound(_))));
    let carts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM carts WHERE showtime_id = $1")
        .bind(unbooked)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(carts, 0);
}

#[sqlx::test(migrations = "src/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn scheduling_rules(pool: PgPool) {
    let fx = Fixture::new(pool);
    let movie_id = fx.movie(120).await;
    let (room_id, _) = fx.room("Hall G", &[("A1", 0)]).await;
    let start = Utc::now() + Duration::days(4);
    let existing = fx.showtime(movie_id, room_id, start, 10_000).await;

    let input = |s: DateTime<Utc>, e: DateTime<Utc>| ShowtimeInput {
        movie_id,
        room_id,
        start_at: s,
        end_at: e,
        price: 10_000,
    };

    // shorter than the movie
    let short = fx.showtimes.create(input(start + Duration::days(1), start + Duration::days(1) + Duration::minutes(119))).await;
    assert!(matches!(short, Err(AppError::Input(_))));

    // touching the existing showtime's end
    let touching = fx.showtimes.create(input(start + Duration::hours(2), start + Duration::hours(4))).await;
    assert!(matches!(touching, Err(AppError::Input(_))));

    // contained in a longer window
    let around = fx.showtimes.create(input(start - Duration::hours(1), start + Duration::hours(3))).await;
    assert!(matches!(around, Err(AppError::Input(_))));

    // updating in place does not conflict with itself
    let moved = fx.showtimes.update_by_id(existing, input(start + Duration::minutes(30), start + Duration::minutes(150))).await;
    assert!(moved.is_ok());

    let unknown_movie = fx
        .showtimes
        .create(ShowtimeInput { movie_id: movie_id + 1000, ..input(start + Duration::days(2), start + Duration::days(2) + Duration::hours(2)) })
        .await;
    assert!(matches!(unknown_movie, Err(AppError::NotFound(_))));
}

#[sqlx::test(migrations = "src/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn cart_rules(pool: PgPool) {
    let fx = Fixture::new(pool);
    let (showtime_id, seat_id) = basic_setup(&fx).await;
    let (_, foreign_seats) = fx.room("Hall H", &[("Z9", 0)]).await;

    let cart_id = fx.cart(USER, showtime_id, seat_id).await;

    let duplicate = fx.carts.create(USER, CartInput { user_id: 0, showtime_id, seat_id }).await;
    assert!(matches!(duplicate, Err(AppError::Input(_))));

    let wrong_room = fx
        .carts
        .create(USER, CartInput { user_id: 0, showtime_id, seat_id: foreign_seats[0] })
        .await;
    assert!(matches!(wrong_room, Err(AppError::Input(_))));

    // another user's cart looks missing
    assert!(matches!(fx.carts.get_by_id(USER + 1, cart_id).await, Err(AppError::NotFound(_))));
    assert!(matches!(fx.carts.delete_by_id(USER + 1, cart_id).await, Err(AppError::NotFound(_))));

    fx.carts.delete_by_id(USER, cart_id).await.unwrap();
    assert!(matches!(fx.carts.get_by_id(USER, cart_id).await, Err(AppError::NotFound(_))));
}

#[sqlx::test(migrations = "src/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn sub_microsecond_instants_are_checked_as_stored(pool: PgPool) {
    let fx = Fixture::new(pool);
    let movie_id = fx.movie(120).await;
    let (room_id, _) = fx.room("Hall I", &[("A1", 0)]).await;
    let start = Utc::now().trunc_subsecs(0) + Duration::days(4) + Duration::nanoseconds(700);

    let input = |s: DateTime<Utc>| ShowtimeInput {
        movie_id,
        room_id,
        start_at: s,
        end_at: s + Duration::hours(2),
        price: 10_000,
    };

    let first = fx.showtimes.create(input(start)).await.unwrap();
    assert_eq!(first.start_at, start.trunc_subsecs(6));
    assert_eq!(first.end_at, (start + Duration::hours(2)).trunc_subsecs(6));

    let at_stored_end = fx.showtimes.create(input(first.end_at)).await;
    assert!(matches!(at_stored_end, Err(AppError::Input(_))));

    let at_raw_end = fx.showtimes.create(input(start + Duration::hours(2))).await;
    assert!(matches!(at_raw_end, Err(AppError::Input(_))));
}

#[sqlx::test(migrations = "src/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn rescheduled_showtime_moves_the_cancel_cutoff(pool: PgPool) {
    let fx = Fixture::new(pool);
    let movie_id = fx.movie(60).await;
    let (room_id, seats) = fx.room("Hall J", &[("A1", 0), ("A2", 0)]).await;
    let booked_for = Utc::now() + Duration::days(3);
    let showtime_id = fx.showtime(movie_id, room_id, booked_for, 20_000).await;

    let cart_id = fx.cart(USER, showtime_id, seats[0]).await;
    let r = fx.reservations.create(USER, ReservationInput { cart_ids: vec![cart_id] }).await.unwrap();

    let reschedule = |start: DateTime<Utc>| ShowtimeInput {
        movie_id,
        room_id,
        start_at: start,
        end_at: start + Duration::hours(2),
        price: 20_000,
    };

    let soon = Utc::now() + Duration::hours(2);
    fx.showtimes.update_by_id(showtime_id, reschedule(soon)).await.unwrap();

    let err = fx.reservations.cancel(USER, r.id).await.unwrap_err();
    assert!(matches!(err, AppError::Input(_)), "{:?}", err);

    // the item keeps the time shown at booking
    let unchanged = fx.reservations.get_by_id(USER, r.id).await.unwrap();
    assert_eq!(unchanged.status, ReservationStatus::Unpaid);
    let snapshot = unchanged.items.unwrap()[0].showtime_start;
    assert!(snapshot > soon + Duration::days(2));

    // moved back out, the same reservation can be cancelled again
    let later = Utc::now() + Duration::days(2);
    fx.showtimes.update_by_id(showtime_id, reschedule(later)).await.unwrap();
    let cancelled = fx.reservations.cancel(USER, r.id).await.unwrap();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);
}

#[sqlx::test(migrations = "src/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn serialization_failures_map_to_conflict(pool: PgPool) {
    for code in ["40001", "40P01"] {
        let sql = format!("DO $$ BEGIN RAISE EXCEPTION 'aborted' USING ERRCODE = '{}'; END $$", code);
        let err = sqlx::query(&sql).execute(&pool).await.unwrap_err();
        assert!(matches!(AppError::from(err), AppError::Conflict(_)), "sqlstate {}", code);
    }
}

#[sqlx::test(migrations = "src/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn concurrent_schedulers_on_one_room_never_both_succeed(pool: PgPool) {
    let fx = Fixture::new(pool.clone());
    let movie_id = fx.movie(60).await;
    let (room_id, _) = fx.room("Hall K", &[("A1", 0)]).await;
    let base = Utc::now() + Duration::days(10);

    let rounds = 10;
    let mut refused = 0;
    for round in 0..rounds {
        let start = base + Duration::hours(5 * round);
        let input = |offset: i64| ShowtimeInput {
            movie_id,
            room_id,
            start_at: start + Duration::hours(offset),
            end_at: start + Duration::hours(offset + 2),
            price: 10_000,
        };

        let (a, b) = tokio::join!(fx.showtimes.create(input(0)), fx.showtimes.create(input(1)));
        let outcomes = [a, b];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1, "round {}", round);
        for outcome in &outcomes {
            match outcome {
                Ok(_) => {}
                Err(AppError::Conflict(_) | AppError::Input(_)) => refused += 1,
                Err(other) => panic!("unexpected error in round {}: {:?}", round, other),
            }
        }
    }

    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM showtimes WHERE room_id = $1")
        .bind(room_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, rounds);
    assert_eq!(refused, rounds);
}

#[sqlx::test(migrations = "src/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn concurrent_pay_and_cancel_settle_on_one_status(pool: PgPool) {
    let fx = Fixture::new(pool);
    let movie_id = fx.movie(60).await;
    let names: Vec<String> = (1..=5).map(|i| format!("A{}", i)).collect();
    let roster: Vec<(&str, i64)> = names.iter().map(|n| (n.as_str(), 0)).collect();
    let (room_id, seats) = fx.room("Hall L", &roster).await;
    let showtime_id = fx.showtime(movie_id, room_id, Utc::now() + Duration::days(3), 20_000).await;

    for seat_id in seats {
        let cart_id = fx.cart(USER, showtime_id, seat_id).await;
        let r = fx.reservations.create(USER, ReservationInput { cart_ids: vec![cart_id] }).await.unwrap();

        let (paid, cancelled) = tokio::join!(fx.reservations.pay(USER, r.id), fx.reservations.cancel(USER, r.id));
        let winner = match (paid, cancelled) {
            (Ok(p), Err(e)) => {
                assert!(matches!(e, AppError::Conflict(_) | AppError::Input(_)), "{:?}", e);
                p.status
            }
            (Err(e), Ok(c)) => {
                assert!(matches!(e, AppError::Conflict(_) | AppError::Input(_)), "{:?}", e);
                c.status
            }
            other => panic!("exactly one transition must win: {:?}", other),
        };

        let settled = fx.reservations.get_by_id(USER, r.id).await.unwrap();
        assert_eq!(settled.status, winner);
    }
}
