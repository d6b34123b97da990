use crate::domain::{
    AssetId, Booking, BookingEvent, BookingId, BookingStatus, Money, RentalPeriod, UserId,
    overlap,
};
use crate::ports::booking_repository::{
    BookingRepository as BookingRepositoryTrait, Result, StoreError,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

#[derive(Default)]
struct State {
    bookings: HashMap<BookingId, Booking>,
    events: HashMap<BookingId, Vec<BookingEvent>>,
}

/// In-memory implementation of BookingRepository
///
/// Every write runs its overlap re-check and the write itself under one lock,
/// so two concurrent inserts for the same asset and overlapping dates cannot
/// both commit. An optional artificial latency is applied before each call so
/// tests can widen race windows or trip the service's store timeout.
pub struct BookingRepository {
    state: Mutex<State>,
    latency: Option<Duration>,
}

impl BookingRepository {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            latency: None,
        }
    }

    /// Delay every call by `latency` before touching the state
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::new()
        }
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string().into()))
    }
}

impl Default for BookingRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_no_overlap(state: &State, booking: &Booking) -> Result<()> {
    if !booking.status.holds_schedule() {
        return Ok(());
    }
    let clash = overlap::find_conflict(
        state.bookings.values(),
        booking.asset_id,
        &booking.period,
        Some(booking.booking_id),
    );
    match clash {
        Some(_) => Err(StoreError::ScheduleConflict),
        None => Ok(()),
    }
}

fn newest_first(mut bookings: Vec<Booking>) -> Vec<Booking> {
    bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    bookings
}

#[async_trait]
impl BookingRepositoryTrait for BookingRepository {
    async fn insert(&self, booking: &Booking, event: &BookingEvent) -> Result<()> {
        self.delay().await;
        let mut state = self.lock()?;

        if state.bookings.contains_key(&booking.booking_id) {
            return Err(StoreError::Backend(
                format!("booking {} already exists", booking.booking_id.value()).into(),
            ));
        }
        ensure_no_overlap(&state, booking)?;

        state.bookings.insert(booking.booking_id, booking.clone());
        state
            .events
            .entry(booking.booking_id)
            .or_default()
            .push(event.clone());
        Ok(())
    }

    async fn update(&self, booking: &Booking, event: &BookingEvent) -> Result<()> {
        self.delay().await;
        let mut state = self.lock()?;

        let stored_version = state
            .bookings
            .get(&booking.booking_id)
            .map(|stored| stored.version)
            .ok_or(StoreError::VersionMismatch(booking.booking_id))?;
        if stored_version + 1 != booking.version {
            return Err(StoreError::VersionMismatch(booking.booking_id));
        }
        ensure_no_overlap(&state, booking)?;

        state.bookings.insert(booking.booking_id, booking.clone());
        state
            .events
            .entry(booking.booking_id)
            .or_default()
            .push(event.clone());
        Ok(())
    }

    async fn get_by_id(&self, booking_id: BookingId) -> Result<Option<Booking>> {
        self.delay().await;
        Ok(self.lock()?.bookings.get(&booking_id).cloned())
    }

    async fn find_schedule_holders(
        &self,
        asset_id: AssetId,
        period: &RentalPeriod,
    ) -> Result<Vec<Booking>> {
        self.delay().await;
        Ok(self
            .lock()?
            .bookings
            .values()
            .filter(|b| {
                b.asset_id == asset_id && b.status.holds_schedule() && b.period.overlaps(period)
            })
            .cloned()
            .collect())
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Booking>> {
        self.delay().await;
        let bookings = self
            .lock()?
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(bookings))
    }

    async fn find_all(&self) -> Result<Vec<Booking>> {
        self.delay().await;
        let bookings = self.lock()?.bookings.values().cloned().collect();
        Ok(newest_first(bookings))
    }

    async fn count_by_status(&self) -> Result<BTreeMap<BookingStatus, u64>> {
        self.delay().await;
        let mut counts = BTreeMap::new();
        for booking in self.lock()?.bookings.values() {
            *counts.entry(booking.status).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn total_revenue(&self) -> Result<Money> {
        self.delay().await;
        Ok(self
            .lock()?
            .bookings
            .values()
            .filter(|b| b.status != BookingStatus::Cancelled)
            .map(Booking::final_price)
            .sum())
    }

    async fn history(&self, booking_id: BookingId) -> Result<Vec<BookingEvent>> {
        self.delay().await;
        Ok(self
            .lock()?
            .events
            .get(&booking_id)
            .cloned()
            .unwrap_or_default())
    }
}
