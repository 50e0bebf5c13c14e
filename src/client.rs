//! Client facade.
//!
//! [`AsmounClient`] owns the session, the services and the query cache.
//! Reads go through the cache; writes await the service call and then
//! invalidate the keys listed for them in [`Mutation::affected_keys`], so a
//! read issued after a write always sees server state at least as new as
//! that write.

use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;

use crate::cache::{Mutation, QueryCache, QueryKey, QuerySnapshot};
use crate::config::Config;
use crate::error::ApiError;
use crate::models::{
    Activity, CreateReservation, RegisterRequest, Reservation, UpdateReservation, User,
};
use crate::services::{ActivityService, AuthService, ReservationService};
use crate::session::SessionStore;
use crate::transport::{ensure_id, HttpTransport, Transport};

/// Value stored in the query cache, one variant per read.
#[derive(Debug, Clone)]
pub enum QueryData {
    Activities(Vec<Activity>),
    Activity(Activity),
    Reservations(Vec<Reservation>),
    Reservation(Reservation),
    Profile(Option<User>),
}

impl QueryData {
    fn kind(&self) -> &'static str {
        match self {
            Self::Activities(_) => "activities",
            Self::Activity(_) => "activity",
            Self::Reservations(_) => "reservations",
            Self::Reservation(_) => "reservation",
            Self::Profile(_) => "profile",
        }
    }

    fn mismatch(self, expected: &str) -> ApiError {
        ApiError::decode(format!(
            "Cached entry holds {} data, expected {}",
            self.kind(),
            expected
        ))
    }

    pub fn into_activities(self) -> Result<Vec<Activity>, ApiError> {
        match self {
            Self::Activities(v) => Ok(v),
            other => Err(other.mismatch("activities")),
        }
    }

    pub fn into_activity(self) -> Result<Activity, ApiError> {
        match self {
            Self::Activity(v) => Ok(v),
            other => Err(other.mismatch("activity")),
        }
    }

    pub fn into_reservations(self) -> Result<Vec<Reservation>, ApiError> {
        match self {
            Self::Reservations(v) => Ok(v),
            other => Err(other.mismatch("reservations")),
        }
    }

    pub fn into_reservation(self) -> Result<Reservation, ApiError> {
        match self {
            Self::Reservation(v) => Ok(v),
            other => Err(other.mismatch("reservation")),
        }
    }

    pub fn into_profile(self) -> Result<Option<User>, ApiError> {
        match self {
            Self::Profile(v) => Ok(v),
            other => Err(other.mismatch("profile")),
        }
    }
}

pub struct AsmounClient {
    session: Arc<SessionStore>,
    auth: AuthService,
    activities: ActivityService,
    reservations: ReservationService,
    cache: QueryCache<QueryData>,
}

impl AsmounClient {
    /// Client over HTTP, starting logged out.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let session = Arc::new(SessionStore::new());
        let transport = HttpTransport::new(&config.api, Arc::clone(&session))?;
        tracing::debug!(base_url = %transport.base_url(), "Client ready");
        Ok(Self::with_transport(Arc::new(transport), session))
    }

    /// Client over any transport. `session` should be the same store the
    /// transport reads its bearer token from.
    pub fn with_transport(transport: Arc<dyn Transport>, session: Arc<SessionStore>) -> Self {
        Self {
            session,
            auth: AuthService::new(Arc::clone(&transport)),
            activities: ActivityService::new(Arc::clone(&transport)),
            reservations: ReservationService::new(transport),
            cache: QueryCache::new(),
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn cache(&self) -> &QueryCache<QueryData> {
        &self.cache
    }

    /// Loading/error/data state of one read, for rendering.
    pub fn snapshot(&self, key: QueryKey) -> QuerySnapshot<QueryData> {
        self.cache.snapshot(key)
    }

    // -------------------------------------------------------------------------
    // Cached reads
    // -------------------------------------------------------------------------

    pub async fn activities(&self) -> Result<Vec<Activity>, ApiError> {
        self.read(QueryKey::Activities).await?.into_activities()
    }

    pub async fn activity(&self, id: i64) -> Result<Activity, ApiError> {
        ensure_id(id, "Activity")?;
        self.read(QueryKey::Activity(id)).await?.into_activity()
    }

    pub async fn my_reservations(&self) -> Result<Vec<Reservation>, ApiError> {
        self.read(QueryKey::MyReservations).await?.into_reservations()
    }

    pub async fn all_reservations(&self) -> Result<Vec<Reservation>, ApiError> {
        self.read(QueryKey::AllReservations).await?.into_reservations()
    }

    pub async fn reservation(&self, id: i64) -> Result<Reservation, ApiError> {
        ensure_id(id, "Reservation")?;
        self.read(QueryKey::Reservation(id)).await?.into_reservation()
    }

    /// Profile of the logged-in user; `None` without a request while logged
    /// out. A profile carrying an email replaces the session's user.
    pub async fn profile(&self) -> Result<Option<User>, ApiError> {
        if !self.session.is_authenticated() {
            return Ok(None);
        }
        let profile = self.read(QueryKey::Profile).await?.into_profile()?;
        self.sync_session_user(&profile);
        Ok(profile)
    }

    /// Fetch `key` again even if cached data is fresh.
    pub async fn refetch(&self, key: QueryKey) -> Result<QueryData, ApiError> {
        if let Some(id) = key.param() {
            ensure_id(id, key.entity())?;
        }
        if key == QueryKey::Profile && !self.session.is_authenticated() {
            return Ok(QueryData::Profile(None));
        }
        let fetch = self.fetcher(key);
        let data = self.cache.refetch(key, move || fetch).await?;
        if let QueryData::Profile(profile) = &data {
            self.sync_session_user(profile);
        }
        Ok(data)
    }

    async fn read(&self, key: QueryKey) -> Result<QueryData, ApiError> {
        let fetch = self.fetcher(key);
        self.cache.fetch(key, move || fetch).await
    }

    /// The service call behind each key. Building it is free; it only runs
    /// if the cache decides to fetch.
    fn fetcher(&self, key: QueryKey) -> BoxFuture<'static, Result<QueryData, ApiError>> {
        match key {
            QueryKey::Activities => {
                let service = self.activities.clone();
                async move { service.list().await.map(QueryData::Activities) }.boxed()
            }
            QueryKey::Activity(id) => {
                let service = self.activities.clone();
                async move { service.get(id).await.map(QueryData::Activity) }.boxed()
            }
            QueryKey::MyReservations => {
                let service = self.reservations.clone();
                async move { service.mine().await.map(QueryData::Reservations) }.boxed()
            }
            QueryKey::AllReservations => {
                let service = self.reservations.clone();
                async move { service.all().await.map(QueryData::Reservations) }.boxed()
            }
            QueryKey::Reservation(id) => {
                let service = self.reservations.clone();
                async move { service.get(id).await.map(QueryData::Reservation) }.boxed()
            }
            QueryKey::Profile => {
                let service = self.auth.clone();
                async move { service.profile().await.map(QueryData::Profile) }.boxed()
            }
        }
    }

    fn sync_session_user(&self, profile: &Option<User>) {
        if let Some(user) = profile {
            if !user.email.is_empty() {
                self.session.set_user(user.clone());
            }
        }
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let response = self.auth.login(email, password).await?;
        self.session.login(response.token, response.user.clone());
        self.cache.apply(&Mutation::Login);
        Ok(response.user)
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, request: &RegisterRequest) -> Result<Option<User>, ApiError> {
        self.auth.register(request).await
    }

    /// End the session and forget every cached read.
    pub fn logout(&self) {
        self.session.logout();
        self.cache.clear();
    }

    /// Book `places` on an activity for the logged-in user.
    pub async fn create_reservation(
        &self,
        activity_id: i64,
        places: u32,
    ) -> Result<Reservation, ApiError> {
        ensure_id(activity_id, "Activity")?;
        let user = self
            .session
            .user()
            .ok_or_else(|| ApiError::validation("You must be logged in to book an activity"))?;

        let reservation = self
            .reservations
            .create(&CreateReservation {
                activity_id,
                number_of_places: places,
                tourist_id: user.id,
            })
            .await?;
        self.cache.apply(&Mutation::CreateReservation { activity_id });
        Ok(reservation)
    }

    pub async fn update_reservation(&self, id: i64, places: u32) -> Result<Reservation, ApiError> {
        let known_activity = self.cached_activity_id(id);
        let reservation = self
            .reservations
            .update(id, &UpdateReservation { number_of_places: places })
            .await?;
        self.cache.apply(&Mutation::UpdateReservation {
            id,
            activity_id: reservation.booked_activity_id().or(known_activity),
        });
        Ok(reservation)
    }

    /// Confirm a pending reservation (accommodation/admin accounts).
    pub async fn validate_reservation(&self, id: i64) -> Result<Reservation, ApiError> {
        let reservation = self.reservations.validate(id).await?;
        self.cache.apply(&Mutation::ValidateReservation { id });
        Ok(reservation)
    }

    pub async fn cancel_reservation(&self, id: i64) -> Result<(), ApiError> {
        let activity_id = self.cached_activity_id(id);
        self.reservations.delete(id).await?;
        self.cache.apply(&Mutation::DeleteReservation { id, activity_id });
        Ok(())
    }

    /// Activity booked by a reservation, if any cached read knows it.
    fn cached_activity_id(&self, reservation_id: i64) -> Option<i64> {
        if let Some(QueryData::Reservation(r)) =
            self.cache.snapshot(QueryKey::Reservation(reservation_id)).data
        {
            if let Some(id) = r.booked_activity_id() {
                return Some(id);
            }
        }
        [QueryKey::MyReservations, QueryKey::AllReservations]
            .into_iter()
            .find_map(|key| match self.cache.snapshot(key).data {
                Some(QueryData::Reservations(list)) => list
                    .into_iter()
                    .find(|r| r.id == reservation_id)
                    .and_then(|r| r.booked_activity_id()),
                _ => None,
            })
    }
}
