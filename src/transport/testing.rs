//! In-memory backend for tests.
//!
//! Speaks the French dialect on reads (like the production backend does for
//! most routes) and keeps enough state to check booking side effects:
//! available places go down on create and back up on cancel, and totals are
//! computed here, with a group discount the client cannot guess.

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Method;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::Transport;
use crate::error::ApiError;

pub(crate) const PASSWORD: &str = "x";

#[derive(Debug, Clone)]
struct FakeActivity {
    id: i64,
    title: String,
    category: String,
    total: u32,
    available: u32,
    price: f64,
    status: &'static str,
}

#[derive(Debug, Clone)]
struct FakeReservation {
    id: i64,
    activity_id: i64,
    tourist_id: i64,
    places: u32,
    total: f64,
    status: &'static str,
}

#[derive(Debug, Default)]
struct State {
    activities: BTreeMap<i64, FakeActivity>,
    reservations: BTreeMap<i64, FakeReservation>,
    next_reservation_id: i64,
    queued_failures: Vec<(u16, Value)>,
}

#[derive(Debug)]
pub(crate) struct FakeBackend {
    state: Mutex<State>,
    calls: Mutex<Vec<(Method, String)>>,
    delay: Mutex<Option<Duration>>,
    call_count: AtomicUsize,
}

/// Groups of three or more get 10% off.
fn server_total(price: f64, places: u32) -> f64 {
    let gross = price * f64::from(places);
    if places >= 3 {
        (gross * 0.9 * 100.0).round() / 100.0
    } else {
        gross
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        let mut state = State {
            next_reservation_id: 100,
            ..State::default()
        };
        for activity in [
            FakeActivity {
                id: 7,
                title: "Surf à Taghazout".to_string(),
                category: "sport".to_string(),
                total: 10,
                available: 10,
                price: 300.0,
                status: "publiée",
            },
            FakeActivity {
                id: 8,
                title: "Souk El Had".to_string(),
                category: "culture".to_string(),
                total: 20,
                available: 0,
                price: 80.0,
                status: "complet",
            },
            FakeActivity {
                id: 9,
                title: "Atelier poterie".to_string(),
                category: "culture".to_string(),
                total: 6,
                available: 6,
                price: 150.0,
                status: "brouillon",
            },
        ] {
            state.activities.insert(activity.id, activity);
        }

        Self {
            state: Mutex::new(state),
            calls: Mutex::new(Vec::new()),
            delay: Mutex::new(None),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Delay every response, to keep requests in flight.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock() = Some(delay);
        self
    }

    /// The next request fails with this status and body.
    pub fn fail_next(&self, status: u16, body: Value) {
        self.state.lock().queued_failures.push((status, body));
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn calls_to(&self, method: &Method, path: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|(m, p)| m == method && p == path)
            .count()
    }

    pub fn available_places(&self, activity_id: i64) -> Option<u32> {
        self.state
            .lock()
            .activities
            .get(&activity_id)
            .map(|a| a.available)
    }

    fn activity_json(activity: &FakeActivity) -> Value {
        json!({
            "id": activity.id,
            "titre": activity.title,
            "description": format!("{} avec guide local", activity.title),
            "catégorie": activity.category,
            "date_debut": "2026-05-01 09:00:00",
            "durée": 120,
            "point_rencontre": "Agadir",
            "nombre_places_total": activity.total,
            "places_disponibles": activity.available,
            "prix": format!("{:.2}", activity.price),
            "statut": activity.status,
        })
    }

    fn reservation_json(state: &State, reservation: &FakeReservation) -> Value {
        let activity = state.activities.get(&reservation.activity_id);
        json!({
            "id": reservation.id,
            "nombre_participants": reservation.places,
            "montant_total": format!("{:.2}", reservation.total),
            "statut": reservation.status,
            "date_reservation": "2026-04-20T10:00:00.000Z",
            "touriste_id": reservation.tourist_id,
            "activite_id": reservation.activity_id,
            "Activity": activity.map(|a| json!({
                "id": a.id,
                "titre": a.title,
                "prix": format!("{:.2}", a.price),
            })),
        })
    }

    fn not_found(what: &str) -> Result<Value, ApiError> {
        Err(ApiError::http(404, &json!({ "message": format!("{} introuvable", what) })))
    }

    fn route(&self, method: &Method, path: &str, body: Option<Value>) -> Result<Value, ApiError> {
        let mut state = self.state.lock();
        if !state.queued_failures.is_empty() {
            let (status, payload) = state.queued_failures.remove(0);
            return Err(ApiError::http(status, &payload));
        }

        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        let body = body.unwrap_or(Value::Null);

        match (method.as_str(), segments.as_slice()) {
            ("POST", ["auth", "login"]) => {
                if body["password"] != PASSWORD {
                    return Err(ApiError::http(
                        401,
                        &json!({ "message": "Email ou mot de passe incorrect" }),
                    ));
                }
                Ok(json!({
                    "token": "tok-3",
                    "user": {
                        "id": 3,
                        "email": body["email"],
                        "nom": "Amina",
                        "type": "touriste",
                    }
                }))
            }
            ("POST", ["auth", "register"]) => Ok(json!({
                "message": "Utilisateur créé",
                "user": {
                    "id": 4,
                    "email": body["email"],
                    "nom": body["nom"],
                    "type": body["type"],
                }
            })),
            ("GET", ["users", "profile"]) => Ok(json!({
                "user": {
                    "id": 3,
                    "email": "a@b.com",
                    "nom": "Amina Tazi",
                    "type": "touriste",
                }
            })),
            ("GET", ["activities"]) => Ok(json!({
                "activities": state.activities.values().map(Self::activity_json).collect::<Vec<_>>()
            })),
            ("GET", ["activities", id]) => {
                let id: i64 = id.parse().unwrap_or_default();
                match state.activities.get(&id) {
                    Some(activity) => Ok(Self::activity_json(activity)),
                    None => Self::not_found("Activité"),
                }
            }
            ("GET", ["reservations", "my-reservations"]) => Ok(Value::Array(
                state
                    .reservations
                    .values()
                    .filter(|r| r.tourist_id == 3)
                    .map(|r| Self::reservation_json(&state, r))
                    .collect(),
            )),
            ("GET", ["reservations"]) => Ok(json!({
                "reservations": state
                    .reservations
                    .values()
                    .map(|r| Self::reservation_json(&state, r))
                    .collect::<Vec<_>>()
            })),
            ("GET", ["reservations", id]) => {
                let id: i64 = id.parse().unwrap_or_default();
                match state.reservations.get(&id) {
                    Some(r) => Ok(Self::reservation_json(&state, r)),
                    None => Self::not_found("Réservation"),
                }
            }
            ("POST", ["reservations"]) => {
                let activity_id = body["activityId"].as_i64().unwrap_or_default();
                let places = body["numberOfPlaces"].as_u64().unwrap_or_default() as u32;
                let tourist_id = body["touristId"].as_i64().unwrap_or_default();
                let Some(activity) = state.activities.get_mut(&activity_id) else {
                    return Self::not_found("Activité");
                };
                if places == 0 || places > activity.available {
                    return Err(ApiError::http(
                        400,
                        &json!({ "message": "Nombre de places insuffisant" }),
                    ));
                }
                activity.available -= places;
                let total = server_total(activity.price, places);
                let id = state.next_reservation_id;
                state.next_reservation_id += 1;
                let reservation = FakeReservation {
                    id,
                    activity_id,
                    tourist_id,
                    places,
                    total,
                    status: "en_attente",
                };
                state.reservations.insert(id, reservation.clone());
                Ok(json!({
                    "message": "Réservation créée",
                    "reservation": Self::reservation_json(&state, &reservation),
                }))
            }
            ("PUT", ["reservations", id]) => {
                let id: i64 = id.parse().unwrap_or_default();
                let places = body["numberOfPlaces"].as_u64().unwrap_or_default() as u32;
                let Some(existing) = state.reservations.get(&id).cloned() else {
                    return Self::not_found("Réservation");
                };
                let Some(activity) = state.activities.get_mut(&existing.activity_id) else {
                    return Self::not_found("Activité");
                };
                let pool = activity.available + existing.places;
                if places == 0 || places > pool {
                    return Err(ApiError::http(
                        400,
                        &json!({ "message": "Nombre de places insuffisant" }),
                    ));
                }
                activity.available = pool - places;
                let total = server_total(activity.price, places);
                let updated = FakeReservation {
                    places,
                    total,
                    ..existing
                };
                state.reservations.insert(id, updated.clone());
                Ok(Self::reservation_json(&state, &updated))
            }
            ("PATCH", ["reservations", id]) => {
                let id: i64 = id.parse().unwrap_or_default();
                let Some(reservation) = state.reservations.get_mut(&id) else {
                    return Self::not_found("Réservation");
                };
                if body["status"] == "confirmed" {
                    reservation.status = "confirmée";
                }
                let reservation = reservation.clone();
                Ok(Self::reservation_json(&state, &reservation))
            }
            ("DELETE", ["reservations", id]) => {
                let id: i64 = id.parse().unwrap_or_default();
                let Some(removed) = state.reservations.remove(&id) else {
                    return Self::not_found("Réservation");
                };
                if let Some(activity) = state.activities.get_mut(&removed.activity_id) {
                    activity.available += removed.places;
                }
                Ok(json!({ "message": "Réservation supprimée" }))
            }
            _ => Err(ApiError::http(404, &json!({ "message": "Route introuvable" }))),
        }
    }
}

#[async_trait]
impl Transport for FakeBackend {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push((method.clone(), path.to_string()));

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.route(&method, path, body)
    }
}
