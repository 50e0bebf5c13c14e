//! Reservation model and request DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Activity;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ReservationStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl From<String> for ReservationStatus {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "confirmed" | "validated" | "confirmée" | "confirmee" | "confirmé" | "confirme"
            | "validée" | "validee" | "validé" | "valide" => Self::Confirmed,
            "cancelled" | "canceled" | "annulée" | "annulee" | "annulé" | "annule" => {
                Self::Cancelled
            }
            _ => Self::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: i64,
    #[serde(default)]
    pub number_of_places: u32,
    /// Server-computed total; never recomputed on the client
    #[serde(default)]
    pub total_price: f64,
    #[serde(default)]
    pub status: ReservationStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub activity_id: Option<i64>,
    pub tourist_id: Option<i64>,
    /// Snapshot of the booked activity when the backend embeds it
    pub activity: Option<Activity>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Reservation {
    /// Id of the booked activity, from the explicit field or the snapshot.
    pub fn booked_activity_id(&self) -> Option<i64> {
        self.activity_id
            .or_else(|| self.activity.as_ref().map(|a| a.id))
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == ReservationStatus::Cancelled
    }

    /// Owners may change or cancel a booking until it is cancelled.
    pub fn is_editable(&self) -> bool {
        !self.is_cancelled()
    }
}

/// Body of `POST /reservations`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservation {
    pub activity_id: i64,
    pub number_of_places: u32,
    pub tourist_id: i64,
}

/// Body of `PUT /reservations/{id}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReservation {
    pub number_of_places: u32,
}

/// Body of `PATCH /reservations/{id}`
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    pub status: ReservationStatus,
}

impl StatusUpdate {
    pub fn confirmed() -> Self {
        Self {
            status: ReservationStatus::Confirmed,
        }
    }
}
