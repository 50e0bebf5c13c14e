//! Reservations: the only resource the client creates and mutates.

use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::{CreateReservation, Reservation, StatusUpdate, UpdateReservation};
use crate::normalize::{entity_payload, normalize_reservation, reservation_list};
use crate::transport::{ensure_id, Transport};

#[derive(Clone)]
pub struct ReservationService {
    transport: Arc<dyn Transport>,
}

impl ReservationService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// `GET /reservations/my-reservations`
    pub async fn mine(&self) -> Result<Vec<Reservation>, ApiError> {
        let body = self
            .transport
            .request(Method::GET, "/reservations/my-reservations", None)
            .await?;
        reservation_list(&body)
    }

    /// `GET /reservations` (every booking, for accommodation/admin accounts)
    pub async fn all(&self) -> Result<Vec<Reservation>, ApiError> {
        let body = self.transport.request(Method::GET, "/reservations", None).await?;
        reservation_list(&body)
    }

    /// `GET /reservations/{id}`
    pub async fn get(&self, id: i64) -> Result<Reservation, ApiError> {
        ensure_id(id, "Reservation")?;
        let body = self
            .transport
            .request(Method::GET, &Self::path(id), None)
            .await?;
        Self::single(&body, id)
    }

    /// `POST /reservations`
    pub async fn create(&self, request: &CreateReservation) -> Result<Reservation, ApiError> {
        let body = serde_json::to_value(request)?;
        let response = self
            .transport
            .request(Method::POST, "/reservations", Some(body))
            .await?;
        let reservation = normalize_reservation(entity_payload(&response, "reservation"))
            .ok_or_else(|| ApiError::decode("Empty response for new reservation"))?;
        tracing::info!(
            reservation_id = reservation.id,
            activity_id = request.activity_id,
            places = request.number_of_places,
            "Reservation created"
        );
        Ok(reservation)
    }

    /// `PUT /reservations/{id}`
    pub async fn update(
        &self,
        id: i64,
        request: &UpdateReservation,
    ) -> Result<Reservation, ApiError> {
        ensure_id(id, "Reservation")?;
        let body = serde_json::to_value(request)?;
        let response = self
            .transport
            .request(Method::PUT, &Self::path(id), Some(body))
            .await?;
        tracing::info!(reservation_id = id, places = request.number_of_places, "Reservation updated");
        Self::single(&response, id)
    }

    /// `PATCH /reservations/{id}` with `{"status": "confirmed"}`
    pub async fn validate(&self, id: i64) -> Result<Reservation, ApiError> {
        ensure_id(id, "Reservation")?;
        let body = serde_json::to_value(StatusUpdate::confirmed())?;
        let response = self
            .transport
            .request(Method::PATCH, &Self::path(id), Some(body))
            .await?;
        tracing::info!(reservation_id = id, "Reservation confirmed");
        Self::single(&response, id)
    }

    /// `DELETE /reservations/{id}`
    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        ensure_id(id, "Reservation")?;
        self.transport
            .request(Method::DELETE, &Self::path(id), None)
            .await?;
        tracing::info!(reservation_id = id, "Reservation cancelled");
        Ok(())
    }

    fn path(id: i64) -> String {
        format!("/reservations/{}", id)
    }

    fn single(body: &Value, id: i64) -> Result<Reservation, ApiError> {
        normalize_reservation(entity_payload(body, "reservation"))
            .ok_or_else(|| ApiError::decode(format!("Empty response for reservation {}", id)))
    }
}
