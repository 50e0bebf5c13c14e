//! Response normalization.
//!
//! The backend answers in two dialects: canonical English keys
//! (`title`, `availablePlaces`, ...) and French-localized ones (`titre`,
//! `places_disponibles`, `placesDisponibles`, ...), sometimes mixed in one
//! payload. Every canonical field has an ordered list of accepted source
//! keys below; the first non-null one wins. Keys outside those lists are
//! carried through in the record's `extra` map.
//!
//! All functions here are pure. A `null` or non-object payload yields `None`.

mod fields;

use serde_json::Value;

use crate::error::ApiError;
use crate::models::{Activity, ActivityStatus, Reservation, ReservationStatus, User, UserRole};
use fields::RawRecord;

pub const ID: &[&str] = &["id"];

pub const ACTIVITY_TITLE: &[&str] = &["title", "titre"];
pub const ACTIVITY_DESCRIPTION: &[&str] = &["description"];
pub const ACTIVITY_CATEGORY: &[&str] = &["category", "catégorie", "categorie"];
pub const ACTIVITY_DATE_START: &[&str] = &["dateStart", "date_debut", "dateDebut"];
pub const ACTIVITY_DURATION: &[&str] = &["duration", "duree", "durée"];
pub const ACTIVITY_MEETING_POINT: &[&str] =
    &["meetingPoint", "point_rencontre", "pointRencontre", "lieu"];
pub const ACTIVITY_TOTAL_PLACES: &[&str] =
    &["totalPlaces", "nombre_places_total", "nombrePlacesTotal"];
pub const ACTIVITY_AVAILABLE_PLACES: &[&str] =
    &["availablePlaces", "places_disponibles", "placesDisponibles"];
pub const ACTIVITY_PRICE: &[&str] = &["price", "prix"];
pub const STATUS: &[&str] = &["status", "statut"];

pub const RESERVATION_PLACES: &[&str] =
    &["numberOfPlaces", "nombre_participants", "nombreParticipants"];
pub const RESERVATION_TOTAL_PRICE: &[&str] = &["totalPrice", "montant_total", "montantTotal"];
pub const RESERVATION_CREATED_AT: &[&str] =
    &["createdAt", "date_reservation", "dateReservation"];
pub const RESERVATION_ACTIVITY: &[&str] = &["activity", "activité", "Activity"];
pub const RESERVATION_ACTIVITY_ID: &[&str] =
    &["activityId", "activite_id", "activiteId", "activity_id"];
pub const RESERVATION_TOURIST_ID: &[&str] =
    &["touristId", "touriste_id", "touristeId", "tourist_id"];

pub const USER_EMAIL: &[&str] = &["email"];
pub const USER_NAME: &[&str] = &["name", "nom"];
pub const USER_TYPE: &[&str] = &["type"];
pub const USER_ROLE: &[&str] = &["role"];

pub fn normalize_activity(raw: &Value) -> Option<Activity> {
    let mut record = RawRecord::from_value(raw)?;

    let mut available_places = record.take_u32(ACTIVITY_AVAILABLE_PLACES).unwrap_or(0);
    // Without a total, the places still open are all we know of capacity.
    let total_places = record
        .take_u32(ACTIVITY_TOTAL_PLACES)
        .unwrap_or(available_places);
    if available_places > total_places {
        tracing::warn!(
            available = available_places,
            total = total_places,
            "availablePlaces exceeds totalPlaces, clamping"
        );
        available_places = total_places;
    }

    Some(Activity {
        id: record.take_i64(ID).unwrap_or_default(),
        title: record.take_string(ACTIVITY_TITLE).unwrap_or_default(),
        description: record.take_string(ACTIVITY_DESCRIPTION).unwrap_or_default(),
        category: record.take_string(ACTIVITY_CATEGORY).unwrap_or_default(),
        date_start: record.take_datetime(ACTIVITY_DATE_START),
        duration: record.take_u32(ACTIVITY_DURATION).unwrap_or(0),
        meeting_point: record.take_string(ACTIVITY_MEETING_POINT).unwrap_or_default(),
        total_places,
        available_places,
        price: record.take_f64(ACTIVITY_PRICE).unwrap_or(0.0).max(0.0),
        status: record
            .take_string(STATUS)
            .map(ActivityStatus::from)
            .unwrap_or_default(),
        extra: record.into_extra(),
    })
}

pub fn normalize_reservation(raw: &Value) -> Option<Reservation> {
    let mut record = RawRecord::from_value(raw)?;

    let activity = record
        .take(RESERVATION_ACTIVITY)
        .and_then(|v| normalize_activity(&v));
    let activity_id = record
        .take_i64(RESERVATION_ACTIVITY_ID)
        .or_else(|| activity.as_ref().map(|a| a.id));

    Some(Reservation {
        id: record.take_i64(ID).unwrap_or_default(),
        number_of_places: record.take_u32(RESERVATION_PLACES).unwrap_or(0),
        total_price: record.take_f64(RESERVATION_TOTAL_PRICE).unwrap_or(0.0),
        status: record
            .take_string(STATUS)
            .map(ReservationStatus::from)
            .unwrap_or_default(),
        created_at: record.take_datetime(RESERVATION_CREATED_AT),
        activity_id,
        tourist_id: record.take_i64(RESERVATION_TOURIST_ID),
        activity,
        extra: record.into_extra(),
    })
}

pub fn normalize_user(raw: &Value) -> Option<User> {
    let mut record = RawRecord::from_value(raw)?;

    let backend_type = record.take_string(USER_TYPE);
    let role = record.take_string(USER_ROLE);
    Some(User {
        id: record.take_i64(ID).unwrap_or_default(),
        email: record.take_string(USER_EMAIL).unwrap_or_default(),
        name: record.take_string(USER_NAME).unwrap_or_default(),
        role: derive_role(backend_type, role),
        extra: record.into_extra(),
    })
}

/// A recognised `type` wins; otherwise the existing `role`, then the raw
/// `type`, are kept as they are.
fn derive_role(backend_type: Option<String>, role: Option<String>) -> Option<UserRole> {
    if let Some(mapped) = backend_type.as_deref().and_then(UserRole::from_backend) {
        return Some(mapped);
    }
    role.or(backend_type).map(UserRole::from)
}

/// Unwrap `{"<key>": [...]}` or accept a bare array.
fn list_payload<'a>(body: &'a Value, key: &str) -> Result<&'a Vec<Value>, ApiError> {
    let data = match body.get(key) {
        Some(inner) if !inner.is_null() => inner,
        _ => body,
    };
    data.as_array()
        .ok_or_else(|| ApiError::decode(format!("Expected a list of {}", key)))
}

/// Unwrap `{"<key>": {...}}` or accept the object itself.
pub fn entity_payload<'a>(body: &'a Value, key: &str) -> &'a Value {
    match body.get(key) {
        Some(inner) if inner.is_object() => inner,
        _ => body,
    }
}

pub fn activity_list(body: &Value) -> Result<Vec<Activity>, ApiError> {
    Ok(list_payload(body, "activities")?
        .iter()
        .filter_map(normalize_activity)
        .collect())
}

pub fn reservation_list(body: &Value) -> Result<Vec<Reservation>, ApiError> {
    Ok(list_payload(body, "reservations")?
        .iter()
        .filter_map(normalize_reservation)
        .collect())
}

/// Login and profile responses nest the user under `user` on some routes.
pub fn user_payload(body: &Value) -> &Value {
    entity_payload(body, "user")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn english_activity() -> Value {
        json!({
            "id": 7,
            "title": "Randonnée Paradise Valley",
            "description": "Piscines naturelles",
            "category": "nature",
            "dateStart": "2026-05-01T08:00:00Z",
            "duration": 240,
            "meetingPoint": "Aourir",
            "totalPlaces": 12,
            "availablePlaces": 5,
            "price": 300,
            "status": "published",
            "imageUrl": "https://cdn.example/pv.jpg"
        })
    }

    fn french_activity() -> Value {
        json!({
            "id": 7,
            "titre": "Randonnée Paradise Valley",
            "description": "Piscines naturelles",
            "catégorie": "nature",
            "date_debut": "2026-05-01 08:00:00",
            "durée": 240,
            "point_rencontre": "Aourir",
            "nombre_places_total": 12,
            "places_disponibles": 5,
            "prix": "300.00",
            "statut": "publiée",
            "imageUrl": "https://cdn.example/pv.jpg"
        })
    }

    #[test]
    fn test_both_dialects_yield_identical_activity() {
        let en = normalize_activity(&english_activity()).unwrap();
        let fr = normalize_activity(&french_activity()).unwrap();
        assert_eq!(en, fr);
        assert_eq!(en.title, "Randonnée Paradise Valley");
        assert_eq!(en.available_places, 5);
        assert_eq!(en.price, 300.0);
        assert_eq!(en.status, ActivityStatus::Published);
        assert_eq!(en.extra.get("imageUrl"), Some(&json!("https://cdn.example/pv.jpg")));
        assert_eq!(en.extra.len(), 1);
    }

    #[test]
    fn test_camel_case_french_keys() {
        let activity = normalize_activity(&json!({
            "id": 3,
            "titre": "Quad",
            "dateDebut": "2026-06-10",
            "nombrePlacesTotal": 8,
            "placesDisponibles": 2
        }))
        .unwrap();
        assert_eq!(activity.total_places, 8);
        assert_eq!(activity.available_places, 2);
        assert!(activity.date_start.is_some());
        assert_eq!(activity.status, ActivityStatus::Draft);
    }

    #[test]
    fn test_normalizing_canonical_activity_is_identity() {
        let first = normalize_activity(&french_activity()).unwrap();
        let again = normalize_activity(&serde_json::to_value(&first).unwrap()).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn test_missing_fields_default_without_error() {
        let activity = normalize_activity(&json!({ "id": 1 })).unwrap();
        assert_eq!(activity.title, "");
        assert_eq!(activity.date_start, None);
        assert_eq!(activity.price, 0.0);
        assert!(activity.extra.is_empty());
    }

    #[test]
    fn test_available_places_clamped_to_total() {
        let activity = normalize_activity(&json!({
            "id": 1,
            "totalPlaces": 4,
            "availablePlaces": 9
        }))
        .unwrap();
        assert_eq!(activity.available_places, 4);
    }

    #[test]
    fn test_missing_total_defaults_to_available_places() {
        let first = normalize_activity(&json!({ "id": 1, "availablePlaces": 5 })).unwrap();
        assert_eq!(first.total_places, 5);
        assert_eq!(first.available_places, 5);

        let again = normalize_activity(&serde_json::to_value(&first).unwrap()).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn test_null_payload_is_none() {
        assert!(normalize_activity(&Value::Null).is_none());
        assert!(normalize_reservation(&Value::Null).is_none());
        assert!(normalize_user(&Value::Null).is_none());
        assert!(normalize_user(&json!("oops")).is_none());
    }

    #[test]
    fn test_reservation_dialects() {
        let fr = normalize_reservation(&json!({
            "id": 11,
            "nombre_participants": 2,
            "montant_total": "600.00",
            "statut": "en_attente",
            "date_reservation": "2026-04-20T10:00:00Z",
            "touriste_id": 3,
            "Activity": { "id": 7, "titre": "Surf", "prix": "300.00" }
        }))
        .unwrap();
        let en = normalize_reservation(&json!({
            "id": 11,
            "numberOfPlaces": 2,
            "totalPrice": 600,
            "status": "pending",
            "createdAt": "2026-04-20T10:00:00Z",
            "touristId": 3,
            "activity": { "id": 7, "title": "Surf", "price": 300 }
        }))
        .unwrap();
        assert_eq!(fr, en);
        assert_eq!(fr.activity_id, Some(7));
        assert_eq!(fr.activity.as_ref().map(|a| a.title.as_str()), Some("Surf"));
        assert_eq!(fr.total_price, 600.0);
        assert_eq!(fr.status, ReservationStatus::Pending);
    }

    #[test]
    fn test_reservation_idempotent() {
        let first = normalize_reservation(&json!({
            "id": 4,
            "nombreParticipants": 3,
            "montantTotal": 900,
            "statut": "confirmée",
            "activiteId": 9,
            "paymentRef": "PAY-1"
        }))
        .unwrap();
        assert_eq!(first.activity_id, Some(9));
        assert_eq!(first.extra.get("paymentRef"), Some(&json!("PAY-1")));
        let again = normalize_reservation(&serde_json::to_value(&first).unwrap()).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn test_user_role_from_type() {
        for (raw_type, expected) in [
            ("hébergement", UserRole::Accommodation),
            ("accommodation", UserRole::Accommodation),
            ("touriste", UserRole::Tourist),
            ("tourist", UserRole::Tourist),
            ("admin", UserRole::Admin),
            ("administrateur", UserRole::Admin),
        ] {
            let user = normalize_user(&json!({ "id": 1, "type": raw_type })).unwrap();
            assert_eq!(user.role, Some(expected), "type {}", raw_type);
        }
    }

    #[test]
    fn test_user_role_falls_back_verbatim() {
        let user = normalize_user(&json!({ "id": 1, "type": "guide", "role": "organisateur" }))
            .unwrap();
        assert_eq!(user.role, Some(UserRole::Other("organisateur".to_string())));

        let user = normalize_user(&json!({ "id": 1, "type": "guide" })).unwrap();
        assert_eq!(user.role, Some(UserRole::Other("guide".to_string())));

        let user = normalize_user(&json!({ "id": 1 })).unwrap();
        assert_eq!(user.role, None);
    }

    #[test]
    fn test_user_name_and_idempotence() {
        let user = normalize_user(&json!({
            "id": 5,
            "email": "a@b.com",
            "nom": "Amina",
            "type": "touriste",
            "phone": "+212600000000"
        }))
        .unwrap();
        assert_eq!(user.name, "Amina");
        assert_eq!(user.role, Some(UserRole::Tourist));
        assert_eq!(user.extra.len(), 1);

        let again = normalize_user(&serde_json::to_value(&user).unwrap()).unwrap();
        assert_eq!(user, again);
    }

    #[test]
    fn test_list_envelopes() {
        let wrapped = json!({ "activities": [english_activity(), null] });
        assert_eq!(activity_list(&wrapped).unwrap().len(), 1);

        let bare = json!([french_activity()]);
        assert_eq!(activity_list(&bare).unwrap()[0].id, 7);

        let reservations = json!({ "reservations": [{ "id": 1 }, { "id": 2 }] });
        assert_eq!(reservation_list(&reservations).unwrap().len(), 2);

        let err = activity_list(&json!({ "message": "ok" })).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Decode);
    }

    #[test]
    fn test_entity_envelopes() {
        let nested = json!({ "token": "t", "user": { "id": 1 } });
        assert_eq!(user_payload(&nested), &json!({ "id": 1 }));

        let flat = json!({ "id": 2, "email": "x@y.z" });
        assert_eq!(user_payload(&flat), &flat);

        let created = json!({ "message": "Réservation créée", "reservation": { "id": 9 } });
        assert_eq!(entity_payload(&created, "reservation"), &json!({ "id": 9 }));
    }
}
