//! Which cached reads each mutation makes stale.
//!
//! Keep this table in sync with the mutations the client exposes: a new
//! write that changes server state must list every key whose data it can
//! change, including keys of other entities (booking places changes the
//! activity's `availablePlaces`).

use super::QueryKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Login,
    CreateReservation { activity_id: i64 },
    UpdateReservation { id: i64, activity_id: Option<i64> },
    ValidateReservation { id: i64 },
    DeleteReservation { id: i64, activity_id: Option<i64> },
}

impl Mutation {
    pub fn affected_keys(&self) -> Vec<QueryKey> {
        match *self {
            Mutation::Login => vec![
                QueryKey::Profile,
                QueryKey::MyReservations,
                QueryKey::AllReservations,
            ],
            Mutation::CreateReservation { activity_id } => vec![
                QueryKey::MyReservations,
                QueryKey::AllReservations,
                QueryKey::Activity(activity_id),
                QueryKey::Activities,
            ],
            Mutation::UpdateReservation { id, activity_id } => {
                let mut keys = vec![
                    QueryKey::Reservation(id),
                    QueryKey::MyReservations,
                    QueryKey::AllReservations,
                ];
                keys.extend(Self::activity_keys(activity_id));
                keys
            }
            Mutation::ValidateReservation { id } => vec![
                QueryKey::Reservation(id),
                QueryKey::MyReservations,
                QueryKey::AllReservations,
            ],
            Mutation::DeleteReservation { id, activity_id } => {
                let mut keys = vec![
                    QueryKey::Reservation(id),
                    QueryKey::MyReservations,
                    QueryKey::AllReservations,
                ];
                keys.extend(Self::activity_keys(activity_id));
                keys
            }
        }
    }

    /// Entities to invalidate wholesale: a write that moved place counts on
    /// an activity the caller could not identify makes every cached
    /// activity detail suspect.
    pub fn affected_entities(&self) -> Vec<&'static str> {
        match *self {
            Mutation::UpdateReservation { activity_id: None, .. }
            | Mutation::DeleteReservation { activity_id: None, .. } => {
                vec!["activity", "activities"]
            }
            _ => Vec::new(),
        }
    }

    /// Place counts changed on the activity: its detail and the catalogue.
    fn activity_keys(activity_id: Option<i64>) -> Vec<QueryKey> {
        match activity_id {
            Some(id) => vec![QueryKey::Activity(id), QueryKey::Activities],
            None => Vec::new(),
        }
    }
}
