//! Activity model and the lookups screens derive from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ActivityStatus {
    #[default]
    Draft,
    Published,
    Full,
    Cancelled,
}

impl std::fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Published => write!(f, "published"),
            Self::Full => write!(f, "full"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl From<String> for ActivityStatus {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "published" | "publiée" | "publiee" | "publié" | "publie" => Self::Published,
            "full" | "complet" | "complète" | "complete" => Self::Full,
            "cancelled" | "canceled" | "annulée" | "annulee" | "annulé" | "annule" => {
                Self::Cancelled
            }
            _ => Self::Draft,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Free-text label, also drives [`ActivityCategory`]
    #[serde(default)]
    pub category: String,
    pub date_start: Option<DateTime<Utc>>,
    /// Duration in minutes
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub meeting_point: String,
    #[serde(default)]
    pub total_places: u32,
    #[serde(default)]
    pub available_places: u32,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub status: ActivityStatus,
    /// Fields the client does not model, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Activity {
    pub fn category_kind(&self) -> ActivityCategory {
        ActivityCategory::from_label(&self.category)
    }

    /// Activities shown in the catalogue: published ones and full ones.
    pub fn is_listed(&self) -> bool {
        matches!(self.status, ActivityStatus::Published | ActivityStatus::Full)
    }

    pub fn is_full(&self) -> bool {
        self.status == ActivityStatus::Full || self.available_places == 0
    }

    /// Case-insensitive match on title, category and description.
    /// An empty query matches everything.
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        [&self.title, &self.category, &self.description]
            .iter()
            .any(|field| field.to_lowercase().contains(&query))
    }

    /// Clamp a requested place count to what can be booked right now.
    pub fn clamp_places(&self, requested: u32) -> u32 {
        requested.clamp(1, self.available_places.max(1))
    }

    /// Price shown before submitting a booking. The persisted total always
    /// comes from the server's `totalPrice`.
    pub fn preview_total(&self, places: u32) -> f64 {
        self.price * f64::from(places)
    }

    /// Human readable duration, e.g. `45 min`, `2h`, `1h 30min`.
    pub fn duration_label(&self) -> String {
        format_duration(self.duration)
    }
}

pub fn format_duration(minutes: u32) -> String {
    if minutes < 60 {
        return format!("{} min", minutes);
    }
    let hours = minutes / 60;
    let mins = minutes % 60;
    if mins > 0 {
        format!("{}h {}min", hours, mins)
    } else {
        format!("{}h", hours)
    }
}

/// Category buckets recognised from the free-text label, in either language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityCategory {
    Adventure,
    Culture,
    Nature,
    Sport,
    Food,
    Music,
    Beach,
    Desert,
    City,
    Other,
}

impl ActivityCategory {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "adventure" | "aventure" => Self::Adventure,
            "culture" | "cultural" => Self::Culture,
            "nature" => Self::Nature,
            "sport" | "sports" => Self::Sport,
            "food" | "gastronomie" => Self::Food,
            "music" | "musique" => Self::Music,
            "beach" | "plage" => Self::Beach,
            "desert" | "désert" => Self::Desert,
            "city" | "ville" => Self::City,
            _ => Self::Other,
        }
    }

    /// Icon name in the Ionicons set
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Adventure => "compass",
            Self::Culture => "library",
            Self::Nature => "leaf",
            Self::Sport => "fitness",
            Self::Food => "restaurant",
            Self::Music => "musical-notes",
            Self::Beach => "sunny",
            Self::Desert => "sunny-outline",
            Self::City => "business",
            Self::Other => "star",
        }
    }

    /// Accent color as a hex string
    pub fn color(&self) -> &'static str {
        match self {
            Self::Adventure => "#f59e0b",
            Self::Culture => "#8b5cf6",
            Self::Nature => "#10b981",
            Self::Sport => "#ef4444",
            Self::Food => "#f97316",
            Self::Music => "#ec4899",
            Self::Beach => "#06b6d4",
            Self::Desert => "#eab308",
            Self::City => "#6366f1",
            Self::Other => "#2563eb",
        }
    }
}
