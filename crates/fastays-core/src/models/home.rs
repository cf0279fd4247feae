//! Home dashboard models.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeData {
    pub welcome_message: String,
    pub stats: HomeStats,
    #[serde(default)]
    pub recent_stays: Vec<Stay>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeStats {
    pub total_bookings: u32,
    pub active_stays: u32,
    pub completed_stays: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StayStatus {
    Upcoming,
    Active,
    Completed,
}

impl StayStatus {
    pub fn label(&self) -> &'static str {
        match self {
            StayStatus::Upcoming => "Upcoming",
            StayStatus::Active => "Active",
            StayStatus::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stay {
    pub id: String,
    pub title: String,
    pub location: String,
    pub check_in: String,
    pub check_out: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub status: StayStatus,
}

impl Stay {
    pub fn date_range(&self) -> String {
        format!("{} - {}", self.check_in, self.check_out)
    }

    pub fn price_display(&self) -> String {
        format!("${:.0}/night", self.price)
    }
}
