//! Status code selection for oracle responses

use rand::Rng;

use crate::models::{FlightStatus, StatusRequest};

/// Decides which status an oracle reports for a request.
///
/// Called once per submission, from any task.
pub trait StatusPolicy: Send + Sync {
    fn choose(&self, request: &StatusRequest) -> FlightStatus;
}

/// Uniformly random multiple of ten in `0..=40`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomStatusPolicy;

const RANDOM_CHOICES: [FlightStatus; 5] = [
    FlightStatus::Unknown,
    FlightStatus::OnTime,
    FlightStatus::LateAirline,
    FlightStatus::LateWeather,
    FlightStatus::LateTechnical,
];

impl StatusPolicy for RandomStatusPolicy {
    fn choose(&self, _request: &StatusRequest) -> FlightStatus {
        RANDOM_CHOICES[rand::thread_rng().gen_range(0..RANDOM_CHOICES.len())]
    }
}

/// Always reports the same status.
#[derive(Debug, Clone, Copy)]
pub struct FixedStatusPolicy(pub FlightStatus);

impl StatusPolicy for FixedStatusPolicy {
    fn choose(&self, _request: &StatusRequest) -> FlightStatus {
        self.0
    }
}
