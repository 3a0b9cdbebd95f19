//! Skill module - intent dispatch, response templates and the Alexa wire format

pub mod alexa;
pub mod dispatcher;
pub mod templates;

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Title of every card shown in the companion app
pub const CARD_TITLE: &str = "RPi with SenseHAT";

/// Intents the skill answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentName {
    Launch,
    Environment,
    Temperature,
    Humidity,
    Pressure,
}

impl FromStr for IntentName {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "EnvironmentIntent" => Ok(IntentName::Environment),
            "TemperatureIntent" => Ok(IntentName::Temperature),
            "HumidityIntent" => Ok(IntentName::Humidity),
            "PressureIntent" => Ok(IntentName::Pressure),
            other => Err(Error::UnrecognizedIntent(other.to_string())),
        }
    }
}

impl fmt::Display for IntentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IntentName::Launch => "Launch",
            IntentName::Environment => "EnvironmentIntent",
            IntentName::Temperature => "TemperatureIntent",
            IntentName::Humidity => "HumidityIntent",
            IntentName::Pressure => "PressureIntent",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub title: String,
    pub body: String,
}

/// What the skill says back; without a reprompt the session ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub spoken_text: String,
    pub card: Option<Card>,
    pub reprompt: Option<String>,
}

impl Response {
    pub fn ends_session(&self) -> bool {
        self.reprompt.is_none()
    }
}
