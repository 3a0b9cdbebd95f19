//! Intent dispatcher - one synchronous handler per intent
//!
//! Each call reads fresh sensor values, formats the answer and, when the
//! display is enabled, queues the display text without waiting for it.

use std::sync::Arc;

use super::templates::{ResponseKind, Templates, Values};
use super::{IntentName, Response};
use crate::actuators::display::TextSink;
use crate::error::{Error, Result};
use crate::sensors::SensorReader;
use crate::shared::{round_tenths, truncate_percent};

pub struct Dispatcher {
    reader: SensorReader,
    templates: Templates,
    display: Option<Arc<dyn TextSink>>,
}

impl Dispatcher {
    /// `display` is `None` when the display is disabled
    pub fn new(
        reader: SensorReader,
        templates: Templates,
        display: Option<Arc<dyn TextSink>>,
    ) -> Self {
        Self {
            reader,
            templates,
            display,
        }
    }

    /// Answer a raw intent name from the platform
    pub fn respond_to(&self, intent: &str) -> Response {
        match intent.parse::<IntentName>() {
            Ok(name) => self.respond(name),
            Err(e) => self.recover(e),
        }
    }

    /// Answer a known intent, turning failures into spoken fallbacks
    pub fn respond(&self, intent: IntentName) -> Response {
        tracing::debug!("Handling {}", intent);
        self.dispatch(intent).unwrap_or_else(|e| self.recover(e))
    }

    /// Run the handler for `intent`
    pub fn dispatch(&self, intent: IntentName) -> Result<Response> {
        let (kind, values) = match intent {
            IntentName::Launch => (ResponseKind::Launch, Values::default()),
            IntentName::Environment => {
                let reading = self.reader.read_environment()?;
                (
                    ResponseKind::Environment,
                    Values {
                        temperature: Some(round_tenths(reading.temperature)),
                        humidity: Some(truncate_percent(reading.humidity)),
                        pressure: Some(round_tenths(reading.pressure)),
                    },
                )
            }
            IntentName::Temperature => (
                ResponseKind::Temperature,
                Values {
                    temperature: Some(round_tenths(self.reader.read_temperature()?)),
                    ..Default::default()
                },
            ),
            IntentName::Humidity => (
                ResponseKind::Humidity,
                Values {
                    humidity: Some(truncate_percent(self.reader.read_humidity()?)),
                    ..Default::default()
                },
            ),
            IntentName::Pressure => (
                ResponseKind::Pressure,
                Values {
                    pressure: Some(round_tenths(self.reader.read_pressure()?)),
                    ..Default::default()
                },
            ),
        };

        let formatted = self.templates.format(kind, &values)?;

        if let (Some(sink), Some(text)) = (&self.display, formatted.display) {
            sink.show(text);
        }

        Ok(formatted.response)
    }

    fn recover(&self, error: Error) -> Response {
        match error {
            Error::UnrecognizedIntent(name) => {
                tracing::info!("No handler for intent {:?}", name);
                self.templates.reprompt()
            }
            Error::HardwareUnavailable(msg) => {
                tracing::warn!("Sensor read failed: {}", msg);
                self.templates.apology()
            }
            Error::Configuration(msg) => {
                tracing::error!("Cannot build response: {}", msg);
                self.templates.apology()
            }
        }
    }

    pub fn templates(&self) -> &Templates {
        &self.templates
    }
}
