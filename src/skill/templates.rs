//! Response formatter - named text templates for speech, cards and the display
//!
//! Placeholders are `{temperature}`, `{humidity}` and `{pressure}`. Values
//! arrive already rounded; temperature and pressure always render with one
//! decimal and humidity as a whole number.

use serde::Deserialize;

use super::{Card, Response, CARD_TITLE};
use crate::error::{Error, Result};
use crate::shared::format_tenths;

/// Which answer to build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Launch,
    Environment,
    Temperature,
    Humidity,
    Pressure,
}

impl ResponseKind {
    pub const ALL: [ResponseKind; 5] = [
        ResponseKind::Launch,
        ResponseKind::Environment,
        ResponseKind::Temperature,
        ResponseKind::Humidity,
        ResponseKind::Pressure,
    ];
}

/// Rounded values available to a template
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Values {
    pub temperature: Option<f64>,
    pub humidity: Option<i64>,
    pub pressure: Option<f64>,
}

impl Values {
    /// Placeholder values covering exactly what `kind` is given at runtime
    fn sample(kind: ResponseKind) -> Self {
        let mut values = Self::default();
        if matches!(kind, ResponseKind::Environment | ResponseKind::Temperature) {
            values.temperature = Some(0.0);
        }
        if matches!(kind, ResponseKind::Environment | ResponseKind::Humidity) {
            values.humidity = Some(0);
        }
        if matches!(kind, ResponseKind::Environment | ResponseKind::Pressure) {
            values.pressure = Some(0.0);
        }
        values
    }
}

/// A rendered answer plus the text for the LED matrix, if any
#[derive(Debug, Clone, PartialEq)]
pub struct Formatted {
    pub response: Response,
    pub display: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Templates {
    pub hello: String,
    /// Spoken and reprompted when the intent is not understood
    pub prompt: String,
    /// Spoken when the sensors cannot be read
    pub apology: String,
    pub environment: String,
    pub environment_card: String,
    pub environment_display: String,
    pub temperature: String,
    pub temperature_card: String,
    pub temperature_display: String,
    pub humidity: String,
    pub humidity_card: String,
    pub humidity_display: String,
    pub pressure: String,
    pub pressure_card: String,
    pub pressure_display: String,
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            hello: "Hello! I can tell you the temperature, humidity and pressure \
                    measured by your Raspberry Pi."
                .to_string(),
            prompt: "You can ask me for the temperature, the humidity, the pressure \
                     or the whole environment."
                .to_string(),
            apology: "Sorry, I could not read the sensors right now.".to_string(),
            environment: "The temperature is {temperature} degrees, the humidity is \
                          {humidity} percent and the pressure is {pressure} millibars."
                .to_string(),
            environment_card: "Temperature: {temperature}°C\nHumidity: {humidity}%\n\
                               Pressure: {pressure} mbar"
                .to_string(),
            environment_display: "{temperature}C {humidity}% {pressure}mbar".to_string(),
            temperature: "The temperature is {temperature} degrees.".to_string(),
            temperature_card: "Temperature: {temperature}°C".to_string(),
            temperature_display: "{temperature}C".to_string(),
            humidity: "The humidity is {humidity} percent.".to_string(),
            humidity_card: "Humidity: {humidity}%".to_string(),
            humidity_display: "{humidity}%".to_string(),
            pressure: "The pressure is {pressure} millibars.".to_string(),
            pressure_card: "Pressure: {pressure} mbar".to_string(),
            pressure_display: "{pressure}mbar".to_string(),
        }
    }
}

impl Templates {
    /// Build the answer for `kind`
    pub fn format(&self, kind: ResponseKind, values: &Values) -> Result<Formatted> {
        let (speech, card, display) = match kind {
            ResponseKind::Launch => (&self.hello, &self.hello, None),
            ResponseKind::Environment => (
                &self.environment,
                &self.environment_card,
                Some(&self.environment_display),
            ),
            ResponseKind::Temperature => (
                &self.temperature,
                &self.temperature_card,
                Some(&self.temperature_display),
            ),
            ResponseKind::Humidity => (
                &self.humidity,
                &self.humidity_card,
                Some(&self.humidity_display),
            ),
            ResponseKind::Pressure => (
                &self.pressure,
                &self.pressure_card,
                Some(&self.pressure_display),
            ),
        };

        Ok(Formatted {
            response: Response {
                spoken_text: render(speech, values)?,
                card: Some(Card {
                    title: CARD_TITLE.to_string(),
                    body: render(card, values)?,
                }),
                reprompt: None,
            },
            display: display.map(|t| render(t, values)).transpose()?,
        })
    }

    /// Generic reprompt for intents we cannot handle; keeps the session open
    pub fn reprompt(&self) -> Response {
        Response {
            spoken_text: self.prompt.clone(),
            card: None,
            reprompt: Some(self.prompt.clone()),
        }
    }

    /// Generic apology after a failed read, without a card
    pub fn apology(&self) -> Response {
        Response {
            spoken_text: self.apology.clone(),
            card: None,
            reprompt: None,
        }
    }

    /// Check every template only uses the values its kind provides
    pub fn validate(&self) -> Result<()> {
        for kind in ResponseKind::ALL {
            self.format(kind, &Values::sample(kind))?;
        }
        render(&self.prompt, &Values::default())?;
        render(&self.apology, &Values::default())?;
        Ok(())
    }
}

/// Substitute `{name}` placeholders
pub fn render(template: &str, values: &Values) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return Ok(out);
        };

        let name = &after[..end];
        let value = match name {
            "temperature" => values.temperature.map(format_tenths),
            "humidity" => values.humidity.map(|h| h.to_string()),
            "pressure" => values.pressure.map(format_tenths),
            _ => {
                return Err(Error::Configuration(format!(
                    "unknown placeholder {{{}}} in template {:?}",
                    name, template
                )))
            }
        };
        let value = value.ok_or_else(|| {
            Error::Configuration(format!(
                "template {:?} needs a {} value that is not available here",
                template, name
            ))
        })?;

        out.push_str(&value);
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(temperature: f64, humidity: i64, pressure: f64) -> Values {
        Values {
            temperature: Some(temperature),
            humidity: Some(humidity),
            pressure: Some(pressure),
        }
    }

    #[test]
    fn test_render() {
        let v = values(0.0, 47, 1013.3);
        assert_eq!(render("{temperature}C", &v).unwrap(), "0.0C");
        assert_eq!(render("{humidity}%", &v).unwrap(), "47%");
        assert_eq!(render("at {pressure} mbar", &v).unwrap(), "at 1013.3 mbar");
        assert_eq!(render("no placeholders", &v).unwrap(), "no placeholders");
        assert_eq!(render("dangling {brace", &v).unwrap(), "dangling {brace");
    }

    #[test]
    fn test_render_unknown_placeholder() {
        assert!(matches!(
            render("{wind}", &Values::default()),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_render_missing_value() {
        let v = Values {
            temperature: Some(21.5),
            ..Default::default()
        };
        assert!(matches!(
            render("{temperature} and {humidity}", &v),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_format_launch() {
        let templates = Templates::default();
        let formatted = templates
            .format(ResponseKind::Launch, &Values::default())
            .unwrap();

        assert_eq!(formatted.response.spoken_text, templates.hello);
        let card = formatted.response.card.unwrap();
        assert_eq!(card.title, "RPi with SenseHAT");
        assert_eq!(card.body, templates.hello);
        assert_eq!(formatted.display, None);
    }

    #[test]
    fn test_format_environment() {
        let formatted = Templates::default()
            .format(ResponseKind::Environment, &values(22.4, 47, 1013.3))
            .unwrap();

        assert_eq!(
            formatted.response.spoken_text,
            "The temperature is 22.4 degrees, the humidity is 47 percent and the pressure is 1013.3 millibars."
        );
        assert_eq!(
            formatted.response.card.unwrap().body,
            "Temperature: 22.4°C\nHumidity: 47%\nPressure: 1013.3 mbar"
        );
        assert_eq!(formatted.display.as_deref(), Some("22.4C 47% 1013.3mbar"));
        assert_eq!(formatted.response.reprompt, None);
    }

    #[test]
    fn test_format_single_metrics() {
        let templates = Templates::default();
        let v = values(0.0, 47, 1013.3);

        let t = templates.format(ResponseKind::Temperature, &v).unwrap();
        assert_eq!(t.response.spoken_text, "The temperature is 0.0 degrees.");
        assert_eq!(t.display.as_deref(), Some("0.0C"));

        let h = templates.format(ResponseKind::Humidity, &v).unwrap();
        assert_eq!(h.response.spoken_text, "The humidity is 47 percent.");
        assert_eq!(h.display.as_deref(), Some("47%"));

        let p = templates.format(ResponseKind::Pressure, &v).unwrap();
        assert_eq!(p.response.card.unwrap().body, "Pressure: 1013.3 mbar");
        assert_eq!(p.display.as_deref(), Some("1013.3mbar"));
    }

    #[test]
    fn test_reprompt_and_apology() {
        let templates = Templates::default();

        let reprompt = templates.reprompt();
        assert_eq!(reprompt.reprompt.as_deref(), Some(templates.prompt.as_str()));
        assert!(reprompt.card.is_none());

        let apology = templates.apology();
        assert!(apology.card.is_none());
        assert!(apology.reprompt.is_none());
    }

    #[test]
    fn test_validate_defaults() {
        assert!(Templates::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_misplaced_value() {
        let templates = Templates {
            humidity: "Humidity {humidity}% at {temperature} degrees".to_string(),
            ..Default::default()
        };
        assert!(matches!(templates.validate(), Err(Error::Configuration(_))));

        let templates = Templates {
            hello: "Hello, it is {temperature} degrees".to_string(),
            ..Default::default()
        };
        assert!(matches!(templates.validate(), Err(Error::Configuration(_))));
    }
}
