//! Actuators module - the Sense HAT LED matrix and the display queue feeding it

pub mod display;
pub mod led_matrix;
