// Lovi - ui/theme.rs
//
// Line class colours, the log view font and layout constants.
// No dependencies on app state or business logic.

use crate::core::model::{LineClass, ViewFont};
use egui::{Color32, FontFamily, FontId};

/// Text colour for a line class. Normal lines use the visuals' default.
pub fn class_colour(class: LineClass, dark_mode: bool) -> Option<Color32> {
    match (class, dark_mode) {
        (LineClass::Error, true) => Some(Color32::from_rgb(248, 113, 113)), // Red 400
        (LineClass::Error, false) => Some(Color32::from_rgb(220, 38, 38)),  // Red 600
        (LineClass::Warning, true) => Some(Color32::from_rgb(96, 165, 250)), // Blue 400
        (LineClass::Warning, false) => Some(Color32::from_rgb(37, 99, 235)), // Blue 600
        (LineClass::Normal, _) => None,
    }
}

/// Font the log view draws its lines with.
pub fn view_font(font: ViewFont, size: f32) -> FontId {
    let family = match font {
        ViewFont::Fixed => FontFamily::Monospace,
        ViewFont::Proportional => FontFamily::Proportional,
    };
    FontId::new(size, family)
}

/// Bell marker shown next to change notices.
pub const BELL_COLOUR: Color32 = Color32::from_rgb(234, 179, 8); // Yellow 500

pub const FILTERS_WINDOW_WIDTH: f32 = 380.0;
pub const FONT_WINDOW_WIDTH: f32 = 260.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_lines_are_not_tinted() {
        assert!(class_colour(LineClass::Normal, true).is_none());
        assert!(class_colour(LineClass::Normal, false).is_none());
    }

    #[test]
    fn test_view_font_maps_family_and_size() {
        assert_eq!(
            view_font(ViewFont::Fixed, 12.0),
            FontId::new(12.0, FontFamily::Monospace)
        );
        assert_eq!(view_font(ViewFont::Proportional, 16.0).family, FontFamily::Proportional);
    }

    #[test]
    fn test_errors_and_warnings_differ() {
        for dark in [true, false] {
            assert_ne!(
                class_colour(LineClass::Error, dark),
                class_colour(LineClass::Warning, dark)
            );
        }
    }
}
