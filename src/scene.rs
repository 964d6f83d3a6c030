//! Draw-pass scene construction.
//!
//! Turns a contact-table snapshot into the list of indicator squares the
//! presentation chain fills each frame. Keeping this a pure function of
//! the table keeps the per-frame draw deterministic and testable without
//! a GPU.

use serde::{Deserialize, Serialize};

use crate::contact::ContactTable;
use crate::geometry::Rect;

/// Side length of a contact indicator square, in logical units.
pub const INDICATOR_SIDE: f64 = 40.0;

/// A straight-alpha RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::opaque(0.0, 0.0, 0.0);
    pub const BLUE: Color = Color::opaque(0.0, 0.0, 1.0);
    pub const RED: Color = Color::opaque(1.0, 0.0, 0.0);

    pub const fn opaque(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

/// The three colors a frame is built from.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    /// Frame clear color.
    pub background: Color,
    /// Fill for contacts that are tracked but not pressed.
    pub hover: Color,
    /// Fill for pressed contacts.
    pub pressed: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Color::BLACK,
            hover: Color::BLUE,
            pressed: Color::RED,
        }
    }
}

/// One indicator square to fill, with its brush selection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Indicator {
    pub rect: Rect,
    /// Selects the pressed brush over the hover brush.
    pub pressed: bool,
}

/// Build the indicator list for the current table snapshot.
///
/// Iteration order over contacts is unspecified; indicators only overdraw
/// with solid fills, so the produced set is what matters, not its order.
pub fn build_indicators(table: &ContactTable, side: f64) -> Vec<Indicator> {
    table
        .iter()
        .map(|contact| Indicator {
            rect: Rect::centered_square(contact.position, side),
            pressed: contact.pressed,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::DeviceKind;
    use crate::geometry::Point;

    fn table_with_two_contacts() -> ContactTable {
        let mut table = ContactTable::new();
        table
            .entered(1, DeviceKind::Touch, false, Point::new(100.0, 100.0))
            .unwrap();
        table
            .entered(2, DeviceKind::Pen, true, Point::new(30.0, 40.0))
            .unwrap();
        table
    }

    #[test]
    fn test_indicator_geometry() {
        let table = table_with_two_contacts();
        let indicators = build_indicators(&table, INDICATOR_SIDE);

        assert_eq!(indicators.len(), 2);

        let hover = indicators.iter().find(|i| !i.pressed).unwrap();
        assert_eq!(hover.rect, Rect::new(80.0, 80.0, 120.0, 120.0));

        let pressed = indicators.iter().find(|i| i.pressed).unwrap();
        assert_eq!(pressed.rect, Rect::new(10.0, 20.0, 50.0, 60.0));
    }

    #[test]
    fn test_indicator_set_is_determined_by_snapshot() {
        let table = table_with_two_contacts();

        let mut a = build_indicators(&table, INDICATOR_SIDE);
        let mut b = build_indicators(&table, INDICATOR_SIDE);

        // Sort both runs into a canonical order; the sets must match even
        // if the map iterates differently between runs.
        let key = |i: &Indicator| (i.rect.left.to_bits(), i.rect.top.to_bits());
        a.sort_by_key(key);
        b.sort_by_key(key);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_table_draws_nothing() {
        let table = ContactTable::new();
        assert!(build_indicators(&table, INDICATOR_SIDE).is_empty());
    }

    #[test]
    fn test_default_palette() {
        let palette = Palette::default();
        assert_eq!(palette.background, Color::BLACK);
        assert_eq!(palette.hover, Color::BLUE);
        assert_eq!(palette.pressed, Color::RED);
    }
}
