//! Axis order and direction (`+axis=`), e.g. `enu`, `neu`, `esu`, `wnu`.
//!
//! The three letters describe what the stored x, y and z components mean. Projection
//! math always runs on east/north/up; an [`Axis`] converts to and from that order.

use crate::error::ProjError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Component {
    East,
    North,
    Up,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Slot {
    component: Component,
    sign: f64,
}

impl Slot {
    fn parse(c: char) -> Option<Self> {
        let (component, sign) = match c {
            'e' => (Component::East, 1.0),
            'w' => (Component::East, -1.0),
            'n' => (Component::North, 1.0),
            's' => (Component::North, -1.0),
            'u' => (Component::Up, 1.0),
            'd' => (Component::Up, -1.0),
            _ => return None,
        };
        Some(Self { component, sign })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Axis {
    slots: [Slot; 3],
}

impl Default for Axis {
    fn default() -> Self {
        Self::ENU
    }
}

impl Axis {
    pub const ENU: Axis = Axis {
        slots: [
            Slot { component: Component::East, sign: 1.0 },
            Slot { component: Component::North, sign: 1.0 },
            Slot { component: Component::Up, sign: 1.0 },
        ],
    };

    /// Parse a three-letter axis specification. The first two letters must name both
    /// horizontal directions, the third must be `u` or `d`.
    pub fn parse(spec: &str) -> Result<Self, ProjError> {
        let invalid = || ProjError::InvalidParameter(format!("axis={spec}"));
        let chars: Vec<char> = spec.trim().to_ascii_lowercase().chars().collect();
        if chars.len() != 3 {
            return Err(invalid());
        }
        let mut slots = [Axis::ENU.slots[0]; 3];
        for (slot, &c) in slots.iter_mut().zip(&chars) {
            *slot = Slot::parse(c).ok_or_else(invalid)?;
        }
        let horizontal = (slots[0].component, slots[1].component);
        let valid = matches!(
            horizontal,
            (Component::East, Component::North) | (Component::North, Component::East)
        ) && slots[2].component == Component::Up;
        if !valid {
            return Err(invalid());
        }
        Ok(Self { slots })
    }

    pub fn is_enu(&self) -> bool {
        *self == Self::ENU
    }

    /// Stored order → (east, north, up).
    pub fn to_enu(&self, stored: (f64, f64, f64)) -> (f64, f64, f64) {
        if self.is_enu() {
            return stored;
        }
        let values = [stored.0, stored.1, stored.2];
        let mut enu = [0.0; 3];
        for (slot, value) in self.slots.iter().zip(values) {
            enu[slot.component as usize] = slot.sign * value;
        }
        (enu[0], enu[1], enu[2])
    }

    /// (east, north, up) → stored order.
    pub fn from_enu(&self, enu: (f64, f64, f64)) -> (f64, f64, f64) {
        if self.is_enu() {
            return enu;
        }
        let enu = [enu.0, enu.1, enu.2];
        let [a, b, c] = self.slots.map(|slot| slot.sign * enu[slot.component as usize]);
        (a, b, c)
    }
}
