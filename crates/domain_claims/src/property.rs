//! Property metadata: affected rooms and water damage category

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::InputShapeError;
use crate::line_item::MAX_QUANTITY;

/// IICRC water damage category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WaterCategory {
    /// Category 1: clean water (supply line, rain)
    Clean,
    /// Category 2: gray water (appliance discharge)
    Gray,
    /// Category 3: black water (sewage, flood)
    Black,
}

impl WaterCategory {
    /// Numeric category as printed on estimates
    pub fn level(&self) -> u8 {
        match self {
            WaterCategory::Clean => 1,
            WaterCategory::Gray => 2,
            WaterCategory::Black => 3,
        }
    }
}

impl TryFrom<u8> for WaterCategory {
    type Error = InputShapeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(WaterCategory::Clean),
            2 => Ok(WaterCategory::Gray),
            3 => Ok(WaterCategory::Black),
            other => Err(InputShapeError::InvalidWaterCategory(other)),
        }
    }
}

impl Serialize for WaterCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.level())
    }
}

impl fmt::Display for WaterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Category {}", self.level())
    }
}

/// An area of the property covered by the estimate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Room {
    name: String,
    sqft: Decimal,
    /// Only affected rooms count toward drying area
    affected: bool,
}

impl Room {
    /// Creates a room; the area must be strictly positive and at most [`MAX_QUANTITY`]
    pub fn new(name: impl Into<String>, sqft: Decimal) -> Result<Self, InputShapeError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(InputShapeError::missing("room name"));
        }
        if sqft <= Decimal::ZERO {
            return Err(InputShapeError::NonPositiveArea { room: name, sqft });
        }
        if sqft > MAX_QUANTITY {
            return Err(InputShapeError::out_of_range(
                format!("area of room '{name}'"),
                sqft,
                MAX_QUANTITY,
            ));
        }
        Ok(Self {
            name,
            sqft,
            affected: true,
        })
    }

    pub fn with_affected(mut self, affected: bool) -> Self {
        self.affected = affected;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sqft(&self) -> Decimal {
        self.sqft
    }

    pub fn is_affected(&self) -> bool {
        self.affected
    }

    /// Case-insensitive name comparison
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim())
    }
}

/// Rooms of the loss location plus the water category of the loss
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PropertyDetails {
    rooms: Vec<Room>,
    water_category: Option<WaterCategory>,
}

impl PropertyDetails {
    /// Creates property details; room names must be unique ignoring case
    pub fn new(
        rooms: Vec<Room>,
        water_category: Option<WaterCategory>,
    ) -> Result<Self, InputShapeError> {
        for (i, room) in rooms.iter().enumerate() {
            if rooms[..i].iter().any(|earlier| earlier.is_named(room.name())) {
                return Err(InputShapeError::DuplicateRoom(room.name().to_string()));
            }
        }
        Ok(Self {
            rooms,
            water_category,
        })
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn water_category(&self) -> Option<WaterCategory> {
        self.water_category
    }

    /// Looks up a room by name, ignoring case
    pub fn room(&self, name: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.is_named(name))
    }

    /// Rooms flagged as affected by the loss
    pub fn affected_rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.iter().filter(|r| r.is_affected())
    }

    /// Total square footage of affected rooms
    pub fn total_affected_sqft(&self) -> Decimal {
        self.affected_rooms().map(Room::sqft).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_water_category_from_level() {
        assert_eq!(WaterCategory::try_from(3).unwrap(), WaterCategory::Black);
        assert!(matches!(
            WaterCategory::try_from(4),
            Err(InputShapeError::InvalidWaterCategory(4))
        ));
    }

    #[test]
    fn test_duplicate_rooms_ignore_case() {
        let rooms = vec![
            Room::new("Kitchen", dec!(120)).unwrap(),
            Room::new("kitchen", dec!(80)).unwrap(),
        ];
        assert!(matches!(
            PropertyDetails::new(rooms, None),
            Err(InputShapeError::DuplicateRoom(_))
        ));
    }

    #[test]
    fn test_unaffected_rooms_excluded_from_area() {
        let rooms = vec![
            Room::new("Living Room", dec!(300)).unwrap(),
            Room::new("Garage", dec!(400)).unwrap().with_affected(false),
        ];
        let property = PropertyDetails::new(rooms, Some(WaterCategory::Clean)).unwrap();
        assert_eq!(property.total_affected_sqft(), dec!(300));
    }
}
