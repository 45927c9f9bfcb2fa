//! Leaf subsystems, each owning one slice of world state

pub mod buildings;
pub mod events;
pub mod military;
pub mod milestones;
pub mod population;
pub mod prestige;
pub mod research;
pub mod resources;
