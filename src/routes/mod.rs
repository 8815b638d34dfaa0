pub mod health;
pub mod quiz;
