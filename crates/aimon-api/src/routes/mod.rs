pub mod aimon;
pub mod gallery;
pub mod generate;
pub mod health;
