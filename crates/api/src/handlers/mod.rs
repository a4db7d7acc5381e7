pub mod health;
pub mod integrations;
pub mod preferences;
pub mod resources;
pub mod routing;
pub mod super_admin;
