pub mod crummey;
pub mod gifts;
pub mod health;
pub mod portfolio;
pub mod remediation;
