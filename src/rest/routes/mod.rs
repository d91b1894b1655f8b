pub mod achievements;
pub mod coach;
pub mod health;
pub mod meals;
pub mod users;
