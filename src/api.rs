mod client;
pub mod heartbeat;
pub mod home_assistant;
