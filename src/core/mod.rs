pub mod business_days;
pub mod errors;
pub mod services;
pub mod time;
pub mod utils;
