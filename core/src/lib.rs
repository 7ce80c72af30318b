pub mod bmr;
pub mod day;
pub mod entries;
pub mod error;
pub mod models;
pub mod openfoodfacts;
pub mod profile;
pub mod service;
pub mod store;
pub mod weights;
