pub mod catalog;
pub mod cli;
pub mod fetch;
pub mod normalize;
pub mod pipeline;
pub mod radarr;
pub mod resolver;
pub mod schedule;
pub mod season;
pub mod settings;
pub mod slug;
pub mod sync;
pub mod tmdb;
pub mod trmnl;
