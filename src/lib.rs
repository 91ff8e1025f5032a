pub mod api;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod live;
pub mod presentation;
pub mod render;
