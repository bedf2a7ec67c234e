// Lovi - ui/panels/mod.rs

pub mod about;
pub mod filters;
pub mod font;
pub mod monitor_view;
