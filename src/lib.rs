//! retailmap - Map cafe supply, highway access and census tract income for retail siting

pub mod api;
pub mod config;
pub mod domain;
pub mod geometry;
pub mod logging;
pub mod network;
pub mod osm;
pub mod pipeline;
pub mod render;
