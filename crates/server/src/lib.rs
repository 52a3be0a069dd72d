pub mod config;
pub mod state;

pub mod rest;

pub mod openapi;

pub mod error_convert;

pub mod telemetry;

pub mod health;

pub mod auth;

// Enforcement domain modules
pub mod store;

pub mod workflow;

pub mod duplicates;
