//! Core authui library (flow resolution, view shaping, templates, config).

pub mod config;
pub mod error;
pub mod flow;
pub mod kratos;
pub mod presenter;
pub mod render;
pub mod resolver;
pub mod view;
