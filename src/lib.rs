//! Media Insight Pipeline
//!
//! This library turns a user-supplied media asset (a direct upload or a
//! social-media link) into a structured product-insight record. The asset
//! is stored durably, fanned out to recognition and transcription services,
//! and whatever analysis succeeded is merged into a single generative-AI
//! synthesis request.

pub mod app_state;
pub mod config;
pub mod models;
pub mod routes;
pub mod services;
