//! Contact-form backend service for a portfolio website.
//!
//! The [`controller::Missive`] type aggregates the configuration of every
//! component and runs them: the CSRF token store, the rate limiter, the
//! spam filter, the mail dispatcher, and the HTTP surface that ties them
//! together. [`config::load`] discovers and parses the RON configuration
//! file and applies environment overrides.

pub mod config;
pub mod controller;
