//! API client library for moviedeck.
//!
//! Provides a client for the TMDB v3 REST API.

/// TMDB API client.
pub mod tmdb;
