pub mod artwork;
pub mod clock;
pub mod config;
pub mod controller;
pub mod display;
pub mod lastfm;
pub mod link;
pub mod mode;
pub mod platform;
pub mod remote;
pub mod schedule;
pub mod touch;
pub mod track;
