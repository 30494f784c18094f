#![doc = "canvas-avatars-core: core logic library for canvas-avatars."]

//! This crate holds every decision the avatar uploader makes: matching roster
//! records to image files, building validated clients, and walking each client
//! through the remote upload sequence.
//! Transport, settings files, roster parsing and logging setup live in the
//! `canvas-avatars` CLI crate.
//!
//! # Usage
//! Build clients with [`clients::build_clients`], then drive them with
//! [`synchronise::upload_all`], or let [`synchronise::synchronise`] run the
//! whole batch against any [`contract::Connector`].

pub mod clients;
pub mod config;
pub mod contract;
pub mod image;
pub mod synchronise;
