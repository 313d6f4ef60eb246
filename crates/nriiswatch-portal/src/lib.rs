//! NRIIS portal access.
//!
//! `client` drives the site over HTTP (probe, login replay, list fetch);
//! `extract` turns a fetched list page into records and is a pure
//! function so it tests without a network; `html` is the minimal
//! byte-slicing toolkit both lean on.

pub mod client;
pub mod extract;
pub mod html;

pub use client::NriisPortal;
