//! Static HTML importer
//!
//! Lets an administrator upload a static `.html`/`.htm` file and turns it
//! into a published page: the title comes from `<title>`, the content from
//! `<body>`, both sanitized before storage.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod views;
