// handlers/mod.rs - HTTP handlers
//
// Public:    /api/health
// Protected: /api/notes[/:id] (JWT required, see middleware::auth)

pub mod health;
pub mod notes;

pub use health::{health, route_not_found};
pub use notes::{create_note, delete_note, get_note, list_notes, update_note};
