pub mod backup;
pub mod checklist;
pub mod config;
pub mod contact;
pub mod context;
pub mod csvlog;
pub mod dates;
pub mod error;
pub mod focus;
pub mod goal;
pub mod habit;
pub mod inbox;
pub mod io;
pub mod journal;
pub mod note;
pub mod paths;
pub mod scaffold;
pub mod store;
pub mod task;
pub mod text;
pub mod timelog;
pub mod win;

pub use error::{LifeError, Result};
