pub mod console;
pub mod error;
pub mod gate;
pub mod model;
pub mod remote;
pub mod session;
pub mod settings;
