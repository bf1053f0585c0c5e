// Handlers module - relay endpoints

pub mod forward;
