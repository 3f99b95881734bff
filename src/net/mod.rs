pub mod gate;
pub mod io;
pub mod server;
