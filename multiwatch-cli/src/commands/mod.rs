pub mod config_dir;
pub mod repos;
pub mod session;
pub mod status;
pub mod stop;
pub mod sync;
pub mod watch;
