mod mirror_server;
pub use mirror_server::MirrorServer;

mod server_config;
pub use server_config::ServerConfig;
