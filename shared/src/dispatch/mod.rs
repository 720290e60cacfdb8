pub mod dispatcher;
pub mod dispatcher_config;
pub mod mutation;
