mod server;

pub use server::{
    CONFIG_FILE_NAME, ServerConfig, TokenTtls, UpstreamConfig, WEATHER_API_KEY_ENV,
};
