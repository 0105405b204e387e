#![allow(dead_code)]

use appspanel::{crypto::Secret, ClientConfig, RequestManager};
use httpmock::MockServer;

pub const PRIVATE_KEY: &str = "0123456789ABCDEF-private-key";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::new("test-app", "test-key", PRIVATE_KEY).base_url(server.base_url())
}

pub fn manager(server: &MockServer) -> RequestManager {
    init_logging();
    config(server).to_client().unwrap()
}

pub fn secret() -> Secret {
    Secret::derive(PRIVATE_KEY).unwrap()
}
