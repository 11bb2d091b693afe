#![allow(dead_code)]

use taskdeck::db::Database;
use taskdeck::jwt::{Claims, JwtConfig, TokenType};
use taskdeck::{ServerConfig, start_server};

pub const ACCESS_SECRET: &[u8] = b"access-secret-long-enough-for-tests";
pub const REFRESH_SECRET: &[u8] = b"refresh-secret-long-enough-for-tests";

/// A server on a random port with an in-memory database.
pub struct TestServer {
    pub base_url: String,
    pub db: Database,
    pub jwt: JwtConfig,
    handle: tokio::task::JoinHandle<()>,
}

pub async fn start() -> TestServer {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");

    let config = ServerConfig {
        db: db.clone(),
        access_secret: ACCESS_SECRET.to_vec(),
        refresh_secret: REFRESH_SECRET.to_vec(),
        secure_cookies: false, // Tests run on localhost HTTP
    };

    let (handle, addr) = start_server(config, 0).await;

    TestServer {
        base_url: format!("http://{}", addr),
        db,
        jwt: JwtConfig::new(ACCESS_SECRET, REFRESH_SECRET),
        handle,
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Mint an access token for the test secrets whose expiry already passed.
pub fn expired_access_token(sub: &str) -> String {
    use jsonwebtoken::{EncodingKey, Header};

    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();

    let claims = Claims {
        sub: sub.to_string(),
        token_type: TokenType::Access,
        iat: now - 120,
        exp: now - 60,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(ACCESS_SECRET),
    )
    .unwrap()
}

/// Fresh directory for a client token store.
pub fn temp_store_dir() -> std::path::PathBuf {
    std::env::temp_dir().join(format!("taskdeck-test-{}", uuid::Uuid::new_v4()))
}
