use std::{env, net::SocketAddr, path::PathBuf};

use dotenvy::dotenv;

/// Extensions accepted for upload, lower-case, without the dot.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub static_port: u16,
    pub debug: bool,
    pub root_dir: PathBuf,
    pub upload_subdir: String,
    pub url_prefix: String,
    pub path_prefix: String,
    pub max_file_size: u64,
    pub max_dimension: u32,
    pub jpeg_quality: u8,
}

/// Snapshot of the storage-relevant configuration, taken once by
/// [`crate::storage::ImageStorage`] at construction.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    pub url_prefix: String,
    pub path_prefix: String,
    pub max_file_size: u64,
    pub allowed_extensions: &'static [&'static str],
    pub max_dimension: u32,
    pub jpeg_quality: u8,
}

impl AppConfig {
    /// Loads the configuration from the environment, applying defaults for
    /// anything unset. Also ensures the upload directory exists so both
    /// binaries can start against an empty tree.
    pub fn from_env() -> Self {
        dotenv().ok();

        let static_port: u16 = env::var("IMGBED_STATIC_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .expect("IMGBED_STATIC_PORT must be a number");

        let config = Self {
            host: env::var("IMGBED_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("IMGBED_PORT")
                .unwrap_or_else(|_| "7860".to_string())
                .parse()
                .expect("IMGBED_PORT must be a number"),
            static_port,
            debug: env::var("IMGBED_DEBUG")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            root_dir: env::current_dir().expect("cannot resolve working directory"),
            upload_subdir: env::var("IMGBED_UPLOAD_DIR")
                .unwrap_or_else(|_| "static/uploads".to_string()),
            url_prefix: trim_slashes(
                &env::var("IMGBED_URL_PREFIX")
                    .unwrap_or_else(|_| format!("http://localhost:{static_port}")),
            ),
            path_prefix: trim_slashes(
                &env::var("IMGBED_PATH_PREFIX").unwrap_or_else(|_| "static/uploads".to_string()),
            ),
            max_file_size: env::var("IMGBED_MAX_FILE_SIZE")
                .unwrap_or_else(|_| (10 * 1024 * 1024).to_string())
                .parse()
                .expect("IMGBED_MAX_FILE_SIZE must be a number"),
            max_dimension: env::var("IMGBED_MAX_DIMENSION")
                .unwrap_or_else(|_| "1920".to_string())
                .parse()
                .expect("IMGBED_MAX_DIMENSION must be a number"),
            jpeg_quality: env::var("IMGBED_JPEG_QUALITY")
                .unwrap_or_else(|_| "80".to_string())
                .parse()
                .expect("IMGBED_JPEG_QUALITY must be a number"),
        };

        std::fs::create_dir_all(config.upload_dir()).expect("failed to create upload directory");
        config
    }

    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid host or port")
    }

    pub fn static_socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.static_port)
            .parse()
            .expect("Invalid host or port")
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.root_dir.join(&self.upload_subdir)
    }

    pub fn storage(&self) -> StorageConfig {
        StorageConfig {
            upload_dir: self.upload_dir(),
            url_prefix: self.url_prefix.clone(),
            path_prefix: self.path_prefix.clone(),
            max_file_size: self.max_file_size,
            allowed_extensions: ALLOWED_EXTENSIONS,
            max_dimension: self.max_dimension,
            jpeg_quality: self.jpeg_quality,
        }
    }
}

/// Strips stray `/` off both ends so URL segments can be joined with a
/// single separator.
fn trim_slashes(s: &str) -> String {
    s.trim().trim_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 7860,
            static_port: 8080,
            debug: false,
            root_dir: PathBuf::from("/srv/imgbed"),
            upload_subdir: "static/uploads".to_string(),
            url_prefix: trim_slashes("http://localhost:8080/"),
            path_prefix: trim_slashes("/static/uploads/"),
            max_file_size: 10 * 1024 * 1024,
            max_dimension: 1920,
            jpeg_quality: 80,
        }
    }

    #[test]
    fn trim_slashes_strips_both_ends() {
        assert_eq!(trim_slashes("/static/uploads/"), "static/uploads");
        assert_eq!(trim_slashes("http://localhost:8080/"), "http://localhost:8080");
        assert_eq!(trim_slashes("static/uploads"), "static/uploads");
        assert_eq!(trim_slashes(" /x/ "), "x");
    }

    #[test]
    fn upload_dir_joins_root_and_subdir() {
        let config = test_config();
        assert_eq!(
            config.upload_dir(),
            PathBuf::from("/srv/imgbed/static/uploads")
        );
    }

    #[test]
    fn storage_snapshot_carries_trimmed_prefixes() {
        let storage = test_config().storage();
        assert_eq!(storage.url_prefix, "http://localhost:8080");
        assert_eq!(storage.path_prefix, "static/uploads");
        assert_eq!(storage.allowed_extensions, ALLOWED_EXTENSIONS);
    }
}
