use serde::{Deserialize, Serialize};

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 环境变量前缀（SNAPLINK__SERVER__PORT=3001）
pub const ENV_PREFIX: &str = "SNAPLINK";

/// 静态配置（从 TOML 加载，启动时使用）
///
/// - server: 监听地址、端口、对外地址
/// - links: 短码长度、默认有效期、过期清理
/// - geoip: 地理位置解析
/// - remote_log: 远程日志上报
/// - cors: 跨域配置
/// - logging: 本地日志
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub links: LinksConfig,
    #[serde(default)]
    pub geoip: GeoIpConfig,
    #[serde(default)]
    pub remote_log: RemoteLogConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：旧版环境变量 (PORT, LOG_SERVICE_URL, LOG_API_KEY) > SNAPLINK__* > config.toml > 默认值
    pub fn load(path: Option<&str>) -> Self {
        let path = path.unwrap_or(DEFAULT_CONFIG_PATH);

        match Self::build(path) {
            Ok(config) => {
                if std::path::Path::new(path).exists() {
                    eprintln!("[INFO] Configuration loaded from: {}", path);
                }
                config
            }
            Err(e) => {
                eprintln!("[ERROR] Failed to load config: {}", e);
                Self::default()
            }
        }
    }

    fn build(path: &str) -> Result<Self, config::ConfigError> {
        use config::{Config, Environment, File};

        let legacy_port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.trim().parse::<i64>().ok());

        Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.port", legacy_port)?
            .set_override_option("remote_log.endpoint", std::env::var("LOG_SERVICE_URL").ok())?
            .set_override_option("remote_log.token", std::env::var("LOG_API_KEY").ok())?
            .build()?
            .try_deserialize::<StaticConfig>()
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> crate::errors::Result<()> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Base address used to build `shortUrl`; derived from host/port when unset
    #[serde(default)]
    pub public_base_url: Option<String>,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 对外访问地址（不带结尾斜杠）
    pub fn base_url(&self) -> String {
        if let Some(ref url) = self.public_base_url
            && !url.trim().is_empty()
        {
            return url.trim().trim_end_matches('/').to_string();
        }

        let host = match self.host.as_str() {
            "0.0.0.0" | "127.0.0.1" | "::" | "::1" | "" => "localhost",
            other => other,
        };
        format!("http://{}:{}", host, self.port)
    }
}

/// 短链接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinksConfig {
    /// Lifetime in minutes applied when a request omits `validity`
    #[serde(default = "default_validity_minutes")]
    pub default_validity_minutes: u64,
    #[serde(default = "default_code_length")]
    pub code_length: usize,
    #[serde(default = "default_max_generation_attempts")]
    pub max_generation_attempts: u32,
    /// 后台过期清理间隔（秒），0 表示关闭
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

/// GeoIP 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoIpConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// MaxMindDB 文件路径 (GeoLite2-City.mmdb)
    /// 如果配置且文件可读，使用本地解析；否则 fallback 到外部 API
    #[serde(default)]
    pub maxminddb_path: Option<String>,
    /// 外部 GeoIP API URL，使用 {ip} 作为占位符
    #[serde(default = "default_geoip_api_url")]
    pub api_url: String,
    /// Upper bound on a lookup during a redirect
    #[serde(default = "default_geoip_timeout_ms")]
    pub timeout_ms: u64,
}

/// 远程日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteLogConfig {
    /// 上报地址，为空则不启用
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_log_stack")]
    pub stack: String,
    #[serde(default = "default_remote_log_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_true")]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions
// ============================================================

fn default_true() -> bool {
    true
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    3001
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_validity_minutes() -> u64 {
    30
}

fn default_code_length() -> usize {
    6
}

fn default_max_generation_attempts() -> u32 {
    16
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_geoip_api_url() -> String {
    "http://ip-api.com/json/{ip}?fields=status,countryCode,region,city".to_string()
}

fn default_geoip_timeout_ms() -> u64 {
    500
}

fn default_log_stack() -> String {
    "backend".to_string()
}

fn default_remote_log_timeout_ms() -> u64 {
    2000
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_cors_max_age() -> u64 {
    3600
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            public_base_url: None,
            workers: default_workers(),
        }
    }
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            default_validity_minutes: default_validity_minutes(),
            code_length: default_code_length(),
            max_generation_attempts: default_max_generation_attempts(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Default for GeoIpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            maxminddb_path: None,
            api_url: default_geoip_api_url(),
            timeout_ms: default_geoip_timeout_ms(),
        }
    }
}

impl Default for RemoteLogConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            token: None,
            stack: default_log_stack(),
            timeout_ms: default_remote_log_timeout_ms(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: default_allowed_origins(),
            max_age: default_cors_max_age(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: true,
        }
    }
}
