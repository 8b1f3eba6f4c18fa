use std::{env, fmt, fs};

use serde::Deserialize;

use crate::constants::{
    ACCESS_TOKEN_EXPIRE_TIME, NOTIFY_QUEUE_CAPACITY, NOTIFY_WORKER_NUM, PASSWORD_HASH_ITERATIONS,
    REFRESH_TOKEN_EXPIRE_TIME,
};

#[derive(Deserialize, Debug, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ServiceMode {
    Product,
    Dev,
    Local,
    Test, //for testcase
}

impl ServiceMode {
    /// Local and test modes run on the memory database and log notifications
    /// instead of delivering them.
    pub fn is_offline(&self) -> bool {
        matches!(self, ServiceMode::Local | ServiceMode::Test)
    }
}

impl std::str::FromStr for ServiceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "product" => Ok(ServiceMode::Product),
            "dev" => Ok(ServiceMode::Dev),
            "local" => Ok(ServiceMode::Local),
            "test" => Ok(ServiceMode::Test),
            _ => Err("Don't support this service mode".to_string()),
        }
    }
}

impl fmt::Display for ServiceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            ServiceMode::Product => "product",
            ServiceMode::Dev => "dev",
            ServiceMode::Local => "local",
            ServiceMode::Test => "test",
        };
        write!(f, "{}", description)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Database {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

fn default_pool_size() -> usize {
    16
}

impl Database {
    pub fn db_uri(&self) -> String {
        format!(
            "host={} port={} user={} password={} dbname={}",
            self.host, self.port, self.user, self.password, self.dbname
        )
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Smtp {
    pub server: String,
    pub port: u16,
    pub sender: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Sms {
    /// e.g. https://api.twilio.com/2010-04-01
    pub gateway: String,
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TokenConf {
    pub secret: String,
    /// millis
    #[serde(default = "default_access_ttl")]
    pub access_ttl: u64,
    /// millis
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl: u64,
}

fn default_access_ttl() -> u64 {
    ACCESS_TOKEN_EXPIRE_TIME
}

fn default_refresh_ttl() -> u64 {
    REFRESH_TOKEN_EXPIRE_TIME
}

#[derive(Deserialize, Debug, Clone)]
pub struct NotifyConf {
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_queue_capacity() -> usize {
    NOTIFY_QUEUE_CAPACITY
}

fn default_workers() -> usize {
    NOTIFY_WORKER_NUM
}

impl Default for NotifyConf {
    fn default() -> Self {
        NotifyConf {
            queue_capacity: NOTIFY_QUEUE_CAPACITY,
            workers: NOTIFY_WORKER_NUM,
        }
    }
}

fn default_hash_iterations() -> u32 {
    PASSWORD_HASH_ITERATIONS
}

///read config data for env
#[derive(Deserialize, Debug)]
pub struct EnvConf {
    /// product, dev, local or test
    pub service_mode: ServiceMode,
    /// http service port
    pub api_port: usize,
    /// unused in local and test mode
    pub database: Option<Database>,
    pub smtp: Option<Smtp>,
    pub sms: Option<Sms>,
    pub token: TokenConf,
    #[serde(default = "default_hash_iterations")]
    pub password_hash_iterations: u32,
    #[serde(default)]
    pub notify: NotifyConf,
}

impl EnvConf {
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

lazy_static! {
    pub static ref CONF: EnvConf = {
        let content = fs::read_to_string(
            env::var_os("CONFIG").expect("CONFIG environment variable required"),
        )
        .expect("Unable to read the `CONFIG` specified file");
        EnvConf::from_toml(content.as_str()).expect("contents of configuration file invalid")
    };
}
