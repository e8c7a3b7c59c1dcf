use std::env;
use std::path::PathBuf;

pub struct Config {
    pub port: u16,
    pub data_file: PathBuf,
    pub seed_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3001".to_string())
            .parse::<u16>()
            .map_err(|_| anyhow::anyhow!("Invalid PORT value"))?;

        let data_file = env::var("DATA_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/portfolio.json"));

        // An empty SEED_FILE is treated as unset
        let seed_file = env::var("SEED_FILE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Ok(Config {
            port,
            data_file,
            seed_file,
        })
    }
}
