use clap::Subcommand;
use colored::Colorize;
use tabled::settings::{Color, object::Columns};
use tickerlens::{api, config::TlConfig};

const SECRET_KEYS: &[&str] = &["genai_api_key"];

#[derive(Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Set a configuration value, e.g. listing_market KOSDAQ")]
    Set { key: String, value: String },

    #[command(about = "Show configurations")]
    Show,
}

impl ConfigCommand {
    pub async fn exec(&self) {
        let entries = match self {
            ConfigCommand::Set { key, value } => api::set_config(key, value)
                .await
                .map(|_| vec![(key.to_lowercase(), value.trim().to_string())]),
            ConfigCommand::Show => api::get_config().await.map(|config| {
                TlConfig::KEYS
                    .iter()
                    .map(|key| {
                        let value = config.get(key).unwrap_or_else(|err| err.to_string());
                        (key.to_string(), value)
                    })
                    .collect()
            }),
        };

        match entries {
            Ok(entries) => {
                let table_data: Vec<Vec<String>> = entries
                    .into_iter()
                    .map(|(key, value)| {
                        let value = if SECRET_KEYS.contains(&key.as_str()) {
                            mask_secret(&value)
                        } else {
                            value
                        };
                        vec![key, value]
                    })
                    .collect();

                let mut table = tabled::builder::Builder::from_iter(&table_data).build();
                table.modify(Columns::first(), Color::FG_CYAN);
                println!("{table}");
            }
            Err(err) => {
                println!("[!] {}", err.to_string().red());
            }
        }
    }
}

/// Keeps the first four characters of long secrets.
fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        format!("{head}{}", "*".repeat(chars.len() - 4))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret(""), "");
        assert_eq!(mask_secret("short"), "*****");
        assert_eq!(mask_secret("AIzaSyExample"), "AIza*********");
    }
}
