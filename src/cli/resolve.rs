use colored::Colorize;
use tabled::settings::{Color, object::Columns};
use tickerlens::api;

#[derive(clap::Args)]
pub struct ResolveCommand {
    #[arg(help = "Ticker name or code, e.g. 삼성전자 or 005930")]
    query: String,

    #[arg(long = "json", help = "Print the resolution as JSON")]
    json: bool,
}

impl ResolveCommand {
    pub async fn exec(&self) {
        let query = self.query.trim();
        if query.is_empty() {
            println!("[!] {}", "Ticker name or code is required".red());
            return;
        }

        let resolution = api::resolve(query).await;

        if self.json {
            match serde_json::to_string_pretty(&resolution) {
                Ok(json) => println!("{json}"),
                Err(err) => println!("[!] {}", err.to_string().red()),
            }
            return;
        }

        let table_data: Vec<Vec<String>> = vec![
            vec!["code".to_string(), resolution.code.clone()],
            vec!["name".to_string(), resolution.name.clone()],
            vec!["resolved".to_string(), resolution.resolved.to_string()],
            vec!["source".to_string(), resolution.source.to_string()],
        ];

        let mut table = tabled::builder::Builder::from_iter(&table_data).build();
        table.modify(Columns::first(), Color::FG_CYAN);
        println!("{table}");

        if resolution.is_passthrough() {
            println!(
                "[i] {}",
                "Not found in the listing, switched to direct-code mode".yellow()
            );
        }
    }
}
