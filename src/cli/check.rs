use colored::Colorize;
use tabled::settings::{
    Color,
    object::{Cell, Columns, Rows},
};
use tickerlens::api;

use crate::cli::new_spinner;

#[derive(clap::Args)]
pub struct CheckCommand;

impl CheckCommand {
    pub async fn exec(&self) {
        let spinner = new_spinner("Checking");
        let status = api::check().await;
        spinner.finish_and_clear();

        let status = match status {
            Ok(status) => status,
            Err(err) => {
                println!("[!] {}", err.to_string().red());
                return;
            }
        };

        let mut table_data: Vec<Vec<String>> =
            vec![vec!["Service".to_string(), "Status".to_string()]];
        table_data.extend(status.iter().map(|(service, err)| {
            let state = err.as_ref().map_or("✔".to_string(), |err| err.to_string());
            vec![service.to_string(), state]
        }));

        let mut table = tabled::builder::Builder::from_iter(&table_data).build();
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::first(), Color::FG_CYAN);
        for (i, (_, err)) in status.iter().enumerate() {
            let color = if err.is_some() {
                Color::FG_RED
            } else {
                Color::FG_GREEN
            };
            table.modify(Cell::new(i + 1, 1), color);
        }
        println!("{table}");

        let failed = status.iter().filter(|(_, err)| err.is_some()).count();
        if failed > 0 {
            println!("[!] {}", format!("{failed} service(s) unreachable").yellow());
        }
    }
}
