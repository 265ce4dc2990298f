use colored::Colorize;
use tabled::settings::{
    Alignment, Color,
    object::{Columns, Rows},
};
use tickerlens::{
    api::{self, ANALYSIS_DAYS_DEFAULT},
    utils::datetime::date_to_str,
};

use crate::cli::new_spinner;

#[derive(clap::Args)]
pub struct AnalyzeCommand {
    #[arg(help = "Ticker name or code, e.g. 삼성전자 or 005930")]
    query: String,

    #[arg(
        short = 'd',
        long = "days",
        default_value_t = ANALYSIS_DAYS_DEFAULT,
        value_parser = clap::value_parser!(u32).range(30..=365),
        help = "Analysis period in days (30-365), the default value is 100"
    )]
    days: u32,

    #[arg(
        short = 'n',
        long = "rows",
        default_value_t = 5,
        help = "Number of latest trading days to show, the default value is 5"
    )]
    rows: usize,

    #[arg(short = 'r', long = "report", help = "Generate an AI analyst report")]
    report: bool,
}

impl AnalyzeCommand {
    pub async fn exec(&self) {
        let spinner = new_spinner("Looking up the ticker");

        let analysis = match api::analyze(&self.query, self.days).await {
            Ok(analysis) => analysis,
            Err(err) => {
                spinner.finish_and_clear();
                println!("[!] {}", err.to_string().yellow());
                return;
            }
        };
        spinner.finish_and_clear();

        let resolution = &analysis.resolution;
        if resolution.is_passthrough() {
            println!(
                "[i] {}",
                "Not found in the listing, switched to direct-code mode".yellow()
            );
        }
        println!(
            "{} ({})",
            resolution.name.bold(),
            resolution.code.cyan()
        );

        let series = &analysis.series;
        if let Some(change) = series.change_ratio() {
            let text = format!(
                "{:+.2}% over {} trading days",
                change * 100.0,
                series.bars.len()
            );
            if change >= 0.0 {
                println!("{}", text.red());
            } else {
                println!("{}", text.blue());
            }
        }

        let mut table_data: Vec<Vec<String>> = vec![vec![
            "Date".to_string(),
            "Open".to_string(),
            "High".to_string(),
            "Low".to_string(),
            "Close".to_string(),
            "Volume".to_string(),
        ]];
        for bar in series.latest_first(self.rows) {
            table_data.push(vec![
                date_to_str(&bar.date),
                format!("{:.0}", bar.open),
                format!("{:.0}", bar.high),
                format!("{:.0}", bar.low),
                format!("{:.0}", bar.close),
                format!("{}", bar.volume),
            ]);
        }

        let mut table = tabled::builder::Builder::from_iter(&table_data).build();
        table.modify(Rows::first(), Color::FG_BRIGHT_BLACK);
        table.modify(Columns::new(1..), Alignment::right());
        println!("{table}");

        if self.report {
            let spinner = new_spinner(&format!("Analyzing {}", resolution.name));

            match api::generate_report(&analysis).await {
                Ok(report) => {
                    spinner.finish_and_clear();
                    println!("\n{}\n", "AI Analyst Report".bold());
                    println!("{report}");
                }
                Err(err) => {
                    spinner.finish_and_clear();
                    println!("[!] {}", err.to_string().red());
                }
            }
        }
    }
}
