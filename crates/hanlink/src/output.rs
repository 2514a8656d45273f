use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use hanlink_frame::{Field, Reading};
use hanlink_pipeline::{PipelineError, PipelineEvent};
use time::format_description::well_known::Rfc3339;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

pub fn print_event(event: &PipelineEvent, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => match event {
            PipelineEvent::Reading(reading) => println!("{}", reading_table(reading)),
            PipelineEvent::Error(err) => println!("{}", error_table(err)),
        },
        OutputFormat::Pretty => match event {
            PipelineEvent::Reading(reading) => println!("{}", reading_line(reading)),
            PipelineEvent::Error(err) => println!("error kind={} {}", err.kind, err.message),
        },
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn reading_table(reading: &Reading) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["FIELD", "VALUE", "UNIT"])
        .add_row(vec![
            Field::Timestamp.name().to_string(),
            timestamp(reading),
            String::new(),
        ]);

    for field in Field::ALL.iter().skip(1) {
        let value = reading
            .value(*field)
            .map(|value| format!("{:.*}", field.decimals(), value))
            .unwrap_or_default();
        table.add_row(vec![
            field.name().to_string(),
            value,
            field.unit().unwrap_or_default().to_string(),
        ]);
    }
    table
}

fn error_table(err: &PipelineError) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ERROR", "MESSAGE"])
        .add_row(vec![err.kind.to_string(), err.message.clone()]);
    table
}

fn reading_line(reading: &Reading) -> String {
    format!(
        "{} import={:.3} kWh export={:.3} kWh power={:.3}/{:.3} kW \
         voltage={:.1}/{:.1}/{:.1} V current={:.1}/{:.1}/{:.1} A",
        timestamp(reading),
        reading.active_import_total,
        reading.active_export_total,
        reading.active_import,
        reading.active_export,
        reading.voltage_l1,
        reading.voltage_l2,
        reading.voltage_l3,
        reading.current_l1,
        reading.current_l2,
        reading.current_l3,
    )
}

fn timestamp(reading: &Reading) -> String {
    reading
        .timestamp
        .format(&Rfc3339)
        .unwrap_or_else(|_| reading.timestamp.to_string())
}
