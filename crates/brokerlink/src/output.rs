use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
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

#[derive(Serialize)]
struct ReplyOutput<'a> {
    procedure: &'a str,
    user_id: &'a str,
    reply_len: usize,
    reply: &'a str,
}

pub fn print_reply(procedure: &str, user_id: &str, reply: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ReplyOutput {
                procedure,
                user_id,
                reply_len: reply.len(),
                reply,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PROCEDURE", "USER", "SIZE", "REPLY"])
                .add_row(vec![
                    procedure.to_string(),
                    user_id.to_string(),
                    reply.len().to_string(),
                    reply.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("procedure={procedure} user={user_id} size={} reply={reply}", reply.len());
        }
        OutputFormat::Raw => {
            print_raw(reply.as_bytes());
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}
