//! Interactive patient browser.
//!
//! Reads one command per line and redraws the page after each one settles.

use contact_navigator::PatientApi;
use contact_navigator::PatientData;
use contact_navigator::PatientPage;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;

use crate::render::render_view;

pub const HELP: &str = "\
commands:
  n          next patient
  p          previous patient
  t          toggle contacted
  o <id>     open a patient by id
  r          reload
  h          help
  q          quit
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Next,
    Previous,
    Toggle,
    Open(String),
    Reload,
    Help,
    Quit,
}

impl BrowseCommand {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (head, rest) = line
            .split_once(char::is_whitespace)
            .map(|(head, rest)| (head, rest.trim()))
            .unwrap_or((line, ""));
        match (head, rest) {
            ("n" | "next", "") => Some(Self::Next),
            ("p" | "prev" | "previous", "") => Some(Self::Previous),
            ("t" | "toggle", "") => Some(Self::Toggle),
            ("o" | "open", id) if !id.is_empty() => Some(Self::Open(id.to_string())),
            ("r" | "reload", "") => Some(Self::Reload),
            ("h" | "help" | "?", "") => Some(Self::Help),
            ("q" | "quit" | "exit", "") => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Run the browser until `q` or end of input.
pub async fn run<A, R, W>(
    api: A,
    start_id: &str,
    input: R,
    mut output: W,
) -> std::io::Result<()>
where
    A: PatientApi,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut page = PatientPage::new(PatientData::new(api));
    page.open(start_id);
    page.settle().await;
    output.write_all(render_view(&page.view()).as_bytes()).await?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let Some(command) = BrowseCommand::parse(&line) else {
            output
                .write_all(format!("unknown command `{}`\n{HELP}", line.trim()).as_bytes())
                .await?;
            continue;
        };

        match command {
            BrowseCommand::Next => {
                if page.go_to_next().is_none() {
                    output.write_all(b"already at the last patient\n").await?;
                    continue;
                }
            }
            BrowseCommand::Previous => {
                if page.go_to_previous().is_none() {
                    output.write_all(b"already at the first patient\n").await?;
                    continue;
                }
            }
            BrowseCommand::Toggle => {
                if let Some(contacted) = page.toggle_contacted() {
                    tracing::info!(patient_id = page.patient_id(), contacted, "Toggled contacted");
                }
            }
            BrowseCommand::Open(id) => {
                page.open(&id);
            }
            BrowseCommand::Reload => page.reload(),
            BrowseCommand::Help => {
                output.write_all(HELP.as_bytes()).await?;
                continue;
            }
            BrowseCommand::Quit => break,
        }

        page.settle().await;
        output.write_all(b"\n").await?;
        output.write_all(render_view(&page.view()).as_bytes()).await?;
        output.flush().await?;
    }

    page.settle().await;
    output.flush().await
}
