//! `contact` operator console.
//!
//! ## Commands
//!
//! - `contact browse [ID]` - interactive prev/next/toggle over uncontacted patients
//! - `contact list [--contacted]` - list patients by contacted flag
//! - `contact stats` - total, contacted and remaining counts
//! - `contact show <ID>` - one patient's details
//! - `contact mark <ID> [--not]` - set or clear the contacted flag

pub mod browse;
pub mod render;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use contact_client::ClientConfig;
use contact_client::PatientClient;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;

use crate::render::render_details;
use crate::render::render_row;
use crate::render::render_stats;

#[derive(Debug, Parser)]
#[command(name = "contact", version, about = "Patient contact console")]
pub struct Cli {
    /// Patients endpoint, e.g. http://localhost:3333/api/v1/patients.
    #[arg(long, global = true, env = "CONTACT_API_BASE_URL")]
    pub base_url: Option<String>,

    /// Print JSON instead of text (list, stats, show, mark).
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Page through uncontacted patients interactively.
    Browse {
        /// Patient to start from; defaults to the first uncontacted one.
        patient_id: Option<String>,
    },

    /// List patients filtered by the contacted flag.
    List {
        /// List contacted patients instead of uncontacted ones.
        #[arg(long)]
        contacted: bool,
    },

    /// Show patient counts.
    Stats,

    /// Show one patient.
    Show { patient_id: String },

    /// Mark a patient as contacted.
    Mark {
        patient_id: String,

        /// Mark as not contacted instead.
        #[arg(long = "not")]
        not_contacted: bool,
    },
}

impl Cli {
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::load().context("loading client config")?;
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        Ok(config)
    }

    pub async fn run(self) -> Result<()> {
        let config = self.client_config()?;
        let client = PatientClient::new(&config).context("building HTTP client")?;
        tracing::debug!(base_url = client.base_url(), "Using patient service");

        match self.command {
            Command::Browse { patient_id } => browse(client, patient_id).await,
            Command::List { contacted } => {
                let patients = if contacted {
                    client.fetch_contacted_patients().await
                } else {
                    client.fetch_uncontacted_patients().await
                }
                .context("fetching patients")?;
                if self.json {
                    print_json(&patients)
                } else {
                    for patient in &patients {
                        println!("{}", render_row(patient));
                    }
                    Ok(())
                }
            }
            Command::Stats => {
                let stats = client
                    .fetch_patient_stats()
                    .await
                    .context("fetching stats")?;
                if self.json {
                    print_json(&stats)
                } else {
                    println!("{}", render_stats(&stats));
                    Ok(())
                }
            }
            Command::Show { patient_id } => {
                let patient = client
                    .fetch_patient(&patient_id)
                    .await
                    .context("fetching patient")?
                    .with_context(|| format!("no patient found for id: \"{patient_id}\""))?;
                if self.json {
                    print_json(&patient)
                } else {
                    println!("{}", render_details(&patient));
                    Ok(())
                }
            }
            Command::Mark {
                patient_id,
                not_contacted,
            } => {
                let patch = client
                    .update_contacted_patient(&patient_id, !not_contacted)
                    .await
                    .with_context(|| format!("updating patient {patient_id}"))?;
                if self.json {
                    print_json(&patch)
                } else {
                    let contacted = patch.contacted.unwrap_or(!not_contacted);
                    println!(
                        "{patient_id}: {}",
                        if contacted { "contacted" } else { "not contacted" }
                    );
                    Ok(())
                }
            }
        }
    }
}

async fn browse(client: PatientClient, patient_id: Option<String>) -> Result<()> {
    let start_id = match patient_id {
        Some(id) => id,
        None => client
            .fetch_uncontacted_patients()
            .await
            .context("fetching uncontacted patients")?
            .into_iter()
            .next()
            .map(|patient| patient.id)
            .context("every patient has been contacted")?,
    };

    let mut stdout = tokio::io::stdout();
    stdout.write_all(browse::HELP.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    browse::run(client, &start_id, BufReader::new(tokio::io::stdin()), stdout).await?;
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
