use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};

mod api;
mod config;
mod export;
mod filter;
mod import;
mod models;
mod report;
mod snapshot;
mod sort;
mod stats;
mod store;
#[cfg(test)]
mod testing;
mod validate;
mod wire;
mod wizard;

use api::ApiClient;
use config::ApiConfig;
use export::ExportColumn;
use models::{
    FilterCriteria, PlacementStatus, SortDirection, SortKey, SortSpec, StudentId, StudentRecord,
};
use store::{ConsoleState, RecordStore};
use wire::{OfferBody, StudentUpdate};
use wizard::{ResetAction, ResetStep, ResetWizard};

#[derive(Parser)]
#[command(name = "placement-console")]
#[command(about = "Student placement admin console", long_about = None)]
struct Cli {
    /// Backend base URL, overriding PLACEMENT_API_URL
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Read students from a saved JSON payload instead of the backend
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Default)]
struct ViewArgs {
    /// placed, unplaced, higher_studies, entrepreneurship, debarred or all
    #[arg(long)]
    status: Option<String>,
    /// Exact branch name, or all
    #[arg(long)]
    branch: Option<String>,
    /// Batch year, or all
    #[arg(long)]
    batch: Option<String>,
    /// Case-insensitive text matched against name, registration number and email
    #[arg(long, default_value = "")]
    search: String,
    #[arg(long, default_value = "name")]
    sort: SortKey,
    #[arg(long)]
    desc: bool,
}

impl ViewArgs {
    fn criteria(&self) -> anyhow::Result<FilterCriteria> {
        let status = match wildcard(self.status.as_deref()) {
            Some(tag) => Some(tag.parse::<PlacementStatus>()?),
            None => None,
        };
        let batch = match wildcard(self.batch.as_deref()) {
            Some(year) => Some(
                year.parse::<i32>()
                    .with_context(|| format!("batch '{year}' is not a year"))?,
            ),
            None => None,
        };
        Ok(FilterCriteria {
            status,
            branch: wildcard(self.branch.as_deref()).map(str::to_string),
            batch,
            search: self.search.clone(),
        })
    }

    fn sort_spec(&self) -> SortSpec {
        SortSpec {
            key: self.sort,
            direction: if self.desc {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            },
        }
    }

    fn scope_label(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(status) = wildcard(self.status.as_deref()) {
            parts.push(format!("status {status}"));
        }
        if let Some(branch) = wildcard(self.branch.as_deref()) {
            parts.push(format!("branch {branch}"));
        }
        if let Some(batch) = wildcard(self.batch.as_deref()) {
            parts.push(format!("batch {batch}"));
        }
        if !self.search.trim().is_empty() {
            parts.push(format!("search \"{}\"", self.search.trim()));
        }
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

/// `None` and "all" both mean no constraint.
fn wildcard(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

#[derive(Subcommand)]
enum Commands {
    /// List students matching the filters
    List {
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Placement statistics over every loaded student
    Stats,
    /// Export the filtered list as CSV
    Export {
        #[command(flatten)]
        view: ViewArgs,
        /// Comma separated column keys
        #[arg(long)]
        columns: Option<String>,
        /// Output file, or - for stdout
        #[arg(long, default_value = "students.csv")]
        out: PathBuf,
    },
    /// Generate a markdown placement report
    Report {
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Create students from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Update a student's placement status and current offer
    SetStatus {
        #[arg(long)]
        id: String,
        #[arg(long)]
        status: PlacementStatus,
        #[arg(long)]
        company: Option<String>,
        /// Package in rupees per annum
        #[arg(long)]
        package: Option<f64>,
        #[arg(long)]
        accepted_on: Option<NaiveDate>,
    },
    /// Reset an account password through the emailed code flow
    ///
    /// The new password is typed at a plain line prompt and is echoed.
    ResetPassword {
        #[arg(long)]
        email: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::init_logging();
    let cli = Cli::parse();

    run(cli).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::List { view, limit } => {
            let state = load_state(&cli, view).await?;
            if state.store.is_empty() {
                println!("No students loaded.");
                return Ok(());
            }
            let students = state.view();

            if students.is_empty() {
                println!("No students match these filters.");
                return Ok(());
            }

            println!("{} of {} students:", students.len(), state.store.len());
            for student in students.iter().take(*limit) {
                println!("- {}", describe(student));
            }
        }
        Commands::Stats => {
            let state = load_state(&cli, &ViewArgs::default()).await?;
            let summary = state.stats();
            let options = filter::FilterOptions::collect(state.store.records());

            println!("Total students: {}", summary.total_count);
            for (status, count) in summary.count_by_status.iter() {
                println!("- {status}: {count}");
            }
            println!("Placement rate: {:.1}%", summary.placement_rate);
            let package = summary.package;
            println!(
                "Packages (LPA) across {} offers: min {:.1}, max {:.1}, mean {:.1}, median {:.1}",
                package.count, package.min, package.max, package.mean, package.median
            );
            println!("By branch:");
            for branch in stats::summarize_by_branch(state.store.records()) {
                println!(
                    "- {}: {} placed of {} (avg {:.1} LPA)",
                    branch.branch, branch.placed, branch.total, branch.avg_package
                );
            }
            let batches: Vec<String> = options.batches.iter().map(i32::to_string).collect();
            println!("Batches loaded: {}", batches.join(", "));
        }
        Commands::Export { view, columns, out } => {
            let columns = match columns {
                Some(selection) => export::parse_columns(selection)?,
                None => ExportColumn::DEFAULT.to_vec(),
            };
            anyhow::ensure!(!columns.is_empty(), "select at least one export column");

            let state = load_state(&cli, view).await?;
            let students = state.view();
            let rows = export::export_rows(&students, &columns);

            if out.as_os_str() == "-" {
                print!("{}", export::to_csv_string(&columns, &rows)?);
                tracing::info!(rows = rows.len(), "export written to stdout");
                return Ok(());
            }

            let file = std::fs::File::create(out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            export::write_csv(file, &columns, &rows)?;
            tracing::info!(rows = rows.len(), path = %out.display(), "export written");
            println!("Exported {} students to {}.", rows.len(), out.display());
        }
        Commands::Report { view, out } => {
            let state = load_state(&cli, view).await?;
            let students = state.view();
            let report = report::build_report(
                view.scope_label().as_deref(),
                Utc::now().date_naive(),
                state.store.records(),
                &students,
            );
            std::fs::write(out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Import { csv } => {
            let client = api_client(&cli)?;
            let file = std::fs::File::open(csv)
                .with_context(|| format!("failed to open {}", csv.display()))?;
            let batch = import::read_students(file)?;

            for rejected in &batch.rejected {
                println!("Skipped row {}: {}", rejected.line, rejected.errors);
            }

            let client = &client;
            let outcome = import::create_all(&batch.students, |student| async move {
                client.create_student(&student).await
            })
            .await;

            for failed in &outcome.failed {
                println!("Failed row {}: {}", failed.line, failed.error);
            }
            println!(
                "Created {} students from {} ({} rows skipped, {} failed).",
                outcome.created.len(),
                csv.display(),
                batch.rejected.len(),
                outcome.failed.len()
            );
            anyhow::ensure!(
                outcome.failed.is_empty(),
                "{} rows were not created; import only the failed rows again",
                outcome.failed.len()
            );
        }
        Commands::SetStatus {
            id,
            status,
            company,
            package,
            accepted_on,
        } => {
            let (status, package, accepted_on) = (*status, *package, *accepted_on);
            validate::validate_placement_update(status, company.as_deref(), package)?;
            let client = api_client(&cli)?;
            let normalized = client.fetch_students().await?;
            let mut state = ConsoleState::new(RecordStore::new(normalized.records));

            let id = StudentId(id.clone());
            let previous = state.select(&id)?.placement_status;

            let current_offer = match (company, package) {
                (Some(company_name), Some(package)) => Some(OfferBody {
                    company_name: company_name.clone(),
                    package,
                    acceptance_date: accepted_on,
                }),
                _ => None,
            };
            let update = StudentUpdate {
                placement_status: status,
                current_offer,
            };
            let record = client.update_student(&id, &update).await?;
            state.store.upsert(record);

            if let Some(updated) = state.selected() {
                println!(
                    "Updated {} ({previous} -> {}).",
                    describe(updated),
                    updated.placement_status
                );
            }
            println!(
                "Now {} placed of {} students.",
                state.stats().count_for(PlacementStatus::Placed),
                state.store.len()
            );
        }
        Commands::ResetPassword { email } => {
            let client = api_client(&cli)?;
            reset_password(&client, email.as_deref()).await?;
        }
    }

    Ok(())
}

async fn load_state(cli: &Cli, view: &ViewArgs) -> anyhow::Result<ConsoleState> {
    let criteria = view.criteria()?;
    let normalized = match &cli.snapshot {
        Some(path) => snapshot::load(path)?,
        None => api_client(cli)?
            .fetch_students()
            .await
            .context("failed to fetch students from the backend")?,
    };

    let mut state = ConsoleState::new(RecordStore::default());
    state.store.replace(normalized.records);
    state.criteria = criteria;
    state.sort = view.sort_spec();

    if let Some(branch) = &state.criteria.branch {
        let options = filter::FilterOptions::collect(state.store.records());
        if !options.branches.contains(branch) {
            tracing::warn!(%branch, known = ?options.branches, "branch not present in loaded students");
        }
    }
    Ok(state)
}

fn api_client(cli: &Cli) -> anyhow::Result<ApiClient> {
    let config = ApiConfig::from_env(cli.api_url.as_deref())?;
    Ok(ApiClient::new(&config)?)
}

fn describe(student: &StudentRecord) -> String {
    let offer = match (
        student
            .current_offer
            .as_ref()
            .and_then(|o| o.company_name.as_deref()),
        student.current_package_lakhs(),
    ) {
        (Some(company), Some(lakhs)) => format!(", {company} {lakhs:.2} LPA"),
        (Some(company), None) => format!(", {company}"),
        _ => String::new(),
    };
    format!(
        "{} [{}] {} cgpa {}{}",
        student.full_name().trim(),
        student.registration_number.as_deref().unwrap_or("no reg. no."),
        student.placement_status,
        student
            .cgpa
            .map_or_else(|| "N/A".to_string(), |c| format!("{c:.2}")),
        offer
    )
}

fn prompt(
    lines: &mut impl Iterator<Item = std::io::Result<String>>,
    label: &str,
) -> anyhow::Result<String> {
    print!("{label}: ");
    std::io::stdout().flush()?;
    let line = lines.next().context("input closed")??;
    Ok(line.trim().to_string())
}

async fn reset_password(client: &ApiClient, email: Option<&str>) -> anyhow::Result<()> {
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    let mut wizard = ResetWizard::new();
    let mut preset_email = email.map(str::to_string);

    while !wizard.is_done() {
        let action = match wizard.step().clone() {
            ResetStep::RequestCode => {
                let email = match preset_email.take() {
                    Some(email) => email,
                    None => prompt(&mut lines, "Email")?,
                };
                wizard.submit_email(&email)
            }
            ResetStep::VerifyCode { .. } => {
                let code = prompt(&mut lines, "Code from email (or 'resend')")?;
                if code.eq_ignore_ascii_case("resend") {
                    wizard.resend();
                    continue;
                }
                wizard.submit_code(&code)
            }
            ResetStep::SetPassword { .. } => {
                let password = prompt(&mut lines, "New password")?;
                let confirmation = prompt(&mut lines, "Confirm password")?;
                wizard.submit_password(&password, &confirmation)
            }
            ResetStep::Done => break,
        };

        let action = match action {
            Ok(action) => action,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };

        let outcome = match &action {
            ResetAction::SendCode { email } => client.forgot_password(email).await,
            ResetAction::VerifyCode { email, code } => client.verify_reset_code(email, code).await,
            ResetAction::SetPassword {
                email,
                code,
                password,
            } => client.reset_password(email, code, password).await,
        };

        match outcome {
            Ok(message) => {
                if !message.is_empty() {
                    println!("{message}");
                }
                wizard.complete(action)?;
            }
            Err(api::ApiError::Rejected(message)) => println!("{message}"),
            Err(err) => return Err(err).context("password reset request failed"),
        }
    }

    println!("Password updated.");
    Ok(())
}
