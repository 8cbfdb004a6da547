//! DynamoDB infrastructure management commands.

mod client;
pub mod config;
mod deploy;
mod error;
mod planning;
mod seed;

pub use error::{DynamodbError, Result};

use crate::prelude::*;
use cryptopay_core::payment::{Rate, DEFAULT_PAIRS};
use cryptopay_core::storage::schema::DEFAULT_TABLE_NAME;
use dialoguer::Confirm;

/// DynamoDB infrastructure management commands.
#[derive(Debug, clap::Parser)]
pub struct DynamodbCommand {
    #[command(subcommand)]
    pub action: DynamodbAction,
}

/// Available DynamoDB actions.
#[derive(Debug, clap::Subcommand)]
pub enum DynamodbAction {
    /// Deploy or destroy DynamoDB table infrastructure.
    Deploy(DeployCommand),

    /// Insert a synthetic exchange-rate history.
    SeedRates(SeedRatesCommand),
}

/// Deploy or update DynamoDB infrastructure.
#[derive(Debug, clap::Parser)]
#[command(long_about = "Deploy or destroy DynamoDB table infrastructure.

By default, this command creates or updates the payments table with its
pk/sk primary key and the paymentId-index Global Secondary Index.

The command shows a plan of changes before applying and asks for confirmation.

Environment variables:
  AWS_ENDPOINT_URL    - Use local DynamoDB (e.g., http://localhost:8000)
  AWS_REGION          - AWS region (defaults to us-east-1)
  AWS_PROFILE         - AWS profile to use for credentials")]
pub struct DeployCommand {
    /// Skip confirmation prompts.
    #[arg(long)]
    pub force: bool,

    /// Destroy the table instead of creating/updating.
    #[arg(long)]
    pub destroy: bool,

    /// Table name to use.
    #[arg(long, default_value = DEFAULT_TABLE_NAME, env = "MAIN_TABLE")]
    pub table_name: String,
}

/// Insert mock Rate items.
#[derive(Debug, clap::Parser)]
#[command(long_about = "Generate and insert a synthetic exchange-rate history.

Writes one observation per pair per minute, ending now. Existing rates with
the same pair and timestamp are overwritten.")]
pub struct SeedRatesCommand {
    /// Currency pairs to generate, comma-separated (defaults to BTC-USD,ETH-USD,SOL-USD,BTC-EUR).
    #[arg(long, value_delimiter = ',')]
    pub pairs: Option<Vec<String>>,

    /// Observations per pair.
    #[arg(long, default_value = "30")]
    pub points: u32,

    /// Table name to use.
    #[arg(long, default_value = DEFAULT_TABLE_NAME, env = "MAIN_TABLE")]
    pub table_name: String,

    /// Skip confirmation prompts.
    #[arg(long)]
    pub force: bool,
}

/// Main entry point for dynamodb command.
pub async fn run(command: DynamodbCommand, global: crate::Global) -> Result<()> {
    match command.action {
        DynamodbAction::Deploy(deploy_cmd) => run_deploy(deploy_cmd, &global).await,
        DynamodbAction::SeedRates(seed_cmd) => run_seed_rates(seed_cmd, &global).await,
    }
}

fn confirm(prompt: &str, default: bool) -> Result<()> {
    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;

    if confirmed {
        Ok(())
    } else {
        Err(DynamodbError::UserCancelled)
    }
}

async fn run_deploy(cmd: DeployCommand, global: &crate::Global) -> Result<()> {
    let aws_config = client::AwsConfig::default();

    if !global.is_silent() {
        aprintln!("{} {}", p_b("Target:"), aws_config.target_display());
        aprintln!();
    }

    let dynamo_client = client::create_client(&aws_config).await;
    let current_state = client::get_table_state(&dynamo_client, &cmd.table_name).await?;

    if cmd.destroy {
        let plan = planning::calculate_destroy_plan(current_state.as_ref(), &cmd.table_name);

        if !global.is_silent() {
            aprintln!("{}", p_y("Destroy Plan:"));
            for line in planning::format_destroy_plan(&plan) {
                aprintln!("  {}", p_r(&line));
            }
            aprintln!();
        }

        if matches!(plan, planning::DestroyPlan::AlreadyGone { .. }) {
            if !global.is_silent() {
                aprintln!("{}", p_g("Nothing to destroy."));
            }
            return Ok(());
        }

        if !cmd.force {
            confirm(
                "Are you sure you want to delete this table? ALL DATA WILL BE LOST",
                false,
            )?;
        }

        if !global.is_silent() {
            aprintln!("{}", p_b("Deleting table..."));
        }

        deploy::execute_destroy_plan(&dynamo_client, &plan).await?;

        if !global.is_silent() {
            aprintln!("{}", p_g("Table destroyed successfully."));
        }
        return Ok(());
    }

    let table_config = config::cryptopay_table_config().with_table_name(&cmd.table_name);
    let plan = planning::calculate_deploy_plan(current_state.as_ref(), &table_config);

    if !global.is_silent() {
        aprintln!("{}", p_c("Deploy Plan:"));
        for line in planning::format_deploy_plan(&plan) {
            match line.chars().next() {
                Some('+') => aprintln!("  {}", p_g(&line)),
                Some('-') | Some('!') => aprintln!("  {}", p_r(&line)),
                Some('~') => aprintln!("  {}", p_y(&line)),
                _ => aprintln!("  {}", line),
            }
        }
        aprintln!();
    }

    match plan {
        planning::DeployPlan::NoChanges { .. } => {
            if !global.is_silent() {
                aprintln!("{}", p_g("Infrastructure is up to date."));
            }
            return Ok(());
        }
        planning::DeployPlan::KeySchemaMismatch { table_name, .. } => {
            return Err(DynamodbError::IncompatibleTable { table_name });
        }
        _ => {}
    }

    if !cmd.force {
        confirm("Apply these changes?", true)?;
    }

    if !global.is_silent() {
        aprintln!("{}", p_b("Applying changes..."));
    }

    deploy::execute_deploy_plan(&dynamo_client, &plan).await?;

    if !global.is_silent() {
        aprintln!("{}", p_g("Infrastructure deployed successfully."));
    }

    Ok(())
}

fn print_rate_preview(rates: &[Rate]) {
    aprintln!("{}", p_c("Rates to create:"));
    for rate in rates.iter().take(5) {
        aprintln!("  {} {} = {}", rate.timestamp, rate.pair, rate.rate);
    }
    if rates.len() > 5 {
        aprintln!("  ... and {} more", rates.len() - 5);
    }
    aprintln!();
}

async fn run_seed_rates(cmd: SeedRatesCommand, global: &crate::Global) -> Result<()> {
    let aws_config = client::AwsConfig::default();
    let pairs = cmd
        .pairs
        .unwrap_or_else(|| DEFAULT_PAIRS.iter().map(|p| p.to_string()).collect());

    if !global.is_silent() {
        aprintln!("{} {}", p_b("Target:"), aws_config.target_display());
        aprintln!("{} {}", p_b("Table:"), cmd.table_name);
        aprintln!("{} {}", p_b("Pairs:"), pairs.join(", "));
        aprintln!("{} {}", p_b("Points per pair:"), cmd.points);
        aprintln!();
    }

    let dynamo_client = client::create_client(&aws_config).await;

    let table_state = client::get_table_state(&dynamo_client, &cmd.table_name).await?;
    if table_state.is_none() {
        return Err(DynamodbError::TableNotFound {
            table_name: cmd.table_name,
        });
    }

    let rates = seed::generate_rates(&pairs, cmd.points, chrono::Utc::now());

    if !global.is_silent() {
        print_rate_preview(&rates);
    }

    if !cmd.force {
        confirm(&format!("Insert {} rates?", rates.len()), true)?;
    }

    let inserted = seed::seed_rates(&dynamo_client, &cmd.table_name, &rates).await?;

    if !global.is_silent() {
        aprintln!("{} {} rates inserted.", p_g("Success:"), inserted);
    }

    Ok(())
}
