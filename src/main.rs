use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{ArgGroup, Parser, Subcommand};
use debtplan::payoff::amortization_table;
use debtplan::report::{render_plan, render_schedule};
use debtplan::{compute_payoff_schedule, DebtType, JsonFileStore, NewDebt, Planner};
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "debtplan", version, about = "Prioritized payoff plan for your debts")]
struct Cli {
    /// JSON file the debts are kept in
    #[arg(short, long, env = "DEBTPLAN_FILE", default_value = "debt_data.json")]
    file: PathBuf,

    /// Project from this date instead of today
    #[arg(short, long, value_name = "YYYY-MM-DD")]
    date: Option<NaiveDate>,

    #[arg(short, long, default_value = "warn")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Adds a debt and shows the updated plan
    Add {
        #[arg(long)]
        name: String,
        /// credit-card, car-loan or loan
        #[arg(long = "type", default_value = "loan")]
        debt_type: DebtType,
        /// Amount owed
        #[arg(long)]
        amount: f64,
        /// APR in percent
        #[arg(long)]
        apr: f64,
        /// Minimum monthly payment
        #[arg(long)]
        payment: f64,
    },
    /// Deletes a debt by id (or id prefix) or every debt with a name
    #[command(group(ArgGroup::new("target").required(true).args(["id", "name"])))]
    Delete {
        id: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },
    /// Shows the prioritized payoff plan (default)
    List,
    /// Shows the month by month payoff of one debt
    Schedule { id: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    SimpleLogger::new()
        .with_level(cli.log_level)
        .init()
        .context("Failed to start logger")?;

    let today = cli.date.unwrap_or_else(|| Local::now().date_naive());
    let store = JsonFileStore::new(&cli.file);
    let mut planner = Planner::open(store)
        .with_context(|| format!("Failed to load debts from {}", cli.file.display()))?;

    match cli.command.unwrap_or(Command::List) {
        Command::Add {
            name,
            debt_type,
            amount,
            apr,
            payment,
        } => {
            let id = planner.add(NewDebt {
                name,
                debt_type,
                principal: amount,
                apr,
                minimum_payment: payment,
            })?;
            info!("added debt {}", id);
            println!("Added {}\n", id.short());
            print!("{}", render_plan(&planner.plan(today)));
        }
        Command::Delete { id, name } => {
            let removed = match (id, name) {
                (Some(id), _) => vec![planner.delete_by_prefix(&id)?],
                (None, Some(name)) => planner.delete_by_name(&name)?,
                (None, None) => bail!("Give an id or --name to delete"),
            };
            for record in &removed {
                println!("Deleted {} {}", record.id.short(), record);
            }
            println!();
            print!("{}", render_plan(&planner.plan(today)));
        }
        Command::List => {
            print!("{}", render_plan(&planner.plan(today)));
        }
        Command::Schedule { id } => {
            let record = planner.find_by_prefix(&id)?;
            let schedule = compute_payoff_schedule(
                record.principal,
                record.apr,
                record.minimum_payment,
                today,
            )
            .with_context(|| format!("No schedule for {}", record.name))?;
            let rows = amortization_table(
                record.principal,
                record.apr,
                record.minimum_payment,
                today,
            )
            .with_context(|| format!("No schedule for {}", record.name))?;
            println!("{}\n", record);
            print!("{}", render_schedule(&rows, &schedule));
        }
    }
    Ok(())
}
