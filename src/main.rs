use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use clinic_admin::{
    auth::ResolvedRole,
    config::{Config, Overrides},
    models::{Appointment, AppointmentStatus, NewAppointment, Role},
    policy::{self, RowActions},
    services::clinic_api::ClinicApiClient,
    session::SessionStore,
    telemetry,
    views::{
        self, Dashboard, DashboardEntry, LoginForm, RegisterForm, StatusChange, ViewGuard,
    },
};
use reqwest::Client;
use tracing::debug;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "clinic-admin")]
#[command(about = "Staff console for the clinic appointment API", long_about = None)]
#[command(version)]
struct Cli {
    /// Base URL of the clinic API (overrides CLINIC_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Where the session is kept (overrides CLINIC_SESSION_FILE)
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    /// Debug logging for this crate
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "CLINIC_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create a staff account
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "CLINIC_PASSWORD", hide_env_values = true)]
        password: String,
        /// ADMIN, RECEPTIONIST or DOCTOR
        #[arg(short, long, default_value_t = Role::Receptionist)]
        role: Role,
    },
    /// Forget the stored session
    Logout,
    /// Show the role in the stored session and what it may do
    Whoami,
    /// List appointments, earliest first
    List,
    /// Show one appointment
    Show { id: Uuid },
    /// Schedule a new appointment
    Create {
        #[arg(long)]
        patient: String,
        #[arg(long)]
        doctor: String,
        #[arg(long)]
        specialty: String,
        /// Local date and time, e.g. 2024-03-01T10:00
        #[arg(long)]
        date_time: String,
    },
    /// Move an appointment to its next status
    Advance { id: Uuid },
    /// Delete an appointment
    Delete { id: Uuid },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Before parsing so `.env` can supply CLINIC_PASSWORD.
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env(Overrides {
        api_url: cli.api_url.clone(),
        session_file: cli.session_file.clone(),
    })
    .context("invalid configuration")?;

    telemetry::init_tracing(config.log_format, cli.verbose);

    let client = Client::builder()
        .timeout(config.http_timeout)
        .build()
        .context("failed to build HTTP client")?;
    let api = Arc::new(ClinicApiClient::new(client, config.api_url.clone()));
    let session = SessionStore::file(&config.session_file);
    debug!(api_url = %api.base_url(), session_file = %config.session_file.display(), "starting");

    run(cli.command, api, session).await
}

async fn run(
    command: Commands,
    api: Arc<ClinicApiClient>,
    session: SessionStore,
) -> anyhow::Result<()> {
    match command {
        Commands::Login { username, password } => {
            let outcome = views::login(api.as_ref(), &session, LoginForm { username, password })
                .await?;
            if outcome.role.is_empty() {
                println!("Logged in.");
            } else {
                println!("Logged in as {}.", describe_role(&outcome.role));
            }
        }
        Commands::Register {
            username,
            password,
            role,
        } => {
            let outcome = views::register(
                api.as_ref(),
                RegisterForm {
                    username,
                    password,
                    role,
                },
            )
            .await?;
            println!("{}", outcome.message);
        }
        Commands::Logout => {
            session.clear()?;
            println!("Logged out.");
        }
        Commands::Whoami => whoami(&session),
        Commands::List => {
            let Some(dashboard) = open(api, session).await? else {
                return Ok(());
            };
            print_table(&dashboard);
        }
        Commands::Show { id } => {
            let Some(dashboard) = open(api, session).await? else {
                return Ok(());
            };
            let appointment = dashboard.fetch(id).await?;
            print_detail(&appointment, dashboard.row_actions(&appointment));
        }
        Commands::Create {
            patient,
            doctor,
            specialty,
            date_time,
        } => {
            let Some(mut dashboard) = open(api, session).await? else {
                return Ok(());
            };
            dashboard
                .create(NewAppointment {
                    patient_name: patient,
                    doctor_name: doctor,
                    specialty,
                    date_time,
                })
                .await?;
            println!("Appointment created.");
            finish(&dashboard);
        }
        Commands::Advance { id } => {
            let Some(mut dashboard) = open(api, session).await? else {
                return Ok(());
            };
            match dashboard.change_status(id).await? {
                StatusChange::Advanced { from, to } => println!("Status changed: {from} -> {to}."),
                StatusChange::Unchanged(status) => {
                    println!("Status {status} has no next step; nothing sent.")
                }
            }
            finish(&dashboard);
        }
        Commands::Delete { id } => {
            let Some(mut dashboard) = open(api, session).await? else {
                return Ok(());
            };
            dashboard.delete(id).await?;
            println!("Appointment deleted.");
            finish(&dashboard);
        }
    }
    Ok(())
}

/// Enter the dashboard. `None` means there is no session and the user was
/// pointed at the login command instead.
async fn open(
    api: Arc<ClinicApiClient>,
    session: SessionStore,
) -> anyhow::Result<Option<Dashboard>> {
    match Dashboard::enter(api, session, ViewGuard::default()).await {
        DashboardEntry::Redirect(_) => {
            println!("Not logged in. Run `clinic-admin login --username <name>` first.");
            Ok(None)
        }
        DashboardEntry::Ready {
            load_error: Some(error),
            ..
        } => Err(error.into()),
        DashboardEntry::Ready {
            dashboard,
            load_error: None,
        } => Ok(Some(dashboard)),
    }
}

fn finish(dashboard: &Dashboard) {
    match dashboard.stale_notice() {
        Some(notice) => eprintln!("The list could not be refreshed: {notice}"),
        None => print_table(dashboard),
    }
}

fn whoami(session: &SessionStore) {
    let Some(credential) = session.credential() else {
        println!("Not logged in.");
        return;
    };
    let role = ResolvedRole::from_credential(&credential);
    if role.is_empty() {
        println!("Logged in, but the session carries no role.");
    } else {
        println!("Role: {}", describe_role(&role));
    }

    let parsed = role.role;
    let allowed = [
        ("create appointments", policy::can_create(parsed)),
        ("delete appointments", policy::can_delete(parsed)),
        (
            "advance scheduled",
            policy::can_change_status(parsed, AppointmentStatus::Scheduled),
        ),
    ];
    for (action, enabled) in allowed {
        println!("  {action:<20} {}", if enabled { "yes" } else { "no" });
    }
}

fn describe_role(role: &ResolvedRole) -> String {
    match role.role {
        Some(known) => known.label().to_string(),
        None => format!("{} (unrecognized)", role.raw),
    }
}

fn format_when(appointment: &Appointment) -> String {
    appointment
        .scheduled_at()
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| appointment.date_time.clone())
}

fn format_actions(actions: RowActions) -> String {
    let mut enabled = Vec::new();
    if actions.change_status {
        enabled.push("advance");
    }
    if actions.delete {
        enabled.push("delete");
    }
    if enabled.is_empty() {
        "-".into()
    } else {
        enabled.join(",")
    }
}

fn print_table(dashboard: &Dashboard) {
    if dashboard.appointments().is_empty() {
        println!("No appointments.");
        return;
    }
    println!(
        "{:>3}  {:<36}  {:<20}  {:<20}  {:<16}  {:<16}  {:<12}  ACTIONS",
        "#", "ID", "PATIENT", "DOCTOR", "SPECIALTY", "DATE/TIME", "STATUS"
    );
    for (position, appointment, actions) in dashboard.rows() {
        println!(
            "{:>3}  {:<36}  {:<20}  {:<20}  {:<16}  {:<16}  {:<12}  {}",
            position,
            appointment.id,
            appointment.patient_name,
            appointment.doctor_name,
            appointment.specialty,
            format_when(appointment),
            appointment.status,
            format_actions(actions)
        );
    }
}

fn print_detail(appointment: &Appointment, actions: RowActions) {
    println!("ID:        {}", appointment.id);
    println!("Patient:   {}", appointment.patient_name);
    println!("Doctor:    {}", appointment.doctor_name);
    println!("Specialty: {}", appointment.specialty);
    println!("When:      {}", format_when(appointment));
    println!("Status:    {}", appointment.status);
    println!("Actions:   {}", format_actions(actions));
}
