//! Attendance CLI: `atnd` command.
//!
//! Register profiles, declare class sessions, check in, submit and review
//! excuses, and report exam eligibility against a local data directory.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use attendance_engine::seed::seed_demo;
use attendance_engine::storage::{load_wallet, read_wallet_summary, save_wallet};
use attendance_engine::time::{micros_to_display, now_micros, rfc3339_to_micros};
use attendance_engine::{
    Address, AttendanceEngine, Coordinates, Decision, EngineConfig, ExcuseId, ExcuseSubmission,
    FileStore, FixedLocation, ProfileRegistration, ReviewVerdict, Role, Session,
    SessionDeclaration, SessionId, SessionLocation, SigningLedger, StaticIdentity, UserProfile,
    Wallet,
};

const PASSPHRASE_ENV: &str = "ATTENDANCE_PASSPHRASE";
const HOME_ENV: &str = "ATTENDANCE_HOME";

// ── Directory helpers ─────────────────────────────────────────────────────────

struct Home {
    root: PathBuf,
}

impl Home {
    /// `--home`, then `$ATTENDANCE_HOME`, then `~/.attendance`.
    fn resolve(flag: Option<PathBuf>) -> Result<Self> {
        let root = match flag {
            Some(path) => path,
            None => match std::env::var_os(HOME_ENV) {
                Some(path) => PathBuf::from(path),
                None => {
                    let home = std::env::var_os("HOME")
                        .ok_or_else(|| anyhow!("HOME not set; pass --home or set {HOME_ENV}"))?;
                    PathBuf::from(home).join(".attendance")
                }
            },
        };
        log::debug!("data directory: {}", root.display());
        Ok(Self { root })
    }

    fn wallet_dir(&self) -> PathBuf {
        self.root.join("wallets")
    }

    fn wallet_path(&self, name: &str) -> PathBuf {
        self.wallet_dir().join(format!("{name}.wallet"))
    }

    fn store_dir(&self) -> PathBuf {
        self.root.join("store")
    }

    fn journal_dir(&self) -> PathBuf {
        self.root.join("journal")
    }

    fn config_path(&self) -> PathBuf {
        self.root.join("config.json")
    }
}

// ── Passphrase helper ─────────────────────────────────────────────────────────

fn read_passphrase(prompt: &str) -> Result<String> {
    if let Ok(passphrase) = std::env::var(PASSPHRASE_ENV) {
        return Ok(passphrase);
    }
    eprint!("{prompt}");
    let mut passphrase = String::new();
    std::io::stdin()
        .read_line(&mut passphrase)
        .context("failed to read passphrase")?;
    Ok(passphrase.trim().to_string())
}

// ── Time helpers ──────────────────────────────────────────────────────────────

/// Parse an optional RFC 3339 argument, defaulting to now.
fn parse_time(at: Option<&str>) -> Result<u64> {
    match at {
        Some(s) => rfc3339_to_micros(s).with_context(|| format!("invalid time '{s}'")),
        None => Ok(now_micros()),
    }
}

fn parse_required_time(s: &str) -> Result<u64> {
    rfc3339_to_micros(s).with_context(|| format!("invalid time '{s}'"))
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// Attendance CLI: geofenced check-ins, excuses and exam eligibility.
#[derive(Parser, Debug)]
#[command(
    name = "atnd",
    about = "Attendance verification CLI",
    version,
    long_about = "atnd: attendance verification CLI\n\nRegister a teacher or student profile, declare class sessions, check in by location, submit and review\nexcuses, and report exam eligibility."
)]
struct Cli {
    /// Data directory (default: $ATTENDANCE_HOME or ~/.attendance)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// Wallet to act as (default: default)
    #[arg(long, global = true, default_value = "default")]
    wallet: String,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage wallets
    Wallet {
        #[command(subcommand)]
        subcommand: WalletCommands,
    },

    /// Register and view teacher or student profiles
    Profile {
        #[command(subcommand)]
        subcommand: ProfileCommands,
    },

    /// Declare and manage class sessions
    Session {
        #[command(subcommand)]
        subcommand: SessionCommands,
    },

    /// Check in to a session from the given coordinates
    CheckIn {
        /// Session ID
        session_id: String,

        /// Current latitude
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Current longitude
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Check-in time, RFC 3339 (default: now)
        #[arg(long)]
        at: Option<String>,
    },

    /// Submit, review and list excuses
    Excuse {
        #[command(subcommand)]
        subcommand: ExcuseCommands,
    },

    /// Eligibility and attendance reports
    Report {
        #[command(subcommand)]
        subcommand: ReportCommands,
    },

    /// Populate the store with demo sessions, records and an excuse
    Seed {
        /// Demo student address (default: a fresh wallet address)
        #[arg(long)]
        student: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum WalletCommands {
    /// Create a new wallet
    Init {
        /// Human-readable label
        #[arg(long)]
        label: Option<String>,
    },

    /// Display wallet information
    Show,

    /// List all wallets
    List,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RoleArg {
    Teacher,
    Student,
}

impl From<RoleArg> for Role {
    fn from(r: RoleArg) -> Self {
        match r {
            RoleArg::Teacher => Role::Teacher,
            RoleArg::Student => Role::Student,
        }
    }
}

#[derive(Subcommand, Debug)]
enum ProfileCommands {
    /// Register the profile for this wallet
    Init {
        /// teacher or student
        #[arg(long, value_enum)]
        role: RoleArg,

        /// Full name
        #[arg(long)]
        name: String,

        /// Email address
        #[arg(long)]
        email: String,

        /// Phone number
        #[arg(long)]
        phone: String,

        /// Institution name
        #[arg(long)]
        institution: String,

        /// Department
        #[arg(long)]
        department: Option<String>,

        /// Student ID (required for students)
        #[arg(long)]
        student_id: Option<String>,

        /// Employee ID (required for teachers)
        #[arg(long)]
        employee_id: Option<String>,
    },

    /// Show a profile
    Show {
        /// Wallet address (default: this wallet)
        address: Option<String>,
    },

    /// List every registered profile
    List,
}

#[derive(Subcommand, Debug)]
enum SessionCommands {
    /// Declare a new class session
    Declare {
        /// Course code, e.g. CS101
        #[arg(long)]
        course: String,

        /// Course name
        #[arg(long)]
        name: String,

        /// Free-text description
        #[arg(long, default_value = "")]
        description: String,

        /// Start time, RFC 3339
        #[arg(long)]
        start: String,

        /// End time, RFC 3339
        #[arg(long)]
        end: String,

        /// Class latitude
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Class longitude
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Room or building label
        #[arg(long)]
        place: Option<String>,

        /// Allowed radius in meters
        #[arg(long)]
        radius: Option<u32>,

        /// Check-in window in minutes
        #[arg(long)]
        window: Option<u32>,

        /// Excuse deadline in hours after the session ends
        #[arg(long)]
        deadline: Option<u32>,
    },

    /// List sessions
    List {
        /// Only active sessions
        #[arg(long)]
        active: bool,

        /// Only sessions declared by this wallet
        #[arg(long)]
        mine: bool,
    },

    /// Show one session with its records and excuses
    Show {
        /// Session ID
        session_id: String,
    },

    /// Deactivate a session you declared
    Deactivate {
        /// Session ID
        session_id: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum VerdictArg {
    Approve,
    Reject,
}

impl From<VerdictArg> for ReviewVerdict {
    fn from(v: VerdictArg) -> Self {
        match v {
            VerdictArg::Approve => ReviewVerdict::Approve,
            VerdictArg::Reject => ReviewVerdict::Reject,
        }
    }
}

#[derive(Subcommand, Debug)]
enum ExcuseCommands {
    /// Submit an excuse for a missed session
    Submit {
        /// Session ID
        session_id: String,

        /// Reason for the absence
        #[arg(long)]
        reason: String,

        /// Submission time, RFC 3339 (default: now)
        #[arg(long)]
        at: Option<String>,
    },

    /// Approve or reject a pending excuse
    Review {
        /// Excuse ID
        excuse_id: String,

        /// approve or reject
        #[arg(long, value_enum)]
        verdict: VerdictArg,

        /// Review notes
        #[arg(long)]
        notes: Option<String>,

        /// Review time, RFC 3339 (default: now)
        #[arg(long)]
        at: Option<String>,
    },

    /// List this wallet's excuses, or pending excuses for its sessions
    List {
        /// Pending excuses awaiting this wallet's review
        #[arg(long)]
        pending: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ReportCommands {
    /// Exam eligibility for one course
    Eligibility {
        /// Course code
        #[arg(long)]
        course: String,

        /// Student address (default: this wallet)
        #[arg(long)]
        student: Option<String>,
    },

    /// Per-course attendance summary
    Summary {
        /// Student address (default: this wallet)
        #[arg(long)]
        student: Option<String>,
    },

    /// Overall attendance statistics
    Stats {
        /// Student address (default: this wallet)
        #[arg(long)]
        student: Option<String>,
    },
}

/// Options shared by every command.
struct Opts {
    home: Home,
    wallet: String,
    json: bool,
    verbose: bool,
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let opts = match Home::resolve(cli.home) {
        Ok(home) => Opts {
            home,
            wallet: cli.wallet,
            json: cli.json,
            verbose: cli.verbose,
        },
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Wallet { subcommand } => match subcommand {
            WalletCommands::Init { label } => cmd_wallet_init(&opts, label),
            WalletCommands::Show => cmd_wallet_show(&opts),
            WalletCommands::List => cmd_wallet_list(&opts),
        },
        Commands::Profile { subcommand } => match subcommand {
            ProfileCommands::Init {
                role,
                name,
                email,
                phone,
                institution,
                department,
                student_id,
                employee_id,
            } => cmd_profile_init(
                &opts,
                role.into(),
                ProfileRegistration {
                    name,
                    email,
                    phone,
                    institution,
                    department,
                    student_id,
                    employee_id,
                },
            ),
            ProfileCommands::Show { address } => cmd_profile_show(&opts, address),
            ProfileCommands::List => cmd_profile_list(&opts),
        },
        Commands::Session { subcommand } => match subcommand {
            SessionCommands::Declare {
                course,
                name,
                description,
                start,
                end,
                lat,
                lon,
                place,
                radius,
                window,
                deadline,
            } => cmd_session_declare(
                &opts,
                SessionArgs {
                    course,
                    name,
                    description,
                    start,
                    end,
                    lat,
                    lon,
                    place,
                    radius,
                    window,
                    deadline,
                },
            ),
            SessionCommands::List { active, mine } => cmd_session_list(&opts, active, mine),
            SessionCommands::Show { session_id } => cmd_session_show(&opts, &session_id),
            SessionCommands::Deactivate { session_id } => cmd_session_deactivate(&opts, &session_id),
        },
        Commands::CheckIn {
            session_id,
            lat,
            lon,
            at,
        } => cmd_check_in(&opts, &session_id, lat, lon, at.as_deref()),
        Commands::Excuse { subcommand } => match subcommand {
            ExcuseCommands::Submit {
                session_id,
                reason,
                at,
            } => cmd_excuse_submit(&opts, &session_id, &reason, at.as_deref()),
            ExcuseCommands::Review {
                excuse_id,
                verdict,
                notes,
                at,
            } => cmd_excuse_review(&opts, &excuse_id, verdict.into(), notes.as_deref(), at.as_deref()),
            ExcuseCommands::List { pending } => cmd_excuse_list(&opts, pending),
        },
        Commands::Report { subcommand } => match subcommand {
            ReportCommands::Eligibility { course, student } => {
                cmd_report_eligibility(&opts, &course, student)
            }
            ReportCommands::Summary { student } => cmd_report_summary(&opts, student),
            ReportCommands::Stats { student } => cmd_report_stats(&opts, student),
        },
        Commands::Seed { student } => cmd_seed(&opts, student),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

// ── Engine helpers ────────────────────────────────────────────────────────────

fn load_config(opts: &Opts) -> Result<EngineConfig> {
    let path = opts.home.config_path();
    let config = EngineConfig::load_or_default(&path).context("failed to load config")?;
    if opts.verbose {
        eprintln!("config: {}", path.display());
    }
    Ok(config)
}

fn open_store(opts: &Opts) -> Result<FileStore> {
    FileStore::open(opts.home.store_dir()).context("failed to open event store")
}

/// Engine for read-only commands; no passphrase needed.
fn open_reader(opts: &Opts) -> Result<AttendanceEngine<FileStore>> {
    Ok(AttendanceEngine::new(open_store(opts)?, load_config(opts)?))
}

/// Unlock the wallet and build an engine that signs through it.
fn open_writer(opts: &Opts) -> Result<(Address, AttendanceEngine<FileStore, SigningLedger>)> {
    let path = wallet_path_checked(opts)?;
    let passphrase = read_passphrase(&format!("Passphrase for wallet '{}': ", opts.wallet))?;
    let wallet = load_wallet(&path, &passphrase).context("failed to unlock wallet")?;
    let address = wallet.address();

    let config = load_config(opts)?;
    let store = open_store(opts)?;
    let ledger = SigningLedger::new(wallet, opts.home.journal_dir()).context("failed to open journal")?;
    Ok((address, AttendanceEngine::with_ledger(store, ledger, config)))
}

fn wallet_path_checked(opts: &Opts) -> Result<PathBuf> {
    let path = opts.home.wallet_path(&opts.wallet);
    if !path.exists() {
        return Err(anyhow!(
            "wallet '{}' not found (expected at {}); run `atnd wallet init` first",
            opts.wallet,
            path.display()
        ));
    }
    Ok(path)
}

/// The wallet's address, read without the passphrase.
fn wallet_address(opts: &Opts) -> Result<Address> {
    let path = wallet_path_checked(opts)?;
    let summary = read_wallet_summary(&path).context("failed to read wallet file")?;
    Ok(summary.address)
}

fn student_or_wallet(opts: &Opts, student: Option<String>) -> Result<Address> {
    match student {
        Some(s) => Ok(Address::from(s)),
        None => wallet_address(opts),
    }
}

/// Print the decision as JSON when asked, then turn rejections into an error.
fn settle<T: Serialize>(decision: Decision<T>, opts: &Opts) -> Result<T> {
    if opts.json {
        println!("{}", serde_json::to_string_pretty(&decision)?);
    }
    match decision {
        Decision::Accepted(value) => Ok(value),
        Decision::Rejected(rejections) => {
            let reasons: Vec<String> = rejections.iter().map(ToString::to_string).collect();
            Err(anyhow!("rejected: {}", reasons.join(" ")))
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ── Wallet commands ───────────────────────────────────────────────────────────

/// `atnd wallet init [--label LABEL]`
fn cmd_wallet_init(opts: &Opts, label: Option<String>) -> Result<()> {
    let path = opts.home.wallet_path(&opts.wallet);
    if path.exists() {
        return Err(anyhow!(
            "wallet '{}' already exists at {}",
            opts.wallet,
            path.display()
        ));
    }

    let passphrase = read_passphrase("Enter passphrase for new wallet: ")?;
    if passphrase.is_empty() {
        return Err(anyhow!("passphrase cannot be empty"));
    }
    if std::env::var_os(PASSPHRASE_ENV).is_none() {
        let confirm = read_passphrase("Confirm passphrase: ")?;
        if passphrase != confirm {
            return Err(anyhow!("passphrases do not match"));
        }
    }

    let wallet = Wallet::generate(label);
    save_wallet(&wallet, &path, &passphrase).context("failed to save wallet")?;

    if opts.json {
        return print_json(&wallet.summary());
    }
    println!("Created wallet '{}'", opts.wallet);
    println!("  Address: {}", wallet.address());
    println!("  File:    {}", path.display());
    if opts.verbose {
        println!("  Created: {}", micros_to_display(wallet.created_at));
    }
    Ok(())
}

/// `atnd wallet show`
fn cmd_wallet_show(opts: &Opts) -> Result<()> {
    let path = wallet_path_checked(opts)?;
    let summary = read_wallet_summary(&path).context("failed to read wallet file")?;

    if opts.json {
        return print_json(&summary);
    }
    println!("Wallet: {}", opts.wallet);
    println!("  Address: {}", summary.address);
    if let Some(ref label) = summary.label {
        println!("  Label:   {label}");
    }
    println!("  Created: {}", micros_to_display(summary.created_at));
    if opts.verbose {
        match summary.address.public_key_hex() {
            Ok(key) => println!("  Key:     {key}"),
            Err(e) => println!("  Key:     INVALID ({e})"),
        }
    }
    Ok(())
}

/// `atnd wallet list`
fn cmd_wallet_list(opts: &Opts) -> Result<()> {
    let dir = opts.home.wallet_dir();
    if !dir.exists() {
        println!("No wallets found (directory {} does not exist)", dir.display());
        return Ok(());
    }

    let mut entries: Vec<(String, PathBuf)> = std::fs::read_dir(&dir)
        .context("failed to read wallet directory")?
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let path = e.path();
            if path.extension().map(|x| x == "wallet").unwrap_or(false) {
                let stem = path.file_stem()?.to_string_lossy().into_owned();
                Some((stem, path))
            } else {
                None
            }
        })
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    if entries.is_empty() {
        println!("No wallets found in {}", dir.display());
        return Ok(());
    }

    println!("{:<16} {:<60} CREATED", "NAME", "ADDRESS");
    println!("{}", "-".repeat(100));
    for (name, path) in &entries {
        match read_wallet_summary(path) {
            Ok(summary) => println!(
                "{:<16} {:<60} {}",
                name,
                summary.address,
                micros_to_display(summary.created_at)
            ),
            Err(e) => println!("{:<16} (failed to read: {e})", name),
        }
    }
    Ok(())
}

// ── Session commands ──────────────────────────────────────────────────────────

struct SessionArgs {
    course: String,
    name: String,
    description: String,
    start: String,
    end: String,
    lat: f64,
    lon: f64,
    place: Option<String>,
    radius: Option<u32>,
    window: Option<u32>,
    deadline: Option<u32>,
}

/// `atnd session declare --course CODE --name NAME --start T --end T --lat LAT --lon LON`
fn cmd_session_declare(opts: &Opts, args: SessionArgs) -> Result<()> {
    let declaration = SessionDeclaration {
        course_code: args.course,
        course_name: args.name,
        description: args.description,
        start_time: parse_required_time(&args.start)?,
        end_time: parse_required_time(&args.end)?,
        location: SessionLocation::new(args.lat, args.lon, args.place),
        allowed_radius_meters: args.radius,
        check_in_window_minutes: args.window,
        excuse_deadline_hours: args.deadline,
    };

    let (teacher, engine) = open_writer(opts)?;
    let decision = engine
        .declare_session(&teacher, declaration, now_micros())
        .context("failed to declare session")?;
    let session = settle(decision, opts)?;

    if !opts.json {
        println!("Declared session {}", session.id);
        print_session(&session, opts.verbose);
    }
    Ok(())
}

fn print_session(session: &Session, verbose: bool) {
    println!("  Course:    {} ({})", session.course_code, session.course_name);
    println!(
        "  Time:      {} to {}",
        micros_to_display(session.start_time),
        micros_to_display(session.end_time)
    );
    let place = session.location.label.as_deref().unwrap_or("-");
    println!(
        "  Location:  {:.4}, {:.4} ({place}), radius {}m",
        session.location.latitude, session.location.longitude, session.allowed_radius_meters
    );
    println!(
        "  Check-in:  {} minutes from start, excuses within {} hours of end",
        session.check_in_window_minutes, session.excuse_deadline_hours
    );
    println!(
        "  Status:    {}, {} attendee(s)",
        if session.active { "active" } else { "inactive" },
        session.attendee_count
    );
    if verbose {
        if !session.description.is_empty() {
            println!("  Notes:     {}", session.description);
        }
        println!("  Declared:  {} by {}", micros_to_display(session.declared_at), session.created_by);
        println!("  Reference: {}", session.reference);
    }
}

/// `atnd session list [--active] [--mine]`
fn cmd_session_list(opts: &Opts, active: bool, mine: bool) -> Result<()> {
    let engine = open_reader(opts)?;
    let mut sessions = if mine {
        engine.sessions_by_creator(&wallet_address(opts)?)?
    } else {
        engine.sessions()?
    };
    if active {
        sessions.retain(|s| s.active);
    }

    if opts.json {
        return print_json(&sessions);
    }
    if sessions.is_empty() {
        println!("No sessions.");
        return Ok(());
    }

    println!("{:<30} {:<10} {:<22} {:<9} ATTENDEES", "SESSION ID", "COURSE", "START", "STATUS");
    println!("{}", "-".repeat(84));
    for s in &sessions {
        println!(
            "{:<30} {:<10} {:<22} {:<9} {}",
            s.id,
            s.course_code,
            micros_to_display(s.start_time),
            if s.active { "active" } else { "inactive" },
            s.attendee_count
        );
    }
    Ok(())
}

/// `atnd session show SESSION_ID`
fn cmd_session_show(opts: &Opts, session_id: &str) -> Result<()> {
    let engine = open_reader(opts)?;
    let id = SessionId::from(session_id);
    let session = engine
        .session(&id)?
        .ok_or_else(|| anyhow!("session '{session_id}' not found"))?;
    let records = engine.session_records(&id)?;
    let excuses = engine.session_excuses(&id)?;

    if opts.json {
        return print_json(&serde_json::json!({
            "session": session,
            "records": records,
            "excuses": excuses,
        }));
    }

    println!("Session {}", session.id);
    print_session(&session, opts.verbose);

    println!("  Records ({}):", records.len());
    for r in &records {
        println!(
            "    {} {:<8} {:>4}m  {}",
            micros_to_display(r.timestamp),
            r.status,
            r.distance_from_class,
            r.student.short()
        );
    }
    println!("  Excuses ({}):", excuses.len());
    for e in &excuses {
        println!("    {} {:<8} {}", e.id, e.approval_status, e.student.short());
    }
    Ok(())
}

/// `atnd session deactivate SESSION_ID`
fn cmd_session_deactivate(opts: &Opts, session_id: &str) -> Result<()> {
    let (teacher, engine) = open_writer(opts)?;
    let decision = engine
        .deactivate_session(&teacher, &SessionId::from(session_id))
        .context("failed to deactivate session")?;
    let session = settle(decision, opts)?;
    if !opts.json {
        println!("Session {} is inactive", session.id);
    }
    Ok(())
}

// ── Profile commands ──────────────────────────────────────────────────────────

/// `atnd profile init --role teacher|student --name ... --email ... --phone ... --institution ...`
fn cmd_profile_init(opts: &Opts, role: Role, registration: ProfileRegistration) -> Result<()> {
    let (address, engine) = open_writer(opts)?;
    let decision = engine
        .register_profile(&address, role, registration, now_micros())
        .context("failed to register profile")?;
    let profile = settle(decision, opts)?;

    if !opts.json {
        println!("Registered {} profile {}", profile.role, profile.id);
        print_profile(&profile, opts.verbose);
    }
    Ok(())
}

/// `atnd profile show [ADDRESS]`
fn cmd_profile_show(opts: &Opts, address: Option<String>) -> Result<()> {
    let address = student_or_wallet(opts, address)?;
    let engine = open_reader(opts)?;
    let profile = engine
        .profile(&address)?
        .ok_or_else(|| anyhow!("no profile for {address}; run `atnd profile init` first"))?;

    if opts.json {
        return print_json(&profile);
    }
    println!("Profile {}", profile.id);
    print_profile(&profile, opts.verbose);
    Ok(())
}

/// `atnd profile list`
fn cmd_profile_list(opts: &Opts) -> Result<()> {
    let profiles = open_reader(opts)?.profiles()?;

    if opts.json {
        return print_json(&profiles);
    }
    if profiles.is_empty() {
        println!("No profiles.");
        return Ok(());
    }
    println!("{:<8} {:<24} {:<32} ADDRESS", "ROLE", "NAME", "EMAIL");
    println!("{}", "-".repeat(96));
    for p in &profiles {
        println!("{:<8} {:<24} {:<32} {}", p.role, p.name, p.email, p.address.short());
    }
    Ok(())
}

fn print_profile(profile: &UserProfile, verbose: bool) {
    println!("  Name:        {}", profile.name);
    println!("  Role:        {}", profile.role);
    println!("  Email:       {}", profile.email);
    println!("  Institution: {}", profile.institution);
    if let Some(ref department) = profile.department {
        println!("  Department:  {department}");
    }
    if let Some(ref id) = profile.student_id {
        println!("  Student ID:  {id}");
    }
    if let Some(ref id) = profile.employee_id {
        println!("  Employee ID: {id}");
    }
    if verbose {
        println!("  Phone:       {}", profile.phone);
        println!("  Address:     {}", profile.address);
        println!("  Verified:    {}", if profile.verified { "yes" } else { "no" });
        println!("  Created:     {}", micros_to_display(profile.created_at));
    }
}

// ── Check-in ──────────────────────────────────────────────────────────────────

/// `atnd check-in SESSION_ID --lat LAT --lon LON [--at TIME]`
fn cmd_check_in(opts: &Opts, session_id: &str, lat: f64, lon: f64, at: Option<&str>) -> Result<()> {
    let now = parse_time(at)?;
    let (student, engine) = open_writer(opts)?;

    let decision = engine
        .check_in_with(
            &SessionId::from(session_id),
            &StaticIdentity::signed_in(student),
            &FixedLocation(Coordinates::new(lat, lon)),
            now,
        )
        .context("check-in failed")?;
    let record = settle(decision, opts)?;

    if !opts.json {
        println!("Checked in to {} as {}", record.session_id, record.status);
        println!("  Distance:  {}m", record.distance_from_class);
        println!("  Attempts:  {}", record.check_in_attempts);
        println!("  Reference: {}", record.reference);
    }
    Ok(())
}

// ── Excuse commands ───────────────────────────────────────────────────────────

/// `atnd excuse submit SESSION_ID --reason TEXT [--at TIME]`
fn cmd_excuse_submit(opts: &Opts, session_id: &str, reason: &str, at: Option<&str>) -> Result<()> {
    let now = parse_time(at)?;
    let (student, engine) = open_writer(opts)?;
    let decision = engine
        .submit_excuse(&SessionId::from(session_id), &student, reason, now)
        .context("failed to submit excuse")?;
    let excuse = settle(decision, opts)?;

    if !opts.json {
        println!("Submitted excuse {}", excuse.id);
        println!("  Session:   {}", excuse.session_id);
        println!("  Status:    {}", excuse.approval_status);
        println!("  Reference: {}", excuse.reference);
    }
    Ok(())
}

/// `atnd excuse review EXCUSE_ID --verdict approve|reject [--notes TEXT]`
fn cmd_excuse_review(
    opts: &Opts,
    excuse_id: &str,
    verdict: ReviewVerdict,
    notes: Option<&str>,
    at: Option<&str>,
) -> Result<()> {
    let now = parse_time(at)?;
    let (reviewer, engine) = open_writer(opts)?;
    let decision = engine
        .review_excuse(&ExcuseId::from(excuse_id), &reviewer, verdict, notes, now)
        .context("failed to review excuse")?;
    let outcome = settle(decision, opts)?;

    if !opts.json {
        println!("Excuse {} {}", outcome.excuse.id, outcome.excuse.approval_status);
        if let Some(record) = &outcome.record {
            let how = if outcome.record_created { "created" } else { "updated" };
            println!("  Record {how}: {} ({})", record.id, record.status);
        }
        println!("  Reference: {}", outcome.reference);
    }
    Ok(())
}

/// `atnd excuse list [--pending]`
fn cmd_excuse_list(opts: &Opts, pending: bool) -> Result<()> {
    let address = wallet_address(opts)?;
    let engine = open_reader(opts)?;
    let excuses = if pending {
        engine.pending_excuses_for(&address)?
    } else {
        engine.student_excuses(&address)?
    };

    if opts.json {
        return print_json(&excuses);
    }
    if excuses.is_empty() {
        println!("No excuses.");
        return Ok(());
    }
    print_excuses(&excuses, opts.verbose);
    Ok(())
}

fn print_excuses(excuses: &[ExcuseSubmission], verbose: bool) {
    println!("{:<30} {:<30} {:<9} SUBMITTED", "EXCUSE ID", "SESSION ID", "STATUS");
    println!("{}", "-".repeat(94));
    for e in excuses {
        println!(
            "{:<30} {:<30} {:<9} {}",
            e.id,
            e.session_id,
            e.approval_status,
            micros_to_display(e.submitted_at)
        );
        if verbose {
            println!("    Reason: {}", e.reason);
            if let Some(ref notes) = e.review_notes {
                println!("    Notes:  {notes}");
            }
        }
    }
}

// ── Reports ───────────────────────────────────────────────────────────────────

/// `atnd report eligibility --course CODE [--student ADDRESS]`
fn cmd_report_eligibility(opts: &Opts, course: &str, student: Option<String>) -> Result<()> {
    let student = student_or_wallet(opts, student)?;
    let engine = open_reader(opts)?;
    let e = engine.eligibility(&student, course)?;

    if opts.json {
        return print_json(&e);
    }
    println!("Eligibility for {}", e.course_code);
    println!("  Student:    {}", e.student);
    println!(
        "  Attendance: {}/{} sessions ({:.1}%)",
        e.attended_sessions, e.total_sessions, e.attendance_percentage
    );
    println!("  Required:   {:.1}%", e.required_percentage);
    println!("  Status:     {}", e.band);
    if let Some(n) = e.sessions_needed {
        println!("  Needed:     {n} more session(s)");
    }
    Ok(())
}

/// `atnd report summary [--student ADDRESS]`
fn cmd_report_summary(opts: &Opts, student: Option<String>) -> Result<()> {
    let student = student_or_wallet(opts, student)?;
    let engine = open_reader(opts)?;
    let rows = engine.course_summaries(&student)?;

    if opts.json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        println!("No sessions.");
        return Ok(());
    }
    println!(
        "{:<10} {:>5} {:>8} {:>7} {:>6} {:>7}  STATUS",
        "COURSE", "TOTAL", "ATTENDED", "EXCUSED", "MISSED", "PCT"
    );
    println!("{}", "-".repeat(64));
    for r in &rows {
        println!(
            "{:<10} {:>5} {:>8} {:>7} {:>6} {:>6.1}%  {}",
            r.course_code,
            r.total_sessions,
            r.attended_sessions,
            r.excused_sessions,
            r.missed_sessions,
            r.attendance_percentage,
            r.eligibility.band
        );
    }
    Ok(())
}

/// `atnd report stats [--student ADDRESS]`
fn cmd_report_stats(opts: &Opts, student: Option<String>) -> Result<()> {
    let student = student_or_wallet(opts, student)?;
    let engine = open_reader(opts)?;
    let stats = engine.attendance_stats(&student)?;

    if opts.json {
        return print_json(&stats);
    }
    println!("Attendance for {}", stats.student);
    println!("  Sessions:           {}", stats.total_sessions);
    println!("  Attended:           {}", stats.attended_sessions);
    println!("  Excused absences:   {}", stats.excused_absences);
    println!("  Unexcused absences: {}", stats.unexcused_absences);
    println!("  Attendance rate:    {:.1}%", stats.attendance_rate);
    Ok(())
}

// ── Seed ──────────────────────────────────────────────────────────────────────

/// `atnd seed [--student ADDRESS]`
fn cmd_seed(opts: &Opts, student: Option<String>) -> Result<()> {
    let student = match student {
        Some(s) => Address::from(s),
        None => Wallet::generate(Some("demo student".into())).address(),
    };
    let (teacher, engine) = open_writer(opts)?;
    let report = seed_demo(&engine, &teacher, &student, now_micros()).context("failed to seed demo data")?;

    if opts.json {
        return print_json(&report);
    }
    println!(
        "Seeded {} profile(s), {} sessions, {} records, {} excuse(s)",
        report.profiles.len(),
        report.sessions.len(),
        report.records.len(),
        report.excuses.len()
    );
    println!("  Teacher: {teacher}");
    println!("  Student: {student}");
    if opts.verbose {
        println!("  Store:   {}", opts.home.store_dir().display());
    }
    Ok(())
}
