use std::fs;
use std::io;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::debug;

use crate::auth::{
    AuthError, Directory, EmployeeCode, Session, SessionManager, SessionState, mask_manual_input,
};
use crate::cargo::{CargoInput, CargoRecord, CargoStore, Packaging, Phase, Photo};
use crate::cli::{AddArgs, Cli, Commands, RemoveArgs};
use crate::config::Config;
use crate::consts::DB_FILE;
use crate::error::AppError;
use crate::notify::{ConsoleNotifier, Notifier, Severity};
use crate::output::{
    NumberFormat, TableOptions, added_message, output_decode_json, output_employees_json,
    output_groups_json, output_history_csv, output_history_json, output_records_csv,
    output_records_json, output_removal_json, output_snapshot_json, output_status_json,
    output_summary_json, print_employees_table, print_groups_table, print_history_table,
    print_records_table, print_status, print_summary_table, shipment_message,
};
use crate::qr::{
    LineSource, Scanner, describe_payload, extract_employee_code, interpret, scan_until_recognized,
};
use crate::storage::{KvStore, MemoryStore, SqliteStore, StorageError};
use crate::utils::{JqFilter, Timezone};

/// Print JSON output, optionally filtering through jq
fn print_json(json: &str, jq_filter: Option<&str>) -> Result<(), AppError> {
    match jq_filter {
        Some(filter) => print!("{}", JqFilter::new(filter).apply(json)?),
        None => println!("{json}"),
    }
    Ok(())
}

pub(crate) struct CommandContext<'a> {
    pub(crate) cli: &'a Cli,
    pub(crate) config: &'a Config,
    pub(crate) kv: Rc<dyn KvStore>,
    pub(crate) sessions: SessionManager,
    pub(crate) notifier: &'a dyn Notifier,
    pub(crate) table: TableOptions,
}

impl CommandContext<'_> {
    fn jq(&self) -> Option<&str> {
        self.cli.jq.as_deref()
    }

    fn open_cargo(&self) -> Result<CargoStore, AppError> {
        let mut cargo = CargoStore::open(self.kv.clone(), self.config.limits())?;
        if let Some(warning) = cargo.take_warning() {
            self.notifier.notify(&warning, Severity::Warning);
        }
        Ok(cargo)
    }

    /// Active session, or the reason there is none
    fn require_session(&self) -> Result<Session, AppError> {
        Ok(self.sessions.require(Utc::now())?)
    }
}

fn open_store(cli: &Cli, config: &Config) -> Result<Rc<dyn KvStore>, AppError> {
    if cli.memory {
        debug!("using in-memory store");
        return Ok(Rc::new(MemoryStore::new()));
    }
    let dir = config
        .resolve_data_dir(cli.data_dir.as_deref())
        .ok_or_else(|| StorageError::Unavailable("no data directory, pass --data-dir".to_string()))?;
    let path = dir.join(DB_FILE);
    debug!(path = %path.display(), "opening store");
    Ok(Rc::new(SqliteStore::open(&path)?))
}

fn load_directory(config: &Config, notifier: &dyn Notifier) -> Result<Directory, AppError> {
    let Some(path) = &config.roster else {
        return Ok(Directory::demo());
    };
    let directory = Directory::load(path)?;
    if !directory.skipped().is_empty() {
        notifier.notify(
            &format!(
                "Roster entries skipped, not EMP### codes: {}",
                directory.skipped().join(", ")
            ),
            Severity::Warning,
        );
    }
    Ok(directory)
}

pub(crate) fn run(cli: &Cli, config: &Config) -> Result<(), AppError> {
    let timezone = Timezone::parse(cli.timezone.as_deref())?;
    let number_format = NumberFormat::from_locale(cli.locale.as_deref())?;
    let notifier = ConsoleNotifier::new(cli.use_stderr_color());

    let directory = load_directory(config, &notifier)?;
    let kv = open_store(cli, config)?;
    let sessions = SessionManager::new(kv.clone(), directory, config.session_window());

    let ctx = CommandContext {
        cli,
        config,
        kv,
        sessions,
        notifier: &notifier,
        table: TableOptions {
            order: cli.order,
            use_color: cli.use_color(),
            number_format,
            timezone,
        },
    };

    match &cli.command {
        Some(Commands::Login { code }) => handle_login(&ctx, code),
        Some(Commands::Scan { cooldown_secs }) => handle_scan(&ctx, *cooldown_secs),
        Some(Commands::Decode { payload }) => handle_decode(&ctx, payload),
        Some(Commands::Status) | None => handle_status(&ctx),
        Some(Commands::Logout) => handle_logout(&ctx),
        Some(Commands::Employees) => handle_employees(&ctx),
        Some(Commands::Add(args)) => handle_add(&ctx, args),
        Some(Commands::List) => handle_list(&ctx),
        Some(Commands::Groups) => handle_groups(&ctx),
        Some(Commands::Summary) => handle_summary(&ctx),
        Some(Commands::Remove(args)) => handle_remove(&ctx, args),
        Some(Commands::Clear) => handle_clear(&ctx),
        Some(Commands::Send) => handle_send(&ctx),
        Some(Commands::History) => handle_history(&ctx),
    }
}

/// Typed input is masked first; a pasted badge payload falls back to the
/// QR interpreter.
fn parse_login_code(raw: &str) -> Result<EmployeeCode, AuthError> {
    match EmployeeCode::parse(&mask_manual_input(raw)) {
        Ok(code) => Ok(code),
        Err(e) => extract_employee_code(raw).ok_or(e),
    }
}

fn report_login(ctx: &CommandContext<'_>, session: &Session) -> Result<(), AppError> {
    ctx.notifier
        .notify(&format!("Welcome, {}!", session.name), Severity::Success);
    if ctx.cli.json {
        let places = ctx.open_cargo()?.records().len();
        let json = output_status_json(Some(session), Utc::now(), ctx.sessions.validity(), places);
        print_json(&json, ctx.jq())?;
    }
    Ok(())
}

fn handle_login(ctx: &CommandContext<'_>, raw: &str) -> Result<(), AppError> {
    let code = parse_login_code(raw)?;
    let session = ctx.sessions.login(&code, Utc::now())?;
    report_login(ctx, &session)
}

fn handle_scan(ctx: &CommandContext<'_>, cooldown_secs: Option<u64>) -> Result<(), AppError> {
    let cooldown = cooldown_secs
        .map(Duration::from_secs)
        .unwrap_or_else(|| ctx.config.scan_cooldown());
    let mut scanner = Scanner::new(cooldown);
    ctx.notifier
        .notify("Waiting for a badge scan (one payload per line)...", Severity::Info);

    let stdin = io::stdin();
    let mut source = LineSource::new(stdin.lock());
    loop {
        let Some(detection) =
            scan_until_recognized(&mut source, &mut scanner, Instant::now, ctx.notifier)
        else {
            return Err(AppError::ScanExhausted);
        };
        match ctx.sessions.login(&detection.code, Utc::now()) {
            Ok(session) => return report_login(ctx, &session),
            // Unknown badge: report it and keep scanning
            Err(AuthError::UnknownEmployee { code }) => ctx.notifier.notify(
                &format!("Employee code {code} not found"),
                Severity::Error,
            ),
            Err(e) => return Err(e.into()),
        }
    }
}

fn handle_decode(ctx: &CommandContext<'_>, payload: &str) -> Result<(), AppError> {
    match interpret(payload) {
        Some(detection) => {
            if ctx.cli.json {
                print_json(&output_decode_json(payload, Ok(&detection)), ctx.jq())?;
            } else {
                println!("{} (matched by {})", detection.code, detection.strategy);
            }
            Ok(())
        }
        None => {
            let kind = describe_payload(payload);
            if ctx.cli.json {
                print_json(&output_decode_json(payload, Err(&kind)), ctx.jq())?;
            }
            Err(AppError::NoCodeFound { kind })
        }
    }
}

fn handle_status(ctx: &CommandContext<'_>) -> Result<(), AppError> {
    let now = Utc::now();
    let window = ctx.sessions.validity();
    let session = match ctx.sessions.state_at(now)? {
        SessionState::Active(session) => Some(session),
        SessionState::Expired(session) => {
            ctx.notifier.notify(
                &AuthError::Expired { name: session.name }.to_string(),
                Severity::Warning,
            );
            None
        }
        SessionState::LoggedOut => None,
    };

    let places = match &session {
        Some(_) => ctx.open_cargo()?.records().len(),
        None => 0,
    };
    if ctx.cli.json {
        let json = output_status_json(session.as_ref(), now, window, places);
        return print_json(&json, ctx.jq());
    }
    match &session {
        Some(session) => print_status(session, now, window, places, ctx.table),
        None => println!("Not signed in. Run `intake login <CODE>` or `intake scan`."),
    }
    Ok(())
}

fn handle_logout(ctx: &CommandContext<'_>) -> Result<(), AppError> {
    match ctx.sessions.logout()? {
        Some(session) => ctx.notifier.notify(
            &format!("Goodbye, {}. Unsent cargo list discarded.", session.name),
            Severity::Success,
        ),
        None => ctx.notifier.notify("Not signed in.", Severity::Info),
    }
    Ok(())
}

fn handle_employees(ctx: &CommandContext<'_>) -> Result<(), AppError> {
    let directory = ctx.sessions.directory();
    debug!(count = directory.len(), "listing employees");
    if ctx.cli.json {
        return print_json(&output_employees_json(directory.iter()), ctx.jq());
    }
    print_employees_table(directory.iter(), ctx.table.use_color);
    Ok(())
}

fn read_photo(path: &Path) -> Result<Photo, AppError> {
    let data = fs::read(path).map_err(|source| AppError::Photo {
        path: path.display().to_string(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Photo { name, data })
}

/// Form values from flags; omitted sizes keep the type's preset
fn build_input(args: &AddArgs) -> Result<CargoInput, AppError> {
    let mut input = CargoInput::for_type(args.cargo_type);
    if let Some(length) = args.length {
        input.dimensions.length = length;
    }
    if let Some(width) = args.width {
        input.dimensions.width = width;
    }
    if let Some(height) = args.height {
        input.dimensions.height = height;
    }
    input.weight = args.weight;
    input.quantity = args.quantity;
    input.packaging = Packaging::new(args.packaging, args.packaging_count);
    input.photos = args
        .photos
        .iter()
        .map(|p| read_photo(p))
        .collect::<Result<_, _>>()?;
    Ok(input)
}

fn handle_add(ctx: &CommandContext<'_>, args: &AddArgs) -> Result<(), AppError> {
    let session = ctx.require_session()?;
    let mut cargo = ctx.open_cargo()?;
    let input = build_input(args)?;

    let before = cargo.records().len();
    let added: Vec<CargoRecord> = match cargo.add_record(&session, input) {
        Ok(added) => added,
        Err(e) if e.is_retryable() => {
            ctx.notifier.notify(&format!("{e}, retrying"), Severity::Warning);
            cargo.flush()?;
            cargo.records()[before..].to_vec()
        }
        Err(e) => return Err(e.into()),
    };

    if ctx.cli.json {
        return print_json(&output_records_json(&added, ctx.cli.order), ctx.jq());
    }
    ctx.notifier.notify(
        &added_message(&added, &cargo.aggregate(), ctx.table.number_format),
        Severity::Success,
    );
    Ok(())
}

fn print_empty_list() {
    println!("Cargo list is empty.");
}

fn handle_list(ctx: &CommandContext<'_>) -> Result<(), AppError> {
    ctx.require_session()?;
    let cargo = ctx.open_cargo()?;
    if ctx.cli.csv {
        print!("{}", output_records_csv(cargo.records(), ctx.cli.order));
        return Ok(());
    }
    if ctx.cli.json {
        return print_json(&output_records_json(cargo.records(), ctx.cli.order), ctx.jq());
    }
    if cargo.phase() == Phase::Empty {
        print_empty_list();
        return Ok(());
    }
    print_records_table(cargo.records(), &cargo.aggregate(), ctx.table);
    Ok(())
}

fn handle_groups(ctx: &CommandContext<'_>) -> Result<(), AppError> {
    ctx.require_session()?;
    let cargo = ctx.open_cargo()?;
    let groups = cargo.group_by_key();
    if ctx.cli.json {
        return print_json(&output_groups_json(&groups, ctx.cli.order), ctx.jq());
    }
    if cargo.phase() == Phase::Empty {
        print_empty_list();
        return Ok(());
    }
    print_groups_table(&groups, &cargo.aggregate(), ctx.table);
    Ok(())
}

fn handle_summary(ctx: &CommandContext<'_>) -> Result<(), AppError> {
    ctx.require_session()?;
    let cargo = ctx.open_cargo()?;
    let totals = cargo.aggregate();
    if ctx.cli.json {
        return print_json(&output_summary_json(&totals), ctx.jq());
    }
    if totals.is_empty() {
        print_empty_list();
        return Ok(());
    }
    print_summary_table(&totals, ctx.table);
    Ok(())
}

fn handle_remove(ctx: &CommandContext<'_>, args: &RemoveArgs) -> Result<(), AppError> {
    ctx.require_session()?;
    let mut cargo = ctx.open_cargo()?;
    let removed = match (&args.id, &args.group) {
        (Some(id), _) => cargo.remove_by_id(*id)?,
        (None, Some(key)) => {
            if let Some(group) = cargo.group(key) {
                debug!(group = %group.group_key, count = group.count, "removing group");
            }
            cargo.remove_by_group_key(key)?
        }
        (None, None) => 0,
    };

    if ctx.cli.json {
        return print_json(&output_removal_json(removed, cargo.records().len()), ctx.jq());
    }
    if removed == 0 {
        ctx.notifier.notify("Nothing matched, list unchanged", Severity::Warning);
    } else {
        ctx.notifier.notify(
            &format!("Removed {removed} places, {} left", cargo.records().len()),
            Severity::Success,
        );
    }
    Ok(())
}

fn handle_clear(ctx: &CommandContext<'_>) -> Result<(), AppError> {
    ctx.require_session()?;
    let mut cargo = ctx.open_cargo()?;
    let removed = cargo.clear()?;
    if ctx.cli.json {
        return print_json(&output_removal_json(removed, 0), ctx.jq());
    }
    ctx.notifier
        .notify(&format!("Cleared {removed} places"), Severity::Success);
    Ok(())
}

fn handle_send(ctx: &CommandContext<'_>) -> Result<(), AppError> {
    let session = ctx.require_session()?;
    let mut cargo = ctx.open_cargo()?;
    let snapshot = cargo.send_and_reset(&session)?;

    if ctx.cli.json {
        return print_json(&output_snapshot_json(&snapshot), ctx.jq());
    }
    ctx.notifier.notify(
        &shipment_message(&snapshot, ctx.table.number_format),
        Severity::Success,
    );
    Ok(())
}

fn handle_history(ctx: &CommandContext<'_>) -> Result<(), AppError> {
    let cargo = ctx.open_cargo()?;
    let history = cargo.history();
    if ctx.cli.csv {
        print!("{}", output_history_csv(history, ctx.cli.order));
        return Ok(());
    }
    if ctx.cli.json {
        return print_json(&output_history_json(history, ctx.cli.order), ctx.jq());
    }
    if history.is_empty() {
        println!("No shipments sent yet.");
        return Ok(());
    }
    print_history_table(history, ctx.table);
    Ok(())
}
