//! CLI command implementations
//!
//! Each command loads the config, opens one context on the data directory,
//! runs, prints a single JSON response and closes the store again. `watch`
//! is the only long-running command.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{hash_password, require_admin, require_mutation, AuthError, User};
use crate::bulletin::{loader, BulletinHandle, RegionIndex};
use crate::bus::{select_notifier, ChangeEnvelope};
use crate::config::Config;
use crate::observability::{log_event_with_fields, Event};
use crate::session::{classify_point_data, CouloirContext};
use crate::store::{Point, PointData, PointId, PointStore, StoreError, META_FILE, STORE_DIR};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};

#[derive(Debug, Deserialize)]
struct Credentials {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct AddRequest {
    #[serde(flatten)]
    credentials: Credentials,
    point: PointData,
}

#[derive(Debug, Deserialize)]
struct UpdateRequest {
    #[serde(flatten)]
    credentials: Credentials,
    id: PointId,
    point: PointData,
}

#[derive(Debug, Deserialize)]
struct DeleteRequest {
    #[serde(flatten)]
    credentials: Credentials,
    id: PointId,
}

#[derive(Debug, Deserialize)]
struct ResetRequest {
    #[serde(flatten)]
    credentials: Credentials,
    #[serde(default = "default_reseed")]
    reseed: bool,
}

fn default_reseed() -> bool {
    true
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
///
/// Failures are also reported on stdout as `{"status":"error",...}`.
pub fn run_command(cmd: Command) -> CliResult<()> {
    let result = dispatch(cmd);
    if let Err(e) = &result {
        write_error(e.code_str(), e.message())?;
    }
    result
}

fn dispatch(cmd: Command) -> CliResult<()> {
    let config = Config::load_and_apply(cmd.config_path())?;
    let runtime = tokio::runtime::Runtime::new()?;

    let request = match cmd {
        Command::Init { .. } => {
            let data = runtime.block_on(init(&config))?;
            return write_response(data);
        }
        Command::Watch { .. } => return runtime.block_on(watch(&config)),
        Command::List { .. } | Command::Show { .. } | Command::Count { .. } => Value::Null,
        _ => read_request()?,
    };

    let data = runtime.block_on(async {
        let mut context = open_context(&config).await?;
        let result = execute(&mut context, &cmd, request).await;
        context.store().close().await;
        result
    })?;
    write_response(data)
}

async fn execute(context: &mut CouloirContext, cmd: &Command, request: Value) -> CliResult<Value> {
    match cmd {
        Command::List { .. } => list(context),
        Command::Show { id, .. } => show(context, PointId(*id)),
        Command::Count { .. } => count(context).await,
        Command::Add { .. } => add(context, serde_json::from_value(request)?).await,
        Command::Update { .. } => update(context, serde_json::from_value(request)?).await,
        Command::Delete { .. } => delete(context, serde_json::from_value(request)?).await,
        Command::Reset { .. } => reset(context, serde_json::from_value(request)?).await,
        Command::Login { .. } => login(context, serde_json::from_value(request)?).await,
        Command::Classify { .. } => classify(context, serde_json::from_value(request)?),
        Command::Init { .. } | Command::Watch { .. } => Err(CliError::invalid_request(
            "command does not run against an open context",
        )),
    }
}

fn is_initialized(data_dir: &Path) -> bool {
    data_dir.join(STORE_DIR).join(META_FILE).exists()
}

/// Builds the bulletin handle from `bulletin_path`, or an empty one.
fn load_bulletin(config: &Config) -> CliResult<BulletinHandle> {
    match config.bulletin_path() {
        Some(path) => {
            let regions = loader::load_bulletin_file(path)?;
            Ok(BulletinHandle::new(RegionIndex::build(regions)))
        }
        None => Ok(BulletinHandle::default()),
    }
}

/// Opens the store and assembles a context around it.
pub async fn open_context(config: &Config) -> CliResult<CouloirContext> {
    if !is_initialized(config.data_path()) {
        return Err(CliError::not_initialized());
    }
    let bulletin = Arc::new(load_bulletin(config)?);
    let notifier = select_notifier(config.transport, None, config.data_path())?;
    let store = PointStore::open(config.data_path(), config.schema_version).await?;
    Ok(CouloirContext::new(store, bulletin, notifier).await?)
}

async fn authenticate(store: &PointStore, credentials: &Credentials) -> CliResult<User> {
    let hash = hash_password(&credentials.password);
    store
        .verify_credentials(&credentials.username, &hash)
        .await?
        .ok_or_else(|| AuthError::InvalidCredentials.into())
}

async fn existing_point(store: &PointStore, id: PointId) -> CliResult<Point> {
    store
        .read(id)
        .await?
        .ok_or_else(|| StoreError::not_found("points", id).into())
}

fn classified_json(context: &CouloirContext, id: PointId) -> CliResult<Value> {
    let entry = context
        .view()
        .get(id)
        .ok_or_else(|| CliError::from(StoreError::not_found("points", id)))?;
    Ok(serde_json::to_value(entry)?)
}

/// Creates or upgrades the store, then inserts the configured users and,
/// when enabled, the reference couloirs. Safe to run again.
///
/// A store held open by an older instance is waited for instead of failing.
pub async fn init(config: &Config) -> CliResult<Value> {
    let store = PointStore::open_waiting(config.data_path(), config.schema_version, |err| {
        let guidance = err.user_guidance().unwrap_or("");
        eprintln!("{} {}", err, guidance);
    })
    .await?;

    let result = async {
        let schema_version = store.schema_version().await?;
        let users_seeded = if schema_version >= 2 {
            store.set_default_users(config.default_users.clone()).await?
        } else {
            0
        };
        let points_seeded = if config.seed_on_init {
            store.seed_if_empty().await?
        } else {
            0
        };
        Ok::<_, CliError>(json!({
            "schema_version": schema_version,
            "users_seeded": users_seeded,
            "points_seeded": points_seeded,
        }))
    }
    .await;

    store.close().await;
    result
}

pub fn list(context: &CouloirContext) -> CliResult<Value> {
    let points: Vec<_> = context.view().iter().collect();
    Ok(serde_json::to_value(points)?)
}

pub fn show(context: &mut CouloirContext, id: PointId) -> CliResult<Value> {
    context.sync_bulletin();
    classified_json(context, id)
}

pub async fn count(context: &CouloirContext) -> CliResult<Value> {
    let count = context.store().count().await?;
    Ok(json!({ "count": count }))
}

/// The new point is owned by the caller unless an administrator names
/// another owner.
async fn add(context: &mut CouloirContext, request: AddRequest) -> CliResult<Value> {
    let user = authenticate(context.store(), &request.credentials).await?;
    let mut data = request.point;
    if !user.is_admin() || data.owner.is_empty() {
        data.owner = user.username.clone();
    }
    let id = context.create(data).await?;
    classified_json(context, id)
}

/// Ownership stays with the stored point.
async fn update(context: &mut CouloirContext, request: UpdateRequest) -> CliResult<Value> {
    let user = authenticate(context.store(), &request.credentials).await?;
    let existing = existing_point(context.store(), request.id).await?;
    require_mutation(&user, &existing)?;

    let mut data = request.point;
    data.owner = existing.data.owner;
    context.update(Point::new(request.id, data)).await?;
    classified_json(context, request.id)
}

async fn delete(context: &mut CouloirContext, request: DeleteRequest) -> CliResult<Value> {
    let user = authenticate(context.store(), &request.credentials).await?;
    let deleted = match context.store().read(request.id).await? {
        Some(existing) => {
            require_mutation(&user, &existing)?;
            context.delete(request.id).await?
        }
        None => false,
    };
    Ok(json!({ "id": request.id, "deleted": deleted }))
}

async fn reset(context: &mut CouloirContext, request: ResetRequest) -> CliResult<Value> {
    let user = authenticate(context.store(), &request.credentials).await?;
    require_admin(&user)?;
    let inserted = context.reset(request.reseed).await?;
    Ok(json!({ "points_seeded": inserted }))
}

async fn login(context: &mut CouloirContext, credentials: Credentials) -> CliResult<Value> {
    let user = authenticate(context.store(), &credentials).await?;
    Ok(json!({ "username": user.username, "role": user.role }))
}

fn classify(context: &CouloirContext, data: PointData) -> CliResult<Value> {
    let snapshot = context.bulletin().snapshot();
    let (classification, region) = classify_point_data(&data, &snapshot);
    Ok(json!({
        "rating": classification.display_rating(),
        "color": classification.color(),
        "classification": classification,
        "region": region,
    }))
}

/// Applies other instances' changes until interrupted, printing one
/// response line per change.
pub async fn watch(config: &Config) -> CliResult<()> {
    let mut context = open_context(config).await?;
    let mut receiver = context.subscribe()?;

    let result = loop {
        tokio::select! {
            envelope = receiver.recv() => {
                let Some(envelope) = envelope else { break Ok(()) };
                match apply_watched(&mut context, &envelope).await {
                    Ok(Some(line)) => {
                        if let Err(e) = write_response(line) {
                            break Err(e);
                        }
                    }
                    Ok(None) => continue,
                    Err(e) => break Err(e),
                }
            }
            _ = tokio::signal::ctrl_c() => break Ok(()),
        }
    };

    context.store().close().await;
    result
}

/// Applies one envelope received by `watch`.
///
/// Returns the line to print, or `None` when an operation-level failure
/// skipped the envelope. Fatal store errors end the watch.
async fn apply_watched(context: &mut CouloirContext, envelope: &ChangeEnvelope) -> CliResult<Option<Value>> {
    match context.apply(envelope).await {
        Ok(()) => Ok(Some(json!({
            "operation": envelope.operation,
            "id": envelope.point_id(),
            "points": context.view().len(),
        }))),
        Err(e) => skip_unless_fatal(envelope, e).map(|()| None),
    }
}

fn skip_unless_fatal(envelope: &ChangeEnvelope, err: StoreError) -> CliResult<()> {
    if err.is_fatal() {
        return Err(err.into());
    }
    let error = err.to_string();
    log_event_with_fields(
        Event::ViewApplyFailed,
        &[("error", error.as_str()), ("operation", envelope.operation.as_str())],
    );
    Ok(())
}
