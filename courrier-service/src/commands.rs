//! Command implementations for the `courrier` binary

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use courrier_core::{
    parse_selector, Attachment, Category, CourierType, Courrier, FilterSpec, NewCourrier, RefState,
};
use courrier_service::export::{entity_label, export_file_name};
use courrier_service::handlers::admin::{self, NewEntity, NewUser, Referential, UserUpdate};
use courrier_service::handlers::{auth, courriers, dashboard};
use courrier_service::store::{CourrierPatch, EntityPatch, LookupPatch, RefStatePatch};
use courrier_service::{
    open_backend, AppState, Config, InMemorySessionStore, SessionId, StorageBackend,
};

use crate::{CreateArgs, EntityCommands, FilterArgs, LookupCommands, UpdateArgs, UserCommands};

type App = AppState<Box<dyn StorageBackend>, InMemorySessionStore>;

/// Sign-in details from the command line
pub struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
}

pub fn open(config: Config) -> Result<App> {
    let backend = open_backend(config.backend, &config.data_path)
        .with_context(|| {
            format!(
                "Failed to open {} store at {}",
                config.backend,
                config.data_path.display()
            )
        })?;
    AppState::open(config, backend, InMemorySessionStore::new()).context("Failed to load store")
}

pub fn close(app: App) -> Result<()> {
    app.store.close().context("Failed to save store")?;
    Ok(())
}

fn sign_in(app: &App, credentials: &Credentials) -> Result<SessionId> {
    let (Some(email), Some(password)) = (&credentials.email, &credentials.password) else {
        bail!(
            "this command requires --email and --password (or COURRIER_EMAIL / COURRIER_PASSWORD)"
        );
    };
    let session = auth::login(app, email, password)?;
    Ok(session.id)
}

/// `none` clears an optional reference
fn optional_id(raw: Option<String>) -> Option<Option<String>> {
    raw.map(|id| if id == "none" { None } else { Some(id) })
}

fn filter_spec(args: &FilterArgs) -> Result<FilterSpec> {
    Ok(FilterSpec {
        text_query: args.query.clone(),
        state: parse_selector(&args.state)?,
        courier_type: parse_selector(&args.courier_type)?,
        category: parse_selector(&args.category)?,
        priority: parse_selector(&args.priority)?,
        entity: parse_selector(&args.entity)?,
        sort: parse_selector(&args.sort)?,
        ..Default::default()
    })
}

fn mime_type(path: &std::path::Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("txt") => "text/plain",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

fn print_row(app: &App, courrier: &Courrier) {
    println!(
        "{:<20} {:<10} {:<12} {:<40} -> {}",
        courrier.reference,
        courrier.state.label(),
        courrier.priority,
        courrier.subject,
        entity_label(&app.store.dataset().entities, &courrier.to_entity),
    );
}

pub fn init(app: &mut App, credentials: &Credentials, reset: bool) -> Result<()> {
    if reset {
        let session = sign_in(app, credentials)?;
        admin::reset_data(app, &session)?;
    }
    let data = app.store.dataset();
    println!(
        "Store ready: {} users, {} entities, {} courriers",
        data.users.len(),
        data.entities.len(),
        data.courriers.len()
    );
    Ok(())
}

pub fn list(app: &App, credentials: &Credentials, args: &FilterArgs) -> Result<()> {
    let session = sign_in(app, credentials)?;
    let view = courriers::list(app, &session, filter_spec(args)?)?;
    for courrier in &view {
        print_row(app, courrier);
    }
    println!("{} courrier(s)", view.len());
    Ok(())
}

pub fn show(app: &App, credentials: &Credentials, id: &str) -> Result<()> {
    let session = sign_in(app, credentials)?;
    let courrier = courriers::get(app, &session, id)?;
    let next = courriers::available_transitions(app, &session, id)?;
    let entities = &app.store.dataset().entities;

    println!("Reference:   {}", courrier.reference);
    println!("Subject:     {}", courrier.subject);
    println!("State:       {}", courrier.state.label());
    println!("Priority:    {}", courrier.priority);
    println!("Destination: {}", entity_label(entities, &courrier.to_entity));
    if let Some(from) = &courrier.from_entity {
        println!("Sender:      {}", entity_label(entities, from));
    }
    println!(
        "Created:     {} by {}",
        courrier.created_at.format("%d/%m/%Y %H:%M"),
        courrier.created_by
    );
    if !courrier.description.is_empty() {
        println!("\n{}\n", courrier.description);
    }
    for attachment in &courrier.attachments {
        println!(
            "Attachment:  {} ({}, {} bytes)",
            attachment.name, attachment.mime_type, attachment.size
        );
    }

    println!("History:");
    for entry in &courrier.history {
        println!(
            "  {}  {:<10} {}{}",
            entry.changed_at.format("%d/%m/%Y %H:%M"),
            entry.state.label(),
            entry.changed_by,
            entry.notes.as_deref().map(|n| format!(" ({})", n)).unwrap_or_default(),
        );
    }

    if !next.is_empty() {
        let names: Vec<&str> = next.iter().map(|s| s.as_str()).collect();
        println!("Next states: {}", names.join(", "));
    }
    Ok(())
}

pub fn create(app: &mut App, credentials: &Credentials, args: CreateArgs) -> Result<()> {
    let session = sign_in(app, credentials)?;

    let now = Utc::now();
    let attachments = args
        .attachments
        .iter()
        .map(|path| -> Result<Attachment> {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok(Attachment::from_bytes(
                uuid::Uuid::new_v4().to_string(),
                name,
                mime_type(path),
                &bytes,
                now,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    let draft = NewCourrier {
        courier_type: args.courier_type,
        category: args.category,
        to_entity: args.to,
        from_entity: args.from,
        subject: args.subject,
        description: args.description,
        priority: args.priority.parse()?,
        attachments,
        assigned_to: args.assign,
    };

    let courrier = courriers::create(app, &session, draft)?;
    println!("Created {} ({})", courrier.reference, courrier.id);
    Ok(())
}

pub fn update(app: &mut App, credentials: &Credentials, args: UpdateArgs) -> Result<()> {
    let session = sign_in(app, credentials)?;

    let patch = CourrierPatch {
        subject: args.subject,
        description: args.description,
        priority: args.priority.map(|p| p.parse()).transpose()?,
        to_entity: args.to,
        assigned_to: optional_id(args.assign),
        ..Default::default()
    };

    let courrier = courriers::update(app, &session, &args.id, patch)?;
    println!("Updated {}", courrier.reference);
    Ok(())
}

pub fn transition(
    app: &mut App,
    credentials: &Credentials,
    id: &str,
    state: &str,
    notes: Option<String>,
) -> Result<()> {
    let session = sign_in(app, credentials)?;
    let courrier = courriers::change_state(app, &session, id, state, notes)?;
    println!("{} is now {}", courrier.reference, courrier.state.label());
    Ok(())
}

pub fn delete(app: &mut App, credentials: &Credentials, id: &str) -> Result<()> {
    let session = sign_in(app, credentials)?;
    let removed = courriers::delete(app, &session, id)?;
    println!("Deleted {}", removed.reference);
    Ok(())
}

pub fn stats(app: &App, credentials: &Credentials, json: bool) -> Result<()> {
    let session = sign_in(app, credentials)?;
    let view = dashboard::dashboard(app, &session)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let stats = &view.statistics;
    println!("Total: {}", stats.total);
    println!("By state:");
    for (state, count) in &stats.by_state {
        println!("  {:<12} {}", state.label(), count);
    }
    println!("By priority:");
    for (priority, count) in &stats.by_priority {
        println!("  {:<12} {}", priority, count);
    }
    println!("By type:");
    for (id, count) in &stats.by_type {
        println!("  {:<12} {}", view.type_labels.get(id).unwrap_or(id), count);
    }
    println!("By category:");
    for (id, count) in &stats.by_category {
        println!("  {:<12} {}", view.category_labels.get(id).unwrap_or(id), count);
    }
    println!("By month:");
    for (month, count) in &stats.monthly_trend {
        println!("  {:<12} {}", month, count);
    }
    Ok(())
}

pub fn export(
    app: &App,
    credentials: &Credentials,
    args: &FilterArgs,
    output: Option<PathBuf>,
) -> Result<()> {
    let session = sign_in(app, credentials)?;
    let csv = courriers::export_csv(app, &session, filter_spec(args)?)?;

    let path = output.unwrap_or_else(|| PathBuf::from(export_file_name(Utc::now().date_naive())));
    if path.as_os_str() == "-" {
        println!("{}", csv);
    } else {
        std::fs::write(&path, csv).with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Exported to {}", path.display());
    }
    Ok(())
}

pub fn passwd(app: &mut App, credentials: &Credentials, new_password: &str) -> Result<()> {
    let session = sign_in(app, credentials)?;
    let current = credentials.password.as_deref().unwrap_or_default();
    auth::change_password(app, &session, current, new_password)?;
    println!("Password changed");
    Ok(())
}

pub fn users(app: &mut App, credentials: &Credentials, command: UserCommands) -> Result<()> {
    let session = sign_in(app, credentials)?;

    match command {
        UserCommands::List => {
            for user in admin::list_users(app, &session)? {
                println!(
                    "{:<14} {:<28} {:<24} {:<14} {}",
                    user.id,
                    user.email,
                    user.name,
                    user.role.label(),
                    if user.is_active { "active" } else { "inactive" },
                );
            }
        }
        UserCommands::Add {
            email,
            name,
            password,
            role,
            entity,
            inactive,
        } => {
            let user = admin::create_user(
                app,
                &session,
                NewUser {
                    email,
                    name,
                    password,
                    role: role.parse()?,
                    entity_id: entity,
                    is_active: !inactive,
                },
            )?;
            println!("Created user {} ({})", user.email, user.id);
        }
        UserCommands::Update {
            id,
            email,
            name,
            password,
            role,
            entity,
            active,
        } => {
            let update = UserUpdate {
                email,
                name,
                password,
                role: role.map(|r| r.parse()).transpose()?,
                entity_id: optional_id(entity),
                is_active: active,
            };
            let user = admin::update_user(app, &session, &id, update)?;
            println!("Updated user {}", user.email);
        }
        UserCommands::Delete { id } => {
            let user = admin::delete_user(app, &session, &id)?;
            println!("Deleted user {}", user.email);
        }
    }
    Ok(())
}

pub fn entities(app: &mut App, credentials: &Credentials, command: EntityCommands) -> Result<()> {
    let session = sign_in(app, credentials)?;

    match command {
        EntityCommands::List => {
            let entities = admin::list_entities(app, &session)?;
            for entity in &entities {
                let parent = entity
                    .parent_entity_id
                    .as_deref()
                    .map(|p| entity_label(&entities, p))
                    .unwrap_or("-");
                println!(
                    "{:<14} {:<8} {:<28} parent: {}",
                    entity.id,
                    entity.code.as_deref().unwrap_or("-"),
                    entity.label,
                    parent
                );
            }
        }
        EntityCommands::Add {
            label,
            description,
            parent,
            chef,
            email,
            phone,
            code,
        } => {
            let entity = admin::create_entity(
                app,
                &session,
                NewEntity {
                    label,
                    description,
                    parent_entity_id: parent,
                    chef_id: chef,
                    email,
                    phone,
                    code,
                },
            )?;
            println!("Created entity {} ({})", entity.label, entity.id);
        }
        EntityCommands::Update {
            id,
            label,
            description,
            parent,
            chef,
        } => {
            let patch = EntityPatch {
                label,
                description,
                parent_entity_id: optional_id(parent),
                chef_id: optional_id(chef),
                ..Default::default()
            };
            let entity = admin::update_entity(app, &session, &id, patch)?;
            println!("Updated entity {}", entity.label);
        }
        EntityCommands::Delete { id } => {
            let entity = admin::delete_entity(app, &session, &id)?;
            println!("Deleted entity {}", entity.label);
        }
    }
    Ok(())
}

/// Lookup tables editable from the command line
pub trait LookupEntry: Referential {
    fn build(label: String, description: String, color: Option<String>) -> Self;

    fn patch(
        label: Option<String>,
        description: Option<String>,
        color: Option<String>,
    ) -> Self::Patch;

    fn line(&self) -> String;
}

impl LookupEntry for Category {
    fn build(label: String, description: String, _color: Option<String>) -> Self {
        Category {
            id: String::new(),
            label,
            description,
        }
    }

    fn patch(
        label: Option<String>,
        description: Option<String>,
        _color: Option<String>,
    ) -> LookupPatch {
        LookupPatch { label, description }
    }

    fn line(&self) -> String {
        format!("{:<14} {:<20} {}", self.id, self.label, self.description)
    }
}

impl LookupEntry for CourierType {
    fn build(label: String, description: String, _color: Option<String>) -> Self {
        CourierType {
            id: String::new(),
            label,
            description,
        }
    }

    fn patch(
        label: Option<String>,
        description: Option<String>,
        _color: Option<String>,
    ) -> LookupPatch {
        LookupPatch { label, description }
    }

    fn line(&self) -> String {
        format!("{:<14} {:<20} {}", self.id, self.label, self.description)
    }
}

impl LookupEntry for RefState {
    fn build(label: String, description: String, color: Option<String>) -> Self {
        RefState {
            id: String::new(),
            label,
            description,
            color,
        }
    }

    fn patch(
        label: Option<String>,
        description: Option<String>,
        color: Option<String>,
    ) -> RefStatePatch {
        RefStatePatch {
            label,
            description,
            color: optional_id(color),
        }
    }

    fn line(&self) -> String {
        format!(
            "{:<14} {:<20} {:<8} {}",
            self.id,
            self.label,
            self.color.as_deref().unwrap_or("-"),
            self.description
        )
    }
}

pub fn lookups<R: LookupEntry>(
    app: &mut App,
    credentials: &Credentials,
    command: LookupCommands,
) -> Result<()> {
    let session = sign_in(app, credentials)?;

    match command {
        LookupCommands::List => {
            for entry in admin::list_referential::<R, _, _>(app, &session)? {
                println!("{}", entry.line());
            }
        }
        LookupCommands::Add {
            label,
            description,
            color,
        } => {
            let entry =
                admin::create_referential(app, &session, R::build(label, description, color))?;
            println!("Created {}", entry.line());
        }
        LookupCommands::Update {
            id,
            label,
            description,
            color,
        } => {
            let patch = R::patch(label, description, color);
            let entry = admin::update_referential::<R, _, _>(app, &session, &id, patch)?;
            println!("Updated {}", entry.line());
        }
        LookupCommands::Delete { id } => {
            let entry = admin::delete_referential::<R, _, _>(app, &session, &id)?;
            println!("Deleted {}", entry.line());
        }
    }
    Ok(())
}
