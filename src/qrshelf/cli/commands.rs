use super::print::{print_items, print_messages};
use super::setup::{Cli, Commands};
use clap::Parser;
use directories::ProjectDirs;
use qrshelf::api::{CmdMessage, ShelfApi};
use qrshelf::config::{ShelfConfig, KEYS};
use qrshelf::editor;
use qrshelf::error::{QrError, Result};
use qrshelf::images::FsImageStore;
use qrshelf::model::Collection;
use qrshelf::photos::DirPhotoLibrary;
use qrshelf::render::QrRenderer;
use qrshelf::store::fs_backend::FsBackend;
use std::io::{BufRead, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const HOME_ENV: &str = "QRSHELF_HOME";
const LOG_ENV: &str = "QRSHELF_LOG";

struct AppContext {
    api: ShelfApi<FsBackend, FsImageStore, QrRenderer>,
    collection: Collection,
    data_dir: PathBuf,
    config: ShelfConfig,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut ctx = init_context(&cli)?;
    ctx.api.reveal(ctx.collection, cli.pages.saturating_sub(1) as usize);

    match cli.command {
        Some(Commands::Generate { text }) => handle_generate(&mut ctx, text.join(" ")),
        Some(Commands::Scan { payloads }) => handle_scan(&mut ctx, payloads),
        Some(Commands::List) | None => handle_list(&ctx),
        Some(Commands::Select { indexes, all }) => handle_select(&mut ctx, indexes, all, true),
        Some(Commands::Deselect { indexes, all }) => handle_select(&mut ctx, indexes, all, false),
        Some(Commands::Edit { index, text }) => handle_edit(&mut ctx, index, text),
        Some(Commands::Delete { indexes, selected }) => handle_delete(&mut ctx, indexes, selected),
        Some(Commands::Image { index, output }) => handle_image(&ctx, index, output),
        Some(Commands::Move) => handle_move(&mut ctx),
        Some(Commands::Export) => handle_export(&mut ctx),
        Some(Commands::Config { key, value }) => handle_config(&mut ctx, key, value),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// The data directory, created if needed and made absolute so stored image paths
/// stay valid from any working directory.
fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        Some(home) => PathBuf::from(home),
        None => ProjectDirs::from("com", "qrshelf", "qrshelf")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| {
                QrError::Store(format!(
                    "Could not determine a data directory. Set ${}.",
                    HOME_ENV
                ))
            })?,
    };
    std::fs::create_dir_all(&dir).map_err(QrError::Io)?;
    dir.canonicalize().map_err(QrError::Io)
}

fn init_context(cli: &Cli) -> Result<AppContext> {
    let data_dir = data_dir()?;
    let config = ShelfConfig::load(&data_dir)?;
    debug!(data_dir = %data_dir.display(), ?config, "starting");

    let api = ShelfApi::open(
        FsBackend::new(&data_dir),
        FsImageStore::new(data_dir.join("images")),
        QrRenderer::new(config.qr_scale),
        config.batch_size,
    );

    Ok(AppContext {
        api,
        collection: if cli.scanned {
            Collection::Scanned
        } else {
            Collection::Generated
        },
        data_dir,
        config,
    })
}

fn handle_generate(ctx: &mut AppContext, text: String) -> Result<()> {
    let result = ctx.api.generate(&text)?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_scan(ctx: &mut AppContext, payloads: Vec<String>) -> Result<()> {
    let payloads = if payloads.is_empty() {
        read_stdin_lines()?
    } else {
        payloads
    };
    let result = ctx.api.scan(&payloads)?;
    print_messages(&result.messages);
    Ok(())
}

/// Each non-blank stdin line is one decoded payload.
fn read_stdin_lines() -> Result<Vec<String>> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Err(QrError::Api(
            "No payloads given. Pass them as arguments or pipe them in.".to_string(),
        ));
    }
    let mut lines = Vec::new();
    for line in stdin.lock().lines() {
        let line = line.map_err(QrError::Io)?;
        let line = line.trim_end_matches('\r');
        if !line.trim().is_empty() {
            lines.push(line.to_string());
        }
    }
    Ok(lines)
}

fn handle_list(ctx: &AppContext) -> Result<()> {
    let result = ctx.api.list(ctx.collection)?;
    print_items(&result.listed_items);
    print_messages(&result.messages);
    Ok(())
}

fn handle_select(
    ctx: &mut AppContext,
    indexes: Vec<String>,
    all: bool,
    selected: bool,
) -> Result<()> {
    let result = match (all, selected) {
        (true, true) => ctx.api.select_all(ctx.collection)?,
        (true, false) => ctx.api.deselect_all(ctx.collection)?,
        (false, true) => ctx.api.select(ctx.collection, &indexes)?,
        (false, false) => ctx.api.deselect(ctx.collection, &indexes)?,
    };
    print_messages(&result.messages);
    Ok(())
}

fn handle_edit(ctx: &mut AppContext, index: String, text: Vec<String>) -> Result<()> {
    if !text.is_empty() {
        let result = ctx.api.update(ctx.collection, &index, &text.join(" "))?;
        print_messages(&result.messages);
        return Ok(());
    }

    let item = ctx.api.item_at(ctx.collection, &index)?;
    let store = ctx.api.store_mut(ctx.collection);
    let message = if editor::edit_item(store, item.id, &item.text)? {
        CmdMessage::success("Updated")
    } else {
        CmdMessage::info("Text unchanged")
    };
    print_messages(&[message]);
    Ok(())
}

fn handle_delete(ctx: &mut AppContext, indexes: Vec<String>, selected: bool) -> Result<()> {
    let result = if selected {
        ctx.api.delete_selected(ctx.collection)?
    } else {
        ctx.api.delete(ctx.collection, &indexes)?
    };
    print_messages(&result.messages);
    Ok(())
}

fn handle_image(ctx: &AppContext, index: String, output: PathBuf) -> Result<()> {
    let item = ctx.api.item_at(ctx.collection, &index)?;
    let bitmap = ctx
        .api
        .store(ctx.collection)
        .image_of(item.id)
        .ok_or_else(|| QrError::Api(format!("No image stored for \"{}\"", item.text)))?;
    std::fs::write(&output, bitmap.png_bytes()).map_err(QrError::Io)?;
    print_messages(&[CmdMessage::success(format!(
        "Wrote {}x{} image to {}",
        bitmap.width(),
        bitmap.height(),
        output.display()
    ))]);
    Ok(())
}

fn handle_move(ctx: &mut AppContext) -> Result<()> {
    let result = ctx.api.move_selected()?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_export(ctx: &mut AppContext) -> Result<()> {
    let library = Arc::new(DirPhotoLibrary::new(
        ctx.config.photo_dir_or(&ctx.data_dir),
    ));
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(QrError::Io)?;
    let result = runtime.block_on(ctx.api.export_selected(ctx.collection, library))?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_config(ctx: &mut AppContext, key: Option<String>, value: Option<String>) -> Result<()> {
    match (key, value) {
        (None, _) => {
            for key in KEYS {
                println!("{} = {}", key, ctx.config.get(key)?);
            }
        }
        (Some(key), None) => println!("{} = {}", key, ctx.config.get(&key)?),
        (Some(key), Some(value)) => {
            ctx.config.set(&key, &value)?;
            ctx.config.save(&ctx.data_dir)?;
            print_messages(&[CmdMessage::success(format!(
                "{} = {}",
                key,
                ctx.config.get(&key)?
            ))]);
        }
    }
    Ok(())
}
