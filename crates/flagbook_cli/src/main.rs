#![forbid(unsafe_code)]

mod render;

use clap::{Parser, Subcommand, ValueEnum};
use flagbook_core::db::open_db;
use flagbook_core::upload::content_type_for;
use flagbook_core::{
    default_log_level, init_logging_with, Cell, GuestbookService, ImageStore, InkSize, LogConfig,
    Message, MessageId, MessageRepository, Payload, SignError, SignOptions, Signature,
    SqliteMessageRepository,
};
use log::{info, warn};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "flagbook")]
#[command(about = "Sign-the-flag guestbook")]
#[command(version)]
struct Cli {
    /// SQLite database file.
    #[arg(long, global = true, default_value = "flagbook.sqlite3")]
    db: PathBuf,
    /// Directory for rolling log files; logging stays off when omitted.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Where uploaded signature images are kept.
    #[arg(long, global = true, default_value = "uploads")]
    upload_dir: PathBuf,
    /// Insert attempts per signature before reporting contention.
    #[arg(long, global = true, default_value_t = SignOptions::default().max_attempts)]
    max_attempts: u32,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prints the current grid status as JSON.
    Status,
    /// Signs the flag at a cell.
    Sign {
        /// Target cell as `row-col`.
        #[arg(long)]
        cell: Cell,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        message: String,
        #[arg(long)]
        color: Option<String>,
        #[arg(long, value_enum, default_value_t = InkSizeCli::Medium)]
        size: InkSizeCli,
        /// Image file attached to the signature.
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Shows the span a message of `length` characters would get at a cell.
    Preview {
        #[arg(long)]
        cell: Cell,
        #[arg(long)]
        length: usize,
    },
    /// Lists all signatures, oldest first.
    List,
    Show {
        id: MessageId,
    },
    /// Draws the grid as text.
    Render {
        /// Label reserved cells with the initial of their zone.
        #[arg(long, default_value_t = false)]
        zones: bool,
    },
    /// Stores an image and prints its generated name.
    Upload {
        path: PathBuf,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum InkSizeCli {
    Small,
    Medium,
    Large,
}

impl From<InkSizeCli> for InkSize {
    fn from(value: InkSizeCli) -> Self {
        match value {
            InkSizeCli::Small => InkSize::Small,
            InkSizeCli::Medium => InkSize::Medium,
            InkSizeCli::Large => InkSize::Large,
        }
    }
}

#[derive(Serialize)]
struct PreviewOutput {
    cell: Cell,
    desired_span: u32,
    span: u32,
    max_span: Option<u32>,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let cli = Cli::parse();
    if let Some(log_dir) = cli.log_dir.as_deref() {
        start_logging(log_dir, cli.log_level.as_deref())?;
    }

    let images = ImageStore::new(cli.upload_dir);
    let options = SignOptions {
        max_attempts: cli.max_attempts,
    };
    match cli.command {
        Commands::Upload { path } => {
            let name = store_image(&images, &path)?;
            println!("{name}");
            Ok(())
        }
        command => run_with_db(&cli.db, options, &images, command),
    }
}

fn run_with_db(
    db: &Path,
    options: SignOptions,
    images: &ImageStore,
    command: Commands,
) -> Result<(), String> {
    let conn = open_db(db).map_err(|err| err.to_string())?;
    let repo = SqliteMessageRepository::try_new(&conn).map_err(|err| err.to_string())?;
    let service = GuestbookService::<_, Signature>::with_options(repo, options);

    match command {
        Commands::Status => {
            let status = service.grid_status().map_err(|err| err.to_string())?;
            print_json(&status)
        }
        Commands::Sign {
            cell,
            first_name,
            last_name,
            email,
            message,
            color,
            size,
            image,
        } => {
            let mut signature = Signature::new(first_name, last_name, email, message);
            if let Some(color) = color {
                signature.color = color;
            }
            signature.size = size.into();
            let signed = sign_with_image(&service, images, cell, signature, image.as_deref())?;
            print_json(&signed)
        }
        Commands::Preview { cell, length } => {
            let allocation = service
                .preview(cell, length)
                .map_err(|err| err.to_string())?;
            let max_span = service.max_span_at(cell).map_err(|err| err.to_string())?;
            print_json(&PreviewOutput {
                cell,
                desired_span: allocation.desired_span,
                span: allocation.span,
                max_span,
            })
        }
        Commands::List => {
            let messages = service.list_messages().map_err(|err| err.to_string())?;
            print_json(&messages)
        }
        Commands::Show { id } => {
            let message = service
                .get_message(id)
                .map_err(|err| err.to_string())?
                .ok_or_else(|| format!("message not found: {id}"))?;
            print_json(&message)
        }
        Commands::Render { zones } => {
            let grid = service.grid_info().map_err(|err| err.to_string())?;
            print!("{}", render::render_grid(&grid, zones));
            Ok(())
        }
        Commands::Upload { .. } => Err("upload does not use the database".to_string()),
    }
}

/// Signs `cell`, storing `image` alongside. The image is only written once
/// the target is known to be signable, and is removed again if the insert
/// still fails.
fn sign_with_image<R>(
    service: &GuestbookService<R, Signature>,
    images: &ImageStore,
    cell: Cell,
    mut signature: Signature,
    image: Option<&Path>,
) -> Result<Message<Signature>, String>
where
    R: MessageRepository<Signature>,
{
    signature
        .validate()
        .map_err(|err| SignError::from(err).to_string())?;
    service
        .preview(cell, signature.text_len())
        .map_err(|err| err.to_string())?;

    let stored = match image {
        Some(path) => Some(store_image(images, path)?),
        None => None,
    };
    signature.image_path = stored.clone();

    service.sign(cell, signature).map_err(|err| {
        if let Some(name) = stored.as_deref() {
            if let Err(remove_err) = images.remove(name) {
                warn!(
                    "event=cli_upload module=cli status=orphaned dir={} error={remove_err}",
                    images.dir().display()
                );
            }
        }
        err.to_string()
    })
}

fn start_logging(log_dir: &Path, level: Option<&str>) -> Result<(), String> {
    let absolute = if log_dir.is_absolute() {
        log_dir.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|err| format!("cannot resolve log directory: {err}"))?
            .join(log_dir)
    };
    let level = level.unwrap_or(default_log_level());
    let config = LogConfig::new(level, &absolute.to_string_lossy())?.with_stderr_mirror(true);
    init_logging_with(config)
}

fn store_image(images: &ImageStore, path: &Path) -> Result<String, String> {
    let bytes =
        fs::read(path).map_err(|err| format!("cannot read image `{}`: {err}", path.display()))?;
    let original_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    let name = images
        .save(original_name, content_type_for(original_name), &bytes)
        .map_err(|err| err.to_string())?;
    info!(
        "event=cli_upload module=cli status=ok dir={}",
        images.dir().display()
    );
    Ok(name)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|err| err.to_string())?;
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{sign_with_image, start_logging, Cli, Commands, InkSizeCli};
    use clap::Parser;
    use flagbook_core::db::open_db_in_memory;
    use flagbook_core::{Cell, GuestbookService, ImageStore, Signature, SqliteMessageRepository};

    fn signature() -> Signature {
        Signature::new("Ada", "Lovelace", "ada@example.com", "hello flag")
    }

    #[test]
    fn sign_arguments_parse_into_command() {
        let cli = Cli::try_parse_from([
            "flagbook",
            "--db",
            "guestbook.sqlite3",
            "sign",
            "--cell",
            "3-4",
            "--first-name",
            "Ada",
            "--last-name",
            "Lovelace",
            "--email",
            "ada@example.com",
            "--message",
            "hello",
            "--size",
            "large",
        ])
        .unwrap();

        assert_eq!(cli.max_attempts, 3);
        match cli.command {
            Commands::Sign {
                cell, size, image, ..
            } => {
                assert_eq!(cell, Cell::new(3, 4));
                assert_eq!(size, InkSizeCli::Large);
                assert!(image.is_none());
            }
            _ => panic!("expected sign command"),
        }
    }

    #[test]
    fn malformed_cell_is_rejected_at_parse_time() {
        for cell in ["3", "+3-4", "a-b"] {
            let parsed =
                Cli::try_parse_from(["flagbook", "preview", "--cell", cell, "--length", "5"]);
            assert!(parsed.is_err(), "cell `{cell}` should be rejected");
        }
    }

    #[test]
    fn logging_starts_once_per_directory() {
        let dir = tempfile::tempdir().unwrap();
        start_logging(dir.path(), None).unwrap();
        start_logging(dir.path(), None).unwrap();
        assert!(start_logging(dir.path(), Some("verbose")).is_err());
    }

    #[test]
    fn rejected_signature_leaves_no_image_behind() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("portrait.png");
        std::fs::write(&image, b"png").unwrap();
        let images = ImageStore::new(dir.path().join("uploads"));
        let conn = open_db_in_memory().unwrap();
        let service = GuestbookService::new(SqliteMessageRepository::try_new(&conn).unwrap());

        // Row 9 is reserved artwork at the base level.
        let err = sign_with_image(
            &service,
            &images,
            Cell::new(9, 3),
            signature(),
            Some(&image),
        )
        .unwrap_err();
        assert!(err.contains("9-3"));
        assert!(!images.dir().exists());

        service.sign(Cell::new(0, 0), signature()).unwrap();
        let err = sign_with_image(
            &service,
            &images,
            Cell::new(0, 0),
            signature(),
            Some(&image),
        )
        .unwrap_err();
        assert!(err.contains("already been signed"));
        assert!(!images.dir().exists());
    }

    #[test]
    fn accepted_signature_keeps_its_image() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("portrait.png");
        std::fs::write(&image, b"png").unwrap();
        let images = ImageStore::new(dir.path().join("uploads"));
        let conn = open_db_in_memory().unwrap();
        let service = GuestbookService::new(SqliteMessageRepository::try_new(&conn).unwrap());

        let signed = sign_with_image(
            &service,
            &images,
            Cell::new(0, 3),
            signature(),
            Some(&image),
        )
        .unwrap();
        let stored = signed.payload.image_path.unwrap();
        assert_eq!(images.load(&stored).unwrap().bytes, b"png");
    }
}
