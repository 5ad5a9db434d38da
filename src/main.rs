use anyhow::{anyhow, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use eduvid_client::api::ApiClient;
use eduvid_client::config::Config;
use eduvid_client::credentials::CredentialStore;
use eduvid_client::submit::Submitter;
use eduvid_client::sync::{GenerationStatus, ProjectWatch, PushChannel};
use eduvid_client::view::{render_progress, render_progress_line, render_project, render_videos};
use eduvid_core::{ContentSubmission, ContentType};

fn cli() -> Command {
    Command::new("eduvid")
        .version("0.1.0")
        .author("TigreRoll")
        .about("Upload educational content and track video generation")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file (default: first of eduvid.toml, config/eduvid.toml)")
                .global(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("login")
                .about("Obtain an access token and store it")
                .arg(Arg::new("username").short('u').long("username").required(true))
                .arg(Arg::new("password").short('p').long("password").required(true)),
        )
        .subcommand(Command::new("logout").about("Forget the stored access token"))
        .subcommand(
            Command::new("register")
                .about("Create an account")
                .arg(Arg::new("email").long("email").required(true))
                .arg(Arg::new("password").long("password").required(true))
                .arg(Arg::new("name").long("name").value_name("FULL_NAME").required(true)),
        )
        .subcommand(
            Command::new("upload")
                .about("Create a project from text content")
                .arg(Arg::new("title").short('t').long("title").required(true))
                .arg(
                    Arg::new("content")
                        .long("content")
                        .help("Content text")
                        .conflicts_with("content-file")
                        .required_unless_present("content-file"),
                )
                .arg(
                    Arg::new("content-file")
                        .short('f')
                        .long("content-file")
                        .value_name("FILE")
                        .help("Read content text from a file")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(Arg::new("description").short('d').long("description"))
                .arg(
                    Arg::new("type")
                        .long("type")
                        .value_parser(["text", "url", "file"])
                        .default_value("text"),
                ),
        )
        .subcommand(
            Command::new("upload-file")
                .about("Create a project from a PDF, DOCX or TXT document")
                .arg(
                    Arg::new("path")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(Command::new("projects").about("List projects"))
        .subcommand(
            Command::new("project")
                .about("Show one project")
                .arg(project_id_arg()),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a project")
                .arg(project_id_arg()),
        )
        .subcommand(
            Command::new("generate")
                .about("Generate a video and follow its progress")
                .arg(project_id_arg())
                .arg(
                    Arg::new("no-push")
                        .long("no-push")
                        .help("Do not open the progress socket")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("no-poll")
                        .long("no-poll")
                        .help("Do not poll task status")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("status")
                .about("Show one task status snapshot")
                .arg(Arg::new("task-id").required(true)),
        )
        .subcommand(
            Command::new("videos")
                .about("List videos of a project")
                .arg(project_id_arg()),
        )
        .subcommand(
            Command::new("download")
                .about("Print the download link of a video")
                .arg(
                    Arg::new("video-id")
                        .required(true)
                        .value_parser(value_parser!(u64)),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Show the effective configuration")
                .arg(
                    Arg::new("save")
                        .long("save")
                        .value_name("FILE")
                        .help("Write the effective configuration to a file")
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
}

fn project_id_arg() -> Arg {
    Arg::new("project-id")
        .required(true)
        .value_parser(value_parser!(u64))
}

fn init_logging(level: &str, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("eduvid=debug,eduvid_client=debug,eduvid_core=debug,warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("eduvid={level},eduvid_client={level},warn"))
        })
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn string_arg<'a>(matches: &'a ArgMatches, id: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing --{}", id))
}

fn id_arg(matches: &ArgMatches, id: &str) -> Result<u64> {
    matches
        .get_one::<u64>(id)
        .copied()
        .ok_or_else(|| anyhow!("missing <{}>", id))
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|e| {
            eprintln!("Failed to load config, using defaults: {}", e);
            Config::default()
        }),
    };

    init_logging(&config.output.log_level, matches.get_flag("verbose"));
    config.validate()?;

    let store = CredentialStore::new(&config.auth.credentials_file, &config.auth.token_key);
    let credentials = store.load()?;
    let client = ApiClient::new(&config.api, credentials)?;

    match matches.subcommand() {
        Some(("login", args)) => {
            let username = string_arg(args, "username")?;
            let token = client
                .auth()
                .login(username, string_arg(args, "password")?)
                .await?;
            store.save(&token.access_token)?;
            println!("✅ Logged in as {}", username);
        }
        Some(("logout", _)) => {
            store.clear()?;
            println!("👋 Logged out");
        }
        Some(("register", args)) => {
            client
                .auth()
                .register(
                    string_arg(args, "email")?,
                    string_arg(args, "password")?,
                    string_arg(args, "name")?,
                )
                .await?;
            println!("✅ Account created, run `eduvid login` next");
        }
        Some(("upload", args)) => {
            let content = match args.get_one::<PathBuf>("content-file") {
                Some(path) => tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => string_arg(args, "content")?.to_string(),
            };

            let content_type = match string_arg(args, "type")? {
                "url" => ContentType::Url,
                "file" => ContentType::File,
                _ => ContentType::Text,
            };

            let mut submission = ContentSubmission::new(string_arg(args, "title")?, content)
                .with_content_type(content_type)
                .with_config(config.generation.clone());
            if let Some(description) = args.get_one::<String>("description") {
                submission = submission.with_description(description);
            }

            let response = Submitter::new(client.content().clone())
                .submit(&submission)
                .await?;
            println!("✅ Created project {}", response.project_id);
        }
        Some(("upload-file", args)) => {
            let path = args
                .get_one::<PathBuf>("path")
                .ok_or_else(|| anyhow!("missing <path>"))?;
            let response = Submitter::new(client.content().clone())
                .submit_file(path)
                .await?;
            println!("✅ Created project {}", response.project_id);
        }
        Some(("projects", _)) => {
            let projects = client.content().projects().await?;
            if projects.is_empty() {
                println!("No projects yet");
            }
            for project in &projects {
                print!("{}", render_project(project));
            }
        }
        Some(("project", args)) => {
            let project = client.content().project(id_arg(args, "project-id")?).await?;
            print!("{}", render_project(&project));
        }
        Some(("delete", args)) => {
            let project_id = id_arg(args, "project-id")?;
            client.content().delete_project(project_id).await?;
            println!("🗑️ Deleted project {}", project_id);
        }
        Some(("generate", args)) => {
            let mut sync = config.sync.clone();
            sync.enable_push &= !args.get_flag("no-push");
            sync.enable_poll &= !args.get_flag("no-poll");
            follow_generation(&client, &config, &sync, id_arg(args, "project-id")?).await?;
        }
        Some(("status", args)) => {
            let status = client
                .video()
                .task_status(string_arg(args, "task-id")?)
                .await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Some(("videos", args)) => {
            let videos = client
                .video()
                .project_videos(id_arg(args, "project-id")?)
                .await?;
            print!("{}", render_videos(&videos));
        }
        Some(("download", args)) => {
            let link = client
                .video()
                .download_video(id_arg(args, "video-id")?)
                .await?;
            println!("{}", link.download_url);
        }
        Some(("config", args)) => {
            println!("{}", config.summary());
            if let Some(path) = args.get_one::<PathBuf>("save") {
                config.save(path)?;
            }
        }
        _ => unreachable!("subcommand is required"),
    }

    Ok(())
}

async fn follow_generation(
    client: &ApiClient,
    config: &Config,
    sync: &eduvid_client::config::SyncConfig,
    project_id: u64,
) -> Result<()> {
    let push = PushChannel::new(&config.api.ws_base_url);
    let watch = ProjectWatch::open(project_id, client.video_handle(), Some(&push), sync);
    let mut updates = watch.subscribe();

    info!("🚀 Starting generation for project {}", project_id);
    if let Err(e) = watch.generate().await {
        watch.close().await;
        return Err(anyhow!("{}", e.user_message()));
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let outcome = loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break watch.view();
                }
                let view = updates.borrow_and_update().clone();
                println!("{}", render_progress_line(&view));
                if view.status.is_terminal() {
                    break view;
                }
            }
            _ = &mut ctrl_c => {
                warn!("Interrupted, generation continues on the server");
                break watch.view();
            }
        }
    };

    watch.close().await;
    print!("{}", render_progress(&outcome));

    match outcome.status {
        GenerationStatus::Failed => {
            error!("Generation failed for project {}", project_id);
            Err(anyhow!(
                "{}",
                outcome.error.unwrap_or_else(|| "Generation failed".to_string())
            ))
        }
        _ => Ok(()),
    }
}
