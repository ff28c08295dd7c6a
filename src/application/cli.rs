use std::env;
use std::io;
use std::io::IsTerminal;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Password;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use super::console;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendName;
use crate::domain::models::ConversationState;
use crate::domain::models::DocumentTheme;
use crate::domain::services::CompileRequest;
use crate::domain::services::DocumentCompiler;
use crate::domain::services::DOCUMENT_MIME_TYPE;
use crate::domain::services::SessionStore;
use crate::domain::services::VisualAssets;
use crate::infrastructure::backends::BackendManager;

const NO_PLAN_TEXT: &str =
    "No plan generated yet. Run `grantwright consult` and finish the consultation first.";

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

pub fn debug_log_dir() -> path::PathBuf {
    if let Ok(dir) = env::var("GRANTWRIGHT_LOG_DIR") {
        return path::PathBuf::from(dir);
    }

    return dirs::cache_dir()
        .unwrap_or_else(env::temp_dir)
        .join("grantwright");
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;
    file.flush().await?;

    println!(
        "Created default config file at {}",
        config_file_path.display()
    );
    return Ok(());
}

fn get_backend() -> Result<BackendBox> {
    let backend_name = Config::get(ConfigKey::Backend);
    if let Some(name) = BackendName::parse(backend_name.to_string()) {
        return BackendManager::get(name);
    }

    bail!(format!("Unknown backend {backend_name}"));
}

/// Asks for the API key when none came from the config file, env, or args.
/// Skipped when stdin is not a terminal.
fn prompt_for_api_key() -> Result<()> {
    if !Config::get(ConfigKey::ApiKey).is_empty() || !io::stdin().is_terminal() {
        return Ok(());
    }

    let key = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Google API key (leave empty to continue without one)")
        .allow_empty_password(true)
        .interact()?;

    if !key.trim().is_empty() {
        Config::set(ConfigKey::ApiKey, key.trim());
    }

    return Ok(());
}

async fn load_state() -> (SessionStore, ConversationState) {
    let store = SessionStore::default();
    let mut state = ConversationState::new(&Config::get(ConfigKey::ChatModel));
    store.load(&mut state).await;

    return (store, state);
}

async fn run_consult() -> Result<()> {
    prompt_for_api_key()?;

    let backend = get_backend()?;
    if backend.has_credential() {
        if let Err(err) = backend.health_check().await {
            tracing::warn!(error = ?err, "Backend health check failed");
            println!(
                "{}\n",
                Paint::yellow(format!("Warning: {err}. Replies may fail."))
            );
        }
    }

    let store = SessionStore::default();
    return console::consult(&store, &*backend, &Config::get(ConfigKey::ChatModel)).await;
}

async fn run_simulate_plan() -> Result<()> {
    let (store, mut state) = load_state().await;
    state.simulate_plan();

    if !store.save(&state).await {
        bail!(format!("Failed to save session to {}", store.path().display()));
    }

    println!("Loaded the sample plan into {}", store.path().display());
    return Ok(());
}

async fn run_plan_show() -> Result<()> {
    let (_, state) = load_state().await;
    if !state.plan_generated {
        println!("{NO_PLAN_TEXT}");
        return Ok(());
    }

    println!("{}", state.plan_text);
    return Ok(());
}

async fn run_visuals() -> Result<()> {
    let (store, mut state) = load_state().await;
    if !state.plan_generated {
        bail!(NO_PLAN_TEXT);
    }

    let backend = get_backend()?;
    if !backend.has_credential() {
        println!(
            "{}",
            Paint::yellow("No API key is configured, no visuals can be generated.")
        );
    }

    let style = Config::get(ConfigKey::VisualStyle);
    if Config::get_bool(ConfigKey::Use3dAssets) {
        tracing::debug!("3D assets requested for visuals, nothing to add yet");
    }

    println!("Analyzing the plan and creating {style} visuals...");
    let images = VisualAssets::new(
        &*backend,
        &Config::get(ConfigKey::PlannerModel),
        &Config::get(ConfigKey::ImageModel),
    )
    .generate(&state.plan_text, &style, |fraction, text| {
        if let Err(err) = console::write_progress(&mut io::stdout(), fraction, text) {
            tracing::warn!(error = ?err, "Failed to write visuals progress");
        }
    })
    .await;
    println!();

    state.images = images;
    if !store.save(&state).await {
        bail!(format!("Failed to save session to {}", store.path().display()));
    }

    println!(
        "{}",
        Paint::green(format!("Generated {} images!", state.images.len()))
    );
    for (section, image) in &state.images {
        match &image.label {
            Some(label) => println!("- {section}: {}", Paint::yellow(label)),
            None => println!("- {section}"),
        }
    }

    return Ok(());
}

async fn run_export() -> Result<()> {
    let (_, state) = load_state().await;
    if !state.plan_generated {
        bail!(NO_PLAN_TEXT);
    }

    let business_name = Config::get(ConfigKey::BusinessName);
    let slogan = Config::get(ConfigKey::Slogan);
    let theme = Config::get(ConfigKey::Theme);

    let bytes = DocumentCompiler::compile(&CompileRequest {
        business_name: &business_name,
        slogan: &slogan,
        plan_text: &state.plan_text,
        theme: &theme,
        images: &state.images,
        use_3d_assets: Config::get_bool(ConfigKey::Use3dAssets),
    })?;

    let output = path::PathBuf::from(Config::get(ConfigKey::Output));
    fs::write(&output, &bytes).await?;

    tracing::info!(
        path = ?output,
        bytes = bytes.len(),
        mime = DOCUMENT_MIME_TYPE,
        "Exported business plan"
    );
    println!(
        "{}",
        Paint::green(format!(
            "Wrote {} ({} KB)",
            output.display(),
            bytes.len() / 1024
        ))
    );
    return Ok(());
}

async fn run_session_show() -> Result<()> {
    let (store, state) = load_state().await;
    let exists = store.path().exists();

    println!("Path: {}", store.path().display());
    println!("Saved: {exists}");
    println!("Model: {}", state.selected_model);
    println!("Messages: {}", state.messages.len());
    println!("Plan generated: {}", state.plan_generated);
    if state.plan_generated {
        println!("Plan length: {} characters", state.plan_text.chars().count());
    }
    println!("Images: {}", state.images.len());
    for (section, image) in &state.images {
        if image.is_placeholder() {
            println!("  - {section} (placeholder)");
        } else {
            println!("  - {section}");
        }
    }

    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_debug() -> Command {
    return Command::new("debug")
        .about("Debug helpers for Grantwright")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running Grantwright with environment variable RUST_LOG=grantwright")
        );
}

fn subcommand_plan() -> Command {
    return Command::new("plan")
        .about("Inspect the captured business plan.")
        .arg_required_else_help(true)
        .subcommand(Command::new("show").about("Print the plan text."));
}

fn subcommand_session() -> Command {
    return Command::new("session")
        .about("Manage the session file.")
        .arg_required_else_help(true)
        .subcommand(Command::new("path").about("Print the session file path."))
        .subcommand(Command::new("show").about("Summarize what the session holds."))
        .subcommand(
            Command::new("clear")
                .about("Delete the session file and start the consultation over."),
        );
}

fn arg_api_key() -> Arg {
    return Arg::new(ConfigKey::ApiKey.to_string())
        .long(ConfigKey::ApiKey.to_string())
        .env("GOOGLE_API_KEY")
        .hide_env_values(true)
        .num_args(1)
        .help("Google Generative Language API key. Falls back to the GOOGLE_API_KEY environment variable.")
        .global(true);
}

fn arg_api_url() -> Arg {
    return Arg::new(ConfigKey::ApiURL.to_string())
        .long(ConfigKey::ApiURL.to_string())
        .env("GRANTWRIGHT_API_URL")
        .num_args(1)
        .help(format!(
            "Base URL of the Generative Language API. [default: {}]",
            Config::default(ConfigKey::ApiURL)
        ))
        .global(true);
}

fn arg_backend() -> Arg {
    return Arg::new(ConfigKey::Backend.to_string())
        .short('b')
        .long(ConfigKey::Backend.to_string())
        .env("GRANTWRIGHT_BACKEND")
        .num_args(1)
        .help(format!(
            "The backend hosting the models. [default: {}]",
            Config::default(ConfigKey::Backend)
        ))
        .value_parser(PossibleValuesParser::new(BackendName::VARIANTS))
        .global(true);
}

fn arg_backend_health_check_timeout() -> Arg {
    return Arg::new(ConfigKey::BackendHealthCheckTimeout.to_string())
        .long(ConfigKey::BackendHealthCheckTimeout.to_string())
        .env("GRANTWRIGHT_BACKEND_HEALTH_CHECK_TIMEOUT")
        .num_args(1)
        .help(
            format!("Time to wait in milliseconds before timing out when doing a healthcheck for a backend. [default: {}]", Config::default(ConfigKey::BackendHealthCheckTimeout)),
        )
        .global(true);
}

fn arg_chat_model() -> Arg {
    return Arg::new(ConfigKey::ChatModel.to_string())
        .short('m')
        .long(ConfigKey::ChatModel.to_string())
        .env("GRANTWRIGHT_CHAT_MODEL")
        .num_args(1)
        .help(format!(
            "Model used for the consultation chat. [default: {}]",
            Config::default(ConfigKey::ChatModel)
        ))
        .global(true);
}

fn arg_planner_model() -> Arg {
    return Arg::new(ConfigKey::PlannerModel.to_string())
        .long(ConfigKey::PlannerModel.to_string())
        .env("GRANTWRIGHT_PLANNER_MODEL")
        .num_args(1)
        .help(format!(
            "Model used to plan which sections get illustrated. [default: {}]",
            Config::default(ConfigKey::PlannerModel)
        ))
        .global(true);
}

fn arg_image_model() -> Arg {
    return Arg::new(ConfigKey::ImageModel.to_string())
        .long(ConfigKey::ImageModel.to_string())
        .env("GRANTWRIGHT_IMAGE_MODEL")
        .num_args(1)
        .help(format!(
            "Model used to render illustrations. [default: {}]",
            Config::default(ConfigKey::ImageModel)
        ))
        .global(true);
}

fn arg_session_file() -> Arg {
    return Arg::new(ConfigKey::SessionFile.to_string())
        .long(ConfigKey::SessionFile.to_string())
        .env("GRANTWRIGHT_SESSION_FILE")
        .num_args(1)
        .help(format!(
            "Path of the session file. [default: {}]",
            Config::default(ConfigKey::SessionFile)
        ))
        .global(true);
}

fn arg_theme() -> Arg {
    return Arg::new(ConfigKey::Theme.to_string())
        .short('t')
        .long(ConfigKey::Theme.to_string())
        .env("GRANTWRIGHT_THEME")
        .num_args(1)
        .help(format!(
            "Colour theme applied to document headings. [default: {}]",
            Config::default(ConfigKey::Theme)
        ))
        .value_parser(PossibleValuesParser::new(DocumentTheme::VARIANTS))
        .global(true);
}

fn arg_visual_style() -> Arg {
    return Arg::new(ConfigKey::VisualStyle.to_string())
        .long(ConfigKey::VisualStyle.to_string())
        .env("GRANTWRIGHT_VISUAL_STYLE")
        .num_args(1)
        .help(format!(
            "Visual style requested from the image model. [default: {}]",
            Config::default(ConfigKey::VisualStyle)
        ))
        .global(true);
}

fn arg_use_3d_assets() -> Arg {
    return Arg::new(ConfigKey::Use3dAssets.to_string())
        .long(ConfigKey::Use3dAssets.to_string())
        .env("GRANTWRIGHT_USE_3D_ASSETS")
        .num_args(1)
        .help(format!(
            "Reserved for 3D-style charts and icons. [default: {}]",
            Config::default(ConfigKey::Use3dAssets)
        ))
        .value_parser(PossibleValuesParser::new(["true", "false"]))
        .global(true);
}

fn arg_business_name() -> Arg {
    return Arg::new(ConfigKey::BusinessName.to_string())
        .long(ConfigKey::BusinessName.to_string())
        .env("GRANTWRIGHT_BUSINESS_NAME")
        .num_args(1)
        .help(format!(
            "Business name printed on the cover page. [default: {}]",
            Config::default(ConfigKey::BusinessName)
        ))
        .global(true);
}

fn arg_slogan() -> Arg {
    return Arg::new(ConfigKey::Slogan.to_string())
        .long(ConfigKey::Slogan.to_string())
        .env("GRANTWRIGHT_SLOGAN")
        .num_args(1)
        .help(format!(
            "Slogan printed under the business name. [default: {}]",
            Config::default(ConfigKey::Slogan)
        ))
        .global(true);
}

fn arg_output() -> Arg {
    return Arg::new(ConfigKey::Output.to_string())
        .short('o')
        .long(ConfigKey::Output.to_string())
        .env("GRANTWRIGHT_OUTPUT")
        .num_args(1)
        .help(format!(
            "Path the compiled business plan is written to. [default: {}]",
            Config::default(ConfigKey::Output)
        ))
        .global(true);
}

pub fn build() -> Command {
    let commands_text = console::help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") {
                return Paint::new(format!("CONSULT {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("grantwright")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(Command::new("consult").about("Start or resume the consultation chat. This is the default command."))
        .subcommand(
            Command::new("simulate-plan")
                .about("Loads a small sample plan so visuals and export can be tried without a consultation. (dev only)")
                .hide(!cfg!(feature = "dev")),
        )
        .subcommand(subcommand_plan())
        .subcommand(Command::new("visuals").about("Plan and generate illustrations for the captured business plan."))
        .subcommand(Command::new("export").about("Compile the plan and its illustrations into a Word document."))
        .subcommand(subcommand_session())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .arg(arg_api_key())
        .arg(arg_api_url())
        .arg(arg_backend())
        .arg(arg_backend_health_check_timeout())
        .arg(arg_chat_model())
        .arg(arg_planner_model())
        .arg(arg_image_model())
        .arg(arg_session_file())
        .arg(arg_theme())
        .arg(arg_visual_style())
        .arg(arg_use_3d_assets())
        .arg(arg_business_name())
        .arg(arg_slogan())
        .arg(arg_output())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("GRANTWRIGHT_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        );
}

pub async fn parse() -> Result<()> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => match debug_matches.subcommand() {
            Some(("log-path", _)) => {
                let log_path = debug_log_dir().join("debug.log");
                println!("{}", log_path.display());
            }
            _ => {
                subcommand_debug().print_long_help()?;
            }
        },
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
            }
            _ => {
                subcommand_config().print_long_help()?;
            }
        },
        Some(("simulate-plan", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            run_simulate_plan().await?;
        }
        Some(("plan", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            match subcmd_matches.subcommand() {
                Some(("show", _)) => {
                    run_plan_show().await?;
                }
                _ => {
                    subcommand_plan().print_long_help()?;
                }
            }
        }
        Some(("visuals", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            run_visuals().await?;
        }
        Some(("export", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            run_export().await?;
        }
        Some(("session", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            match subcmd_matches.subcommand() {
                Some(("path", _)) => {
                    println!("{}", SessionStore::default().path().display());
                }
                Some(("show", _)) => {
                    run_session_show().await?;
                }
                Some(("clear", _)) => {
                    let (store, mut state) = load_state().await;
                    store.clear(&mut state).await;
                    println!("Cleared session at {}", store.path().display());
                }
                _ => {
                    subcommand_session().print_long_help()?;
                }
            }
        }
        Some(("consult", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            run_consult().await?;
        }
        _ => {
            Config::load(build(), vec![&matches]).await?;
            run_consult().await?;
        }
    }

    return Ok(());
}
