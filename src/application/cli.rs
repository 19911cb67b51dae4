use std::io;

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
use dialoguer::Confirm;
use dialoguer::Input;
use dialoguer::Password;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Mode;
use crate::infrastructure::api::AuthClient;
use crate::infrastructure::api::ChatClient;

fn hotkeys_text() -> String {
    let text = r#"
HOTKEYS:
- Enter - Send the typed message.
- CTRL+N - Start a new chat in the current mode.
- CTRL+K / CTRL+J - Select the previous/next session in the sidebar.
- CTRL+E - Rename the active session.
- CTRL+X - Delete the active session.
- CTRL+O - Cycle the mode (regular, uncensored, ocr).
- CTRL+G - Queue an image for the next send (OCR mode only, up to 4).
- CTRL+T - Toggle the light/dark theme.
- Up/Down arrows - Scroll the transcript.
- CTRL+U / CTRL+D - Page up/down.
- ESC - Cancel a rename or image prompt, or drop the last queued image.
- CTRL+C - Exit.
        "#;

    return text.trim().to_string();
}

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = std::path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        anyhow::bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if !config_file_path.parent().unwrap().exists() {
        fs::create_dir_all(config_file_path.parent().unwrap()).await?;
    }

    let mut file = fs::File::create(config_file_path.clone()).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    let config_path_display = config_file_path.as_os_str().to_str().unwrap();
    println!("Created default config file at {config_path_display}");
    return Ok(());
}

fn current_mode() -> Mode {
    return Mode::parse(&Config::get(ConfigKey::Mode)).unwrap_or_default();
}

async fn print_sessions_list(all_modes: bool) -> Result<()> {
    let client = ChatClient::default();
    let mode = if all_modes { None } else { Some(current_mode()) };
    let sessions = client.list_sessions(mode).await?;

    if sessions.is_empty() {
        println!("There are no sessions yet. Start your first chat!");
        return Ok(());
    }

    for session in sessions {
        println!("- (ID: {}) [{}] {}", session.id, session.mode, session.title);
    }

    return Ok(());
}

async fn run_auth(subcommand: &str) -> Result<()> {
    let client = AuthClient::default();
    let theme = ColorfulTheme::default();

    let message = match subcommand {
        "signup" => {
            let username: String = Input::with_theme(&theme)
                .with_prompt("Username")
                .interact_text()?;
            let email: String = Input::with_theme(&theme)
                .with_prompt("Email")
                .interact_text()?;
            let password = Password::with_theme(&theme)
                .with_prompt("Password")
                .with_confirmation("Confirm password", "Passwords do not match")
                .interact()?;

            client.signup(&username, &email, &password).await?
        }
        "login" => {
            let identifier: String = Input::with_theme(&theme)
                .with_prompt("Username or email")
                .interact_text()?;
            let password = Password::with_theme(&theme)
                .with_prompt("Password")
                .interact()?;

            client.login(&identifier, &password).await?
        }
        "logout" => client.logout().await?,
        "forgot-password" => {
            let email: String = Input::with_theme(&theme)
                .with_prompt("Account email")
                .interact_text()?;

            client.forgot_password(&email).await?
        }
        "reset-password" => {
            let uid: String = Input::with_theme(&theme)
                .with_prompt("Reset uid (from the email link)")
                .interact_text()?;
            let token: String = Input::with_theme(&theme)
                .with_prompt("Reset token")
                .interact_text()?;
            let password = Password::with_theme(&theme)
                .with_prompt("New password")
                .with_confirmation("Confirm password", "Passwords do not match")
                .interact()?;

            client.reset_password(&uid, &token, &password).await?
        }
        "delete-account" => {
            let confirmed = Confirm::with_theme(&theme)
                .with_prompt("Delete your account and every session? This cannot be undone.")
                .default(false)
                .interact()?;
            if !confirmed {
                println!("Left the account alone.");
                return Ok(());
            }

            client.delete_account().await?
        }
        _ => {
            subcommand_auth().print_long_help()?;
            return Ok(());
        }
    };

    println!("{message}");
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
        .about("Debug helpers for Conversa")
        .hide(true)
        .subcommand(Command::new("log-path").about(
            "Output path to the debug log file generated when running Conversa with environment variable RUST_LOG=conversa",
        ))
        .subcommand(Command::new("enum-config").about("List all config keys as strings."));
}

fn subcommand_chat() -> Command {
    return Command::new("chat").about("Start the chat interface (the default when no command is given).");
}

fn subcommand_sessions() -> Command {
    return Command::new("sessions")
        .about("Manage chat sessions on the backend.")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("list")
                .about("List sessions for the current mode.")
                .arg(
                    clap::Arg::new("all")
                        .long("all")
                        .help("List sessions across every mode.")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("new").about("Create a session in the current mode and print its ID."))
        .subcommand(
            Command::new("rename")
                .about("Rename a session.")
                .arg(clap::Arg::new("session-id").help("Session ID").required(true))
                .arg(clap::Arg::new("title").help("New title").required(true)),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a session and its messages.")
                .arg(clap::Arg::new("session-id").help("Session ID").required(true)),
        );
}

fn subcommand_ocr() -> Command {
    return Command::new("ocr")
        .about("Upload a file for text extraction and print the result.")
        .arg(clap::Arg::new("file").help("Image, PDF, or text file to extract.").required(true))
        .arg(
            clap::Arg::new("session")
                .long("session")
                .help("Attach the extraction to an existing OCR session.")
                .num_args(1),
        );
}

fn subcommand_auth() -> Command {
    return Command::new("auth")
        .about("Account management against the backend.")
        .arg_required_else_help(true)
        .subcommand(Command::new("signup").about("Create an account."))
        .subcommand(Command::new("login").about("Log in with a username or email."))
        .subcommand(Command::new("logout").about("Log out the current browser session."))
        .subcommand(Command::new("forgot-password").about("Request a password reset email."))
        .subcommand(Command::new("reset-password").about("Complete a password reset with the emailed uid and token."))
        .subcommand(Command::new("delete-account").about("Delete the logged-in account."));
}

pub fn build() -> Command {
    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("conversa")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(hotkeys_text())
        .arg_required_else_help(false)
        .subcommand(subcommand_auth())
        .subcommand(subcommand_chat())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .subcommand(subcommand_ocr())
        .subcommand(subcommand_sessions())
        .arg(
            Arg::new(ConfigKey::ApiBaseURL.to_string())
                .long(ConfigKey::ApiBaseURL.to_string())
                .env("CONVERSA_API_BASE_URL")
                .num_args(1)
                .help(format!(
                    "Base URL of the Conversa backend. [default: {}]",
                    Config::default(ConfigKey::ApiBaseURL)
                ))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Mode.to_string())
                .short('m')
                .long(ConfigKey::Mode.to_string())
                .env("CONVERSA_MODE")
                .num_args(1)
                .help(format!(
                    "The mode to start in. [default: {}]",
                    Config::default(ConfigKey::Mode)
                ))
                .value_parser(PossibleValuesParser::new(Mode::VARIANTS))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Theme.to_string())
                .short('t')
                .long(ConfigKey::Theme.to_string())
                .env("CONVERSA_THEME")
                .num_args(1)
                .help(format!(
                    "Display theme. [default: {}]",
                    Config::default(ConfigKey::Theme)
                ))
                .value_parser(PossibleValuesParser::new(["light", "dark"]))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("CONVERSA_CONFIG_FILE")
                .num_args(1)
                .help(format!(
                    "Path to configuration file [default: {}]",
                    Config::default(ConfigKey::ConfigFile)
                ))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Username.to_string())
                .short('u')
                .long(ConfigKey::Username.to_string())
                .env("CONVERSA_USERNAME")
                .num_args(1)
                .help("Your name, shown on your chat bubbles.")
                .global(true),
        );
}

pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    let log_path = dirs::cache_dir().unwrap().join("conversa/debug.log");
                    println!("{}", log_path.to_str().unwrap());
                }
                Some(("enum-config", _)) => {
                    println!("{}", ConfigKey::VARIANTS.join("\n"));
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(false);
        }
        Some(("chat", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        Some(("sessions", subcmd_matches)) => {
            Config::load(build(), vec![&matches]).await?;

            match subcmd_matches.subcommand() {
                Some(("list", list_matches)) => {
                    print_sessions_list(list_matches.get_flag("all")).await?;
                }
                Some(("new", _)) => {
                    let id = ChatClient::default().create_session(current_mode()).await?;
                    println!("Created session {id}");
                }
                Some(("rename", rename_matches)) => {
                    let id = rename_matches.get_one::<String>("session-id").unwrap();
                    let title = rename_matches.get_one::<String>("title").unwrap();
                    ChatClient::default().rename_session(id, title).await?;
                    println!("Renamed session {id}");
                }
                Some(("delete", delete_matches)) => {
                    let id = delete_matches.get_one::<String>("session-id").unwrap();
                    ChatClient::default().delete_session(id).await?;
                    println!("Deleted session {id}");
                }
                _ => {
                    subcommand_sessions().print_long_help()?;
                }
            }

            return Ok(false);
        }
        Some(("ocr", subcmd_matches)) => {
            Config::load(build(), vec![&matches]).await?;

            let file = subcmd_matches.get_one::<String>("file").unwrap();
            let session = subcmd_matches.get_one::<String>("session");
            let extract = ChatClient::default()
                .ocr_file(std::path::Path::new(file), session.map(|e| return e.as_str()))
                .await?;

            println!("Session: {}", extract.session_id);
            println!("{}", extract.text);
            return Ok(false);
        }
        Some(("auth", subcmd_matches)) => {
            Config::load(build(), vec![&matches]).await?;

            let name = subcmd_matches
                .subcommand()
                .map(|e| return e.0.to_string())
                .unwrap_or_default();
            run_auth(&name).await?;
            return Ok(false);
        }
        _ => {
            Config::load(build(), vec![&matches]).await?;
        }
    }

    return Ok(true);
}
