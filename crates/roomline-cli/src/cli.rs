use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use roomline_client::ClientConfig;

#[derive(Parser, Debug)]
#[command(name = "roomline")]
#[command(about = "Terminal client for a roomline chat room", version)]
pub struct Cli {
    /// Room server base URL (overrides ROOMLINE_SERVER_URL)
    #[arg(long)]
    pub server: Option<String>,

    /// Directory holding the session database (overrides ROOMLINE_DATA_DIR)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Poll interval in milliseconds (overrides ROOMLINE_POLL_INTERVAL_MS)
    #[arg(long)]
    pub poll_ms: Option<u64>,

    /// Keep the session in memory only
    #[arg(long)]
    pub ephemeral: bool,

    /// Visible message rows
    #[arg(long, default_value_t = 20)]
    pub rows: usize,
}

impl Cli {
    /// Layer command-line flags over environment configuration.
    pub fn apply(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(server) = &self.server {
            config.server_url = server.trim_end_matches('/').to_string();
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = Some(dir.clone());
        }
        if let Some(ms) = self.poll_ms.filter(|ms| *ms > 0) {
            config.poll_interval = Duration::from_millis(ms);
        }
        config
    }
}

/// One line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Login { nickname: String, password: String },
    Register { nickname: String, password: String, avatar: Option<PathBuf> },
    Attach(Vec<PathBuf>),
    Unstage(usize),
    Avatar(PathBuf),
    Up,
    Down,
    Bottom,
    Logout,
    Quit,
    Help,
    Say(String),
    Empty,
    Invalid(String),
}

pub const HELP: &str = "\
commands:
  /login <nickname> <password>
  /register <nickname> <password> [avatar-file]
  /attach <file>...         stage images for the next message
  /unstage <n>              drop the n-th staged image
  /avatar <file>            change your avatar
  /up  /down  /bottom       scroll the history
  /logout  /quit
anything else is sent as a message";

pub fn parse_input(line: &str) -> Input {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Input::Empty;
    }
    let Some(command) = line.trim_start().strip_prefix('/') else {
        return Input::Say(line.to_string());
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    match (name, args.as_slice()) {
        ("login", [nickname, password]) => Input::Login {
            nickname: nickname.to_string(),
            password: password.to_string(),
        },
        ("register", [nickname, password]) => Input::Register {
            nickname: nickname.to_string(),
            password: password.to_string(),
            avatar: None,
        },
        ("register", [nickname, password, avatar]) => Input::Register {
            nickname: nickname.to_string(),
            password: password.to_string(),
            avatar: Some(PathBuf::from(avatar)),
        },
        ("attach", files) if !files.is_empty() => {
            Input::Attach(files.iter().map(PathBuf::from).collect())
        }
        ("unstage", [n]) => match n.parse::<usize>() {
            Ok(n) if n > 0 => Input::Unstage(n),
            _ => Input::Invalid(format!("not a staged image number: {n}")),
        },
        ("avatar", [file]) => Input::Avatar(PathBuf::from(file)),
        ("up", []) => Input::Up,
        ("down", []) => Input::Down,
        ("bottom", []) => Input::Bottom,
        ("logout", []) => Input::Logout,
        ("quit" | "exit", []) => Input::Quit,
        ("help", _) => Input::Help,
        _ => Input::Invalid(format!("unknown command: /{command}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_message() {
        assert_eq!(parse_input("hello there\n"), Input::Say("hello there".into()));
        assert_eq!(parse_input("   "), Input::Empty);
    }

    #[test]
    fn parses_commands() {
        assert_eq!(
            parse_input("/login ann secret"),
            Input::Login {
                nickname: "ann".into(),
                password: "secret".into()
            }
        );
        assert_eq!(
            parse_input("/register bob hunter22 me.png"),
            Input::Register {
                nickname: "bob".into(),
                password: "hunter22".into(),
                avatar: Some(PathBuf::from("me.png"))
            }
        );
        assert_eq!(
            parse_input("/attach a.png b.jpg"),
            Input::Attach(vec![PathBuf::from("a.png"), PathBuf::from("b.jpg")])
        );
        assert_eq!(parse_input("/unstage 2"), Input::Unstage(2));
        assert_eq!(parse_input("/bottom"), Input::Bottom);
    }

    #[test]
    fn rejects_malformed_commands() {
        assert!(matches!(parse_input("/login ann"), Input::Invalid(_)));
        assert!(matches!(parse_input("/unstage zero"), Input::Invalid(_)));
        assert!(matches!(parse_input("/unstage 0"), Input::Invalid(_)));
        assert!(matches!(parse_input("/attach"), Input::Invalid(_)));
        assert!(matches!(parse_input("/dance"), Input::Invalid(_)));
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from(["roomline", "--server", "http://chat.local/", "--poll-ms", "250"]);
        let config = cli.apply(ClientConfig::default());
        assert_eq!(config.server_url, "http://chat.local");
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert!(config.data_dir.is_none());
    }
}
