use ailaw_core::types::{Feedback, ModelType};
use clap::{Args, Parser, Subcommand, ValueEnum};

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("AILAW_GIT_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "ailaw", version = VERSION, about = "Terminal client for the AiLaw legal assistant")]
pub struct Cli {
    /// Config file (default: ~/.ailaw/ailaw.toml)
    #[arg(long, global = true, env = "AILAW_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Chat with the assistant; interactive unless a prompt is given
    Chat(ChatArgs),

    /// Manage chat sessions
    #[command(subcommand)]
    Sessions(SessionsCommand),

    /// Print the messages of a session
    History { session_id: String },

    /// Like, dislike or clear feedback on a model message
    Feedback {
        message_id: String,
        #[arg(value_enum)]
        kind: FeedbackKind,
    },

    /// Sign in with Google
    Login(LoginArgs),

    /// Sign out and drop the access token
    Logout,

    /// Check that the backend is reachable
    Health,
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Continue an existing session
    #[arg(long)]
    pub session: Option<String>,

    /// Answering mode (defaults to chat.model_type from the config)
    #[arg(long, value_enum)]
    pub model: Option<ModelArg>,

    /// Ask once and exit
    pub prompt: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum SessionsCommand {
    List,
    New { title: Vec<String> },
    Rename { session_id: String, name: Vec<String> },
    Delete { session_id: String },
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Authorization code from the Google callback redirect
    #[arg(long, conflicts_with = "url")]
    pub code: Option<String>,

    /// Print the sign-in URL to open in a browser
    #[arg(long)]
    pub url: bool,

    /// Account hint passed to Google
    #[arg(long, requires = "url")]
    pub email: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelArg {
    Normal,
    Cot,
}

impl From<ModelArg> for ModelType {
    fn from(m: ModelArg) -> Self {
        match m {
            ModelArg::Normal => ModelType::Normal,
            ModelArg::Cot => ModelType::Cot,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedbackKind {
    Like,
    Dislike,
    Clear,
}

impl FeedbackKind {
    pub fn as_feedback(self) -> Option<Feedback> {
        match self {
            FeedbackKind::Like => Some(Feedback::Like),
            FeedbackKind::Dislike => Some(Feedback::Dislike),
            FeedbackKind::Clear => None,
        }
    }
}

/// Words joined back into one string; empty when none were given.
pub fn joined(words: &[String]) -> String {
    words.join(" ").trim().to_string()
}
