//! Interactive shell on top of the session controller and sync engine.
//!
//! The shell decides which view is active, turns typed commands into
//! controller/engine calls, and prints the outcome. It holds no prompt data
//! of its own.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, warn};

use promptkeeper_core::{AuthForm, Config, DraftIntent, LoginOutcome, Prompt, PromptId, SessionController, SyncError};

use crate::input::{with_default, Prompter};

/// What the shell is currently showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    SignIn(AuthForm),
    Prompts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login,
    Register,
    Switch,
    List,
    New,
    Edit(PromptId),
    Save,
    Cancel,
    Delete(PromptId),
    Refresh,
    Logout,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut parts = line.split_whitespace();
        let Some(word) = parts.next() else {
            return Err("Type 'help' for a list of commands".to_string());
        };
        let arg = parts.next();

        let id_arg = |name: &str| {
            arg.map(PromptId::from)
                .ok_or_else(|| format!("Usage: {} <id>", name))
        };

        match word.to_lowercase().as_str() {
            "login" => Ok(Command::Login),
            "register" => Ok(Command::Register),
            "switch" => Ok(Command::Switch),
            "list" | "ls" => Ok(Command::List),
            "new" => Ok(Command::New),
            "edit" => id_arg("edit").map(Command::Edit),
            "save" => Ok(Command::Save),
            "cancel" => Ok(Command::Cancel),
            "delete" | "rm" => id_arg("delete").map(Command::Delete),
            "refresh" => Ok(Command::Refresh),
            "logout" => Ok(Command::Logout),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => Err(format!("Unknown command '{}'. Type 'help' for a list of commands", other)),
        }
    }

    fn allowed_in(&self, view: View) -> bool {
        match self {
            Command::Help | Command::Quit => true,
            Command::Login | Command::Register | Command::Switch => matches!(view, View::SignIn(_)),
            _ => view == View::Prompts,
        }
    }
}

pub struct ApplicationShell<P: Prompter, W: Write> {
    config: Config,
    /// Where to record the last username; `None` keeps config in memory
    config_path: Option<PathBuf>,
    session: SessionController,
    auth_form: AuthForm,
    prompter: P,
    out: W,
}

impl<P: Prompter, W: Write> ApplicationShell<P, W> {
    pub fn new(config: Config, session: SessionController, prompter: P, out: W) -> Self {
        Self {
            config,
            config_path: None,
            session,
            auth_form: AuthForm::default(),
            prompter,
            out,
        }
    }

    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    pub fn view(&self) -> View {
        if self.session.is_authenticated() {
            View::Prompts
        } else {
            View::SignIn(self.auth_form)
        }
    }

    #[cfg(test)]
    pub fn session(&self) -> &SessionController {
        &self.session
    }

    /// Load prompts for a resumed session
    pub async fn start(&mut self) -> Result<()> {
        if self.session.is_authenticated() {
            match self.session.engine().hydrate().await {
                Ok(count) => writeln!(self.out, "Loaded {} prompt(s).", count)?,
                Err(e) => self.report(&e)?,
            }
        }
        self.print_view()
    }

    /// Read and run commands until `quit` or end of input
    pub async fn run(&mut self) -> Result<()> {
        self.start().await?;
        loop {
            let label = match self.view() {
                View::SignIn(form) => format!("{}> ", form.title().to_lowercase()),
                View::Prompts => "prompts> ".to_string(),
            };
            let Some(line) = self.prompter.read_line(&label)? else {
                return Ok(());
            };
            if line.trim().is_empty() {
                continue;
            }
            match Command::parse(&line) {
                Ok(command) => {
                    if !self.handle(command).await? {
                        return Ok(());
                    }
                }
                Err(message) => writeln!(self.out, "{}", message)?,
            }
        }
    }

    /// Run one command. Returns false when the shell should exit.
    pub async fn handle(&mut self, command: Command) -> Result<bool> {
        debug!(?command, "Handling command");
        if !command.allowed_in(self.view()) {
            let message = match self.view() {
                View::SignIn(_) => "Sign in first (login / register).",
                View::Prompts => "Already signed in. Use 'logout' to switch accounts.",
            };
            writeln!(self.out, "{}", message)?;
            return Ok(true);
        }

        match command {
            Command::Quit => return Ok(false),
            Command::Help => self.print_help()?,
            Command::Switch => {
                self.auth_form = self.auth_form.toggle();
                self.print_view()?;
            }
            Command::Login => {
                self.auth_form = AuthForm::Login;
                self.login().await?;
            }
            Command::Register => {
                self.auth_form = AuthForm::Register;
                self.register().await?;
            }
            Command::Logout => {
                self.session.logout();
                self.auth_form = AuthForm::Login;
                writeln!(self.out, "Logged out.")?;
            }
            Command::List => self.print_prompts()?,
            Command::Refresh => match self.session.engine().hydrate().await {
                Ok(count) => {
                    writeln!(self.out, "Loaded {} prompt(s).", count)?;
                    self.print_prompts()?;
                }
                Err(e) => self.report(&e)?,
            },
            Command::New => self.new_prompt().await?,
            Command::Edit(id) => self.edit_prompt(&id).await?,
            Command::Save => self.submit().await?,
            Command::Cancel => {
                self.session.engine().cancel_edit();
                writeln!(self.out, "Edit cancelled.")?;
            }
            Command::Delete(id) => match self.session.engine().delete(&id).await {
                Ok(()) => writeln!(self.out, "Prompt deleted.")?,
                Err(e) => self.report(&e)?,
            },
        }
        Ok(true)
    }

    async fn login(&mut self) -> Result<()> {
        let default = self.config.default_username().unwrap_or_default();
        let label = if default.is_empty() {
            "Username: ".to_string()
        } else {
            format!("Username [{}]: ", default)
        };
        let Some(answer) = self.prompter.read_line(&label)? else {
            return Ok(());
        };
        let username = with_default(answer, &default);
        let password = self.prompter.read_password("Password: ")?;

        let result = self.session.login(&username, &password).await;
        self.finish_sign_in(result, &username)
    }

    async fn register(&mut self) -> Result<()> {
        let Some(email) = self.prompter.read_line("Email: ")? else {
            return Ok(());
        };
        let Some(username) = self.prompter.read_line("Username: ")? else {
            return Ok(());
        };
        let password = self.prompter.read_password("Password: ")?;

        let result = self.session.register(&username, &email, &password).await;
        self.finish_sign_in(result, &username)
    }

    fn finish_sign_in(&mut self, result: Result<LoginOutcome, SyncError>, username: &str) -> Result<()> {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => return self.report(&e),
        };

        self.config.last_username = Some(username.trim().to_string());
        if let Some(ref path) = self.config_path {
            if let Err(e) = self.config.save_to(path) {
                warn!(error = %e, "Failed to save config");
            }
        }

        let name = outcome
            .user
            .as_ref()
            .map(|u| u.display_name().to_string())
            .unwrap_or_else(|| username.trim().to_string());
        writeln!(self.out, "Signed in as {}.", name)?;
        match outcome.hydration {
            Ok(_) => self.print_prompts(),
            Err(e) => self.report(&e),
        }
    }

    async fn new_prompt(&mut self) -> Result<()> {
        if let DraftIntent::Update(id) = self.session.engine().intent() {
            writeln!(self.out, "Still editing prompt {}. Use 'save' or 'cancel' first.", id)?;
            return Ok(());
        }
        let Some(name) = self.prompter.read_line("Name: ")? else {
            return Ok(());
        };
        let Some(text) = self.prompter.read_line("Prompt: ")? else {
            return Ok(());
        };
        self.session.engine().set_draft(name, text);
        self.submit().await
    }

    async fn edit_prompt(&mut self, id: &PromptId) -> Result<()> {
        if let Err(e) = self.session.engine().begin_edit(id) {
            return self.report(&e);
        }
        let current = self.session.engine().draft();
        let Some(name) = self.prompter.read_line(&format!("Name [{}]: ", current.name))? else {
            return Ok(());
        };
        let Some(text) = self.prompter.read_line(&format!("Prompt [{}]: ", current.text))? else {
            return Ok(());
        };
        self.session
            .engine()
            .set_draft(with_default(name, &current.name), with_default(text, &current.text));
        self.submit().await
    }

    /// Send the draft form; on failure it is kept for `save` to retry
    async fn submit(&mut self) -> Result<()> {
        let intent = self.session.engine().intent();
        if intent == DraftIntent::Create && self.session.engine().draft().is_empty() {
            writeln!(self.out, "Nothing to save. Use 'new' to write a prompt.")?;
            return Ok(());
        }
        match self.session.engine().submit_draft().await {
            Ok(prompt) => {
                let verb = match intent {
                    DraftIntent::Create => "created",
                    DraftIntent::Update(_) => "updated",
                };
                writeln!(self.out, "Prompt {} {}.", prompt.id, verb)?;
                Ok(())
            }
            Err(e) => {
                self.report(&e)?;
                if e.is_retryable() {
                    writeln!(self.out, "Your changes are kept. Use 'save' to retry or 'cancel' to discard.")?;
                }
                Ok(())
            }
        }
    }

    fn report(&mut self, err: &SyncError) -> Result<()> {
        writeln!(self.out, "Error: {}", err)?;
        Ok(())
    }

    fn print_view(&mut self) -> Result<()> {
        match self.view() {
            View::SignIn(form) => {
                let other = form.toggle();
                writeln!(
                    self.out,
                    "== {} ==  (type '{}', or 'switch' to {})",
                    form.title(),
                    form.title().to_lowercase(),
                    other.title().to_lowercase()
                )?;
                Ok(())
            }
            View::Prompts => self.print_prompts(),
        }
    }

    fn print_prompts(&mut self) -> Result<()> {
        let prompts = self.session.engine().prompts();
        let editing = self.session.engine().edit_target();
        write!(self.out, "{}", render_prompts(&prompts, editing.as_ref()))?;
        Ok(())
    }

    fn print_help(&mut self) -> Result<()> {
        let text = match self.view() {
            View::SignIn(_) => "Commands: login, register, switch, help, quit\n",
            View::Prompts => {
                "Commands: list, new, edit <id>, save, cancel, delete <id>, refresh, logout, help, quit\n"
            }
        };
        write!(self.out, "{}", text)?;
        Ok(())
    }
}

/// Render the prompt list, marking the one being edited
pub fn render_prompts(prompts: &[Prompt], editing: Option<&PromptId>) -> String {
    if prompts.is_empty() {
        return "No prompts yet. Use 'new' to create one.\n".to_string();
    }
    let mut out = String::new();
    for prompt in prompts {
        let marker = if editing == Some(&prompt.id) { "*" } else { " " };
        out.push_str(&format!("{}[{}] {}\n", marker, prompt.id, prompt.name));
        for line in prompt.text.lines() {
            out.push_str(&format!("      {}\n", line));
        }
    }
    out
}
