//! Main arena-cli command line entry points
use crate::{
    api::{ApiClient, OtpController, OtpProgress},
    error::{ApiError, ApiResult},
    logging::setup_tracing,
    navigation::TerminalNavigator,
    paths::config_file,
    render::Renderer,
    session::Session,
    settings::Settings,
    storage::FileStorage,
};
use anyhow::Result;
use arena_core::{
    common::TournamentQuery,
    messages::{MessageKey, Notice},
    otp::{OtpContext, OtpPurpose},
    validation::{PhoneForm, SignupForm},
};
use clap::{Parser, Subcommand};
use inquire::ui::RenderConfig;
use std::sync::Arc;
use url::Url;

#[derive(Debug, Parser)]
#[command(name = "arena-cli")]
#[command(about = "Sign in to the arena and browse tournaments from the command line")]
pub struct Cli {
    #[arg(long, help = "Base URL of the arena API, overrides the configured one")]
    api_endpoint: Option<Url>,
    #[arg(long, help = "Whether to turn off ansi terminal colors")]
    no_colors: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sign up, sign in and manage the session
    Auth(AuthCmds),
    /// Show your profile
    Profile(ProfileCommand),
    /// Show your wallet balance
    Wallet,
    /// List tournaments
    Tournaments(TournamentsCommand),
    /// Print file paths used by the application (e.g. the path to config)
    Paths,
}

#[derive(Debug, Parser)]
pub struct AuthCmds {
    #[command(subcommand)]
    command: AuthCommands,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommands {
    /// Create a new account with your phone number
    Signup,
    /// Sign in with a code sent to your phone
    Login,
    /// Reset your password with a code sent to your phone
    ResetPassword,
    /// Enter the code sent to your phone
    Verify(VerifyCommand),
    /// Sign out and forget the session
    Logout,
    /// Show whether you're signed in
    Status,
}

#[derive(Debug, Parser)]
pub struct VerifyCommand {
    /// What the code is for: signup, login or reset_password.
    /// If not provided, the pending verification is used.
    #[arg(long, requires = "identifier")]
    purpose: Option<OtpPurpose>,
    /// Phone number the code was sent to
    #[arg(long, requires = "purpose")]
    identifier: Option<String>,
    /// The code. If not provided, you'll be asked for it.
    #[arg(long)]
    code: Option<String>,
}

#[derive(Debug, Parser)]
pub struct ProfileCommand {
    /// Show the cached profile without asking the server
    #[arg(long)]
    cached: bool,
}

#[derive(Debug, Parser)]
pub struct TournamentsCommand {
    /// Page to show, starting at 1
    #[arg(long, default_value_t = 1)]
    page: u32,
    /// Tournaments per page. Defaults to the configured page size.
    #[arg(long)]
    page_size: Option<u32>,
    /// Field to order by, prefix with `-` for descending, e.g. "-start_date"
    #[arg(long)]
    ordering: Option<String>,
    /// Only show tournaments with this status, e.g. "upcoming"
    #[arg(long)]
    status: Option<String>,
}

impl Cli {
    pub async fn run(&self, mut settings: Settings) -> Result<()> {
        let ansi = !self.no_colors;
        setup_tracing(ansi);

        if let Some(api_endpoint) = &self.api_endpoint {
            settings.api_endpoint = api_endpoint.clone();
        }

        if let Commands::Paths = self.command {
            println!("{}", config_file().display());
            println!("{}", settings.storage_file.display());
            return Ok(());
        }

        let state = CliState::load(&settings, ansi)?;
        let result = match &self.command {
            Commands::Auth(auth) => state.auth(&auth.command).await,
            Commands::Profile(profile) => state.profile(profile.cached).await,
            Commands::Wallet => state.wallet().await,
            Commands::Tournaments(tournaments) => state.tournaments(tournaments).await,
            Commands::Paths => Ok(()),
        };

        if let Err(e) = &result {
            tracing::info!(%e, "Command failed");
            for notice in e.notices() {
                state.show(&notice);
            }
        }
        Ok(result?)
    }
}

#[derive(Debug)]
pub(crate) struct CliState<'s> {
    pub(crate) settings: &'s Settings,
    pub(crate) render_config: RenderConfig,
    pub(crate) renderer: Renderer,
    pub(crate) api: ApiClient,
}

impl<'s> CliState<'s> {
    fn load(settings: &'s Settings, colors: bool) -> Result<CliState<'s>> {
        let render_config = if colors {
            RenderConfig::default_colored()
        } else {
            RenderConfig::empty()
        };

        let storage = Arc::new(FileStorage::open(&settings.storage_file)?);
        tracing::debug!(path = ?storage.path(), "Opened session storage");

        let session = Session::new(settings, storage, Arc::new(TerminalNavigator))?;

        Ok(Self {
            settings,
            render_config,
            renderer: Renderer::new(colors),
            api: ApiClient::new(settings, session),
        })
    }

    fn show(&self, notice: &Notice) {
        eprintln!("{}", self.renderer.notice(notice));
    }

    async fn auth(&self, command: &AuthCommands) -> ApiResult<()> {
        match command {
            AuthCommands::Signup => {
                let form = SignupForm {
                    phone_number: self.prompt_text("Your mobile number (09xxxxxxxxx):")?,
                    password: self.prompt_password("Choose a password:")?,
                    confirm_password: self.prompt_password("Repeat the password:")?,
                };
                let context = self.api.signup(&form).await?;
                self.show(&MessageKey::SignupSuccess.notice());
                self.verify(Some(context), None).await
            }
            AuthCommands::Login => self.start_verification(OtpPurpose::Login).await,
            AuthCommands::ResetPassword => {
                self.start_verification(OtpPurpose::ResetPassword).await
            }
            AuthCommands::Verify(verify) => {
                let query = verify
                    .purpose
                    .zip(verify.identifier.clone())
                    .map(|(purpose, identifier)| OtpContext::new(purpose, identifier));
                self.verify(query, verify.code.as_deref()).await
            }
            AuthCommands::Logout => {
                self.api.session().logout();
                self.show(&MessageKey::LoggedOut.notice());
                Ok(())
            }
            AuthCommands::Status => {
                let session = self.api.session();
                if session.is_authenticated() {
                    match session.cached_profile().and_then(|p| p.username) {
                        Some(username) => println!("Signed in as {username}"),
                        None => println!("Signed in"),
                    }
                } else {
                    println!("Not signed in. Use \"arena-cli auth login\" to sign in.");
                }
                if let Some(pending) = session.pending_otp() {
                    println!(
                        "Pending {} verification for {}",
                        pending.purpose, pending.identifier
                    );
                }
                Ok(())
            }
        }
    }

    async fn start_verification(&self, purpose: OtpPurpose) -> ApiResult<()> {
        let form = PhoneForm {
            phone_number: self.prompt_text("Your mobile number (09xxxxxxxxx):")?,
        };
        let context = self.api.request_otp(purpose, &form).await?;
        self.verify(Some(context), None).await
    }

    async fn verify(&self, query: Option<OtpContext>, code: Option<&str>) -> ApiResult<()> {
        let mut controller = OtpController::open(self.api.clone(), query)?;
        self.show_code_sent(&controller);

        if let Some(code) = code {
            let progress = controller.enter_code(code).await?;
            return self.finish_verification(&mut controller, progress).await;
        }

        loop {
            let input = self.prompt_text("Enter the 6 digit code (or \"resend\"):")?;

            if input.trim() == "resend" {
                match controller.resend().await {
                    Ok(()) => self.show_code_sent(&controller),
                    Err(e) => e.notices().iter().for_each(|notice| self.show(notice)),
                }
                continue;
            }

            match controller.enter_code(&input).await {
                Ok(OtpProgress::Verified) => {
                    self.show(&MessageKey::OtpVerified.notice());
                    return Ok(());
                }
                Ok(OtpProgress::Pending | OtpProgress::Ignored) => {
                    self.show(&MessageKey::InvalidOtp.notice());
                }
                Err(e @ (ApiError::Network(_) | ApiError::Unexpected { .. })) => return Err(e),
                Err(e) => e.notices().iter().for_each(|notice| self.show(notice)),
            }
        }
    }

    fn show_code_sent(&self, controller: &OtpController) {
        if let Some(context) = controller.context() {
            self.show(
                &MessageKey::OtpSent
                    .notice()
                    .fill("identifier", &context.identifier),
            );
        }
    }

    async fn finish_verification(
        &self,
        controller: &mut OtpController,
        progress: OtpProgress,
    ) -> ApiResult<()> {
        match progress {
            OtpProgress::Verified => {}
            OtpProgress::Pending | OtpProgress::Ignored => {
                controller.submit().await?;
            }
        }
        self.show(&MessageKey::OtpVerified.notice());
        Ok(())
    }

    async fn profile(&self, cached: bool) -> ApiResult<()> {
        if let Some(profile) = self.api.cached_profile() {
            println!("{}", self.renderer.profile(&profile));
            if cached {
                return Ok(());
            }
        } else if cached {
            println!("No cached profile");
            return Ok(());
        }

        let profile = self.api.fetch_profile().await?;
        println!("{}", self.renderer.profile(&profile));
        Ok(())
    }

    async fn wallet(&self) -> ApiResult<()> {
        let wallet = self.api.fetch_wallet().await?;
        println!("{}", self.renderer.wallet(wallet.as_ref()));
        Ok(())
    }

    async fn tournaments(&self, command: &TournamentsCommand) -> ApiResult<()> {
        let query = TournamentQuery {
            page: command.page,
            page_size: command.page_size.unwrap_or(self.settings.page_size),
            ordering: command.ordering.clone(),
            status: command.status.clone(),
        };
        let listing = self.api.tournaments(&query).await?;
        println!("{}", self.renderer.tournaments(&listing));
        Ok(())
    }

    fn prompt_text(&self, message: &str) -> ApiResult<String> {
        inquire::Text::new(message)
            .with_render_config(self.render_config)
            .prompt()
            .map_err(prompt_error)
    }

    fn prompt_password(&self, message: &str) -> ApiResult<String> {
        inquire::Password::new(message)
            .without_confirmation()
            .with_render_config(self.render_config)
            .prompt()
            .map_err(prompt_error)
    }
}

fn prompt_error(err: inquire::InquireError) -> ApiError {
    ApiError::Unexpected {
        status: None,
        detail: format!("Prompt failed: {err}"),
    }
}
